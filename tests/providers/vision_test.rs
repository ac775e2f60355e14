//! Tests for the vision-description helper.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use construct::providers::vision::{describe_images, guess_media_type, ImageInput};
use construct::providers::{
    CompletionRequest, CompletionResponse, LlmProvider, ProviderError, StopReason, UsageStats,
};

struct FakeVisionProvider {
    supports: bool,
    calls: AtomicU32,
}

#[async_trait]
impl LlmProvider for FakeVisionProvider {
    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CompletionResponse {
            text: format!("a photo number {n}"),
            stop_reason: StopReason::EndTurn,
            usage: UsageStats {
                input_tokens: 0,
                output_tokens: 0,
            },
            model: "fake/vision".to_owned(),
        })
    }

    fn supports_vision(&self) -> bool {
        self.supports
    }

    fn model_id(&self) -> &str {
        "fake/vision"
    }
}

fn image() -> ImageInput {
    ImageInput {
        media_type: "image/jpeg".to_owned(),
        bytes: vec![1, 2, 3],
    }
}

#[tokio::test]
async fn one_description_per_image() {
    let provider = FakeVisionProvider {
        supports: true,
        calls: AtomicU32::new(0),
    };
    let descriptions = describe_images(&provider, "describe", &[image(), image()])
        .await
        .expect("descriptions");
    assert_eq!(descriptions.len(), 2);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn no_images_means_no_calls() {
    let provider = FakeVisionProvider {
        supports: false,
        calls: AtomicU32::new(0),
    };
    let descriptions = describe_images(&provider, "describe", &[])
        .await
        .expect("empty is fine");
    assert!(descriptions.is_empty());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn non_vision_provider_is_rejected() {
    let provider = FakeVisionProvider {
        supports: false,
        calls: AtomicU32::new(0),
    };
    let result = describe_images(&provider, "describe", &[image()]).await;
    assert!(matches!(result, Err(ProviderError::Unavailable(_))));
}

#[test]
fn media_types_follow_extensions() {
    assert_eq!(guess_media_type(Path::new("a.png")), "image/png");
    assert_eq!(guess_media_type(Path::new("a.webp")), "image/webp");
    assert_eq!(guess_media_type(Path::new("a.JPG")), "image/jpeg");
    assert_eq!(guess_media_type(Path::new("noext")), "image/jpeg");
}
