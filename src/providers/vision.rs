//! Optional vision-description capability.
//!
//! Turns attached images into short text descriptions before the pipeline
//! runs. The engine itself never sees image bytes — only the descriptions —
//! and this is never called mid-verification.

use base64::Engine as _;
use std::path::Path;

use super::{
    CompletionRequest, ContentPart, LlmProvider, Message, MessageContent, ProviderError, Role,
};

/// Token budget per image description.
const MAX_TOKENS: u32 = 150;

/// An image to be described.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// MIME type (e.g. `image/jpeg`).
    pub media_type: String,
    /// Raw image bytes.
    pub bytes: Vec<u8>,
}

impl ImageInput {
    /// Load an image from disk, guessing the MIME type from the extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| anyhow::anyhow!("failed to read image {}: {e}", path.display()))?;
        Ok(Self {
            media_type: guess_media_type(path),
            bytes,
        })
    }
}

/// Guess a MIME type from a file extension, defaulting to JPEG.
pub fn guess_media_type(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
    .to_owned()
}

/// Describe each image with the given instruction, one provider call per
/// image so a single bad image cannot poison the rest.
///
/// # Errors
///
/// Returns [`ProviderError::Unavailable`] when the provider has no vision
/// support, or the underlying provider error for a failed call.
pub async fn describe_images(
    provider: &dyn LlmProvider,
    instruction: &str,
    images: &[ImageInput],
) -> Result<Vec<String>, ProviderError> {
    if images.is_empty() {
        return Ok(Vec::new());
    }
    if !provider.supports_vision() {
        return Err(ProviderError::Unavailable(format!(
            "model '{}' does not accept images",
            provider.model_id()
        )));
    }

    let mut descriptions = Vec::with_capacity(images.len());
    for image in images {
        let data = base64::engine::general_purpose::STANDARD.encode(&image.bytes);
        let request = CompletionRequest {
            messages: vec![Message {
                role: Role::User,
                content: MessageContent::Parts(vec![
                    ContentPart::Image {
                        media_type: image.media_type.clone(),
                        data,
                    },
                    ContentPart::Text {
                        text: instruction.to_owned(),
                    },
                ]),
            }],
            system: None,
            max_tokens: Some(MAX_TOKENS),
        };
        let response = provider.complete(request).await?;
        descriptions.push(response.text.trim().to_owned());
    }

    Ok(descriptions)
}
