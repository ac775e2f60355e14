//! Reviser — the "rewrite" stage.
//!
//! Produces a corrected candidate from the verifier's feedback. The
//! verifier's suggestion is handed over as a strong prior — adopting a
//! usable suggestion directly keeps successive revisions from oscillating
//! between two bad drafts.

use crate::engine::context::AssembledContext;
use crate::engine::draft::strip_reply_artifacts;
use crate::engine::plan::Decision;
use crate::engine::prompts::PromptSet;
use crate::engine::verify::Verdict;
use crate::engine::EngineError;
use crate::providers::{complete_text, LlmProvider};

/// Token budget for the corrected candidate.
const MAX_TOKENS: u32 = 200;

/// Output of the reviser stage.
#[derive(Debug, Clone)]
pub struct Revision {
    /// The user prompt the stage was given (for chain logging).
    pub prompt: String,
    /// The corrected candidate, artifact-stripped.
    pub text: String,
}

/// Build the reviser's user prompt.
pub fn build_prompt(
    failed_candidate: &str,
    verdict: &Verdict,
    decision: &Decision,
    assembled: &AssembledContext,
) -> String {
    let ctx = &assembled.context;
    let mut prompt = String::with_capacity(1024);

    prompt.push_str("## Rejected draft\n");
    prompt.push_str(failed_candidate);
    prompt.push('\n');

    prompt.push_str("\n## Why it failed\n");
    prompt.push_str(&verdict.reason);
    prompt.push('\n');

    if let Some(ref suggestion) = verdict.suggestion {
        prompt.push_str("\n## Reviewer's suggestion\n");
        prompt.push_str(suggestion);
        prompt.push('\n');
    }

    prompt.push_str("\n## Original directive\n");
    prompt.push_str(&decision.text);
    prompt.push('\n');

    prompt.push_str(&format!("\n## Incoming from {}\n", ctx.counterpart_name));
    prompt.push_str(&ctx.incoming_text);
    prompt.push('\n');

    prompt.push_str(&format!(
        "\nStay within {} words.\n",
        assembled.stats.effective_upper
    ));

    prompt
}

/// Run the reviser stage.
///
/// # Errors
///
/// Returns [`EngineError::Completion`] when the completion service fails.
pub async fn run(
    provider: &dyn LlmProvider,
    prompts: &PromptSet,
    failed_candidate: &str,
    verdict: &Verdict,
    decision: &Decision,
    assembled: &AssembledContext,
) -> Result<Revision, EngineError> {
    let prompt = build_prompt(failed_candidate, verdict, decision, assembled);
    let raw = complete_text(provider, &prompts.rewrite, &prompt, MAX_TOKENS)
        .await
        .map_err(|source| EngineError::Completion {
            stage: "rewrite",
            source,
        })?;
    let text = strip_reply_artifacts(&raw, &assembled.context.subject_name);

    Ok(Revision { prompt, text })
}
