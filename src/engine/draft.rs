//! Drafter — the "write" stage.
//!
//! Produces literal candidate reply text under the planner's directive.
//! Completion services sometimes echo a speaker label or wrap the message
//! in quotes; those artifacts are stripped here so the verifier always
//! judges the bare message. Length is a soft constraint at this stage —
//! the verifier enforces it.

use crate::engine::context::AssembledContext;
use crate::engine::plan::Decision;
use crate::engine::prompts::PromptSet;
use crate::engine::EngineError;
use crate::providers::{complete_text, LlmProvider};

/// Token budget for the candidate output.
const MAX_TOKENS: u32 = 200;

/// Transcript lines shown to the writer.
const TRANSCRIPT_LINES: usize = 6;

/// Output of the drafter stage.
#[derive(Debug, Clone)]
pub struct Draft {
    /// The user prompt the stage was given (for chain logging).
    pub prompt: String,
    /// The candidate message, artifact-stripped.
    pub text: String,
}

/// Build the writer's user prompt.
pub fn build_prompt(decision: &Decision, assembled: &AssembledContext) -> String {
    let ctx = &assembled.context;
    let mut prompt = String::with_capacity(2048);

    prompt.push_str("## Directive\n");
    prompt.push_str(&decision.text);
    prompt.push('\n');

    if !decision.exemplars.is_empty() {
        prompt.push_str("\n## The subject's real messages, for rhythm\n");
        for ex in &decision.exemplars {
            prompt.push_str(&format!("- \"{ex}\"\n"));
        }
    }

    prompt.push_str("\n## Last exchanges\n");
    let transcript = ctx.transcript(TRANSCRIPT_LINES);
    if transcript.is_empty() {
        prompt.push_str("(no prior history)\n");
    } else {
        prompt.push_str(&transcript);
        prompt.push('\n');
    }

    prompt.push_str(&format!("\n## Incoming from {}\n", ctx.counterpart_name));
    prompt.push_str(&ctx.incoming_text);
    prompt.push('\n');

    if !ctx.image_descriptions.is_empty() {
        prompt.push_str("\n## Attached images\n");
        for desc in &ctx.image_descriptions {
            prompt.push_str("- ");
            prompt.push_str(desc);
            prompt.push('\n');
        }
    }

    prompt.push_str(&format!("\nWrite {}'s reply now.\n", ctx.subject_name));
    prompt
}

/// Run the drafter stage.
///
/// # Errors
///
/// Returns [`EngineError::Completion`] when the completion service fails.
pub async fn run(
    provider: &dyn LlmProvider,
    prompts: &PromptSet,
    decision: &Decision,
    assembled: &AssembledContext,
) -> Result<Draft, EngineError> {
    let prompt = build_prompt(decision, assembled);
    let raw = complete_text(provider, &prompts.write, &prompt, MAX_TOKENS)
        .await
        .map_err(|source| EngineError::Completion {
            stage: "write",
            source,
        })?;
    let text = strip_reply_artifacts(&raw, &assembled.context.subject_name);

    Ok(Draft { prompt, text })
}

// ---------------------------------------------------------------------------
// Artifact stripping
// ---------------------------------------------------------------------------

/// Strip speaker-label echoes and wrapping quotes from generated text.
///
/// Handles `Name:`, `[Name]:`, and a fully quoted message, in that order.
/// Applied to every draft and to adopted verifier suggestions.
pub fn strip_reply_artifacts(raw: &str, subject_name: &str) -> String {
    let mut text = raw.trim();

    for label in [format!("[{subject_name}]:"), format!("{subject_name}:")] {
        if text.len() >= label.len() && text.is_char_boundary(label.len()) {
            let (head, rest) = text.split_at(label.len());
            if head.eq_ignore_ascii_case(&label) {
                text = rest.trim_start();
                break;
            }
        }
    }

    strip_wrapping_quotes(text).trim().to_owned()
}

/// Remove one layer of symmetric wrapping quotes, when present.
pub fn strip_wrapping_quotes(text: &str) -> &str {
    let trimmed = text.trim();
    for (open, close) in [('"', '"'), ('\'', '\''), ('\u{201c}', '\u{201d}')] {
        if trimmed.len() >= 2 && trimmed.starts_with(open) && trimmed.ends_with(close) {
            let inner = &trimmed[open.len_utf8()..trimmed.len().saturating_sub(close.len_utf8())];
            // Only strip when the quotes actually wrap the whole message.
            if !inner.contains(open) && !inner.contains(close) {
                return inner.trim();
            }
        }
    }
    trimmed
}
