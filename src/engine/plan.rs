//! Planner — the "decide" stage.
//!
//! Turns the analysis into a directive the writer can follow: intent,
//! commit-or-dodge, target length, expected language, which exemplars to
//! imitate, and explicit anti-patterns. The planner never fabricates facts
//! the engine cannot know — the instruction forces the dodge branch when
//! the analysis flagged missing real-world knowledge, and LOW confidence
//! biases the same way.

use crate::engine::analyze::{Analysis, Confidence};
use crate::engine::context::AssembledContext;
use crate::engine::filler::select_exemplars;
use crate::engine::prompts::PromptSet;
use crate::engine::{EngineError, ReplyPolicy};
use crate::providers::{complete_text, LlmProvider};

/// Token budget for the decision output.
const MAX_TOKENS: u32 = 500;

/// Characters of the style document shown to the planner.
const STYLE_DOC_CHARS: usize = 2_500;

/// Output of the planner stage.
#[derive(Debug, Clone)]
pub struct Decision {
    /// The user prompt the stage was given (for chain logging).
    pub prompt: String,
    /// The directive text handed to the writer.
    pub text: String,
    /// Exemplars selected for imitation, also shown to the writer.
    pub exemplars: Vec<String>,
}

/// Build the planner's user prompt.
pub fn build_prompt(
    analysis: &Analysis,
    assembled: &AssembledContext,
    exemplars: &[String],
    policy: &ReplyPolicy,
) -> String {
    let ctx = &assembled.context;
    let stats = &assembled.stats;
    let mut prompt = String::with_capacity(4096);

    prompt.push_str("## Analysis\n");
    prompt.push_str(&analysis.text);
    prompt.push('\n');

    if analysis.confidence == Confidence::Low {
        prompt.push_str(
            "\nThe analysis confidence is LOW: prefer a dodge or light deflection \
             over committing to an answer.\n",
        );
    }

    if let Some(ref doc) = ctx.style_document {
        prompt.push_str(&format!("\n## How {} texts\n", ctx.subject_name));
        push_truncated(&mut prompt, doc, STYLE_DOC_CHARS);
        prompt.push('\n');
    }

    if let Some(ref notes) = ctx.qa_notes {
        prompt.push_str("\n## Relationship notes\n");
        prompt.push_str(notes);
        prompt.push('\n');
    }

    prompt.push_str("\n## Length\n");
    prompt.push_str(&format!(
        "{} Target between 1 and {} words, leaning toward the average.\n",
        stats.prompt_summary(),
        stats.effective_upper
    ));

    if !exemplars.is_empty() {
        prompt.push_str("\n## Real messages to imitate\n");
        for ex in exemplars {
            prompt.push_str(&format!("- \"{ex}\"\n"));
        }
    }

    let recent = ctx.recent_replies(policy.recent_replies);
    if !recent.is_empty() {
        prompt.push_str("\n## Recently sent (do not repeat these, or their filler words)\n");
        for reply in &recent {
            prompt.push_str(&format!("- \"{reply}\"\n"));
        }
    }

    if !ctx.image_descriptions.is_empty() {
        prompt.push_str("\nThe incoming message has images attached; the reply must react to them.\n");
    }

    if assembled.emergency {
        prompt.push_str(&format!(
            "\nPossible emergency: choose a caring, present reply. Up to {} words are allowed.\n",
            policy.emergency_ceiling
        ));
    }

    prompt
}

/// Run the planner stage.
///
/// # Errors
///
/// Returns [`EngineError::Completion`] when the completion service fails.
pub async fn run(
    provider: &dyn LlmProvider,
    prompts: &PromptSet,
    analysis: &Analysis,
    assembled: &AssembledContext,
    policy: &ReplyPolicy,
) -> Result<Decision, EngineError> {
    let exemplars = select_exemplars(
        &assembled.context.history,
        &assembled.context.subject_name,
        policy.exemplar_count,
    );
    let prompt = build_prompt(analysis, assembled, &exemplars, policy);
    let text = complete_text(provider, &prompts.decide, &prompt, MAX_TOKENS)
        .await
        .map_err(|source| EngineError::Completion {
            stage: "decide",
            source,
        })?;

    Ok(Decision {
        prompt,
        text,
        exemplars,
    })
}

/// Append at most `max_chars` characters of `text`.
fn push_truncated(buf: &mut String, text: &str, max_chars: usize) {
    if text.chars().count() <= max_chars {
        buf.push_str(text);
    } else {
        buf.extend(text.chars().take(max_chars));
        buf.push_str("\n[...]");
    }
}
