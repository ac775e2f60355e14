//! Analyzer — the "think" stage.
//!
//! Produces a free-form situational read of the conversation: what just
//! happened, what the counterpart expects, whether a proper answer needs
//! knowledge the engine cannot have, and the current mood. The analysis
//! ends with a self-reported confidence level. LOW confidence is a signal
//! for the planner to prefer a dodge, never a hard stop.

use crate::engine::context::AssembledContext;
use crate::engine::prompts::PromptSet;
use crate::engine::{EngineError, ReplyPolicy};
use crate::providers::{complete_text, LlmProvider};

/// Token budget for the analysis output.
const MAX_TOKENS: u32 = 600;

/// Transcript lines shown to the analyzer.
const TRANSCRIPT_LINES: usize = 12;

/// Self-reported confidence in the situational read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// The analyzer knows what a good reply looks like.
    High,
    /// Workable but uncertain.
    Medium,
    /// The analyzer is unsure what a good reply even is.
    Low,
}

impl Confidence {
    /// Parse the trailing `CONFIDENCE:` line. Absent or malformed lines
    /// default to `Medium` — a missing tag is not a reason to dodge.
    pub fn parse(analysis_text: &str) -> Self {
        for line in analysis_text.lines().rev() {
            let upper = line.trim().to_uppercase();
            if let Some(value) = upper.strip_prefix("CONFIDENCE:") {
                return match value.trim() {
                    "HIGH" => Self::High,
                    "LOW" => Self::Low,
                    _ => Self::Medium,
                };
            }
        }
        Self::Medium
    }

    /// Stable lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Output of the analyzer stage.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// The user prompt the stage was given (for chain logging).
    pub prompt: String,
    /// Full analysis text.
    pub text: String,
    /// Parsed confidence level.
    pub confidence: Confidence,
}

/// Build the analyzer's user prompt from the assembled context.
pub fn build_prompt(assembled: &AssembledContext, policy: &ReplyPolicy) -> String {
    let ctx = &assembled.context;
    let mut prompt = String::with_capacity(2048);

    prompt.push_str("## Conversation\n");
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

    let recent = ctx.recent_replies(policy.recent_replies);
    if !recent.is_empty() {
        prompt.push_str(&format!("\n## {}'s recent replies\n", ctx.subject_name));
        for reply in &recent {
            prompt.push_str("- ");
            prompt.push_str(reply);
            prompt.push('\n');
        }
    }

    if assembled.emergency {
        prompt.push_str(
            "\nNote: the incoming message contains possible distress signals. \
             Weigh that heavily in your read of the mood.\n",
        );
    }

    prompt
}

/// Run the analyzer stage.
///
/// # Errors
///
/// Returns [`EngineError::Completion`] when the completion service fails;
/// no reply can be produced without an analysis.
pub async fn run(
    provider: &dyn LlmProvider,
    prompts: &PromptSet,
    assembled: &AssembledContext,
    policy: &ReplyPolicy,
) -> Result<Analysis, EngineError> {
    let prompt = build_prompt(assembled, policy);
    let text = complete_text(provider, &prompts.think, &prompt, MAX_TOKENS)
        .await
        .map_err(|source| EngineError::Completion {
            stage: "think",
            source,
        })?;
    let confidence = Confidence::parse(&text);

    Ok(Analysis {
        prompt,
        text,
        confidence,
    })
}
