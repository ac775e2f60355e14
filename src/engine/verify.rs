//! Verifier — the quality gate.
//!
//! Two layers. The hard checks are purely local and run first: an exact
//! duplicate of a recent reply or a grossly oversized candidate fails
//! before the completion service is involved at all. Repetition and gross
//! length are algorithmically decidable, and the gate must catch them even
//! when the judge model is down or lying. Everything softer — relevance,
//! filler spam, language, voice, fabrication — goes to the judge, whose
//! output is parsed via a fixed textual contract.

use crate::engine::context::AssembledContext;
use crate::engine::filler::word_count;
use crate::engine::prompts::PromptSet;
use crate::engine::ReplyPolicy;
use crate::providers::{complete_text, LlmProvider, ProviderError};

/// Token budget for the judge's verdict.
const MAX_TOKENS: u32 = 300;

/// Transcript lines shown to the judge.
const TRANSCRIPT_LINES: usize = 8;

/// Word count above which a candidate is grossly oversized regardless of
/// the envelope multiplier.
const GROSS_LENGTH_FLOOR: u32 = 12;

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// The verifier's judgement of one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the candidate may be sent.
    pub pass: bool,
    /// One-line explanation.
    pub reason: String,
    /// Replacement the verifier proposes on failure, if any. Used as a
    /// last-resort fallback when every revision is exhausted.
    pub suggestion: Option<String>,
}

impl Verdict {
    /// A passing verdict.
    pub fn pass(reason: impl Into<String>) -> Self {
        Self {
            pass: true,
            reason: reason.into(),
            suggestion: None,
        }
    }

    /// A failing verdict with an optional replacement.
    pub fn fail(reason: impl Into<String>, suggestion: Option<String>) -> Self {
        Self {
            pass: false,
            reason: reason.into(),
            suggestion,
        }
    }
}

/// Where a verdict came from. Local verdicts cost nothing and are
/// trustworthy by construction; judge verdicts depend on the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictSource {
    /// Produced by a deterministic local check.
    Local,
    /// Produced by the judge model.
    Judge,
}

/// Verdict plus provenance and the judge prompt (for chain logging).
#[derive(Debug, Clone)]
pub struct Verification {
    /// The judgement.
    pub verdict: Verdict,
    /// Local check or judge model.
    pub source: VerdictSource,
    /// The judge's user prompt, empty for local verdicts.
    pub prompt: String,
}

// ---------------------------------------------------------------------------
// Local checks
// ---------------------------------------------------------------------------

/// Run the deterministic checks that never touch the completion service.
///
/// Returns a failing verdict for an exact duplicate of a recent reply
/// (case- and whitespace-insensitive) or for a grossly oversized candidate
/// (more than twice the effective upper bound AND above the absolute
/// floor). Returns `None` when the candidate survives both.
pub fn local_checks(
    candidate: &str,
    recent_replies: &[String],
    effective_upper: u32,
) -> Option<Verdict> {
    let normalized = normalize_for_comparison(candidate);
    if recent_replies
        .iter()
        .any(|r| normalize_for_comparison(r) == normalized)
    {
        return Some(Verdict::fail(
            "duplicate of a recent reply",
            Some("Say something different from the last few messages.".to_owned()),
        ));
    }

    let words = word_count(candidate);
    if words > effective_upper.saturating_mul(2) && words > GROSS_LENGTH_FLOOR {
        return Some(Verdict::fail(
            format!("grossly over length: {words} words against an upper bound of {effective_upper}"),
            Some(format!(
                "Cut it down to at most {effective_upper} words, keeping only the core point."
            )),
        ));
    }

    None
}

/// Lowercase and collapse all whitespace for duplicate comparison.
fn normalize_for_comparison(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// ---------------------------------------------------------------------------
// Judge
// ---------------------------------------------------------------------------

/// Build the judge's user prompt.
pub fn build_prompt(
    candidate: &str,
    assembled: &AssembledContext,
    policy: &ReplyPolicy,
) -> String {
    let ctx = &assembled.context;
    let stats = &assembled.stats;
    let mut prompt = String::with_capacity(2048);

    prompt.push_str("## Candidate reply\n");
    prompt.push_str(candidate);
    prompt.push('\n');

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

    let recent = ctx.recent_replies(policy.recent_replies);
    if !recent.is_empty() {
        prompt.push_str(&format!("\n## {}'s recent replies\n", ctx.subject_name));
        for reply in &recent {
            prompt.push_str(&format!("- \"{reply}\"\n"));
        }
    }

    prompt.push_str(&format!(
        "\n## Length\n{} Allowed range for this reply: 1-{} words.\n",
        stats.prompt_summary(),
        stats.effective_upper
    ));

    if assembled.emergency {
        prompt.push_str(
            "\nThe incoming message may signal distress. A dismissive or flippant \
             reply must fail.\n",
        );
    }

    prompt
}

/// Parse the judge's output via the fixed `PASS`/`FAIL`, `REASON:`,
/// `SUGGESTION:` contract.
///
/// The first non-empty line decides pass/fail; an output matching neither
/// token fails closed with the raw text as the reason. A `SUGGESTION:` of
/// the literal `none` (any casing) means no suggestion.
pub fn parse_verdict(output: &str) -> Verdict {
    let mut pass: Option<bool> = None;
    let mut reason = String::new();
    let mut suggestion: Option<String> = None;

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let upper = trimmed.to_uppercase();
        if pass.is_none() {
            if upper.starts_with("PASS") {
                pass = Some(true);
                continue;
            }
            if upper.starts_with("FAIL") {
                pass = Some(false);
                continue;
            }
        }
        if let Some(rest) = strip_prefix_ignore_case(trimmed, "REASON:") {
            reason = rest.trim().to_owned();
        } else if let Some(rest) = strip_prefix_ignore_case(trimmed, "SUGGESTION:") {
            let value = rest.trim();
            if !value.is_empty() && !value.eq_ignore_ascii_case("none") {
                suggestion = Some(value.to_owned());
            }
        }
    }

    match pass {
        Some(true) => Verdict::pass(if reason.is_empty() {
            "judge passed".to_owned()
        } else {
            reason
        }),
        Some(false) => Verdict::fail(
            if reason.is_empty() {
                "judge failed the candidate".to_owned()
            } else {
                reason
            },
            suggestion,
        ),
        // Unparseable output is a failed gate, not a free pass.
        None => Verdict::fail(
            format!("unparseable verdict: {}", output.trim()),
            suggestion,
        ),
    }
}

fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    if line.len() >= prefix.len()
        && line.is_char_boundary(prefix.len())
        && line[..prefix.len()].eq_ignore_ascii_case(prefix)
    {
        Some(&line[prefix.len()..])
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Verify one candidate: local checks first, judge second.
///
/// # Errors
///
/// Returns the raw [`ProviderError`] when the judge call itself fails, so
/// the resolver can distinguish infrastructure failure (fail open) from a
/// failing verdict. Local checks can never produce this error.
pub async fn run(
    provider: &dyn LlmProvider,
    prompts: &PromptSet,
    candidate: &str,
    assembled: &AssembledContext,
    policy: &ReplyPolicy,
) -> Result<Verification, ProviderError> {
    let recent = assembled.context.recent_replies(policy.recent_replies);
    if let Some(verdict) = local_checks(candidate, &recent, assembled.stats.effective_upper) {
        return Ok(Verification {
            verdict,
            source: VerdictSource::Local,
            prompt: String::new(),
        });
    }

    let prompt = build_prompt(candidate, assembled, policy);
    let output = complete_text(provider, &prompts.verify, &prompt, MAX_TOKENS).await?;

    Ok(Verification {
        verdict: parse_verdict(&output),
        source: VerdictSource::Judge,
        prompt,
    })
}
