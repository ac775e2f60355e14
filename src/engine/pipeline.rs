//! Pipeline orchestration and the retry state machine.
//!
//! One invocation walks think → decide → write, then loops verify ⇄
//! rewrite under a fixed retry budget until it reaches a terminal outcome.
//! The loop is the only cyclic structure in the engine and always
//! terminates. A candidate that fails every gate and leaves no credible
//! fallback results in deliberate silence — the engine never sends a reply
//! it could not stand behind.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::engine::analyze::{self, Confidence};
use crate::engine::chainlog::{ChainLog, ChainSink};
use crate::engine::context::{AssembledContext, ContextAssembler};
use crate::engine::draft::{self, strip_wrapping_quotes};
use crate::engine::filler::word_count;
use crate::engine::prompts::PromptSet;
use crate::engine::revise;
use crate::engine::verify::{self, Verdict, VerdictSource};
use crate::engine::{EngineError, ReplyOutcome, ReplyPolicy};
use crate::providers::router::ModelRouter;
use crate::providers::LlmProvider;

/// Word floor below which a gross-length comparison is meaningless; kept in
/// sync with the verifier's local check.
const SUGGESTION_LENGTH_FLOOR: u32 = 12;

/// The reply-generation pipeline.
///
/// Holds no per-invocation state: every call assembles a fresh context and
/// writes a fresh chain log, so concurrent invocations need no
/// coordination.
pub struct ReplyPipeline {
    router: Arc<ModelRouter>,
    assembler: ContextAssembler,
    prompts: PromptSet,
    policy: ReplyPolicy,
}

impl ReplyPipeline {
    /// Create a pipeline over the given provider router and assembler.
    pub fn new(
        router: Arc<ModelRouter>,
        assembler: ContextAssembler,
        prompts: PromptSet,
        policy: ReplyPolicy,
    ) -> Self {
        Self {
            router,
            assembler,
            prompts,
            policy,
        }
    }

    /// Assemble context for an incoming message and run the full chain.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when a generation stage loses its provider
    /// or the completion service fails outside verification.
    pub async fn respond(
        &self,
        subject_name: &str,
        counterpart_id: &str,
        counterpart_name: &str,
        incoming_text: &str,
        image_descriptions: Vec<String>,
        sinks: Vec<Box<dyn ChainSink>>,
    ) -> Result<ReplyOutcome, EngineError> {
        let assembled = self
            .assembler
            .assemble(
                subject_name,
                counterpart_id,
                counterpart_name,
                incoming_text,
                image_descriptions,
            )
            .await;
        self.run(&assembled, sinks).await
    }

    /// Run the chain over an already-assembled context.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] on provider resolution or generation-stage
    /// completion failure. A judge failure during verification does NOT
    /// error — the resolver fails open with [`ReplyOutcome::SentUnverified`].
    pub async fn run(
        &self,
        assembled: &AssembledContext,
        sinks: Vec<Box<dyn ChainSink>>,
    ) -> Result<ReplyOutcome, EngineError> {
        let mut chain = ChainLog::new(sinks);

        // Generation stages. A completion failure here propagates: no safe
        // fallback text exists yet, so nothing is sent.
        let provider = self.provider_for("think")?;
        let analysis =
            analyze::run(provider.as_ref(), &self.prompts, assembled, &self.policy).await?;
        chain.record(
            "think",
            0,
            &analysis.prompt,
            &analysis.text,
            None,
            Some(analysis.confidence != Confidence::Low),
        );
        debug!(confidence = analysis.confidence.as_str(), "analysis complete");

        let provider = self.provider_for("decide")?;
        let decision = crate::engine::plan::run(
            provider.as_ref(),
            &self.prompts,
            &analysis,
            assembled,
            &self.policy,
        )
        .await?;
        chain.record("decide", 0, &decision.prompt, &decision.text, None, None);

        let provider = self.provider_for("write")?;
        let first_draft =
            draft::run(provider.as_ref(), &self.prompts, &decision, assembled).await?;
        chain.record(
            "write",
            0,
            &first_draft.prompt,
            &first_draft.text,
            Some(word_count(&first_draft.text)),
            None,
        );

        // Verify ⇄ rewrite loop, bounded by the retry budget.
        let verify_provider = self.provider_for("verify")?;
        let max_attempts = self.policy.max_retries.saturating_add(1);
        let mut candidate = first_draft.text;
        let mut last_verdict: Option<Verdict> = None;

        for attempt in 0..max_attempts {
            let verification = match verify::run(
                verify_provider.as_ref(),
                &self.prompts,
                &candidate,
                assembled,
                &self.policy,
            )
            .await
            {
                Ok(v) => v,
                Err(e) => {
                    // Infrastructure failure, not a verdict: fail open. A
                    // plausible-but-unverified reply beats silence caused by
                    // a flaky judge.
                    warn!(attempt, error = %e, "judge call failed, sending last candidate unverified");
                    chain.record(
                        "verify",
                        attempt,
                        &candidate,
                        &format!("judge unavailable: {e}"),
                        Some(word_count(&candidate)),
                        None,
                    );
                    let outcome = ReplyOutcome::SentUnverified {
                        text: candidate,
                        attempts: attempt.saturating_add(1),
                    };
                    chain.finish(&outcome);
                    return Ok(outcome);
                }
            };

            let verdict = verification.verdict;
            chain.record(
                "verify",
                attempt,
                &candidate,
                &describe_verdict(&verdict, verification.source),
                Some(word_count(&candidate)),
                Some(verdict.pass),
            );

            if verdict.pass {
                let outcome = ReplyOutcome::Sent {
                    text: candidate,
                    attempts: attempt.saturating_add(1),
                };
                chain.finish(&outcome);
                info!(attempts = outcome.attempts(), "reply approved");
                return Ok(outcome);
            }

            let retries_remain = attempt.saturating_add(1) < max_attempts;
            if retries_remain {
                let provider = self.provider_for("rewrite")?;
                let revision = revise::run(
                    provider.as_ref(),
                    &self.prompts,
                    &candidate,
                    &verdict,
                    &decision,
                    assembled,
                )
                .await?;
                chain.record(
                    "rewrite",
                    attempt.saturating_add(1),
                    &revision.prompt,
                    &revision.text,
                    Some(word_count(&revision.text)),
                    None,
                );
                candidate = revision.text;
            }
            last_verdict = Some(verdict);
        }

        // Retries exhausted: adopt the last suggestion if it is credible,
        // otherwise stay silent on purpose.
        let outcome = match usable_suggestion(
            last_verdict.as_ref(),
            assembled.stats.effective_upper,
        ) {
            Some(text) => {
                info!("adopting verifier suggestion after exhausted retries");
                ReplyOutcome::SentSuggestion {
                    text,
                    attempts: max_attempts,
                }
            }
            None => {
                info!("no candidate survived, skipping reply");
                ReplyOutcome::Skipped {
                    attempts: max_attempts,
                }
            }
        };
        chain.finish(&outcome);
        Ok(outcome)
    }

    fn provider_for(&self, stage: &'static str) -> Result<Arc<dyn LlmProvider>, EngineError> {
        self.router
            .resolve(Some(stage))
            .map_err(|e| EngineError::Resolution {
                stage,
                message: e.to_string(),
            })
    }
}

/// Decide whether an exhausted chain may fall back to the verifier's last
/// suggestion: present, not the literal `none` (filtered at parse time),
/// and short enough to plausibly be a real message.
fn usable_suggestion(last_verdict: Option<&Verdict>, effective_upper: u32) -> Option<String> {
    let suggestion = last_verdict?.suggestion.as_deref()?;
    let text = strip_wrapping_quotes(suggestion);
    if text.is_empty() {
        return None;
    }
    let words = word_count(text);
    if words > effective_upper.saturating_mul(2) && words > SUGGESTION_LENGTH_FLOOR {
        return None;
    }
    Some(text.to_owned())
}

fn describe_verdict(verdict: &Verdict, source: VerdictSource) -> String {
    let gate = match source {
        VerdictSource::Local => "local",
        VerdictSource::Judge => "judge",
    };
    let status = if verdict.pass { "PASS" } else { "FAIL" };
    match verdict.suggestion {
        Some(ref s) => format!("{status} ({gate}) {} | suggestion: {s}", verdict.reason),
        None => format!("{status} ({gate}) {}", verdict.reason),
    }
}
