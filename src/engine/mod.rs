//! The reply-generation pipeline.
//!
//! One invocation runs context assembly, then a chain of completion-backed
//! stages — think, decide, write — followed by a bounded verify/rewrite
//! loop that either approves a candidate or ends in a deliberate no-op.
//! Every step is appended to a per-invocation chain log.
//!
//! Invocations share no mutable state: each one reads its own context
//! snapshot and writes a uniquely keyed log, so concurrent invocations for
//! different counterparts need no coordination.

pub mod analyze;
pub mod chainlog;
pub mod context;
pub mod draft;
pub mod emergency;
pub mod filler;
pub mod pipeline;
pub mod plan;
pub mod prompts;
pub mod revise;
pub mod stats;
pub mod verify;

use crate::providers::ProviderError;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Tunable reply-policy knobs, loaded from config.
#[derive(Debug, Clone)]
pub struct ReplyPolicy {
    /// Revisions allowed after the first failed verification. Total
    /// verification attempts per invocation is `max_retries + 1`.
    pub max_retries: u32,
    /// How many history lines to pull per invocation.
    pub history_window: u32,
    /// Size of the recent-reply set used for anti-repetition.
    pub recent_replies: usize,
    /// Fixed word ceiling that replaces the statistical upper bound when
    /// the incoming text looks like an emergency.
    pub emergency_ceiling: u32,
    /// How many style exemplars the planner shows the drafter.
    pub exemplar_count: usize,
}

impl Default for ReplyPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            history_window: 60,
            recent_replies: 5,
            emergency_ceiling: 15,
            exemplar_count: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that abort a pipeline invocation.
///
/// Store failures never appear here — the context assembler degrades to a
/// partial context instead. A completion failure during verification does
/// not abort either; the resolver fails open (see
/// [`pipeline::ReplyPipeline`]).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The completion service failed during a generation stage. No safe
    /// fallback text exists yet, so nothing is sent.
    #[error("completion failed during {stage}: {source}")]
    Completion {
        /// The stage that was running.
        stage: &'static str,
        /// The underlying provider failure.
        #[source]
        source: ProviderError,
    },

    /// No provider could be resolved for a stage.
    #[error("provider resolution failed for {stage}: {message}")]
    Resolution {
        /// The stage that needed a provider.
        stage: &'static str,
        /// Human-readable resolution failure.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Terminal outcome of one reply invocation.
///
/// The only externally observable effects are "a message was sent" or "no
/// message was sent"; which variant produced a sent message is operational
/// telemetry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// A candidate passed verification.
    Sent {
        /// The approved reply text.
        text: String,
        /// Verification attempts consumed.
        attempts: u32,
    },
    /// The judge call itself failed, so the last candidate went out
    /// unverified. A plausible-but-unverified reply beats total silence
    /// caused by infrastructure flakiness.
    SentUnverified {
        /// The unverified reply text.
        text: String,
        /// Verification attempts consumed before the failure.
        attempts: u32,
    },
    /// Every attempt failed but the last verdict carried a usable
    /// suggestion, adopted verbatim.
    SentSuggestion {
        /// The adopted suggestion text.
        text: String,
        /// Verification attempts consumed.
        attempts: u32,
    },
    /// Every attempt failed and no credible fallback existed. Silence is an
    /// intentional outcome, not a bug.
    Skipped {
        /// Verification attempts consumed.
        attempts: u32,
    },
}

impl ReplyOutcome {
    /// The outgoing text, when a message is to be sent.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Sent { text, .. }
            | Self::SentUnverified { text, .. }
            | Self::SentSuggestion { text, .. } => Some(text),
            Self::Skipped { .. } => None,
        }
    }

    /// Number of verification attempts this invocation consumed.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Sent { attempts, .. }
            | Self::SentUnverified { attempts, .. }
            | Self::SentSuggestion { attempts, .. }
            | Self::Skipped { attempts } => *attempts,
        }
    }

    /// Stable label used in chain logs and tracing fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sent { .. } => "sent",
            Self::SentUnverified { .. } => "sent_unverified",
            Self::SentSuggestion { .. } => "sent_suggestion",
            Self::Skipped { .. } => "skipped",
        }
    }
}
