//! Conversation context assembly.
//!
//! Gathers everything one reply invocation needs — recent history, the
//! style document, Q&A notes, image descriptions — and derives the length
//! envelope and emergency flag from it. The assembler only reads; stores
//! are injected behind traits so the engine stays independently testable.
//!
//! A failed store read degrades to an empty or partial context instead of
//! aborting: a reply with less context beats losing the ability to reply
//! because a collaborator hiccuped.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::engine::emergency::is_emergency;
use crate::engine::stats::WordCountStats;
use crate::engine::ReplyPolicy;

// ---------------------------------------------------------------------------
// Domain types
// ---------------------------------------------------------------------------

/// One line of conversation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryLine {
    /// Display name of whoever sent the line.
    pub speaker: String,
    /// Human-readable timestamp label (e.g. `Mon 14:02`). May be empty.
    pub timestamp_label: String,
    /// True when this outgoing line was written by the engine, not the
    /// subject. Downstream stages must never imitate these as if they were
    /// the human's own phrasing.
    pub is_generated: bool,
    /// The message text.
    pub text: String,
}

/// Immutable snapshot of everything known about one conversation at the
/// moment a reply invocation starts.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    /// The person being impersonated.
    pub subject_name: String,
    /// Stable identifier of the other party.
    pub counterpart_id: String,
    /// Display name of the other party.
    pub counterpart_name: String,
    /// Recent history, ordered oldest to newest.
    pub history: Vec<HistoryLine>,
    /// The incoming text to answer. Rapid-fire messages arrive pre-joined
    /// by newlines; this core never debounces.
    pub incoming_text: String,
    /// Descriptions of any attached images, one per image.
    pub image_descriptions: Vec<String>,
    /// Free-text relationship facts supplied by the subject.
    pub qa_notes: Option<String>,
    /// Long-form texting idiolect profile, when one exists.
    pub style_document: Option<String>,
}

impl ConversationContext {
    /// The subject's last `k` outgoing messages, newest first, excluding
    /// machine-generated ones. Consulted by the analyzer, planner, and
    /// verifier for anti-repetition.
    pub fn recent_replies(&self, k: usize) -> Vec<String> {
        self.history
            .iter()
            .rev()
            .filter(|l| l.speaker == self.subject_name && !l.is_generated)
            .take(k)
            .map(|l| l.text.clone())
            .collect()
    }

    /// Render the last `last_n` history lines as a prompt-ready transcript.
    pub fn transcript(&self, last_n: usize) -> String {
        let skip = self.history.len().saturating_sub(last_n);
        self.history
            .iter()
            .skip(skip)
            .map(|l| {
                if l.timestamp_label.is_empty() {
                    format!("{}: {}", l.speaker, l.text)
                } else {
                    format!("[{}] {}: {}", l.timestamp_label, l.speaker, l.text)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ---------------------------------------------------------------------------
// Store seams
// ---------------------------------------------------------------------------

/// Read access to the conversation history store.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Return up to `limit` most recent lines for a counterpart, ordered
    /// oldest to newest.
    async fn recent(&self, counterpart_id: &str, limit: u32) -> anyhow::Result<Vec<HistoryLine>>;
}

/// Read access to the style-profile and notes store.
#[async_trait]
pub trait StyleStore: Send + Sync {
    /// Load the long-form style document for a counterpart, if any.
    async fn load_profile(&self, counterpart_id: &str) -> anyhow::Result<Option<String>>;

    /// Load the subject-supplied Q&A notes for a counterpart, if any.
    async fn load_notes(&self, counterpart_id: &str) -> anyhow::Result<Option<String>>;
}

// ---------------------------------------------------------------------------
// Assembler
// ---------------------------------------------------------------------------

/// Context plus the values derived from it, built once per invocation.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    /// The immutable conversation snapshot.
    pub context: ConversationContext,
    /// Length envelope for this conversation, emergency override applied.
    pub stats: WordCountStats,
    /// True when the incoming text matched a distress keyword.
    pub emergency: bool,
}

/// Builds [`AssembledContext`] snapshots from the injected stores.
pub struct ContextAssembler {
    history: Arc<dyn HistoryStore>,
    style: Arc<dyn StyleStore>,
    policy: ReplyPolicy,
}

impl ContextAssembler {
    /// Create an assembler over the given stores.
    pub fn new(history: Arc<dyn HistoryStore>, style: Arc<dyn StyleStore>, policy: ReplyPolicy) -> Self {
        Self {
            history,
            style,
            policy,
        }
    }

    /// Assemble the context for one invocation.
    ///
    /// Store failures are logged and degrade to empty history or a missing
    /// profile; this method itself never fails.
    pub async fn assemble(
        &self,
        subject_name: &str,
        counterpart_id: &str,
        counterpart_name: &str,
        incoming_text: &str,
        image_descriptions: Vec<String>,
    ) -> AssembledContext {
        let history = match self
            .history
            .recent(counterpart_id, self.policy.history_window)
            .await
        {
            Ok(lines) => lines,
            Err(e) => {
                warn!(counterpart_id, error = %e, "history fetch failed, running with empty history");
                Vec::new()
            }
        };

        let style_document = match self.style.load_profile(counterpart_id).await {
            Ok(doc) => doc,
            Err(e) => {
                warn!(counterpart_id, error = %e, "style profile load failed, running without one");
                None
            }
        };

        let qa_notes = match self.style.load_notes(counterpart_id).await {
            Ok(notes) => notes,
            Err(e) => {
                warn!(counterpart_id, error = %e, "qa notes load failed, running without them");
                None
            }
        };

        let context = ConversationContext {
            subject_name: subject_name.to_owned(),
            counterpart_id: counterpart_id.to_owned(),
            counterpart_name: counterpart_name.to_owned(),
            history,
            incoming_text: incoming_text.to_owned(),
            image_descriptions,
            qa_notes,
            style_document,
        };

        let emergency = is_emergency(&context.incoming_text);
        let mut stats = WordCountStats::for_subject(&context.history, subject_name);
        if emergency {
            stats = stats.with_emergency_ceiling(self.policy.emergency_ceiling);
        }

        debug!(
            counterpart_id,
            history_lines = context.history.len(),
            has_profile = context.style_document.is_some(),
            emergency,
            effective_upper = stats.effective_upper,
            "context assembled"
        );

        AssembledContext {
            context,
            stats,
            emergency,
        }
    }
}
