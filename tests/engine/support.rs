//! Shared fakes for engine tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use construct::engine::context::{
    AssembledContext, ConversationContext, HistoryLine, HistoryStore, StyleStore,
};
use construct::engine::stats::WordCountStats;
use construct::providers::{
    CompletionRequest, CompletionResponse, LlmProvider, ProviderError, StopReason, UsageStats,
};

/// Build a history line quickly.
pub fn line(speaker: &str, text: &str, is_generated: bool) -> HistoryLine {
    HistoryLine {
        speaker: speaker.to_owned(),
        timestamp_label: String::new(),
        is_generated,
        text: text.to_owned(),
    }
}

/// Build an assembled context directly, bypassing the stores.
pub fn assembled(
    subject: &str,
    history: Vec<HistoryLine>,
    incoming: &str,
    emergency: bool,
) -> AssembledContext {
    let stats = WordCountStats::for_subject(&history, subject);
    let stats = if emergency {
        stats.with_emergency_ceiling(15)
    } else {
        stats
    };
    AssembledContext {
        context: ConversationContext {
            subject_name: subject.to_owned(),
            counterpart_id: "c1".to_owned(),
            counterpart_name: "Lena".to_owned(),
            history,
            incoming_text: incoming.to_owned(),
            image_descriptions: Vec::new(),
            qa_notes: None,
            style_document: None,
        },
        stats,
        emergency,
    }
}

// ---------------------------------------------------------------------------
// Scripted provider
// ---------------------------------------------------------------------------

/// One scripted turn: either a response text or a transport failure.
pub enum Scripted {
    /// Respond with this text.
    Text(&'static str),
    /// Fail the call like a transport error would.
    Fail,
}

/// An [`LlmProvider`] that replays a scripted sequence of responses and
/// counts every call it receives.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Scripted>>,
    calls: AtomicU32,
}

impl ScriptedProvider {
    /// Create a provider that replays `responses` in order.
    pub fn new(responses: Vec<Scripted>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            calls: AtomicU32::new(0),
        }
    }

    /// Number of completion calls received so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .responses
            .lock()
            .expect("script lock poisoned")
            .pop_front();
        match next {
            Some(Scripted::Text(text)) => Ok(CompletionResponse {
                text: text.to_owned(),
                stop_reason: StopReason::EndTurn,
                usage: UsageStats {
                    input_tokens: 0,
                    output_tokens: 0,
                },
                model: "fake/scripted".to_owned(),
            }),
            Some(Scripted::Fail) => Err(ProviderError::Unavailable(
                "scripted transport failure".to_owned(),
            )),
            None => Err(ProviderError::Unavailable(
                "script exhausted unexpectedly".to_owned(),
            )),
        }
    }

    fn supports_vision(&self) -> bool {
        false
    }

    fn model_id(&self) -> &str {
        "fake/scripted"
    }
}

// ---------------------------------------------------------------------------
// Sink spy
// ---------------------------------------------------------------------------

/// What the spy saw of one chain event.
#[derive(Debug, Clone)]
pub struct SpiedEvent {
    /// Stage name.
    pub step: &'static str,
    /// Attempt index.
    pub attempt: u32,
    /// Pass/fail tag.
    pub passed: Option<bool>,
}

#[derive(Default)]
struct SpyState {
    events: Vec<SpiedEvent>,
    outcome: Option<(&'static str, u32)>,
}

/// A [`ChainSink`] that records everything for later assertions.
#[derive(Clone, Default)]
pub struct SinkSpy(std::sync::Arc<Mutex<SpyState>>);

impl SinkSpy {
    /// All recorded events.
    pub fn events(&self) -> Vec<SpiedEvent> {
        self.0.lock().expect("spy lock poisoned").events.clone()
    }

    /// Recorded events for one step name.
    pub fn events_for(&self, step: &str) -> Vec<SpiedEvent> {
        self.events().into_iter().filter(|e| e.step == step).collect()
    }

    /// The terminal outcome label and attempt count, if finished.
    pub fn outcome(&self) -> Option<(&'static str, u32)> {
        self.0.lock().expect("spy lock poisoned").outcome
    }
}

impl construct::engine::chainlog::ChainSink for SinkSpy {
    fn record(&self, event: &construct::engine::chainlog::ChainEvent) {
        self.0
            .lock()
            .expect("spy lock poisoned")
            .events
            .push(SpiedEvent {
                step: event.step,
                attempt: event.attempt,
                passed: event.passed,
            });
    }

    fn finish(&self, outcome: &construct::engine::chainlog::ChainOutcome) {
        self.0.lock().expect("spy lock poisoned").outcome =
            Some((outcome.label, outcome.attempts));
    }
}

// ---------------------------------------------------------------------------
// Fake stores
// ---------------------------------------------------------------------------

/// History store serving a fixed set of lines.
pub struct FakeHistory(pub Vec<HistoryLine>);

#[async_trait]
impl HistoryStore for FakeHistory {
    async fn recent(&self, _counterpart_id: &str, _limit: u32) -> anyhow::Result<Vec<HistoryLine>> {
        Ok(self.0.clone())
    }
}

/// History store that always fails, for degradation tests.
pub struct FailingHistory;

#[async_trait]
impl HistoryStore for FailingHistory {
    async fn recent(&self, _counterpart_id: &str, _limit: u32) -> anyhow::Result<Vec<HistoryLine>> {
        Err(anyhow::anyhow!("history store down"))
    }
}

/// Style store with optional fixed contents.
pub struct FakeStyle {
    /// Profile document served to the assembler.
    pub profile: Option<String>,
    /// Notes served to the assembler.
    pub notes: Option<String>,
}

impl FakeStyle {
    /// A style store with nothing in it.
    pub fn empty() -> Self {
        Self {
            profile: None,
            notes: None,
        }
    }
}

#[async_trait]
impl StyleStore for FakeStyle {
    async fn load_profile(&self, _counterpart_id: &str) -> anyhow::Result<Option<String>> {
        Ok(self.profile.clone())
    }

    async fn load_notes(&self, _counterpart_id: &str) -> anyhow::Result<Option<String>> {
        Ok(self.notes.clone())
    }
}
