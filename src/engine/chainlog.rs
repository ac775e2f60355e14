//! Per-invocation chain logging.
//!
//! Every stage of a reply invocation appends one event; the sequence plus a
//! terminal outcome is the chain log, an operational audit trail keyed by
//! counterpart and start time. The log itself is a pure event producer —
//! sinks do the I/O, so the pipeline core never touches a file handle or a
//! console directly.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info, warn};

use crate::engine::ReplyOutcome;

/// Characters of stage input retained in each event block.
const INPUT_EXCERPT_CHARS: usize = 160;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// One recorded pipeline step.
#[derive(Debug, Clone)]
pub struct ChainEvent {
    /// Stage name: `think`, `decide`, `write`, `verify`, or `rewrite`.
    pub step: &'static str,
    /// Verification attempt this step belongs to (0-based).
    pub attempt: u32,
    /// Offset from invocation start.
    pub elapsed: Duration,
    /// Truncated stage input, for orientation when reading the log.
    pub input_excerpt: String,
    /// Full stage output.
    pub output: String,
    /// Word count of the stage output, where it is a candidate message.
    pub word_count: Option<u32>,
    /// Pass/fail tag, where the stage has a judgement attached.
    pub passed: Option<bool>,
}

/// Terminal record written once per invocation.
#[derive(Debug, Clone)]
pub struct ChainOutcome {
    /// Stable outcome label (`sent`, `sent_unverified`, ...).
    pub label: &'static str,
    /// The final reply, when one is sent.
    pub final_text: Option<String>,
    /// Verification attempts consumed.
    pub attempts: u32,
    /// Total invocation duration.
    pub total_elapsed: Duration,
}

/// Receives chain events. Implementations own all I/O.
pub trait ChainSink: Send + Sync {
    /// Record one step. Called after every stage, in order.
    fn record(&self, event: &ChainEvent);

    /// Record the terminal outcome. Called exactly once.
    fn finish(&self, outcome: &ChainOutcome);
}

// ---------------------------------------------------------------------------
// Log
// ---------------------------------------------------------------------------

/// Append-only event log for one invocation, fanned out to sinks.
pub struct ChainLog {
    started: Instant,
    events: Vec<ChainEvent>,
    sinks: Vec<Box<dyn ChainSink>>,
}

impl ChainLog {
    /// Start a log clocked from now.
    pub fn new(sinks: Vec<Box<dyn ChainSink>>) -> Self {
        Self {
            started: Instant::now(),
            events: Vec::new(),
            sinks,
        }
    }

    /// Time since the invocation started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Append one step and flush it to every sink.
    pub fn record(
        &mut self,
        step: &'static str,
        attempt: u32,
        input: &str,
        output: &str,
        word_count: Option<u32>,
        passed: Option<bool>,
    ) {
        let event = ChainEvent {
            step,
            attempt,
            elapsed: self.started.elapsed(),
            input_excerpt: truncate_chars(input, INPUT_EXCERPT_CHARS),
            output: output.to_owned(),
            word_count,
            passed,
        };
        for sink in &self.sinks {
            sink.record(&event);
        }
        self.events.push(event);
    }

    /// Close the log with the terminal outcome.
    pub fn finish(&self, outcome: &ReplyOutcome) {
        let record = ChainOutcome {
            label: outcome.label(),
            final_text: outcome.text().map(str::to_owned),
            attempts: outcome.attempts(),
            total_elapsed: self.started.elapsed(),
        };
        for sink in &self.sinks {
            sink.finish(&record);
        }
    }

    /// Events recorded so far, in order.
    pub fn events(&self) -> &[ChainEvent] {
        &self.events
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Human-readable append-only file artifact, one file per invocation.
///
/// The format is for operational debugging, not machine parsing. Each write
/// is flushed immediately so a crash mid-invocation still leaves a readable
/// partial chain.
pub struct FileChainSink {
    file: Mutex<std::fs::File>,
    path: PathBuf,
}

impl FileChainSink {
    /// Create the artifact file under `dir` and write its header.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created.
    pub fn create(dir: &Path, counterpart_id: &str) -> anyhow::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let started = Utc::now();
        let filename = format!(
            "{}_{}.log",
            sanitize_filename(counterpart_id),
            started.format("%Y%m%d_%H%M%S")
        );
        let path = dir.join(filename);
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        writeln!(file, "chain log")?;
        writeln!(file, "counterpart: {counterpart_id}")?;
        writeln!(file, "started: {}", started.format("%Y-%m-%d %H:%M:%S UTC"))?;
        file.flush()?;
        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    /// Path of the artifact file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_event(&self, event: &ChainEvent) -> std::io::Result<()> {
        let mut file = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let tag = match event.passed {
            Some(true) => " [pass]",
            Some(false) => " [fail]",
            None => "",
        };
        let words = match event.word_count {
            Some(n) => format!(" {n}w"),
            None => String::new(),
        };
        writeln!(
            file,
            "\n--- {}#{} (+{}){}{}",
            event.step,
            event.attempt,
            format_elapsed(event.elapsed),
            tag,
            words
        )?;
        writeln!(file, "in:  {}", event.input_excerpt)?;
        writeln!(file, "out: {}", event.output)?;
        file.flush()
    }

    fn write_outcome(&self, outcome: &ChainOutcome) -> std::io::Result<()> {
        let mut file = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        writeln!(
            file,
            "\n=== outcome: {} after {} attempt(s), {} total",
            outcome.label,
            outcome.attempts,
            format_elapsed(outcome.total_elapsed)
        )?;
        writeln!(
            file,
            "reply: {}",
            outcome.final_text.as_deref().unwrap_or("(none)")
        )?;
        file.flush()
    }
}

impl ChainSink for FileChainSink {
    fn record(&self, event: &ChainEvent) {
        if let Err(e) = self.write_event(event) {
            warn!(error = %e, path = %self.path.display(), "chain file write failed");
        }
    }

    fn finish(&self, outcome: &ChainOutcome) {
        if let Err(e) = self.write_outcome(outcome) {
            warn!(error = %e, path = %self.path.display(), "chain file write failed");
        }
    }
}

/// Interactive trace sink backed by `tracing`.
pub struct ConsoleChainSink;

impl ChainSink for ConsoleChainSink {
    fn record(&self, event: &ChainEvent) {
        info!(
            step = event.step,
            attempt = event.attempt,
            elapsed = %format_elapsed(event.elapsed),
            passed = ?event.passed,
            words = ?event.word_count,
            output = %truncate_chars(&event.output, 120),
            "chain step"
        );
    }

    fn finish(&self, outcome: &ChainOutcome) {
        info!(
            outcome = outcome.label,
            attempts = outcome.attempts,
            elapsed = %format_elapsed(outcome.total_elapsed),
            "chain finished"
        );
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Truncate to a character budget, appending an ellipsis marker when cut.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    let flattened = text.replace('\n', " ");
    if flattened.chars().count() <= max_chars {
        return flattened;
    }
    let mut shortened: String = flattened.chars().take(max_chars).collect();
    shortened.push_str("...");
    shortened
}

/// Render a duration as seconds with centisecond precision.
fn format_elapsed(d: Duration) -> String {
    let millis = d.as_millis();
    let secs = millis.checked_div(1000).unwrap_or(0);
    let centis = millis.checked_rem(1000).unwrap_or(0).checked_div(10).unwrap_or(0);
    format!("{secs}.{centis:02}s")
}

/// Sanitize a counterpart id for use in a filename.
///
/// Replaces path separators with underscores and strips leading dots so the
/// artifact stays inside the chain directory.
fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .replace(['/', '\\', ':', ' '], "_")
        .trim_start_matches('.')
        .to_owned();
    if sanitized.is_empty() {
        "chain".to_owned()
    } else {
        sanitized
    }
}
