//! Reply-length statistics derived from the subject's own messages.
//!
//! The envelope is recomputed on every invocation because the underlying
//! history grows between calls; nothing here is persisted.

use crate::engine::context::HistoryLine;
use crate::engine::filler::{is_likely_filler, word_count};

/// Minimum number of non-filler samples required before the filler-excluded
/// sample is trusted over the full history.
const MIN_REAL_SAMPLES: usize = 3;

/// Floor for the effective upper bound, in words.
const UPPER_FLOOR: u32 = 5;

/// Word-count envelope for acceptable replies in one conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct WordCountStats {
    /// Shortest observed message, in words.
    pub min: u32,
    /// Longest observed message, in words.
    pub max: u32,
    /// Mean message length, in words.
    pub average: f64,
    /// 75th percentile message length (nearest-rank).
    pub p75: u32,
    /// Maximum word count a reply is allowed: `max(round(avg)+3, p75, 5)`.
    pub effective_upper: u32,
}

impl WordCountStats {
    /// Fixed fallback envelope used when there is no usable history.
    pub fn fallback() -> Self {
        Self {
            min: 1,
            max: 8,
            average: 3.0,
            p75: 5,
            effective_upper: 8,
        }
    }

    /// Compute the envelope from the subject's human lines in `lines`.
    ///
    /// Filler messages are excluded when at least three non-filler samples
    /// exist; otherwise all human lines are used; with no usable history at
    /// all, the fixed fallback envelope applies. Machine-generated lines
    /// never contribute — statistics must describe how the human types.
    pub fn for_subject(lines: &[HistoryLine], subject_name: &str) -> Self {
        let human: Vec<&HistoryLine> = lines
            .iter()
            .filter(|l| l.speaker == subject_name && !l.is_generated && !l.text.trim().is_empty())
            .collect();

        let real_lengths: Vec<u32> = human
            .iter()
            .filter(|l| !is_likely_filler(&l.text))
            .map(|l| word_count(&l.text))
            .collect();

        if real_lengths.len() >= MIN_REAL_SAMPLES {
            return Self::from_lengths(&real_lengths).unwrap_or_else(Self::fallback);
        }

        let all_lengths: Vec<u32> = human.iter().map(|l| word_count(&l.text)).collect();
        Self::from_lengths(&all_lengths).unwrap_or_else(Self::fallback)
    }

    /// Compute the envelope from raw word counts. Returns `None` on an
    /// empty sample.
    pub fn from_lengths(lengths: &[u32]) -> Option<Self> {
        if lengths.is_empty() {
            return None;
        }

        let mut sorted = lengths.to_vec();
        sorted.sort_unstable();

        let count = u32::try_from(sorted.len()).unwrap_or(u32::MAX);
        let min = *sorted.first()?;
        let max = *sorted.last()?;
        let sum: u32 = sorted.iter().fold(0u32, |acc, len| acc.saturating_add(*len));

        let average = f64::from(sum) / f64::from(count);
        // Integer round-half-up of sum/count, kept in integer space so the
        // upper bound stays exact under the strict cast lints.
        let rounded_avg = sum
            .saturating_mul(2)
            .saturating_add(count)
            .checked_div(count.saturating_mul(2))
            .unwrap_or(0);

        let p75 = percentile_75(&sorted);
        let effective_upper = rounded_avg.saturating_add(3).max(p75).max(UPPER_FLOOR);

        Some(Self {
            min,
            max,
            average,
            p75,
            effective_upper,
        })
    }

    /// One-line description of the envelope for stage prompts.
    pub fn prompt_summary(&self) -> String {
        format!(
            "The subject's messages here run {}-{} words (average {:.1}, 75th percentile {}).",
            self.min, self.max, self.average, self.p75
        )
    }

    /// Override the upper bound with the fixed emergency ceiling.
    ///
    /// Applied when the incoming text matched a distress keyword: a caring
    /// reply is allowed to run longer than the subject's usual texting
    /// rhythm, regardless of the statistically derived value.
    pub fn with_emergency_ceiling(mut self, ceiling: u32) -> Self {
        self.effective_upper = ceiling;
        self
    }
}

/// Nearest-rank 75th percentile over a sorted, non-empty slice.
fn percentile_75(sorted: &[u32]) -> u32 {
    let n = sorted.len();
    let rank = n.saturating_mul(3).div_ceil(4).max(1);
    sorted[rank.saturating_sub(1)]
}
