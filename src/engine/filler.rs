//! Filler classification and style exemplar selection.
//!
//! "Filler" is a short reflexive acknowledgement — `ok`, `lol`, a lone
//! emoji-adjacent interjection. Auto-replies skew heavily toward filler, so
//! raw length statistics over a mixed history would collapse the learned
//! typical length toward one word and the engine would end up sending only
//! filler back. Classification is used twice: to exclude filler from the
//! word-count statistics, and to keep filler out of the style exemplars
//! shown to the later stages.

use crate::engine::context::HistoryLine;

/// Maximum word count for a message to be considered filler at all.
const FILLER_MAX_WORDS: u32 = 2;

/// A single token at or under this many characters counts as filler even
/// when it is not in the acknowledgement set.
const SHORT_TOKEN_MAX_CHARS: usize = 5;

/// Known acknowledgements and interjections, lowercase, across the
/// languages the subject's conversations actually mix.
const ACKNOWLEDGEMENTS: &[&str] = &[
    // English
    "ok", "okay", "k", "kk", "yes", "yeah", "yep", "yup", "no", "nope",
    "lol", "lmao", "haha", "hahaha", "hehe", "hmm", "hm", "huh", "oh",
    "ah", "wow", "nice", "cool", "sure", "fine", "good", "great", "right",
    "thanks", "thx", "ty", "idk", "yo", "hey", "hi", "hello", "bye",
    "night", "morning", "gn", "gm", "omg", "bruh", "same", "true", "word",
    // Russian
    "да", "нет", "ок", "ага", "угу", "привет", "пока", "спасибо", "ясно",
    "понял", "поняла", "норм", "хорошо", "ладно",
    // Spanish
    "si", "sí", "vale", "bueno", "gracias", "hola", "jaja", "jajaja",
    // German / French / Italian
    "ja", "nein", "danke", "oui", "non", "merci", "salut", "ciao", "grazie",
];

/// Count whitespace-separated words in a message.
pub fn word_count(text: &str) -> u32 {
    u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX)
}

/// Classify a message as likely filler.
///
/// A message is filler when it has at most two words AND either consists of
/// a single short token or every word is a known acknowledgement. The check
/// is deterministic and idempotent — it looks only at the text itself.
pub fn is_likely_filler(text: &str) -> bool {
    let words: Vec<&str> = text.split_whitespace().collect();
    let count = u32::try_from(words.len()).unwrap_or(u32::MAX);
    if count == 0 {
        return true;
    }
    if count > FILLER_MAX_WORDS {
        return false;
    }

    if words.len() == 1 && normalize_token(words[0]).chars().count() <= SHORT_TOKEN_MAX_CHARS {
        return true;
    }

    words
        .iter()
        .all(|w| ACKNOWLEDGEMENTS.contains(&normalize_token(w).as_str()))
}

/// Lowercase a token and strip surrounding punctuation so `Ok!!` and `ok`
/// classify identically.
fn normalize_token(token: &str) -> String {
    token
        .trim_matches(|c: char| c.is_ascii_punctuation() || c == '…' || c == '—')
        .to_lowercase()
}

/// Pick up to `count` style exemplars from the subject's human messages.
///
/// Most recent non-filler messages are preferred; filler is used only when
/// there are not enough real messages to fill the quota. Machine-generated
/// lines are never exemplars — the engine must imitate the human, not its
/// own previous output.
pub fn select_exemplars(lines: &[HistoryLine], subject_name: &str, count: usize) -> Vec<String> {
    let own_lines = || {
        lines
            .iter()
            .rev()
            .filter(|l| l.speaker == subject_name && !l.is_generated)
    };

    let mut exemplars: Vec<String> = own_lines()
        .filter(|l| !is_likely_filler(&l.text))
        .take(count)
        .map(|l| l.text.clone())
        .collect();

    if exemplars.len() < count {
        let missing = count.saturating_sub(exemplars.len());
        let extra: Vec<String> = own_lines()
            .filter(|l| is_likely_filler(&l.text) && !exemplars.contains(&l.text))
            .take(missing)
            .map(|l| l.text.clone())
            .collect();
        exemplars.extend(extra);
    }

    exemplars
}
