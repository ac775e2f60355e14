//! Tests for filler classification and exemplar selection.

use construct::engine::filler::{is_likely_filler, select_exemplars, word_count};

use super::support::line;

#[test]
fn short_acknowledgements_are_filler() {
    for text in ["ok", "Ok!!", "lol", "yeah yeah", "thanks", "ага", "jajaja"] {
        assert!(is_likely_filler(text), "expected filler: {text}");
    }
}

#[test]
fn real_messages_are_not_filler() {
    for text in [
        "are you coming tonight",
        "meet me at seven",
        "that sounds wonderful",
    ] {
        assert!(!is_likely_filler(text), "expected real: {text}");
    }
}

#[test]
fn a_single_short_token_is_filler_even_when_unknown() {
    assert!(is_likely_filler("hmmpf"));
    // A single long token is not.
    assert!(!is_likely_filler("congratulations"));
}

#[test]
fn two_word_messages_need_both_words_known() {
    assert!(is_likely_filler("ok thanks"));
    assert!(!is_likely_filler("ok when"));
}

#[test]
fn classification_is_idempotent() {
    for text in ["ok", "are you coming tonight", "", "lol ok"] {
        assert_eq!(is_likely_filler(text), is_likely_filler(text));
    }
}

#[test]
fn word_count_splits_on_whitespace() {
    assert_eq!(word_count(""), 0);
    assert_eq!(word_count("one"), 1);
    assert_eq!(word_count("  two   words \n"), 2);
}

#[test]
fn exemplars_prefer_recent_real_messages() {
    let history = vec![
        line("Igor", "send me the route please", false),
        line("Igor", "ok", false),
        line("Igor", "that climb was brutal today", false),
        line("Lena", "you survived at least", false),
    ];
    let exemplars = select_exemplars(&history, "Igor", 2);
    assert_eq!(
        exemplars,
        vec![
            "that climb was brutal today".to_owned(),
            "send me the route please".to_owned(),
        ]
    );
}

#[test]
fn exemplars_fall_back_to_filler_when_real_ones_run_out() {
    let history = vec![
        line("Igor", "ok", false),
        line("Igor", "that climb was brutal today", false),
    ];
    let exemplars = select_exemplars(&history, "Igor", 2);
    assert_eq!(exemplars.len(), 2);
    assert!(exemplars.contains(&"ok".to_owned()));
}

#[test]
fn generated_lines_are_never_exemplars() {
    let history = vec![
        line("Igor", "completely automated sentence here", true),
        line("Igor", "ok", false),
    ];
    let exemplars = select_exemplars(&history, "Igor", 2);
    assert!(!exemplars.contains(&"completely automated sentence here".to_owned()));
}
