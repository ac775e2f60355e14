//! Tests for distress keyword detection.

use construct::engine::emergency::is_emergency;

#[test]
fn english_distress_terms_match() {
    assert!(is_emergency("honestly I just want to die"));
    assert!(is_emergency("she had an overdose last night"));
    assert!(is_emergency("it's an EMERGENCY call me"));
}

#[test]
fn matching_is_case_insensitive_substring() {
    assert!(is_emergency("I CANT GO ON anymore"));
    assert!(is_emergency("thinking about Suicide again"));
}

#[test]
fn other_languages_match() {
    assert!(is_emergency("я больше не хочу жить"));
    assert!(is_emergency("estoy en el hospital"));
    assert!(is_emergency("ich will sterben"));
}

#[test]
fn ordinary_messages_do_not_match() {
    assert!(!is_emergency("want to grab dinner tonight?"));
    assert!(!is_emergency("the deadline is killing me, so much work"));
    assert!(!is_emergency(""));
}
