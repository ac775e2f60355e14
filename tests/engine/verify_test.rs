//! Tests for the verifier: local checks, judge delegation, verdict parsing.

use construct::engine::prompts::PromptSet;
use construct::engine::verify::{build_prompt, local_checks, parse_verdict, run, VerdictSource};
use construct::engine::ReplyPolicy;

use super::support::{assembled, line, Scripted, ScriptedProvider};

// ---------------------------------------------------------------------------
// Local checks
// ---------------------------------------------------------------------------

#[test]
fn duplicate_of_recent_reply_fails_locally() {
    let recent = vec!["See you there".to_owned()];
    let verdict = local_checks("  see   you THERE ", &recent, 8).expect("must fail");
    assert!(!verdict.pass);
    assert!(verdict.reason.contains("duplicate"));
    assert!(verdict.suggestion.is_some());
}

#[test]
fn gross_length_fails_locally() {
    let candidate = "this is a very long winded reply that no terse texter \
                     would ever actually send to anybody honestly";
    let verdict = local_checks(candidate, &[], 5).expect("must fail");
    assert!(!verdict.pass);
    assert!(verdict.reason.contains("over length"));
}

#[test]
fn long_candidate_passes_locally_when_envelope_is_wide() {
    // 13 words, upper bound 10: over the floor but not over 2x upper.
    let candidate = "one two three four five six seven eight nine ten eleven twelve thirteen";
    assert!(local_checks(candidate, &[], 10).is_none());
}

#[test]
fn short_candidate_passes_local_checks() {
    assert!(local_checks("sounds good", &["see you".to_owned()], 5).is_none());
}

// ---------------------------------------------------------------------------
// Fail-fast behavior
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_never_reaches_the_judge() {
    let provider = ScriptedProvider::new(vec![Scripted::Text("PASS")]);
    let ctx = assembled(
        "Igor",
        vec![line("Igor", "see you there", false)],
        "ok so when",
        false,
    );
    let verification = run(
        &provider,
        &PromptSet::default(),
        "see you there",
        &ctx,
        &ReplyPolicy::default(),
    )
    .await
    .expect("local verdict");

    assert_eq!(verification.source, VerdictSource::Local);
    assert!(!verification.verdict.pass);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn oversized_candidate_never_reaches_the_judge() {
    let provider = ScriptedProvider::new(vec![Scripted::Text("PASS")]);
    let ctx = assembled("Igor", Vec::new(), "hey", false);
    // Fallback envelope upper is 8; 2x is 16, and the floor is 12.
    let candidate = (0..20).map(|_| "word").collect::<Vec<_>>().join(" ");
    let verification = run(
        &provider,
        &PromptSet::default(),
        &candidate,
        &ctx,
        &ReplyPolicy::default(),
    )
    .await
    .expect("local verdict");

    assert_eq!(verification.source, VerdictSource::Local);
    assert!(!verification.verdict.pass);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn clean_candidate_is_judged_by_the_model() {
    let provider = ScriptedProvider::new(vec![Scripted::Text(
        "PASS\nREASON: fits the conversation\nSUGGESTION: none",
    )]);
    let ctx = assembled("Igor", Vec::new(), "coming tonight?", false);
    let verification = run(
        &provider,
        &PromptSet::default(),
        "yeah on my way",
        &ctx,
        &ReplyPolicy::default(),
    )
    .await
    .expect("judge verdict");

    assert_eq!(verification.source, VerdictSource::Judge);
    assert!(verification.verdict.pass);
    assert_eq!(provider.calls(), 1);
}

// ---------------------------------------------------------------------------
// Verdict parsing
// ---------------------------------------------------------------------------

#[test]
fn parses_pass_with_reason() {
    let verdict = parse_verdict("PASS\nREASON: short and relevant\nSUGGESTION: none");
    assert!(verdict.pass);
    assert_eq!(verdict.reason, "short and relevant");
    assert!(verdict.suggestion.is_none());
}

#[test]
fn parses_fail_with_suggestion() {
    let verdict = parse_verdict("FAIL\nREASON: too wordy\nSUGGESTION: sounds good");
    assert!(!verdict.pass);
    assert_eq!(verdict.reason, "too wordy");
    assert_eq!(verdict.suggestion.as_deref(), Some("sounds good"));
}

#[test]
fn literal_none_means_no_suggestion() {
    let verdict = parse_verdict("FAIL\nREASON: off topic\nSUGGESTION: None");
    assert!(verdict.suggestion.is_none());
}

#[test]
fn unparseable_output_fails_closed() {
    let verdict = parse_verdict("the candidate seems fine to me");
    assert!(!verdict.pass);
    assert!(verdict.reason.contains("unparseable"));
}

#[test]
fn verdict_lines_tolerate_casing_and_padding() {
    let verdict = parse_verdict("  fail\n  reason:   repeats filler\n  suggestion:  try asking back");
    assert!(!verdict.pass);
    assert_eq!(verdict.reason, "repeats filler");
    assert_eq!(verdict.suggestion.as_deref(), Some("try asking back"));
}

// ---------------------------------------------------------------------------
// Judge prompt
// ---------------------------------------------------------------------------

#[test]
fn emergency_context_reaches_the_judge_prompt() {
    let ctx = assembled("Igor", Vec::new(), "I want to die", true);
    let prompt = build_prompt("that sucks lol", &ctx, &ReplyPolicy::default());
    assert!(prompt.contains("distress"));
    assert!(prompt.contains("1-15 words"));
}
