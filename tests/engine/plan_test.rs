//! Tests for the analyzer and planner prompt contracts.

use construct::engine::analyze::{self, Analysis, Confidence};
use construct::engine::plan;
use construct::engine::ReplyPolicy;

use super::support::{assembled, line};

fn analysis(text: &str) -> Analysis {
    Analysis {
        prompt: String::new(),
        text: text.to_owned(),
        confidence: Confidence::parse(text),
    }
}

#[test]
fn confidence_parses_the_trailing_line() {
    assert_eq!(Confidence::parse("all clear\nCONFIDENCE: HIGH"), Confidence::High);
    assert_eq!(Confidence::parse("confidence: low"), Confidence::Low);
    assert_eq!(Confidence::parse("CONFIDENCE: MEDIUM"), Confidence::Medium);
    // Absent or malformed defaults to medium.
    assert_eq!(Confidence::parse("no tag at all"), Confidence::Medium);
    assert_eq!(Confidence::parse("CONFIDENCE: banana"), Confidence::Medium);
}

#[test]
fn analyzer_prompt_carries_incoming_and_recent_replies() {
    let ctx = assembled(
        "Igor",
        vec![
            line("Lena", "you coming tonight", false),
            line("Igor", "maybe after work", false),
        ],
        "so yes or no?",
        false,
    );
    let prompt = analyze::build_prompt(&ctx, &ReplyPolicy::default());
    assert!(prompt.contains("so yes or no?"));
    assert!(prompt.contains("Igor's recent replies"));
    assert!(prompt.contains("maybe after work"));
}

#[test]
fn planner_prompt_shows_length_envelope_and_exemplars() {
    let history = vec![
        line("Igor", "see you at the gym tomorrow", false),
        line("Igor", "send me the route please", false),
        line("Igor", "that climb was brutal today", false),
    ];
    let mut ctx = assembled("Igor", history, "ride this weekend?", false);
    ctx.context.style_document = Some("lowercase, dry humor".to_owned());

    let exemplars = vec!["that climb was brutal today".to_owned()];
    let prompt = plan::build_prompt(
        &analysis("They want plans.\nCONFIDENCE: HIGH"),
        &ctx,
        &exemplars,
        &ReplyPolicy::default(),
    );

    assert!(prompt.contains("How Igor texts"));
    assert!(prompt.contains("lowercase, dry humor"));
    assert!(prompt.contains("Real messages to imitate"));
    assert!(prompt.contains("that climb was brutal today"));
    assert!(prompt.contains(&format!(
        "Target between 1 and {} words",
        ctx.stats.effective_upper
    )));
    assert!(prompt.contains("do not repeat these"));
}

#[test]
fn low_confidence_biases_the_planner_toward_a_dodge() {
    let ctx = assembled("Igor", Vec::new(), "how did the thing go", false);
    let prompt = plan::build_prompt(
        &analysis("No idea.\nCONFIDENCE: LOW"),
        &ctx,
        &[],
        &ReplyPolicy::default(),
    );
    assert!(prompt.contains("LOW"));
    assert!(prompt.contains("dodge"));
}

#[test]
fn emergency_note_reaches_the_planner() {
    let ctx = assembled("Igor", Vec::new(), "I want to die", true);
    let prompt = plan::build_prompt(
        &analysis("Serious distress.\nCONFIDENCE: HIGH"),
        &ctx,
        &[],
        &ReplyPolicy::default(),
    );
    assert!(prompt.contains("emergency"));
    assert!(prompt.contains("15 words"));
}
