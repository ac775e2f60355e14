//! Distress detection over incoming text.
//!
//! A keyword hit switches the pipeline into emergency mode: the reply-length
//! ceiling is lifted so the planner can choose a caring, longer answer
//! instead of the subject's usual two-word rhythm. Matching is substring
//! based and case-insensitive, over the incoming text only — history never
//! triggers it.

/// Curated distress and crisis terms across the languages the subject's
/// conversations mix. Substring matched against the lowercased incoming
/// text.
const EMERGENCY_TERMS: &[&str] = &[
    // English
    "suicide",
    "suicidal",
    "kill myself",
    "want to die",
    "wanna die",
    "end my life",
    "end it all",
    "self harm",
    "self-harm",
    "hurt myself",
    "cutting myself",
    "overdose",
    "can't go on",
    "cant go on",
    "no reason to live",
    "emergency",
    "in the hospital",
    "had an accident",
    "i was attacked",
    "help me please",
    // Russian
    "суицид",
    "покончить с собой",
    "не хочу жить",
    "убить себя",
    "хочу умереть",
    "в больнице",
    "помогите",
    // Spanish
    "suicidio",
    "matarme",
    "no quiero vivir",
    "quiero morir",
    "en el hospital",
    // German
    "selbstmord",
    "umbringen",
    "will sterben",
    // French
    "me suicider",
    "veux mourir",
    "me tuer",
];

/// Detect whether the incoming text signals a possible emergency.
pub fn is_emergency(incoming_text: &str) -> bool {
    let lowered = incoming_text.to_lowercase();
    EMERGENCY_TERMS.iter().any(|term| lowered.contains(term))
}
