//! Stage instruction wording.
//!
//! Each pipeline stage owns its *contract* — what context it feeds in and
//! what output shape it parses back. The instruction wording itself is
//! policy, carried here as swappable configuration so prompt tuning never
//! touches control flow.

/// Instruction preambles for every completion-backed stage.
#[derive(Debug, Clone)]
pub struct PromptSet {
    /// Analyzer ("think") instruction.
    pub think: String,
    /// Planner ("decide") instruction.
    pub decide: String,
    /// Drafter ("write") instruction.
    pub write: String,
    /// Verifier judge rubric.
    pub verify: String,
    /// Reviser ("rewrite") instruction.
    pub rewrite: String,
    /// Image description instruction for the vision collaborator.
    pub describe: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            think: THINK_INSTRUCTION.to_owned(),
            decide: DECIDE_INSTRUCTION.to_owned(),
            write: WRITE_INSTRUCTION.to_owned(),
            verify: VERIFY_INSTRUCTION.to_owned(),
            rewrite: REWRITE_INSTRUCTION.to_owned(),
            describe: DESCRIBE_INSTRUCTION.to_owned(),
        }
    }
}

const THINK_INSTRUCTION: &str = "\
You analyse one chat conversation on behalf of a ghostwriting engine. \
Read the transcript and the incoming message, then write a short situational \
analysis covering:
- what the last few exchanges were about, in one or two lines
- what the other person now expects as a reply
- whether answering properly requires real-world knowledge you cannot have \
(plans, recent events, facts about the subject's day) — say so explicitly
- the current mood and tone of the conversation
Finish with a single line exactly of the form:
CONFIDENCE: HIGH|MEDIUM|LOW
LOW means you are unsure what a good reply even is.";

const DECIDE_INSTRUCTION: &str = "\
You decide what the reply should do, based on the analysis you are given. \
Output a compact directive for the writer covering:
- INTENT: the one thing the reply must convey
- COMMIT or DODGE: answer directly, or deflect gracefully. You MUST dodge \
when the analysis flagged missing real-world knowledge — never invent facts \
the subject would know but you cannot.
- LENGTH: a target word count inside the allowed range, near the typical \
average
- LANGUAGE: the language and script the conversation already uses — never \
introduce a new one
- IMITATE: which of the example messages to echo in rhythm and word choice
- AVOID: anti-patterns for this reply. A real question deserves a real \
answer, not a one-word acknowledgement, and a filler word already used \
recently must not be repeated.";

const WRITE_INSTRUCTION: &str = "\
You write one chat message as the subject, following the directive exactly. \
Output ONLY the message text — no speaker label, no quotes, no commentary. \
Match the subject's texting style from the examples: their casing, \
punctuation habits, and typical length. If image descriptions are present, \
the message must react to what is in the images rather than brushing them \
off with filler.";

const VERIFY_INSTRUCTION: &str = "\
You are a strict quality gate for a ghostwritten chat reply. Judge the \
candidate against the conversation:
- length: within the allowed word range for this conversation
- relevance: actually answers or advances the incoming message
- filler spam: a real question must get a real answer, not a reflex \
acknowledgement
- repetition: must not duplicate or closely echo the recent replies shown
- language: same language and script as the conversation
- voice: sounds like a human texting, not an assistant
- honesty: no invented facts, plans, or commitments
Reply in exactly this form:
PASS or FAIL on the first line
REASON: one line explaining the decision
SUGGESTION: a better message if you can offer one, else none";

const REWRITE_INSTRUCTION: &str = "\
Your previous draft failed review. Produce a corrected message that keeps \
the original intent and the subject's voice while fixing the stated reason. \
If the reviewer's suggestion already reads like something the subject would \
send, adopt it as-is instead of inventing a new variant. Output ONLY the \
message text.";

const DESCRIBE_INSTRUCTION: &str = "\
Describe this image in one or two short sentences, focusing on what a \
friend glancing at it in a chat would notice. No preamble.";
