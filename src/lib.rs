//! Construct — a reply ghostwriter that speaks in your voice.
//!
//! Single Rust binary. Given a conversation history, a style profile, and an
//! incoming message, it drafts a reply that reads like the subject typed it
//! themselves — or deliberately stays silent when no draft survives the
//! quality gates.
//!
//! See `DESIGN.md` for full architecture documentation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod credentials;
pub mod logging;
pub mod providers;
pub mod store;

pub mod engine;
