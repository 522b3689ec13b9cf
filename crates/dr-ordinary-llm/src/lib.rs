//! Agent-backed drug-name extraction.
//!
//! This crate asks a hosted Letta agent which drug names appear on a page and
//! parses its reply into a word list for the highlighter. An offline keyword
//! extractor covers pages when the agent is unreachable.

pub mod agent;
pub mod extraction;
pub mod prompts;

pub use agent::*;
pub use extraction::*;
pub use prompts::*;
