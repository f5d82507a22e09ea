//! askcmd turns a plain-language request into a shell command.
//!
//! The local environment and a short history of recent questions are sent to
//! an OpenAI-compatible chat completions endpoint; the tagged answer is parsed
//! into an explanation and a command, which are printed and never executed.

pub mod assistant;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod history;
pub mod parser;
pub mod prompt;
pub mod providers;
