//! lineup - serialized line-addressable terminal output
//!
//! This library provides an asynchronous console that lets concurrent
//! tasks append rows, rewrite rows in place, and pin a summary footer
//! on an ANSI terminal without their output interleaving, plus a
//! sequential credential prompter.

pub mod console;
pub mod prompt;

pub use console::{Console, ConsoleError, ConsoleHandle, Pending, Row};
pub use prompt::{Field, PromptInput, Prompter, TtyPrompter};
