//! Output module
//!
//! Writes engine messages as Singer JSON lines.
//!
//! # Overview
//!
//! - `MessageSink` - destination of engine messages
//! - `SingerWriter` - one JSON document per line on any `io::Write`
//!
//! stdout carries only Singer messages; logs go to stderr.

mod writer;

pub use writer::{MessageSink, SingerWriter};

#[cfg(test)]
mod tests;
