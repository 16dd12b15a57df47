//! Transaction Monitor Core
//!
//! Streaming analysis sessions and interruptible probe scenarios against a
//! remote transaction analysis server.

pub mod constants;
pub mod logic;
