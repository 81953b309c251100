//! Cross-cutting utilities: filesystem helpers and progress display.

pub mod fs;
pub mod progress;
