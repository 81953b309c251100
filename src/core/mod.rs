//! Core types shared across updatekit components.
//!
//! This module hosts the error taxonomy ([`UpdateError`]) and the failure
//! classification ([`FailureKind`]) the orchestrator publishes in its
//! `Failed` phase. Components construct specific `UpdateError` variants; the
//! orchestrator maps them onto the coarser `FailureKind` the presentation
//! layer renders.

pub mod error;

pub use error::{FailureKind, UpdateError};
