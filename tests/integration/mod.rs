//! Integration test suite for updatekit
//!
//! End-to-end tests of the update lifecycle state machine, driving a real
//! orchestrator composed with scripted component doubles (and the real
//! JSON file store where persistence across restarts is the point).
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **lifecycle**: manifest checks, phase transitions, failure notices
//! - **downloading**: progress reporting, coalescing, retry behavior
//! - **installing**: capability gating and installer handoff
//! - **persistence**: cold-start resume and record/filesystem reconciliation

mod common;
mod downloading;
mod installing;
mod lifecycle;
