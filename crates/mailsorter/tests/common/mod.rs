//! Shared test utilities for mailsorter integration tests.
//!
//! This module provides:
//! - `TestHarness` wiring a `MemoryMailHost`, a scripted model backend and a
//!   temporary database into a `BatchRunner`
//! - Builders for settings and model answers

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{ScriptedBackend, TestHarness, ACCOUNT_ID, ACCOUNT_NAME};
