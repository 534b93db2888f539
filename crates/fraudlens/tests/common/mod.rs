//! Shared test utilities for fraudlens integration tests.
//!
//! - `ScriptedAnalyzer`, a fake analyzer with per-file outcomes and gates
//! - request and image builders
//! - `SnapshotLog`, an observer recording every published snapshot

pub mod builders;
pub mod scripted;

#[allow(unused_imports)]
pub use builders::*;
#[allow(unused_imports)]
pub use scripted::{ScriptedAnalyzer, SnapshotLog};
