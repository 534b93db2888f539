//! Broadcasting modules for real-time snapshot streaming.

pub mod snapshot;

pub use snapshot::SnapshotBroadcaster;
