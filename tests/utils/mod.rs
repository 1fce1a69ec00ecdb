pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use mocks::{FailingKeyValueStore, FlakyTtlStore, RecordingBroadcaster, SlowKeyValueStore};
#[allow(unused_imports)]
pub use setup::{wire, TestSetup, TestSetupBuilder};
