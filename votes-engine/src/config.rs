//! Configuration types for the voting engine.
use std::time::Duration;

/// Default minimum number of votes before a resource gets a non-zero score.
pub const DEFAULT_MIN_SAMPLE_SIZE: u64 = 10;

/// Default upper bound on a single changeset commit.
pub const DEFAULT_COMMIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for the voting engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Resources with fewer total votes than this score exactly `0.0`.
    pub min_sample_size: u64,
    /// A commit that takes longer than this is abandoned and rolled back.
    pub commit_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_sample_size: DEFAULT_MIN_SAMPLE_SIZE,
            commit_timeout: DEFAULT_COMMIT_TIMEOUT,
        }
    }
}

impl EngineConfig {
    /// Create a config with a custom score threshold.
    pub fn with_min_sample_size(mut self, min_sample_size: u64) -> Self {
        self.min_sample_size = min_sample_size;
        self
    }

    /// Create a config with a custom commit timeout.
    pub fn with_commit_timeout(mut self, commit_timeout: Duration) -> Self {
        self.commit_timeout = commit_timeout;
        self
    }
}
