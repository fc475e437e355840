//! Commit batching policy.
//!
//! Collects mutations into a single open transaction and commits once the
//! configured threshold is reached, amortizing fsync cost across the batch.
//! Mutations in an uncommitted batch are visible through the container but
//! are lost if the process dies before the commit.

/// Configuration for commit batching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of mutations per commit. 0 and 1 both commit every mutation.
    pub commit_every: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { commit_every: 0 }
    }
}

impl BatchConfig {
    pub fn new(commit_every: usize) -> Self {
        Self { commit_every }
    }

    /// Effective batch size.
    pub fn threshold(&self) -> usize {
        self.commit_every.max(1)
    }
}

/// Counts mutations since the last commit.
#[derive(Debug)]
pub struct BatchCounter {
    config: BatchConfig,
    pending: usize,
    commits: u64,
}

impl BatchCounter {
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config,
            pending: 0,
            commits: 0,
        }
    }

    /// Record one mutation.
    ///
    /// Returns true if the batch is now ready to commit.
    pub fn record(&mut self) -> bool {
        self.pending += 1;
        self.is_ready()
    }

    /// Check if the batch is ready to commit.
    pub fn is_ready(&self) -> bool {
        self.pending >= self.config.threshold()
    }

    /// Mark the pending batch as committed.
    pub fn committed(&mut self) {
        if self.pending > 0 {
            self.commits += 1;
        }
        self.pending = 0;
    }

    /// Whether mutations are grouped into explicit transactions.
    pub fn is_batching(&self) -> bool {
        self.config.threshold() > 1
    }

    /// Mutations recorded since the last commit.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Number of batches committed so far.
    pub fn commits(&self) -> u64 {
        self.commits
    }
}
