use memcommit_core::buffer::MAX_LEVEL;

/// The largest number of commit workers. Larger values are rounded down.
pub const MAX_COMMIT_CONCURRENCY: usize = 64;

/// Options when opening a [`crate::Committer`].
#[derive(Debug, Clone)]
pub struct Options {
    /// The number of commit workers. Values over 64 will be rounded down to 64.
    pub(crate) commit_concurrency: usize,
    /// The lowest root level at which child subtrees are hashed on workers.
    pub(crate) parallel_level: u32,
    /// Enable or disable metrics collection.
    pub(crate) metrics: bool,
    pub(crate) prepopulate_zero_hashes: bool,
}

impl Options {
    /// Create a new `Options` instance with the default values.
    pub fn new() -> Self {
        Self {
            commit_concurrency: 1,
            parallel_level: 1,
            metrics: false,
            prepopulate_zero_hashes: true,
        }
    }

    /// Set the maximum number of concurrent commit workers.
    ///
    /// Values over 64 will be rounded down to 64.
    ///
    /// May not be zero.
    pub fn commit_concurrency(&mut self, commit_concurrency: usize) {
        self.commit_concurrency = commit_concurrency;
    }

    /// Set the lowest level of a buffer for which a commit fans its children out to workers.
    ///
    /// Buffers below this level are always hashed on the calling thread. Must be between 1 and
    /// [`MAX_LEVEL`].
    ///
    /// Default: 1.
    pub fn parallel_level(&mut self, parallel_level: u32) {
        self.parallel_level = parallel_level;
    }

    /// Set metrics collection on or off.
    ///
    /// Default: off.
    pub fn metrics(&mut self, metrics: bool) {
        self.metrics = metrics;
    }

    /// Configure whether the zero-hash cache is filled for every buffer size when opening.
    ///
    /// When disabled, zero digests are computed on first use.
    ///
    /// Default: `true`.
    pub fn prepopulate_zero_hashes(&mut self, prepopulate_zero_hashes: bool) {
        self.prepopulate_zero_hashes = prepopulate_zero_hashes;
    }

    pub(crate) fn validate(&self) -> anyhow::Result<()> {
        if self.commit_concurrency == 0 {
            anyhow::bail!("commit concurrency may not be zero");
        }
        if self.parallel_level == 0 || self.parallel_level > MAX_LEVEL {
            anyhow::bail!(
                "parallel level must be between 1 and {}, got {}",
                MAX_LEVEL,
                self.parallel_level
            );
        }
        Ok(())
    }

    pub(crate) fn effective_concurrency(&self) -> usize {
        std::cmp::min(self.commit_concurrency, MAX_COMMIT_CONCURRENCY)
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}

#[test]
fn default_options_are_valid() {
    assert!(Options::new().validate().is_ok());
}

#[test]
fn zero_concurrency_is_rejected() {
    let mut o = Options::new();
    o.commit_concurrency(0);
    assert!(o.validate().is_err());
}

#[test]
fn parallel_level_out_of_range_is_rejected() {
    let mut o = Options::new();
    o.parallel_level(0);
    assert!(o.validate().is_err());
    o.parallel_level(MAX_LEVEL + 1);
    assert!(o.validate().is_err());
}

#[test]
fn concurrency_is_capped() {
    let mut o = Options::new();
    o.commit_concurrency(1000);
    assert_eq!(o.effective_concurrency(), MAX_COMMIT_CONCURRENCY);
}
