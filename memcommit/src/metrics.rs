use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Metrics collector, if active, it provides Counters and Timers
#[derive(Clone)]
pub struct Metrics {
    metrics: Option<Arc<ActiveMetrics>>,
}

/// Metrics that can be collected during execution
#[derive(Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Counter of commits performed
    Commits,
    /// Counter of child subtrees hashed on commit workers
    ParallelSubtrees,
    /// Counter of zero digests computed because they were not cached yet
    ZeroCacheMisses,
    /// Timer used to record average commit time
    CommitTime,
}

struct ActiveMetrics {
    commits: AtomicU64,
    parallel_subtrees: AtomicU64,
    zero_cache_misses: AtomicU64,
    commit_time: Timer,
}

impl Metrics {
    /// Returns the Metrics object, active or not based on the specified input
    pub fn new(active: bool) -> Self {
        Self {
            metrics: if active {
                Some(Arc::new(ActiveMetrics {
                    commits: AtomicU64::new(0),
                    parallel_subtrees: AtomicU64::new(0),
                    zero_cache_misses: AtomicU64::new(0),
                    commit_time: Timer::new(),
                }))
            } else {
                None
            },
        }
    }

    /// Increase the Counter specified by the input
    ///
    /// panics if the specified [`Metric`] is not a Counter
    pub fn count(&self, metric: Metric) {
        self.count_n(metric, 1);
    }

    /// Increase the Counter specified by the input by `n`
    ///
    /// panics if the specified [`Metric`] is not a Counter
    pub fn count_n(&self, metric: Metric, n: u64) {
        if let Some(ref metrics) = self.metrics {
            metrics.counter(metric).fetch_add(n, Ordering::Relaxed);
        }
    }

    /// The current value of the Counter specified by the input. `None` if inactive.
    ///
    /// panics if the specified [`Metric`] is not a Counter
    pub fn get(&self, metric: Metric) -> Option<u64> {
        self.metrics
            .as_ref()
            .map(|metrics| metrics.counter(metric).load(Ordering::Relaxed))
    }

    /// Returns a guard that, when dropped, will record the time passed since creation
    ///
    /// panics if the specified [`Metric`] is not a Timer
    pub fn record<'a>(&'a self, metric: Metric) -> Option<impl Drop + 'a> {
        self.metrics.as_ref().map(|metrics| {
            let timer = match metric {
                Metric::CommitTime => &metrics.commit_time,
                _ => panic!("Specified metric is not a Timer"),
            };

            timer.record()
        })
    }

    /// Print collected metrics to stdout
    pub fn print(&self) {
        if let Some(ref metrics) = self.metrics {
            println!("metrics");

            let commits = metrics.commits.load(Ordering::Relaxed);
            println!("  commits               {}", commits);

            let parallel_subtrees = metrics.parallel_subtrees.load(Ordering::Relaxed);
            println!("  parallel subtrees     {}", parallel_subtrees);

            let zero_cache_misses = metrics.zero_cache_misses.load(Ordering::Relaxed);
            println!("  zero cache misses     {}", zero_cache_misses);

            if let Some(mean) = metrics.commit_time.mean() {
                println!("  commit mean           {}", pretty_display_ns(mean));
            }
        } else {
            println!("Metrics collection was not activated")
        }
    }
}

impl ActiveMetrics {
    fn counter(&self, metric: Metric) -> &AtomicU64 {
        match metric {
            Metric::Commits => &self.commits,
            Metric::ParallelSubtrees => &self.parallel_subtrees,
            Metric::ZeroCacheMisses => &self.zero_cache_misses,
            _ => panic!("Specified metric is not a Counter"),
        }
    }
}

fn pretty_display_ns(ns: u64) -> String {
    // preserve 3 sig figs at minimum.
    let (val, unit) = if ns > 100 * 1_000_000_000 {
        (ns / 1_000_000_000, "s")
    } else if ns > 100 * 1_000_000 {
        (ns / 1_000_000, "ms")
    } else if ns > 100 * 1_000 {
        (ns / 1_000, "us")
    } else {
        (ns, "ns")
    };

    format!("{val} {unit}")
}

struct Timer {
    number_of_records: AtomicU64,
    sum: AtomicU64,
}

impl Timer {
    fn new() -> Self {
        Timer {
            number_of_records: AtomicU64::new(0),
            sum: AtomicU64::new(0),
        }
    }

    fn mean(&self) -> Option<u64> {
        let n = self.number_of_records.load(Ordering::Relaxed);
        let sum = self.sum.load(Ordering::Relaxed);
        sum.checked_div(n)
    }

    fn record<'a>(&'a self) -> impl Drop + 'a {
        struct TimerGuard<'a> {
            start: std::time::Instant,
            n: &'a AtomicU64,
            sum: &'a AtomicU64,
        }

        impl Drop for TimerGuard<'_> {
            fn drop(&mut self) {
                let elapsed = self.start.elapsed().as_nanos() as u64;
                self.n.fetch_add(1, Ordering::Relaxed);
                self.sum.fetch_add(elapsed, Ordering::Relaxed);
            }
        }

        TimerGuard {
            start: std::time::Instant::now(),
            n: &self.number_of_records,
            sum: &self.sum,
        }
    }
}
