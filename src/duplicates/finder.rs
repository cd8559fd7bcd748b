//! Duplicate finder: parallel digesting and grouping of rows.
//!
//! # Overview
//!
//! 1. **Digest** - every row's key values are hashed independently (rayon)
//! 2. **Aggregate** - digests are inserted into a [`GroupAggregator`]
//! 3. **Group** - the table is filtered to groups of two or more rows and
//!    put into a deterministic order (see [`build_groups`])
//!
//! Grouping results do not depend on the worker count; a single-threaded
//! run produces the same groups.
//!
//! # Example
//!
//! ```
//! use rowdupe::duplicates::{DuplicateFinder, FinderConfig};
//! use rowdupe::fields::KeyFieldList;
//! use rowdupe::source::{Dataset, Schema, Value};
//!
//! let schema = Schema::from_names(["id", "name"]).unwrap();
//! let dataset = Dataset::from_values(
//!     schema.clone(),
//!     vec![
//!         vec![Value::scalar("1"), Value::scalar("a")],
//!         vec![Value::scalar("1"), Value::scalar("a")],
//!         vec![Value::scalar("2"), Value::scalar("b")],
//!     ],
//! );
//! let keys = KeyFieldList::from_names(&schema, &["id", "name"]).unwrap();
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_threads(2));
//! let (groups, stats) = finder.find_duplicates(dataset.rows(), &keys);
//!
//! assert_eq!(groups.len(), 1);
//! assert_eq!(stats.duplicate_records, 1);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use super::digest::digest_row;
use super::groups::{
    build_groups, DuplicateGroup, GroupAggregator, GroupOrder, GroupingStats, LockedAggregator,
};
use crate::fields::KeyFieldList;
use crate::progress::ProgressCallback;
use crate::source::Row;

/// Rows between progress callbacks.
const PROGRESS_STRIDE: usize = 1024;

/// Configuration for the duplicate finder.
#[derive(Clone, Default)]
pub struct FinderConfig {
    /// Worker threads for digesting. 0 = rayon's global pool, 1 = sequential.
    pub threads: usize,
    /// Order in which groups are returned.
    pub order: GroupOrder,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("threads", &self.threads)
            .field("order", &self.order)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl FinderConfig {
    /// Set the worker thread count.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the group ordering policy.
    #[must_use]
    pub fn with_order(mut self, order: GroupOrder) -> Self {
        self.order = order;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Groups rows into duplicate-equivalence classes.
#[derive(Debug, Default)]
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Find duplicate groups using the default [`LockedAggregator`].
    #[must_use]
    pub fn find_duplicates<'a>(
        &self,
        rows: &'a [Row],
        keys: &KeyFieldList,
    ) -> (Vec<DuplicateGroup<'a>>, GroupingStats) {
        self.find_duplicates_with(rows, keys, LockedAggregator::with_capacity(rows.len()))
    }

    /// Find duplicate groups using a caller-supplied aggregator.
    ///
    /// `keys` is never empty, so every row has a digest.
    pub fn find_duplicates_with<'a, A: GroupAggregator>(
        &self,
        rows: &'a [Row],
        keys: &KeyFieldList,
        aggregator: A,
    ) -> (Vec<DuplicateGroup<'a>>, GroupingStats) {
        let start = Instant::now();
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("digest", rows.len());
        }
        log::info!("Digesting {} row(s) on key ({})", rows.len(), keys);

        let done = AtomicUsize::new(0);
        let digest_one = |(pos, row): (usize, &Row)| {
            aggregator.insert(digest_row(row, keys), pos);
            let n = done.fetch_add(1, Ordering::Relaxed) + 1;
            if n % PROGRESS_STRIDE == 0 || n == rows.len() {
                if let Some(ref callback) = self.config.progress_callback {
                    callback.on_progress(n);
                }
            }
        };

        match self.config.threads {
            1 => rows.iter().enumerate().for_each(digest_one),
            0 => rows.par_iter().enumerate().for_each(digest_one),
            n => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                Ok(pool) => pool.install(|| rows.par_iter().enumerate().for_each(digest_one)),
                Err(e) => {
                    log::warn!(
                        "Failed to create a {}-thread pool ({}), using global pool with {} threads",
                        n,
                        e,
                        rayon::current_num_threads()
                    );
                    rows.par_iter().enumerate().for_each(digest_one);
                }
            },
        }

        // All writers have finished; the table is read only from here on.
        let (groups, mut stats) = build_groups(rows, aggregator.into_table(), self.config.order);
        stats.duration = start.elapsed();

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("digest");
        }
        log::info!(
            "Grouping complete: {} row(s) → {} distinct key(s), {} duplicate group(s) ({:.1}% redundant) in {:.2?}",
            stats.total_rows,
            stats.distinct_keys,
            stats.duplicate_groups,
            stats.duplicate_rate(),
            stats.duration
        );

        (groups, stats)
    }
}
