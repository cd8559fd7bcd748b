//! Duplicate groups and digest aggregation.
//!
//! # Overview
//!
//! Rows are digested independently, so the only shared mutable state in a
//! grouping run is the digest → row-positions table. That table sits behind
//! the [`GroupAggregator`] trait:
//!
//! - [`LockedAggregator`]: one mutex around one map (default)
//! - [`ShardedAggregator`]: the map split by digest prefix, one mutex per shard
//!
//! Both produce the same table. [`build_groups`] then filters it to groups of
//! two or more rows, restores original row order inside every group and
//! orders the groups by a named [`GroupOrder`] policy.
//!
//! # Example
//!
//! ```
//! use rowdupe::duplicates::{build_groups, digest_row, GroupAggregator, GroupOrder, LockedAggregator};
//! use rowdupe::fields::KeyFieldList;
//! use rowdupe::source::{Row, Schema, Value};
//!
//! let schema = Schema::from_names(["id"]).unwrap();
//! let keys = KeyFieldList::from_names(&schema, &["id"]).unwrap();
//! let rows: Vec<Row> = ["1", "1", "2"]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, v)| Row::new(i, vec![Value::scalar(*v)]))
//!     .collect();
//!
//! let aggregator = LockedAggregator::with_capacity(rows.len());
//! for (pos, row) in rows.iter().enumerate() {
//!     aggregator.insert(digest_row(row, &keys), pos);
//! }
//! let (groups, stats) = build_groups(&rows, aggregator.into_table(), GroupOrder::FirstSeen);
//!
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].count(), 2);
//! assert_eq!(stats.duplicate_records, 1);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::digest::Digest;
use crate::source::Row;

/// Digest → positions of the rows that produced it.
pub type DigestTable = HashMap<Digest, Vec<usize>>;

/// Order in which duplicate groups are reported.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum GroupOrder {
    /// By the original position of each group's first row
    #[default]
    FirstSeen,
    /// Lexicographically by digest
    Digest,
}

impl fmt::Display for GroupOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstSeen => write!(f, "first-seen"),
            Self::Digest => write!(f, "digest"),
        }
    }
}

/// Rows sharing one key digest.
///
/// Members are in original input order; a group surfaced by
/// [`build_groups`] always has at least two members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup<'a> {
    digest: Digest,
    members: Vec<&'a Row>,
}

impl<'a> DuplicateGroup<'a> {
    #[must_use]
    pub fn new(digest: Digest, members: Vec<&'a Row>) -> Self {
        Self { digest, members }
    }

    #[must_use]
    pub fn digest(&self) -> Digest {
        self.digest
    }

    /// Digest as lowercase hex.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        self.digest.to_hex()
    }

    #[must_use]
    pub fn members(&self) -> &[&'a Row] {
        &self.members
    }

    /// The first row of the group in input order.
    #[must_use]
    pub fn first(&self) -> Option<&'a Row> {
        self.members.first().copied()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Rows beyond the first.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.members.len().saturating_sub(1)
    }
}

/// Statistics from a grouping run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupingStats {
    /// Rows digested
    pub total_rows: usize,
    /// Distinct digests, singletons included
    pub distinct_keys: usize,
    /// Groups with two or more rows
    pub duplicate_groups: usize,
    /// Rows that belong to some duplicate group
    pub rows_in_groups: usize,
    /// Rows beyond the first in every group
    pub duplicate_records: usize,
    /// Wall time of digesting and aggregation
    #[serde(skip)]
    pub duration: std::time::Duration,
}

impl GroupingStats {
    /// Percentage of rows that are redundant copies.
    #[must_use]
    pub fn duplicate_rate(&self) -> f64 {
        if self.total_rows == 0 {
            0.0
        } else {
            (self.duplicate_records as f64 / self.total_rows as f64) * 100.0
        }
    }
}

/// Thread-safe digest → row-positions aggregation.
pub trait GroupAggregator: Send + Sync {
    /// Record that the row at `position` produced `digest`.
    fn insert(&self, digest: Digest, position: usize);

    /// Consume the aggregator once all writers are done.
    fn into_table(self) -> DigestTable
    where
        Self: Sized;
}

/// One exclusive section around one map.
#[derive(Debug, Default)]
pub struct LockedAggregator {
    table: Mutex<DigestTable>,
}

impl LockedAggregator {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: Mutex::new(HashMap::with_capacity(capacity)),
        }
    }
}

impl GroupAggregator for LockedAggregator {
    fn insert(&self, digest: Digest, position: usize) {
        // Pushes are atomic under the lock, so a poisoned map is still whole.
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        table.entry(digest).or_default().push(position);
    }

    fn into_table(self) -> DigestTable {
        self.table.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

/// The map split across shards selected by the digest's first byte.
#[derive(Debug)]
pub struct ShardedAggregator {
    shards: Vec<Mutex<DigestTable>>,
}

impl ShardedAggregator {
    /// Create `shards` shards (clamped to 1..=256).
    #[must_use]
    pub fn new(shards: usize) -> Self {
        let shards = shards.clamp(1, 256);
        Self {
            shards: (0..shards).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    fn shard(&self, digest: &Digest) -> &Mutex<DigestTable> {
        &self.shards[usize::from(digest.as_bytes()[0]) % self.shards.len()]
    }
}

impl Default for ShardedAggregator {
    fn default() -> Self {
        Self::new(16)
    }
}

impl GroupAggregator for ShardedAggregator {
    fn insert(&self, digest: Digest, position: usize) {
        let shard = self.shard(&digest);
        let mut table = shard.lock().unwrap_or_else(|e| e.into_inner());
        table.entry(digest).or_default().push(position);
    }

    fn into_table(self) -> DigestTable {
        let mut table = HashMap::new();
        for shard in self.shards {
            table.extend(shard.into_inner().unwrap_or_else(|e| e.into_inner()));
        }
        table
    }
}

/// Turn an aggregated table into ordered duplicate groups.
///
/// `rows` must be the slice whose positions were inserted. Members of every
/// group are sorted by position; groups are ordered by `order`.
#[must_use]
pub fn build_groups<'a>(
    rows: &'a [Row],
    table: DigestTable,
    order: GroupOrder,
) -> (Vec<DuplicateGroup<'a>>, GroupingStats) {
    let mut stats = GroupingStats {
        total_rows: table.values().map(Vec::len).sum(),
        distinct_keys: table.len(),
        ..Default::default()
    };

    let mut groups: Vec<(Digest, Vec<usize>)> = table
        .into_iter()
        .filter(|(digest, positions)| {
            if positions.len() < 2 {
                log::trace!("Unique key {} at row {}", digest, positions[0]);
                false
            } else {
                true
            }
        })
        .map(|(digest, mut positions)| {
            positions.sort_unstable();
            (digest, positions)
        })
        .collect();

    match order {
        GroupOrder::FirstSeen => groups.sort_by_key(|(_, positions)| positions[0]),
        GroupOrder::Digest => groups.sort_by_key(|(digest, _)| *digest),
    }

    let groups: Vec<DuplicateGroup<'a>> = groups
        .into_iter()
        .map(|(digest, positions)| {
            stats.duplicate_groups += 1;
            stats.rows_in_groups += positions.len();
            stats.duplicate_records += positions.len() - 1;
            log::debug!("Duplicate key {}: {} rows", digest, positions.len());
            DuplicateGroup::new(digest, positions.into_iter().map(|p| &rows[p]).collect())
        })
        .collect();

    (groups, stats)
}
