//! Duplicate detection module.
//!
//! This module provides:
//! - Key canonicalization and digesting ([`digest`])
//! - Concurrent aggregation of digests into groups ([`groups`])
//! - The parallel grouping pipeline ([`finder`])

pub mod digest;
pub mod finder;
pub mod groups;

pub use digest::{digest_row, Digest, FIELD_SEPARATOR};
pub use finder::{DuplicateFinder, FinderConfig};
pub use groups::{
    build_groups, DigestTable, DuplicateGroup, GroupAggregator, GroupOrder, GroupingStats,
    LockedAggregator, ShardedAggregator,
};
