//! Key field selection.
//!
//! - [`resolver`]: turns explicit names, explicit indices or primary-key
//!   hints into one validated [`KeyFieldList`]
//! - [`hints`]: loading and lookup of primary-key hint files

pub mod hints;
pub mod resolver;

pub use hints::{ColumnHint, HintError, HintMatch, PrimaryKeyHints};
pub use resolver::{
    FieldResolver, KeyFieldList, Resolution, ResolutionNotice, ResolveError, SelectionMechanism,
    SelectionRequest,
};
