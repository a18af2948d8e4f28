//! Metadata index
//!
//! - [`SharedIndex`]: the map workers merge into while the scan runs
//! - [`filter`]: narrowing the finished map by search terms

pub mod filter;
pub mod shared;

pub use filter::{filter_index, matching_entries, SearchTerms};
pub use shared::SharedIndex;

use std::collections::HashMap;

/// Image identity -> rendered `tEXt` records
pub type MetadataIndex = HashMap<String, String>;
