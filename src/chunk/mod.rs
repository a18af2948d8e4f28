//! PNG chunk parsing
//!
//! Recovers the `tEXt` keyword/text records from a PNG file without
//! decoding any image data.
//!
//! # Stream layout
//!
//! ```text
//! ┌───────────┬────────┬──────┬─────────────┬─────┬────────┬──────┬─────
//! │ signature │ length │ type │   payload   │ CRC │ length │ type │ ...
//! │  8 bytes  │ u32 BE │ 4 B  │ length B    │ 4 B │        │      │
//! └───────────┴────────┴──────┴─────────────┴─────┴────────┴──────┴─────
//! ```
//!
//! A `tEXt` payload is `keyword NUL text`. Every other chunk is skipped.

pub mod reader;
pub mod types;

pub use reader::{parse_file, parse_metadata, ChunkReader, ChunkStats, ParsedFile, StopReason};
pub use types::{ChunkHeader, TextRecord, MAX_TEXT_CHUNK_LEN, TEXT_CHUNK_TYPE};
