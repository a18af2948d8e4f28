//! Chunk stream walker
//!
//! Walks a PNG chunk stream from just past the signature, yielding one
//! [`TextRecord`] per `tEXt` chunk and seeking over everything else.
//! Nothing here returns an error to the caller: the walk simply stops at
//! the first header or payload that cannot be read, and the reason is kept
//! in [`ChunkStats`].

use crate::chunk::types::{
    ChunkHeader, TextRecord, CRC_LEN, MAX_TEXT_CHUNK_LEN, SIGNATURE_LEN,
};
use crate::error::ChunkError;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, trace};

/// Why the chunk walk ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// No bytes left at a chunk boundary
    EndOfStream,

    /// A header or payload was cut short
    Truncated { offset: u64, field: &'static str },

    /// The reader returned an error
    ReadError { offset: u64, message: String },
}

impl From<ChunkError> for StopReason {
    fn from(err: ChunkError) -> Self {
        match err {
            ChunkError::Truncated { offset, field } => StopReason::Truncated { offset, field },
            ChunkError::Io { offset, source } => StopReason::ReadError {
                offset,
                message: source.to_string(),
            },
        }
    }
}

/// Counters for one walk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkStats {
    /// Chunk headers read (all types)
    pub chunks: u64,

    /// `tEXt` records decoded
    pub text_records: u64,

    /// `tEXt` chunks skipped for exceeding the buffer
    pub oversized_skipped: u64,

    /// Set once the walk is over
    pub stop: Option<StopReason>,
}

/// Iterator over the `tEXt` records of a chunk stream
pub struct ChunkReader<R> {
    inner: R,

    /// Payload buffer, allocated once at `MAX_TEXT_CHUNK_LEN`
    buf: Vec<u8>,

    /// Logical stream position
    offset: u64,

    started: bool,
    stats: ChunkStats,
}

impl<R: Read + Seek> ChunkReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: vec![0u8; MAX_TEXT_CHUNK_LEN],
            offset: 0,
            started: false,
            stats: ChunkStats::default(),
        }
    }

    pub fn stats(&self) -> &ChunkStats {
        &self.stats
    }

    pub fn into_stats(self) -> ChunkStats {
        self.stats
    }

    /// Drain the remaining records into `"keyword: text\n"` lines
    pub fn collect_metadata(&mut self) -> String {
        let mut out = String::new();
        while let Some(record) = self.next_record() {
            record.render_into(&mut out);
        }
        out
    }

    /// Advance to the next `tEXt` record
    pub fn next_record(&mut self) -> Option<TextRecord> {
        if self.stats.stop.is_some() {
            return None;
        }

        if !self.started {
            self.started = true;
            if let Err(e) = self.skip_signature() {
                self.finish(e.into());
                return None;
            }
        }

        loop {
            let header = match self.read_header() {
                Ok(Some(header)) => header,
                Ok(None) => {
                    self.finish(StopReason::EndOfStream);
                    return None;
                }
                Err(e) => {
                    self.finish(e.into());
                    return None;
                }
            };
            self.stats.chunks += 1;

            trace!(
                offset = self.offset,
                chunk = %header.type_name(),
                length = header.length,
                "Chunk header"
            );

            if !header.is_text() {
                if let Err(e) = self.skip(u64::from(header.length) + CRC_LEN) {
                    self.finish(e.into());
                    return None;
                }
                continue;
            }

            let len = header.length as usize;
            if len > MAX_TEXT_CHUNK_LEN {
                debug!(
                    offset = self.offset,
                    length = header.length,
                    max = MAX_TEXT_CHUNK_LEN,
                    "Skipping oversized tEXt chunk"
                );
                self.stats.oversized_skipped += 1;
                if let Err(e) = self.skip(u64::from(header.length) + CRC_LEN) {
                    self.finish(e.into());
                    return None;
                }
                continue;
            }

            if let Err(e) = self.read_payload(len) {
                self.finish(e.into());
                return None;
            }
            let record = TextRecord::from_payload(&self.buf[..len]);
            self.stats.text_records += 1;

            // CRC is not validated; a missing one surfaces at the next header read
            if let Err(e) = self.skip(CRC_LEN) {
                self.finish(e.into());
            }
            return Some(record);
        }
    }

    fn finish(&mut self, reason: StopReason) {
        match &reason {
            StopReason::EndOfStream => {}
            StopReason::Truncated { offset, field } => {
                debug!(offset = *offset, field = *field, "Chunk stream truncated");
            }
            StopReason::ReadError { offset, message } => {
                debug!(offset = *offset, error = %message, "Chunk stream read failed");
            }
        }
        self.stats.stop = Some(reason);
    }

    fn skip_signature(&mut self) -> Result<(), ChunkError> {
        self.inner
            .seek(SeekFrom::Start(SIGNATURE_LEN))
            .map_err(|e| ChunkError::from_io(e, 0, "signature"))?;
        self.offset = SIGNATURE_LEN;
        Ok(())
    }

    /// Read the length/type pair; `Ok(None)` when the stream is exhausted
    fn read_header(&mut self) -> Result<Option<ChunkHeader>, ChunkError> {
        let mut bytes = [0u8; 8];

        let got = self.read_up_to(&mut bytes[..4])?;
        if got == 0 {
            return Ok(None);
        }
        if got < 4 {
            return Err(ChunkError::Truncated {
                offset: self.offset,
                field: "length",
            });
        }

        let got = self.read_up_to(&mut bytes[4..])?;
        if got < 4 {
            return Err(ChunkError::Truncated {
                offset: self.offset,
                field: "type",
            });
        }

        Ok(Some(ChunkHeader::from_bytes(bytes)))
    }

    fn read_payload(&mut self, len: usize) -> Result<(), ChunkError> {
        let mut buf = std::mem::take(&mut self.buf);
        let result = self.read_up_to(&mut buf[..len]);
        self.buf = buf;

        if result? < len {
            return Err(ChunkError::Truncated {
                offset: self.offset,
                field: "payload",
            });
        }
        Ok(())
    }

    /// Fill as much of `dst` as the stream allows
    fn read_up_to(&mut self, dst: &mut [u8]) -> Result<usize, ChunkError> {
        let mut filled = 0;
        while filled < dst.len() {
            match self.inner.read(&mut dst[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ChunkError::from_io(e, self.offset, "chunk")),
            }
        }
        self.offset += filled as u64;
        Ok(filled)
    }

    fn skip(&mut self, count: u64) -> Result<(), ChunkError> {
        let delta = i64::try_from(count).unwrap_or(i64::MAX);
        self.inner
            .seek(SeekFrom::Current(delta))
            .map_err(|e| ChunkError::from_io(e, self.offset, "skip"))?;
        self.offset = self.offset.saturating_add(count);
        Ok(())
    }
}

impl<R: Read + Seek> Iterator for ChunkReader<R> {
    type Item = TextRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}

/// Concatenate every `tEXt` record in `reader` as `"keyword: text\n"`
///
/// Never fails. Returns whatever was collected before the first
/// unreadable header or payload.
pub fn parse_metadata<R: Read + Seek>(reader: R) -> String {
    ChunkReader::new(reader).collect_metadata()
}

/// Result of parsing one file from disk
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    /// Rendered records, empty when none or unreadable
    pub metadata: String,

    /// File size in bytes (0 if unknown)
    pub size: u64,

    pub stats: ChunkStats,

    /// Set when the file could not be opened
    pub open_error: Option<String>,
}

impl ParsedFile {
    pub fn is_readable(&self) -> bool {
        self.open_error.is_none()
    }
}

/// Open `path` and parse its metadata
///
/// An open failure yields empty metadata with `open_error` set.
pub fn parse_file(path: &Path) -> ParsedFile {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            return ParsedFile {
                open_error: Some(e.to_string()),
                ..ParsedFile::default()
            }
        }
    };
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);

    let mut reader = ChunkReader::new(BufReader::new(file));
    let metadata = reader.collect_metadata();

    ParsedFile {
        metadata,
        size,
        stats: reader.into_stats(),
        open_error: None,
    }
}
