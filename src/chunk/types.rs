//! PNG chunk stream types and constants

/// Length of the PNG file signature that precedes the first chunk
pub const SIGNATURE_LEN: u64 = 8;

/// Length of the trailing CRC field of every chunk
pub const CRC_LEN: u64 = 4;

/// Chunk type tag for uncompressed Latin-1 text (`tEXt`)
pub const TEXT_CHUNK_TYPE: u32 = 0x7445_5874;

/// Largest `tEXt` payload that is read; bigger ones are skipped
pub const MAX_TEXT_CHUNK_LEN: usize = 64 * 1024;

/// Length/type pair at the start of every chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Payload length in bytes (excludes type and CRC)
    pub length: u32,

    /// Four-byte chunk type, big-endian
    pub chunk_type: u32,
}

impl ChunkHeader {
    /// Decode a header from its 8 on-disk bytes
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Self {
            length: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            chunk_type: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    pub fn is_text(&self) -> bool {
        self.chunk_type == TEXT_CHUNK_TYPE
    }

    /// Chunk type as its four ASCII letters (lossy), for logs
    pub fn type_name(&self) -> String {
        String::from_utf8_lossy(&self.chunk_type.to_be_bytes()).into_owned()
    }
}

/// One keyword/text pair recovered from a `tEXt` chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRecord {
    pub keyword: String,
    pub text: String,
}

impl TextRecord {
    /// Split a `tEXt` payload at its first zero byte
    ///
    /// A payload without a zero byte is all keyword and has empty text.
    pub fn from_payload(payload: &[u8]) -> Self {
        match payload.iter().position(|&b| b == 0) {
            Some(nul) => Self {
                keyword: decode_text(&payload[..nul]),
                text: decode_text(&payload[nul + 1..]),
            },
            None => Self {
                keyword: decode_text(payload),
                text: String::new(),
            },
        }
    }

    /// Append the `"keyword: text\n"` rendering to `out`
    pub fn render_into(&self, out: &mut String) {
        out.push_str(&self.keyword);
        out.push_str(": ");
        out.push_str(&self.text);
        out.push('\n');
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.keyword.len() + self.text.len() + 3);
        self.render_into(&mut out);
        out
    }
}

/// Decode record bytes: UTF-8 when valid, Latin-1 otherwise
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_owned(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_big_endian() {
        let header = ChunkHeader::from_bytes([0, 0, 0x01, 0x02, b't', b'E', b'X', b't']);
        assert_eq!(header.length, 258);
        assert!(header.is_text());
        assert_eq!(header.type_name(), "tEXt");
    }

    #[test]
    fn test_record_split_at_first_zero() {
        let record = TextRecord::from_payload(b"Comment\0a\0b");
        assert_eq!(record.keyword, "Comment");
        assert_eq!(record.text, "a\0b");
    }

    #[test]
    fn test_record_without_zero_is_all_keyword() {
        let record = TextRecord::from_payload(b"NoTerminator");
        assert_eq!(record.keyword, "NoTerminator");
        assert_eq!(record.text, "");
        assert_eq!(record.render(), "NoTerminator: \n");
    }

    #[test]
    fn test_empty_keyword_and_text() {
        let record = TextRecord::from_payload(b"\0");
        assert_eq!(record.render(), ": \n");
    }

    #[test]
    fn test_latin1_fallback() {
        // 0xE9 alone is invalid UTF-8, Latin-1 'é'
        assert_eq!(decode_text(&[b'c', b'a', b'f', 0xE9]), "café");
        assert_eq!(decode_text("café".as_bytes()), "café");
    }
}
