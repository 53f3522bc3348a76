//! Sentinel-terminated source buffer for zero-bounds-check scanning.
//!
//! The buffer guarantees a run of `0x00` bytes after the source content,
//! so the scanner can peek several bytes ahead — up to the longest raw-tag
//! end-tag probe — without bounds checking. EOF is the sentinel byte at
//! `len()`; interior NUL bytes are distinguished from it by offset.
//!
//! Construction takes `&str`, so buffer contents are always valid UTF-8
//! and token literals can be handed out as `&str` slices.

/// Cache line size in bytes, used for buffer alignment padding.
const CACHE_LINE: usize = 64;

/// Guaranteed readable bytes past the end of the source.
///
/// Must cover the scanner's longest fixed lookahead: the `</plaintext`
/// raw-tag probe (11 bytes).
const LOOKAHEAD: usize = 16;

/// Sentinel-terminated source buffer.
///
/// # Layout
///
/// ```text
/// [source_bytes..., 0x00 x >=16, zero padding to a 64-byte boundary]
///  ^                ^
///  0                source_len (sentinel)
/// ```
#[derive(Clone, Debug)]
pub struct SourceBuffer {
    /// Owned buffer: source bytes followed by zero padding.
    buf: Vec<u8>,
    /// Length of the actual source content (excludes padding).
    source_len: u32,
}

impl SourceBuffer {
    /// Create a new sentinel-terminated buffer from source code.
    ///
    /// # Panics
    ///
    /// Panics when the source exceeds `u32::MAX - 64` bytes; template
    /// sources anywhere near 4 GiB are a caller bug.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let source_bytes = source.as_bytes();
        let source_len = source_bytes.len();

        // Room for the lookahead window, rounded up to a cache line.
        let padded_len = (source_len + LOOKAHEAD + CACHE_LINE - 1) & !(CACHE_LINE - 1);

        let mut buf = vec![0u8; padded_len];
        buf[..source_len].copy_from_slice(source_bytes);

        let source_len = u32::try_from(source_len).expect("source exceeds u32 offsets");

        Self { buf, source_len }
    }

    /// Length of the source content in bytes (excludes padding).
    #[must_use]
    pub fn len(&self) -> u32 {
        self.source_len
    }

    /// Returns `true` if the source content is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.source_len == 0
    }

    /// The source bytes (without padding).
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.source_len as usize]
    }

    /// The full buffer including sentinel and padding.
    #[must_use]
    pub fn as_sentinel_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Byte at `offset`, which may point up to [`LOOKAHEAD`] bytes past
    /// the source end; such reads return the `0x00` padding.
    #[inline]
    pub(crate) fn byte(&self, offset: u32) -> u8 {
        self.buf[offset as usize]
    }

    /// Window of `n` bytes starting at `offset`, possibly extending into
    /// the zero padding.
    #[inline]
    pub(crate) fn bytes(&self, offset: u32, n: usize) -> &[u8] {
        &self.buf[offset as usize..offset as usize + n]
    }

    /// Extract a source substring as `&str`.
    ///
    /// # Contract
    ///
    /// `start..end` must fall within the source content and on character
    /// boundaries. Both hold for offsets produced by the scanner, since
    /// it only ever stops on boundaries of the originally-valid `&str`.
    #[inline]
    pub(crate) fn slice(&self, start: u32, end: u32) -> &str {
        debug_assert!(start <= end, "slice start {start} exceeds end {end}");
        debug_assert!(
            end <= self.source_len,
            "slice end {end} exceeds source length {}",
            self.source_len
        );
        // SAFETY: the buffer was copied from `&str` (valid UTF-8) and the
        // scanner only produces offsets on character boundaries.
        unsafe { std::str::from_utf8_unchecked(&self.buf[start as usize..end as usize]) }
    }

    /// Decode the character starting at `offset`, or `None` at or past
    /// the end of the source.
    #[inline]
    pub(crate) fn char_at(&self, offset: u32) -> Option<char> {
        if offset >= self.source_len {
            return None;
        }
        self.slice(offset, self.source_len).chars().next()
    }
}
