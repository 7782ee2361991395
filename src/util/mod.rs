//! Binary utilities: bounds-checked endian reads, byte-pattern search,
//! printable-text heuristics, and filename sanitization (spec.md §4.1/C1).

use crate::error::{CarveError, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Read bytes with bounds checking, returning a [`CarveError::TruncatedCapture`]
/// rather than panicking.
pub fn read_bytes<'a>(data: &'a [u8], offset: usize, len: usize) -> Result<&'a [u8]> {
    let end = offset
        .checked_add(len)
        .ok_or_else(|| CarveError::TruncatedCapture {
            offset: offset as u64,
            wanted: len,
            available: 0,
        })?;
    if end > data.len() {
        return Err(CarveError::TruncatedCapture {
            offset: offset as u64,
            wanted: len,
            available: data.len().saturating_sub(offset),
        });
    }
    Ok(&data[offset..end])
}

/// Read a `u16` at `offset` with the given endianness.
pub fn read_u16(data: &[u8], offset: usize, little_endian: bool) -> Result<u16> {
    let bytes = read_bytes(data, offset, 2)?;
    Ok(if little_endian {
        LittleEndian::read_u16(bytes)
    } else {
        BigEndian::read_u16(bytes)
    })
}

/// Read a `u32` at `offset` with the given endianness.
pub fn read_u32(data: &[u8], offset: usize, little_endian: bool) -> Result<u32> {
    let bytes = read_bytes(data, offset, 4)?;
    Ok(if little_endian {
        LittleEndian::read_u32(bytes)
    } else {
        BigEndian::read_u32(bytes)
    })
}

/// Read a `u64` at `offset` with the given endianness.
pub fn read_u64(data: &[u8], offset: usize, little_endian: bool) -> Result<u64> {
    let bytes = read_bytes(data, offset, 8)?;
    Ok(if little_endian {
        LittleEndian::read_u64(bytes)
    } else {
        BigEndian::read_u64(bytes)
    })
}

/// Search for the first occurrence of `needle` in `haystack` at or after
/// `start`. Thin wrapper over `memchr::memmem` kept here so callers don't
/// need to depend on `memchr` directly.
pub fn find_from(haystack: &[u8], needle: &[u8], start: usize) -> Option<usize> {
    if start >= haystack.len() {
        return None;
    }
    memchr::memmem::find(&haystack[start..], needle).map(|pos| pos + start)
}

/// Heuristic printable-text test used by the script/boundary carvers: a byte
/// is "printable" if it is ASCII printable, tab, CR, or LF.
pub fn is_printable_byte(b: u8) -> bool {
    matches!(b, 0x09 | 0x0A | 0x0D | 0x20..=0x7E)
}

/// True if `data` looks like printable text: every byte passes
/// [`is_printable_byte`].
pub fn is_probably_text(data: &[u8]) -> bool {
    !data.is_empty() && data.iter().all(|&b| is_printable_byte(b))
}

/// Finds the offset of the first run of more than `run_len` consecutive
/// non-printable bytes in `data`, starting the search at `start`. Used by
/// the script carver and the boundary scanner to bound unlengthed formats.
pub fn find_non_printable_run(data: &[u8], start: usize, run_len: usize) -> Option<usize> {
    let mut run_start = None;
    let mut count = 0usize;
    for (i, &b) in data.iter().enumerate().skip(start) {
        if is_printable_byte(b) {
            count = 0;
            run_start = None;
        } else {
            if count == 0 {
                run_start = Some(i);
            }
            count += 1;
            if count > run_len {
                return run_start;
            }
        }
    }
    None
}

/// Sanitizes a string for use as a path component: replaces characters that
/// are illegal or awkward in filenames (on either Windows or POSIX) with
/// `_`, and collapses leading/trailing dots and whitespace.
pub fn sanitize_filename(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    while out.starts_with('.') || out.starts_with(' ') {
        out.remove(0);
    }
    while out.ends_with('.') || out.ends_with(' ') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("unnamed");
    }
    out
}

/// Reads a minidump-style Unicode string: a little-endian `u32` byte length
/// prefix followed by that many bytes of UTF-16LE text (spec.md §4.2).
pub fn read_minidump_string(data: &[u8], offset: usize) -> Result<String> {
    let byte_len = read_u32(data, offset, true)? as usize;
    let text_bytes = read_bytes(data, offset + 4, byte_len)?;
    let units: Vec<u16> = text_bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    Ok(String::from_utf16_lossy(&units))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_u32_endian() {
        let data = [0x01, 0x02, 0x03, 0x04];
        assert_eq!(read_u32(&data, 0, true).unwrap(), 0x0403_0201);
        assert_eq!(read_u32(&data, 0, false).unwrap(), 0x0102_0304);
    }

    #[test]
    fn test_read_bytes_truncated() {
        let data = [0u8; 4];
        assert!(read_bytes(&data, 2, 4).is_err());
        assert!(read_bytes(&data, 0, 4).is_ok());
    }

    #[test]
    fn test_find_from() {
        let hay = b"abcXYZabcXYZ";
        assert_eq!(find_from(hay, b"XYZ", 0), Some(3));
        assert_eq!(find_from(hay, b"XYZ", 4), Some(9));
        assert_eq!(find_from(hay, b"QQQ", 0), None);
    }

    #[test]
    fn test_is_probably_text() {
        assert!(is_probably_text(b"hello world\n"));
        assert!(!is_probably_text(b"hi\x00\x01\x02"));
    }

    #[test]
    fn test_find_non_printable_run() {
        let data = b"abc\x00\x01\x02\x03def";
        assert_eq!(find_non_printable_run(data, 0, 3), Some(3));
        assert_eq!(find_non_printable_run(b"all printable", 0, 3), None);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("a:b/c\\d"), "a_b_c_d");
        assert_eq!(sanitize_filename("  .hidden.  "), "hidden");
        assert_eq!(sanitize_filename("...."), "unnamed");
    }

    #[test]
    fn test_read_minidump_string() {
        let mut data = Vec::new();
        data.extend_from_slice(&6u32.to_le_bytes());
        for c in "abc".encode_utf16() {
            data.extend_from_slice(&c.to_le_bytes());
        }
        assert_eq!(read_minidump_string(&data, 0).unwrap(), "abc");
    }
}
