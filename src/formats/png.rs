//! PNG parser: validates the 8-byte signature and bounds the carve at the
//! end of the `IEND` chunk (spec.md §4.3).

use crate::error::{CarveError, Result};
use crate::types::ParseResult;
use crate::util::{find_from, read_bytes};

const MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

pub fn parse(data: &[u8], offset: usize) -> Result<ParseResult> {
    let header = read_bytes(data, offset, MAGIC.len())?;
    if header != MAGIC {
        return Err(CarveError::ParserReject {
            offset: offset as u64,
            reason: "missing PNG signature".to_string(),
        });
    }

    let iend = find_from(data, b"IEND", offset + MAGIC.len()).ok_or_else(|| {
        CarveError::ParserReject {
            offset: offset as u64,
            reason: "no IEND chunk found".to_string(),
        }
    })?;

    // IEND's 4-byte CRC follows the 4-byte chunk-type tag.
    let end = iend + 4 + 4;
    let estimated_size = (end - offset) as u64;

    Ok(ParseResult::new("png", estimated_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_bounded_at_iend() {
        let mut data = MAGIC.to_vec();
        data.extend_from_slice(&[0u8; 25]); // IHDR chunk, contents irrelevant
        data.extend_from_slice(b"IEND");
        data.extend_from_slice(&[0xAE, 0x42, 0x60, 0x82]); // CRC
        data.extend_from_slice(b"trailing junk after the PNG");
        let result = parse(&data, 0).unwrap();
        assert_eq!(result.estimated_size, (MAGIC.len() + 25 + 4 + 4) as u64);
    }

    #[test]
    fn test_missing_magic_rejected() {
        let data = vec![0u8; 16];
        assert!(parse(&data, 0).is_err());
    }

    #[test]
    fn test_missing_iend_rejected() {
        let mut data = MAGIC.to_vec();
        data.extend_from_slice(&[0u8; 16]);
        assert!(parse(&data, 0).is_err());
    }
}
