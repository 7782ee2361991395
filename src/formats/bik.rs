//! Bink video (`BIKa`/`BIKb`/...) parser (spec.md §4.3).

use crate::error::{CarveError, Result};
use crate::types::ParseResult;
use crate::util::{read_bytes, read_u32};

const MAX_DIMENSION: u32 = 4096;
const MAX_FRAME_COUNT: u32 = 1_000_000;

pub fn parse(data: &[u8], offset: usize) -> Result<ParseResult> {
    let header = read_bytes(data, offset, 32).map_err(|_| CarveError::ParserReject {
        offset: offset as u64,
        reason: "truncated BIK header".to_string(),
    })?;

    if &header[0..3] != b"BIK" || !header[3].is_ascii_lowercase() {
        return Err(CarveError::ParserReject {
            offset: offset as u64,
            reason: "missing BIK[a-z] magic".to_string(),
        });
    }

    let header_size_field = read_u32(header, 4, true)?;
    let frame_count = read_u32(header, 8, true)?;
    let largest_frame_size = read_u32(header, 12, true)?;
    let width = read_u32(header, 20, true)?;
    let height = read_u32(header, 24, true)?;

    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(CarveError::ParserReject {
            offset: offset as u64,
            reason: format!("implausible dimensions {width}x{height}"),
        });
    }
    if frame_count == 0 || frame_count > MAX_FRAME_COUNT {
        return Err(CarveError::ParserReject {
            offset: offset as u64,
            reason: format!("implausible frame_count {frame_count}"),
        });
    }
    if largest_frame_size > header_size_field {
        return Err(CarveError::ParserReject {
            offset: offset as u64,
            reason: "largest_frame_size exceeds header_size_field".to_string(),
        });
    }

    let estimated_size = header_size_field as u64 + 8;

    Ok(ParseResult::new("bik", estimated_size)
        .with_dimensions(width, height)
        .with_meta("frameCount", frame_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_bik(header_size: u32, frame_count: u32, largest_frame: u32, w: u32, h: u32) -> Vec<u8> {
        let mut data = vec![0u8; 32];
        data[0..4].copy_from_slice(b"BIKi");
        data[4..8].copy_from_slice(&header_size.to_le_bytes());
        data[8..12].copy_from_slice(&frame_count.to_le_bytes());
        data[12..16].copy_from_slice(&largest_frame.to_le_bytes());
        data[20..24].copy_from_slice(&w.to_le_bytes());
        data[24..28].copy_from_slice(&h.to_le_bytes());
        data
    }

    #[test]
    fn test_valid_bik_header() {
        let data = build_bik(10_000, 300, 2000, 640, 480);
        let result = parse(&data, 0).unwrap();
        assert_eq!(result.estimated_size, 10_008);
        assert_eq!(result.width, Some(640));
    }

    #[test]
    fn test_rejects_oversized_dimensions() {
        let data = build_bik(10_000, 300, 2000, 8192, 480);
        assert!(parse(&data, 0).is_err());
    }

    #[test]
    fn test_rejects_largest_frame_exceeding_header_size() {
        let data = build_bik(100, 300, 2000, 640, 480);
        assert!(parse(&data, 0).is_err());
    }
}
