//! DDS (DirectDraw Surface) header parser (spec.md §4.3).

use crate::error::{CarveError, Result};
use crate::types::ParseResult;
use crate::util::{read_bytes, read_u32};

const HEADER_LEN: usize = 128;

/// Block size in bytes for each recognized FourCC, per BCn block rules.
pub(crate) fn block_bytes(four_cc: &str) -> u64 {
    match four_cc {
        "DXT1" | "ATI1" | "BC4U" | "BC4S" => 8,
        _ => 16,
    }
}

pub fn parse(data: &[u8], offset: usize) -> Result<ParseResult> {
    let header = read_bytes(data, offset, HEADER_LEN).map_err(|_| CarveError::ParserReject {
        offset: offset as u64,
        reason: "truncated DDS header".to_string(),
    })?;

    // Endianness is ambiguous at the file level; try little-endian first
    // (the common case) and fall back to big-endian if the fields don't
    // look sane, sanity-checking height/width/header_size as the spec
    // instructs.
    let (height, width, header_size, little_endian) = {
        let le = (
            read_u32(header, 8, true)?,
            read_u32(header, 12, true)?,
            read_u32(header, 4, true)?,
        );
        if le.2 == 124 && le.0 > 0 && le.0 <= 16384 && le.1 > 0 && le.1 <= 16384 {
            (le.0, le.1, le.2, true)
        } else {
            let be = (
                read_u32(header, 8, false)?,
                read_u32(header, 12, false)?,
                read_u32(header, 4, false)?,
            );
            if be.2 == 124 && be.0 > 0 && be.0 <= 16384 && be.1 > 0 && be.1 <= 16384 {
                (be.0, be.1, be.2, false)
            } else {
                return Err(CarveError::ParserReject {
                    offset: offset as u64,
                    reason: "header_size != 124 or implausible dimensions".to_string(),
                });
            }
        }
    };

    let flags = read_u32(header, 0x50, little_endian)?;
    let four_cc_bytes = read_bytes(header, 0x54, 4)?;
    let four_cc = String::from_utf8_lossy(four_cc_bytes).to_string();
    let mip_count_field = read_u32(header, 28, little_endian)?;
    let has_mipmap_flag = flags & 0x0002_0000 != 0; // DDSD_MIPMAPCOUNT
    let mip_count = if has_mipmap_flag {
        mip_count_field.max(1)
    } else {
        1
    };

    let block_size = block_bytes(&four_cc);
    let mips_to_sum = mip_count.min(16) as u64;
    let mut total_mip_bytes = 0u64;
    let mut mip_w = width as u64;
    let mut mip_h = height as u64;
    for _ in 0..mips_to_sum {
        let blocks_w = mip_w.div_ceil(4).max(1);
        let blocks_h = mip_h.div_ceil(4).max(1);
        total_mip_bytes += blocks_w * blocks_h * block_size;
        mip_w = (mip_w / 2).max(1);
        mip_h = (mip_h / 2).max(1);
    }

    let estimated_size = HEADER_LEN as u64 + total_mip_bytes;

    Ok(ParseResult::new("dds", estimated_size)
        .with_dimensions(width, height)
        .with_mip_count(mip_count)
        .with_four_cc(four_cc)
        .with_meta("isBigEndian", !little_endian))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_dds_header(width: u32, height: u32, four_cc: &[u8; 4], mip_count: u32) -> Vec<u8> {
        let mut h = vec![0u8; HEADER_LEN];
        h[0..4].copy_from_slice(b"DDS ");
        h[4..8].copy_from_slice(&124u32.to_le_bytes());
        h[8..12].copy_from_slice(&height.to_le_bytes());
        h[12..16].copy_from_slice(&width.to_le_bytes());
        h[28..32].copy_from_slice(&mip_count.to_le_bytes());
        h[0x50..0x54].copy_from_slice(&0x0002_1007u32.to_le_bytes()); // DDSD_MIPMAPCOUNT and others
        h[0x54..0x58].copy_from_slice(four_cc);
        h
    }

    #[test]
    fn test_dxt1_single_mip_64x64() {
        let header = build_dds_header(64, 64, b"DXT1", 1);
        let mut data = header;
        data.extend(vec![0u8; 2048]);
        let result = parse(&data, 0).unwrap();
        assert_eq!(result.width, Some(64));
        assert_eq!(result.height, Some(64));
        // 64x64 DXT1 = 16x16 blocks * 8 bytes = 2048 bytes of block data.
        assert_eq!(result.estimated_size, 128 + 2048);
    }

    #[test]
    fn test_rejects_bad_header_size() {
        let mut header = build_dds_header(64, 64, b"DXT1", 1);
        header[4..8].copy_from_slice(&0u32.to_le_bytes());
        assert!(parse(&header, 0).is_err());
    }

    #[test]
    fn test_truncated_header_rejected() {
        let data = vec![0u8; 32];
        assert!(parse(&data, 0).is_err());
    }
}
