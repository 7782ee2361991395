//! DDX (Xbox packed texture) size-estimation parser (spec.md §4.3).
//!
//! Validates the header via [`crate::ddx2dds::header`] and produces a
//! heuristic `estimated_size` for the carving engine to read and, later,
//! attempt to convert; the actual LZX decode happens in
//! [`crate::ddx2dds::pipeline::convert`].

use super::boundary;
use crate::ddx2dds::header::{self, gpu_format_to_fourcc, HEADER_LEN};
use crate::error::{CarveError, Result};
use crate::formats::dds::block_bytes;
use crate::types::ParseResult;

pub fn parse(data: &[u8], offset: usize) -> Result<ParseResult> {
    let hdr = header::parse(data, offset)?;

    let four_cc = gpu_format_to_fourcc(hdr.gpu_format);
    let block_size = four_cc.map(block_bytes).unwrap_or(16);

    let uncompressed_size = mip_total_bytes(hdr.width, hdr.height, hdr.mip_count, block_size);
    let compressed_upper_bound = HEADER_LEN as u64 + (uncompressed_size * 3 / 4);

    let conservative_min = HEADER_LEN as u64 + (100u64).max(uncompressed_size / 5);
    let scan_start = (offset as u64 + conservative_min) as usize;
    let scan_cap = offset as u64 + HEADER_LEN as u64 + uncompressed_size;

    let tighter_bound = boundary::find_next_valid(data, scan_start, b"3XDO", header::looks_valid)
        .or_else(|| boundary::find_next_valid(data, scan_start, b"3XDR", header::looks_valid))
        .map(|next_offset| (next_offset as u64).saturating_sub(offset as u64))
        .filter(|&sz| sz <= scan_cap - offset as u64);

    let estimated_size = tighter_bound.unwrap_or(compressed_upper_bound.min(scan_cap - offset as u64));

    let sig_id = match &data[offset..offset + 4] {
        b"3XDO" => "ddx_3xdo",
        _ => "ddx_3xdr",
    };

    let mut result = ParseResult::new(sig_id, estimated_size)
        .with_dimensions(hdr.width, hdr.height)
        .with_mip_count(hdr.mip_count)
        .with_meta("tiled", hdr.tiled)
        .with_meta("gpuFormat", hdr.gpu_format as u64);

    if let Some(fc) = four_cc {
        result = result.with_four_cc(fc);
    } else {
        return Err(CarveError::ParserReject {
            offset: offset as u64,
            reason: format!("unrecognized GPU format 0x{:02X}", hdr.gpu_format),
        });
    }

    Ok(result)
}

fn mip_total_bytes(width: u32, height: u32, mip_count: u32, block_size: u64) -> u64 {
    let mut total = 0u64;
    let mut w = width as u64;
    let mut h = height as u64;
    for _ in 0..mip_count {
        let blocks_w = w.div_ceil(4).max(1);
        let blocks_h = h.div_ceil(4).max(1);
        total += blocks_w * blocks_h * block_size;
        w = (w / 2).max(1);
        h = (h / 2).max(1);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_header(magic: &[u8; 4], format: u32, size: u32) -> Vec<u8> {
        let mut h = vec![0u8; HEADER_LEN];
        h[0..4].copy_from_slice(magic);
        h[0x07..0x09].copy_from_slice(&3u16.to_le_bytes());
        h[0x24..0x28].copy_from_slice(&0x0080_0000u32.to_be_bytes());
        h[0x28..0x2C].copy_from_slice(&format.to_be_bytes());
        h[0x2C..0x30].copy_from_slice(&size.to_be_bytes());
        h
    }

    #[test]
    fn test_ddx_parse_produces_size_within_range() {
        let size = 0x000F | (0x000F << 13); // width=16, height=16
        let header = build_header(b"3XDO", 0x0012, size);
        let mut data = header;
        data.extend(vec![0u8; 4096]);
        let result = parse(&data, 0).unwrap();
        assert_eq!(result.width, Some(16));
        assert_eq!(result.four_cc.as_deref(), Some("DXT1"));
        assert!(result.estimated_size >= HEADER_LEN as u64);
    }

    #[test]
    fn test_unrecognized_gpu_format_rejected() {
        let header = build_header(b"3XDO", 0x00AA, 0);
        assert!(parse(&header, 0).is_err());
    }
}
