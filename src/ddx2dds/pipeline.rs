//! Orchestrates the DDX → DDS conversion: header parse, LZX decode, optional
//! untiling, DDS header synthesis (spec.md §4.5/C6).

use super::header::{self, gpu_format_to_fourcc, DdxHeader, DdxVariant, HEADER_LEN};
use super::swizzle;
use crate::error::{CarveError, Result};
use crate::formats::dds::block_bytes;

/// DDS header total size: 4-byte `DDS ` magic + 124-byte `DDS_HEADER`
/// structure (the universally loadable size for a FourCC pixel format with
/// no DX10 extension block).
pub const DDS_HEADER_LEN: usize = 128;

const DDSD_CAPS: u32 = 0x1;
const DDSD_HEIGHT: u32 = 0x2;
const DDSD_WIDTH: u32 = 0x4;
const DDSD_PIXELFORMAT: u32 = 0x1000;
const DDSD_MIPMAPCOUNT: u32 = 0x2_0000;
const DDSD_LINEARSIZE: u32 = 0x8_0000;
const DDSCAPS_COMPLEX: u32 = 0x8;
const DDSCAPS_TEXTURE: u32 = 0x1000;
const DDSCAPS_MIPMAP: u32 = 0x40_0000;
const DDPF_FOURCC: u32 = 0x4;

/// Converted output, or a partial result recorded per the spec's
/// partial-recovery contract (spec.md §4.5).
pub struct ConversionOutput {
    pub bytes: Vec<u8>,
    pub is_partial: bool,
    pub notes: Option<String>,
}

/// Converts the DDX texture at `offset` in `data` to DDS bytes. `data` must
/// contain at least the header and (heuristically bounded) compressed
/// payload; callers determine `compressed_len` via the format parser's size
/// estimate.
pub fn convert(
    data: &[u8],
    offset: usize,
    compressed_len: usize,
    untile: bool,
) -> Result<ConversionOutput> {
    let hdr = header::parse(data, offset)?;

    if hdr.variant == DdxVariant::Experimental {
        return Err(CarveError::ParserReject {
            offset: offset as u64,
            reason: "3XDR is experimental; pass through un-converted".to_string(),
        });
    }

    let four_cc = gpu_format_to_fourcc(hdr.gpu_format).ok_or_else(|| CarveError::ParserReject {
        offset: offset as u64,
        reason: format!("unrecognized Xbox GPU format code 0x{:02X}", hdr.gpu_format),
    })?;

    let block_size = block_bytes(four_cc);
    let mip_sizes = mip_byte_sizes(hdr.width, hdr.height, hdr.mip_count, block_size);
    let uncompressed_size: u64 = mip_sizes.iter().sum();

    let payload_start = offset + HEADER_LEN;
    let payload_end = (payload_start + compressed_len).min(data.len());
    let payload = &data[payload_start..payload_end];

    let mut decoded = Vec::with_capacity(uncompressed_size as usize);
    let decode_result = crate::lzx::decompress(payload, 17, uncompressed_size as usize, &mut decoded);

    let (mips_recovered, is_partial, notes) = match decode_result {
        Ok(()) => (mip_sizes.len(), false, None),
        Err(e) => {
            let mut consumed = 0u64;
            let mut mips_ok = 0usize;
            for &sz in &mip_sizes {
                if consumed + sz <= decoded.len() as u64 {
                    consumed += sz;
                    mips_ok += 1;
                } else {
                    break;
                }
            }
            decoded.truncate(consumed as usize);
            (
                mips_ok,
                true,
                Some(format!("LZX decode failed ({e}); recovered {mips_ok} of {} mips", mip_sizes.len())),
            )
        }
    };

    if mips_recovered == 0 {
        return Err(CarveError::DecompressionFailure {
            bytes_recovered: decoded.len(),
            reason: "no complete mip recovered".to_string(),
        });
    }

    apply_post_processing(&mut decoded, &mip_sizes[..mips_recovered], hdr.width, hdr.height, four_cc, untile, hdr.tiled);

    let header_bytes = synthesize_dds_header(hdr.width, hdr.height, mips_recovered as u32, four_cc);
    let mut out = header_bytes;
    out.extend_from_slice(&decoded);

    Ok(ConversionOutput {
        bytes: out,
        is_partial,
        notes,
    })
}

fn mip_byte_sizes(width: u32, height: u32, mip_count: u32, block_size: u64) -> Vec<u64> {
    let mut sizes = Vec::with_capacity(mip_count as usize);
    let mut w = width as u64;
    let mut h = height as u64;
    for _ in 0..mip_count {
        let blocks_w = w.div_ceil(4).max(1);
        let blocks_h = h.div_ceil(4).max(1);
        sizes.push(blocks_w * blocks_h * block_size);
        w = (w / 2).max(1);
        h = (h / 2).max(1);
    }
    sizes
}

fn apply_post_processing(
    decoded: &mut [u8],
    mip_sizes: &[u64],
    width: u32,
    height: u32,
    four_cc: &str,
    untile: bool,
    tiled: bool,
) {
    if mip_sizes.is_empty() {
        return;
    }

    let block_size = block_bytes(four_cc) as usize;

    // Untiling only ever applies to the top mip (spec.md §4.5 step 4).
    if untile && tiled {
        let top_len = mip_sizes[0] as usize;
        if top_len <= decoded.len() {
            let blocks_wide = (width as u32).div_ceil(4).max(1);
            let blocks_high = (height as u32).div_ceil(4).max(1);
            let linear = swizzle::untile_top_mip(&decoded[..top_len], blocks_wide, blocks_high, block_size);
            decoded[..top_len].copy_from_slice(&linear);
        }
    }

    // Xbox stores DXT/ATI block data as big-endian u16 pairs; byte-swap to
    // little-endian for the DDS output (spec.md §4.5 step 5).
    if matches!(four_cc, "DXT1" | "DXT3" | "DXT5" | "ATI1" | "ATI2") {
        swizzle::swap_block_words(decoded);
    }
}

fn synthesize_dds_header(width: u32, height: u32, mip_count: u32, four_cc: &str) -> Vec<u8> {
    let mut h = vec![0u8; DDS_HEADER_LEN];
    h[0..4].copy_from_slice(b"DDS ");
    h[4..8].copy_from_slice(&124u32.to_le_bytes());

    let mut flags = DDSD_CAPS | DDSD_HEIGHT | DDSD_WIDTH | DDSD_PIXELFORMAT | DDSD_LINEARSIZE;
    if mip_count > 1 {
        flags |= DDSD_MIPMAPCOUNT;
    }
    h[8..12].copy_from_slice(&flags.to_le_bytes());
    h[12..16].copy_from_slice(&height.to_le_bytes());
    h[16..20].copy_from_slice(&width.to_le_bytes());

    let linear_size = block_bytes(four_cc) * (width as u64).div_ceil(4) * (height as u64).div_ceil(4);
    h[20..24].copy_from_slice(&(linear_size as u32).to_le_bytes());
    h[28..32].copy_from_slice(&mip_count.to_le_bytes());

    // Pixel format block at offset 76 (dwSize=32, dwFlags, dwFourCC, ...).
    h[76..80].copy_from_slice(&32u32.to_le_bytes());
    h[80..84].copy_from_slice(&DDPF_FOURCC.to_le_bytes());
    h[84..88].copy_from_slice(four_cc.as_bytes());

    let mut caps = DDSCAPS_TEXTURE;
    if mip_count > 1 {
        caps |= DDSCAPS_MIPMAP | DDSCAPS_COMPLEX;
    }
    h[108..112].copy_from_slice(&caps.to_le_bytes());

    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesize_dds_header_size_and_magic() {
        let h = synthesize_dds_header(64, 64, 1, "DXT1");
        assert_eq!(h.len(), DDS_HEADER_LEN);
        assert_eq!(&h[0..4], b"DDS ");
        assert_eq!(u32::from_le_bytes(h[12..16].try_into().unwrap()), 64);
        assert_eq!(u32::from_le_bytes(h[16..20].try_into().unwrap()), 64);
    }

    #[test]
    fn test_mip_byte_sizes_halves_each_level() {
        let sizes = mip_byte_sizes(64, 64, 3, 8);
        assert_eq!(sizes.len(), 3);
        assert_eq!(sizes[0], 16 * 16 * 8);
        assert_eq!(sizes[1], 8 * 8 * 8);
        assert_eq!(sizes[2], 4 * 4 * 8);
    }

    #[test]
    fn test_mipmap_caps_flags_set_when_mipped() {
        let h = synthesize_dds_header(64, 64, 4, "DXT5");
        let caps = u32::from_le_bytes(h[108..112].try_into().unwrap());
        assert_ne!(caps & DDSCAPS_MIPMAP, 0);
    }
}
