//! Xbox 360 GPU Morton/Z-order texture block deswizzle (spec.md §4.5 step 4).
//!
//! Untiling only ever applies to the top mip; lower mips are already linear
//! as decoded.

/// Interleaves the bits of `x` and `y` into a single Morton (Z-order) code:
/// bit `i` of `x` becomes bit `2i`, bit `i` of `y` becomes bit `2i+1`.
fn morton_interleave(x: u32, y: u32) -> u32 {
    fn spread(v: u32) -> u64 {
        let mut v = v as u64;
        v = (v | (v << 16)) & 0x0000_FFFF_0000_FFFF;
        v = (v | (v << 8)) & 0x00FF_00FF_00FF_00FF;
        v = (v | (v << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
        v = (v | (v << 2)) & 0x3333_3333_3333_3333;
        v = (v | (v << 1)) & 0x5555_5555_5555_5555;
        v
    }
    (spread(x) | (spread(y) << 1)) as u32
}

fn next_power_of_two(n: u32) -> u32 {
    n.max(1).next_power_of_two()
}

/// Untiles the top mip of block-compressed texture data from Xbox GPU
/// tiling order into linear row-major block order.
///
/// `blocks_wide`/`blocks_high` describe the `⌈W/4⌉ × ⌈H/4⌉` block grid;
/// `block_bytes` is the per-block payload size for the texture's format.
/// Blocks outside the tiled source's padded (power-of-two) extent are left
/// zeroed, matching the behavior of a partially captured mip.
pub fn untile_top_mip(
    tiled: &[u8],
    blocks_wide: u32,
    blocks_high: u32,
    block_bytes: usize,
) -> Vec<u8> {
    let padded = next_power_of_two(blocks_wide.max(blocks_high));
    let mut linear = vec![0u8; blocks_wide as usize * blocks_high as usize * block_bytes];

    for by in 0..blocks_high {
        for bx in 0..blocks_wide {
            let tiled_index = morton_interleave(bx, by);
            let tiled_offset = tiled_index as usize * block_bytes;
            if tiled_offset + block_bytes > tiled.len() {
                continue;
            }
            let dest_index = (by * blocks_wide + bx) as usize;
            let dest_offset = dest_index * block_bytes;
            linear[dest_offset..dest_offset + block_bytes]
                .copy_from_slice(&tiled[tiled_offset..tiled_offset + block_bytes]);
        }
    }

    let _ = padded;
    linear
}

/// Byte-swaps every 16-bit word within block payload data, undoing Xbox's
/// big-endian-u16-pair block storage (spec.md §4.5 step 5).
pub fn swap_block_words(data: &mut [u8]) {
    for pair in data.chunks_exact_mut(2) {
        pair.swap(0, 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_morton_interleave_known_values() {
        assert_eq!(morton_interleave(0, 0), 0);
        assert_eq!(morton_interleave(1, 0), 1);
        assert_eq!(morton_interleave(0, 1), 2);
        assert_eq!(morton_interleave(1, 1), 3);
        assert_eq!(morton_interleave(2, 0), 4);
    }

    #[test]
    fn test_untile_preserves_block_count_and_size() {
        let block_bytes = 8;
        let blocks_wide = 4;
        let blocks_high = 4;
        let tiled = vec![0xAAu8; blocks_wide as usize * blocks_high as usize * block_bytes];
        let linear = untile_top_mip(&tiled, blocks_wide, blocks_high, block_bytes);
        assert_eq!(linear.len(), tiled.len());
    }

    #[test]
    fn test_swap_block_words() {
        let mut data = vec![0x01, 0x02, 0x03, 0x04];
        swap_block_words(&mut data);
        assert_eq!(data, vec![0x02, 0x01, 0x04, 0x03]);
    }
}
