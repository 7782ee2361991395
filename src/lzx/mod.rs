//! Pure bit-accurate LZX decompressor: Xbox window sizes, big-endian
//! 16-bit-word bitstream (spec.md §4.4/C5).

mod bitstream;
mod decoder;
mod tree;
mod window;

use thiserror::Error;

/// LZX-stream-level failures: invalid block type, a Huffman code that never
/// resolves within the maximum code length, or malformed pretree
/// run-length data.
#[derive(Debug, Error)]
pub enum LzxError {
    #[error("invalid LZX block type {0}")]
    InvalidBlockType(u8),
    #[error("invalid Huffman code while decoding {0} tree")]
    InvalidHuffmanCode(&'static str),
    #[error("invalid pretree run-length code")]
    InvalidPretreeRle,
}

/// Offset-extra-bits per position slot (`FOOTER_BITS` per spec.md §4.4),
/// grounded on the reference `lzxd` crate's table of the same name.
const FOOTER_BITS: [u8; 290] = {
    let mut table = [17u8; 290];
    let mut i = 0;
    while i < 4 {
        table[i] = 0;
        i += 1;
    }
    let mut slot = 4;
    let mut bits = 1u8;
    while slot < 36 {
        table[slot] = bits;
        table[slot + 1] = bits;
        slot += 2;
        bits += 1;
    }
    table
};

/// Base position per slot (`BASE_POSITION` per spec.md §4.4), grounded on
/// the reference `lzxd` crate's table of the same name: `BASE_POSITION[0] =
/// 0`, each subsequent entry is `BASE_POSITION[n-1] + (1 << FOOTER_BITS[n-1])`.
const BASE_POSITION: [u32; 291] = {
    let mut table = [0u32; 291];
    let mut i = 1;
    while i < 291 {
        table[i] = table[i - 1] + (1u32 << FOOTER_BITS[i - 1]);
        i += 1;
    }
    table
};

/// Number of main-tree position slots for a given LZX window size
/// (`window_bits` in `[15, 21]`, property P3), matching the standard LZX
/// slot-count table.
pub fn position_slots(window_bits: u32) -> u32 {
    match window_bits {
        15 => 30,
        16 => 32,
        17 => 34,
        18 => 36,
        19 => 38,
        20 => 42,
        21 => 50,
        _ => 50,
    }
}

/// Decodes an LZX stream from `data` into `output`, producing up to
/// `output_len` bytes. `output` is left containing whatever was
/// successfully decoded even on error, satisfying DDX's partial-recovery
/// contract (spec.md §4.5): callers read `output.len()` as
/// `bytes_recovered`.
pub fn decompress(
    data: &[u8],
    window_bits: u32,
    output_len: usize,
    output: &mut Vec<u8>,
) -> Result<(), LzxError> {
    decoder::decompress(data, window_bits, output_len, output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footer_bits_matches_reference_prefix() {
        assert_eq!(&FOOTER_BITS[0..18], &[0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7]);
    }

    #[test]
    fn test_base_position_matches_reference_prefix() {
        assert_eq!(
            &BASE_POSITION[0..10],
            &[0, 1, 2, 3, 4, 6, 8, 12, 16, 24]
        );
    }

    #[test]
    fn test_position_slots_known_window_sizes() {
        assert_eq!(position_slots(15), 30);
        assert_eq!(position_slots(17), 34);
        assert_eq!(position_slots(21), 50);
    }

    /// Decodes a minimal single uncompressed block and checks the literal
    /// bytes come through unchanged — the simplest possible LZX stream.
    #[test]
    fn test_decode_uncompressed_block_roundtrip() {
        let payload = b"abcdefghijklmnopqrstuvwxyzabcdefghijklmnopqrstuv";
        let mut bits: Vec<u8> = Vec::new();
        let mut bitbuf: u64 = 0;
        let mut nbits: u32 = 0;
        let mut push_bits = |val: u32, n: u32, out: &mut Vec<u8>| {
            let mask: u64 = if n == 32 { u32::MAX as u64 } else { (1u64 << n) - 1 };
            bitbuf = (bitbuf << n) | (val as u64 & mask);
            nbits += n;
            while nbits >= 16 {
                let word = (bitbuf >> (nbits - 16)) as u16;
                out.push((word >> 8) as u8);
                out.push((word & 0xFF) as u8);
                nbits -= 16;
            }
        };

        // No E8 flag.
        push_bits(0, 1, &mut bits);
        // Block type = Uncompressed (3), 3 bits.
        push_bits(3, 3, &mut bits);
        // Block length = payload.len(), 24 bits.
        push_bits(payload.len() as u32, 24, &mut bits);
        // Align to 16-bit boundary before the byte-level recent-offset
        // triple and raw payload, matching `Bitstream::align_word`.
        if nbits > 0 {
            push_bits(0, 16 - nbits, &mut bits);
        }
        // r0, r1, r2 recent offsets (little-endian u32 each); values are
        // irrelevant since this block has no matches.
        for _ in 0..3 {
            bits.extend_from_slice(&1u32.to_le_bytes());
        }
        bits.extend_from_slice(payload);
        // Pad so the bitstream reader's word-at-a-time refill never reads
        // past a short final word awkwardly.
        if bits.len() % 2 != 0 {
            bits.push(0);
        }

        let mut output = Vec::new();
        decompress(&bits, 17, payload.len(), &mut output).unwrap();
        assert_eq!(output, payload);
    }
}
