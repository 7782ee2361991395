//! NIF (Gamebryo/NetImmerse model) parser (spec.md §4.3).

use crate::error::{CarveError, Result};
use crate::types::ParseResult;
use crate::util::{read_bytes, read_u32};

const MAGIC: &[u8] = b"Gamebryo File Format";
const DEFAULT_SIZE: u64 = 50 * 1024;
const MAX_NIF20_SIZE: u64 = 20 * 1024 * 1024;

pub fn parse(data: &[u8], offset: usize) -> Result<ParseResult> {
    let probe_len = MAGIC.len() + 64;
    let window = read_bytes(data, offset, probe_len.min(data.len().saturating_sub(offset)))?;

    if !window.starts_with(MAGIC) {
        return Err(CarveError::ParserReject {
            offset: offset as u64,
            reason: "missing Gamebryo File Format magic".to_string(),
        });
    }

    let version_start = MAGIC.len();
    let term = window[version_start..]
        .iter()
        .position(|&b| b == 0x0A)
        .ok_or_else(|| CarveError::ParserReject {
            offset: offset as u64,
            reason: "version string not null/newline-terminated".to_string(),
        })?;
    let version_string =
        String::from_utf8_lossy(&window[version_start..version_start + term]).to_string();

    let mut estimated_size = DEFAULT_SIZE;

    if version_string.starts_with("20.") {
        let probe_start = offset + version_start + term + 1;
        let mut found = None;
        for step in 0..15 {
            let candidate_offset = probe_start + step * 4;
            if candidate_offset + 4 > probe_start + 60 {
                break;
            }
            if let Ok(count) = read_u32(data, candidate_offset, true) {
                if count >= 1 && count <= 10_000 {
                    found = Some(count as u64);
                    break;
                }
            }
        }
        if let Some(block_count) = found {
            estimated_size = (block_count * 500 + 1000).min(MAX_NIF20_SIZE);
        }
    }

    Ok(ParseResult::new("nif", estimated_size).with_meta("version", version_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nif20_block_count_probe() {
        let mut data = Vec::new();
        data.extend_from_slice(MAGIC);
        data.extend_from_slice(b"20.2.0.7\n");
        data.extend_from_slice(&[0u8; 8]); // padding before a plausible u32
        data.extend_from_slice(&42u32.to_le_bytes());
        let result = parse(&data, 0).unwrap();
        assert_eq!(result.estimated_size, 42 * 500 + 1000);
    }

    #[test]
    fn test_non_nif20_uses_default_size() {
        let mut data = Vec::new();
        data.extend_from_slice(MAGIC);
        data.extend_from_slice(b"4.0.0.2\n");
        let result = parse(&data, 0).unwrap();
        assert_eq!(result.estimated_size, DEFAULT_SIZE);
    }

    #[test]
    fn test_missing_magic_rejected() {
        let data = vec![0u8; 32];
        assert!(parse(&data, 0).is_err());
    }
}
