//! XMA (Xbox Media Audio) parser: a RIFF/WAVE container whose `fmt ` chunk
//! carries an XMA format tag (spec.md §4.3).

use crate::error::{CarveError, Result};
use crate::types::ParseResult;
use crate::util::{find_from, read_bytes, read_u16, read_u32};

const XMA_FORMAT_TAGS: [u16; 2] = [0x0165, 0x0166];

pub fn parse(data: &[u8], offset: usize) -> Result<ParseResult> {
    let header = read_bytes(data, offset, 12).map_err(|_| CarveError::ParserReject {
        offset: offset as u64,
        reason: "truncated RIFF header".to_string(),
    })?;

    if &header[8..12] != b"WAVE" {
        return Err(CarveError::ParserReject {
            offset: offset as u64,
            reason: "not a WAVE RIFF container".to_string(),
        });
    }

    let riff_size = read_u32(header, 4, true)?;
    let estimated_size = riff_size as u64 + 8;

    let probe_len = 200.min(data.len().saturating_sub(offset));
    let probe = read_bytes(data, offset, probe_len)?;

    let is_xma = find_chunk_fmt(probe)
        .map(|fmt_tag| XMA_FORMAT_TAGS.contains(&fmt_tag))
        .unwrap_or(false)
        || find_from(probe, b"XMA2", 0).is_some();

    if !is_xma {
        return Err(CarveError::ParserReject {
            offset: offset as u64,
            reason: "no XMA fmt tag or XMA2 chunk within first 200 bytes".to_string(),
        });
    }

    Ok(ParseResult::new("xma", estimated_size))
}

fn find_chunk_fmt(probe: &[u8]) -> Option<u16> {
    let pos = find_from(probe, b"fmt ", 0)?;
    read_u16(probe, pos + 8, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_riff(body: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"RIFF");
        data.extend_from_slice(&((body.len() + 4) as u32).to_le_bytes());
        data.extend_from_slice(b"WAVE");
        data.extend_from_slice(body);
        data
    }

    #[test]
    fn test_xma_format_tag_recognized() {
        let mut fmt_chunk = Vec::new();
        fmt_chunk.extend_from_slice(b"fmt ");
        fmt_chunk.extend_from_slice(&16u32.to_le_bytes());
        fmt_chunk.extend_from_slice(&0x0165u16.to_le_bytes());
        fmt_chunk.extend_from_slice(&[0u8; 14]);
        let data = build_riff(&fmt_chunk);
        let result = parse(&data, 0).unwrap();
        assert_eq!(result.format_label, "xma");
    }

    #[test]
    fn test_non_xma_wave_rejected() {
        let mut fmt_chunk = Vec::new();
        fmt_chunk.extend_from_slice(b"fmt ");
        fmt_chunk.extend_from_slice(&16u32.to_le_bytes());
        fmt_chunk.extend_from_slice(&0x0001u16.to_le_bytes()); // PCM
        fmt_chunk.extend_from_slice(&[0u8; 14]);
        let data = build_riff(&fmt_chunk);
        assert!(parse(&data, 0).is_err());
    }
}
