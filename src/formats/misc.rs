//! Generic magic-only carvers for formats this tool recognizes but does not
//! deeply parse: XEX, XDBF, XUIS, XUIB, LIP, TES4 (spec.md §4.3).
//!
//! Each of these has a fixed 4-byte magic and no reliable in-band length
//! field cheap enough to decode here, so the carve is capped at the
//! signature's `max_size` and tightened to the first large run of
//! non-printable-adjacent zero padding, mirroring the boundary heuristic
//! used by [`super::script`].

use crate::error::{CarveError, Result};
use crate::signatures;
use crate::types::ParseResult;
use crate::util::read_bytes;

/// Long runs of zero bytes are a reasonable proxy for "ran off the end of
/// this resource into unrelated capture data" for the formats routed here.
const ZERO_RUN_LIMIT: usize = 4096;

pub fn parse_capped(data: &[u8], offset: usize, label: &str, max_size: u64) -> Result<ParseResult> {
    let sig = signatures::by_id(label).ok_or_else(|| CarveError::UnknownFormat {
        label: label.to_string(),
    })?;

    let magic_len = sig.magic_bytes.len();
    let header = read_bytes(data, offset, magic_len).map_err(|_| CarveError::ParserReject {
        offset: offset as u64,
        reason: format!("truncated {label} magic"),
    })?;
    if header != sig.magic_bytes {
        return Err(CarveError::ParserReject {
            offset: offset as u64,
            reason: format!("missing {label} magic"),
        });
    }

    let available = (data.len() - offset) as u64;
    let cap = available.min(max_size);

    let zero_run_end = find_zero_run_end(data, offset, cap as usize);
    let estimated_size = zero_run_end.unwrap_or(cap);

    Ok(ParseResult::new(label, estimated_size.max(sig.min_size)))
}

/// Scans forward from `offset` for the end of a run of `ZERO_RUN_LIMIT` or
/// more consecutive zero bytes; returns the offset (relative to `offset`)
/// where the run begins, or `None` if no such run exists within `limit`.
fn find_zero_run_end(data: &[u8], offset: usize, limit: usize) -> Option<u64> {
    let window = &data[offset..offset + limit.min(data.len() - offset)];
    let mut run_start = None;
    let mut count = 0usize;
    for (i, &b) in window.iter().enumerate() {
        if b == 0 {
            if count == 0 {
                run_start = Some(i);
            }
            count += 1;
            if count >= ZERO_RUN_LIMIT {
                return run_start.map(|s| s as u64);
            }
        } else {
            count = 0;
            run_start = None;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xex_capped_by_max_size() {
        let mut data = b"XEX2".to_vec();
        data.extend(vec![0xAAu8; 1000]);
        let result = parse_capped(&data, 0, "xex", signatures::XEX.max_size).unwrap();
        assert_eq!(result.estimated_size, data.len() as u64);
    }

    #[test]
    fn test_tes4_bounded_by_zero_run() {
        let mut data = b"TES4".to_vec();
        data.extend(vec![0x11u8; 200]);
        data.extend(vec![0u8; ZERO_RUN_LIMIT + 10]);
        data.extend(b"more unrelated bytes");
        let result = parse_capped(&data, 0, "tes4", signatures::TES4.max_size).unwrap();
        assert_eq!(result.estimated_size, 4 + 200);
    }

    #[test]
    fn test_missing_magic_rejected() {
        let data = vec![0u8; 32];
        assert!(parse_capped(&data, 0, "tes4", signatures::TES4.max_size).is_err());
    }
}
