//! Obsidian/Bethesda compiled-script carver: recognizes case-insensitive
//! `scn `/`scriptname ` openings (spec.md §4.3).

use crate::error::{CarveError, Result};
use crate::types::ParseResult;
use crate::util::{find_non_printable_run, find_from};

const OPENINGS: [&str; 2] = ["scn ", "scriptname "];
const NON_PRINTABLE_RUN_LIMIT: usize = 3;

pub fn parse(data: &[u8], offset: usize) -> Result<ParseResult> {
    let window_len = 64.min(data.len().saturating_sub(offset));
    let window = &data[offset..offset + window_len];
    let lower: Vec<u8> = window.iter().map(|b| b.to_ascii_lowercase()).collect();

    let opening = OPENINGS
        .iter()
        .find(|o| lower.starts_with(o.as_bytes()))
        .ok_or_else(|| CarveError::ParserReject {
            offset: offset as u64,
            reason: "no scn /scriptname  opening".to_string(),
        })?;

    let name_start = opening.len();
    let name_end = window[name_start..]
        .iter()
        .position(|&b| !(b.is_ascii_alphanumeric() || b == b'_'))
        .map(|p| name_start + p)
        .unwrap_or(window.len());

    if name_end == name_start {
        return Err(CarveError::ParserReject {
            offset: offset as u64,
            reason: "empty or invalid script name".to_string(),
        });
    }
    let script_name = String::from_utf8_lossy(&window[name_start..name_end]).to_string();

    // Bound the carve by whichever comes first: the next script-start
    // marker, or a run of > 3 consecutive non-printable bytes.
    let mut bound = data.len() - offset;

    for marker in OPENINGS {
        if let Some(next) = find_from(data, marker.as_bytes(), offset + 1) {
            bound = bound.min(next - offset);
        }
        if let Some(next) = find_from(data, marker.to_uppercase().as_bytes(), offset + 1) {
            bound = bound.min(next - offset);
        }
    }

    if let Some(run_start) = find_non_printable_run(data, offset, NON_PRINTABLE_RUN_LIMIT) {
        bound = bound.min(run_start - offset);
    }

    Ok(ParseResult::new("script", bound as u64).with_meta("scriptName", script_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scn_opening_recognized() {
        let data = b"scn MyScript\nbegin OnActivate\nend\n".to_vec();
        let result = parse(&data, 0).unwrap();
        assert_eq!(
            result.metadata.get("scriptName").map(|v| format!("{v:?}")),
            Some("Text(\"MyScript\")".to_string())
        );
    }

    #[test]
    fn test_bounded_by_non_printable_run() {
        let mut data = b"scriptname Foo\n".to_vec();
        data.extend_from_slice(b"bar");
        data.extend_from_slice(&[0u8, 1, 2, 3, 4]);
        data.extend_from_slice(b"junk");
        let result = parse(&data, 0).unwrap();
        assert!(result.estimated_size < data.len() as u64);
    }

    #[test]
    fn test_rejects_invalid_name_char() {
        let data = b"scn !bad\n".to_vec();
        assert!(parse(&data, 0).is_err());
    }
}
