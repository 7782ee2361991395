//! Format registry: dispatches a signature id and a byte window to the
//! matching per-format parser (spec.md §4.3/C4).
//!
//! Parsers are modeled as a closed, tagged set — one function per format —
//! looked up by signature id in [`parse`]. No runtime plugin loading.

pub mod bik;
pub mod boundary;
pub mod dds;
pub mod ddx;
pub mod misc;
pub mod nif;
pub mod png;
pub mod script;
pub mod xma;

use crate::error::{CarveError, Result};
use crate::types::ParseResult;

/// Parses the candidate at `offset` in `data` whose signature id is
/// `sig_id`. `data` is the full mapped file (or a large enough window);
/// `offset` points at the signature's magic bytes.
///
/// Returns [`CarveError::ParserReject`] for a false signature match —
/// the normal, expected outcome for most candidates.
pub fn parse(sig_id: &str, data: &[u8], offset: usize) -> Result<ParseResult> {
    match sig_id {
        "dds" => dds::parse(data, offset),
        "ddx_3xdo" | "ddx_3xdr" => ddx::parse(data, offset),
        "xma" => xma::parse(data, offset),
        "nif" => nif::parse(data, offset),
        "script_scn" | "script_scriptname" => script::parse(data, offset),
        "bik" => bik::parse(data, offset),
        "png" => png::parse(data, offset),
        "xex" => misc::parse_capped(data, offset, "xex", crate::signatures::XEX.max_size),
        "xdbf" => misc::parse_capped(data, offset, "xdbf", crate::signatures::XDBF.max_size),
        "xuis" => misc::parse_capped(data, offset, "xuis", crate::signatures::XUIS.max_size),
        "xuib" => misc::parse_capped(data, offset, "xuib", crate::signatures::XUIB.max_size),
        "lip" => misc::parse_capped(data, offset, "lip", crate::signatures::LIP.max_size),
        "tes4" => misc::parse_capped(data, offset, "tes4", crate::signatures::TES4.max_size),
        other => Err(CarveError::UnknownFormat {
            label: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_signature_id_rejected() {
        let data = [0u8; 16];
        assert!(parse("not_a_signature", &data, 0).is_err());
    }
}
