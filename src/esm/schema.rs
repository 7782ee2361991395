//! Subrecord conversion schema: string whitelist, per-`(record_type,
//! subrecord_signature)` swap rules, and the subrecord-signature validity
//! predicate (spec.md §4.6).

/// How a subrecord's data bytes are treated when re-emitting in the target
/// endianness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapRule {
    /// Passed through unchanged: strings, and any subrecord signature this
    /// schema has no entry for (logged as a diagnostic by the caller).
    Raw,
    /// Already in the target endianness on Xbox; no swap applied.
    LittleEndianException,
    /// Byte-swap every 2-byte unit.
    Words,
    /// Byte-swap every 4-byte unit.
    Dwords,
}

/// Subrecord signatures whose data is always a string, regardless of record
/// type, and so is never byte-swapped.
const GENERIC_STRING_SIGS: &[&str] = &[
    "EDID", "FULL", "MODL", "DESC", "TX00", "TX01", "TX02", "TX03", "TX04", "TX05", "TX06", "TX07",
];

/// Record-specific string exceptions: a signature that is a string only
/// under a particular record type (e.g. `RNAM` under `INFO` is a response
/// text string, but under other records is something else).
const RECORD_SPECIFIC_STRING_SIGS: &[(&str, &str)] = &[("INFO", "RNAM")];

pub fn is_string_subrecord(record_type: &str, sig: &str) -> bool {
    GENERIC_STRING_SIGS.contains(&sig)
        || RECORD_SPECIFIC_STRING_SIGS.contains(&(record_type, sig))
}

/// Known numeric-field swap rules. Anything not listed here and not a
/// string subrecord falls back to [`SwapRule::Raw`] with a logged
/// diagnostic, per spec.md §4.6's "unknown subrecord signatures default to
/// raw bytes, no swap" rule.
const KNOWN_SWAP_RULES: &[(&str, &str, SwapRule)] = &[
    ("TES4", "HEDR", SwapRule::Dwords),
    ("INFO", "DATA", SwapRule::Words),
    ("INFO", "ANAM", SwapRule::Dwords),
    ("INFO", "PNAM", SwapRule::Dwords),
    ("DIAL", "QSTI", SwapRule::Dwords),
    ("QUST", "DATA", SwapRule::Words),
    // Xbox captures are observed to keep IMAD's keyed subrecords in the
    // same byte order as PC; treat them as a little-endian exception
    // rather than swapping.
    ("IMAD", "*IAD", SwapRule::LittleEndianException),
];

pub fn swap_rule(record_type: &str, sig: &str) -> SwapRule {
    if is_string_subrecord(record_type, sig) {
        return SwapRule::Raw;
    }
    let lookup_sig = if is_imad_keyed_signature(sig.as_bytes()) {
        "*IAD"
    } else {
        sig
    };
    KNOWN_SWAP_RULES
        .iter()
        .find(|(rt, s, _)| *rt == record_type && *s == lookup_sig)
        .map(|(_, _, rule)| *rule)
        .unwrap_or(SwapRule::Raw)
}

/// Validity predicate for a subrecord signature: four characters in
/// `[A-Z0-9_]`, with a special case for IMAD's keyed `*IAD` signatures
/// where the first byte may be any value `<= 0x7F`.
pub fn is_valid_signature(sig: &[u8; 4]) -> bool {
    if is_imad_keyed_signature(sig) {
        return true;
    }
    sig.iter()
        .all(|&b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
}

fn is_imad_keyed_signature(sig: &[u8]) -> bool {
    sig.len() == 4 && &sig[1..4] == b"IAD" && sig[0] <= 0x7F
}
