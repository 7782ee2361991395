//! Record-tree walk and hybrid-endian conversion (spec.md §4.6).
//!
//! Parses a full element tree (records and nested GRUPs) out of a source
//! ESM/ESP byte stream, merges split INFO fragments, and re-serializes the
//! tree in the target endianness with per-subrecord swap rules applied.

use super::header::{
    read_group_header, read_record_header, write_record_header, GroupHeader, RecordHeader,
    HEADER_LEN,
};
use super::merge::merge_info_siblings;
use super::schema::{is_valid_signature, swap_rule, SwapRule};
use crate::error::{CarveError, Result};
use crate::util::{read_bytes, read_u16};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Subrecord {
    pub signature: [u8; 4],
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct RawRecord {
    pub header: RecordHeader,
    pub subrecords: Vec<Subrecord>,
}

#[derive(Debug, Clone)]
pub struct RawGroup {
    pub header: GroupHeader,
    pub children: Vec<Element>,
}

#[derive(Debug, Clone)]
pub enum Element {
    Record(RawRecord),
    Group(RawGroup),
}

const TOP_LEVEL_ONLY_GROUP_TYPE: i32 = 0;

/// Distinguishes a record-type signature (`TES4`, `INFO`, ...) from a GRUP
/// at the top of the tree walk. This is deliberately not
/// [`is_valid_signature`]: that predicate is spec'd for *subrecord*
/// signatures and special-cases IMAD's `*IAD`-keyed forms, which never
/// appear as a record type.
fn is_plausible_record_signature(sig: &[u8; 4]) -> bool {
    sig.iter().all(|&b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// Converts a complete Xbox (big-endian, with schema-flagged exceptions)
/// ESM/ESP byte stream into its PC (little-endian) equivalent.
pub fn convert_xbox_to_pc(data: &[u8]) -> Result<Vec<u8>> {
    let mut elements = parse_elements(data, 0, data.len(), 0, false)?;
    merge_info_siblings(&mut elements);
    let mut out = Vec::with_capacity(data.len());
    for element in &elements {
        serialize_element(element, true, &mut out)?;
    }
    Ok(out)
}

fn parse_elements(
    data: &[u8],
    start: usize,
    end: usize,
    depth: u32,
    little_endian: bool,
) -> Result<Vec<Element>> {
    let mut elements = Vec::new();
    let mut offset = start;
    while offset < end {
        let sig = read_bytes(data, offset, 4)?;
        if sig == super::header::GRUP_SIGNATURE {
            let group = read_group_header(data, offset, little_endian)?;
            if depth == 0 && group.group_type != TOP_LEVEL_ONLY_GROUP_TYPE {
                return Err(CarveError::Esm(format!(
                    "top-level GRUP at offset {offset} has nested-only group_type {}",
                    group.group_type
                )));
            }
            let group_end = offset + group.group_size as usize;
            let children = parse_elements(data, offset + HEADER_LEN, group_end, depth + 1, little_endian)?;
            elements.push(Element::Group(RawGroup {
                header: group,
                children,
            }));
            offset = group_end;
        } else {
            let mut signature = [0u8; 4];
            signature.copy_from_slice(sig);
            if !is_plausible_record_signature(&signature) {
                return Err(CarveError::Esm(format!(
                    "invalid record signature at offset {offset}: {signature:?}"
                )));
            }
            let header = read_record_header(data, offset, little_endian)?;
            let data_start = offset + HEADER_LEN;
            let data_end = data_start + header.data_size as usize;
            let subrecords = read_subrecords(data, data_start, data_end, little_endian)?;
            elements.push(Element::Record(RawRecord { header, subrecords }));
            offset = data_end;
        }
    }
    Ok(elements)
}

fn read_subrecords(
    data: &[u8],
    start: usize,
    end: usize,
    little_endian: bool,
) -> Result<Vec<Subrecord>> {
    let mut subrecords = Vec::new();
    let mut offset = start;
    while offset < end {
        let sig = read_bytes(data, offset, 4)?;
        let mut signature = [0u8; 4];
        signature.copy_from_slice(sig);
        if !is_valid_signature(&signature) {
            return Err(CarveError::Esm(format!(
                "invalid subrecord signature at offset {offset}: {signature:?}"
            )));
        }
        let data_size = read_u16(data, offset + 4, little_endian)? as usize;
        let payload = read_bytes(data, offset + 6, data_size)?.to_vec();
        subrecords.push(Subrecord {
            signature,
            data: payload,
        });
        offset += 6 + data_size;
    }
    Ok(subrecords)
}

fn serialize_element(element: &Element, target_little_endian: bool, out: &mut Vec<u8>) -> Result<()> {
    match element {
        Element::Record(record) => serialize_record(record, target_little_endian, out),
        Element::Group(group) => serialize_group(group, target_little_endian, out),
    }
}

fn serialize_record(record: &RawRecord, target_little_endian: bool, out: &mut Vec<u8>) -> Result<()> {
    let record_type = String::from_utf8_lossy(&record.header.signature).to_string();
    let mut body = Vec::new();
    for sub in &record.subrecords {
        serialize_subrecord(&record_type, sub, target_little_endian, &mut body)?;
    }

    let mut header = record.header;
    header.data_size = body.len() as u32;
    out.extend_from_slice(&write_record_header(&header, target_little_endian));
    out.extend_from_slice(&body);
    Ok(())
}

fn serialize_subrecord(
    record_type: &str,
    sub: &Subrecord,
    target_little_endian: bool,
    out: &mut Vec<u8>,
) -> Result<()> {
    let sig_str = String::from_utf8_lossy(&sub.signature).to_string();
    let rule = swap_rule(record_type, &sig_str);
    let mut data = sub.data.clone();
    match rule {
        SwapRule::Raw | SwapRule::LittleEndianException => {}
        SwapRule::Words => swap_chunks(&mut data, 2),
        SwapRule::Dwords => swap_chunks(&mut data, 4),
    }
    if matches!(rule, SwapRule::Raw) && !crate::esm::schema::is_string_subrecord(record_type, &sig_str) {
        debug!(
            record_type,
            subrecord = %sig_str,
            "unrecognized subrecord signature, passing through unswapped"
        );
    }

    out.extend_from_slice(&sub.signature);
    let size_bytes = if target_little_endian {
        (data.len() as u16).to_le_bytes()
    } else {
        (data.len() as u16).to_be_bytes()
    };
    out.extend_from_slice(&size_bytes);
    out.extend_from_slice(&data);
    Ok(())
}

fn serialize_group(group: &RawGroup, target_little_endian: bool, out: &mut Vec<u8>) -> Result<()> {
    let mut body = Vec::new();
    for child in &group.children {
        serialize_element(child, target_little_endian, &mut body)?;
    }

    let mut header = group.header;
    header.group_size = (HEADER_LEN + body.len()) as u32;

    out.extend_from_slice(&super::header::GRUP_SIGNATURE);
    let group_size_bytes = if target_little_endian {
        header.group_size.to_le_bytes()
    } else {
        header.group_size.to_be_bytes()
    };
    out.extend_from_slice(&group_size_bytes);
    out.extend_from_slice(&header.label);
    let write_i32 = |v: i32| -> [u8; 4] {
        if target_little_endian {
            v.to_le_bytes()
        } else {
            v.to_be_bytes()
        }
    };
    out.extend_from_slice(&write_i32(header.group_type));
    let write_u32 = |v: u32| -> [u8; 4] {
        if target_little_endian {
            v.to_le_bytes()
        } else {
            v.to_be_bytes()
        }
    };
    out.extend_from_slice(&write_u32(header.stamp));
    out.extend_from_slice(&write_u32(header.unknown));
    out.extend_from_slice(&body);
    Ok(())
}

/// Swaps `data` in place in chunks of `unit` bytes (2 or 4); a trailing
/// partial chunk, if any, is left unchanged.
fn swap_chunks(data: &mut [u8], unit: usize) {
    let full_chunks = data.len() / unit;
    for i in 0..full_chunks {
        data[i * unit..i * unit + unit].reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_subrecord(sig: &[u8; 4], data: &[u8], little_endian: bool) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(sig);
        let size_bytes = if little_endian {
            (data.len() as u16).to_le_bytes()
        } else {
            (data.len() as u16).to_be_bytes()
        };
        out.extend_from_slice(&size_bytes);
        out.extend_from_slice(data);
        out
    }

    fn build_record(sig: &[u8; 4], form_id: u32, subrecords: &[u8], little_endian: bool) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(sig);
        let w32 = |v: u32| -> [u8; 4] {
            if little_endian {
                v.to_le_bytes()
            } else {
                v.to_be_bytes()
            }
        };
        out.extend_from_slice(&w32(subrecords.len() as u32)); // data_size
        out.extend_from_slice(&w32(0)); // flags
        out.extend_from_slice(&w32(form_id)); // form_id
        out.extend_from_slice(&w32(0)); // revision
        out.extend_from_slice(&[0u8; 4]); // version + unknown
        out.extend_from_slice(subrecords);
        out
    }

    #[test]
    fn test_convert_single_record_swaps_numeric_subrecord() {
        let data_sub = build_subrecord(b"HEDR", &0x12345678u32.to_be_bytes(), false);
        let record = build_record(b"TES4", 0, &data_sub, false);
        let converted = convert_xbox_to_pc(&record).unwrap();

        // HEDR's dword should now read as 0x12345678 in little-endian.
        let hedr_pos = converted.windows(4).position(|w| w == b"HEDR").unwrap();
        let value_start = hedr_pos + 4 + 2;
        let value = u32::from_le_bytes(converted[value_start..value_start + 4].try_into().unwrap());
        assert_eq!(value, 0x1234_5678);
    }

    #[test]
    fn test_string_subrecord_passes_through_unswapped() {
        let data_sub = build_subrecord(b"EDID", b"MyQuest\0", false);
        let record = build_record(b"QUST", 0, &data_sub, false);
        let converted = convert_xbox_to_pc(&record).unwrap();
        assert!(converted.windows(7).any(|w| w == b"MyQuest"));
    }

    #[test]
    fn test_invalid_subrecord_signature_rejected() {
        let data_sub = build_subrecord(b"ed..", b"\0\0\0\0", false);
        let record = build_record(b"TES4", 0, &data_sub, false);
        assert!(convert_xbox_to_pc(&record).is_err());
    }

    #[test]
    fn test_top_level_group_type_nonzero_rejected() {
        let mut group = Vec::new();
        group.extend_from_slice(b"GRUP");
        group.extend_from_slice(&(HEADER_LEN as u32).to_be_bytes());
        group.extend_from_slice(b"INFO");
        group.extend_from_slice(&7u32.to_be_bytes()); // group_type=7, nested-only
        group.extend_from_slice(&[0u8; 8]);
        assert!(convert_xbox_to_pc(&group).is_err());
    }
}
