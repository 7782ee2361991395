//! Split-INFO merger (spec.md §4.6): Xbox captures split each INFO record
//! into consecutive fragments sharing a FormID; this recombines them into a
//! single PC-shape INFO record and drops the Xbox-only `PNAM` subrecord.

use super::convert::{Element, RawRecord};

const PNAM: [u8; 4] = *b"PNAM";
const INFO: [u8; 4] = *b"INFO";

/// Recursively merges consecutive sibling INFO fragments throughout the
/// element tree, in place.
pub fn merge_info_siblings(elements: &mut Vec<Element>) {
    for element in elements.iter_mut() {
        if let Element::Group(group) = element {
            merge_info_siblings(&mut group.children);
        }
    }
    *elements = merge_level(std::mem::take(elements));
}

fn merge_level(elements: Vec<Element>) -> Vec<Element> {
    let mut out: Vec<Element> = Vec::with_capacity(elements.len());
    for element in elements {
        match (&element, out.last_mut()) {
            (Element::Record(next), Some(Element::Record(prev)))
                if next.header.signature == INFO
                    && prev.header.signature == INFO
                    && prev.header.form_id == next.header.form_id =>
            {
                merge_into(prev, next);
            }
            _ => out.push(element),
        }
    }
    out
}

fn merge_into(prev: &mut RawRecord, next: &RawRecord) {
    for sub in &next.subrecords {
        if sub.signature == PNAM {
            continue;
        }
        prev.subrecords.push(sub.clone());
    }
    prev.subrecords.retain(|s| s.signature != PNAM);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::esm::header::RecordHeader;

    fn info_record(form_id: u32, subs: Vec<(&[u8; 4], &[u8])>) -> Element {
        Element::Record(RawRecord {
            header: RecordHeader {
                signature: INFO,
                data_size: 0,
                flags: 0,
                form_id,
                revision: 0,
                version: 0,
                unknown: 0,
            },
            subrecords: subs
                .into_iter()
                .map(|(sig, data)| crate::esm::convert::Subrecord {
                    signature: *sig,
                    data: data.to_vec(),
                })
                .collect(),
        })
    }

    #[test]
    fn test_merges_consecutive_info_fragments_and_drops_pnam() {
        let first = info_record(0x0012_3456, vec![(b"ANAM", b"a"), (&PNAM, b"\x00\x00\x00\x00")]);
        let second = info_record(0x0012_3456, vec![(b"NAM1", b"b")]);
        let mut elements = vec![first, second];
        merge_info_siblings(&mut elements);

        assert_eq!(elements.len(), 1);
        if let Element::Record(r) = &elements[0] {
            assert!(r.subrecords.iter().all(|s| s.signature != PNAM));
            assert_eq!(r.subrecords.len(), 2);
        } else {
            panic!("expected merged record");
        }
    }

    #[test]
    fn test_distinct_form_ids_not_merged() {
        let a = info_record(1, vec![(b"ANAM", b"a")]);
        let b = info_record(2, vec![(b"ANAM", b"b")]);
        let mut elements = vec![a, b];
        merge_info_siblings(&mut elements);
        assert_eq!(elements.len(), 2);
    }
}
