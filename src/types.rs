//! Core data model shared across the carving pipeline.
//!
//! These mirror spec.md §3 verbatim: `Signature`, `ParseResult`,
//! `MinidumpInfo`/`MinidumpModule`/`MinidumpMemoryRegion`, and `CarveEntry`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A carvable file-type signature.
///
/// Identity is `id` (unique); a format may contribute multiple signatures
/// (e.g. distinct DDX magics).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub id: &'static str,
    pub magic_bytes: &'static [u8],
    pub description: &'static str,
    pub min_size: u64,
    pub max_size: u64,
    pub output_folder: &'static str,
    pub extension: &'static str,
    pub enabled_for_scan: bool,
}

/// A single JSON-able metadata value attached to a [`ParseResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Text(String),
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        MetadataValue::Bool(v)
    }
}
impl From<u64> for MetadataValue {
    fn from(v: u64) -> Self {
        MetadataValue::UInt(v)
    }
}
impl From<u32> for MetadataValue {
    fn from(v: u32) -> Self {
        MetadataValue::UInt(v as u64)
    }
}
impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        MetadataValue::Int(v)
    }
}
impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        MetadataValue::Text(v)
    }
}
impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        MetadataValue::Text(v.to_string())
    }
}

/// The result of a successful format-parser header validation.
///
/// Invariant: `signature.min_size <= estimated_size <= signature.max_size`,
/// else the candidate is discarded by the caller (spec.md §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub format_label: String,
    pub estimated_size: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub mip_count: Option<u32>,
    pub four_cc: Option<String>,
    pub is_big_endian: Option<bool>,
    pub file_name: Option<String>,
    pub metadata: BTreeMap<String, MetadataValue>,
}

impl ParseResult {
    pub fn new(format_label: impl Into<String>, estimated_size: u64) -> Self {
        Self {
            format_label: format_label.into(),
            estimated_size,
            width: None,
            height: None,
            mip_count: None,
            four_cc: None,
            is_big_endian: None,
            file_name: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_mip_count(mut self, mip_count: u32) -> Self {
        self.mip_count = Some(mip_count);
        self
    }

    pub fn with_four_cc(mut self, four_cc: impl Into<String>) -> Self {
        self.four_cc = Some(four_cc.into());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Checks the `min_size <= estimated_size <= max_size` invariant against
    /// a signature; candidates that fail this are discarded by the caller.
    pub fn fits(&self, sig: &Signature) -> bool {
        self.estimated_size >= sig.min_size && self.estimated_size <= sig.max_size
    }
}

/// Processor architecture codes as they appear in MINIDUMP_SYSTEM_INFO.
pub const PROCESSOR_ARCHITECTURE_PPC: u16 = 0x0003;

/// Parsed minidump-level metadata (spec.md §3/§4.2).
#[derive(Debug, Clone, Default)]
pub struct MinidumpInfo {
    pub is_valid: bool,
    pub processor_arch: Option<u16>,
    pub streams_count: u32,
    pub modules: Vec<MinidumpModule>,
    pub regions: Vec<MinidumpMemoryRegion>,
    /// Minimum file-offset across regions; memory pages begin here and
    /// everything before is metadata.
    pub header_size: u64,
}

impl MinidumpInfo {
    /// `is_xbox360 ≡ processor_arch == 0x03` (spec.md §3).
    pub fn is_xbox360(&self) -> bool {
        self.processor_arch == Some(PROCESSOR_ARCHITECTURE_PPC)
    }
}

/// A module recorded in the minidump's ModuleListStream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinidumpModule {
    pub name: String,
    pub base_va: u64,
    pub size: u32,
    pub checksum: u32,
    pub timestamp: u32,
}

/// A contiguous captured memory region (file offsets are cumulative from
/// Memory64ListStream's base RVA).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinidumpMemoryRegion {
    pub virtual_address: u64,
    pub size: u64,
    pub file_offset: u64,
}

impl MinidumpMemoryRegion {
    pub fn contains_va(&self, va: u64) -> bool {
        va >= self.virtual_address && va < self.virtual_address + self.size
    }

    pub fn va_end(&self) -> u64 {
        self.virtual_address + self.size
    }
}

/// Build type as detected by walking module names (spec.md §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildType {
    Debug,
    MemDebug,
    ReleaseBeta,
    Unknown,
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildType::Debug => "Debug",
            BuildType::MemDebug => "MemDebug",
            BuildType::ReleaseBeta => "ReleaseBeta",
            BuildType::Unknown => "Unknown",
        };
        write!(f, "{s}")
    }
}

/// A single manifest entry: one extracted (or attempted) file.
///
/// Immutable once emitted; appended to the per-dump manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarveEntry {
    #[serde(rename = "fileType")]
    pub file_type: String,
    pub offset: i64,
    #[serde(rename = "sizeInDump")]
    pub size_in_dump: i64,
    #[serde(rename = "sizeOutput")]
    pub size_output: i64,
    pub filename: String,
    #[serde(rename = "isCompressed")]
    pub is_compressed: bool,
    #[serde(rename = "contentType")]
    pub content_type: String,
    #[serde(rename = "isPartial")]
    pub is_partial: bool,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_result_fits() {
        let sig = Signature {
            id: "dds",
            magic_bytes: b"DDS ",
            description: "DirectDraw Surface",
            min_size: 128,
            max_size: 64 * 1024 * 1024,
            output_folder: "textures",
            extension: "dds",
            enabled_for_scan: true,
        };
        let r = ParseResult::new("dds", 1024);
        assert!(r.fits(&sig));
        let too_small = ParseResult::new("dds", 10);
        assert!(!too_small.fits(&sig));
    }

    #[test]
    fn test_region_contains_va() {
        let r = MinidumpMemoryRegion {
            virtual_address: 0x1000,
            size: 0x100,
            file_offset: 0x2000,
        };
        assert!(r.contains_va(0x1000));
        assert!(r.contains_va(0x10FF));
        assert!(!r.contains_va(0x1100));
        assert_eq!(r.va_end(), 0x1100);
    }

    #[test]
    fn test_is_xbox360() {
        let mut info = MinidumpInfo::default();
        info.processor_arch = Some(0x0003);
        assert!(info.is_xbox360());
        info.processor_arch = Some(0x0000);
        assert!(!info.is_xbox360());
    }
}
