//! Minidump container parser: header, stream directory, module list, and
//! fragmented memory regions (spec.md §4.2/C3).

use crate::error::{CarveError, Result};
use crate::types::{BuildType, MinidumpInfo, MinidumpMemoryRegion, MinidumpModule};
use crate::util::{read_bytes, read_minidump_string, read_u32, read_u64};

const MDMP_MAGIC: &[u8; 4] = b"MDMP";

const STREAM_SYSTEM_INFO: u32 = 7;
const STREAM_MODULE_LIST: u32 = 4;
const STREAM_MEMORY64_LIST: u32 = 9;

const MAX_STREAMS: u32 = 100;
const MAX_MODULES: u32 = 1000;
const MAX_MEMORY_RANGES: u64 = 10_000;

/// Parses a minidump from `data`, a complete file view (typically a memory
/// map). Returns [`CarveError::InvalidContainer`] for anything that violates
/// the header or stream-directory contract; this is the one error kind that
/// is fatal for a whole dump (spec.md §7).
pub fn parse(data: &[u8]) -> Result<MinidumpInfo> {
    if data.len() < 4 || &data[0..4] != MDMP_MAGIC {
        return Err(CarveError::InvalidContainer {
            reason: "missing MDMP magic".to_string(),
        });
    }

    // Bytes 4..8 are a version field the spec does not interpret; skip it.
    let num_streams = read_u32(data, 8, true).map_err(|_| CarveError::InvalidContainer {
        reason: "truncated header (num_streams)".to_string(),
    })?;
    let stream_dir_rva = read_u32(data, 12, true).map_err(|_| CarveError::InvalidContainer {
        reason: "truncated header (stream_dir_rva)".to_string(),
    })?;

    if num_streams == 0 || num_streams > MAX_STREAMS || stream_dir_rva == 0 {
        return Err(CarveError::InvalidContainer {
            reason: format!(
                "implausible stream directory: num_streams={num_streams}, stream_dir_rva={stream_dir_rva}"
            ),
        });
    }

    let mut info = MinidumpInfo {
        is_valid: true,
        processor_arch: None,
        streams_count: num_streams,
        modules: Vec::new(),
        regions: Vec::new(),
        header_size: 0,
    };

    for i in 0..num_streams as usize {
        let entry_offset = stream_dir_rva as usize + i * 12;
        let entry = match read_bytes(data, entry_offset, 12) {
            Ok(bytes) => bytes,
            Err(_) => break,
        };

        let stream_type = read_u32(entry, 0, true)?;
        let _size = read_u32(entry, 4, true)?;
        let rva = read_u32(entry, 8, true)? as usize;

        match stream_type {
            STREAM_SYSTEM_INFO => {
                info.processor_arch = read_u32(data, rva, true).ok().map(|v| v as u16);
            }
            STREAM_MODULE_LIST => {
                info.modules = parse_module_list(data, rva)?;
            }
            STREAM_MEMORY64_LIST => {
                info.regions = parse_memory64_list(data, rva)?;
            }
            _ => {}
        }
    }

    info.header_size = info
        .regions
        .iter()
        .map(|r| r.file_offset)
        .min()
        .unwrap_or(0);

    Ok(info)
}

fn parse_module_list(data: &[u8], rva: usize) -> Result<Vec<MinidumpModule>> {
    let num_modules = read_u32(data, rva, true)?;
    if num_modules == 0 || num_modules > MAX_MODULES {
        return Err(CarveError::InvalidContainer {
            reason: format!("implausible ModuleList count: {num_modules}"),
        });
    }

    let mut modules = Vec::with_capacity(num_modules as usize);
    for i in 0..num_modules as usize {
        let entry_offset = rva + 4 + i * 108;
        let entry = match read_bytes(data, entry_offset, 24) {
            Ok(bytes) => bytes,
            Err(_) => break,
        };

        let base_va = read_u64(entry, 0, true)?;
        let size = read_u32(entry, 8, true)?;
        let checksum = read_u32(entry, 12, true)?;
        let timestamp = read_u32(entry, 16, true)?;
        let name_rva = read_u32(entry, 20, true)? as usize;

        let name = read_minidump_string(data, name_rva).unwrap_or_default();

        modules.push(MinidumpModule {
            name,
            base_va,
            size,
            checksum,
            timestamp,
        });
    }

    Ok(modules)
}

fn parse_memory64_list(data: &[u8], rva: usize) -> Result<Vec<MinidumpMemoryRegion>> {
    let num_ranges = read_u64(data, rva, true)?;
    if num_ranges == 0 || num_ranges > MAX_MEMORY_RANGES {
        return Err(CarveError::InvalidContainer {
            reason: format!("implausible Memory64List count: {num_ranges}"),
        });
    }
    let base_rva = read_u64(data, rva + 8, true)?;

    let mut regions = Vec::with_capacity(num_ranges as usize);
    let mut file_offset = base_rva;

    for i in 0..num_ranges as usize {
        let desc_offset = rva + 16 + i * 16;
        let desc = match read_bytes(data, desc_offset, 16) {
            Ok(bytes) => bytes,
            Err(_) => break,
        };

        let virtual_address = read_u64(desc, 0, true)?;
        let size = read_u64(desc, 8, true)?;

        regions.push(MinidumpMemoryRegion {
            virtual_address,
            size,
            file_offset,
        });
        file_offset += size;
    }

    Ok(regions)
}

/// Maps a virtual address to a file offset by linear search over regions
/// (regions are few, per spec.md §4.2).
pub fn va_to_file_offset(info: &MinidumpInfo, va: u64) -> Option<u64> {
    info.regions
        .iter()
        .find(|r| r.contains_va(va))
        .map(|r| r.file_offset + (va - r.virtual_address))
}

/// Inverse of [`va_to_file_offset`]: maps a file offset back to a virtual
/// address (property P2, spec.md §8).
pub fn file_offset_to_va(info: &MinidumpInfo, file_offset: u64) -> Option<u64> {
    info.regions
        .iter()
        .find(|r| file_offset >= r.file_offset && file_offset < r.file_offset + r.size)
        .map(|r| r.virtual_address + (file_offset - r.file_offset))
}

/// Finds the captured byte range for `module`: the region containing its
/// base VA, then regions contiguous in virtual-address space with it,
/// accumulating until the module ends or a gap in VA-space is hit. The
/// module may be only partially captured; `captured_size` reflects only what
/// is actually present in the dump.
pub fn module_file_range(info: &MinidumpInfo, module: &MinidumpModule) -> Option<(u64, u64)> {
    let module_end = module.base_va + module.size as u64;

    let start_idx = info
        .regions
        .iter()
        .position(|r| r.contains_va(module.base_va))?;

    let start_region = &info.regions[start_idx];
    let file_offset = start_region.file_offset + (module.base_va - start_region.virtual_address);

    let mut captured_end_va = start_region.va_end().min(module_end);
    let mut expected_next_va = start_region.va_end();

    for region in &info.regions[start_idx + 1..] {
        if captured_end_va >= module_end {
            break;
        }
        if region.virtual_address != expected_next_va {
            break;
        }
        captured_end_va = region.va_end().min(module_end);
        expected_next_va = region.va_end();
    }

    let captured_size = captured_end_va.saturating_sub(module.base_va);
    Some((file_offset, captured_size))
}

/// Detects the build type by scanning module names for known substrings.
/// Precedence: `MemDebug` beats `Debug` (a module may legitimately contain
/// both substrings, e.g. `MemDebug.dll`), `ReleaseBeta`/`Release_Beta` is
/// checked independently (spec.md §4.2).
pub fn detect_build_type(info: &MinidumpInfo) -> BuildType {
    let has = |needle: &str| {
        info.modules
            .iter()
            .any(|m| m.name.to_ascii_lowercase().contains(&needle.to_ascii_lowercase()))
    };

    if has("MemDebug") {
        BuildType::MemDebug
    } else if has("Debug") {
        BuildType::Debug
    } else if has("ReleaseBeta") || has("Release_Beta") {
        BuildType::ReleaseBeta
    } else {
        BuildType::Unknown
    }
}
