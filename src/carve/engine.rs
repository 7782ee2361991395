//! Carving engine: the 7-phase per-dump pipeline (spec.md §4.7, §5).

use crate::ahocorasick::AhoCorasick;
use crate::config::CarveOptions;
use crate::ddx2dds;
use crate::error::{CarveError, Result};
use crate::minidump;
use crate::signatures;
use crate::types::{CarveEntry, MinidumpInfo};
use crate::util::sanitize_filename;
use memmap2::Mmap;
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use super::manifest::Manifest;
use super::quota::{ClaimSet, QuotaTracker};

/// Header-window read size for most formats; DDX candidates get a larger
/// window since their header alone is 0x44 bytes and the LZX payload
/// typically needs more context to size reliably (spec.md §4.7 step 5).
const DEFAULT_READ_WINDOW: usize = 64 * 1024;
const DDX_READ_WINDOW: usize = 512 * 1024;

/// Runs the carving pipeline for a single dump file, writing extracted
/// assets and a `manifest.json` under `options.output_dir`.
pub fn run(dump_path: &Path, options: &CarveOptions) -> Result<Vec<CarveEntry>> {
    let stem = dump_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "dump".to_string());
    let dump_output_dir = options.output_dir.join(sanitize_filename(&stem));
    fs::create_dir_all(&dump_output_dir)?;

    let file = fs::File::open(dump_path)?;
    // memmap2's `map` is unsafe because the OS cannot guarantee the backing
    // file won't be truncated out from under us; the carving job owns an
    // exclusive, short-lived read-only view scoped to this function.
    #[allow(unsafe_code)]
    let mmap = unsafe { Mmap::map(&file) }?;
    let data: &[u8] = &mmap;

    let info = minidump::parse(data)?;
    let manifest = Manifest::new();

    write_minidump_artifacts(data, &info, &dump_output_dir, &manifest)?;

    let patterns: Vec<(&'static str, &'static [u8])> = signatures::ALL
        .iter()
        .filter(|sig| sig.enabled_for_scan && options.wants_type(sig.id))
        .map(|sig| (sig.id, sig.magic_bytes))
        .collect();

    if patterns.is_empty() {
        let entries = manifest.into_entries();
        write_manifest(&entries, &dump_output_dir)?;
        return Ok(entries);
    }

    let magic_bytes: Vec<&[u8]> = patterns.iter().map(|(_, m)| *m).collect();
    let pattern_lens: Vec<usize> = patterns.iter().map(|(_, m)| m.len()).collect();
    let automaton = AhoCorasick::build(&magic_bytes);

    let mut matches = automaton.search_chunked(data, options.scan_chunk_size, &pattern_lens);
    matches.sort_by_key(|m| m.position);
    matches.dedup_by_key(|m| m.position);

    let claims = ClaimSet::new();
    let quotas = QuotaTracker::new(options.max_files_per_type);

    matches.par_iter().for_each(|m| {
        let offset = m.position;
        let Some(&(sig_id, _)) = patterns.get(m.pattern_index as usize) else {
            return;
        };

        if !claims.try_claim(offset) {
            return;
        }
        if !quotas.try_reserve(sig_id) {
            return;
        }

        match extract_one(data, offset as usize, sig_id, options, &dump_output_dir) {
            Ok(entry) => manifest.push(entry),
            Err(CarveError::ParserReject { .. }) => {
                quotas.release(sig_id);
            }
            Err(e) => {
                warn!(sig_id, offset, error = %e, "extraction failed");
                quotas.release(sig_id);
            }
        }
    });

    let entries = manifest.into_entries();
    write_manifest(&entries, &dump_output_dir)?;
    info!(
        dump = %dump_path.display(),
        entries = entries.len(),
        modules = info.modules.len(),
        "carve complete"
    );
    Ok(entries)
}

fn write_minidump_artifacts(
    data: &[u8],
    info: &MinidumpInfo,
    dump_output_dir: &Path,
    manifest: &Manifest,
) -> Result<()> {
    let exec_dir = dump_output_dir.join("executables");
    fs::create_dir_all(&exec_dir)?;

    if info.header_size > 0 {
        let header_len = (info.header_size as usize).min(data.len());
        let header_path = exec_dir.join("minidump_header.bin");
        fs::write(&header_path, &data[..header_len])?;
        manifest.push(CarveEntry {
            file_type: "minidump_header".to_string(),
            offset: 0,
            size_in_dump: header_len as i64,
            size_output: header_len as i64,
            filename: relative_path(&header_path, dump_output_dir),
            is_compressed: false,
            content_type: "minidump_header".to_string(),
            is_partial: false,
            notes: None,
        });
    }

    for module in &info.modules {
        let Some((start, end)) = minidump::module_file_range(info, module) else {
            continue;
        };
        let start = start as usize;
        let end = (end as usize).min(data.len());
        if start >= end {
            continue;
        }
        let filename = format!("{}.bin", sanitize_filename(&module.name));
        let path = exec_dir.join(&filename);
        fs::write(&path, &data[start..end])?;
        manifest.push(CarveEntry {
            file_type: "module".to_string(),
            offset: start as i64,
            size_in_dump: (end - start) as i64,
            size_output: (end - start) as i64,
            filename: relative_path(&path, dump_output_dir),
            is_compressed: false,
            content_type: "module".to_string(),
            is_partial: false,
            notes: None,
        });
    }

    Ok(())
}

fn extract_one(
    data: &[u8],
    offset: usize,
    sig_id: &str,
    options: &CarveOptions,
    dump_output_dir: &Path,
) -> Result<CarveEntry> {
    let window_len = if sig_id.starts_with("ddx_") {
        DDX_READ_WINDOW
    } else {
        DEFAULT_READ_WINDOW
    }
    .min(data.len().saturating_sub(offset));

    let parsed = crate::formats::parse(sig_id, data, offset)?;

    let sig = signatures::by_id(sig_id).ok_or_else(|| CarveError::UnknownFormat {
        label: sig_id.to_string(),
    })?;

    if !parsed.fits(sig) {
        return Err(CarveError::ParserReject {
            offset: offset as u64,
            reason: format!(
                "estimated size {} outside [{}, {}] for {sig_id}",
                parsed.estimated_size, sig.min_size, sig.max_size
            ),
        });
    }

    let estimated_size = parsed.estimated_size as usize;
    let available = data.len() - offset;
    let read_len = estimated_size.min(available).max(window_len.min(available));
    let source_bytes = &data[offset..offset + read_len];

    if sig_id.starts_with("ddx_") && options.convert_ddx {
        match ddx2dds::convert(data, offset, estimated_size, options.untile_textures) {
            Ok(converted) => {
                let dir = dump_output_dir.join("textures");
                fs::create_dir_all(&dir)?;
                let filename = unique_filename(&dir, &format!("ddx_{offset:08x}"), "dds");
                let path = dir.join(&filename);
                write_file(&path, &converted.bytes)?;
                return Ok(CarveEntry {
                    file_type: sig_id.to_string(),
                    offset: offset as i64,
                    size_in_dump: estimated_size as i64,
                    size_output: converted.bytes.len() as i64,
                    filename: relative_path(&path, dump_output_dir),
                    is_compressed: true,
                    content_type: if converted.is_partial {
                        "dds_partial".to_string()
                    } else {
                        "dds_converted".to_string()
                    },
                    is_partial: converted.is_partial,
                    notes: converted.notes,
                });
            }
            Err(e) => {
                warn!(offset, error = %e, "DDX conversion failed, saving raw DDX");
            }
        }
    }

    let dir = dump_output_dir.join(sig.output_folder);
    fs::create_dir_all(&dir)?;
    let filename = unique_filename(&dir, &format!("{sig_id}_{offset:08x}"), sig.extension);
    let path = dir.join(&filename);
    write_file(&path, source_bytes)?;

    Ok(CarveEntry {
        file_type: sig_id.to_string(),
        offset: offset as i64,
        size_in_dump: read_len as i64,
        size_output: source_bytes.len() as i64,
        filename: relative_path(&path, dump_output_dir),
        is_compressed: false,
        content_type: sig_id.to_string(),
        is_partial: false,
        notes: None,
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|e| CarveError::WriteFailure {
        path: path.display().to_string(),
        source: e,
    })
}

/// Builds `<stem>.<ext>`, appending a monotonic numeric suffix on
/// collision (spec.md §4.7 step 5).
fn unique_filename(dir: &Path, stem: &str, ext: &str) -> String {
    let candidate = format!("{stem}.{ext}");
    if !dir.join(&candidate).exists() {
        return candidate;
    }
    let mut n = 1u32;
    loop {
        let candidate = format!("{stem}_{n}.{ext}");
        if !dir.join(&candidate).exists() {
            return candidate;
        }
        n += 1;
    }
}

fn relative_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}

fn write_manifest(entries: &[CarveEntry], dump_output_dir: &Path) -> Result<()> {
    let path = dump_output_dir.join("manifest.json");
    Manifest::write_json(entries, &path)
}
