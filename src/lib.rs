//! dump-carver - Xbox 360 / Windows minidump game-asset carver
//!
//! This library recovers embedded game assets from crash-dump captures: it
//! walks the minidump container, scans the mapped memory for known asset
//! signatures, validates and sizes each candidate with a dedicated format
//! parser, and emits recovered files plus a JSON manifest. Xbox 360 DDX
//! textures are additionally decompressed (LZX) and converted to DDS; ESM/ESP
//! plugin records can be converted from Xbox's big-endian layout to PC's
//! little-endian layout as a standalone pass.
//!
//! # Features
//!
//! - **Minidump parsing**: stream directory, module list, fragmented memory
//!   regions, Xbox 360 vs. PC build detection.
//! - **Signature scanning**: a from-scratch Aho-Corasick matcher over the
//!   mapped file, chunked to bound peak memory on large captures.
//! - **Format library**: DDS, Xbox DDX, XMA, NIF, compiled Obsidian/Bethesda
//!   scripts, Bink video, PNG, and a set of magic-only Xbox 360 container
//!   formats (XEX, XDBF, XUI, LIP, TES4/ESM).
//! - **DDX → DDS pipeline**: header parse, LZX decompression, optional
//!   texture untiling, and DDS header synthesis.
//! - **ESM converter**: schema-driven hybrid-endian record conversion with
//!   split-`INFO`-fragment merging.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use dump_carver::{carve_dump, CarveOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = CarveOptions::new("out/");
//!     let entries = carve_dump("crash.dmp".as_ref(), &options)?;
//!     println!("recovered {} assets", entries.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]

pub mod ahocorasick;
pub mod carve;
pub mod config;
pub mod ddx2dds;
pub mod error;
pub mod esm;
pub mod formats;
pub mod lzx;
pub mod minidump;
pub mod signatures;
pub mod types;
pub mod util;

pub use config::CarveOptions;
pub use error::{CarveError, Result};
pub use esm::convert_xbox_to_pc;
pub use types::{CarveEntry, MinidumpInfo, ParseResult, Signature};

use std::path::Path;

/// Runs the full carving pipeline against a single minidump file.
///
/// This is the library's single entry point: it memory-maps `dump_path`,
/// parses the minidump container, scans for known signatures, and extracts
/// every candidate that passes its format parser's validation, writing
/// output under `options.output_dir` alongside a `manifest.json`.
///
/// ESM/ESP plugins are extracted as raw bytes by this pipeline; converting
/// an extracted plugin from Xbox's big-endian layout is a separate step,
/// see [`convert_xbox_to_pc`].
pub fn carve_dump(dump_path: &Path, options: &CarveOptions) -> Result<Vec<CarveEntry>> {
    carve::run(dump_path, options)
}
