//! Carving job configuration (spec.md §4.8, [ADDED]).
//!
//! Mirrors the CLI contract in spec.md §6 as an in-process builder, the way
//! the teacher exposes `ClassifierOptions::new()/thorough()/fast()`.

use std::collections::HashSet;
use std::path::PathBuf;

/// Default per-type quota (spec.md §4.7).
pub const DEFAULT_MAX_FILES_PER_TYPE: usize = 10_000;
/// Default scan chunk size for the Aho-Corasick pass (spec.md §4.7 step 4).
pub const DEFAULT_SCAN_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Options controlling a single carving job.
#[derive(Debug, Clone)]
pub struct CarveOptions {
    pub output_dir: PathBuf,
    pub type_filter: Option<HashSet<String>>,
    pub convert_ddx: bool,
    pub max_files_per_type: usize,
    pub untile_textures: bool,
    pub scan_chunk_size: usize,
    pub verbose: bool,
}

impl CarveOptions {
    /// Default options: convert DDX, untile textures, 10000-file quota per
    /// type, 64 MiB scan chunks, no type filter.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            type_filter: None,
            convert_ddx: true,
            max_files_per_type: DEFAULT_MAX_FILES_PER_TYPE,
            untile_textures: true,
            scan_chunk_size: DEFAULT_SCAN_CHUNK_SIZE,
            verbose: false,
        }
    }

    pub fn with_type_filter(mut self, types: HashSet<String>) -> Self {
        self.type_filter = Some(types);
        self
    }

    pub fn with_convert_ddx(mut self, convert_ddx: bool) -> Self {
        self.convert_ddx = convert_ddx;
        self
    }

    pub fn with_max_files_per_type(mut self, max: usize) -> Self {
        self.max_files_per_type = max;
        self
    }

    pub fn with_untile_textures(mut self, untile: bool) -> Self {
        self.untile_textures = untile;
        self
    }

    pub fn with_scan_chunk_size(mut self, size: usize) -> Self {
        self.scan_chunk_size = size;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// True if `sig_id` should be scanned for under this job's type filter.
    pub fn wants_type(&self, sig_id: &str) -> bool {
        match &self.type_filter {
            Some(types) => types.contains(sig_id),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = CarveOptions::new("/tmp/out");
        assert!(opts.convert_ddx);
        assert!(opts.untile_textures);
        assert_eq!(opts.max_files_per_type, DEFAULT_MAX_FILES_PER_TYPE);
        assert!(opts.wants_type("dds"));
    }

    #[test]
    fn test_type_filter() {
        let opts = CarveOptions::new("/tmp/out")
            .with_type_filter(["dds".to_string()].into_iter().collect());
        assert!(opts.wants_type("dds"));
        assert!(!opts.wants_type("png"));
    }
}
