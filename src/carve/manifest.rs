//! Append-only carve manifest (spec.md §4.7 step 7, §5, §6).

use crate::types::CarveEntry;
use std::sync::Mutex;

/// An append-only collection of [`CarveEntry`] values, safe to share across
/// the parallel extraction stage. Drained once at the end of the job.
#[derive(Default)]
pub struct Manifest {
    entries: Mutex<Vec<CarveEntry>>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: CarveEntry) {
        self.entries.lock().expect("manifest mutex poisoned").push(entry);
    }

    /// Consumes the manifest, returning its entries. Order is unspecified
    /// per spec.md §4.7's "ordering guarantee" note; callers that need a
    /// stable order should sort by `offset`.
    pub fn into_entries(self) -> Vec<CarveEntry> {
        self.entries.into_inner().expect("manifest mutex poisoned")
    }

    /// Writes the manifest as a pretty-printed JSON array to `path`.
    pub fn write_json(entries: &[CarveEntry], path: &std::path::Path) -> crate::error::Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, entries).map_err(|e| crate::error::CarveError::WriteFailure {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(file_type: &str, offset: i64) -> CarveEntry {
        CarveEntry {
            file_type: file_type.to_string(),
            offset,
            size_in_dump: 128,
            size_output: 128,
            filename: format!("{file_type}_{offset}.bin"),
            is_compressed: false,
            content_type: file_type.to_string(),
            is_partial: false,
            notes: None,
        }
    }

    #[test]
    fn test_push_and_drain() {
        let manifest = Manifest::new();
        manifest.push(entry("dds", 0x100));
        manifest.push(entry("png", 0x200));
        let entries = manifest.into_entries();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_write_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let entries = vec![entry("dds", 0)];
        Manifest::write_json(&entries, &path).unwrap();
        let read_back: Vec<CarveEntry> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read_back.len(), 1);
        assert_eq!(read_back[0].file_type, "dds");
    }
}
