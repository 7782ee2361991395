//! Error types for the dump carver.
//!
//! Mirrors the error taxonomy in spec.md §7: most conditions are isolated
//! per-candidate and never become a hard `Err` — only `InvalidContainer`
//! propagates out of [`crate::carve::engine::run`].

use thiserror::Error;

/// Primary error type for the dump carver.
#[derive(Debug, Error)]
pub enum CarveError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Minidump header or stream directory violates an invariant; fatal for
    /// the whole job.
    #[error("invalid minidump container: {reason}")]
    InvalidContainer { reason: String },

    /// A read was requested past the end of the mapped file; the caller may
    /// downgrade to a truncated/partial result instead of failing outright.
    #[error("truncated capture at offset {offset}: wanted {wanted} bytes, had {available}")]
    TruncatedCapture {
        offset: u64,
        wanted: usize,
        available: usize,
    },

    /// A format parser rejected the candidate (normal case: a false
    /// signature match). Never surfaced to the user, just used internally
    /// to short-circuit.
    #[error("parser rejected candidate at offset {offset}: {reason}")]
    ParserReject { offset: u64, reason: String },

    /// LZX decompression aborted partway through a DDX payload.
    #[error("LZX decompression failed after {bytes_recovered} bytes: {reason}")]
    DecompressionFailure {
        bytes_recovered: usize,
        reason: String,
    },

    /// Writing an extracted file failed; isolated per-file.
    #[error("failed to write {path}: {source}")]
    WriteFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Per-type quota reached; silent skip by design (carving is advisory).
    #[error("quota exceeded for file type {file_type}")]
    QuotaExceeded { file_type: String },

    /// A parser produced a `ParseResult` whose format label the downstream
    /// converter does not recognize; the candidate is still emitted.
    #[error("unknown format label: {label}")]
    UnknownFormat { label: String },

    /// LZX bitstream-level failure (invalid block type, bad Huffman code,
    /// output length mismatch).
    #[error("LZX stream error: {0}")]
    Lzx(#[from] crate::lzx::LzxError),

    /// ESM record tree walk hit a structural invariant violation.
    #[error("ESM conversion error: {0}")]
    Esm(String),
}

/// Result type alias for carver operations.
pub type Result<T> = std::result::Result<T, CarveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CarveError::TruncatedCapture {
            offset: 0x1000,
            wanted: 128,
            available: 32,
        };
        let msg = err.to_string();
        assert!(msg.contains("4096"));
        assert!(msg.contains("128"));
    }

    #[test]
    fn test_quota_exceeded_display() {
        let err = CarveError::QuotaExceeded {
            file_type: "dds".into(),
        };
        assert!(err.to_string().contains("dds"));
    }
}
