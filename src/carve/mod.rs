//! Per-dump carving job: memory-mapped scan, parallel extraction, and the
//! manifest writer (spec.md §4.7/C8).

pub mod engine;
pub mod manifest;
pub mod quota;

pub use engine::run;
pub use manifest::Manifest;
