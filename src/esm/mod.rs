//! ESM/ESP hybrid-endian converter (spec.md §4.6/C7).
//!
//! Walks the record tree starting at `TES4`, re-emitting each record's
//! header and schema-known subrecords in the target endianness, merging
//! split Xbox `INFO` fragments along the way.

pub mod convert;
pub mod header;
pub mod merge;
pub mod schema;

pub use convert::convert_xbox_to_pc;
