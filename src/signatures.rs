//! Build-time-constant signature table (spec.md §2/§4.3).
//!
//! One entry per carvable format; DDX contributes two (3XDO, 3XDR) since
//! both share a parser but are tracked as distinct ids for quota purposes.

use crate::types::Signature;

pub const DDS: Signature = Signature {
    id: "dds",
    magic_bytes: b"DDS ",
    description: "DirectDraw Surface texture",
    min_size: 128,
    max_size: 256 * 1024 * 1024,
    output_folder: "textures",
    extension: "dds",
    enabled_for_scan: true,
};

pub const DDX_3XDO: Signature = Signature {
    id: "ddx_3xdo",
    magic_bytes: b"3XDO",
    description: "Xbox 360 packed texture (production)",
    min_size: 0x44,
    max_size: 256 * 1024 * 1024,
    output_folder: "ddx",
    extension: "ddx",
    enabled_for_scan: true,
};

pub const DDX_3XDR: Signature = Signature {
    id: "ddx_3xdr",
    magic_bytes: b"3XDR",
    description: "Xbox 360 packed texture (experimental)",
    min_size: 0x44,
    max_size: 256 * 1024 * 1024,
    output_folder: "ddx",
    extension: "ddx",
    enabled_for_scan: true,
};

pub const XMA: Signature = Signature {
    id: "xma",
    magic_bytes: b"RIFF",
    description: "Xbox Media Audio (RIFF/WAVE container)",
    min_size: 44,
    max_size: 128 * 1024 * 1024,
    output_folder: "audio",
    extension: "xma",
    enabled_for_scan: true,
};

pub const NIF: Signature = Signature {
    id: "nif",
    magic_bytes: b"Gamebryo File Format",
    description: "NetImmerse/Gamebryo model",
    min_size: 64,
    max_size: 20 * 1024 * 1024,
    output_folder: "models",
    extension: "nif",
    enabled_for_scan: true,
};

pub const SCRIPT_SCN: Signature = Signature {
    id: "script_scn",
    magic_bytes: b"scn ",
    description: "Obsidian/Bethesda compiled script",
    min_size: 16,
    max_size: 1024 * 1024,
    output_folder: "scripts",
    extension: "txt",
    enabled_for_scan: true,
};

pub const SCRIPT_SCRIPTNAME: Signature = Signature {
    id: "script_scriptname",
    magic_bytes: b"scriptname ",
    description: "Obsidian/Bethesda compiled script",
    min_size: 16,
    max_size: 1024 * 1024,
    output_folder: "scripts",
    extension: "txt",
    enabled_for_scan: true,
};

pub const BIK: Signature = Signature {
    id: "bik",
    magic_bytes: b"BIK",
    description: "Bink video",
    min_size: 44,
    max_size: 512 * 1024 * 1024,
    output_folder: "video",
    extension: "bik",
    enabled_for_scan: true,
};

pub const PNG: Signature = Signature {
    id: "png",
    magic_bytes: &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'],
    description: "Portable Network Graphics image",
    min_size: 8,
    max_size: 64 * 1024 * 1024,
    output_folder: "images",
    extension: "png",
    enabled_for_scan: true,
};

pub const XEX: Signature = Signature {
    id: "xex",
    magic_bytes: b"XEX2",
    description: "Xbox 360 executable",
    min_size: 24,
    max_size: 64 * 1024 * 1024,
    output_folder: "executables",
    extension: "xex",
    enabled_for_scan: true,
};

pub const XDBF: Signature = Signature {
    id: "xdbf",
    magic_bytes: b"XDBF",
    description: "Xbox 360 game-resource database (achievements, strings)",
    min_size: 24,
    max_size: 16 * 1024 * 1024,
    output_folder: "xbox",
    extension: "xdbf",
    enabled_for_scan: true,
};

pub const XUIS: Signature = Signature {
    id: "xuis",
    magic_bytes: b"XUIS",
    description: "Xbox 360 UI scene",
    min_size: 16,
    max_size: 8 * 1024 * 1024,
    output_folder: "xbox",
    extension: "xur",
    enabled_for_scan: true,
};

pub const XUIB: Signature = Signature {
    id: "xuib",
    magic_bytes: b"XUIB",
    description: "Xbox 360 UI binary resource",
    min_size: 16,
    max_size: 8 * 1024 * 1024,
    output_folder: "xbox",
    extension: "xur",
    enabled_for_scan: true,
};

pub const LIP: Signature = Signature {
    id: "lip",
    magic_bytes: b"LIP ",
    description: "Lip-sync animation data",
    min_size: 16,
    max_size: 4 * 1024 * 1024,
    output_folder: "lipsync",
    extension: "lip",
    enabled_for_scan: true,
};

pub const TES4: Signature = Signature {
    id: "tes4",
    magic_bytes: b"TES4",
    description: "Bethesda ESM/ESP plugin",
    min_size: 24,
    max_size: 512 * 1024 * 1024,
    output_folder: "plugins",
    extension: "esp",
    enabled_for_scan: true,
};

/// All signatures, in the order the carving engine feeds patterns into the
/// Aho-Corasick matcher. Index into this slice is the `pattern_index`
/// reported by [`crate::ahocorasick::Match`].
pub const ALL: &[Signature] = &[
    DDS,
    DDX_3XDO,
    DDX_3XDR,
    XMA,
    NIF,
    SCRIPT_SCN,
    SCRIPT_SCRIPTNAME,
    BIK,
    PNG,
    XEX,
    XDBF,
    XUIS,
    XUIB,
    LIP,
    TES4,
];

/// Looks up a signature by id.
pub fn by_id(id: &str) -> Option<&'static Signature> {
    ALL.iter().find(|s| s.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_ids_unique() {
        let mut ids: Vec<&str> = ALL.iter().map(|s| s.id).collect();
        ids.sort_unstable();
        let mut deduped = ids.clone();
        deduped.dedup();
        assert_eq!(ids.len(), deduped.len());
    }

    #[test]
    fn test_by_id() {
        assert_eq!(by_id("dds").unwrap().extension, "dds");
        assert!(by_id("nonexistent").is_none());
    }
}
