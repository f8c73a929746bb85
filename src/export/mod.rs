//! PC battle-location export — region planning, slot orchestration, and the
//! skeleton/TEX/P-file encoders.

pub mod naming;
pub mod pfile;
pub mod region;
pub mod skeleton;
pub mod tex;
pub mod wizard;

use serde::{Deserialize, Serialize};

use crate::scene::geometry::GeometrySection;

/// A rectangle in source-texture pixel space. Suggested regions are snapped
/// to the 32px grid with a 64px minimum extent; block placements are always
/// 256×256.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// One 256×256 output texture page, created by a `NewRegion` decision.
#[derive(Debug, Clone, Serialize)]
pub struct TextureSlot {
    pub tex_index: u32,
    pub name: String,
    pub region: Option<TextureRegion>,
    pub palette: u8,
}

/// How an exported piece maps onto the texture slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAssignment {
    /// The piece owns a freshly created slot covering `region`.
    New {
        tex_index: u32,
        region: TextureRegion,
    },
    /// The piece shares a previously created slot; its effective region is
    /// resolved from that slot at encode time.
    Reuse { tex_index: u32 },
    /// No texture was assigned; the piece exports against the whole source
    /// texture.
    Skipped,
}

/// Per-piece export record produced by the orchestrator, consumed once by the
/// encoder.
#[derive(Debug, Clone)]
pub struct RegionConfig {
    pub section_id: String,
    pub assignment: SlotAssignment,
    /// Set on synthesized duplicates; names the original piece's id.
    pub duplicate_of: Option<String>,
}

/// One decision from the region-selection collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionDecision {
    NewRegion {
        region: TextureRegion,
        duplicate: bool,
    },
    ReuseExisting {
        tex_index: u32,
        duplicate: bool,
    },
    Skip,
    Cancel,
}

/// A finished output file, ready for the caller to package.
pub struct NamedBinaryFile {
    pub name: String,
    pub data: Vec<u8>,
}

/// An exportable geometry piece with its identity and dominant palette.
#[derive(Debug, Clone)]
pub struct ExportPiece<'a> {
    pub section_id: String,
    pub name: String,
    pub palette: u8,
    pub geometry: &'a GeometrySection,
}

/// Dominant per-polygon palette of a section — the palette most triangles and
/// quads address, smallest index winning ties.
pub fn detect_palette(geom: &GeometrySection) -> u8 {
    let mut counts = std::collections::BTreeMap::new();
    for tri in &geom.triangles {
        *counts.entry(tri.palette_index).or_insert(0usize) += 1;
    }
    for quad in &geom.quads {
        *counts.entry(quad.palette_index).or_insert(0usize) += 1;
    }

    let mut dominant = 0u8;
    let mut max_count = 0usize;
    for (palette, count) in counts {
        if count > max_count {
            max_count = count;
            dominant = palette;
        }
    }
    dominant
}
