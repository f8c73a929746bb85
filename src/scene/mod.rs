//! Battle scene decoding — section table, PSX geometry and TIM texture codecs.

pub mod geometry;
pub mod reader;
pub mod sections;
pub mod tim;

use serde::{Deserialize, Serialize};

/// Rendering role of a geometry piece, keyed by its position in the mesh list
/// (ground plane first, then the three sky strips, then scene objects).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SectionRole {
    Ground,
    Sky(u32),
    Object(u32),
}

/// Classify a mesh-list index into its scene role. Index 0 is always the
/// ground plane, 1..=3 the sky sections, everything above an object section.
pub fn classify(mesh_index: usize) -> SectionRole {
    match mesh_index {
        0 => SectionRole::Ground,
        1..=3 => SectionRole::Sky(mesh_index as u32 - 1),
        n => SectionRole::Object(n as u32 - 4),
    }
}

impl SectionRole {
    /// Human-readable piece name shown to the region-selection collaborator.
    pub fn display_name(&self) -> String {
        match self {
            SectionRole::Ground => "Ground Plane".to_string(),
            SectionRole::Sky(n) => format!("Sky Section {}", n),
            SectionRole::Object(n) => format!("Object Section {}", n),
        }
    }
}

/// Options controlling how raw UV data is reinterpreted downstream.
///
/// The base texture page is the page the source texture starts on; polygon
/// UVs on other pages are shifted by 128px per page during region planning
/// and export.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DecodeOptions {
    /// Base texture page X. Battle scenes use page 6.
    pub base_page_x: u16,
    /// Texture dimensions assumed when the scene has no decodable texture.
    pub fallback_texture_size: (u32, u32),
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            base_page_x: 6,
            fallback_texture_size: (256, 256),
        }
    }
}

impl DecodeOptions {
    /// Horizontal UV offset for a section's texture page, in pixels.
    /// A page of 0 means "unset" in the source data and maps to no offset.
    pub fn texture_x_offset(&self, texture_page_x: u16) -> i32 {
        let page = if texture_page_x == 0 {
            self.base_page_x
        } else {
            texture_page_x
        };
        (page as i32 - self.base_page_x as i32) * 128
    }
}
