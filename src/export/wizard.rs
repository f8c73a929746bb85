//! Export orchestration.
//!
//! The wizard walks the scene's geometry pieces in export order, asks a
//! `DecisionProvider` how each piece should map onto the output texture
//! pages, and then encodes the full file set: one skeleton, one TEX per
//! texture slot, one P-file per piece.

use anyhow::Result;

use super::{
    naming, pfile, region, tex, ExportPiece, NamedBinaryFile, RegionConfig, SectionDecision,
    SlotAssignment, TextureSlot,
};
use super::detect_palette;
use super::region::UvPoint;
use super::skeleton::BattleSkeleton;
use crate::scene::sections::SceneFile;
use crate::scene::{classify, DecodeOptions};

/// Everything a collaborator needs to place one piece: its identity, UV
/// footprint, the planner's default, and the slots created so far.
pub struct SectionPrompt<'a> {
    pub section_id: &'a str,
    pub name: &'a str,
    pub palette: u8,
    /// Position in the piece list, for progress display.
    pub index: usize,
    pub total: usize,
    pub uv_polygons: &'a [Vec<UvPoint>],
    pub suggested: Option<super::TextureRegion>,
    /// An existing slot whose region and palette already match the
    /// suggestion, if any.
    pub reuse_hint: Option<u32>,
    pub slots: &'a [TextureSlot],
    pub texture_size: (u32, u32),
    /// Set once eight slots exist; further texture names collide with the
    /// model name range.
    pub many_slots: bool,
}

/// Supplies one placement decision per piece. Implemented by interactive
/// frontends and by [`AutoPlacer`].
pub trait DecisionProvider {
    fn decide(&mut self, prompt: &SectionPrompt<'_>) -> Result<SectionDecision>;
}

/// Non-interactive provider: reuses a matching slot when one exists,
/// otherwise places a 256×256 block over the piece's UV footprint, and skips
/// pieces with no UVs at all.
pub struct AutoPlacer;

impl DecisionProvider for AutoPlacer {
    fn decide(&mut self, prompt: &SectionPrompt<'_>) -> Result<SectionDecision> {
        let Some(bounds) = region::uv_bounds(prompt.uv_polygons) else {
            return Ok(SectionDecision::Skip);
        };
        let candidate =
            region::auto_block_region(bounds, prompt.texture_size.0, prompt.texture_size.1);

        // A slot already covering this block with the same palette is reused
        // instead of burning a texture page on identical content.
        if let Some(slot) = prompt
            .slots
            .iter()
            .find(|s| s.region == Some(candidate) && s.palette == prompt.palette)
        {
            return Ok(SectionDecision::ReuseExisting {
                tex_index: slot.tex_index,
                duplicate: false,
            });
        }
        Ok(SectionDecision::NewRegion {
            region: candidate,
            duplicate: false,
        })
    }
}

pub struct ExportWizard<'a> {
    scene: &'a SceneFile,
    options: DecodeOptions,
    prefix: String,
}

impl<'a> ExportWizard<'a> {
    pub fn new(scene: &'a SceneFile, prefix: &str, options: DecodeOptions) -> Self {
        Self {
            scene,
            options,
            prefix: naming::normalize_prefix(prefix),
        }
    }

    /// Exportable pieces in output order: ground plane, sky sections, objects.
    pub fn pieces(&self) -> Vec<ExportPiece<'a>> {
        self.scene
            .meshes()
            .into_iter()
            .enumerate()
            .map(|(i, geometry)| ExportPiece {
                section_id: format!("section-{}", i),
                name: classify(i).display_name(),
                palette: detect_palette(geometry),
                geometry,
            })
            .collect()
    }

    /// Source texture dimensions used for UV normalization. A texture that
    /// decoded with a zero dimension would put zeros in the divisors, so it
    /// falls back the same as a missing texture.
    fn texture_size(&self) -> (u32, u32) {
        match self.scene.texture.as_ref() {
            Some(t) if t.image.width > 0 && t.image.height > 0 => {
                (t.image.width, t.image.height)
            }
            _ => self.options.fallback_texture_size,
        }
    }

    /// Run the full export. Returns `Ok(None)` when the provider cancels;
    /// otherwise the complete output file set.
    pub fn run(&self, provider: &mut dyn DecisionProvider) -> Result<Option<Vec<NamedBinaryFile>>> {
        let Some((entries, slots)) = self.plan(provider)? else {
            return Ok(None);
        };
        Ok(Some(self.encode(&entries, &slots, self.texture_size())))
    }

    /// Gather one decision per piece into the slot list and per-piece
    /// configs, duplicates appended after every original.
    fn plan(
        &self,
        provider: &mut dyn DecisionProvider,
    ) -> Result<Option<(Vec<(ExportPiece<'a>, RegionConfig)>, Vec<TextureSlot>)>> {
        let pieces = self.pieces();
        let texture_size = self.texture_size();
        let total = pieces.len();

        let mut slots: Vec<TextureSlot> = Vec::new();
        let mut entries: Vec<(ExportPiece<'a>, RegionConfig)> = Vec::new();
        // Duplicates land after every original, in creation order.
        let mut duplicates: Vec<(ExportPiece<'a>, RegionConfig)> = Vec::new();

        for (index, piece) in pieces.into_iter().enumerate() {
            let polygons = region::extract_uv_polygons(piece.geometry, &self.options);
            let suggested =
                region::uv_bounds(&polygons).and_then(region::suggested_region_for_bounds);
            let reuse_hint = suggested.and_then(|s| {
                slots
                    .iter()
                    .find(|slot| slot.region == Some(s) && slot.palette == piece.palette)
                    .map(|slot| slot.tex_index)
            });

            let decision = provider.decide(&SectionPrompt {
                section_id: &piece.section_id,
                name: &piece.name,
                palette: piece.palette,
                index,
                total,
                uv_polygons: &polygons,
                suggested,
                reuse_hint,
                slots: &slots,
                texture_size,
                many_slots: slots.len() >= 8,
            })?;

            let (assignment, duplicate) = match decision {
                SectionDecision::Cancel => return Ok(None),
                SectionDecision::NewRegion { region, duplicate } => {
                    let tex_index = slots.len() as u32;
                    slots.push(TextureSlot {
                        tex_index,
                        name: naming::texture_file_name(&self.prefix, tex_index),
                        region: Some(region),
                        palette: piece.palette,
                    });
                    (SlotAssignment::New { tex_index, region }, duplicate)
                }
                SectionDecision::ReuseExisting {
                    tex_index,
                    duplicate,
                } => (SlotAssignment::Reuse { tex_index }, duplicate),
                SectionDecision::Skip => (SlotAssignment::Skipped, false),
            };

            let config = RegionConfig {
                section_id: piece.section_id.clone(),
                assignment,
                duplicate_of: None,
            };

            if duplicate {
                // Ordinal counts duplicates across the whole export, not
                // per original.
                let dup_piece = ExportPiece {
                    section_id: format!("{}-dup-{}", piece.section_id, duplicates.len() + 1),
                    name: format!("{} (Duplicate)", piece.name),
                    palette: piece.palette,
                    geometry: piece.geometry,
                };
                let dup_config = RegionConfig {
                    section_id: dup_piece.section_id.clone(),
                    assignment,
                    duplicate_of: Some(piece.section_id.clone()),
                };
                duplicates.push((dup_piece, dup_config));
            }
            entries.push((piece, config));
        }
        entries.append(&mut duplicates);

        Ok(Some((entries, slots)))
    }

    fn encode(
        &self,
        entries: &[(ExportPiece<'a>, RegionConfig)],
        slots: &[TextureSlot],
        texture_size: (u32, u32),
    ) -> Vec<NamedBinaryFile> {
        let mut files = Vec::with_capacity(1 + slots.len() + entries.len());

        files.push(NamedBinaryFile {
            name: naming::skeleton_file_name(&self.prefix),
            data: BattleSkeleton::for_location(entries.len() as i32, slots.len() as i32)
                .to_bytes(),
        });

        for slot in slots {
            files.push(NamedBinaryFile {
                name: slot.name.clone(),
                data: tex::build_tex_file(
                    self.scene.texture.as_ref(),
                    slot.palette,
                    slot.region.as_ref(),
                ),
            });
        }

        for (i, (piece, config)) in entries.iter().enumerate() {
            let (piece_region, tex_index) = match config.assignment {
                SlotAssignment::New { tex_index, region } => (Some(region), tex_index),
                SlotAssignment::Reuse { tex_index } => (
                    slots
                        .iter()
                        .find(|s| s.tex_index == tex_index)
                        .and_then(|s| s.region),
                    tex_index,
                ),
                SlotAssignment::Skipped => (None, i as u32),
            };
            files.push(NamedBinaryFile {
                name: naming::model_file_name(&self.prefix, i as u32),
                data: pfile::build_p_file(
                    piece.geometry,
                    piece_region.as_ref(),
                    tex_index,
                    texture_size,
                    &self.options,
                ),
            });
        }

        files
    }
}
