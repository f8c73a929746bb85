//! Region planning — maps a section's UV coverage onto source-texture
//! rectangles.
//!
//! Two planners share the same UV bounds: the interactive suggestion snaps a
//! bounding box to the 32px grid, while the automatic packer places a fixed
//! 256×256 block over the footprint.

use serde::Serialize;

use super::TextureRegion;
use crate::scene::geometry::GeometrySection;
use crate::scene::DecodeOptions;

/// Fixed output page edge; auto placement always uses 256×256 blocks.
pub const BLOCK_SIZE: i32 = 256;

const GRID: i32 = 32;
const MIN_EXTENT: i32 = 64;

/// A UV point in source-texture pixel space, texture-page offset applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UvPoint {
    pub u: i32,
    pub v: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UvBounds {
    pub min_u: i32,
    pub max_u: i32,
    pub min_v: i32,
    pub max_v: i32,
}

/// Collect one polygon outline per triangle/quad, with the section's texture
/// page offset folded into U. Quad corners come out in draw order
/// (0, 1, 3, 2) so the outline doesn't self-cross.
pub fn extract_uv_polygons(geom: &GeometrySection, options: &DecodeOptions) -> Vec<Vec<UvPoint>> {
    let x_offset = options.texture_x_offset(geom.texture_page_x);
    let point = |u: u8, v: u8| UvPoint {
        u: u as i32 + x_offset,
        v: v as i32,
    };

    let mut polygons = Vec::with_capacity(geom.triangles.len() + geom.quads.len());
    for tri in &geom.triangles {
        polygons.push(tri.stored_uvs.iter().map(|uv| point(uv.u, uv.v)).collect());
    }
    for quad in &geom.quads {
        let uvs = &quad.stored_uvs;
        polygons.push(vec![
            point(uvs[0].u, uvs[0].v),
            point(uvs[1].u, uvs[1].v),
            point(uvs[3].u, uvs[3].v),
            point(uvs[2].u, uvs[2].v),
        ]);
    }
    polygons
}

/// Bounding extents over a UV polygon set; `None` when there are no points.
pub fn uv_bounds(polygons: &[Vec<UvPoint>]) -> Option<UvBounds> {
    let mut bounds: Option<UvBounds> = None;
    for point in polygons.iter().flatten() {
        let b = bounds.get_or_insert(UvBounds {
            min_u: point.u,
            max_u: point.u,
            min_v: point.v,
            max_v: point.v,
        });
        b.min_u = b.min_u.min(point.u);
        b.max_u = b.max_u.max(point.u);
        b.min_v = b.min_v.min(point.v);
        b.max_v = b.max_v.max(point.v);
    }
    bounds
}

fn snap_down(v: i32) -> i32 {
    v.div_euclid(GRID) * GRID
}

fn snap_up(v: i32) -> i32 {
    (v + GRID - 1).div_euclid(GRID) * GRID
}

/// Grid-snapped bounding box around a section's UV footprint — the default
/// shown to the region-selection collaborator. 32px grid, 64px minimum.
pub fn suggested_region(
    geom: &GeometrySection,
    options: &DecodeOptions,
) -> Option<TextureRegion> {
    let polygons = extract_uv_polygons(geom, options);
    suggested_region_for_bounds(uv_bounds(&polygons)?)
}

pub fn suggested_region_for_bounds(bounds: UvBounds) -> Option<TextureRegion> {
    let x = snap_down(bounds.min_u);
    let y = snap_down(bounds.min_v);
    Some(TextureRegion {
        x,
        y,
        width: (snap_up(bounds.max_u) - x).max(MIN_EXTENT) as u32,
        height: (snap_up(bounds.max_v) - y).max(MIN_EXTENT) as u32,
    })
}

/// Pick a block start on one axis. Two candidates are considered — snapping
/// the footprint's min down to a block boundary, and snapping its max end
/// back by one block — each clamped into the texture. A candidate that fully
/// contains the footprint wins; otherwise the one with the least one-sided
/// overflow does.
fn choose_block_start(min: i32, max: i32, tex_extent: i32) -> i32 {
    let max_start = (tex_extent - BLOCK_SIZE).max(0);
    let clamp = |v: i32| v.clamp(0, max_start);

    let from_min = clamp(min.div_euclid(BLOCK_SIZE) * BLOCK_SIZE);
    let from_max = clamp((max - BLOCK_SIZE).div_euclid(BLOCK_SIZE) * BLOCK_SIZE);

    let covers = |start: i32| min >= start && max <= start + BLOCK_SIZE;
    let overflow =
        |start: i32| (min - start).max(0) + (max - (start + BLOCK_SIZE)).max(0);

    for candidate in [from_min, from_max] {
        if covers(candidate) {
            return candidate;
        }
    }
    if overflow(from_max) < overflow(from_min) {
        from_max
    } else {
        from_min
    }
}

/// Place a fixed 256×256 block over the section's UV footprint — the
/// automatic counterpart of the interactive suggestion.
pub fn auto_block_region(bounds: UvBounds, tex_width: u32, tex_height: u32) -> TextureRegion {
    TextureRegion {
        x: choose_block_start(bounds.min_u, bounds.max_u, tex_width as i32),
        y: choose_block_start(bounds.min_v, bounds.max_v, tex_height as i32),
        width: BLOCK_SIZE as u32,
        height: BLOCK_SIZE as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::geometry::{Triangle, Uv};

    fn bounds(min_u: i32, max_u: i32, min_v: i32, max_v: i32) -> UvBounds {
        UvBounds {
            min_u,
            max_u,
            min_v,
            max_v,
        }
    }

    #[test]
    fn suggestion_snaps_to_grid_with_minimum_extent() {
        let region = suggested_region_for_bounds(bounds(10, 70, 5, 40)).unwrap();
        assert_eq!(
            region,
            TextureRegion {
                x: 0,
                y: 0,
                width: 96,
                height: 64
            }
        );
    }

    #[test]
    fn suggestion_keeps_offset_origin() {
        let region = suggested_region_for_bounds(bounds(130, 200, 70, 100)).unwrap();
        assert_eq!(region.x, 128);
        assert_eq!(region.y, 64);
        assert_eq!(region.width, 96); // ceil(200/32)*32 - 128
        assert_eq!(region.height, 64);
    }

    #[test]
    fn no_uvs_yield_no_suggestion() {
        let geom = GeometrySection {
            vertex_data_size: 0,
            vertex_count: 0,
            vertices: vec![],
            texture_page_x: 6,
            triangles: vec![],
            quads: vec![],
        };
        assert!(suggested_region(&geom, &DecodeOptions::default()).is_none());
    }

    #[test]
    fn page_offset_shifts_polygon_us() {
        let geom = GeometrySection {
            vertex_data_size: 0,
            vertex_count: 0,
            vertices: vec![],
            texture_page_x: 7,
            triangles: vec![Triangle {
                vertices: [0, 1, 2],
                clut_word: 0,
                palette_index: 0,
                stored_uvs: [
                    Uv { u: 0, v: 0 },
                    Uv { u: 10, v: 0 },
                    Uv { u: 0, v: 10 },
                ],
            }],
            quads: vec![],
        };
        let polys = extract_uv_polygons(&geom, &DecodeOptions::default());
        assert_eq!(polys[0][0], UvPoint { u: 128, v: 0 });
        assert_eq!(polys[0][1], UvPoint { u: 138, v: 0 });
    }

    #[test]
    fn block_placement_prefers_full_containment() {
        // Footprint sits entirely in the second block column.
        let b = bounds(300, 450, 0, 10);
        let region = auto_block_region(b, 512, 256);
        assert_eq!(region.x, 256);
        assert_eq!(region.width, 256);
    }

    #[test]
    fn block_placement_minimizes_overflow_when_nothing_contains() {
        // Footprint 10..280 is wider than one block; candidate 0 overflows by
        // 24 on the right, the clamped max candidate matches; first wins ties.
        let b = bounds(10, 280, 0, 10);
        let region = auto_block_region(b, 512, 256);
        assert_eq!(region.x, 0);
    }

    #[test]
    fn block_placement_clamps_into_texture() {
        let b = bounds(-40, 100, 200, 260);
        let region = auto_block_region(b, 256, 256);
        assert_eq!(region.x, 0);
        assert_eq!(region.y, 0);
    }
}
