//! PSX 3D geometry section decoder.
//!
//! Binary layout (all little-endian):
//! ```text
//! [4 bytes]   vertex_data_size; vertex_count = size / 8
//! [count × 8] vertices: x(i16) z(i16) y(i16) pad(u16) — z and y swapped on disk
//! [2 bytes]   triangle count
//! [2 bytes]   tpage word (texture page X in the low 4 bits)
//! [count × 12] triangle records: 3 × vertex(u16, pre-multiplied by 8),
//!              skip(u16), u0 v0, clut(u16), u1 v1 u2 v2
//! [2 bytes]   quad record count, then a u16 skip
//! [8 bytes]   quad header: 4 × vertex(u16, pre-multiplied by 8)
//! [count × 20] quad records: 12 UV bytes + 4 × vertex(u16, pre-multiplied by 8)
//! ```
//!
//! Quads pair the vertex indices of record `i` with the UV payload of record
//! `i+1`; the header's vertices pair with record 0. This offset-by-one scheme
//! is how the source format actually stores them — it must not be "fixed".

use serde::Serialize;

use super::reader::SceneReader;
use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Vertex {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Uv {
    pub u: u8,
    pub v: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct Triangle {
    pub vertices: [u16; 3],
    pub clut_word: u16,
    pub palette_index: u8,
    pub stored_uvs: [Uv; 3],
}

#[derive(Debug, Clone, Serialize)]
pub struct Quad {
    pub vertices: [u16; 4],
    pub clut_word: u16,
    pub flags: u16,
    pub palette_index: u8,
    pub stored_uvs: [Uv; 4],
    pub uv_data: [u8; 12],
}

#[derive(Debug, Clone, Serialize)]
pub struct GeometrySection {
    pub vertex_data_size: u32,
    pub vertex_count: u32,
    pub vertices: Vec<Vertex>,
    /// Low 4 bits of the triangle tpage word.
    pub texture_page_x: u16,
    pub triangles: Vec<Triangle>,
    pub quads: Vec<Quad>,
}

/// Palette row addressed by a polygon's CLUT word. Rows below the battle
/// palette block (Y 504) collapse to palette 0.
pub fn palette_index_from_clut(clut_word: u16) -> u8 {
    let clut_y = (clut_word >> 6) & 0x1FF;
    if clut_y >= 504 {
        (clut_y - 504) as u8
    } else {
        0
    }
}

/// One raw 20-byte quad record before header/record UV pairing.
struct QuadRecord {
    uv_data: [u8; 12],
    vertices: [u16; 4],
}

impl QuadRecord {
    fn stored_uvs(&self) -> [Uv; 4] {
        let d = &self.uv_data;
        [
            Uv { u: d[0], v: d[1] },
            Uv { u: d[4], v: d[5] },
            Uv { u: d[6], v: d[7] },
            Uv { u: d[8], v: d[9] },
        ]
    }

    fn clut_word(&self) -> u16 {
        (self.uv_data[3] as u16) << 8 | self.uv_data[2] as u16
    }

    fn flags(&self) -> u16 {
        (self.uv_data[11] as u16) << 8 | self.uv_data[10] as u16
    }
}

fn quad_from_pair(vertices: [u16; 4], uv: &QuadRecord) -> Quad {
    let clut_word = uv.clut_word();
    Quad {
        vertices,
        clut_word,
        flags: uv.flags(),
        palette_index: palette_index_from_clut(clut_word),
        stored_uvs: uv.stored_uvs(),
        uv_data: uv.uv_data,
    }
}

/// Decode a geometry section starting at the reader's current position.
pub fn decode_geometry(r: &mut SceneReader) -> Result<GeometrySection> {
    let vertex_data_size = r.read_u32()?;
    let vertex_count = vertex_data_size / 8;

    let mut vertices = Vec::with_capacity(vertex_count as usize);
    for _ in 0..vertex_count {
        let x = r.read_i16()?;
        let z = r.read_i16()?;
        let y = r.read_i16()?;
        r.read_u16()?; // padding
        vertices.push(Vertex { x, y, z });
    }

    let tri_count = r.read_u16()?;
    let tri_tpage = r.read_u16()?;
    let texture_page_x = tri_tpage & 0x0F;

    let mut triangles = Vec::new();
    for _ in 0..tri_count {
        let vert0 = r.read_u16()? / 8;
        let vert1 = r.read_u16()? / 8;
        let vert2 = r.read_u16()? / 8;
        r.read_u16()?; // skip
        let u0 = r.read_u8()?;
        let v0 = r.read_u8()?;
        let clut_word = r.read_u16()?;
        let u1 = r.read_u8()?;
        let v1 = r.read_u8()?;
        let u2 = r.read_u8()?;
        let v2 = r.read_u8()?;

        // Records referencing out-of-range vertices are dropped entirely.
        let valid = (vert0 as u32) < vertex_count
            && (vert1 as u32) < vertex_count
            && (vert2 as u32) < vertex_count;
        if valid {
            triangles.push(Triangle {
                vertices: [vert0, vert1, vert2],
                clut_word,
                palette_index: palette_index_from_clut(clut_word),
                stored_uvs: [
                    Uv { u: u0, v: v0 },
                    Uv { u: u1, v: v1 },
                    Uv { u: u2, v: v2 },
                ],
            });
        }
    }

    let quad_count = r.read_u16()?;
    r.read_u16()?; // skip

    let mut quads = Vec::new();
    if quad_count > 0 {
        let mut header = [0u16; 4];
        for slot in header.iter_mut() {
            *slot = r.read_u16()? / 8;
        }

        let mut records = Vec::with_capacity(quad_count as usize);
        for _ in 0..quad_count {
            let mut uv_data = [0u8; 12];
            for byte in uv_data.iter_mut() {
                *byte = r.read_u8()?;
            }
            let mut verts = [0u16; 4];
            for slot in verts.iter_mut() {
                *slot = r.read_u16()? / 8;
            }
            records.push(QuadRecord {
                uv_data,
                vertices: verts,
            });
        }

        let in_range =
            |verts: &[u16; 4]| verts.iter().all(|&v| (v as u32) < vertex_count);
        let all_zero = |verts: &[u16; 4]| verts.iter().all(|&v| v == 0);

        // The first quad uses the header's vertices with record 0's UVs.
        if !records.is_empty() && in_range(&header) && !all_zero(&header) {
            quads.push(quad_from_pair(header, &records[0]));
        }

        // Each subsequent quad takes vertices from record i and UVs from
        // record i+1. All-zero vertex records are skipped but keep their
        // place in the pairing: record i+1's UVs are positional, not shifted.
        for i in 0..records.len().saturating_sub(1) {
            let verts = records[i].vertices;
            if all_zero(&verts) {
                continue;
            }
            if in_range(&verts) {
                quads.push(quad_from_pair(verts, &records[i + 1]));
            }
        }
    }

    Ok(GeometrySection {
        vertex_data_size,
        vertex_count,
        vertices,
        texture_page_x,
        triangles,
        quads,
    })
}
