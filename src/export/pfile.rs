//! PC battle model (P-file) builder and writer.
//!
//! Triangles and quads (split 0,1,2 / 1,3,2) become polygons over a vertex
//! pool deduplicated by (position, UV). Normals are never stored — the PC
//! runtime computes them — so the normal-index table is the identity and all
//! per-polygon normal slots are zero.
//!
//! ```text
//! [128]      header: counts + 16 reserved words
//! [n × 12]   vertices (3 × f32)
//! [n × 8]    texcoords (2 × f32)
//! [n × 4]    vertex colors (BGRA, constant white)
//! [p × 4]    polygon colors (BGRA, constant mid-gray)
//! [e × 4]    edges (2 × u16)
//! [p × 24]   polygons
//! [g × 100]  render-state records
//! [g × 56]   group records
//! [28]       bounding box
//! [n × 4]    normal-index table (identity)
//! ```

use std::collections::HashMap;

use cgmath::Vector3;

use super::TextureRegion;
use crate::scene::geometry::{GeometrySection, Uv};
use crate::scene::DecodeOptions;

/// Required constant in every PC polygon record; meaning unknown, the
/// runtime rejects files without it.
const PPOLY_TAG2: i32 = 0x00EAFC0C;

/// Render-state words observed in shipping battle location files.
const RS_FIELD_8: i32 = 0x0003860E;
const RS_FIELD_C: i32 = 0x00020402;

#[derive(Debug, Clone, Copy)]
struct PVertex {
    pos: Vector3<f32>,
    u: f32,
    v: f32,
}

#[derive(Debug, Clone, Copy)]
struct PPolygon {
    vertices: [u16; 3],
    edges: [u16; 3],
}

/// Vertex dedup key: position and UV rounded to 4 decimal digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct VertexKey(i64, i64, i64, i64, i64);

fn round4(v: f64) -> i64 {
    (v * 10_000.0).round() as i64
}

struct MeshBuilder {
    vertices: Vec<PVertex>,
    vertex_map: HashMap<VertexKey, u16>,
    edges: Vec<(u16, u16)>,
    edge_map: HashMap<(u16, u16), u16>,
    polygons: Vec<PPolygon>,
}

impl MeshBuilder {
    fn new() -> Self {
        Self {
            vertices: Vec::new(),
            vertex_map: HashMap::new(),
            edges: Vec::new(),
            edge_map: HashMap::new(),
            polygons: Vec::new(),
        }
    }

    fn add_vertex(
        &mut self,
        geom: &GeometrySection,
        src_index: u16,
        uv: Uv,
        x_offset: i32,
        region: (f64, f64, f64, f64),
    ) -> u16 {
        let Some(src) = geom.vertices.get(src_index as usize) else {
            // Indices were validated at decode; a miss degrades to vertex 0.
            return 0;
        };

        // PSX Z is up; the PC format wants Y up.
        let x = src.x as f64;
        let y = src.z as f64;
        let z = src.y as f64;

        let (rx, ry, rw, rh) = region;
        let u = (uv.u as f64 + x_offset as f64 - rx) / rw;
        let v = (uv.v as f64 - ry) / rh;

        let key = VertexKey(round4(x), round4(y), round4(z), round4(u), round4(v));
        if let Some(&idx) = self.vertex_map.get(&key) {
            return idx;
        }

        let idx = self.vertices.len() as u16;
        self.vertices.push(PVertex {
            pos: Vector3::new(x as f32, y as f32, z as f32),
            u: u as f32,
            v: v as f32,
        });
        self.vertex_map.insert(key, idx);
        idx
    }

    fn add_edge(&mut self, a: u16, b: u16) -> u16 {
        let key = if a < b { (a, b) } else { (b, a) };
        if let Some(&idx) = self.edge_map.get(&key) {
            return idx;
        }
        let idx = self.edges.len() as u16;
        self.edges.push((a, b));
        self.edge_map.insert(key, idx);
        idx
    }

    fn add_triangle(&mut self, v0: u16, v1: u16, v2: u16) {
        let e0 = self.add_edge(v0, v1);
        let e1 = self.add_edge(v1, v2);
        let e2 = self.add_edge(v2, v0);
        self.polygons.push(PPolygon {
            vertices: [v0, v1, v2],
            edges: [e0, e1, e2],
        });
    }
}

/// Build a model piece. `region` gives the texture rectangle UVs normalize
/// against; without one they normalize against the whole source texture
/// (`texture_size`). `tex_index` is the texture page the single render group
/// references.
pub fn build_p_file(
    geom: &GeometrySection,
    region: Option<&TextureRegion>,
    tex_index: u32,
    texture_size: (u32, u32),
    options: &DecodeOptions,
) -> Vec<u8> {
    let x_offset = options.texture_x_offset(geom.texture_page_x);

    let norm = match region {
        Some(r) => {
            assert!(
                r.width > 0 && r.height > 0,
                "degenerate texture region {}x{}",
                r.width,
                r.height
            );
            (r.x as f64, r.y as f64, r.width as f64, r.height as f64)
        }
        None => (0.0, 0.0, texture_size.0 as f64, texture_size.1 as f64),
    };

    let mut mesh = MeshBuilder::new();

    for tri in &geom.triangles {
        let v0 = mesh.add_vertex(geom, tri.vertices[0], tri.stored_uvs[0], x_offset, norm);
        let v1 = mesh.add_vertex(geom, tri.vertices[1], tri.stored_uvs[1], x_offset, norm);
        let v2 = mesh.add_vertex(geom, tri.vertices[2], tri.stored_uvs[2], x_offset, norm);
        mesh.add_triangle(v0, v1, v2);
    }

    for quad in &geom.quads {
        let v0 = mesh.add_vertex(geom, quad.vertices[0], quad.stored_uvs[0], x_offset, norm);
        let v1 = mesh.add_vertex(geom, quad.vertices[1], quad.stored_uvs[1], x_offset, norm);
        let v2 = mesh.add_vertex(geom, quad.vertices[2], quad.stored_uvs[2], x_offset, norm);
        let v3 = mesh.add_vertex(geom, quad.vertices[3], quad.stored_uvs[3], x_offset, norm);
        mesh.add_triangle(v0, v1, v2);
        mesh.add_triangle(v1, v3, v2);
    }

    assemble(&mesh, tex_index)
}

fn write_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn write_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn write_f32(buf: &mut Vec<u8>, v: f32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn bounding_box(vertices: &[PVertex]) -> (Vector3<f32>, Vector3<f32>) {
    let mut min = Vector3::new(0.0, 0.0, 0.0);
    let mut max = Vector3::new(0.0, 0.0, 0.0);
    for (i, v) in vertices.iter().enumerate() {
        if i == 0 {
            min = v.pos;
            max = v.pos;
        } else {
            min.x = min.x.min(v.pos.x);
            min.y = min.y.min(v.pos.y);
            min.z = min.z.min(v.pos.z);
            max.x = max.x.max(v.pos.x);
            max.y = max.y.max(v.pos.y);
            max.z = max.z.max(v.pos.z);
        }
    }
    (min, max)
}

fn assemble(mesh: &MeshBuilder, tex_index: u32) -> Vec<u8> {
    let num_verts = mesh.vertices.len() as i32;
    let num_tex_cs = num_verts;
    let num_edges = mesh.edges.len() as i32;
    let num_polys = mesh.polygons.len() as i32;
    let num_groups = 1i32;

    let total = 128
        + mesh.vertices.len() * 12
        + mesh.vertices.len() * 8
        + mesh.vertices.len() * 4
        + mesh.polygons.len() * 4
        + mesh.edges.len() * 4
        + mesh.polygons.len() * 24
        + num_groups as usize * 100
        + num_groups as usize * 56
        + 28
        + mesh.vertices.len() * 4;
    let mut buf = Vec::with_capacity(total);

    // Header
    write_i32(&mut buf, 1); // version
    write_i32(&mut buf, 1); // off04
    write_i32(&mut buf, 1); // vertexColor
    write_i32(&mut buf, num_verts);
    write_i32(&mut buf, 0); // numNormals: computed at runtime
    write_i32(&mut buf, 0); // numXYZ (unused)
    write_i32(&mut buf, num_tex_cs);
    write_i32(&mut buf, num_verts); // numNormIdx
    write_i32(&mut buf, num_edges);
    write_i32(&mut buf, num_polys);
    write_i32(&mut buf, 0); // off28
    write_i32(&mut buf, 0); // off2C
    write_i32(&mut buf, num_groups); // numHundrets
    write_i32(&mut buf, num_groups);
    write_i32(&mut buf, num_groups); // mirex_g
    write_i32(&mut buf, 1); // off3C
    for _ in 0..16 {
        write_i32(&mut buf, 0); // runtime words
    }

    for v in &mesh.vertices {
        write_f32(&mut buf, v.pos.x);
        write_f32(&mut buf, v.pos.y);
        write_f32(&mut buf, v.pos.z);
    }
    for v in &mesh.vertices {
        write_f32(&mut buf, v.u);
        write_f32(&mut buf, v.v);
    }
    // Vertex colors: constant white, polygon colors: constant mid-gray (BGRA)
    for _ in &mesh.vertices {
        buf.extend_from_slice(&[255, 255, 255, 255]);
    }
    for _ in &mesh.polygons {
        buf.extend_from_slice(&[128, 128, 128, 255]);
    }
    for &(a, b) in &mesh.edges {
        write_u16(&mut buf, a);
        write_u16(&mut buf, b);
    }

    for poly in &mesh.polygons {
        buf.extend_from_slice(&0i16.to_le_bytes()); // tag1
        for &v in &poly.vertices {
            write_u16(&mut buf, v);
        }
        for _ in 0..3 {
            write_u16(&mut buf, 0); // normal slots
        }
        for &e in &poly.edges {
            write_u16(&mut buf, e);
        }
        write_i32(&mut buf, PPOLY_TAG2);
    }

    // Render-state record (25 words); only texID and numVert+1 vary.
    write_i32(&mut buf, 1);
    write_i32(&mut buf, 1);
    write_i32(&mut buf, RS_FIELD_8);
    write_i32(&mut buf, RS_FIELD_C);
    write_i32(&mut buf, tex_index as i32);
    write_i32(&mut buf, 0); // texture set ptr (runtime)
    write_i32(&mut buf, 1);
    write_i32(&mut buf, num_verts + 1);
    write_i32(&mut buf, 0); // runtime pointer
    write_i32(&mut buf, 1); // shade mode
    write_i32(&mut buf, -1); // ambient light state
    write_i32(&mut buf, 0);
    write_i32(&mut buf, 0); // material ptr
    write_i32(&mut buf, 5); // src blend
    write_i32(&mut buf, 6); // dest blend
    write_i32(&mut buf, 2);
    write_i32(&mut buf, 0); // alpha ref
    write_i32(&mut buf, 0); // blend mode
    write_i32(&mut buf, 0); // z-sort (runtime)
    for _ in 0..4 {
        write_i32(&mut buf, 0);
    }
    write_i32(&mut buf, 0x80); // vertex alpha
    write_i32(&mut buf, 0);

    // Group record (14 words)
    write_i32(&mut buf, 3); // polyType
    write_i32(&mut buf, 0); // offsetPoly
    write_i32(&mut buf, num_polys);
    write_i32(&mut buf, 0); // offsetVert
    write_i32(&mut buf, num_verts);
    for _ in 0..6 {
        write_i32(&mut buf, 0); // edge offsets/counts unused on PC
    }
    write_i32(&mut buf, 0); // offsetTex
    write_i32(&mut buf, 1); // texFlag
    write_i32(&mut buf, tex_index as i32);

    let (min, max) = bounding_box(&mesh.vertices);
    write_i32(&mut buf, 0);
    write_f32(&mut buf, max.x);
    write_f32(&mut buf, max.y);
    write_f32(&mut buf, max.z);
    write_f32(&mut buf, min.x);
    write_f32(&mut buf, min.y);
    write_f32(&mut buf, min.z);

    // Identity normal-index table
    for i in 0..num_verts {
        write_i32(&mut buf, i);
    }

    buf
}
