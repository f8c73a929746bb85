//! Scene file section decoder.
//!
//! A scene file is a section-pointer table followed by the sections
//! themselves:
//! ```text
//! [4 bytes]          section count
//! [count × 4 bytes]  absolute section offsets, strictly increasing
//! ```
//! Section 0 is always metadata. Every other section is a TIM texture when
//! its first u32 is 0x10, otherwise 3D geometry.

use anyhow::{bail, Result};
use serde::Serialize;

use super::geometry::{decode_geometry, GeometrySection};
use super::reader::SceneReader;
use super::tim::{decode_tim, TimTexture};

#[derive(Debug, Clone, Serialize)]
pub struct SectionTable {
    pub section_count: u32,
    pub pointers: Vec<u32>,
    pub sizes: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SectionKind {
    Metadata,
    Geometry,
    Texture,
}

/// Position and classification of one section; the decoded payload lives on
/// the categorized `SceneFile` fields.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SectionInfo {
    pub index: usize,
    pub offset: u32,
    pub size: u32,
    pub kind: SectionKind,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Metadata {
    pub flags: u32,
    pub reserved: u32,
}

/// Fully decoded scene file. Decode errors abort the whole decode and land in
/// `errors`; the remaining fields hold whatever was assembled before the
/// failure.
#[derive(Debug, Default, Serialize)]
pub struct SceneFile {
    pub table: Option<SectionTable>,
    pub sections: Vec<SectionInfo>,
    pub metadata: Option<Metadata>,
    pub ground_plane: Option<GeometrySection>,
    pub geometry: Vec<GeometrySection>,
    pub texture: Option<TimTexture>,
    pub errors: Vec<String>,
}

impl SceneFile {
    /// All exportable geometry pieces in export order: ground plane first,
    /// then the remaining geometry sections in file order.
    pub fn meshes(&self) -> Vec<&GeometrySection> {
        self.ground_plane.iter().chain(self.geometry.iter()).collect()
    }
}

/// Decode a scene buffer. Never panics and never returns `Err`: structural
/// failures are captured in `SceneFile::errors` alongside the partial result.
pub fn decode(buffer: &[u8]) -> SceneFile {
    let mut scene = SceneFile::default();
    if let Err(e) = decode_into(buffer, &mut scene) {
        scene.errors.push(format!("{e:#}"));
    }
    scene
}

fn decode_into(buffer: &[u8], scene: &mut SceneFile) -> Result<()> {
    let mut r = SceneReader::new(buffer);
    let table = decode_table(&mut r)?;
    let spans: Vec<(u32, u32)> = table
        .pointers
        .iter()
        .zip(&table.sizes)
        .map(|(&offset, &size)| (offset, size))
        .collect();
    scene.table = Some(table);

    // Sections land on `scene` one at a time so a mid-file failure keeps
    // everything decoded before it. Section 0 is metadata, section 1 the
    // ground plane when it is geometry, the rest the object/sky geometry
    // list plus the texture.
    for (i, (offset, size)) in spans.into_iter().enumerate() {
        let (info, payload) = decode_section(&mut r, i, offset, size)?;
        scene.sections.push(info);
        match payload {
            Payload::Metadata(m) => scene.metadata = Some(m),
            Payload::Geometry(g) if i == 1 => scene.ground_plane = Some(*g),
            Payload::Geometry(g) => scene.geometry.push(*g),
            Payload::Texture(t) => scene.texture = Some(*t),
        }
    }

    Ok(())
}

enum Payload {
    Metadata(Metadata),
    Geometry(Box<GeometrySection>),
    Texture(Box<TimTexture>),
}

fn decode_table(r: &mut SceneReader) -> Result<SectionTable> {
    r.seek(0);
    let section_count = r.read_u32()?;

    let mut pointers = Vec::with_capacity(section_count as usize);
    for _ in 0..section_count {
        pointers.push(r.read_u32()?);
    }

    for pair in pointers.windows(2) {
        if pair[1] <= pair[0] {
            bail!(
                "section pointers are not strictly increasing ({} then {})",
                pair[0],
                pair[1]
            );
        }
    }
    if let Some(&last) = pointers.last() {
        if last as usize > r.len() {
            bail!(
                "section pointer {} is past the end of the {} byte buffer",
                last,
                r.len()
            );
        }
    }

    let mut sizes = Vec::with_capacity(section_count as usize);
    for i in 0..section_count as usize {
        let next = if i + 1 < pointers.len() {
            pointers[i + 1]
        } else {
            r.len() as u32
        };
        sizes.push(next - pointers[i]);
    }

    Ok(SectionTable {
        section_count,
        pointers,
        sizes,
    })
}

fn decode_section(
    r: &mut SceneReader,
    index: usize,
    offset: u32,
    size: u32,
) -> Result<(SectionInfo, Payload)> {
    r.seek(offset as usize);

    if index == 0 {
        let metadata = Metadata {
            flags: r.read_u32()?,
            reserved: r.read_u32()?,
        };
        let info = SectionInfo {
            index,
            offset,
            size,
            kind: SectionKind::Metadata,
        };
        return Ok((info, Payload::Metadata(metadata)));
    }

    let magic = r.peek_u32_at(offset as usize)?;
    if magic == 0x10 {
        let texture = decode_tim(r)?;
        let info = SectionInfo {
            index,
            offset,
            size,
            kind: SectionKind::Texture,
        };
        Ok((info, Payload::Texture(Box::new(texture))))
    } else {
        let geometry = decode_geometry(r)?;
        let info = SectionInfo {
            index,
            offset,
            size,
            kind: SectionKind::Geometry,
        };
        Ok((info, Payload::Geometry(Box::new(geometry))))
    }
}
