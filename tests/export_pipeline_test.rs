// End-to-end export: synthetic scene bytes -> decode -> auto placement ->
// skeleton/TEX/P file set on disk.

use ff7_scene_tools_lib::export::wizard::{AutoPlacer, ExportWizard};
use ff7_scene_tools_lib::scene::{sections, DecodeOptions};

fn push_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Geometry: 3 vertices, one textured triangle, no quads.
fn geometry_section() -> Vec<u8> {
    let mut buf = Vec::new();
    push_u32(&mut buf, 24); // 3 vertices
    for (x, z, y) in [(0i16, 0i16, 0i16), (100, 0, 50), (0, 100, 50)] {
        buf.extend_from_slice(&x.to_le_bytes());
        buf.extend_from_slice(&z.to_le_bytes());
        buf.extend_from_slice(&y.to_le_bytes());
        push_u16(&mut buf, 0);
    }
    push_u16(&mut buf, 1); // one triangle
    push_u16(&mut buf, 6); // tpage
    for v in [0u16, 1, 2] {
        push_u16(&mut buf, v * 8);
    }
    push_u16(&mut buf, 0);
    buf.push(10); // u0 v0
    buf.push(20);
    push_u16(&mut buf, 505 << 6); // clut word -> palette 1
    buf.push(40); // u1 v1 u2 v2
    buf.push(20);
    buf.push(10);
    buf.push(60);
    push_u16(&mut buf, 0); // quad count
    push_u16(&mut buf, 0);
    buf
}

/// 8bpp TIM: 2 palette rows of 4 colors, 2x2 pixels.
fn texture_section() -> Vec<u8> {
    let mut buf = Vec::new();
    push_u32(&mut buf, 0x10);
    push_u32(&mut buf, 0x09);
    push_u32(&mut buf, 12 + 8 * 2); // clut block
    push_u16(&mut buf, 0);
    push_u16(&mut buf, 504);
    push_u16(&mut buf, 4);
    push_u16(&mut buf, 2);
    for c in [0x0000u16, 0x001F, 0x03E0, 0x7C00, 0x7FFF, 0x001F, 0x03E0, 0x7C00] {
        push_u16(&mut buf, c);
    }
    push_u32(&mut buf, 12 + 4); // image block
    push_u16(&mut buf, 384); // VRAM page 6
    push_u16(&mut buf, 0);
    push_u16(&mut buf, 1); // raw width -> 2px
    push_u16(&mut buf, 2);
    buf.extend_from_slice(&[1, 2, 3, 0]);
    buf
}

fn scene_bytes() -> Vec<u8> {
    let sections = [vec![0u8; 8], geometry_section(), texture_section()];
    let count = sections.len() as u32;
    let mut buf = Vec::new();
    push_u32(&mut buf, count);
    let mut offset = 4 + 4 * count;
    for s in &sections {
        push_u32(&mut buf, offset);
        offset += s.len() as u32;
    }
    for s in &sections {
        buf.extend_from_slice(s);
    }
    buf
}

#[test]
fn full_export_produces_the_expected_file_set() {
    let bytes = scene_bytes();
    let scene = sections::decode(&bytes);
    assert!(scene.errors.is_empty(), "{:?}", scene.errors);
    assert!(scene.ground_plane.is_some());
    assert!(scene.texture.is_some());

    let wizard = ExportWizard::new(&scene, "st", DecodeOptions::default());
    let files = wizard
        .run(&mut AutoPlacer)
        .expect("export")
        .expect("not cancelled");

    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["staa", "stac", "stam"]);

    // Skeleton: battle location with one piece and one texture page.
    let skeleton = &files[0].data;
    assert_eq!(skeleton.len(), 52);
    assert_eq!(&skeleton[0..4], &1i32.to_le_bytes());
    assert_eq!(&skeleton[20..24], &1i32.to_le_bytes());
    assert_eq!(&skeleton[24..28], &1i32.to_le_bytes());

    // TEX: header + 4-color palette + full 256x256 index page. The triangle's
    // polygons address CLUT row 1, so the palette comes from that row.
    let tex = &files[1].data;
    assert_eq!(tex.len(), 0xEC + 4 * 4 + 256 * 256);
    // First color of row 1 is 0x7FFF -> opaque white, stored BGRA.
    assert_eq!(&tex[0xEC..0xEC + 4], &[248, 248, 248, 255]);

    // P-file: version word, 3 unique vertices, 1 polygon.
    let model = &files[2].data;
    let word = |i: usize| i32::from_le_bytes([model[i * 4], model[i * 4 + 1], model[i * 4 + 2], model[i * 4 + 3]]);
    assert_eq!(word(0), 1);
    assert_eq!(word(3), 3); // vertices
    assert_eq!(word(8), 3); // edges
    assert_eq!(word(9), 1); // polygons
    assert_eq!(word(12), 1); // one group
}

#[test]
fn exported_files_round_trip_through_disk() {
    let bytes = scene_bytes();
    let scene = sections::decode(&bytes);
    let wizard = ExportWizard::new(&scene, "st", DecodeOptions::default());
    let files = wizard
        .run(&mut AutoPlacer)
        .expect("export")
        .expect("not cancelled");

    let dir = tempfile::tempdir().expect("temp dir");
    for file in &files {
        std::fs::write(dir.path().join(&file.name), &file.data).expect("write output");
    }
    for file in &files {
        let reread = std::fs::read(dir.path().join(&file.name)).expect("read back");
        assert_eq!(reread, file.data, "{}", file.name);
    }
}

#[test]
fn decode_survives_arbitrary_truncation() {
    let bytes = scene_bytes();
    // Any truncation point must produce errors, never a panic.
    for cut in (0..bytes.len()).step_by(7) {
        let scene = sections::decode(&bytes[..cut]);
        if cut < bytes.len() {
            assert!(!scene.errors.is_empty() || scene.table.is_some());
        }
    }
}
