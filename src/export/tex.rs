//! PC TEX texture page writer.
//!
//! Layout: a 0xEC-byte header of fixed engine constants, `colors_per_palette`
//! BGRA palette entries lifted from the source CLUT, then 256×256 raw index
//! bytes. Index bytes are copied straight from the TIM payload — they address
//! the same palette at runtime that they addressed on the PSX.

use super::TextureRegion;
use crate::scene::tim::TimTexture;

pub const TEX_WIDTH: usize = 256;
pub const TEX_HEIGHT: usize = 256;
const HEADER_SIZE: usize = 0xEC;
const DEFAULT_COLORS_PER_PALETTE: usize = 256;

fn write_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn write_zero_words(buf: &mut Vec<u8>, n: usize) {
    buf.extend(std::iter::repeat(0u8).take(n * 4));
}

/// Fixed header constants, documented by offset in the reference layout.
/// Only the colors-per-palette words (0x34, 0x58, 0x5C) vary.
fn write_header(buf: &mut Vec<u8>, colors_per_palette: u32) {
    write_u32(buf, 1); // 0x00 version
    write_zero_words(buf, 3); // 0x04 unknown, color key flag, 0x0C
    write_u32(buf, 3); // 0x10
    write_u32(buf, 4); // 0x14 min bits per color
    write_u32(buf, 8); // 0x18 max bits per color
    write_u32(buf, 0); // 0x1C min alpha bits
    write_u32(buf, 8); // 0x20 max alpha bits
    write_u32(buf, 8); // 0x24 min bpp
    write_u32(buf, 0x20); // 0x28 max bpp
    write_u32(buf, 0); // 0x2C
    write_u32(buf, 1); // 0x30 palette count
    write_u32(buf, colors_per_palette); // 0x34
    write_u32(buf, 8); // 0x38 bit depth
    write_u32(buf, TEX_WIDTH as u32); // 0x3C
    write_u32(buf, TEX_HEIGHT as u32); // 0x40
    write_u32(buf, 0); // 0x44 pitch
    write_u32(buf, 0); // 0x48
    write_u32(buf, 1); // 0x4C palette flag
    write_u32(buf, 8); // 0x50 bits per index
    write_u32(buf, 0); // 0x54 indexed-to-8bit flag
    write_u32(buf, colors_per_palette); // 0x58 palette size
    write_u32(buf, colors_per_palette); // 0x5C
    write_u32(buf, 0); // 0x60 runtime
    write_u32(buf, 8); // 0x64 bits per pixel
    write_u32(buf, 1); // 0x68 bytes per pixel
    write_zero_words(buf, 20); // 0x6C..=0xB8
    write_u32(buf, 0); // 0xBC color key array flag
    write_u32(buf, 0); // 0xC0 runtime
    write_u32(buf, 0xFF); // 0xC4 reference alpha
    write_u32(buf, 4); // 0xC8
    write_u32(buf, 1); // 0xCC
    write_zero_words(buf, 7); // 0xD0..=0xE8
}

/// Build one TEX page for a slot. `region` selects the source rectangle to
/// resample; pixels past the region's extent replicate its last row/column.
/// Without a region the source image is copied 1:1 into the top-left.
///
/// A missing texture or CLUT degrades to zero-filled palette/pixel bytes —
/// the file stays structurally valid.
pub fn build_tex_file(
    texture: Option<&TimTexture>,
    palette_index: u8,
    region: Option<&TextureRegion>,
) -> Vec<u8> {
    let clut = texture.and_then(|t| t.clut.as_ref());
    let colors_per_palette = clut
        .map(|c| c.width as usize)
        .unwrap_or(DEFAULT_COLORS_PER_PALETTE);

    let mut buf =
        Vec::with_capacity(HEADER_SIZE + colors_per_palette * 4 + TEX_WIDTH * TEX_HEIGHT);
    write_header(&mut buf, colors_per_palette as u32);

    match clut {
        Some(clut) => {
            let palette_start = palette_index as usize * colors_per_palette;
            for i in 0..colors_per_palette {
                match clut.colors.get(palette_start + i) {
                    Some(c) => buf.extend_from_slice(&[c.b, c.g, c.r, c.a]),
                    None => buf.extend_from_slice(&[0, 0, 0, 255]),
                }
            }
        }
        None => buf.extend(std::iter::repeat(0u8).take(colors_per_palette * 4)),
    }

    let mut pixels = vec![0u8; TEX_WIDTH * TEX_HEIGHT];
    if let Some(texture) = texture {
        resample_pixels(&mut pixels, texture, region);
    }
    buf.extend_from_slice(&pixels);
    buf
}

fn resample_pixels(pixels: &mut [u8], texture: &TimTexture, region: Option<&TextureRegion>) {
    let src_raw_width = texture.image.raw_width as usize * 2;
    let src_width = texture.image.width as i32;
    let src_height = texture.image.height as i32;
    let data = &texture.pixel_data;

    match region {
        Some(region) => {
            let rw = region.width as i32;
            let rh = region.height as i32;
            for y in 0..TEX_HEIGHT as i32 {
                for x in 0..TEX_WIDTH as i32 {
                    // Edge-replicate: coordinates past the region extent pin
                    // to its last column/row.
                    let sx = region.x + x.min(rw - 1);
                    let sy = region.y + y.min(rh - 1);
                    if sx >= 0 && sx < src_width && sy >= 0 && sy < src_height {
                        let src = sy as usize * src_raw_width + sx as usize;
                        if let Some(&b) = data.get(src) {
                            pixels[y as usize * TEX_WIDTH + x as usize] = b;
                        }
                    }
                }
            }
        }
        None => {
            for y in 0..TEX_HEIGHT as i32 {
                for x in 0..TEX_WIDTH as i32 {
                    if x < src_width && y < src_height {
                        let src = y as usize * src_raw_width + x as usize;
                        if let Some(&b) = data.get(src) {
                            pixels[y as usize * TEX_WIDTH + x as usize] = b;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::tim::{Clut, Rgba, TimImage};

    fn test_texture(width_px: u16, height: u16, pixel_data: Vec<u8>) -> TimTexture {
        TimTexture {
            magic: 0x10,
            flags: 0x09,
            bpp: 8,
            has_clut: true,
            clut: Some(Clut {
                size: 0,
                x: 0,
                y: 504,
                width: 4,
                height: 2,
                colors: vec![
                    Rgba { r: 8, g: 16, b: 24, a: 255 },
                    Rgba { r: 0, g: 0, b: 0, a: 0 },
                    Rgba { r: 248, g: 0, b: 0, a: 255 },
                    Rgba { r: 0, g: 248, b: 0, a: 255 },
                    // second palette row
                    Rgba { r: 1, g: 2, b: 3, a: 255 },
                    Rgba { r: 4, g: 5, b: 6, a: 255 },
                    Rgba { r: 7, g: 8, b: 9, a: 255 },
                    Rgba { r: 10, g: 11, b: 12, a: 255 },
                ],
            }),
            image: TimImage {
                size: 0,
                x: 384,
                y: 0,
                raw_width: width_px / 2,
                raw_height: height,
                width: width_px as u32,
                height: height as u32,
            },
            pixel_data,
        }
    }

    fn pixel_at(buf: &[u8], colors: usize, x: usize, y: usize) -> u8 {
        buf[HEADER_SIZE + colors * 4 + y * TEX_WIDTH + x]
    }

    #[test]
    fn file_size_is_header_palette_and_page() {
        let tex = test_texture(2, 2, vec![0, 1, 2, 3]);
        let buf = build_tex_file(Some(&tex), 0, None);
        assert_eq!(buf.len(), HEADER_SIZE + 4 * 4 + TEX_WIDTH * TEX_HEIGHT);
        assert_eq!(&buf[0x00..0x04], &1u32.to_le_bytes());
        assert_eq!(&buf[0x34..0x38], &4u32.to_le_bytes());
        assert_eq!(&buf[0xC4..0xC8], &0xFFu32.to_le_bytes());
    }

    #[test]
    fn palette_entries_are_bgra_from_the_selected_row() {
        let tex = test_texture(2, 2, vec![0, 1, 2, 3]);
        let buf = build_tex_file(Some(&tex), 1, None);
        // First color of palette row 1: r=1 g=2 b=3 -> stored b,g,r,a
        assert_eq!(&buf[HEADER_SIZE..HEADER_SIZE + 4], &[3, 2, 1, 255]);
    }

    #[test]
    fn unregioned_copy_lands_top_left_rest_zero() {
        let tex = test_texture(2, 2, vec![9, 8, 7, 6]);
        let buf = build_tex_file(Some(&tex), 0, None);
        assert_eq!(pixel_at(&buf, 4, 0, 0), 9);
        assert_eq!(pixel_at(&buf, 4, 1, 0), 8);
        assert_eq!(pixel_at(&buf, 4, 0, 1), 7);
        assert_eq!(pixel_at(&buf, 4, 1, 1), 6);
        assert_eq!(pixel_at(&buf, 4, 2, 0), 0);
        assert_eq!(pixel_at(&buf, 4, 200, 200), 0);
    }

    #[test]
    fn region_resample_replicates_edges() {
        // 4x4 source, region covering the 2x2 top-left corner.
        let mut data = vec![0u8; 16];
        data[0] = 1;
        data[1] = 2;
        data[4] = 3;
        data[5] = 4;
        let tex = test_texture(4, 4, data);
        let region = TextureRegion {
            x: 0,
            y: 0,
            width: 2,
            height: 2,
        };
        let buf = build_tex_file(Some(&tex), 0, Some(&region));
        assert_eq!(pixel_at(&buf, 4, 0, 0), 1);
        assert_eq!(pixel_at(&buf, 4, 1, 1), 4);
        // Beyond the region extent: last column/row replicate.
        assert_eq!(pixel_at(&buf, 4, 2, 0), 2);
        assert_eq!(pixel_at(&buf, 4, 0, 2), 3);
        assert_eq!(pixel_at(&buf, 4, 255, 255), 4);
    }

    #[test]
    fn missing_texture_yields_zero_filled_page() {
        let buf = build_tex_file(None, 0, None);
        assert_eq!(
            buf.len(),
            HEADER_SIZE + DEFAULT_COLORS_PER_PALETTE * 4 + TEX_WIDTH * TEX_HEIGHT
        );
        assert!(buf[HEADER_SIZE..].iter().all(|&b| b == 0));
    }

    #[test]
    fn missing_palette_entries_encode_opaque_black() {
        let mut tex = test_texture(2, 2, vec![0, 0, 0, 0]);
        tex.clut.as_mut().unwrap().colors.truncate(5);
        let buf = build_tex_file(Some(&tex), 1, None);
        // Palette row 1 starts at color 4; entries 5..8 are missing.
        assert_eq!(&buf[HEADER_SIZE..HEADER_SIZE + 4], &[3, 2, 1, 255]);
        assert_eq!(&buf[HEADER_SIZE + 4..HEADER_SIZE + 8], &[0, 0, 0, 255]);
    }
}
