//! TIM indexed-color texture decoder.
//!
//! Binary layout (all little-endian):
//! ```text
//! [4 bytes]  magic (0x10)
//! [4 bytes]  flags: bits 0-1 = bpp mode (0:4, 1:8, 2:16, 3:24), bit 3 = has CLUT
//! CLUT block (if present):
//!     size(4) x(2) y(2) width(2) height(2), then width*height 16-bit colors
//! Image block:
//!     size(4) x(2) y(2) raw_width(2) raw_height(2), then size-12 pixel bytes
//! ```
//!
//! `raw_width` counts 16-bit VRAM words; the pixel width is ×4 at 4bpp and
//! ×2 at 8bpp.

use anyhow::{anyhow, Result};
use serde::Serialize;

use super::reader::SceneReader;

/// Opaque magenta stands in for CLUT entries that don't exist. Reference
/// decoders emit exactly this color, so keep it byte-identical.
const MISSING_CLUT_COLOR: Rgba = Rgba {
    r: 255,
    g: 0,
    b: 255,
    a: 255,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Expand a 15-bit PSX color word. Pure black is transparent.
    pub fn from_psx_word(word: u16) -> Self {
        let r = ((word & 0x1F) << 3) as u8;
        let g = (((word >> 5) & 0x1F) << 3) as u8;
        let b = (((word >> 10) & 0x1F) << 3) as u8;
        let a = if r == 0 && g == 0 && b == 0 { 0 } else { 255 };
        Rgba { r, g, b, a }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Clut {
    pub size: u32,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub colors: Vec<Rgba>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimImage {
    pub size: u32,
    pub x: u16,
    pub y: u16,
    pub raw_width: u16,
    pub raw_height: u16,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimTexture {
    pub magic: u32,
    pub flags: u32,
    pub bpp: u8,
    pub has_clut: bool,
    pub clut: Option<Clut>,
    pub image: TimImage,
    pub pixel_data: Vec<u8>,
}

impl TimTexture {
    /// VRAM page the image starts on (pages are 64 words wide).
    pub fn base_page_x(&self) -> u16 {
        self.image.x / 64
    }

    /// Number of selectable palettes (CLUT rows).
    pub fn palette_count(&self) -> usize {
        self.clut.as_ref().map(|c| c.height as usize).unwrap_or(0)
    }

    /// Rasterize the indexed image through one CLUT palette into flat RGBA
    /// bytes (`width * height * 4`). Returns `None` when there is no CLUT or
    /// no pixel data to index. 16/24bpp payloads yield a zeroed buffer.
    pub fn decode_to_pixels(&self, palette_index: usize) -> Option<Vec<u8>> {
        let clut = self.clut.as_ref()?;
        if self.pixel_data.is_empty() || clut.width == 0 || clut.height == 0 {
            return None;
        }

        let width = self.image.width as usize;
        let height = self.image.height as usize;
        let colors_per_palette = clut.width as usize;
        let num_palettes = clut.height as usize;
        let safe_palette = palette_index.min(num_palettes - 1);
        let palette_start = safe_palette * colors_per_palette;

        let mut pixels = vec![0u8; width * height * 4];
        let raw_row = self.image.raw_width as usize * 2;

        let mut put = |x: usize, y: usize, color_index: usize| {
            let clut_idx = palette_start + (color_index % colors_per_palette);
            let color = clut
                .colors
                .get(clut_idx)
                .copied()
                .unwrap_or(MISSING_CLUT_COLOR);
            let dst = (y * width + x) * 4;
            pixels[dst] = color.r;
            pixels[dst + 1] = color.g;
            pixels[dst + 2] = color.b;
            pixels[dst + 3] = color.a;
        };

        match self.bpp {
            8 => {
                for y in 0..height {
                    for x in 0..width {
                        let src = y * raw_row + x;
                        if let Some(&byte) = self.pixel_data.get(src) {
                            put(x, y, byte as usize);
                        }
                    }
                }
            }
            4 => {
                for y in 0..height {
                    for x in 0..width {
                        let src = y * raw_row + x / 2;
                        if let Some(&byte) = self.pixel_data.get(src) {
                            let nibble = if x % 2 == 0 { byte & 0x0F } else { byte >> 4 };
                            put(x, y, nibble as usize);
                        }
                    }
                }
            }
            // Direct-color depths are parsed but never rasterized.
            _ => {}
        }

        Some(pixels)
    }

    /// Rasterize every palette row, in CLUT order.
    pub fn decode_all_palettes(&self) -> Vec<Option<Vec<u8>>> {
        let count = self.palette_count().max(1);
        (0..count).map(|i| self.decode_to_pixels(i)).collect()
    }
}

/// Decode a TIM texture section starting at the reader's current position.
pub fn decode_tim(r: &mut SceneReader) -> Result<TimTexture> {
    let magic = r.read_u32()?;
    let flags = r.read_u32()?;

    let bpp = match flags & 0x3 {
        0 => 4,
        1 => 8,
        2 => 16,
        _ => 24,
    };
    let has_clut = (flags >> 3) & 1 == 1;

    let clut = if has_clut {
        let size = r.read_u32()?;
        let x = r.read_u16()?;
        let y = r.read_u16()?;
        let width = r.read_u16()?;
        let height = r.read_u16()?;

        let color_count = width as usize * height as usize;
        let mut colors = Vec::with_capacity(color_count);
        for _ in 0..color_count {
            colors.push(Rgba::from_psx_word(r.read_u16()?));
        }

        Some(Clut {
            size,
            x,
            y,
            width,
            height,
            colors,
        })
    } else {
        None
    };

    let size = r.read_u32()?;
    let x = r.read_u16()?;
    let y = r.read_u16()?;
    let raw_width = r.read_u16()?;
    let raw_height = r.read_u16()?;

    let width = match bpp {
        4 => raw_width as u32 * 4,
        8 => raw_width as u32 * 2,
        _ => raw_width as u32,
    };

    let pixel_len = size
        .checked_sub(12)
        .ok_or_else(|| anyhow!("TIM image block size {} is smaller than its header", size))?;
    let pixel_data = r.read_bytes(pixel_len as usize)?.to_vec();

    Ok(TimTexture {
        magic,
        flags,
        bpp,
        has_clut,
        clut,
        image: TimImage {
            size,
            x,
            y,
            raw_width,
            raw_height,
            width,
            height: raw_height as u32,
        },
        pixel_data,
    })
}
