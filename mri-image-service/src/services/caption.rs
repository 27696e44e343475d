//! Bitmap text for panel captions.
//!
//! Glyphs come from the 8x8 `font8x8` tables (ASCII plus Latin-1, so accented
//! Spanish captions render). Characters outside both tables draw as `?`.

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Rgb, RgbImage};

pub const GLYPH_SIZE: u32 = 8;

/// Axis-aligned rectangle used to clip drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Width in pixels of `text` drawn at `scale`.
pub fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * GLYPH_SIZE * scale
}

/// Draws `text` horizontally centered in `region`, starting at its top edge.
/// Anything that would fall outside `region` or the canvas is dropped.
pub fn draw_centered(canvas: &mut RgbImage, text: &str, region: Region, scale: u32, color: Rgb<u8>) {
    let width = text_width(text, scale);
    let x = region.x + region.width.saturating_sub(width) / 2;
    draw_text(canvas, text, x, region.y, scale, color, region);
}

pub fn draw_text(
    canvas: &mut RgbImage,
    text: &str,
    x: u32,
    y: u32,
    scale: u32,
    color: Rgb<u8>,
    clip: Region,
) {
    let (canvas_w, canvas_h) = canvas.dimensions();
    let advance = GLYPH_SIZE * scale;

    for (i, c) in text.chars().enumerate() {
        let origin_x = x + i as u32 * advance;
        if origin_x >= clip.x + clip.width {
            break;
        }

        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                // font8x8 stores the leftmost pixel in the least significant bit
                if bits & (1 << col) == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let px = origin_x + col * scale + dx;
                        let py = y + row as u32 * scale + dy;
                        if px < canvas_w && py < canvas_h && clip.contains(px, py) {
                            canvas.put_pixel(px, py, color);
                        }
                    }
                }
            }
        }
    }
}
