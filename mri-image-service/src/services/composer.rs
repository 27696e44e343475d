//! Side-by-side "MRI + mask" composite.

use crate::config::RenderConfig;
use crate::services::caption::{self, Region, GLYPH_SIZE};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use service_core::error::AppError;
use std::io::Cursor;

pub const MRI_CAPTION: &str = "MRI del cerebro";

const MARGIN: u32 = 16;
const CAPTION_PADDING: u32 = 6;
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

/// Caption shown above the mask panel.
pub fn mask_caption(mask_label: &str) -> String {
    format!("Máscara - {}", mask_label)
}

/// Encoded composite plus the captions drawn into it.
#[derive(Debug, Clone)]
pub struct Composite {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub right_caption: String,
}

#[derive(Debug, Clone)]
pub struct CompositeRenderer {
    panel_size: u32,
    caption_scale: u32,
}

impl CompositeRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            panel_size: config.panel_size.max(1),
            caption_scale: config.caption_scale.max(1),
        }
    }

    fn caption_height(&self) -> u32 {
        GLYPH_SIZE * self.caption_scale + 2 * CAPTION_PADDING
    }

    /// Output dimensions, independent of the source images.
    pub fn canvas_size(&self) -> (u32, u32) {
        (
            3 * MARGIN + 2 * self.panel_size,
            2 * MARGIN + self.caption_height() + self.panel_size,
        )
    }

    /// Top-left corner of the image area of panel `slot` (0 = left, 1 = right).
    pub fn panel_origin(&self, slot: u32) -> (u32, u32) {
        (
            MARGIN + slot * (self.panel_size + MARGIN),
            MARGIN + self.caption_height(),
        )
    }

    /// Draws both images and their captions onto a fresh canvas.
    pub fn compose(&self, mri: &DynamicImage, mask: &DynamicImage, mask_label: &str) -> RgbImage {
        let (width, height) = self.canvas_size();
        let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);

        self.draw_panel(&mut canvas, 0, mri, FilterType::Triangle, MRI_CAPTION);
        // Nearest keeps mask edges hard instead of blending them into grey
        self.draw_panel(
            &mut canvas,
            1,
            mask,
            FilterType::Nearest,
            &mask_caption(mask_label),
        );

        canvas
    }

    fn draw_panel(
        &self,
        canvas: &mut RgbImage,
        slot: u32,
        source: &DynamicImage,
        filter: FilterType,
        caption_text: &str,
    ) {
        let (x0, y0) = self.panel_origin(slot);
        let fitted = fit_to_square(&source.to_rgb8(), self.panel_size, filter);
        let dx = (self.panel_size - fitted.width()) / 2;
        let dy = (self.panel_size - fitted.height()) / 2;
        imageops::overlay(canvas, &fitted, i64::from(x0 + dx), i64::from(y0 + dy));

        let caption_region = Region {
            x: x0,
            y: MARGIN + CAPTION_PADDING,
            width: self.panel_size,
            height: GLYPH_SIZE * self.caption_scale,
        };
        caption::draw_centered(canvas, caption_text, caption_region, self.caption_scale, INK);
    }

    /// Composes and PNG-encodes.
    pub fn render(
        &self,
        mri: &DynamicImage,
        mask: &DynamicImage,
        mask_label: &str,
    ) -> Result<Composite, AppError> {
        let canvas = self.compose(mri, mask, mask_label);
        let png = encode_png(&canvas)?;

        Ok(Composite {
            png,
            width: canvas.width(),
            height: canvas.height(),
            right_caption: mask_caption(mask_label),
        })
    }
}

/// Scales `image` to fit a `size` x `size` square, keeping its aspect ratio.
fn fit_to_square(image: &RgbImage, size: u32, filter: FilterType) -> RgbImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return RgbImage::new(1, 1);
    }
    let scale = f64::from(size) / f64::from(w.max(h));
    let nw = ((f64::from(w) * scale).round() as u32).clamp(1, size);
    let nh = ((f64::from(h) * scale).round() as u32).clamp(1, size);

    if (nw, nh) == (w, h) {
        image.clone()
    } else {
        imageops::resize(image, nw, nh, filter)
    }
}

/// Decodes a source image, guessing its format from the bytes.
pub fn decode(what: &str, bytes: &[u8]) -> Result<DynamicImage, AppError> {
    image::load_from_memory(bytes)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to decode {}: {}", what, e)))
}

pub fn encode_png(canvas: &RgbImage) -> Result<Vec<u8>, AppError> {
    let mut buffer = Cursor::new(Vec::new());
    canvas
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to encode PNG: {}", e)))?;
    Ok(buffer.into_inner())
}
