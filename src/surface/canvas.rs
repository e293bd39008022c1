//! RGBA drawing buffer for off-screen and mini-control captures

use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, warn};

use super::markup;
use super::{ClockLayout, FontRenderer, TextExtent};
use crate::constants::{face, layout, validation};
use crate::render::palette_rgba;

const BACKGROUND: [u8; 4] = [0x00, 0x00, 0x00, 0xFF];

pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl Canvas {
    /// Opaque black buffer of `width` x `height`
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 || width > validation::MAX_DIMENSION || height > validation::MAX_DIMENSION {
            return Err(anyhow!("Invalid canvas size {}x{}", width, height));
        }
        let mut canvas = Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        };
        canvas.fill(BACKGROUND);
        Ok(canvas)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }

    pub fn fill(&mut self, color: [u8; 4]) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
    }

    /// Source-over blend of `color` scaled by `coverage`; out-of-bounds writes are dropped
    pub fn blend(&mut self, x: i64, y: i64, color: [u8; 4], coverage: u8) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let alpha = u32::from(color[3]) * u32::from(coverage) / 255;
        let inv = 255 - alpha;

        for c in 0..3 {
            let dst = u32::from(self.pixels[i + c]);
            self.pixels[i + c] = ((u32::from(color[c]) * alpha + dst * inv) / 255) as u8;
        }
        let dst_a = u32::from(self.pixels[i + 3]);
        self.pixels[i + 3] = (alpha + dst_a * inv / 255).min(255) as u8;
    }

    /// Rasterise the clock layout: optional date line above the time textblock
    pub fn draw_layout(&mut self, face_layout: &ClockLayout, font: Option<&FontRenderer>) {
        self.fill(BACKGROUND);

        let Some(font) = font else {
            warn!("No font available, capture contains background only");
            return;
        };

        let height = self.height as f32;
        let date = face_layout
            .part_text(layout::PART_DATE)
            .filter(|text| face_layout.date_visible() && !text.is_empty());

        if let Some(date) = date {
            let color = palette_rgba(face_layout.date_color_index());
            let extent = font.measure(date, face::FONT_SIZE_DATE);
            let x = (self.width as f32 - extent.width) / 2.0;
            font.draw(self, x, height * 0.3, date, face::FONT_SIZE_DATE, color);
        }

        if let Some(markup_text) = face_layout.part_text(layout::PART_TIME) {
            let runs = markup::parse(markup_text, palette_rgba(crate::render::DEFAULT_COLOR_INDEX));
            let extents: Vec<TextExtent> = runs
                .iter()
                .map(|run| font.measure(&run.text, run.size.unwrap_or(face::FONT_SIZE_TIME)))
                .collect();
            let total: f32 = extents.iter().map(|e| e.width).sum();

            let time_baseline = if date.is_some() {
                height * 0.62
            } else {
                // Center the inked box of the tallest run
                let ascent = extents.iter().map(|e| e.ascent).fold(0.0, f32::max);
                let descent = extents.iter().map(|e| e.descent).fold(0.0, f32::max);
                (height + ascent - descent) / 2.0
            };

            let mut x = (self.width as f32 - total) / 2.0;
            for run in &runs {
                let size = run.size.unwrap_or(face::FONT_SIZE_TIME);
                x += font.draw(self, x, time_baseline, &run.text, size, run.color);
            }
            debug!(runs = runs.len(), width = total, baseline = time_baseline, "Time textblock drawn");
        }
    }

    /// Encode as an 8-bit RGBA PNG
    pub fn write_png(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create capture file: {}", path.display()))?;
        let writer = BufWriter::new(file);

        let mut encoder = png::Encoder::new(writer, self.width, self.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Fast);

        let mut png_writer = encoder
            .write_header()
            .with_context(|| format!("Failed to write PNG header: {}", path.display()))?;
        png_writer
            .write_image_data(&self.pixels)
            .with_context(|| format!("Failed to write PNG data: {}", path.display()))?;
        png_writer
            .finish()
            .with_context(|| format!("Failed to finish PNG: {}", path.display()))?;
        Ok(())
    }
}
