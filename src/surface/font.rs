//! TrueType text rasterisation onto the capture canvas using fontdue

use anyhow::{Context, Result};
use fontdue::{Font, FontSettings};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::Canvas;

/// Fonts tried when no font is configured
const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
];

/// Horizontal extent and vertical metrics of a laid-out string
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextExtent {
    pub width: f32,
    pub ascent: f32,
    pub descent: f32,
}

#[derive(Debug)]
pub struct FontRenderer {
    font: Font,
}

impl FontRenderer {
    /// Load a TrueType font from a file path
    pub fn from_path(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading font");

        let font_data =
            fs::read(path).with_context(|| format!("Failed to read font file: {}", path.display()))?;

        let font = Font::from_bytes(font_data, FontSettings::default())
            .map_err(|e| anyhow::anyhow!("Failed to parse font {}: {}", path.display(), e))?;

        info!(path = %path.display(), "Loaded font");
        Ok(Self { font })
    }

    /// Load the configured font, else the first usable well-known system font
    pub fn from_system_font(configured: Option<&Path>) -> Result<Self> {
        if let Some(path) = configured {
            match Self::from_path(path) {
                Ok(renderer) => return Ok(renderer),
                Err(e) => warn!(path = %path.display(), error = %e, "Configured font unusable, trying system fonts"),
            }
        }

        for path in SYSTEM_FONT_PATHS {
            if let Ok(renderer) = Self::from_path(&PathBuf::from(path)) {
                return Ok(renderer);
            }
        }

        Err(anyhow::anyhow!(
            "Could not find any usable font. Tried configured path ({:?}) and {:?}",
            configured,
            SYSTEM_FONT_PATHS
        ))
    }

    pub fn measure(&self, text: &str, size: f32) -> TextExtent {
        let mut width = 0.0f32;
        let mut ascent = 0.0f32;
        let mut descent = 0.0f32;

        for ch in text.chars() {
            let metrics = self.font.metrics(ch, size);
            width += metrics.advance_width;
            ascent = ascent.max((metrics.height as i32 + metrics.ymin) as f32);
            descent = descent.max(-metrics.ymin as f32);
        }

        TextExtent { width, ascent, descent }
    }

    /// Draw `text` with its baseline at `baseline`, starting at `x`; returns the advance
    pub fn draw(&self, canvas: &mut Canvas, x: f32, baseline: f32, text: &str, size: f32, color: [u8; 4]) -> f32 {
        let mut pen = x;

        for ch in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(ch, size);
            let left = pen.round() as i64 + i64::from(metrics.xmin);
            let top = baseline.round() as i64 - (metrics.height as i64 + i64::from(metrics.ymin));

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let coverage = bitmap[gy * metrics.width + gx];
                    if coverage > 0 {
                        canvas.blend(left + gx as i64, top + gy as i64, color, coverage);
                    }
                }
            }
            pen += metrics.advance_width;
        }

        pen - x
    }
}
