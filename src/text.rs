// Text rendering using fontdue
//
// One system sans font, rasterized per draw. The bar is 320x36 and redraws
// at most once a second, so no glyph cache is kept.

use fontdue::{Font, FontSettings};
use tiny_skia::PixmapMut;
use tracing::{debug, warn};

use crate::error::{BarError, Result};

/// Renders single-line text into a pixmap
pub struct TextRenderer {
    font: Font,
}

impl TextRenderer {
    /// Load a sans-serif font via fontconfig, falling back to well-known
    /// distro paths
    pub fn new() -> Result<Self> {
        let font = load_system_font()?;
        Ok(Self { font })
    }

    #[cfg(test)]
    fn from_font(font: Font) -> Self {
        Self { font }
    }

    /// Render `text` with its baseline at `y`
    pub fn render_text(
        &self,
        pixmap: &mut PixmapMut,
        text: &str,
        x: f32,
        y: f32,
        size: f32,
        color: [u8; 4],
    ) {
        let mut cursor_x = x;
        let baseline_y = y as i32;

        for c in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(c, size);

            // fontdue metrics: xmin offsets the bitmap from the cursor,
            // ymin offsets it from the baseline (y-up), so in screen
            // coordinates the bitmap top sits at baseline - ymin - height.
            let glyph_x = cursor_x as i32 + metrics.xmin;
            let glyph_y = baseline_y - metrics.ymin - metrics.height as i32;

            blit_glyph(
                pixmap,
                &bitmap,
                metrics.width,
                metrics.height,
                glyph_x,
                glyph_y,
                color,
            );

            cursor_x += metrics.advance_width;
        }
    }

    /// Advance width of `text` at `size`, for layout
    pub fn measure_text(&self, text: &str, size: f32) -> f32 {
        text.chars()
            .map(|c| self.font.metrics(c, size).advance_width)
            .sum()
    }

    /// Baseline Y that vertically centers text of `size` around `y_center`
    pub fn baseline_for_center(&self, size: f32, y_center: f32) -> f32 {
        match self.font.horizontal_line_metrics(size) {
            Some(metrics) => y_center + (metrics.ascent + metrics.descent) / 2.0,
            None => y_center + size * 0.3,
        }
    }
}

fn load_system_font() -> Result<Font> {
    if let Some(font) = try_fontconfig() {
        return Ok(font);
    }
    if let Some(font) = try_known_paths() {
        return Ok(font);
    }
    Err(BarError::FontDiscovery(
        "install DejaVu Sans, Noto Sans, or Liberation Sans".to_string(),
    ))
}

fn try_fontconfig() -> Option<Font> {
    use std::process::Command;

    let output = Command::new("fc-match")
        .args(["--format=%{file}", "sans"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let path = String::from_utf8(output.stdout).ok()?;
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    try_load_font(path)
}

fn try_known_paths() -> Option<Font> {
    let font_paths = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/noto/NotoSans-Regular.ttf",
        "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    ];

    font_paths.iter().find_map(|path| try_load_font(path))
}

fn try_load_font(path: &str) -> Option<Font> {
    let font_data = std::fs::read(path).ok()?;
    match Font::from_bytes(font_data, FontSettings::default()) {
        Ok(font) => {
            debug!(path = %path, "Loaded font");
            Some(font)
        }
        Err(e) => {
            warn!(path = %path, error = %e, "Failed to parse font");
            None
        }
    }
}

/// Blit a glyph coverage bitmap onto the pixmap with alpha blending
fn blit_glyph(
    pixmap: &mut PixmapMut,
    bitmap: &[u8],
    glyph_width: usize,
    glyph_height: usize,
    x: i32,
    y: i32,
    color: [u8; 4],
) {
    let pixmap_width = pixmap.width() as i32;
    let pixmap_height = pixmap.height() as i32;
    let pixels = pixmap.pixels_mut();

    let color_r = color[0] as f32;
    let color_g = color[1] as f32;
    let color_b = color[2] as f32;
    let color_a_factor = color[3] as f32 / 255.0;

    for gy in 0..glyph_height {
        let py = y + gy as i32;
        if py < 0 || py >= pixmap_height {
            continue;
        }
        let row_start = py * pixmap_width;

        for gx in 0..glyph_width {
            let px = x + gx as i32;
            if px < 0 || px >= pixmap_width {
                continue;
            }

            let coverage = bitmap[gy * glyph_width + gx];
            if coverage == 0 {
                continue;
            }

            let idx = (row_start + px) as usize;
            let pixel = &mut pixels[idx];

            let alpha = (coverage as f32 / 255.0) * color_a_factor;
            let inv_alpha = 1.0 - alpha;
            let dst = pixel.demultiply();

            let new_r = (color_r * alpha + dst.red() as f32 * inv_alpha).clamp(0.0, 255.0) as u8;
            let new_g = (color_g * alpha + dst.green() as f32 * inv_alpha).clamp(0.0, 255.0) as u8;
            let new_b = (color_b * alpha + dst.blue() as f32 * inv_alpha).clamp(0.0, 255.0) as u8;
            let new_a =
                ((alpha + dst.alpha() as f32 / 255.0 * inv_alpha) * 255.0).clamp(0.0, 255.0) as u8;

            *pixel = tiny_skia::PremultipliedColorU8::from_rgba(new_r, new_g, new_b, new_a)
                .unwrap_or(*pixel);
        }
    }
}
