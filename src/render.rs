// Bar rendering using tiny-skia
//
// Fills the bar background with the theme color and draws the four fields
// left to right with fixed padding, vertically centered.

use tiny_skia::PixmapMut;
use tracing::warn;

use crate::fields::DisplayFields;
use crate::text::TextRenderer;
use crate::theme::Theme;

/// Space from the left edge to the first field, in pixels
const LEFT_PADDING: f32 = 6.0;
/// Space between fields
const FIELD_GAP: f32 = 10.0;
/// Field text size
const FONT_SIZE: f32 = 16.0;

/// Draws the bar into an ARGB8888 canvas
pub struct BarRenderer {
    text: TextRenderer,
}

impl BarRenderer {
    pub fn new(text: TextRenderer) -> Self {
        Self { text }
    }

    /// Render the fields over the theme background into `canvas`
    pub fn render(
        &mut self,
        canvas: &mut [u8],
        width: u32,
        height: u32,
        fields: &DisplayFields,
        theme: &Theme,
    ) {
        let Some(mut pixmap) = PixmapMut::from_bytes(canvas, width, height) else {
            warn!(width = %width, height = %height, "Canvas size mismatch, skipping frame");
            return;
        };

        pixmap.fill(theme.background.to_tiny_skia());

        let baseline = self
            .text
            .baseline_for_center(FONT_SIZE, height as f32 / 2.0);
        let color = theme.text.to_array();

        let mut x = LEFT_PADDING;
        for field in fields.in_order() {
            self.text
                .render_text(&mut pixmap, field, x, baseline, FONT_SIZE, color);
            x += self.text.measure_text(field, FONT_SIZE) + FIELD_GAP;
        }
    }
}
