//! Overlay surface lifecycle
//!
//! Exactly one overlay surface exists per running process. Attachment is
//! guarded so a second attach is refused, and detachment takes the handle
//! out of an Option so it is safe after a partial attach or a repeat call.

use smithay_client_toolkit::shell::wlr_layer::LayerSurface;
use tracing::{debug, warn};

use crate::wayland::BufferPool;

/// Bar width in surface units
pub const BAR_WIDTH: u32 = 320;
/// Bar height in surface units
pub const BAR_HEIGHT: u32 = 36;

/// State of the bar's single layer surface
pub struct OverlaySurface {
    layer: Option<LayerSurface>,
    buffer_pool: Option<BufferPool>,
    configured: bool,
}

impl OverlaySurface {
    /// A detached surface slot
    pub fn new() -> Self {
        Self {
            layer: None,
            buffer_pool: None,
            configured: false,
        }
    }

    /// Store the attached layer handle. Returns false (and keeps the
    /// existing surface) if one is already attached.
    pub fn set_attached(&mut self, layer: LayerSurface) -> bool {
        if self.layer.is_some() {
            warn!("Overlay surface already attached, refusing a second one");
            return false;
        }
        self.layer = Some(layer);
        true
    }

    /// Tear the surface down. Safe to call when never attached, after a
    /// partial attach, or repeatedly; the layer surface is destroyed on
    /// drop by the toolkit.
    pub fn detach(&mut self) {
        if let Some(layer) = self.layer.take() {
            debug!("Detaching overlay surface");
            drop(layer);
        }
        self.buffer_pool = None;
        self.configured = false;
    }

    pub fn is_attached(&self) -> bool {
        self.layer.is_some()
    }

    /// The compositor acknowledged the surface geometry
    pub fn mark_configured(&mut self) {
        self.configured = true;
    }

    /// Ready to render: attached and configured
    pub fn is_configured(&self) -> bool {
        self.configured && self.layer.is_some()
    }

    pub fn buffer_pool_mut(&mut self) -> &mut Option<BufferPool> {
        &mut self.buffer_pool
    }

    /// Layer handle and buffer pool together, for the draw path
    pub fn render_parts(&mut self) -> Option<(&LayerSurface, &mut BufferPool)> {
        match (&self.layer, &mut self.buffer_pool) {
            (Some(layer), Some(pool)) => Some((layer, pool)),
            _ => None,
        }
    }
}

impl Default for OverlaySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for OverlaySurface {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detach_when_never_attached() {
        let mut surface = OverlaySurface::new();
        assert!(!surface.is_attached());
        // Must be a no-op, not a crash
        surface.detach();
        surface.detach();
        assert!(!surface.is_attached());
        assert!(!surface.is_configured());
    }

    #[test]
    fn test_configured_requires_attachment() {
        let mut surface = OverlaySurface::new();
        surface.mark_configured();
        // Configure without an attached layer is not renderable
        assert!(!surface.is_configured());
    }

    #[test]
    fn test_fixed_geometry() {
        assert_eq!(BAR_WIDTH, 320);
        assert_eq!(BAR_HEIGHT, 36);
    }
}
