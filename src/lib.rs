//! Overlay status bar library
//!
//! A persistent Wayland layer-shell bar showing download speed, network
//! type, battery level, and a clock, refreshed on a 1-second cadence.
//! The binary owns the event loop and the surface; this library holds the
//! field state, the platform readers, and the rendering.

pub mod battery;
pub mod control;
pub mod error;
pub mod fields;
pub mod net;
pub mod render;
pub mod surface;
pub mod text;
pub mod theme;
pub mod tick;
pub mod wayland;

// Re-export commonly used types
pub use battery::{BatteryMonitor, BatteryReader};
pub use control::{Acquire, PidFile};
pub use error::{BarError, Result};
pub use fields::DisplayFields;
pub use net::{NetworkKind, RxCounter, SpeedEstimator};
pub use render::BarRenderer;
pub use surface::{OverlaySurface, BAR_HEIGHT, BAR_WIDTH};
pub use text::TextRenderer;
pub use theme::{Color, Theme};
pub use tick::UpdateFlags;
pub use wayland::BufferPool;
