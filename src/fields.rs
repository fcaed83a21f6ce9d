//! Display field state for the bar
//!
//! Four independently overwritten strings, rendered left to right in
//! declaration order. Each field is refreshed on its own cadence and keeps
//! its last value between refreshes.

use chrono::{DateTime, Local, Timelike};

use crate::net::NetworkKind;

/// The four text fields shown on the bar
#[derive(Debug, Clone)]
pub struct DisplayFields {
    /// Download speed, e.g. "12K"
    pub speed: String,
    /// Network type glyph
    pub network: String,
    /// Battery glyph + percent, empty until the first battery reading
    pub battery: String,
    /// Local time, HH:mm
    pub clock: String,
}

impl DisplayFields {
    pub fn new() -> Self {
        Self {
            speed: "0B".to_string(),
            network: NetworkKind::Disconnected.glyph().to_string(),
            battery: String::new(),
            clock: format_clock(&Local::now()),
        }
    }

    /// Fields in display order, skipping empty ones
    pub fn in_order(&self) -> impl Iterator<Item = &str> {
        [
            self.speed.as_str(),
            self.network.as_str(),
            self.battery.as_str(),
            self.clock.as_str(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
    }
}

impl Default for DisplayFields {
    fn default() -> Self {
        Self::new()
    }
}

/// 24-hour clock string for the clock field
pub fn format_clock(time: &DateTime<Local>) -> String {
    time.format("%H:%M").to_string()
}

/// Local hour of day, 0-23, for theme selection
pub fn local_hour(time: &DateTime<Local>) -> u32 {
    time.hour()
}
