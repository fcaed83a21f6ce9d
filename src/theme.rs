//! Day/night theming for the bar
//!
//! The theme is a pure function of the local hour: night between 19:00 and
//! 05:59 inclusive, day otherwise. All four fields share one text color and
//! the bar one background color.

/// RGBA color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Convert to tiny-skia Color
    pub fn to_tiny_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

/// Text and background colors applied uniformly to the bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    /// Color of all four text fields
    pub text: Color,

    /// Bar background color (translucent)
    pub background: Color,
}

impl Theme {
    /// White text on translucent black (0xCC000000)
    pub const fn night() -> Self {
        Self {
            text: Color::rgb(255, 255, 255),
            background: Color::new(0, 0, 0, 204),
        }
    }

    /// Black text on translucent white (0xCCFFFFFF)
    pub const fn day() -> Self {
        Self {
            text: Color::rgb(0, 0, 0),
            background: Color::new(255, 255, 255, 204),
        }
    }

    /// Select the theme for a local hour (0-23)
    pub fn for_hour(hour: u32) -> Self {
        if is_night(hour) {
            Self::night()
        } else {
            Self::day()
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::day()
    }
}

/// Night runs 19:00 through 05:59 inclusive
pub fn is_night(hour: u32) -> bool {
    hour < 6 || hour > 18
}
