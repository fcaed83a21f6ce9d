//! Periodic update cadence
//!
//! The bar refreshes on a fixed 1-second tick. The clock field refreshes on
//! every tick; network type, download speed, and theme refresh only when
//! the slow gate holds. The gate is the wall-clock modulo check of the
//! original behavior, not a tick counter: it fires on ticks landing in the
//! first second of each 5-second wall-clock window, so it can skip or
//! double-fire when ticks drift across window edges.

use std::time::Duration;

/// Interval between updater ticks
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Interval between battery watcher polls
pub const BATTERY_POLL_INTERVAL: Duration = Duration::from_secs(2);

const SLOW_PERIOD_MS: u64 = 5000;
const SLOW_WINDOW_MS: u64 = 1000;

/// Whether a tick at `now_ms` epoch milliseconds also runs the slow
/// refreshes (network, speed, theme)
pub fn slow_gate(now_ms: u64) -> bool {
    now_ms % SLOW_PERIOD_MS < SLOW_WINDOW_MS
}

/// What one tick refreshed
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateFlags {
    pub clock: bool,
    pub network: bool,
    pub theme: bool,
}

impl UpdateFlags {
    /// Flags for a tick at the given wall-clock time. The clock always
    /// refreshes; the slow fields follow the gate.
    pub fn for_tick(now_ms: u64) -> Self {
        let slow = slow_gate(now_ms);
        Self {
            clock: true,
            network: slow,
            theme: slow,
        }
    }

    pub fn needs_redraw(&self) -> bool {
        self.clock || self.network || self.theme
    }
}
