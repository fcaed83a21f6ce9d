//! Network type classification and download speed estimation
//!
//! The speed estimate is the delta of a cumulative received-byte counter
//! over wall-clock time, sampled on the slow update cadence. The first
//! sample establishes a baseline and reports zero.

use std::path::Path;

use sysinfo::Networks;
use tracing::debug;

/// Active network classification, each with a display glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkKind {
    /// Wireless LAN interface is up
    Wifi,
    /// Mobile broadband interface is up
    Cellular,
    /// Some other interface is up (ethernet, bridges, ...)
    Other,
    /// No interface is up
    Disconnected,
}

impl NetworkKind {
    /// Glyph shown in the network field
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Wifi => "📡",
            Self::Cellular => "📶",
            Self::Other => "🌐",
            Self::Disconnected => "❌",
        }
    }

    fn from_interface(name: &str) -> Self {
        if name.starts_with("wl") {
            Self::Wifi
        } else if name.starts_with("wwan") || name.starts_with("ppp") {
            Self::Cellular
        } else {
            Self::Other
        }
    }
}

/// Classify the active network from `/sys/class/net`
pub fn classify_active_network() -> NetworkKind {
    classify_in(Path::new("/sys/class/net"))
}

/// Classify from a sysfs-shaped directory: one subdirectory per interface,
/// each with an `operstate` file. Wifi wins over cellular wins over other.
pub(crate) fn classify_in(base: &Path) -> NetworkKind {
    let Ok(entries) = std::fs::read_dir(base) else {
        return NetworkKind::Disconnected;
    };

    let mut active = NetworkKind::Disconnected;
    for entry in entries.flatten() {
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if name == "lo" {
            continue;
        }

        let operstate = entry.path().join("operstate");
        let up = std::fs::read_to_string(&operstate)
            .map(|s| s.trim() == "up")
            .unwrap_or(false);
        if !up {
            continue;
        }

        match NetworkKind::from_interface(&name) {
            NetworkKind::Wifi => return NetworkKind::Wifi,
            NetworkKind::Cellular => active = NetworkKind::Cellular,
            kind => {
                if active == NetworkKind::Disconnected {
                    active = kind;
                }
            }
        }
    }
    active
}

/// Instantaneous download speed from cumulative byte counter samples
///
/// Holds the last (bytes, timestamp) pair. A sample without a prior
/// baseline, or without time advancement, reports zero.
#[derive(Debug, Default)]
pub struct SpeedEstimator {
    last: Option<(u64, u64)>,
}

impl SpeedEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one counter reading taken at `now_ms` epoch milliseconds and
    /// get the estimated rate in bytes/second.
    ///
    /// The stored sample is updated on every call, including the first.
    /// Counter regressions (interface reset) saturate to a zero delta.
    pub fn sample(&mut self, bytes: u64, now_ms: u64) -> u64 {
        let rate = match self.last {
            Some((last_bytes, last_time_ms)) if now_ms > last_time_ms => {
                let elapsed_ms = now_ms - last_time_ms;
                bytes.saturating_sub(last_bytes) * 1000 / elapsed_ms
            }
            _ => 0,
        };
        self.last = Some((bytes, now_ms));
        rate
    }
}

/// Format a rate in bytes/second with truncating unit division
pub fn format_speed(rate: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if rate < KB {
        format!("{}B", rate)
    } else if rate < MB {
        format!("{}K", rate / KB)
    } else {
        format!("{}M", rate / MB)
    }
}

/// Cumulative received-byte counter over all interfaces
pub struct RxCounter {
    networks: Networks,
}

impl RxCounter {
    pub fn new() -> Self {
        Self {
            networks: Networks::new_with_refreshed_list(),
        }
    }

    /// Total bytes received since boot, summed over all interfaces.
    /// Monotonically non-decreasing short of an interface reset.
    pub fn total_rx_bytes(&mut self) -> u64 {
        self.networks.refresh();
        let mut total = 0;
        for (_name, data) in &self.networks {
            total += data.total_received();
        }
        debug!(total_rx_bytes = %total, "Sampled rx counter");
        total
    }
}

impl Default for RxCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fake_iface(base: &Path, name: &str, operstate: &str) {
        let dir = base.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("operstate"), operstate).unwrap();
    }

    #[test]
    fn test_classify_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(classify_in(dir.path()), NetworkKind::Disconnected);
    }

    #[test]
    fn test_classify_missing_dir() {
        assert_eq!(
            classify_in(Path::new("/nonexistent/sys/class/net")),
            NetworkKind::Disconnected
        );
    }

    #[test]
    fn test_classify_nothing_up() {
        let dir = tempfile::tempdir().unwrap();
        fake_iface(dir.path(), "wlan0", "down");
        fake_iface(dir.path(), "eth0", "down");
        fake_iface(dir.path(), "lo", "unknown");
        assert_eq!(classify_in(dir.path()), NetworkKind::Disconnected);
    }

    #[test]
    fn test_classify_wifi_wins() {
        let dir = tempfile::tempdir().unwrap();
        fake_iface(dir.path(), "eth0", "up");
        fake_iface(dir.path(), "wlp3s0", "up");
        assert_eq!(classify_in(dir.path()), NetworkKind::Wifi);
    }

    #[test]
    fn test_classify_cellular_over_other() {
        let dir = tempfile::tempdir().unwrap();
        fake_iface(dir.path(), "eth0", "up");
        fake_iface(dir.path(), "wwan0", "up");
        assert_eq!(classify_in(dir.path()), NetworkKind::Cellular);
    }

    #[test]
    fn test_classify_ethernet_is_other() {
        let dir = tempfile::tempdir().unwrap();
        fake_iface(dir.path(), "enp0s31f6", "up");
        assert_eq!(classify_in(dir.path()), NetworkKind::Other);
    }

    #[test]
    fn test_loopback_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fake_iface(dir.path(), "lo", "up");
        assert_eq!(classify_in(dir.path()), NetworkKind::Disconnected);
    }

    #[test]
    fn test_glyphs() {
        assert_eq!(NetworkKind::Wifi.glyph(), "📡");
        assert_eq!(NetworkKind::Cellular.glyph(), "📶");
        assert_eq!(NetworkKind::Other.glyph(), "🌐");
        assert_eq!(NetworkKind::Disconnected.glyph(), "❌");
    }

    #[test]
    fn test_first_sample_is_zero() {
        let mut estimator = SpeedEstimator::new();
        assert_eq!(estimator.sample(1_000_000, 5000), 0);
    }

    #[test]
    fn test_rate_from_two_samples() {
        let mut estimator = SpeedEstimator::new();
        assert_eq!(estimator.sample(1000, 0), 0);
        assert_eq!(estimator.sample(2000, 1000), 1000);
    }

    #[test]
    fn test_rate_over_five_seconds() {
        let mut estimator = SpeedEstimator::new();
        estimator.sample(0, 1000);
        // 5120 bytes over 5 seconds = 1024 B/s
        assert_eq!(estimator.sample(5120, 6000), 1024);
    }

    #[test]
    fn test_counter_regression_is_zero() {
        let mut estimator = SpeedEstimator::new();
        estimator.sample(10_000, 1000);
        assert_eq!(estimator.sample(500, 2000), 0);
    }

    #[test]
    fn test_no_time_advance_is_zero() {
        let mut estimator = SpeedEstimator::new();
        estimator.sample(1000, 1000);
        assert_eq!(estimator.sample(9000, 1000), 0);
    }

    #[test]
    fn test_format_speed() {
        assert_eq!(format_speed(0), "0B");
        assert_eq!(format_speed(500), "500B");
        assert_eq!(format_speed(1023), "1023B");
        assert_eq!(format_speed(1024), "1K");
        assert_eq!(format_speed(2048), "2K");
        // Truncating division, no rounding
        assert_eq!(format_speed(2047), "1K");
        assert_eq!(format_speed(3 * 1024 * 1024), "3M");
        assert_eq!(format_speed(1024 * 1024 - 1), "1023K");
    }
}
