//! Battery level monitoring via /sys/class/power_supply
//!
//! The monitor is change-driven: `poll` reads the current level but only
//! delivers a value when it differs from the last delivery (the first poll
//! always delivers). The glyph table intentionally maps the top four
//! thresholds to the same glyph, preserved from the original display
//! behavior.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Glyph for a battery percentage, by threshold
pub fn glyph_for(percent: u8) -> &'static str {
    if percent >= 90 {
        return "🔋";
    }
    if percent >= 70 {
        return "🔋";
    }
    if percent >= 50 {
        return "🔋";
    }
    if percent >= 20 {
        return "🔋";
    }
    "🪫"
}

/// Percentage from a raw level/scale pair, rounded and clamped to 0-100
pub fn percent_from(level: u64, scale: u64) -> u8 {
    if scale == 0 {
        return 0;
    }
    let percent = (level as f64 / scale as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

/// Battery field content: glyph, percent, percent sign
pub fn format_battery(percent: u8) -> String {
    format!("{}{}%", glyph_for(percent), percent)
}

/// Reads the battery level from sysfs
pub struct BatteryReader {
    battery_path: Option<PathBuf>,
}

impl BatteryReader {
    /// Discover the first battery under /sys/class/power_supply
    pub fn new() -> Self {
        Self {
            battery_path: find_battery(Path::new("/sys/class/power_supply")),
        }
    }

    /// Use a specific battery directory (also used by tests)
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            battery_path: Some(path),
        }
    }

    /// Current charge percentage, or None when no battery is present or
    /// the sysfs files are unreadable
    pub fn read_percent(&self) -> Option<u8> {
        let base = self.battery_path.as_deref()?;

        // Prefer raw level/scale pairs; fall back to the kernel's own
        // percentage in `capacity`.
        for (level_file, scale_file) in [
            ("charge_now", "charge_full"),
            ("energy_now", "energy_full"),
        ] {
            if let (Some(level), Some(scale)) =
                (read_u64(base, level_file), read_u64(base, scale_file))
            {
                return Some(percent_from(level, scale));
            }
        }

        match read_u64(base, "capacity") {
            Some(capacity) => Some(capacity.min(100) as u8),
            None => {
                warn!(path = ?base, "Failed to read battery level");
                None
            }
        }
    }
}

impl Default for BatteryReader {
    fn default() -> Self {
        Self::new()
    }
}

fn find_battery(power_supply: &Path) -> Option<PathBuf> {
    if !power_supply.exists() {
        debug!(path = ?power_supply, "Power supply directory does not exist");
        return None;
    }

    // BAT0, BAT1, ... first
    for i in 0..10 {
        let bat_path = power_supply.join(format!("BAT{}", i));
        if bat_path.exists() {
            debug!(path = ?bat_path, "Found battery");
            return Some(bat_path);
        }
    }

    // Then any entry with "bat" in the name
    if let Ok(entries) = fs::read_dir(power_supply) {
        for entry in entries.flatten() {
            let path = entry.path();
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.to_lowercase().contains("bat") {
                    debug!(path = ?path, "Found battery");
                    return Some(path);
                }
            }
        }
    }

    debug!("No battery found");
    None
}

fn read_u64(base: &Path, filename: &str) -> Option<u64> {
    fs::read_to_string(base.join(filename))
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
}

/// Delivers battery level changes, like a sticky change notification:
/// the first poll always fires, later polls fire only on a new value.
pub struct BatteryMonitor {
    reader: BatteryReader,
    last_delivered: Option<u8>,
}

impl BatteryMonitor {
    pub fn new(reader: BatteryReader) -> Self {
        Self {
            reader,
            last_delivered: None,
        }
    }

    /// Read the level and return it if it changed since the last delivery
    pub fn poll(&mut self) -> Option<u8> {
        let percent = self.reader.read_percent()?;
        if self.last_delivered == Some(percent) {
            return None;
        }
        debug!(percent = %percent, "Battery level changed");
        self.last_delivered = Some(percent);
        Some(percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_battery(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    #[test]
    fn test_percent_from_level_and_scale() {
        assert_eq!(percent_from(50, 100), 50);
        assert_eq!(percent_from(0, 100), 0);
        assert_eq!(percent_from(100, 100), 100);
        // Rounded, not truncated
        assert_eq!(percent_from(1, 3), 33);
        assert_eq!(percent_from(2, 3), 67);
    }

    #[test]
    fn test_percent_from_degenerate_inputs() {
        assert_eq!(percent_from(50, 0), 0);
        // Level above scale clamps to 100
        assert_eq!(percent_from(150, 100), 100);
    }

    #[test]
    fn test_glyph_thresholds() {
        // The top four thresholds share a glyph; only "low" differs.
        assert_eq!(glyph_for(100), "🔋");
        assert_eq!(glyph_for(90), "🔋");
        assert_eq!(glyph_for(70), "🔋");
        assert_eq!(glyph_for(50), "🔋");
        assert_eq!(glyph_for(20), "🔋");
        assert_eq!(glyph_for(19), "🪫");
        assert_eq!(glyph_for(0), "🪫");
    }

    #[test]
    fn test_format_battery() {
        assert_eq!(format_battery(85), "🔋85%");
        assert_eq!(format_battery(10), "🪫10%");
    }

    #[test]
    fn test_read_percent_from_charge_pair() {
        let dir = fake_battery(&[("charge_now", "1500000\n"), ("charge_full", "3000000\n")]);
        let reader = BatteryReader::with_path(dir.path().to_path_buf());
        assert_eq!(reader.read_percent(), Some(50));
    }

    #[test]
    fn test_read_percent_from_energy_pair() {
        let dir = fake_battery(&[("energy_now", "30000000\n"), ("energy_full", "40000000\n")]);
        let reader = BatteryReader::with_path(dir.path().to_path_buf());
        assert_eq!(reader.read_percent(), Some(75));
    }

    #[test]
    fn test_read_percent_capacity_fallback() {
        let dir = fake_battery(&[("capacity", "42\n")]);
        let reader = BatteryReader::with_path(dir.path().to_path_buf());
        assert_eq!(reader.read_percent(), Some(42));
    }

    #[test]
    fn test_read_percent_no_battery() {
        let reader = BatteryReader {
            battery_path: None,
        };
        assert_eq!(reader.read_percent(), None);
    }

    #[test]
    fn test_monitor_delivers_on_change_only() {
        let dir = fake_battery(&[("capacity", "80\n")]);
        let mut monitor = BatteryMonitor::new(BatteryReader::with_path(dir.path().to_path_buf()));

        // First poll always delivers
        assert_eq!(monitor.poll(), Some(80));
        // Unchanged level stays quiet
        assert_eq!(monitor.poll(), None);

        fs::write(dir.path().join("capacity"), "79\n").unwrap();
        assert_eq!(monitor.poll(), Some(79));
        assert_eq!(monitor.poll(), None);
    }

    #[test]
    fn test_find_battery_prefers_bat0() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("AC")).unwrap();
        fs::create_dir(dir.path().join("BAT0")).unwrap();
        fs::create_dir(dir.path().join("BAT1")).unwrap();
        assert_eq!(
            find_battery(dir.path()),
            Some(dir.path().join("BAT0"))
        );
    }

    #[test]
    fn test_find_battery_by_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("macsmc-battery")).unwrap();
        assert_eq!(
            find_battery(dir.path()),
            Some(dir.path().join("macsmc-battery"))
        );
    }

    #[test]
    fn test_find_battery_none() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("AC")).unwrap();
        assert_eq!(find_battery(dir.path()), None);
    }
}
