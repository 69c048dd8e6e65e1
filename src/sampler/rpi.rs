//! Raspberry Pi specific metric sources: the kernel thermal zone for
//! the SoC temperature and `vcgencmd get_throttled` for the firmware
//! throttling flags. Both degrade to `None` on non-Pi hardware.

use std::path::Path;
use std::process::Command;

use serde::Serialize;

/// Default SoC temperature source on the Pi (and most ARM boards).
pub const THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";

/// Decoded `vcgencmd get_throttled` bitfield. The low nibble is the
/// live state, bits 16–19 are the since-boot latches.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ThrottleStatus {
    pub under_voltage: bool,
    pub arm_freq_capped: bool,
    pub currently_throttled: bool,
    pub soft_temp_limit: bool,
    pub under_voltage_occurred: bool,
    pub arm_freq_capped_occurred: bool,
    pub throttled_occurred: bool,
    pub soft_temp_limit_occurred: bool,
}

impl ThrottleStatus {
    fn from_bits(val: u32) -> Self {
        Self {
            under_voltage: val & 0x1 != 0,
            arm_freq_capped: val & 0x2 != 0,
            currently_throttled: val & 0x4 != 0,
            soft_temp_limit: val & 0x8 != 0,
            under_voltage_occurred: val & 0x1_0000 != 0,
            arm_freq_capped_occurred: val & 0x2_0000 != 0,
            throttled_occurred: val & 0x4_0000 != 0,
            soft_temp_limit_occurred: val & 0x8_0000 != 0,
        }
    }
}

/// Read the SoC temperature in °C from a thermal-zone file.
pub fn read_temp(path: &Path) -> Option<f32> {
    let raw = std::fs::read_to_string(path).ok()?;
    parse_millidegrees(&raw)
}

/// The kernel reports millidegrees, e.g. `54991` → 54.991 °C.
fn parse_millidegrees(raw: &str) -> Option<f32> {
    raw.trim().parse::<i64>().ok().map(|milli| milli as f32 / 1000.0)
}

/// Query the firmware throttle state. `None` when `vcgencmd` is missing
/// or its output is not in the expected `throttled=0x...` form.
pub fn read_throttle() -> Option<ThrottleStatus> {
    let out = Command::new("vcgencmd").arg("get_throttled").output().ok()?;
    if !out.status.success() {
        return None;
    }
    parse_throttled(&String::from_utf8_lossy(&out.stdout))
}

fn parse_throttled(raw: &str) -> Option<ThrottleStatus> {
    let hex = raw.trim().strip_prefix("throttled=")?;
    let val = u32::from_str_radix(hex.trim_start_matches("0x"), 16).ok()?;
    Some(ThrottleStatus::from_bits(val))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millidegrees_parse() {
        assert_eq!(parse_millidegrees("54991\n"), Some(54.991));
        assert_eq!(parse_millidegrees("0"), Some(0.0));
        assert_eq!(parse_millidegrees("garbage"), None);
    }

    #[test]
    fn throttled_all_clear() {
        let st = parse_throttled("throttled=0x0\n").unwrap();
        assert!(!st.under_voltage);
        assert!(!st.throttled_occurred);
    }

    #[test]
    fn throttled_live_and_latched_bits() {
        // 0x50005 = under-voltage + currently-throttled, with the
        // under-voltage and throttled latches set.
        let st = parse_throttled("throttled=0x50005").unwrap();
        assert!(st.under_voltage);
        assert!(st.currently_throttled);
        assert!(!st.arm_freq_capped);
        assert!(!st.soft_temp_limit);
        assert!(st.under_voltage_occurred);
        assert!(st.throttled_occurred);
        assert!(!st.arm_freq_capped_occurred);
    }

    #[test]
    fn throttled_rejects_unexpected_output() {
        assert!(parse_throttled("error: vchi init failed").is_none());
        assert!(parse_throttled("throttled=0xZZ").is_none());
    }

    #[test]
    fn missing_thermal_zone_reads_as_none() {
        assert_eq!(read_temp(Path::new("/nonexistent/thermal_zone0/temp")), None);
    }

    #[test]
    fn thermal_zone_file_reads_in_degrees() {
        let path = std::env::temp_dir().join("pi-monitor-thermal-test");
        std::fs::write(&path, "48200\n").unwrap();
        assert_eq!(read_temp(&path), Some(48.2));
        let _ = std::fs::remove_file(&path);
    }
}
