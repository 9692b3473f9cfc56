//! Duration formatting and parsing
//!
//! Human-readable rendering of measured times and parsing of duration
//! arguments such as `"100ms"` or `"1s 500ms"`.

use std::time::Duration;

/// Format seconds with two decimals, as shown in the final summary
///
/// # Examples
/// ```
/// use chessbench::util::units::format_seconds;
///
/// assert_eq!(format_seconds(1.234), "1.23 s");
/// assert_eq!(format_seconds(0.0), "0.00 s");
/// ```
pub fn format_seconds(seconds: f64) -> String {
    format!("{:.2} s", seconds)
}

/// Format a duration rounded to whole milliseconds
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use chessbench::util::units::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1s 500ms");
/// assert_eq!(format_duration(Duration::from_micros(2_400)), "2ms");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let rounded = Duration::from_millis(duration.as_millis() as u64);
    if rounded.is_zero() {
        return "0ms".to_string();
    }
    humantime::format_duration(rounded).to_string()
}

/// Parse duration string into Duration
///
/// Supports formats like: "100ms", "2s", "1m 30s"
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use chessbench::util::units::parse_duration;
///
/// assert_eq!(parse_duration("100ms").unwrap(), Duration::from_millis(100));
/// assert_eq!(parse_duration("1m 30s").unwrap(), Duration::from_secs(90));
/// ```
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    humantime::parse_duration(input.trim()).map_err(|e| format!("Invalid duration {:?}: {}", input, e))
}
