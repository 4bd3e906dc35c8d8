// src/config/duration.rs

use std::time::Duration;

/// Parse a grace period such as `"500ms"`, `"3s"`, `"1m"` or `"1h"`.
///
/// A bare number is rejected: the unit is mandatory so `"3"` can't be
/// silently read as seconds when milliseconds were meant.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }

    // "ms" before "m" and "s", since both are suffixes of it.
    let (digits, millis_per_unit) = if let Some(n) = s.strip_suffix("ms") {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1_000)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60_000)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 3_600_000)
    } else {
        return Err(format!(
            "duration '{s}' has no unit; expected one of ms, s, m, h"
        ));
    };

    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|e| format!("invalid number in duration '{s}': {e}"))?;

    value
        .checked_mul(millis_per_unit)
        .map(Duration::from_millis)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}
