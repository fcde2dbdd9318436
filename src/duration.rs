use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::error::{NudgeError, Result};

static INTERVAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?$").expect("interval pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub total_secs: u64,
}

impl Interval {
    pub fn from_secs(total_secs: u64) -> Self {
        Interval { total_secs }
    }

    /// Accepts `90`, `90s`, `10m`, `1h30m` or `1h30m15s`. A bare number is seconds.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let invalid = || NudgeError::InvalidInterval(input.to_string());

        let total_secs = if let Ok(secs) = input.parse::<u64>() {
            secs
        } else {
            let caps = INTERVAL_RE.captures(input).ok_or_else(invalid)?;
            let part = |i: usize, scale: u64| -> Result<u64> {
                match caps.get(i) {
                    Some(m) => m
                        .as_str()
                        .parse::<u64>()
                        .ok()
                        .and_then(|v| v.checked_mul(scale))
                        .ok_or_else(invalid),
                    None => Ok(0),
                }
            };
            let (h, m, s) = (part(1, 3600)?, part(2, 60)?, part(3, 1)?);
            h.checked_add(m)
                .and_then(|v| v.checked_add(s))
                .ok_or_else(invalid)?
        };

        if total_secs == 0 {
            return Err(NudgeError::ZeroInterval);
        }

        Ok(Interval { total_secs })
    }

    pub fn as_std(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.total_secs)
    }

    pub fn format_hms(&self) -> String {
        let h = self.total_secs / 3600;
        let m = (self.total_secs % 3600) / 60;
        let s = self.total_secs % 60;

        if h > 0 {
            format!("{h}:{m:02}:{s:02}")
        } else {
            format!("{m}:{s:02}")
        }
    }

    /// Short form for status lines: `45s`, `5m`, `1h 30m`, `2m 5s`.
    pub fn human(&self) -> String {
        let h = self.total_secs / 3600;
        let m = (self.total_secs % 3600) / 60;
        let s = self.total_secs % 60;

        match (h, m, s) {
            (0, 0, s) => format!("{s}s"),
            (0, m, 0) => format!("{m}m"),
            (0, m, s) => format!("{m}m {s}s"),
            (h, m, _) => format!("{h}h {m}m"),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hms())
    }
}
