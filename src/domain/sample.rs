// Core sample and window domain models
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A single accepted measurement on a channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Retention horizon for a channel buffer, expressed as a sample-count
/// capacity at the assumed 1 Hz channel rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum Window {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    #[default]
    SixHours,
    #[serde(rename = "24h")]
    TwentyFourHours,
}

impl Window {
    pub fn capacity(self) -> usize {
        match self {
            Window::OneHour => 3600,
            Window::SixHours => 3600 * 6,
            Window::TwentyFourHours => 3600 * 24,
        }
    }
}

/// Display status for a channel, derived from its fixed threshold table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Normal,
    Warning,
    Critical,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Normal => "normal",
            Status::Warning => "warning",
            Status::Critical => "critical",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_capacities() {
        assert_eq!(Window::OneHour.capacity(), 3600);
        assert_eq!(Window::SixHours.capacity(), 21600);
        assert_eq!(Window::TwentyFourHours.capacity(), 86400);
    }

    #[test]
    fn test_window_deserializes_from_label() {
        let w: Window = serde_json::from_str("\"24h\"").unwrap();
        assert_eq!(w, Window::TwentyFourHours);
    }
}
