// Aggregator - Display-ready summary for each subscribed channel
use crate::domain::notch::{NotchSettings, apply_notch};
use crate::domain::sample::{Sample, Status};
use crate::infrastructure::config::{ChannelSpec, ThresholdDirection};

/// How many trailing samples feed the averaged display value for noisy
/// channel classes (ECG, EEG electrodes).
const NOISY_MEAN_LEN: usize = 10;

/// What the chart renderer consumes for one channel.
#[derive(Debug, Clone)]
pub struct ChannelSummary {
    pub name: String,
    pub display_name: String,
    pub unit: String,
    pub latest_value: f64,
    pub change_percent: f64,
    pub status: Status,
    pub series: Vec<Sample>,
}

/// Build the summary for one channel from its windowed buffer.
///
/// Summary statistics come from the raw buffer; the notch filter, when
/// enabled for the channel, shapes only the series handed to the renderer.
pub fn summarize(
    name: &str,
    window: &[Sample],
    spec: Option<&ChannelSpec>,
    notch: Option<&NotchSettings>,
) -> ChannelSummary {
    let noisy = spec.map(|s| s.noisy).unwrap_or(false);

    let display_value = if noisy {
        let tail = &window[window.len().saturating_sub(NOISY_MEAN_LEN)..];
        let sum: f64 = tail.iter().map(|s| s.value).sum();
        sum / tail.len().max(1) as f64
    } else {
        window.last().map(|s| s.value).unwrap_or(0.0)
    };

    let latest = window.last().map(|s| s.value).unwrap_or(0.0);
    let previous = if window.len() >= 2 {
        window[window.len() - 2].value
    } else {
        latest
    };
    let divisor = if previous == 0.0 { 1.0 } else { previous };
    let change_percent = (latest - previous) / divisor * 100.0;

    let status = spec
        .and_then(|s| s.thresholds.as_ref())
        .map(|t| {
            match t.direction {
                ThresholdDirection::Above => {
                    if display_value > t.critical {
                        Status::Critical
                    } else if display_value > t.warning {
                        Status::Warning
                    } else {
                        Status::Normal
                    }
                }
                ThresholdDirection::Below => {
                    if display_value < t.critical {
                        Status::Critical
                    } else if display_value < t.warning {
                        Status::Warning
                    } else {
                        Status::Normal
                    }
                }
            }
        })
        .unwrap_or(Status::Normal);

    let series = match notch {
        Some(settings) => apply_notch(window, settings),
        None => window.to_vec(),
    };

    ChannelSummary {
        name: name.to_string(),
        display_name: spec
            .map(|s| s.display_name.clone())
            .unwrap_or_else(|| name.to_string()),
        unit: spec.map(|s| s.unit.clone()).unwrap_or_default(),
        latest_value: display_value,
        change_percent,
        status,
        series,
    }
}
