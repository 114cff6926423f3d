// Zero-phase IIR notch filter for power-line interference removal
use crate::domain::sample::Sample;
use serde::Deserialize;
use std::f64::consts::PI;

/// Parameters for the band-reject biquad applied before charting.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct NotchSettings {
    /// Center frequency to attenuate, in Hz.
    pub frequency: f64,
    /// Quality factor; higher means a narrower notch.
    pub q: f64,
    /// Sample rate used when the window does not carry a usable time delta.
    pub fallback_sample_rate: f64,
}

impl Default for NotchSettings {
    fn default() -> Self {
        Self {
            frequency: 60.0,
            q: 30.0,
            fallback_sample_rate: 250.0,
        }
    }
}

/// Normalized biquad coefficients (a0 divided out).
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Biquad {
    fn notch(frequency: f64, q: f64, sample_rate: f64) -> Self {
        let w0 = 2.0 * PI * frequency / sample_rate;
        let alpha = w0.sin() / (2.0 * q);
        let cos_w0 = w0.cos();
        let a0 = 1.0 + alpha;

        Self {
            b0: 1.0 / a0,
            b1: -2.0 * cos_w0 / a0,
            b2: 1.0 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    /// Single causal pass over the input with a fresh delay line.
    fn run(&self, input: impl Iterator<Item = f64>) -> Vec<f64> {
        let mut output = Vec::new();
        let (mut x1, mut x2) = (0.0, 0.0);
        let (mut y1, mut y2) = (0.0, 0.0);

        for x0 in input {
            let y0 = self.b0 * x0 + self.b1 * x1 + self.b2 * x2 - self.a1 * y1 - self.a2 * y2;
            output.push(y0);
            x2 = x1;
            x1 = x0;
            y2 = y1;
            y1 = y0;
        }

        output
    }
}

/// Estimate the sample rate from the delta between the first two samples.
fn estimate_sample_rate(window: &[Sample], fallback: f64) -> f64 {
    if window.len() < 2 {
        return fallback;
    }
    let dt = (window[1].timestamp - window[0].timestamp)
        .num_milliseconds() as f64
        / 1000.0;
    if dt > 0.0 { 1.0 / dt } else { fallback }
}

/// Apply the notch to a windowed sample sequence.
///
/// Runs the biquad forward and then in reverse so the displayed trace has no
/// phase shift. Windows with fewer than two samples pass through unchanged.
pub fn apply_notch(window: &[Sample], settings: &NotchSettings) -> Vec<Sample> {
    if window.len() < 2 {
        return window.to_vec();
    }

    let sample_rate = estimate_sample_rate(window, settings.fallback_sample_rate);
    let biquad = Biquad::notch(settings.frequency, settings.q, sample_rate);

    let forward = biquad.run(window.iter().map(|s| s.value));
    let mut backward = biquad.run(forward.into_iter().rev());
    backward.reverse();

    window
        .iter()
        .zip(backward)
        .map(|(s, y)| Sample::new(s.timestamp, y))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn series(rate_hz: f64, values: impl IntoIterator<Item = f64>) -> Vec<Sample> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let step_ms = (1000.0 / rate_hz) as i64;
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                Sample::new(base + chrono::Duration::milliseconds(step_ms * i as i64), v)
            })
            .collect()
    }

    fn rms(samples: &[Sample]) -> f64 {
        let sum: f64 = samples.iter().map(|s| s.value * s.value).sum();
        (sum / samples.len() as f64).sqrt()
    }

    #[test]
    fn test_passthrough_on_degenerate_window() {
        let settings = NotchSettings::default();
        assert!(apply_notch(&[], &settings).is_empty());

        let one = series(250.0, [1.25]);
        assert_eq!(apply_notch(&one, &settings), one);
    }

    #[test]
    fn test_attenuates_mains_frequency() {
        let rate = 250.0;
        let input = series(
            rate,
            (0..1000).map(|i| (2.0 * PI * 60.0 * i as f64 / rate).sin()),
        );
        let filtered = apply_notch(&input, &NotchSettings::default());

        // Compare steady-state energy, skipping the edge transients.
        let mid_in = &input[200..800];
        let mid_out = &filtered[200..800];
        assert!(rms(mid_out) < 0.3 * rms(mid_in));
    }

    #[test]
    fn test_preserves_far_frequencies_and_dc() {
        let rate = 250.0;
        let slow = series(
            rate,
            (0..1000).map(|i| (2.0 * PI * 5.0 * i as f64 / rate).sin()),
        );
        let filtered = apply_notch(&slow, &NotchSettings::default());
        assert!(rms(&filtered[200..800]) > 0.8 * rms(&slow[200..800]));

        let dc = series(rate, std::iter::repeat(3.0).take(400));
        let filtered_dc = apply_notch(&dc, &NotchSettings::default());
        assert!((filtered_dc[300].value - 3.0).abs() < 0.05);
    }

    #[test]
    fn test_deterministic_for_same_input() {
        let input = series(250.0, (0..100).map(|i| (i as f64 * 0.37).sin()));
        let a = apply_notch(&input, &NotchSettings::default());
        let b = apply_notch(&input, &NotchSettings::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_falls_back_when_delta_is_degenerate() {
        // Two samples with an identical timestamp force the fallback rate.
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let window = vec![Sample::new(base, 1.0), Sample::new(base, -1.0)];
        let filtered = apply_notch(&window, &NotchSettings::default());
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|s| s.value.is_finite()));
    }
}
