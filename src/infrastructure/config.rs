// Configuration loading for the stream endpoint and the channel tables
use crate::domain::notch::NotchSettings;
use crate::domain::sample::Window;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize, Clone)]
pub struct StreamConfig {
    pub stream: StreamSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StreamSettings {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default)]
    pub window: Window,
}

impl StreamSettings {
    /// The telemetry source endpoint, `ws(s)://<host>:<port>`.
    pub fn endpoint(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

fn default_scheme() -> String {
    "ws".to_string()
}

fn default_retry_delay_secs() -> u64 {
    5
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ChannelsConfig {
    /// Channels selected for display at startup.
    #[serde(default)]
    pub subscriptions: Vec<String>,
    /// Display metadata and status thresholds, keyed by channel name.
    /// Entries overlay the built-in table.
    #[serde(default)]
    pub channels: HashMap<String, ChannelSpec>,
    #[serde(default)]
    pub notch: NotchSettings,
    #[serde(default)]
    pub recording: RecordingConfig,
}

impl ChannelsConfig {
    pub fn spec(&self, channel: &str) -> Option<&ChannelSpec> {
        self.channels.get(channel)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChannelSpec {
    pub display_name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub noisy: bool,
    #[serde(default)]
    pub thresholds: Option<Thresholds>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Thresholds {
    pub warning: f64,
    pub critical: f64,
    pub direction: ThresholdDirection,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdDirection {
    Above,
    Below,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RecordingConfig {
    /// Hard session ceiling in seconds; `None` disables the auto-stop.
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: Option<u64>,
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: default_max_duration_secs(),
            export_dir: default_export_dir(),
        }
    }
}

fn default_max_duration_secs() -> Option<u64> {
    Some(30 * 60)
}

fn default_export_dir() -> String {
    "recordings".to_string()
}

pub fn load_stream_config() -> anyhow::Result<StreamConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/stream"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_channels_config() -> anyhow::Result<ChannelsConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/channels").required(false))
        .build()?;

    let mut parsed: ChannelsConfig = settings.try_deserialize()?;
    for (name, spec) in default_channel_specs() {
        parsed.channels.entry(name).or_insert(spec);
    }
    Ok(parsed)
}

fn spec(display_name: &str, unit: &str, noisy: bool, thresholds: Option<Thresholds>) -> ChannelSpec {
    ChannelSpec {
        display_name: display_name.to_string(),
        unit: unit.to_string(),
        noisy,
        thresholds,
    }
}

fn above(warning: f64, critical: f64) -> Option<Thresholds> {
    Some(Thresholds {
        warning,
        critical,
        direction: ThresholdDirection::Above,
    })
}

fn below(warning: f64, critical: f64) -> Option<Thresholds> {
    Some(Thresholds {
        warning,
        critical,
        direction: ThresholdDirection::Below,
    })
}

/// Built-in display and threshold table for the known biosignal channels.
pub fn default_channel_specs() -> HashMap<String, ChannelSpec> {
    let mut table = HashMap::new();
    table.insert("ECG".to_string(), spec("ECG", "BPM", true, above(100.0, 120.0)));
    table.insert("PPG".to_string(), spec("PPG", "mmHg", false, above(140.0, 160.0)));
    table.insert("PCG".to_string(), spec("PCG Phonocardiogram", "dB", false, None));
    table.insert("EMG1".to_string(), spec("EMG Channel 1", "mV", false, None));
    table.insert("EMG2".to_string(), spec("EMG Channel 2", "mV", false, None));
    table.insert(
        "MYOMETER".to_string(),
        spec("MYOMETER - Muscle Strength", "N", false, None),
    );
    table.insert(
        "SPIRO".to_string(),
        spec("SPIRO - Spirometry", "L/min", false, None),
    );
    table.insert(
        "TEMPERATURE".to_string(),
        spec("TEMPERATURE - Body", "°C", false, above(37.5, 38.5)),
    );
    table.insert(
        "NIBP".to_string(),
        spec("NIBP - Blood Pressure", "mmHg", false, above(120.0, 140.0)),
    );
    table.insert(
        "OXYGEN".to_string(),
        spec("Oxygen Saturation", "%", false, below(95.0, 90.0)),
    );
    for ch in 11..=16 {
        let name = format!("EEG CH{ch}");
        let display = format!("EEG Channel {ch}");
        table.insert(name, spec(&display, "μV", true, None));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_formatting() {
        let settings = StreamSettings {
            host: "192.168.0.10".to_string(),
            port: 8765,
            scheme: default_scheme(),
            retry_delay_secs: default_retry_delay_secs(),
            window: Window::default(),
        };
        assert_eq!(settings.endpoint(), "ws://192.168.0.10:8765");
    }

    #[test]
    fn test_default_table_covers_known_channels() {
        let table = default_channel_specs();
        assert_eq!(table["ECG"].unit, "BPM");
        assert!(table["ECG"].noisy);
        assert!(table["EEG CH14"].noisy);

        let oxygen = table["OXYGEN"].thresholds.unwrap();
        assert_eq!(oxygen.direction, ThresholdDirection::Below);
        assert_eq!(oxygen.critical, 90.0);

        let temp = table["TEMPERATURE"].thresholds.unwrap();
        assert_eq!(temp.direction, ThresholdDirection::Above);
        assert_eq!(temp.warning, 37.5);
    }
}
