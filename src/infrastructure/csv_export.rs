// CSV rendering for recording exports
use crate::application::recorder::RecordingLog;
use crate::application::recording_sink::ExportError;

/// Render the captured log as `Sensor,Timestamp,Value` rows, one per sample
/// in arrival order, RFC 3339 timestamps.
pub fn render_csv(log: &RecordingLog) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["Sensor", "Timestamp", "Value"])
        .map_err(|e| ExportError::Render(e.to_string()))?;

    for (channel, samples) in log.channels() {
        for sample in samples {
            writer
                .write_record([
                    channel.as_str(),
                    &sample.timestamp.to_rfc3339(),
                    &sample.value.to_string(),
                ])
                .map_err(|e| ExportError::Render(e.to_string()))?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Render(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Render(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::Sample;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_renders_header_and_rows_in_arrival_order() {
        let mut log = RecordingLog::default();
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        log.push(
            "PPG",
            &[
                Sample::new(base, 1.0),
                Sample::new(base + chrono::Duration::seconds(1), 2.0),
            ],
        );
        log.push("PPG", &[Sample::new(base + chrono::Duration::seconds(2), 3.0)]);

        let csv = render_csv(&log).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Sensor,Timestamp,Value");
        assert!(lines[1].starts_with("PPG,2024-01-01T00:00:00"));
        assert!(lines[1].ends_with(",1"));
        assert!(lines[3].ends_with(",3"));
    }

    #[test]
    fn test_empty_log_is_header_only() {
        let csv = render_csv(&RecordingLog::default()).unwrap();
        assert_eq!(csv.trim(), "Sensor,Timestamp,Value");
    }
}
