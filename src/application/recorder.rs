// Recorder - Captures every accepted sample while a session is armed
use crate::domain::sample::Sample;
use chrono::{DateTime, Duration, Utc};

/// Per-channel capture log, channels in first-appearance order.
///
/// Independent of the display window: the log grows for as long as the
/// session runs (bounded by the session ceiling, not by buffer capacity).
#[derive(Debug, Default, Clone)]
pub struct RecordingLog {
    channels: Vec<(String, Vec<Sample>)>,
}

impl RecordingLog {
    pub fn push(&mut self, channel: &str, samples: &[Sample]) {
        if samples.is_empty() {
            return;
        }
        match self.channels.iter_mut().find(|(name, _)| name == channel) {
            Some((_, log)) => log.extend_from_slice(samples),
            None => self
                .channels
                .push((channel.to_string(), samples.to_vec())),
        }
    }

    pub fn channels(&self) -> &[(String, Vec<Sample>)] {
        &self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.channels.iter().all(|(_, log)| log.is_empty())
    }

    pub fn sample_count(&self) -> usize {
        self.channels.iter().map(|(_, log)| log.len()).sum()
    }
}

/// Recording session lifecycle. One session at a time; the log survives
/// `stop` and is discarded only by `clear` or by `commit` after a
/// successful flush.
#[derive(Debug)]
pub struct Recorder {
    active: bool,
    started_at: Option<DateTime<Utc>>,
    log: RecordingLog,
    ceiling: Option<Duration>,
}

impl Recorder {
    pub fn new(ceiling: Option<Duration>) -> Self {
        Self {
            active: false,
            started_at: None,
            log: RecordingLog::default(),
            ceiling,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn log(&self) -> &RecordingLog {
        &self.log
    }

    /// Arm a fresh session, discarding any uncommitted log.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.log = RecordingLog::default();
        self.started_at = Some(now);
        self.active = true;
    }

    /// Disarm. The log stays available for export until committed or cleared.
    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Discard the captured log without flushing.
    pub fn clear(&mut self) {
        self.log = RecordingLog::default();
    }

    /// Clear the log after a successful flush.
    pub fn commit(&mut self) {
        self.log = RecordingLog::default();
        self.started_at = None;
    }

    /// Append an accepted per-channel batch. Returns true when the session
    /// crossed its ceiling and auto-stopped; the caller flushes exactly as
    /// on a manual stop.
    pub fn append(&mut self, now: DateTime<Utc>, channel: &str, samples: &[Sample]) -> bool {
        if !self.active {
            return false;
        }
        self.log.push(channel, samples);

        if let (Some(started), Some(ceiling)) = (self.started_at, self.ceiling) {
            if now - started >= ceiling {
                self.active = false;
                return true;
            }
        }
        false
    }

    /// Elapsed session time as `HH:MM:SS`, for the recording header.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<String> {
        let started = self.started_at?;
        if !self.active {
            return None;
        }
        let seconds = (now - started).num_seconds().max(0);
        Some(format!(
            "{:02}:{:02}:{:02}",
            seconds / 3600,
            (seconds % 3600) / 60,
            seconds % 60
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn samples(start: i64, n: usize) -> Vec<Sample> {
        (0..n)
            .map(|i| Sample::new(at(start + i as i64), i as f64))
            .collect()
    }

    #[test]
    fn test_inactive_recorder_ignores_appends() {
        let mut recorder = Recorder::new(None);
        recorder.append(at(0), "PPG", &samples(0, 3));
        assert!(recorder.log().is_empty());
    }

    #[test]
    fn test_captures_in_arrival_order_across_stop() {
        let mut recorder = Recorder::new(None);
        recorder.start(at(0));
        recorder.append(at(1), "PPG", &samples(1, 2));
        recorder.append(at(2), "PPG", &samples(3, 1));
        recorder.stop();

        assert_eq!(recorder.log().sample_count(), 3);
        let (name, log) = &recorder.log().channels()[0];
        assert_eq!(name, "PPG");
        assert_eq!(log[0].timestamp, at(1));
        assert_eq!(log[2].timestamp, at(3));

        // Stop keeps the log; commit discards it.
        recorder.commit();
        assert!(recorder.log().is_empty());
    }

    #[test]
    fn test_start_resets_previous_log() {
        let mut recorder = Recorder::new(None);
        recorder.start(at(0));
        recorder.append(at(1), "ECG", &samples(1, 5));
        recorder.stop();

        recorder.start(at(10));
        assert!(recorder.log().is_empty());
    }

    #[test]
    fn test_ceiling_auto_stops_and_keeps_log() {
        let mut recorder = Recorder::new(Some(Duration::minutes(30)));
        recorder.start(at(0));
        assert!(!recorder.append(at(60), "ECG", &samples(60, 1)));
        assert!(recorder.append(at(1800), "ECG", &samples(1800, 1)));
        assert!(!recorder.is_active());
        assert_eq!(recorder.log().sample_count(), 2);

        // Once stopped, further samples are not captured.
        recorder.append(at(1801), "ECG", &samples(1801, 1));
        assert_eq!(recorder.log().sample_count(), 2);
    }

    #[test]
    fn test_clear_discards_without_flushing() {
        let mut recorder = Recorder::new(None);
        recorder.start(at(0));
        recorder.append(at(1), "EMG1", &samples(1, 4));
        recorder.clear();
        assert!(recorder.log().is_empty());
        assert!(recorder.is_active());
    }

    #[test]
    fn test_elapsed_formatting() {
        let mut recorder = Recorder::new(None);
        assert_eq!(recorder.elapsed(at(0)), None);
        recorder.start(at(0));
        assert_eq!(recorder.elapsed(at(3725)).as_deref(), Some("01:02:05"));
    }
}
