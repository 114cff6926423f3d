// Pipeline - Single writer tying the stream client to buffers and recorder
use crate::application::aggregator::{ChannelSummary, summarize};
use crate::application::channel_store::ChannelStore;
use crate::application::recorder::Recorder;
use crate::application::recording_sink::{ExportError, RecordingSink};
use crate::domain::sample::Window;
use crate::infrastructure::config::ChannelsConfig;
use crate::infrastructure::csv_export::render_csv;
use crate::infrastructure::stream_client::StreamEvent;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;

/// Owns the mutable pipeline state. All mutation happens through
/// `handle_event` and the explicit user operations, on one task, so readers
/// always observe fully-appended buffers.
pub struct Pipeline {
    store: ChannelStore,
    recorder: Recorder,
    channels: ChannelsConfig,
    notch_enabled: HashSet<String>,
    sink: Arc<dyn RecordingSink>,
    connected: bool,
    last_updated: Option<DateTime<Utc>>,
}

impl Pipeline {
    pub fn new(channels: ChannelsConfig, window: Window, sink: Arc<dyn RecordingSink>) -> Self {
        let mut store = ChannelStore::new(window);
        for name in &channels.subscriptions {
            store.subscribe(name);
        }
        let ceiling = channels
            .recording
            .max_duration_secs
            .map(|secs| Duration::seconds(secs as i64));

        Self {
            store,
            recorder: Recorder::new(ceiling),
            channels,
            notch_enabled: HashSet::new(),
            sink,
            connected: false,
            last_updated: None,
        }
    }

    /// Apply one stream event. Returns true when the recording session
    /// crossed its ceiling and auto-stopped; the caller flushes it exactly
    /// as on a manual stop.
    pub fn handle_event(&mut self, event: StreamEvent) -> bool {
        match event {
            StreamEvent::Connected => {
                self.connected = true;
                false
            }
            StreamEvent::Disconnected => {
                self.connected = false;
                false
            }
            StreamEvent::Batch {
                channels,
                received_at,
            } => {
                self.last_updated = Some(received_at);

                let mut expired = false;
                for (channel, samples) in &channels {
                    if !self.store.is_subscribed(channel) {
                        continue;
                    }
                    expired |= self.recorder.append(received_at, channel, samples);
                }
                self.store.append_batch(&channels);

                if expired {
                    tracing::warn!("recording reached its ceiling, auto-stopping");
                }
                expired
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn subscribe(&mut self, channel: &str) {
        self.store.subscribe(channel);
    }

    /// Drops the channel's buffer synchronously; no further writes can
    /// target it.
    pub fn unsubscribe(&mut self, channel: &str) {
        self.store.unsubscribe(channel);
        self.notch_enabled.remove(channel);
    }

    pub fn set_window(&mut self, window: Window) {
        self.store.set_window(window);
    }

    pub fn set_notch(&mut self, channel: &str, enabled: bool) {
        if enabled {
            self.notch_enabled.insert(channel.to_string());
        } else {
            self.notch_enabled.remove(channel);
        }
    }

    /// Display-ready summaries for every subscribed channel, name-sorted.
    pub fn summaries(&self) -> Vec<ChannelSummary> {
        let mut names: Vec<&str> = self.store.subscriptions().collect();
        names.sort_unstable();

        names
            .into_iter()
            .filter_map(|name| {
                let buffer = self.store.buffer(name)?;
                let notch = self
                    .notch_enabled
                    .contains(name)
                    .then_some(&self.channels.notch);
                Some(summarize(
                    name,
                    &buffer.snapshot(),
                    self.channels.spec(name),
                    notch,
                ))
            })
            .collect()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_active()
    }

    pub fn recording_elapsed(&self, now: DateTime<Utc>) -> Option<String> {
        self.recorder.elapsed(now)
    }

    pub fn start_recording(&mut self, now: DateTime<Utc>) {
        self.recorder.start(now);
    }

    /// Discard the captured log without flushing.
    pub fn clear_recording(&mut self) {
        self.recorder.clear();
    }

    /// Stop the session and flush it through the sink.
    pub async fn stop_recording(&mut self) -> Result<(), ExportError> {
        self.recorder.stop();
        self.flush_recording().await
    }

    /// Render and hand the log to the sink. A sink failure is surfaced and
    /// leaves the log intact; only a successful flush clears it.
    pub async fn flush_recording(&mut self) -> Result<(), ExportError> {
        let csv = render_csv(self.recorder.log())?;
        match self.sink.persist(&csv).await {
            Ok(()) => {
                self.recorder.commit();
                Ok(())
            }
            Err(e) => {
                tracing::error!("recording flush failed, log retained: {e}");
                Err(e)
            }
        }
    }
}
