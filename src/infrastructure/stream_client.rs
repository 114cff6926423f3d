// WebSocket stream client - Connectivity to the telemetry source
//
// Owns the Disconnected -> Connecting -> Connected state machine, a single
// retry timer, and the decoding of inbound frames into per-channel sample
// batches published over an mpsc channel.
use crate::domain::sample::Sample;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

/// What the client publishes to the pipeline.
#[derive(Debug)]
pub enum StreamEvent {
    Connected,
    Disconnected,
    Batch {
        channels: HashMap<String, Vec<Sample>>,
        /// Local receive time of the frame, the "last updated" marker.
        received_at: DateTime<Utc>,
    },
}

#[derive(Debug)]
enum Command {
    Reconnect,
    Shutdown,
}

/// Handle owned by the view; dropping it (or calling `shutdown`) tears the
/// connection task down, closing the socket and the pending retry timer.
pub struct StreamClientHandle {
    commands: mpsc::Sender<Command>,
    task: tokio::task::JoinHandle<()>,
}

impl StreamClientHandle {
    /// Skip any pending retry delay and dial again immediately.
    pub async fn reconnect(&self) {
        let _ = self.commands.send(Command::Reconnect).await;
    }

    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown).await;
        let _ = self.task.await;
    }
}

pub struct StreamClient;

impl StreamClient {
    /// Start the connection task for `address`.
    ///
    /// A malformed address is logged and leaves the client disconnected
    /// without retrying; everything else reconnects after `retry_delay`.
    pub fn spawn(
        address: &str,
        retry_delay: Duration,
        events: mpsc::Sender<StreamEvent>,
    ) -> StreamClientHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let endpoint = validate_endpoint(address);
        if endpoint.is_none() {
            tracing::warn!("invalid telemetry endpoint {address}, staying disconnected");
        }
        let task = tokio::spawn(run(endpoint, retry_delay, events, cmd_rx));
        StreamClientHandle {
            commands: cmd_tx,
            task,
        }
    }
}

/// Accept only well-formed `ws(s)://host:port` endpoints.
fn validate_endpoint(address: &str) -> Option<Url> {
    let url = Url::parse(address).ok()?;
    if !matches!(url.scheme(), "ws" | "wss") {
        return None;
    }
    url.host_str()?;
    url.port()?;
    Some(url)
}

async fn run(
    endpoint: Option<Url>,
    retry_delay: Duration,
    events: mpsc::Sender<StreamEvent>,
    mut commands: mpsc::Receiver<Command>,
) {
    let Some(endpoint) = endpoint else {
        // No valid target: hold Disconnected until torn down. A manual
        // reconnect has nowhere to dial either.
        while let Some(command) = commands.recv().await {
            if matches!(command, Command::Shutdown) {
                return;
            }
        }
        return;
    };

    let mut decoder = FrameDecoder::default();

    'dial: loop {
        tracing::info!("connecting to {endpoint}");
        let attempt = tokio_tungstenite::connect_async(endpoint.as_str());
        tokio::pin!(attempt);

        let mut ws = tokio::select! {
            result = &mut attempt => match result {
                Ok((ws, _)) => ws,
                Err(e) => {
                    tracing::warn!("connection to {endpoint} failed: {e}");
                    if wait_for_retry(retry_delay, &mut commands).await {
                        continue 'dial;
                    }
                    return;
                }
            },
            command = commands.recv() => match command {
                Some(Command::Reconnect) => continue 'dial,
                _ => return,
            },
        };

        tracing::info!("connected to {endpoint}");
        if events.send(StreamEvent::Connected).await.is_err() {
            return;
        }

        loop {
            tokio::select! {
                message = ws.next() => match message {
                    Some(Ok(Message::Text(text))) => {
                        let received_at = Utc::now();
                        if let Some(channels) = decoder.decode(&text, received_at) {
                            let event = StreamEvent::Batch { channels, received_at };
                            if events.send(event).await.is_err() {
                                return;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = ws.send(Message::Pong(payload)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!("stream closed by {endpoint}");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!("stream error from {endpoint}: {e}");
                        break;
                    }
                },
                command = commands.recv() => match command {
                    Some(Command::Reconnect) => {
                        let _ = ws.close(None).await;
                        if events.send(StreamEvent::Disconnected).await.is_err() {
                            return;
                        }
                        continue 'dial;
                    }
                    _ => {
                        let _ = ws.close(None).await;
                        return;
                    }
                },
            }
        }

        if events.send(StreamEvent::Disconnected).await.is_err() {
            return;
        }
        if !wait_for_retry(retry_delay, &mut commands).await {
            return;
        }
    }
}

/// Sit out the retry delay. A manual reconnect short-circuits the timer;
/// shutdown (or a dropped handle) returns false.
async fn wait_for_retry(delay: Duration, commands: &mut mpsc::Receiver<Command>) -> bool {
    tokio::select! {
        _ = sleep(delay) => true,
        command = commands.recv() => matches!(command, Some(Command::Reconnect)),
    }
}

/// Normalizes the two accepted wire shapes into `Sample`s.
///
/// Canonical form: channel -> array of `{ "y": value, "__timestamp__":
/// unix seconds }`. The simpler variant, channel -> bare number, gets a
/// synthesized timestamp advancing one second per sample, seeded at the
/// local receive time of the first bare sample on that channel.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    synthetic_clocks: HashMap<String, DateTime<Utc>>,
}

impl FrameDecoder {
    /// Decode one frame. Returns `None` when the top-level shape is not an
    /// object (the whole message is rejected); invalid entries inside an
    /// otherwise valid message are dropped individually.
    pub fn decode(
        &mut self,
        text: &str,
        received_at: DateTime<Utc>,
    ) -> Option<HashMap<String, Vec<Sample>>> {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("dropping unparseable frame: {e}");
                return None;
            }
        };
        let Some(object) = value.as_object() else {
            tracing::debug!("dropping non-object frame");
            return None;
        };

        let mut batch = HashMap::new();
        for (channel, entry) in object {
            let samples = match entry {
                Value::Array(items) => items.iter().filter_map(decode_entry).collect(),
                Value::Number(_) => match entry.as_f64().filter(|y| y.is_finite()) {
                    Some(y) => vec![Sample::new(self.next_synthetic(channel, received_at), y)],
                    None => Vec::new(),
                },
                _ => {
                    tracing::debug!("dropping channel {channel}: unsupported entry shape");
                    Vec::new()
                }
            };
            if !samples.is_empty() {
                batch.insert(channel.clone(), samples);
            }
        }
        Some(batch)
    }

    fn next_synthetic(&mut self, channel: &str, received_at: DateTime<Utc>) -> DateTime<Utc> {
        let clock = self
            .synthetic_clocks
            .entry(channel.to_string())
            .or_insert(received_at);
        let timestamp = *clock;
        *clock += ChronoDuration::seconds(1);
        timestamp
    }
}

fn decode_entry(item: &Value) -> Option<Sample> {
    let object = item.as_object()?;
    let y = object.get("y")?.as_f64()?;
    if !y.is_finite() {
        return None;
    }
    let seconds = object.get("__timestamp__")?.as_f64()?;
    if !seconds.is_finite() {
        return None;
    }
    let timestamp = DateTime::from_timestamp_millis((seconds * 1000.0).round() as i64)?;
    Some(Sample::new(timestamp, y))
}
