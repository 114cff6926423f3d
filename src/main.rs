// Main entry point - Dependency injection and pipeline wiring
use biosignal_telemetry::application::pipeline::Pipeline;
use biosignal_telemetry::infrastructure::config::{load_channels_config, load_stream_config};
use biosignal_telemetry::infrastructure::file_sink::FileSink;
use biosignal_telemetry::infrastructure::stream_client::StreamClient;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let stream_config = load_stream_config()?;
    let channels_config = load_channels_config()?;
    let endpoint = stream_config.stream.endpoint();

    // Create sink (infrastructure layer)
    let sink = Arc::new(FileSink::new(channels_config.recording.export_dir.clone()));

    // Create pipeline (application layer)
    let mut pipeline = Pipeline::new(channels_config, stream_config.stream.window, sink);

    // Start the stream client task
    let (event_tx, event_rx) = mpsc::channel(100);
    let client = StreamClient::spawn(
        &endpoint,
        Duration::from_secs(stream_config.stream.retry_delay_secs),
        event_tx,
    );

    println!("Starting biosignal-telemetry pipeline for {}", endpoint);

    let mut events = ReceiverStream::new(event_rx);
    let mut summary_tick = tokio::time::interval(Duration::from_secs(10));

    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(event) => {
                    if pipeline.handle_event(event) {
                        // Ceiling auto-stop: flush exactly as on manual stop.
                        if let Err(e) = pipeline.flush_recording().await {
                            tracing::error!("auto-stop flush failed: {}", e);
                        }
                    }
                }
                None => break,
            },
            _ = summary_tick.tick() => {
                let connected = if pipeline.is_connected() { "connected" } else { "disconnected" };
                tracing::info!("telemetry source {} ({})", endpoint, connected);
                for summary in pipeline.summaries() {
                    tracing::info!(
                        "{}: {:.2} {} ({:+.1}%, {})",
                        summary.display_name,
                        summary.latest_value,
                        summary.unit,
                        summary.change_percent,
                        summary.status.as_str()
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    if pipeline.is_recording() {
        if let Err(e) = pipeline.stop_recording().await {
            tracing::error!("final recording flush failed: {}", e);
        }
    }
    client.shutdown().await;

    Ok(())
}
