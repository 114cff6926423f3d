// Real-time biosignal ingestion pipeline: WebSocket stream client,
// bounded per-channel buffers, notch filtering, display aggregation and
// recording export.
pub mod application;
pub mod domain;
pub mod infrastructure;
