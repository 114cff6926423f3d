// Application layer - Use cases over the domain types
pub mod aggregator;
pub mod channel_store;
pub mod pipeline;
pub mod recorder;
pub mod recording_sink;
