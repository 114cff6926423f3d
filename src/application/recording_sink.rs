// Sink trait for handing finished recordings to external persistence
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to render recording export: {0}")]
    Render(String),
    #[error("recording sink unavailable: {0}")]
    Sink(String),
}

/// Where the rendered CSV text goes (file save, download, device transfer).
/// The pipeline only produces the text, never the write.
#[async_trait]
pub trait RecordingSink: Send + Sync {
    async fn persist(&self, csv: &str) -> Result<(), ExportError>;
}
