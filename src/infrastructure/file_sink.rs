// File-backed recording sink for the standalone binary
use crate::application::recording_sink::{ExportError, RecordingSink};
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;

/// Writes each flushed recording to a timestamped CSV file under `dir`.
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl RecordingSink for FileSink {
    async fn persist(&self, csv: &str) -> Result<(), ExportError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ExportError::Sink(e.to_string()))?;

        let name = format!("recording-{}.csv", Utc::now().format("%Y%m%d-%H%M%S"));
        let path = self.dir.join(name);
        tokio::fs::write(&path, csv)
            .await
            .map_err(|e| ExportError::Sink(e.to_string()))?;

        tracing::info!("recording exported to {}", path.display());
        Ok(())
    }
}
