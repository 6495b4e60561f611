use super::types::{EncodedFile, TransferItem};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Default simulated network latency
pub const DEFAULT_UPLOAD_LATENCY: Duration = Duration::from_millis(1500);

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Failed to read {name}: {source}")]
    Read {
        name: String,
        source: std::io::Error,
    },
    #[error("Encode task failed: {0}")]
    TaskFailed(String),
    #[error("Transport returned {received} files for {expected} staged")]
    IncompleteBatch { expected: usize, received: usize },
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Moves staged files somewhere durable and hands back a self-contained
/// encoding for each, in the order given.
///
/// Any single failure fails the whole batch.
#[async_trait::async_trait]
pub trait UploadTransport: Send + Sync {
    async fn transfer(&self, items: Vec<TransferItem>) -> Result<Vec<EncodedFile>, UploadError>;
}

/// Stand-in for a network upload: waits out a fixed latency, then inlines
/// each file as a base64 data URL.
#[derive(Debug, Clone)]
pub struct SimulatedTransport {
    latency: Duration,
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        SimulatedTransport::new(DEFAULT_UPLOAD_LATENCY)
    }
}

impl SimulatedTransport {
    pub fn new(latency: Duration) -> Self {
        SimulatedTransport { latency }
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }
}

#[async_trait::async_trait]
impl UploadTransport for SimulatedTransport {
    async fn transfer(&self, items: Vec<TransferItem>) -> Result<Vec<EncodedFile>, UploadError> {
        info!(
            "Transferring {} files (simulated latency {:?})",
            items.len(),
            self.latency
        );
        tokio::time::sleep(self.latency).await;

        let encodes = items.into_iter().map(encode_item);
        futures::future::join_all(encodes)
            .await
            .into_iter()
            .collect()
    }
}

async fn encode_item(item: TransferItem) -> Result<EncodedFile, UploadError> {
    let TransferItem { staged_id, file } = item;
    let bytes = file.read().await.map_err(|source| UploadError::Read {
        name: file.name.clone(),
        source,
    })?;

    // Base64 over a few MiB is CPU work, keep it off the runtime threads
    let mime_type = file.mime_type.clone();
    let data_url = tokio::task::spawn_blocking(move || to_data_url(&mime_type, &bytes))
        .await
        .map_err(|e| UploadError::TaskFailed(format!("{}: {}", file.name, e)))?;

    debug!("Encoded {} ({} bytes)", file.name, file.size);
    Ok(EncodedFile {
        staged_id,
        data_url,
    })
}

/// `data:<mime>;base64,<payload>`; unknown types become octet-stream
pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    let mime_type = if mime_type.is_empty() {
        "application/octet-stream"
    } else {
        mime_type
    };
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}
