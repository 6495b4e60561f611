use dashdeck::persistence::{KeyValueStore, StoreError};
use dashdeck::upload::{EncodedFile, SimulatedTransport, TransferItem, UploadError, UploadTransport};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Store that rejects every operation, like a full or unavailable browser store
#[derive(Default)]
pub struct FailingStore {
    attempts: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn fail(&self) -> StoreError {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "store unavailable",
        ))
    }
}

#[async_trait::async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(self.fail())
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(self.fail())
    }

    async fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Err(self.fail())
    }
}

/// Transport that holds every transfer until the test opens the gate
pub struct GatedTransport {
    gate: Arc<Notify>,
    inner: SimulatedTransport,
}

impl GatedTransport {
    pub fn new() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let transport = GatedTransport {
            gate: gate.clone(),
            inner: SimulatedTransport::new(Duration::ZERO),
        };
        (transport, gate)
    }
}

#[async_trait::async_trait]
impl UploadTransport for GatedTransport {
    async fn transfer(&self, items: Vec<TransferItem>) -> Result<Vec<EncodedFile>, UploadError> {
        self.gate.notified().await;
        self.inner.transfer(items).await
    }
}
