#![allow(dead_code)]

pub mod doubles;

pub use doubles::{FailingStore, GatedTransport};

use dashdeck::notifications::Notifier;
use dashdeck::persistence::{MemoryStore, Persistence};
use dashdeck::upload::{BlobPreviewStore, FileSource, RawFile, MIB};
use dashdeck::{Dashboard, DashboardOptions, UploadServices};
use std::sync::Arc;
use std::time::Duration;

/// Initialize tracing for tests with proper test output handling
pub fn tracing_init() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn memory_persistence() -> (Arc<MemoryStore>, Persistence) {
    let store = Arc::new(MemoryStore::new());
    (store.clone(), Persistence::new(store))
}

/// Upload services with zero latency and a preview store the test can inspect
pub fn instant_services() -> (UploadServices, BlobPreviewStore) {
    let previews = BlobPreviewStore::new();
    let mut services = UploadServices::simulated(Duration::ZERO);
    services.previews = Arc::new(previews.clone());
    (services, previews)
}

pub async fn dashboard_with(persistence: Persistence, services: UploadServices) -> Dashboard {
    Dashboard::load(
        persistence,
        DashboardOptions::default(),
        services,
        Notifier::new(),
    )
    .await
}

/// A file that reports `mib` MiB but carries only a few real bytes
pub fn file_of_mib(name: &str, mime_type: &str, mib: u64) -> RawFile {
    RawFile::new(
        name,
        mime_type,
        mib * MIB,
        FileSource::Memory(Arc::from(name.as_bytes().to_vec())),
    )
}
