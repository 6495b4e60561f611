use super::types::{FileSource, RawFile};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

type ReleaseFn = Box<dyn FnOnce() + Send + Sync>;

/// Short-lived local reference used to show a staged image before upload.
///
/// Releases its backing resource exactly once: either through
/// [`TransientPreview::release`] or when dropped.
pub struct TransientPreview {
    url: String,
    release: Option<ReleaseFn>,
}

impl TransientPreview {
    pub fn new(url: impl Into<String>, release: impl FnOnce() + Send + Sync + 'static) -> Self {
        TransientPreview {
            url: url.into(),
            release: Some(Box::new(release)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn release(mut self) {
        self.run_release();
    }

    fn run_release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for TransientPreview {
    fn drop(&mut self) {
        self.run_release();
    }
}

impl std::fmt::Debug for TransientPreview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransientPreview")
            .field("url", &self.url)
            .field("released", &self.release.is_none())
            .finish()
    }
}

/// Creates previews for staged image files
pub trait PreviewFactory: Send + Sync {
    fn create_preview(&self, file: &RawFile) -> Option<TransientPreview>;
}

#[derive(Default)]
struct BlobRegistry {
    blobs: HashMap<String, FileSource>,
    created: usize,
    released: usize,
    stale_releases: usize,
}

/// In-process object URL table: `blob:dashdeck/<uuid>` -> file source.
///
/// Cloning shares the table. The counters make leaks and double releases
/// observable.
#[derive(Clone, Default)]
pub struct BlobPreviewStore {
    inner: Arc<Mutex<BlobRegistry>>,
}

impl BlobPreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source behind a live preview url
    pub fn resolve(&self, url: &str) -> Option<FileSource> {
        self.lock().blobs.get(url).cloned()
    }

    /// Previews created and not yet released
    pub fn outstanding(&self) -> usize {
        self.lock().blobs.len()
    }

    pub fn created(&self) -> usize {
        self.lock().created
    }

    pub fn released(&self) -> usize {
        self.lock().released
    }

    /// Releases of a url that was already gone
    pub fn stale_releases(&self) -> usize {
        self.lock().stale_releases
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BlobRegistry> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PreviewFactory for BlobPreviewStore {
    fn create_preview(&self, file: &RawFile) -> Option<TransientPreview> {
        if !file.is_image() {
            return None;
        }

        let url = format!("blob:dashdeck/{}", Uuid::new_v4());
        {
            let mut registry = self.lock();
            registry.blobs.insert(url.clone(), file.source.clone());
            registry.created += 1;
        }
        debug!("Created preview {} for {}", url, file.name);

        let store = self.clone();
        let key = url.clone();
        Some(TransientPreview::new(url, move || {
            let mut registry = store.lock();
            if registry.blobs.remove(&key).is_some() {
                registry.released += 1;
                debug!("Released preview {}", key);
            } else {
                registry.stale_releases += 1;
                warn!("Preview {} released twice", key);
            }
        }))
    }
}

impl std::fmt::Debug for BlobPreviewStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobPreviewStore")
            .field("outstanding", &self.outstanding())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(name: &str) -> RawFile {
        RawFile::from_bytes(name, "image/png", vec![0u8; 16])
    }

    #[test]
    fn test_only_images_get_previews() {
        let store = BlobPreviewStore::new();
        let doc = RawFile::from_bytes("a.pdf", "application/pdf", vec![1u8; 4]);

        assert!(store.create_preview(&doc).is_none());
        assert!(store.create_preview(&image("a.png")).is_some());
        assert_eq!(store.created(), 1);
    }

    #[test]
    fn test_drop_releases_once() {
        let store = BlobPreviewStore::new();
        let preview = store.create_preview(&image("a.png")).unwrap();
        let url = preview.url().to_string();

        assert!(store.resolve(&url).is_some());
        drop(preview);

        assert!(store.resolve(&url).is_none());
        assert_eq!(store.outstanding(), 0);
        assert_eq!(store.released(), 1);
        assert_eq!(store.stale_releases(), 0);
    }

    #[test]
    fn test_explicit_release_does_not_rerun_on_drop() {
        let store = BlobPreviewStore::new();
        let preview = store.create_preview(&image("a.png")).unwrap();

        preview.release();

        assert_eq!(store.released(), 1);
        assert_eq!(store.stale_releases(), 0);
    }

    #[test]
    fn test_custom_release_hook_runs_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let preview = TransientPreview::new("blob:test", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(preview.url(), "blob:test");

        preview.release();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
