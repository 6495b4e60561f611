use super::preview::TransientPreview;
use crate::format::format_bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const MIB: u64 = 1024 * 1024;

/// Default per-file size ceiling (5 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * MIB;

/// Where a selected file's bytes live
#[derive(Debug, Clone)]
pub enum FileSource {
    Memory(Arc<[u8]>),
    Path(PathBuf),
}

/// A file exactly as the user selected it.
///
/// `size` is what the selection reported; it is what the size policy
/// checks, before any bytes are read.
#[derive(Debug, Clone)]
pub struct RawFile {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub source: FileSource,
}

impl RawFile {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        size: u64,
        source: FileSource,
    ) -> Self {
        RawFile {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
            source,
        }
    }

    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        let bytes: Arc<[u8]> = bytes.into();
        RawFile::new(name, mime_type, bytes.len() as u64, FileSource::Memory(bytes))
    }

    /// Select a file on disk; size comes from its metadata
    pub async fn from_path(path: &Path, mime_type: impl Into<String>) -> std::io::Result<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        Ok(RawFile::new(
            name,
            mime_type,
            metadata.len(),
            FileSource::Path(path.to_path_buf()),
        ))
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Read the full content
    pub async fn read(&self) -> std::io::Result<Arc<[u8]>> {
        match &self.source {
            FileSource::Memory(bytes) => Ok(bytes.clone()),
            FileSource::Path(path) => Ok(tokio::fs::read(path).await?.into()),
        }
    }
}

/// A file accepted into the upload dialog but not yet committed.
///
/// Owns its preview, so removing the staged file from wherever it is held
/// releases the preview with it.
#[derive(Debug)]
pub struct StagedFile {
    pub(crate) id: String,
    pub(crate) file: RawFile,
    pub(crate) preview: Option<TransientPreview>,
}

impl StagedFile {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.file.name
    }

    pub fn mime_type(&self) -> &str {
        &self.file.mime_type
    }

    pub fn size(&self) -> u64 {
        self.file.size
    }

    pub fn file(&self) -> &RawFile {
        &self.file
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.preview.as_ref().map(|p| p.url())
    }
}

/// One staged file handed to the transport
#[derive(Debug, Clone)]
pub struct TransferItem {
    pub staged_id: String,
    pub file: RawFile,
}

/// Self-contained encoding of a transferred file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFile {
    pub staged_id: String,
    pub data_url: String,
}

/// Outcome of one `stage` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReport {
    /// Staged ids of the accepted files, in selection order
    pub accepted: Vec<String>,
    /// Names of the files refused by the size policy
    pub rejected: Vec<String>,
}

/// Per-file size ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizePolicy {
    pub max_bytes: u64,
}

impl Default for SizePolicy {
    fn default() -> Self {
        SizePolicy {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl SizePolicy {
    pub fn new(max_bytes: u64) -> Self {
        SizePolicy { max_bytes }
    }

    pub fn admits(&self, file: &RawFile) -> bool {
        file.size <= self.max_bytes
    }

    /// Split a selection into (accepted, rejected), keeping selection order
    pub fn partition(&self, files: Vec<RawFile>) -> (Vec<RawFile>, Vec<RawFile>) {
        files.into_iter().partition(|f| self.admits(f))
    }

    /// The single batched warning for a set of rejected names.
    /// Lists at most three names and counts the rest.
    pub fn rejection_message(&self, names: &[String]) -> String {
        let limit = format_bytes(self.max_bytes);
        let shown = names
            .iter()
            .take(3)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let remainder = names.len().saturating_sub(3);
        let noun = if names.len() == 1 { "file exceeds" } else { "files exceed" };

        if remainder > 0 {
            format!(
                "{} {} the {} limit: {} and {} more",
                names.len(),
                noun,
                limit,
                shown,
                remainder
            )
        } else {
            format!("{} {} the {} limit: {}", names.len(), noun, limit, shown)
        }
    }
}
