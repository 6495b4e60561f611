//! Upload dialog: stage files, preview images, commit them as assets.
//!
//! ```text
//! stage() ──► staged files ──begin_commit()──► CommitTicket::run() ──► finish_commit()
//!   │            │  (previews)                  (transport, async)        │
//!   └ rejects    └ unstage() releases                                     └ assets
//! ```

mod pipeline;
mod preview;
mod transport;
mod types;

pub use pipeline::{CommitTicket, PipelineStatus, TransferOutcome, UploadPipeline};
pub use preview::{BlobPreviewStore, PreviewFactory, TransientPreview};
pub use transport::{
    to_data_url, SimulatedTransport, UploadError, UploadTransport, DEFAULT_UPLOAD_LATENCY,
};
pub use types::{
    EncodedFile, FileSource, RawFile, SizePolicy, StageReport, StagedFile, TransferItem,
    DEFAULT_MAX_UPLOAD_BYTES, MIB,
};
