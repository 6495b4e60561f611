use super::preview::PreviewFactory;
use super::transport::{UploadError, UploadTransport};
use super::types::{EncodedFile, RawFile, SizePolicy, StageReport, StagedFile, TransferItem};
use crate::ids::IdGenerator;
use crate::models::UploadedAsset;
use crate::notifications::{NotificationLevel, Notifier, UPLOAD_TOAST_ID};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Where the upload dialog is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    Empty,
    Staging,
    Committing,
}

/// A commit that has left the pipeline and is waiting on the transport.
///
/// Owns everything it needs, so the pipeline stays free for other events
/// (staging, unstaging, drags elsewhere) while it runs.
pub struct CommitTicket {
    id: String,
    items: Vec<TransferItem>,
    transport: Arc<dyn UploadTransport>,
}

impl CommitTicket {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub async fn run(self) -> TransferOutcome {
        let expected = self.items.len();
        let result = self.transport.transfer(self.items).await;
        TransferOutcome {
            ticket_id: self.id,
            expected,
            result,
        }
    }
}

impl std::fmt::Debug for CommitTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitTicket")
            .field("id", &self.id)
            .field("files", &self.items.len())
            .finish()
    }
}

/// What the transport produced for a ticket
#[derive(Debug)]
pub struct TransferOutcome {
    ticket_id: String,
    expected: usize,
    result: Result<Vec<EncodedFile>, UploadError>,
}

impl TransferOutcome {
    pub fn ticket_id(&self) -> &str {
        &self.ticket_id
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Staged files of one upload dialog plus the commit that turns them into
/// assets.
///
/// Dropping the pipeline releases every preview it still holds.
pub struct UploadPipeline {
    policy: SizePolicy,
    transport: Arc<dyn UploadTransport>,
    previews: Arc<dyn PreviewFactory>,
    ids: Arc<dyn IdGenerator>,
    notifier: Notifier,
    staged: Vec<StagedFile>,
    in_flight: Option<String>,
    uploaded: bool,
    hovering: bool,
}

impl UploadPipeline {
    pub fn new(
        policy: SizePolicy,
        transport: Arc<dyn UploadTransport>,
        previews: Arc<dyn PreviewFactory>,
        ids: Arc<dyn IdGenerator>,
        notifier: Notifier,
    ) -> Self {
        UploadPipeline {
            policy,
            transport,
            previews,
            ids,
            notifier,
            staged: Vec::new(),
            in_flight: None,
            uploaded: false,
            hovering: false,
        }
    }

    pub fn policy(&self) -> SizePolicy {
        self.policy
    }

    pub fn staged(&self) -> &[StagedFile] {
        &self.staged
    }

    pub fn status(&self) -> PipelineStatus {
        if self.in_flight.is_some() {
            PipelineStatus::Committing
        } else if self.staged.is_empty() {
            PipelineStatus::Empty
        } else {
            PipelineStatus::Staging
        }
    }

    pub fn is_uploading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether the last commit succeeded and left nothing staged behind.
    /// Cleared by the next `stage`.
    pub fn is_uploaded(&self) -> bool {
        self.uploaded
    }

    pub fn is_hovering(&self) -> bool {
        self.hovering
    }

    /// Files dragged over the drop zone
    pub fn drag_enter(&mut self) {
        self.hovering = true;
    }

    pub fn drag_leave(&mut self) {
        self.hovering = false;
    }

    /// Accept a selection. Files over the size ceiling are refused with one
    /// batched warning; accepted image files get a preview.
    pub fn stage(&mut self, files: Vec<RawFile>) -> StageReport {
        self.hovering = false;
        self.uploaded = false;
        if files.is_empty() {
            return StageReport::default();
        }

        let (accepted, rejected) = self.policy.partition(files);
        let rejected: Vec<String> = rejected.into_iter().map(|f| f.name).collect();

        if !rejected.is_empty() {
            let message = self.policy.rejection_message(&rejected);
            warn!("{}", message);
            self.notifier.warning(message);
        }

        let mut report = StageReport {
            accepted: Vec::with_capacity(accepted.len()),
            rejected,
        };

        for file in accepted {
            let preview = if file.is_image() {
                self.previews.create_preview(&file)
            } else {
                None
            };
            let id = self.ids.new_id();
            debug!("Staged {} ({} bytes) as {}", file.name, file.size, id);
            report.accepted.push(id.clone());
            self.staged.push(StagedFile { id, file, preview });
        }

        report
    }

    /// Remove a staged file and release its preview
    pub fn unstage(&mut self, id: &str) -> bool {
        match self.staged.iter().position(|f| f.id == id) {
            Some(index) => {
                let removed = self.staged.remove(index);
                debug!("Unstaged {}", removed.file.name);
                if let Some(preview) = removed.preview {
                    preview.release();
                }
                true
            }
            None => false,
        }
    }

    /// Snapshot the staged set into a ticket and mark the pipeline busy.
    ///
    /// `None` when nothing is staged or a commit is already in flight.
    pub fn begin_commit(&mut self) -> Option<CommitTicket> {
        if self.staged.is_empty() {
            return None;
        }
        if self.in_flight.is_some() {
            debug!("Commit already in flight, ignoring");
            return None;
        }

        let id = self.ids.new_id();
        let items: Vec<TransferItem> = self
            .staged
            .iter()
            .map(|f| TransferItem {
                staged_id: f.id.clone(),
                file: f.file.clone(),
            })
            .collect();

        info!("Starting upload {} of {} files", id, items.len());
        self.notifier
            .toast(UPLOAD_TOAST_ID, NotificationLevel::Loading, "Uploading files…");
        self.in_flight = Some(id.clone());

        Some(CommitTicket {
            id,
            items,
            transport: self.transport.clone(),
        })
    }

    /// Turn a finished transfer into assets.
    ///
    /// On success every ticket file still staged becomes an asset (in staging
    /// order), its preview is released and it leaves the staged set. Files
    /// staged after the ticket was taken stay staged. On failure nothing is
    /// produced and the staged set is left as it was.
    ///
    /// `Ok(None)` means the ticket was not issued by this pipeline (or was
    /// already finished) and the outcome was ignored.
    pub fn finish_commit(
        &mut self,
        outcome: TransferOutcome,
    ) -> Result<Option<Vec<UploadedAsset>>, UploadError> {
        if self.in_flight.as_deref() != Some(outcome.ticket_id.as_str()) {
            warn!("Ignoring result of unknown upload {}", outcome.ticket_id);
            return Ok(None);
        }
        self.in_flight = None;

        let encoded = match outcome.result {
            Ok(encoded) if encoded.len() == outcome.expected => encoded,
            Ok(encoded) => {
                let e = UploadError::IncompleteBatch {
                    expected: outcome.expected,
                    received: encoded.len(),
                };
                return Err(self.fail(e));
            }
            Err(e) => return Err(self.fail(e)),
        };

        let mut assets = Vec::with_capacity(encoded.len());
        for EncodedFile {
            staged_id,
            data_url,
        } in encoded
        {
            let Some(index) = self.staged.iter().position(|f| f.id == staged_id) else {
                debug!("Staged file {} was removed during upload, skipping", staged_id);
                continue;
            };
            let staged = self.staged.remove(index);

            assets.push(UploadedAsset {
                id: self.ids.new_id(),
                name: staged.file.name,
                mime_type: staged.file.mime_type,
                size: staged.file.size,
                data_url,
                created_at: Utc::now(),
            });

            if let Some(preview) = staged.preview {
                preview.release();
            }
        }

        self.uploaded = self.staged.is_empty();
        info!("Upload {} finished with {} assets", outcome.ticket_id, assets.len());
        self.notifier.toast(
            UPLOAD_TOAST_ID,
            NotificationLevel::Success,
            "Files uploaded successfully",
        );

        Ok(Some(assets))
    }

    /// Begin, run and finish a commit in one go.
    ///
    /// The returned assets are the completion result; it is empty when there
    /// was nothing to commit.
    pub async fn commit(&mut self) -> Result<Vec<UploadedAsset>, UploadError> {
        let Some(ticket) = self.begin_commit() else {
            return Ok(Vec::new());
        };
        let outcome = ticket.run().await;
        Ok(self.finish_commit(outcome)?.unwrap_or_default())
    }

    fn fail(&self, e: UploadError) -> UploadError {
        error!("Upload failed: {}", e);
        self.notifier.toast(
            UPLOAD_TOAST_ID,
            NotificationLevel::Error,
            format!("Upload failed: {}", e),
        );
        e
    }
}

impl Drop for UploadPipeline {
    fn drop(&mut self) {
        if let Some(ticket) = &self.in_flight {
            warn!("Upload dialog closed while upload {} was in flight", ticket);
        }
        if !self.staged.is_empty() {
            debug!("Discarding {} staged files", self.staged.len());
        }
    }
}

impl std::fmt::Debug for UploadPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadPipeline")
            .field("status", &self.status())
            .field("staged", &self.staged.len())
            .field("uploaded", &self.uploaded)
            .finish()
    }
}
