// # Dashboard
//
// The owned state of one session: the widget grid, the asset gallery, one
// drag controller per surface and at most one open upload dialog.
//
// Everything is mutated through `&mut self`, so a move is never interleaved
// with anything else. The upload commit is the only long-running operation
// and is split in two (`begin_upload` / `finish_upload`) so the caller can
// keep handling drags while the transfer runs.

use crate::collection::{MoveRequest, OrderedCollection};
use crate::config::Config;
use crate::drag::{
    grid_layout, list_layout, CollisionStrategy, DragController, DragFeedback, Droppable,
    KeyboardCommand, Point,
};
use crate::ids::{IdGenerator, UuidGenerator};
use crate::models::{default_widgets, LayoutMode, UploadedAsset, Widget};
use crate::notifications::Notifier;
use crate::persistence::{Persistence, WIDGETS_KEY};
use crate::registry::{AssetAction, AssetRegistry};
use crate::upload::{
    BlobPreviewStore, CommitTicket, PreviewFactory, RawFile, SimulatedTransport, SizePolicy,
    StageReport, TransferOutcome, UploadError, UploadPipeline, UploadTransport,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

// Geometry used until a view reports real boxes
const WIDGET_COLUMNS: usize = 3;
const WIDGET_CARD: (f32, f32) = (320.0, 200.0);
const ASSET_COLUMNS: usize = 4;
const ASSET_CARD: (f32, f32) = (200.0, 200.0);
const ASSET_ROW: (f32, f32) = (960.0, 56.0);

/// The two draggable surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Widgets,
    Assets,
}

/// Collaborators every upload dialog is built with
#[derive(Clone)]
pub struct UploadServices {
    pub transport: Arc<dyn UploadTransport>,
    pub previews: Arc<dyn PreviewFactory>,
    pub ids: Arc<dyn IdGenerator>,
}

impl UploadServices {
    /// Simulated transport, in-process previews and UUID ids
    pub fn simulated(latency: Duration) -> Self {
        UploadServices {
            transport: Arc::new(SimulatedTransport::new(latency)),
            previews: Arc::new(BlobPreviewStore::new()),
            ids: Arc::new(UuidGenerator),
        }
    }
}

/// Knobs that don't come from storage
#[derive(Debug, Clone, Copy)]
pub struct DashboardOptions {
    pub size_policy: SizePolicy,
    pub activation_distance: f32,
}

impl From<&Config> for DashboardOptions {
    fn from(config: &Config) -> Self {
        DashboardOptions {
            size_policy: SizePolicy::new(config.max_upload_bytes),
            activation_distance: config.drag_activation_distance,
        }
    }
}

impl Default for DashboardOptions {
    fn default() -> Self {
        DashboardOptions {
            size_policy: SizePolicy::default(),
            activation_distance: crate::drag::DEFAULT_ACTIVATION_DISTANCE,
        }
    }
}

pub struct Dashboard {
    widgets: OrderedCollection<Widget>,
    assets: AssetRegistry,
    widget_drag: DragController,
    asset_drag: DragController,
    upload: Option<UploadPipeline>,
    services: UploadServices,
    options: DashboardOptions,
    notifier: Notifier,
}

impl Dashboard {
    /// Restore a session from `persistence`, falling back to the default
    /// widget catalog and an empty gallery
    pub async fn load(
        persistence: Persistence,
        options: DashboardOptions,
        services: UploadServices,
        notifier: Notifier,
    ) -> Self {
        let widgets = OrderedCollection::load(persistence.clone(), WIDGETS_KEY, default_widgets()).await;
        let assets = AssetRegistry::load(persistence, notifier.clone()).await;

        let widget_drag = DragController::new(CollisionStrategy::Grid, options.activation_distance);
        let asset_drag = DragController::new(assets.layout_mode().into(), options.activation_distance);

        let mut dashboard = Dashboard {
            widgets,
            assets,
            widget_drag,
            asset_drag,
            upload: None,
            services,
            options,
            notifier,
        };
        dashboard.sync_layout(Surface::Widgets);
        dashboard.sync_layout(Surface::Assets);

        info!(
            "Dashboard ready: {} widgets, {} assets, {} layout",
            dashboard.widgets.len(),
            dashboard.assets.len(),
            dashboard.assets.layout_mode()
        );
        dashboard
    }

    /// Load with the simulated upload services described by `config`
    pub async fn from_config(config: &Config, persistence: Persistence) -> Self {
        Self::load(
            persistence,
            DashboardOptions::from(config),
            UploadServices::simulated(config.upload_latency),
            Notifier::new(),
        )
        .await
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn widgets(&self) -> &[Widget] {
        self.widgets.items()
    }

    pub fn assets(&self) -> &[UploadedAsset] {
        self.assets.assets()
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.assets
    }

    pub fn layout_mode(&self) -> LayoutMode {
        self.assets.layout_mode()
    }

    /// Switch gallery layout. The gallery's collision rule follows it, which
    /// cancels a drag in progress there.
    pub async fn set_layout_mode(&mut self, mode: LayoutMode) -> bool {
        if !self.assets.set_layout_mode(mode).await {
            return false;
        }
        self.asset_drag.set_strategy(mode.into());
        self.sync_layout(Surface::Assets);
        true
    }

    // ---- Drag and drop ----

    pub fn drag(&self, surface: Surface) -> &DragController {
        match surface {
            Surface::Widgets => &self.widget_drag,
            Surface::Assets => &self.asset_drag,
        }
    }

    fn drag_mut(&mut self, surface: Surface) -> &mut DragController {
        match surface {
            Surface::Widgets => &mut self.widget_drag,
            Surface::Assets => &mut self.asset_drag,
        }
    }

    pub fn drag_feedback(&self, surface: Surface) -> DragFeedback {
        self.drag(surface).feedback()
    }

    /// Replace the synthetic geometry with boxes measured by a view
    pub fn set_surface_layout(&mut self, surface: Surface, layout: Vec<Droppable>) {
        self.drag_mut(surface).set_layout(layout);
    }

    pub fn pointer_down(&mut self, surface: Surface, id: &str, at: Point) -> bool {
        self.drag_mut(surface).pointer_down(id, at)
    }

    pub fn pointer_move(&mut self, surface: Surface, at: Point) {
        self.drag_mut(surface).pointer_move(at);
    }

    /// Release the pointer; applies and persists the resulting move, if any
    pub async fn pointer_up(&mut self, surface: Surface) -> bool {
        match self.drag_mut(surface).pointer_up() {
            Some(request) => self.apply_move(surface, &request).await,
            None => false,
        }
    }

    pub fn cancel_drag(&mut self, surface: Surface) {
        self.drag_mut(surface).cancel();
    }

    pub async fn keyboard(&mut self, surface: Surface, command: KeyboardCommand) -> bool {
        match self.drag_mut(surface).keyboard(command) {
            Some(request) => self.apply_move(surface, &request).await,
            None => false,
        }
    }

    /// The single entry point for reordering either surface
    pub async fn apply_move(&mut self, surface: Surface, request: &MoveRequest) -> bool {
        let moved = match surface {
            Surface::Widgets => self.widgets.move_item(request).await,
            Surface::Assets => self.assets.move_item(request).await,
        };
        if moved {
            self.sync_layout(surface);
        }
        moved
    }

    fn sync_layout(&mut self, surface: Surface) {
        let layout = match surface {
            Surface::Widgets => grid_layout(
                &self.widgets.ids(),
                WIDGET_COLUMNS,
                WIDGET_CARD.0,
                WIDGET_CARD.1,
            ),
            Surface::Assets => {
                let ids = self.assets.ids();
                match self.assets.layout_mode() {
                    LayoutMode::Grid => grid_layout(&ids, ASSET_COLUMNS, ASSET_CARD.0, ASSET_CARD.1),
                    LayoutMode::Table => list_layout(&ids, ASSET_ROW.0, ASSET_ROW.1),
                }
            }
        };
        self.drag_mut(surface).set_layout(layout);
    }

    // ---- Upload dialog ----

    pub fn upload(&self) -> Option<&UploadPipeline> {
        self.upload.as_ref()
    }

    pub fn upload_mut(&mut self) -> Option<&mut UploadPipeline> {
        self.upload.as_mut()
    }

    /// Open the upload dialog, or return the one already open
    pub fn open_upload(&mut self) -> &mut UploadPipeline {
        let services = &self.services;
        let policy = self.options.size_policy;
        let notifier = &self.notifier;
        self.upload.get_or_insert_with(|| {
            debug!("Opening upload dialog");
            UploadPipeline::new(
                policy,
                services.transport.clone(),
                services.previews.clone(),
                services.ids.clone(),
                notifier.clone(),
            )
        })
    }

    /// Close the dialog, releasing every staged preview. An upload still in
    /// flight will have its result discarded.
    pub fn close_upload(&mut self) {
        if self.upload.take().is_some() {
            debug!("Closed upload dialog");
        }
    }

    pub fn stage_files(&mut self, files: Vec<RawFile>) -> StageReport {
        self.open_upload().stage(files)
    }

    pub fn unstage_file(&mut self, id: &str) -> bool {
        self.upload
            .as_mut()
            .map(|pipeline| pipeline.unstage(id))
            .unwrap_or(false)
    }

    /// Take the staged files for upload. `None` when the dialog is closed,
    /// empty, or already uploading.
    pub fn begin_upload(&mut self) -> Option<CommitTicket> {
        self.upload.as_mut()?.begin_commit()
    }

    /// Register the assets from a finished transfer.
    ///
    /// Returns how many assets were added. A successful upload closes the
    /// dialog unless files were staged while it ran. If the dialog was closed
    /// in the meantime the transfer result is dropped, and a dialog opened
    /// since then is left alone.
    pub async fn finish_upload(&mut self, outcome: TransferOutcome) -> Result<usize, UploadError> {
        let Some(pipeline) = self.upload.as_mut() else {
            warn!(
                "Upload dialog closed before upload {} finished, discarding result",
                outcome.ticket_id()
            );
            return Ok(0);
        };

        let Some(batch) = pipeline.finish_commit(outcome)? else {
            debug!("Upload result does not belong to the open dialog, discarding");
            return Ok(0);
        };
        let keep_open = !pipeline.staged().is_empty();

        let added = self.assets.append(batch).await;
        if added > 0 {
            self.sync_layout(Surface::Assets);
        }
        if !keep_open {
            self.close_upload();
        }
        Ok(added)
    }

    /// Upload everything staged and wait for it
    pub async fn commit_upload(&mut self) -> Result<usize, UploadError> {
        let Some(ticket) = self.begin_upload() else {
            return Ok(0);
        };
        let outcome = ticket.run().await;
        self.finish_upload(outcome).await
    }

    // ---- Assets ----

    pub async fn asset_action(&mut self, id: &str, action: AssetAction) -> bool {
        let removes = action == AssetAction::Delete;
        let changed = self.assets.apply_action(id, action).await;
        if changed && removes {
            self.sync_layout(Surface::Assets);
        }
        changed
    }

    pub async fn rename_asset(&mut self, id: &str, name: &str) -> bool {
        self.asset_action(id, AssetAction::Rename(name.to_string()))
            .await
    }

    pub async fn delete_asset(&mut self, id: &str) -> bool {
        self.asset_action(id, AssetAction::Delete).await
    }

    pub fn previewed(&self) -> Option<&UploadedAsset> {
        self.assets.previewed()
    }

    pub fn close_preview(&mut self) {
        self.assets.close_preview();
    }
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("widgets", &self.widgets.len())
            .field("assets", &self.assets.len())
            .field("upload", &self.upload)
            .finish()
    }
}
