use crate::collection::{MoveRequest, OrderedCollection};
use crate::models::{Item, LayoutMode, UploadedAsset};
use crate::notifications::Notifier;
use crate::persistence::{Persistence, ASSETS_KEY, LAYOUT_KEY};
use tracing::{debug, info, warn};

/// What the gallery's per-asset action menu can do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetAction {
    View,
    Rename(String),
    Delete,
}

/// Committed uploads, most recent first, plus how the gallery shows them.
///
/// The asset list and the layout mode are persisted under separate keys.
#[derive(Debug)]
pub struct AssetRegistry {
    assets: OrderedCollection<UploadedAsset>,
    layout_mode: LayoutMode,
    previewed: Option<String>,
    persistence: Persistence,
    notifier: Notifier,
}

impl AssetRegistry {
    pub async fn load(persistence: Persistence, notifier: Notifier) -> Self {
        let assets = OrderedCollection::load(persistence.clone(), ASSETS_KEY, Vec::new()).await;

        let layout_mode = match persistence.load_raw(LAYOUT_KEY).await {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{}, using {}", e, LayoutMode::default());
                LayoutMode::default()
            }),
            None => LayoutMode::default(),
        };

        AssetRegistry {
            assets,
            layout_mode,
            previewed: None,
            persistence,
            notifier,
        }
    }

    pub fn assets(&self) -> &[UploadedAsset] {
        self.assets.items()
    }

    pub fn ids(&self) -> Vec<String> {
        self.assets.ids()
    }

    pub fn get(&self, id: &str) -> Option<&UploadedAsset> {
        self.assets.get(id)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Put a freshly committed batch in front of the existing assets.
    ///
    /// Records that are malformed or whose id is already taken are dropped.
    /// Returns how many were added.
    pub async fn append(&mut self, batch: Vec<UploadedAsset>) -> usize {
        let mut merged = Vec::with_capacity(batch.len() + self.assets.len());
        for asset in batch {
            if !asset.is_well_formed() {
                warn!("Skipping malformed asset {:?}", asset.name);
                continue;
            }
            if self.assets.get(&asset.id).is_some() || merged.iter().any(|a: &UploadedAsset| a.id == asset.id) {
                warn!("Skipping asset with duplicate id {}", asset.id);
                continue;
            }
            merged.push(asset);
        }

        let added = merged.len();
        if added == 0 {
            return 0;
        }

        merged.extend(self.assets.items().iter().cloned());
        self.assets.replace(merged);
        self.assets.save().await;

        info!("Registered {} new assets ({} total)", added, self.assets.len());
        added
    }

    /// Rename in place. Blank and unchanged names are ignored.
    pub async fn rename(&mut self, id: &str, new_name: &str) -> bool {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return false;
        }

        let Some(asset) = self.assets.get_mut(id) else {
            return false;
        };
        if asset.name == new_name {
            return false;
        }

        debug!("Renaming {} from {:?} to {:?}", id, asset.name, new_name);
        asset.name = new_name.to_string();
        self.assets.save().await;
        self.notifier.success(format!("Renamed to {}", new_name));
        true
    }

    pub async fn remove(&mut self, id: &str) -> bool {
        let Some(removed) = self.assets.remove(id) else {
            return false;
        };

        if self.previewed.as_deref() == Some(id) {
            self.previewed = None;
        }
        self.assets.save().await;

        info!("Deleted asset {} ({})", removed.id, removed.name);
        self.notifier.info(format!("Deleted {}", removed.name));
        true
    }

    pub async fn move_item(&mut self, request: &MoveRequest) -> bool {
        self.assets.move_item(request).await
    }

    pub fn layout_mode(&self) -> LayoutMode {
        self.layout_mode
    }

    /// Switch gallery layout; persisted only when it changes
    pub async fn set_layout_mode(&mut self, mode: LayoutMode) -> bool {
        if self.layout_mode == mode {
            return false;
        }
        self.layout_mode = mode;
        self.persistence.save_raw(LAYOUT_KEY, mode.as_str()).await;
        debug!("Gallery layout set to {}", mode);
        true
    }

    /// The asset currently open in the viewer
    pub fn previewed(&self) -> Option<&UploadedAsset> {
        self.previewed.as_deref().and_then(|id| self.assets.get(id))
    }

    pub fn view(&mut self, id: &str) -> bool {
        if self.assets.get(id).is_none() {
            return false;
        }
        self.previewed = Some(id.to_string());
        true
    }

    pub fn close_preview(&mut self) {
        self.previewed = None;
    }

    pub async fn apply_action(&mut self, id: &str, action: AssetAction) -> bool {
        match action {
            AssetAction::View => self.view(id),
            AssetAction::Rename(name) => self.rename(id, &name).await,
            AssetAction::Delete => self.remove(id).await,
        }
    }
}
