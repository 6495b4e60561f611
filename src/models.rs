use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const LAYOUT_GRID: &str = "grid";
const LAYOUT_TABLE: &str = "table";

/// Anything that can sit in a user-ordered collection.
///
/// The id is the only sort/reorder key and must stay stable for the item's
/// lifetime. Payload fields are free-form per implementation.
pub trait Item: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    fn id(&self) -> &str;

    /// Structural check run on every record of a loaded snapshot.
    /// Serde already guarantees field types; this catches what it can't.
    fn is_well_formed(&self) -> bool {
        !self.id().is_empty()
    }
}

/// Dashboard card. Title is fixed at bootstrap, only the position changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Widget {
    pub id: String,
    pub title: String,
}

impl Widget {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Widget {
            id: id.into(),
            title: title.into(),
        }
    }
}

impl Item for Widget {
    fn id(&self) -> &str {
        &self.id
    }
}

/// The fixed catalog the dashboard boots with
pub fn default_widgets() -> Vec<Widget> {
    vec![
        Widget::new("cloud", "Cloud Network"),
        Widget::new("file", "File Sharing"),
        Widget::new("active", "Active Users"),
        Widget::new("device", "Device Management"),
        Widget::new("productivity", "Productivity Report"),
    ]
}

/// A committed upload. Self-contained: `data_url` carries the encoded content,
/// so nothing outside the record has to be kept alive or released.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAsset {
    pub id: String,
    pub name: String,
    /// MIME type as reported by the file selection
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    pub data_url: String,
    pub created_at: DateTime<Utc>,
}

impl UploadedAsset {
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

impl Item for UploadedAsset {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_well_formed(&self) -> bool {
        !self.id.is_empty() && self.data_url.starts_with("data:")
    }
}

/// How the asset gallery is rendered. Persisted as a bare string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    Grid,
    #[default]
    Table,
}

impl LayoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutMode::Grid => LAYOUT_GRID,
            LayoutMode::Table => LAYOUT_TABLE,
        }
    }
}

impl FromStr for LayoutMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            LAYOUT_GRID => Ok(LayoutMode::Grid),
            LAYOUT_TABLE => Ok(LayoutMode::Table),
            other => Err(format!("unknown layout mode '{}'", other)),
        }
    }
}

impl std::fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
