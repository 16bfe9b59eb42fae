//! Persistence adapter contract.
//!
//! DESIGN
//! ======
//! The controller talks to the remote backend only through the traits in
//! this module, so tests can swap in an in-memory store. Records cross the
//! boundary in their wire shape (`ComponentRecord`) and are normalized into
//! canvas widgets here, never in the renderer.
//!
//! ERROR HANDLING
//! ==============
//! Stored data is untrusted. Non-numeric coordinates read as 0, missing or
//! non-positive sizes read as the default size, and a missing style reads as
//! an empty map. Only a missing or unknown kind tag rejects a record.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use async_trait::async_trait;
use canvas::doc::{UnknownKind, Widget, WidgetKind, WidgetStyle, default_size};
use canvas::geometry::{Point, Size, finite_or_zero};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("backend returned no rows")]
    EmptyResponse,
    #[error("no authenticated user")]
    NotAuthenticated,
    #[error("timestamp formatting failed: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error("{0}")]
    Backend(String),
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Http(_) => "E_STORE_HTTP",
            Self::Status { .. } => "E_STORE_STATUS",
            Self::Decode(_) => "E_STORE_DECODE",
            Self::EmptyResponse => "E_STORE_EMPTY",
            Self::NotAuthenticated => "E_NOT_AUTHENTICATED",
            Self::Timestamp(_) => "E_STORE_TIMESTAMP",
            Self::Backend(_) => "E_STORE_BACKEND",
        }
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// A row of the components collection, as the backend returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub id: Uuid,
    #[serde(default)]
    pub dashboard_id: Option<Uuid>,
    /// Kind tag. Kept raw so a missing or non-string tag skips one row
    /// instead of failing the whole batch.
    #[serde(rename = "type", default)]
    pub kind: Value,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub position_x: Value,
    #[serde(default)]
    pub position_y: Value,
    #[serde(default)]
    pub width: Value,
    #[serde(default)]
    pub height: Value,
    #[serde(default)]
    pub style: Option<Value>,
}

impl ComponentRecord {
    /// Normalize into a live widget.
    ///
    /// # Errors
    ///
    /// Returns `UnknownKind` when the `type` tag is missing or names no known kind.
    pub fn into_widget(self) -> Result<Widget, UnknownKind> {
        let kind: WidgetKind = self.kind.as_str().unwrap_or_default().parse()?;
        let position = Point::new(coord(&self.position_x), coord(&self.position_y));
        let mut widget =
            Widget::new(self.id, kind, self.content.unwrap_or_default(), position, WidgetStyle::from_value(self.style));
        widget.size = stored_size(&self.width, &self.height);
        Ok(widget)
    }
}

/// Coordinate from a stored JSON value. Only finite numbers count.
#[must_use]
pub fn coord(value: &Value) -> f64 {
    value.as_f64().map_or(0.0, finite_or_zero)
}

/// Size from stored JSON values, falling back per axis to the default.
#[must_use]
pub fn stored_size(width: &Value, height: &Value) -> Size {
    let default = default_size();
    let axis = |value: &Value, fallback: f64| match value.as_f64() {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => fallback,
    };
    Size::new(axis(width, default.width), axis(height, default.height))
}

/// Insert payload for a new component. The backend assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewComponent {
    pub dashboard_id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub position_x: f64,
    pub position_y: f64,
    pub width: f64,
    pub height: f64,
    pub style: Value,
}

impl NewComponent {
    #[must_use]
    pub fn new(dashboard_id: Uuid, kind: WidgetKind, content: String, position: Point, size: Size, style: &WidgetStyle) -> Self {
        Self {
            dashboard_id,
            kind: kind.as_tag().to_owned(),
            content,
            position_x: position.x,
            position_y: position.y,
            width: size.width,
            height: size.height,
            style: style.to_value(),
        }
    }
}

/// An image file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// File extension from the name, lowercased. Defaults to `png`.
    #[must_use]
    pub fn extension(&self) -> String {
        match self.name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_ascii_lowercase(),
            _ => "png".to_owned(),
        }
    }
}

// =============================================================================
// COLLABORATORS
// =============================================================================

/// CRUD over the components collection.
#[async_trait]
pub trait ComponentStore: Send + Sync {
    async fn fetch_components(&self, dashboard_id: Uuid) -> Result<Vec<ComponentRecord>, StoreError>;

    /// Insert and return the created record with its server id.
    async fn insert_component(&self, component: NewComponent) -> Result<ComponentRecord, StoreError>;

    async fn update_position(&self, id: Uuid, x: f64, y: f64) -> Result<(), StoreError>;

    async fn update_size(&self, id: Uuid, width: f64, height: f64) -> Result<(), StoreError>;

    async fn update_content(&self, id: Uuid, content: &str) -> Result<(), StoreError>;

    async fn update_style(&self, id: Uuid, style: Value) -> Result<(), StoreError>;

    async fn delete_component(&self, id: Uuid) -> Result<(), StoreError>;

    async fn delete_all_for_dashboard(&self, dashboard_id: Uuid) -> Result<(), StoreError>;

    /// Stamp `updated_at` on every component of a dashboard.
    async fn touch_dashboard(&self, dashboard_id: Uuid) -> Result<(), StoreError>;
}

/// Resolves the signed-in user's dashboard.
#[async_trait]
pub trait DashboardResolver: Send + Sync {
    /// The authenticated user's id.
    async fn current_user(&self) -> Result<Uuid, StoreError>;

    /// Reuse the user's first dashboard, creating a default one if none exists.
    async fn get_or_create_dashboard(&self) -> Result<Uuid, StoreError>;
}

/// Object storage for image widgets.
#[async_trait]
pub trait ImageUploader: Send + Sync {
    /// Upload and return the public URL.
    async fn upload_image(&self, file: &ImageFile) -> Result<String, StoreError>;
}

/// Downloads image bytes for export.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, StoreError>;
}
