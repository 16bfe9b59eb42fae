//! Document model: widgets, their style bag, and the in-memory store.
//!
//! This module defines what sits on the board (`Widget`, `WidgetKind`), a
//! typed accessor for the open-ended style map (`WidgetStyle`), and the
//! ordered collection that owns all live widgets (`WidgetStore`).
//!
//! Data flows into this layer from the persistence adapter (after
//! normalization) and from the board controller (mutations). The renderer
//! reads from `WidgetStore` via `sorted_for_render` to determine draw order.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::consts::{DEFAULT_WIDGET_HEIGHT, DEFAULT_WIDGET_WIDTH, HEADER_HEIGHT, MAX_Z_INDEX, RESIZE_HANDLE_SIZE};
use crate::content::{Content, ContentModel};
use crate::geometry::{Point, Rect, Size};

/// Unique identifier for a widget, assigned by the persistence layer.
pub type WidgetId = Uuid;

/// Style key holding the string-encoded z-order.
pub const Z_INDEX_KEY: &str = "zIndex";

/// Style key holding the background color.
pub const BACKGROUND_COLOR_KEY: &str = "backgroundColor";

/// Style key holding the text color.
pub const TEXT_COLOR_KEY: &str = "color";

/// Returned when a kind tag does not name a known widget kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown widget kind: {0}")]
pub struct UnknownKind(pub String);

/// The kind of a widget. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetKind {
    /// Colored sticky note with free text.
    StickyNote,
    /// Dark long-form text document.
    Document,
    /// Uploaded image referenced by URL.
    Image,
    /// Plain text block.
    Text,
    /// Checklist of todo items.
    TodoList,
}

impl WidgetKind {
    /// Every kind, in toolbar order.
    pub const ALL: [WidgetKind; 5] = [Self::StickyNote, Self::Document, Self::Image, Self::Text, Self::TodoList];

    /// The tag used on the wire and in the canvas drop protocol.
    #[must_use]
    pub fn as_tag(self) -> &'static str {
        match self {
            Self::StickyNote => "sticky-note",
            Self::Document => "document",
            Self::Image => "image",
            Self::Text => "text",
            Self::TodoList => "todo-list",
        }
    }

    /// Whether the content of this kind is literal editable text.
    #[must_use]
    pub fn is_textual(self) -> bool {
        matches!(self, Self::StickyNote | Self::Document | Self::Text)
    }

    /// The content strategy for this kind.
    #[must_use]
    pub fn model(self) -> &'static dyn ContentModel {
        crate::content::model_for(self)
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for WidgetKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_tag() == s)
            .ok_or_else(|| UnknownKind(s.to_owned()))
    }
}

/// Typed access to the open style map of a widget.
///
/// The map is kept as-is so unknown presentation keys survive a round trip
/// through the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetStyle(Map<String, Value>);

impl WidgetStyle {
    /// An empty style map.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build from a stored JSON value. Anything but an object yields an empty map.
    #[must_use]
    pub fn from_value(value: Option<Value>) -> Self {
        match value {
            Some(Value::Object(map)) => Self(map),
            _ => Self::new(),
        }
    }

    /// Z-order token. Accepts a string-encoded or numeric integer; anything
    /// else reads as 0. Values are clamped to `±MAX_Z_INDEX`.
    #[must_use]
    pub fn z_index(&self) -> i64 {
        let z = match self.0.get(Z_INDEX_KEY) {
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
            _ => 0,
        };
        z.clamp(-MAX_Z_INDEX, MAX_Z_INDEX)
    }

    /// Store the z-order as a string-encoded integer.
    pub fn set_z_index(&mut self, z: i64) {
        self.0.insert(Z_INDEX_KEY.to_owned(), Value::String(z.to_string()));
    }

    /// Background color, if set.
    #[must_use]
    pub fn background_color(&self) -> Option<&str> {
        self.0.get(BACKGROUND_COLOR_KEY).and_then(Value::as_str)
    }

    /// Text color, if set.
    #[must_use]
    pub fn text_color(&self) -> Option<&str> {
        self.0.get(TEXT_COLOR_KEY).and_then(Value::as_str)
    }

    /// Set an arbitrary string attribute.
    pub fn set(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_owned(), Value::String(value.to_owned()));
    }

    /// Raw attribute lookup.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The style as a JSON object value, for the wire.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

fn default_expanded() -> bool {
    true
}

/// A widget ("note") placed on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    /// Server-assigned identifier.
    pub id: WidgetId,
    /// Which content strategy applies. Never changes after creation.
    pub kind: WidgetKind,
    /// Kind-specific payload (text, URL, or serialized todo list).
    pub content: String,
    /// Top-left corner in board space.
    pub position: Point,
    /// Bounding box dimensions.
    pub size: Size,
    /// Display-only expand/collapse flag. Never persisted.
    #[serde(default = "default_expanded")]
    pub expanded: bool,
    /// Presentation attributes, including the z-order token.
    #[serde(default)]
    pub style: WidgetStyle,
}

impl Widget {
    /// A widget with the default size, expanded, at the given position.
    #[must_use]
    pub fn new(id: WidgetId, kind: WidgetKind, content: String, position: Point, style: WidgetStyle) -> Self {
        Self {
            id,
            kind,
            content,
            position: position.sanitized(),
            size: default_size(),
            expanded: true,
            style,
        }
    }

    /// Stacking order; higher values draw above lower ones.
    #[must_use]
    pub fn z_index(&self) -> i64 {
        self.style.z_index()
    }

    /// Full bounding box.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.position, self.size)
    }

    /// Region that reacts to the pointer: the whole box when expanded,
    /// only the header strip when collapsed.
    #[must_use]
    pub fn hit_bounds(&self) -> Rect {
        if self.expanded { self.bounds() } else { self.header_rect() }
    }

    /// The header strip used as the drag grab region.
    #[must_use]
    pub fn header_rect(&self) -> Rect {
        Rect::new(self.position, Size::new(self.size.width, HEADER_HEIGHT.min(self.size.height)))
    }

    /// The bottom-right resize affordance. Collapsed widgets have none.
    #[must_use]
    pub fn resize_handle_rect(&self) -> Option<Rect> {
        if !self.expanded {
            return None;
        }
        let origin = Point::new(
            self.position.x + self.size.width - RESIZE_HANDLE_SIZE,
            self.position.y + self.size.height - RESIZE_HANDLE_SIZE,
        );
        Some(Rect::new(origin, Size::new(RESIZE_HANDLE_SIZE, RESIZE_HANDLE_SIZE)))
    }

    /// Interpret the stored content according to the widget's kind.
    #[must_use]
    pub fn interpret(&self) -> Content {
        self.kind.model().interpret(&self.content)
    }
}

/// Size given to widgets whose record carries none.
#[must_use]
pub fn default_size() -> Size {
    Size::new(DEFAULT_WIDGET_WIDTH, DEFAULT_WIDGET_HEIGHT)
}

/// Insertion-ordered store of widgets with unique ids.
#[derive(Debug, Clone, Default)]
pub struct WidgetStore {
    widgets: Vec<Widget>,
}

impl WidgetStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { widgets: Vec::new() }
    }

    /// Insert a widget. A widget with the same id is replaced in place.
    pub fn insert(&mut self, widget: Widget) {
        match self.widgets.iter_mut().find(|w| w.id == widget.id) {
            Some(slot) => *slot = widget,
            None => self.widgets.push(widget),
        }
    }

    /// Remove a widget by id, returning it if it was present.
    pub fn remove(&mut self, id: &WidgetId) -> Option<Widget> {
        let idx = self.widgets.iter().position(|w| &w.id == id)?;
        Some(self.widgets.remove(idx))
    }

    /// Return a reference to a widget by id.
    #[must_use]
    pub fn get(&self, id: &WidgetId) -> Option<&Widget> {
        self.widgets.iter().find(|w| &w.id == id)
    }

    /// Return a mutable reference to a widget by id.
    pub fn get_mut(&mut self, id: &WidgetId) -> Option<&mut Widget> {
        self.widgets.iter_mut().find(|w| &w.id == id)
    }

    /// Replace all widgets with a full snapshot. Later duplicates of an id win.
    pub fn load_snapshot(&mut self, widgets: Vec<Widget>) {
        self.widgets.clear();
        for widget in widgets {
            self.insert(widget);
        }
    }

    /// Drop every widget, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let n = self.widgets.len();
        self.widgets.clear();
        n
    }

    /// Highest z-order among all widgets, or 0 when empty.
    #[must_use]
    pub fn max_z(&self) -> i64 {
        self.widgets.iter().map(Widget::z_index).max().unwrap_or(0)
    }

    /// The z-order a newly created or raised widget should take.
    ///
    /// Strictly above every widget only while `max_z() < MAX_Z_INDEX`; call
    /// [`Self::ensure_z_headroom`] first.
    #[must_use]
    pub fn next_z(&self) -> i64 {
        self.max_z() + 1
    }

    /// Renumber z-orders to `1..=n` in draw order once the ceiling is reached.
    ///
    /// Returns the ids whose z-order changed; empty when there was room.
    pub fn ensure_z_headroom(&mut self) -> Vec<WidgetId> {
        if self.max_z() < MAX_Z_INDEX {
            return Vec::new();
        }
        let order: Vec<WidgetId> = self.sorted_for_render().iter().map(|w| w.id).collect();
        let mut changed = Vec::new();
        for (z, id) in (1..).zip(order) {
            if let Some(widget) = self.get_mut(&id) {
                if widget.z_index() != z {
                    widget.style.set_z_index(z);
                    changed.push(id);
                }
            }
        }
        changed
    }

    /// Whether the widget is strictly above every other widget.
    #[must_use]
    pub fn is_topmost(&self, id: &WidgetId) -> bool {
        let Some(target) = self.get(id) else {
            return false;
        };
        let z = target.z_index();
        self.widgets
            .iter()
            .filter(|w| &w.id != id)
            .all(|w| w.z_index() < z)
    }

    /// Raise a widget above all others. Returns the new z-order when it
    /// changed, `None` if the widget was already topmost or is missing.
    /// Renumbering at the ceiling is left to the caller.
    pub fn bring_to_front(&mut self, id: &WidgetId) -> Option<i64> {
        if self.get(id).is_none() || self.is_topmost(id) {
            return None;
        }
        let z = self.next_z();
        let widget = self.get_mut(id)?;
        widget.style.set_z_index(z);
        Some(z)
    }

    /// Widgets in draw order: ascending z, ties broken by insertion order.
    #[must_use]
    pub fn sorted_for_render(&self) -> Vec<&Widget> {
        let mut out: Vec<&Widget> = self.widgets.iter().collect();
        out.sort_by_key(|w| w.z_index());
        out
    }

    /// Widgets in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Widget> {
        self.widgets.iter()
    }

    /// Snapshot of all widgets in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[Widget] {
        &self.widgets
    }

    /// Number of widgets currently in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    /// Returns `true` if the store contains no widgets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }
}
