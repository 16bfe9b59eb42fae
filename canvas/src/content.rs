//! Widget content model: per-kind strategies over the opaque `content` string.
//!
//! Every [`WidgetKind`] maps to one [`ContentModel`] implementation. The
//! strategy supplies what a new widget starts with (content and style) and
//! how stored content is interpreted for rendering and editing. Stored
//! content is never trusted: malformed todo-list payloads read as an empty
//! list instead of failing.

#[cfg(test)]
#[path = "content_test.rs"]
mod content_test;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::doc::{BACKGROUND_COLOR_KEY, TEXT_COLOR_KEY, WidgetKind, WidgetStyle};

/// Pastel palette sticky notes draw their background from.
pub const STICKY_NOTE_COLORS: [&str; 7] = [
    "#F2FCE2", // green
    "#FEF7CD", // yellow
    "#FEC6A1", // orange
    "#E5DEFF", // purple
    "#FFDEE2", // pink
    "#FDE1D3", // peach
    "#D3E4FD", // blue
];

pub const STICKY_NOTE_INITIAL_TEXT: &str = "New note";
pub const DOCUMENT_INITIAL_TEXT: &str = "Start typing your document...";
pub const DOCUMENT_BACKGROUND: &str = "#1A1F2C";
pub const DOCUMENT_TEXT_COLOR: &str = "#ffffff";

const NOTE_PLACEHOLDER: &str = "Type your note...";

/// Stored content interpreted for a specific kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Literal text shown in an editor.
    Text(String),
    /// Image URL; `None` means nothing uploaded yet and an upload prompt is shown.
    Image(Option<String>),
    /// Ordered todo items.
    Todo(TodoList),
}

/// Per-kind content strategy.
pub trait ContentModel: Sync {
    /// The kind this strategy serves.
    fn kind(&self) -> WidgetKind;

    /// Content a freshly created widget starts with.
    fn initial_content(&self) -> String {
        String::new()
    }

    /// Style a freshly created widget starts with (z-order excluded).
    fn initial_style(&self, _rng: &mut dyn RngCore) -> WidgetStyle {
        WidgetStyle::new()
    }

    /// Editor hint shown while the content is empty. Never stored.
    fn placeholder(&self) -> Option<&'static str> {
        None
    }

    /// Interpret stored content.
    fn interpret(&self, content: &str) -> Content;
}

struct StickyNoteModel;
struct DocumentModel;
struct ImageModel;
struct TextModel;
struct TodoListModel;

impl ContentModel for StickyNoteModel {
    fn kind(&self) -> WidgetKind {
        WidgetKind::StickyNote
    }

    fn initial_content(&self) -> String {
        STICKY_NOTE_INITIAL_TEXT.to_owned()
    }

    fn initial_style(&self, rng: &mut dyn RngCore) -> WidgetStyle {
        let mut style = WidgetStyle::new();
        style.set(BACKGROUND_COLOR_KEY, random_sticky_color(rng));
        style
    }

    fn placeholder(&self) -> Option<&'static str> {
        Some(NOTE_PLACEHOLDER)
    }

    fn interpret(&self, content: &str) -> Content {
        Content::Text(content.to_owned())
    }
}

impl ContentModel for DocumentModel {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Document
    }

    fn initial_content(&self) -> String {
        DOCUMENT_INITIAL_TEXT.to_owned()
    }

    fn initial_style(&self, _rng: &mut dyn RngCore) -> WidgetStyle {
        let mut style = WidgetStyle::new();
        style.set(BACKGROUND_COLOR_KEY, DOCUMENT_BACKGROUND);
        style.set(TEXT_COLOR_KEY, DOCUMENT_TEXT_COLOR);
        style
    }

    fn placeholder(&self) -> Option<&'static str> {
        Some(DOCUMENT_INITIAL_TEXT)
    }

    fn interpret(&self, content: &str) -> Content {
        Content::Text(content.to_owned())
    }
}

impl ContentModel for ImageModel {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Image
    }

    fn interpret(&self, content: &str) -> Content {
        let url = content.trim();
        Content::Image((!url.is_empty()).then(|| url.to_owned()))
    }
}

impl ContentModel for TextModel {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Text
    }

    fn placeholder(&self) -> Option<&'static str> {
        Some(NOTE_PLACEHOLDER)
    }

    fn interpret(&self, content: &str) -> Content {
        Content::Text(content.to_owned())
    }
}

impl ContentModel for TodoListModel {
    fn kind(&self) -> WidgetKind {
        WidgetKind::TodoList
    }

    fn interpret(&self, content: &str) -> Content {
        Content::Todo(TodoList::parse(content))
    }
}

static STICKY_NOTE: StickyNoteModel = StickyNoteModel;
static DOCUMENT: DocumentModel = DocumentModel;
static IMAGE: ImageModel = ImageModel;
static TEXT: TextModel = TextModel;
static TODO_LIST: TodoListModel = TodoListModel;

/// Strategy lookup backing [`WidgetKind::model`].
pub(crate) fn model_for(kind: WidgetKind) -> &'static dyn ContentModel {
    match kind {
        WidgetKind::StickyNote => &STICKY_NOTE,
        WidgetKind::Document => &DOCUMENT,
        WidgetKind::Image => &IMAGE,
        WidgetKind::Text => &TEXT,
        WidgetKind::TodoList => &TODO_LIST,
    }
}

/// Pick a background color for a new sticky note.
pub fn random_sticky_color(rng: &mut dyn RngCore) -> &'static str {
    STICKY_NOTE_COLORS[rng.random_range(0..STICKY_NOTE_COLORS.len())]
}

// =============================================================================
// TODO LIST
// =============================================================================

/// One entry of a todo-list widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Per-item token, independent of the widget id.
    pub id: String,
    pub text: String,
    pub completed: bool,
}

/// An edit applied to a todo-list widget's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoEdit {
    /// Append an item; blank text is ignored.
    Add(String),
    /// Flip the completed flag of the item with this id.
    Toggle(String),
    /// Remove the item with this id.
    Remove(String),
}

/// Ordered todo items, parsed from and serialized to widget content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoList {
    items: Vec<TodoItem>,
}

impl TodoList {
    /// Parse stored content. Empty, `null`, or malformed content yields an empty list.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        if content.trim().is_empty() {
            return Self::default();
        }
        match serde_json::from_str::<Option<Vec<TodoItem>>>(content) {
            Ok(items) => Self { items: items.unwrap_or_default() },
            Err(_) => Self::default(),
        }
    }

    /// Serialize to the stored JSON array form.
    #[must_use]
    pub fn to_content(&self) -> String {
        serde_json::to_string(&self.items).unwrap_or_else(|_| "[]".to_owned())
    }

    /// Parse `content`, apply `edit`, and serialize the result.
    #[must_use]
    pub fn apply_to_content(content: &str, edit: &TodoEdit) -> String {
        let mut list = Self::parse(content);
        list.apply(edit);
        list.to_content()
    }

    /// Apply an edit in place. Returns whether the list changed.
    pub fn apply(&mut self, edit: &TodoEdit) -> bool {
        match edit {
            TodoEdit::Add(text) => self.add_item(text).is_some(),
            TodoEdit::Toggle(id) => self.toggle_item(id),
            TodoEdit::Remove(id) => self.remove_item(id),
        }
    }

    /// Append a new, uncompleted item with a fresh id. Blank text is ignored.
    pub fn add_item(&mut self, text: &str) -> Option<&TodoItem> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.items.push(TodoItem { id: Uuid::new_v4().to_string(), text: text.to_owned(), completed: false });
        self.items.last()
    }

    /// Flip the completed flag. Returns false if no item has this id.
    pub fn toggle_item(&mut self, id: &str) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            return false;
        };
        item.completed = !item.completed;
        true
    }

    /// Remove an item. Returns false if no item has this id.
    pub fn remove_item(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    /// Render as a plain-text checklist, one `- [ ]` / `- [x]` line per item.
    #[must_use]
    pub fn to_checklist(&self) -> String {
        self.items
            .iter()
            .map(|item| format!("- [{}] {}\n", if item.completed { 'x' } else { ' ' }, item.text))
            .collect()
    }

    #[must_use]
    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<Vec<TodoItem>> for TodoList {
    fn from(items: Vec<TodoItem>) -> Self {
        Self { items }
    }
}
