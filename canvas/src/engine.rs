//! Pointer interaction engine.
//!
//! The engine turns raw pointer events into position and size changes for the
//! single widget under direct manipulation. It reads widget geometry from the
//! store but never writes to it: every handler returns [`Action`]s, and the
//! owner of the store decides how to apply them.
//!
//! Move and up events are meant to be fed from the root input surface for
//! as long as a gesture is active, so a pointer released outside the widget
//! still ends the gesture.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use crate::consts::{MIN_WIDGET_HEIGHT, MIN_WIDGET_WIDTH};
use crate::doc::{WidgetId, WidgetStore};
use crate::geometry::{Point, Size, Surface};
use crate::hit::{HitPart, hit_test};
use crate::input::{BoundaryPolicy, Button, InputState};

pub const CURSOR_DEFAULT: &str = "default";
pub const CURSOR_GRABBING: &str = "grabbing";
pub const CURSOR_RESIZE: &str = "se-resize";

/// Actions returned from input handlers for the owner to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A dragged widget should move to `position` (board space, policy applied).
    WidgetMoved { id: WidgetId, position: Point },
    /// A resized widget should take `size` locally.
    WidgetResized { id: WidgetId, size: Size },
    /// A resize gesture ended with a size different from where it started.
    ResizeFinished { id: WidgetId, size: Size },
    /// A cancelled resize: put the widget back to its size at pointer-down.
    ResizeReverted { id: WidgetId, size: Size },
    /// Enable (`true`) or suppress (`false`) page-wide text selection.
    SetTextSelection(bool),
    /// Pointer cursor the host should show.
    SetCursor(&'static str),
    RenderNeeded,
}

/// Gesture tracking for one board surface.
#[derive(Debug, Clone)]
pub struct InteractionEngine {
    pub input: InputState,
    pub surface: Surface,
    pub policy: BoundaryPolicy,
    pub min_size: Size,
}

impl Default for InteractionEngine {
    fn default() -> Self {
        Self {
            input: InputState::Idle,
            surface: Surface::default(),
            policy: BoundaryPolicy::default(),
            min_size: Size::new(MIN_WIDGET_WIDTH, MIN_WIDGET_HEIGHT),
        }
    }
}

impl InteractionEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_policy(policy: BoundaryPolicy) -> Self {
        Self { policy, ..Self::default() }
    }

    /// Update the client-space origin and size of the board surface.
    pub fn set_surface(&mut self, origin: Point, size: Size) {
        self.surface = Surface::new(origin.sanitized(), size);
    }

    /// Whether a drag or resize is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.input.is_active()
    }

    /// The widget currently under manipulation.
    #[must_use]
    pub fn active_widget(&self) -> Option<WidgetId> {
        self.input.widget_id()
    }

    // --- Input events ---

    /// Start a drag (header strip) or resize (handle) on the widget under the pointer.
    ///
    /// Ignored while another gesture is active, for non-primary buttons, and
    /// for presses on a widget's content area.
    pub fn on_pointer_down(&mut self, client: Point, button: Button, store: &WidgetStore) -> Vec<Action> {
        if self.is_active() || button != Button::Primary {
            return Vec::new();
        }
        let board_pt = self.surface.to_board(client.sanitized());
        let Some(hit) = hit_test(board_pt, store) else {
            return Vec::new();
        };
        let Some(widget) = store.get(&hit.widget_id) else {
            return Vec::new();
        };

        match hit.part {
            HitPart::ResizeHandle => {
                self.input = InputState::Resizing { id: widget.id, start_size: widget.size, last_size: widget.size };
                vec![Action::SetTextSelection(false), Action::SetCursor(CURSOR_RESIZE)]
            }
            HitPart::Header => {
                self.input = InputState::Dragging { id: widget.id, grab_offset: board_pt.offset_from(widget.position) };
                vec![Action::SetTextSelection(false), Action::SetCursor(CURSOR_GRABBING)]
            }
            HitPart::Body => Vec::new(),
        }
    }

    /// Advance the active gesture to the pointer's new location.
    pub fn on_pointer_move(&mut self, client: Point, store: &WidgetStore) -> Vec<Action> {
        let board_pt = self.surface.to_board(client.sanitized());
        match self.input {
            InputState::Idle => Vec::new(),
            InputState::Dragging { id, grab_offset } => {
                let Some(widget) = store.get(&id) else {
                    return self.end_gesture();
                };
                let proposed = board_pt.offset_from(grab_offset);
                let position = self.policy.apply(proposed, widget.size, &self.surface);
                vec![Action::WidgetMoved { id, position }, Action::RenderNeeded]
            }
            InputState::Resizing { id, start_size, .. } => {
                let Some(widget) = store.get(&id) else {
                    return self.end_gesture();
                };
                let size = board_pt.offset_from(widget.position);
                let size = Size::new(size.x, size.y).at_least(self.min_size);
                self.input = InputState::Resizing { id, start_size, last_size: size };
                vec![Action::WidgetResized { id, size }, Action::RenderNeeded]
            }
        }
    }

    /// Finish the active gesture. Fires wherever the pointer is released.
    pub fn on_pointer_up(&mut self) -> Vec<Action> {
        let finished = match self.input {
            InputState::Resizing { id, start_size, last_size } if start_size != last_size => {
                Some(Action::ResizeFinished { id, size: last_size })
            }
            _ => None,
        };
        let mut actions: Vec<Action> = finished.into_iter().collect();
        actions.extend(self.end_gesture());
        actions
    }

    /// Abandon the active gesture. A resize that changed the size is
    /// reverted, so nothing is left unpersisted.
    pub fn cancel(&mut self) -> Vec<Action> {
        let reverted = match self.input {
            InputState::Resizing { id, start_size, last_size } if start_size != last_size => {
                Some(Action::ResizeReverted { id, size: start_size })
            }
            _ => None,
        };
        let mut actions: Vec<Action> = reverted.into_iter().collect();
        actions.extend(self.end_gesture());
        actions
    }

    fn end_gesture(&mut self) -> Vec<Action> {
        if !self.is_active() {
            return Vec::new();
        }
        self.input = InputState::Idle;
        vec![Action::SetTextSelection(true), Action::SetCursor(CURSOR_DEFAULT)]
    }
}
