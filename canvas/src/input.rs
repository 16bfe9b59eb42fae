//! Input model: mouse buttons, boundary policy, and the gesture state machine.
//!
//! `InputState` is the active gesture being tracked between pointer-down and
//! pointer-up. It carries the context needed to turn each pointer-move into a
//! new position or size for the one widget under direct manipulation.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::str::FromStr;

use crate::doc::WidgetId;
use crate::geometry::{Point, Size, Surface};

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// How a dragged widget is kept on the board surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryPolicy {
    /// The whole bounding box stays inside the surface.
    #[default]
    Clamp,
    /// Up to half the widget may hang off any edge.
    Overflow,
}

/// Returned when a policy name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown boundary policy: {0} (expected `clamp` or `overflow`)")]
pub struct UnknownPolicy(pub String);

impl FromStr for BoundaryPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clamp" => Ok(Self::Clamp),
            "overflow" => Ok(Self::Overflow),
            _ => Err(UnknownPolicy(s.to_owned())),
        }
    }
}

impl BoundaryPolicy {
    /// Constrain a proposed top-left corner for a widget of `size` on `surface`.
    /// An unbounded surface leaves the position untouched.
    #[must_use]
    pub fn apply(self, proposed: Point, size: Size, surface: &Surface) -> Point {
        if !surface.is_bounded() {
            return proposed;
        }
        let (min_x, max_x, min_y, max_y) = match self {
            Self::Clamp => (
                0.0,
                (surface.size.width - size.width).max(0.0),
                0.0,
                (surface.size.height - size.height).max(0.0),
            ),
            Self::Overflow => (
                -size.width / 2.0,
                surface.size.width - size.width / 2.0,
                -size.height / 2.0,
                surface.size.height - size.height / 2.0,
            ),
        };
        Point::new(proposed.x.clamp(min_x, max_x.max(min_x)), proposed.y.clamp(min_y, max_y.max(min_y)))
    }
}

/// Internal state for the input state machine.
///
/// At most one widget is under manipulation at a time; a new pointer-down is
/// ignored until the active gesture returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The user is moving a widget by its header strip.
    Dragging {
        /// Id of the widget being dragged.
        id: WidgetId,
        /// `cursor - position` at pointer-down, held constant for the drag.
        grab_offset: Point,
    },
    /// The user is resizing a widget by its bottom-right handle.
    Resizing {
        /// Id of the widget being resized.
        id: WidgetId,
        /// Widget size at pointer-down.
        start_size: Size,
        /// Most recent size produced by this gesture.
        last_size: Size,
    },
}

impl InputState {
    /// Whether a gesture is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// The widget under manipulation, if any.
    #[must_use]
    pub fn widget_id(&self) -> Option<WidgetId> {
        match self {
            Self::Idle => None,
            Self::Dragging { id, .. } | Self::Resizing { id, .. } => Some(*id),
        }
    }
}
