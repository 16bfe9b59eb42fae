#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::doc::{WidgetId, WidgetStore};
use crate::geometry::Point;

/// Which part of a widget was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    /// Header strip; starts a drag.
    Header,
    /// Bottom-right resize affordance; starts a resize.
    ResizeHandle,
    /// Content area; editable, never starts a drag.
    Body,
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub widget_id: WidgetId,
    pub part: HitPart,
}

/// Find the topmost widget under `board_pt` and which part of it was hit.
///
/// Widgets are checked from the top of the draw order down. Within a widget
/// the resize handle wins over the header, and the header over the body.
#[must_use]
pub fn hit_test(board_pt: Point, store: &WidgetStore) -> Option<Hit> {
    store
        .sorted_for_render()
        .into_iter()
        .rev()
        .find(|w| w.hit_bounds().contains(board_pt))
        .map(|w| {
            let part = if w.resize_handle_rect().is_some_and(|r| r.contains(board_pt)) {
                HitPart::ResizeHandle
            } else if w.header_rect().contains(board_pt) {
                HitPart::Header
            } else {
                HitPart::Body
            };
            Hit { widget_id: w.id, part }
        })
}
