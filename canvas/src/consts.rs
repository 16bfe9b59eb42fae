//! Shared numeric constants for the canvas crate.

// ── Widget sizing ───────────────────────────────────────────────

/// Default widget width for records that carry no size.
pub const DEFAULT_WIDGET_WIDTH: f64 = 256.0;

/// Default widget height for records that carry no size.
pub const DEFAULT_WIDGET_HEIGHT: f64 = 256.0;

/// Resizing never shrinks a widget below this width.
pub const MIN_WIDGET_WIDTH: f64 = 200.0;

/// Resizing never shrinks a widget below this height.
pub const MIN_WIDGET_HEIGHT: f64 = 200.0;

// ── Hit regions ─────────────────────────────────────────────────

/// Height of the header strip that acts as the drag grab region.
pub const HEADER_HEIGHT: f64 = 40.0;

/// Side length of the square resize handle at the bottom-right corner.
pub const RESIZE_HANDLE_SIZE: f64 = 16.0;

// ── Placement ───────────────────────────────────────────────────

/// Smallest coordinate used for a randomly placed new widget.
pub const PLACEMENT_MARGIN: f64 = 50.0;

/// Space reserved at the far edges when picking a random placement.
pub const PLACEMENT_RESERVE: f64 = 350.0;

// ── Stacking ────────────────────────────────────────────────────

/// Largest z-order a widget may hold; stored values beyond it are clamped.
pub const MAX_Z_INDEX: i64 = 2_147_483_647;
