//! Direct-manipulation core for the note board.
//!
//! This crate holds everything about widgets that does not touch the network:
//! the widget document model, the per-kind content strategies, hit-testing,
//! and the pointer gesture engine that turns raw pointer events into moves
//! and resizes. The `board` crate owns the canonical widget collection and
//! persistence; it feeds pointer events in here and applies the resulting
//! [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Pointer gesture engine and the actions it emits |
//! | [`doc`] | Widget types, style map, and the ordered widget store |
//! | [`content`] | Per-kind content strategies and todo-list editing |
//! | [`geometry`] | Points, sizes, rectangles, and the board surface |
//! | [`input`] | Buttons, boundary policy, and the gesture state machine |
//! | [`hit`] | Hit-testing against widget regions |
//! | [`consts`] | Shared numeric constants (minimum sizes, region sizes, etc.) |

pub mod consts;
pub mod content;
pub mod doc;
pub mod engine;
pub mod geometry;
pub mod hit;
pub mod input;
