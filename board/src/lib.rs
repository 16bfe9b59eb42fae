//! Board state and persistence for the note board.
//!
//! This crate owns the live widget collection of one dashboard and keeps it
//! in step with a hosted backend. Pointer input flows through the `canvas`
//! engine; the resulting actions are applied here and written out in the
//! background.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`controller`] | Canonical widget collection, optimistic mutations, gesture application |
//! | [`persistence`] | Bounded FIFO worker that writes mutations to the store |
//! | [`store`] | Collaborator traits and wire records for the backend |
//! | [`rest`] | PostgREST-style implementation of the collaborator traits |
//! | [`export`] | Zip export of a dashboard's widgets |
//! | [`config`] | Environment configuration |
//! | [`error`] | Stable error codes for user-facing notices |

pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod persistence;
pub mod rest;
pub mod store;

#[cfg(test)]
pub mod test_helpers;
