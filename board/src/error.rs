//! Stable error codes for user-facing notices.
//!
//! Every error that can reach the host implements [`ErrorCode`] so the UI can
//! pick a notification without matching on display strings.

/// Machine-readable code for an error variant.
pub trait ErrorCode {
    fn error_code(&self) -> &'static str;
}
