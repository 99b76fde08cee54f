//! Last-error slot.

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::FsError;

/// A shared, overwrite-on-failure slot holding the most recent error message.
///
/// Clones share the slot. Every [`record`](Self::record) replaces whatever
/// was there, read or not.
///
/// ```rust
/// use vfstore::{ErrorReporter, FsError};
///
/// let reporter = ErrorReporter::new();
/// reporter.record("read", &FsError::NotFound { path: "/x".into() });
/// assert_eq!(reporter.take(), "read: not found: /x");
/// assert_eq!(reporter.take(), "");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ErrorReporter {
    slot: Arc<Mutex<String>>,
}

static GLOBAL: OnceLock<ErrorReporter> = OnceLock::new();

impl ErrorReporter {
    /// A reporter with its own empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide reporter.
    pub fn global() -> &'static ErrorReporter {
        GLOBAL.get_or_init(ErrorReporter::new)
    }

    /// Overwrite the slot with `"<scope>: <error>"`.
    pub fn record(&self, scope: &str, error: &FsError) {
        let message = format!("{scope}: {error}");
        tracing::warn!(scope, kind = ?error.kind(), "{error}");
        *self.slot.lock() = message;
    }

    /// Return the last message and clear the slot; empty if none.
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.slot.lock())
    }

    /// Return the last message without clearing it.
    pub fn peek(&self) -> String {
        self.slot.lock().clone()
    }

    /// Drop any pending message.
    pub fn clear(&self) {
        self.slot.lock().clear();
    }
}
