//! Scan session state, pass exclusion and cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{ScanError, ScanResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Whether the user has scanning switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SessionState {
    /// Not scanning.
    #[default]
    Idle,
    /// Scanning; surface passes may run.
    Scanning,
}

/// Scan on/off flag owned by one scanner.
#[derive(Debug, Default)]
pub struct ScanSession {
    scanning: AtomicBool,
}

impl ScanSession {
    /// Create an idle session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.is_scanning() {
            SessionState::Scanning
        } else {
            SessionState::Idle
        }
    }

    /// Check whether the session is scanning.
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    /// Switch to scanning. Returns `false` if already scanning.
    pub fn start(&self) -> bool {
        !self.scanning.swap(true, Ordering::SeqCst)
    }

    /// Switch to idle. Returns `false` if already idle.
    pub fn stop(&self) -> bool {
        self.scanning.swap(false, Ordering::SeqCst)
    }
}

/// Shared cancellation flag for one pass.
///
/// Clones observe the same flag. A pass checks it between stages and stops
/// with [`ScanError::Cancelled`] once it is set.
///
/// # Example
///
/// ```
/// use surface_scan::CancelToken;
///
/// let token = CancelToken::new();
/// let handle = token.clone();
/// assert!(token.check().is_ok());
///
/// handle.cancel();
/// assert!(token.is_cancelled());
/// assert!(token.check().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create an un-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail with [`ScanError::Cancelled`] if cancellation was requested.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Cancelled`] once [`cancel`](Self::cancel) has
    /// been called on any clone.
    pub fn check(&self) -> ScanResult<()> {
        if self.is_cancelled() {
            Err(ScanError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Exclusive claim on the pass slot; released on drop.
#[derive(Debug)]
pub(crate) struct PassGuard<'a> {
    busy: &'a AtomicBool,
}

impl<'a> PassGuard<'a> {
    /// Claim the slot, or `None` if a pass already holds it.
    pub(crate) fn try_acquire(busy: &'a AtomicBool) -> Option<Self> {
        busy.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { busy })
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}
