//! Cooperative cancellation and Ctrl+C handling.
//!
//! A [`CancelToken`] is passed explicitly into the walker and the
//! deduplication engine, which poll it once per file. The binary wires it to
//! Ctrl+C with [`install_handler`]; tests and embedders cancel it directly.
//!
//! # Usage
//!
//! ```rust,no_run
//! use mirrorclean::signal::install_handler;
//!
//! let token = install_handler().expect("Failed to install signal handler");
//! // Pass token.clone() to the engine; Ctrl+C will cancel it.
//! if token.is_cancelled() {
//!     println!("Cancelled");
//! }
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared cancellation flag.
///
/// Clones share the same flag; cancelling any clone cancels them all.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clear the flag so the token can drive another run.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_TOKEN: OnceLock<CancelToken> = OnceLock::new();

/// Install a Ctrl+C handler that cancels the returned token.
///
/// The handler can only be registered once per process. Later calls reset
/// and return the same token, so several runs in one process (tests, for
/// instance) each start uncancelled.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if another handler was registered
/// outside this module.
pub fn install_handler() -> Result<CancelToken, SignalError> {
    if let Some(token) = GLOBAL_TOKEN.get() {
        token.reset();
        return Ok(token.clone());
    }

    let token = CancelToken::new();
    let hook = token.clone();

    let installed = ctrlc::set_handler(move || {
        hook.cancel();

        let _ = writeln!(std::io::stderr(), "\nCancelling... finishing current file.");
        let _ = std::io::stderr().flush();

        log::debug!("Cancellation signal received");
    });

    match installed {
        Ok(()) => Ok(GLOBAL_TOKEN.get_or_init(|| token).clone()),
        // Lost a race with a concurrent caller that registered first.
        Err(ctrlc::Error::MultipleHandlers) => match GLOBAL_TOKEN.get() {
            Some(existing) => Ok(existing.clone()),
            None => {
                log::debug!("Ctrl+C handler already registered, using unhooked token");
                Ok(token)
            }
        },
        Err(e) => Err(e.into()),
    }
}
