//! Unified error handling.
//!
//! Component-level errors (`StoreError`, `CheckoutError`, `ConfigError`)
//! stay specific so callers can branch on them; `AppError` is the catch-all
//! for surfaces that mix concerns, such as the CLI. Failures propagate to
//! the immediate caller for presentation; the core never retries silently
//! and never masks a checkout abort as a success.

use thiserror::Error;

use crate::backend::StoreError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend read/write failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A purchase attempt aborted.
    #[error("checkout failed: {0}")]
    Checkout(#[from] CheckoutError),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The operation requires a signed-in user.
    #[error("not signed in")]
    NotSignedIn,

    /// The operation requires the owner role.
    #[error("owner role required")]
    NotOwner,
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
