//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`ContextError`] covers every failure a caller can
//! observe:
//! - No usable construction strategy (configuration)
//! - The native driver reporting an error code
//! - A context that stays lost after the bounded rebuild
//! - Native acquisition or release failures reported by a policy
//!
//! Context loss itself is **not** an error. The registry absorbs it and
//! rebuilds the context before returning.
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, ContextError>`.
//!
//! ```rust,ignore
//! use glctx::errors::{ContextError, Result};
//!
//! fn acquire(manager: &mut ContextManager) -> Result<()> {
//!     let _ctx = manager.get_active_context()?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::context::ContextVersion;

/// The main error type for context lifecycle management.
#[derive(Error, Debug)]
pub enum ContextError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// No usable construction strategy, or an unusable flag value.
    ///
    /// Fatal to the request and never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A flag document could not be parsed.
    #[error("Flag parse error: {0}")]
    FlagParse(#[from] serde_json::Error),

    // ========================================================================
    // Driver Errors
    // ========================================================================
    /// The native driver reported an error code.
    #[error("Graphics error: {name} (0x{code:04X})")]
    Graphics {
        /// Raw error code returned by the error query
        code: u32,
        /// Symbolic name of the code
        name: String,
    },

    /// A freshly rebuilt context was reported lost again.
    #[error("Context for version {version} is still lost after {attempts} rebuild attempt(s)")]
    PersistentContextLoss {
        /// The version that could not be recovered
        version: ContextVersion,
        /// Number of rebuilds performed before giving up
        attempts: u32,
    },

    // ========================================================================
    // Policy Errors
    // ========================================================================
    /// The factory could not acquire a native context.
    #[error("Failed to create context for version {version}: {reason}")]
    ContextCreation {
        /// The requested version
        version: ContextVersion,
        /// What went wrong
        reason: String,
    },

    /// The cleanup strategy failed to release a context.
    #[error("Failed to release context for version {version}: {reason}")]
    Cleanup {
        /// The version whose handle was being released
        version: ContextVersion,
        /// What went wrong
        reason: String,
    },
}

impl ContextError {
    /// Shorthand for [`ContextError::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Returns `true` for [`ContextError::Configuration`].
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Alias for `Result<T, ContextError>`.
pub type Result<T> = std::result::Result<T, ContextError>;
