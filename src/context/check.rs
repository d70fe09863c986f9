//! Driver Error Checking
//!
//! Maps raw error codes returned by `getError` to symbolic names and wraps
//! state-setting calls with an optional error check.
//!
//! The check is driven by the debug flag read at the call site. In
//! non-debug mode [`call_and_check`] adds no failure path and returns the
//! operation's result untouched.

use crate::context::GraphicsContext;
use crate::errors::{ContextError, Result};

/// `GL_NO_ERROR`.
pub const NO_ERROR: u32 = 0;

/// Error codes the driver can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlErrorCode {
    InvalidEnum,
    InvalidValue,
    InvalidOperation,
    InvalidFramebufferOperation,
    OutOfMemory,
    ContextLost,
}

impl GlErrorCode {
    pub const ALL: [Self; 6] = [
        Self::InvalidEnum,
        Self::InvalidValue,
        Self::InvalidOperation,
        Self::InvalidFramebufferOperation,
        Self::OutOfMemory,
        Self::ContextLost,
    ];

    /// Returns the raw GL value.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::InvalidEnum => 0x0500,
            Self::InvalidValue => 0x0501,
            Self::InvalidOperation => 0x0502,
            Self::OutOfMemory => 0x0505,
            Self::InvalidFramebufferOperation => 0x0506,
            Self::ContextLost => 0x9242,
        }
    }

    /// Looks up a known code. `None` for `NO_ERROR` and unrecognized values.
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0x0500 => Some(Self::InvalidEnum),
            0x0501 => Some(Self::InvalidValue),
            0x0502 => Some(Self::InvalidOperation),
            0x0505 => Some(Self::OutOfMemory),
            0x0506 => Some(Self::InvalidFramebufferOperation),
            0x9242 => Some(Self::ContextLost),
            _ => None,
        }
    }

    /// Symbolic name as spelled by the GL headers.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::InvalidEnum => "INVALID_ENUM",
            Self::InvalidValue => "INVALID_VALUE",
            Self::InvalidOperation => "INVALID_OPERATION",
            Self::InvalidFramebufferOperation => "INVALID_FRAMEBUFFER_OPERATION",
            Self::OutOfMemory => "OUT_OF_MEMORY",
            Self::ContextLost => "CONTEXT_LOST_WEBGL",
        }
    }
}

/// Formats an error code for diagnostics.
///
/// Known codes yield their symbolic name; anything else yields
/// `"unknown code <code>"` with the code in decimal.
#[must_use]
pub fn describe_error_code(code: u32) -> String {
    match GlErrorCode::from_code(code) {
        Some(known) => known.name().to_string(),
        None => format!("unknown code {code}"),
    }
}

/// Queries the context's error state and fails on anything but `NO_ERROR`.
pub fn check_error(context: &dyn GraphicsContext) -> Result<()> {
    let code = context.get_error();
    if code == NO_ERROR {
        return Ok(());
    }
    Err(ContextError::Graphics {
        code,
        name: describe_error_code(code),
    })
}

/// Runs `operation`, then checks the error state when `debug` is set.
///
/// The operation's return value is passed through unchanged.
#[inline]
pub fn call_and_check<T>(
    context: &dyn GraphicsContext,
    debug: bool,
    operation: impl FnOnce() -> T,
) -> Result<T> {
    let value = operation();
    if debug {
        check_error(context)?;
    }
    Ok(value)
}
