#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

//! Lifecycle management for hardware-accelerated rendering contexts.
//!
//! A [`ContextManager`] caches one context per API version, builds new ones
//! through an injectable [`ContextFactory`], puts them into a fixed baseline
//! render state, and transparently rebuilds any context the driver reports
//! lost.

pub mod context;
pub mod errors;
pub mod flags;
pub mod policy;
pub mod registry;

pub use context::{
    Capability, ContextHandle, ContextVersion, CullFace, GraphicsContext, call_and_check,
    check_error, describe_error_code,
};
pub use errors::{ContextError, Result};
pub use flags::{Environment, Flags};
pub use policy::{ClientFallback, ContextAttributes, ContextCleanup, ContextFactory, ReleaseCleanup};
pub use registry::{ContextManager, ManagerOptions};
