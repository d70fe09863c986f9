//! Lifecycle Policy
//!
//! The pair of strategies the registry uses to build and release contexts:
//!
//! - [`ContextFactory`]: `construct(version) -> handle`
//! - [`ContextCleanup`]: `destroy(version, handle)`
//!
//! Both are implemented for plain closures, so most embedders install
//! policies without naming a type:
//!
//! ```rust,ignore
//! manager.set_context_factory(|version: ContextVersion| -> Result<ContextHandle> {
//!     Ok(Rc::new(MyContext::create(version)?))
//! });
//! ```
//!
//! When nothing was injected and the environment reports an interactive
//! client, the registry falls back to a [`ClientFallback`], resolved at first
//! use so that policies installed before then always win.

#[cfg(target_arch = "wasm32")]
pub mod canvas;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::context::{ContextHandle, ContextVersion};
use crate::errors::{ContextError, Result};

#[cfg(target_arch = "wasm32")]
pub use canvas::{CanvasContext, CanvasFactory};

// ---------------------------------------------------------------------------
// Strategy traits
// ---------------------------------------------------------------------------

/// Builds a native context for a version.
pub trait ContextFactory {
    fn construct(&mut self, version: ContextVersion) -> Result<ContextHandle>;
}

impl<F> ContextFactory for F
where
    F: FnMut(ContextVersion) -> Result<ContextHandle>,
{
    fn construct(&mut self, version: ContextVersion) -> Result<ContextHandle> {
        self(version)
    }
}

/// Releases a native context the registry is about to forget.
pub trait ContextCleanup {
    fn destroy(&mut self, version: ContextVersion, handle: ContextHandle) -> Result<()>;
}

impl<F> ContextCleanup for F
where
    F: FnMut(ContextVersion, ContextHandle) -> Result<()>,
{
    fn destroy(&mut self, version: ContextVersion, handle: ContextHandle) -> Result<()> {
        self(version, handle)
    }
}

/// Forces the handle to release its native resources, then drops it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseCleanup;

impl ContextCleanup for ReleaseCleanup {
    fn destroy(&mut self, version: ContextVersion, handle: ContextHandle) -> Result<()> {
        handle
            .release()
            .map_err(|reason| ContextError::Cleanup { version, reason })
    }
}

/// One object serving as both factory and cleanup.
///
/// Used by [`ContextManager::set_policy`](crate::ContextManager::set_policy)
/// to install a combined strategy into the two independent slots.
pub struct SharedPolicy<P>(Rc<RefCell<P>>);

impl<P> SharedPolicy<P> {
    pub fn new(policy: P) -> Self {
        Self(Rc::new(RefCell::new(policy)))
    }
}

impl<P> Clone for SharedPolicy<P> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<P: ContextFactory> ContextFactory for SharedPolicy<P> {
    fn construct(&mut self, version: ContextVersion) -> Result<ContextHandle> {
        self.0.borrow_mut().construct(version)
    }
}

impl<P: ContextCleanup> ContextCleanup for SharedPolicy<P> {
    fn destroy(&mut self, version: ContextVersion, handle: ContextHandle) -> Result<()> {
        self.0.borrow_mut().destroy(version, handle)
    }
}

// ---------------------------------------------------------------------------
// Client fallback
// ---------------------------------------------------------------------------

type FactoryProvider = Box<dyn Fn() -> Box<dyn ContextFactory>>;
type CleanupProvider = Box<dyn Fn() -> Box<dyn ContextCleanup>>;

/// Built-in policy for the interactive-client environment.
///
/// Holds providers rather than instances: nothing is created until the
/// registry needs a strategy and none was injected.
pub struct ClientFallback {
    factory: FactoryProvider,
    cleanup: CleanupProvider,
}

impl ClientFallback {
    pub fn new<F, C>(factory: F, cleanup: C) -> Self
    where
        F: Fn() -> Box<dyn ContextFactory> + 'static,
        C: Fn() -> Box<dyn ContextCleanup> + 'static,
    {
        Self {
            factory: Box::new(factory),
            cleanup: Box::new(cleanup),
        }
    }

    /// The platform's native client policy, if it has one.
    ///
    /// On `wasm32` this is a canvas-backed WebGL factory paired with
    /// [`ReleaseCleanup`]. Other targets have no built-in client.
    #[must_use]
    pub fn platform_default() -> Option<Self> {
        #[cfg(target_arch = "wasm32")]
        {
            Some(Self::new(
                || Box::new(CanvasFactory::default()),
                || Box::new(ReleaseCleanup),
            ))
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            None
        }
    }

    pub(crate) fn resolve_factory(&self) -> Box<dyn ContextFactory> {
        (self.factory)()
    }

    pub(crate) fn resolve_cleanup(&self) -> Box<dyn ContextCleanup> {
        (self.cleanup)()
    }
}

impl fmt::Debug for ClientFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientFallback").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// ContextAttributes
// ---------------------------------------------------------------------------

/// Creation attributes requested by the built-in client factory.
///
/// The defaults ask for a bare compute-friendly surface: no alpha, no
/// multisampling, no depth or stencil buffers, and refusal of software
/// rasterizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextAttributes {
    pub alpha: bool,
    pub antialias: bool,
    pub premultiplied_alpha: bool,
    pub preserve_drawing_buffer: bool,
    pub depth: bool,
    pub stencil: bool,
    pub fail_if_major_performance_caveat: bool,
    /// Use an `OffscreenCanvas` when the host provides one.
    pub prefer_offscreen: bool,
    /// Backing surface size in pixels.
    pub width: u32,
    pub height: u32,
}

impl Default for ContextAttributes {
    fn default() -> Self {
        Self {
            alpha: false,
            antialias: false,
            premultiplied_alpha: false,
            preserve_drawing_buffer: false,
            depth: false,
            stencil: false,
            fail_if_major_performance_caveat: true,
            prefer_offscreen: true,
            width: 300,
            height: 150,
        }
    }
}
