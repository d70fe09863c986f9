//! Rendering Context Abstraction
//!
//! Provides:
//! - [`GraphicsContext`]: the minimal native surface the registry needs
//!   (state toggles, error query, liveness query, forced release)
//! - [`ContextHandle`]: shared, registry-owned reference to a live context
//! - [`ContextVersion`]: API version key (1 = WebGL 1 / GLES 2, 2 = WebGL 2 / GLES 3)
//! - [`check`]: error-code naming and the debug error-checking wrapper
//! - [`bootstrap`]: the fixed baseline render state applied to new contexts

pub mod bootstrap;
pub mod check;

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

pub use bootstrap::{BOOTSTRAP_SEQUENCE, BootstrapStep, bootstrap};
pub use check::{GlErrorCode, call_and_check, check_error, describe_error_code};

// ---------------------------------------------------------------------------
// ContextVersion
// ---------------------------------------------------------------------------

/// Rendering API version identifier used as the registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextVersion(u32);

impl ContextVersion {
    /// WebGL 1.0 / OpenGL ES 2.0.
    pub const V1: Self = Self(1);
    /// WebGL 2.0 / OpenGL ES 3.0.
    pub const V2: Self = Self(2);

    #[inline]
    #[must_use]
    pub const fn new(version: u32) -> Self {
        Self(version)
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for ContextVersion {
    fn from(version: u32) -> Self {
        Self(version)
    }
}

impl fmt::Display for ContextVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Render state enums
// ---------------------------------------------------------------------------

/// Server-side capabilities toggled through `enable` / `disable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    DepthTest,
    StencilTest,
    Blend,
    Dither,
    PolygonOffsetFill,
    SampleCoverage,
    ScissorTest,
    CullFace,
}

impl Capability {
    /// Returns the GL enum value for this capability.
    #[inline]
    #[must_use]
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::DepthTest => 0x0B71,
            Self::StencilTest => 0x0B90,
            Self::Blend => 0x0BE2,
            Self::Dither => 0x0BD0,
            Self::PolygonOffsetFill => 0x8037,
            Self::SampleCoverage => 0x80A0,
            Self::ScissorTest => 0x0C11,
            Self::CullFace => 0x0B44,
        }
    }
}

/// Which polygon faces are culled when [`Capability::CullFace`] is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullFace {
    Front,
    #[default]
    Back,
    FrontAndBack,
}

impl CullFace {
    #[inline]
    #[must_use]
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::Front => 0x0404,
            Self::Back => 0x0405,
            Self::FrontAndBack => 0x0408,
        }
    }
}

// ---------------------------------------------------------------------------
// GraphicsContext
// ---------------------------------------------------------------------------

/// A native hardware-accelerated rendering context.
///
/// Implementations wrap whatever the platform hands out (a browser
/// `WebGl2RenderingContext`, an EGL context made current on this thread, or a
/// test double). All methods take `&self`: native contexts are
/// single-threaded and mutate driver-side state only.
pub trait GraphicsContext {
    /// Enables a server-side capability.
    fn enable(&self, capability: Capability);

    /// Disables a server-side capability.
    fn disable(&self, capability: Capability);

    /// Selects which faces are culled.
    fn cull_face(&self, face: CullFace);

    /// Pops the oldest recorded error code, `0` when there is none.
    fn get_error(&self) -> u32;

    /// Returns `true` once the driver has invalidated this context.
    fn is_context_lost(&self) -> bool;

    /// Forces the native context to give up its resources.
    ///
    /// Called by [`ReleaseCleanup`](crate::policy::ReleaseCleanup) right
    /// before the registry drops its reference. The default does nothing.
    fn release(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Registry-owned reference to a live context.
///
/// Consumers receive clones; only the registry decides when the context is
/// handed to cleanup.
pub type ContextHandle = Rc<dyn GraphicsContext>;

impl fmt::Debug for dyn GraphicsContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphicsContext")
            .field("lost", &self.is_context_lost())
            .finish_non_exhaustive()
    }
}
