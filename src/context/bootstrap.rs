//! Baseline render state for freshly constructed contexts.

use crate::context::check::call_and_check;
use crate::context::{Capability, CullFace, GraphicsContext};
use crate::errors::Result;

/// One state-setting call of the bootstrap sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootstrapStep {
    Disable(Capability),
    Enable(Capability),
    CullFace(CullFace),
}

/// Applied in order, exactly once per constructed context.
pub const BOOTSTRAP_SEQUENCE: [BootstrapStep; 9] = [
    BootstrapStep::Disable(Capability::DepthTest),
    BootstrapStep::Disable(Capability::StencilTest),
    BootstrapStep::Disable(Capability::Blend),
    BootstrapStep::Disable(Capability::Dither),
    BootstrapStep::Disable(Capability::PolygonOffsetFill),
    BootstrapStep::Disable(Capability::SampleCoverage),
    BootstrapStep::Enable(Capability::ScissorTest),
    BootstrapStep::Enable(Capability::CullFace),
    BootstrapStep::CullFace(CullFace::Back),
];

/// Puts `context` into the baseline state so consumers never inherit
/// driver defaults.
///
/// With `debug` set every call is followed by an error check and the first
/// failure aborts the sequence.
pub fn bootstrap(context: &dyn GraphicsContext, debug: bool) -> Result<()> {
    for step in BOOTSTRAP_SEQUENCE {
        call_and_check(context, debug, || match step {
            BootstrapStep::Disable(capability) => context.disable(capability),
            BootstrapStep::Enable(capability) => context.enable(capability),
            BootstrapStep::CullFace(face) => context.cull_face(face),
        })?;
    }
    Ok(())
}
