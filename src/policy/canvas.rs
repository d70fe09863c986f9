//! Browser canvas backend (wasm32 only).
//!
//! [`CanvasFactory`] acquires a WebGL context from a fresh canvas: an
//! `OffscreenCanvas` when the host has one and it was asked for, a detached
//! DOM `<canvas>` otherwise. Version 1 maps to `"webgl"`, version 2 to
//! `"webgl2"`.
//!
//! The returned [`CanvasContext`] listens for `webglcontextlost`, cancels the
//! default handling so the browser may restore the canvas, and reports itself
//! lost from then on. Its `release` goes through `WEBGL_lose_context`.

use std::cell::Cell;
use std::rc::Rc;

use js_sys::Object;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Event, EventTarget, HtmlCanvasElement, OffscreenCanvas, WebGl2RenderingContext,
    WebGlContextAttributes, WebglLoseContext, WebGlRenderingContext,
};

use crate::context::{Capability, ContextHandle, ContextVersion, CullFace, GraphicsContext};
use crate::errors::{ContextError, Result};
use crate::policy::{ContextAttributes, ContextFactory};

const CONTEXT_LOST_EVENT: &str = "webglcontextlost";
const LOSE_CONTEXT_EXTENSION: &str = "WEBGL_lose_context";

fn js_reason(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

// ---------------------------------------------------------------------------
// Surfaces
// ---------------------------------------------------------------------------

enum Surface {
    Dom(HtmlCanvasElement),
    Offscreen(OffscreenCanvas),
}

impl Surface {
    fn create(attributes: &ContextAttributes) -> std::result::Result<Self, String> {
        if attributes.prefer_offscreen && offscreen_supported() {
            let canvas = OffscreenCanvas::new(attributes.width, attributes.height)
                .map_err(|e| js_reason(&e))?;
            return Ok(Self::Offscreen(canvas));
        }

        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| "no document to create a canvas in".to_string())?;
        let canvas = document
            .create_element("canvas")
            .map_err(|e| js_reason(&e))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| "created element is not a canvas".to_string())?;
        canvas.set_width(attributes.width);
        canvas.set_height(attributes.height);
        Ok(Self::Dom(canvas))
    }

    fn get_context(
        &self,
        context_id: &str,
        options: &JsValue,
    ) -> std::result::Result<Option<Object>, JsValue> {
        match self {
            Self::Dom(canvas) => canvas.get_context_with_context_options(context_id, options),
            Self::Offscreen(canvas) => canvas.get_context_with_context_options(context_id, options),
        }
    }

    fn event_target(&self) -> &EventTarget {
        match self {
            Self::Dom(canvas) => canvas.as_ref(),
            Self::Offscreen(canvas) => canvas.as_ref(),
        }
    }
}

fn offscreen_supported() -> bool {
    js_sys::Reflect::has(&js_sys::global(), &JsValue::from_str("OffscreenCanvas")).unwrap_or(false)
}

fn web_sys_attributes(attributes: &ContextAttributes) -> WebGlContextAttributes {
    let options = WebGlContextAttributes::new();
    options.set_alpha(attributes.alpha);
    options.set_antialias(attributes.antialias);
    options.set_premultiplied_alpha(attributes.premultiplied_alpha);
    options.set_preserve_drawing_buffer(attributes.preserve_drawing_buffer);
    options.set_depth(attributes.depth);
    options.set_stencil(attributes.stencil);
    options.set_fail_if_major_performance_caveat(attributes.fail_if_major_performance_caveat);
    options
}

// ---------------------------------------------------------------------------
// CanvasContext
// ---------------------------------------------------------------------------

enum Gl {
    WebGl1(WebGlRenderingContext),
    WebGl2(WebGl2RenderingContext),
}

macro_rules! with_gl {
    ($gl:expr, $ctx:ident => $body:expr) => {
        match $gl {
            Gl::WebGl1($ctx) => $body,
            Gl::WebGl2($ctx) => $body,
        }
    };
}

/// A WebGL context owned by a canvas created for it.
pub struct CanvasContext {
    gl: Gl,
    surface: Surface,
    lost: Rc<Cell<bool>>,
    on_lost: Closure<dyn FnMut(Event)>,
}

impl CanvasContext {
    /// Returns the WebGL 2 context, `None` for a WebGL 1 handle.
    #[must_use]
    pub fn webgl2(&self) -> Option<&WebGl2RenderingContext> {
        match &self.gl {
            Gl::WebGl2(gl) => Some(gl),
            Gl::WebGl1(_) => None,
        }
    }

    /// Returns the WebGL 1 context, `None` for a WebGL 2 handle.
    #[must_use]
    pub fn webgl1(&self) -> Option<&WebGlRenderingContext> {
        match &self.gl {
            Gl::WebGl1(gl) => Some(gl),
            Gl::WebGl2(_) => None,
        }
    }
}

impl GraphicsContext for CanvasContext {
    fn enable(&self, capability: Capability) {
        with_gl!(&self.gl, gl => gl.enable(capability.gl_enum()));
    }

    fn disable(&self, capability: Capability) {
        with_gl!(&self.gl, gl => gl.disable(capability.gl_enum()));
    }

    fn cull_face(&self, face: CullFace) {
        with_gl!(&self.gl, gl => gl.cull_face(face.gl_enum()));
    }

    fn get_error(&self) -> u32 {
        with_gl!(&self.gl, gl => gl.get_error())
    }

    fn is_context_lost(&self) -> bool {
        self.lost.get() || with_gl!(&self.gl, gl => gl.is_context_lost())
    }

    fn release(&self) -> std::result::Result<(), String> {
        let extension = with_gl!(&self.gl, gl => gl.get_extension(LOSE_CONTEXT_EXTENSION))
            .map_err(|e| js_reason(&e))?;
        match extension {
            Some(extension) => {
                extension.unchecked_into::<WebglLoseContext>().lose_context();
                Ok(())
            }
            None => {
                log::debug!("{LOSE_CONTEXT_EXTENSION} unavailable; leaving release to the collector");
                Ok(())
            }
        }
    }
}

impl Drop for CanvasContext {
    fn drop(&mut self) {
        // The callback is invalid once `on_lost` drops.
        let _ = self.surface.event_target().remove_event_listener_with_callback(
            CONTEXT_LOST_EVENT,
            self.on_lost.as_ref().unchecked_ref(),
        );
    }
}

// ---------------------------------------------------------------------------
// CanvasFactory
// ---------------------------------------------------------------------------

/// Default client factory: one fresh canvas per constructed context.
#[derive(Debug, Clone, Default)]
pub struct CanvasFactory {
    pub attributes: ContextAttributes,
}

impl CanvasFactory {
    #[must_use]
    pub fn new(attributes: ContextAttributes) -> Self {
        Self { attributes }
    }

    fn create(&self, version: ContextVersion) -> std::result::Result<CanvasContext, String> {
        let context_id = match version.get() {
            1 => "webgl",
            2 => "webgl2",
            other => return Err(format!("unsupported WebGL version {other}")),
        };

        let surface = Surface::create(&self.attributes)?;
        let options = JsValue::from(web_sys_attributes(&self.attributes));
        let raw = surface
            .get_context(context_id, &options)
            .map_err(|e| js_reason(&e))?
            .ok_or_else(|| format!("{context_id} is not available on this canvas"))?;

        let gl = if version.get() == 1 {
            Gl::WebGl1(raw.unchecked_into())
        } else {
            Gl::WebGl2(raw.unchecked_into())
        };

        let lost = Rc::new(Cell::new(false));
        let on_lost = {
            let lost = Rc::clone(&lost);
            Closure::<dyn FnMut(Event)>::new(move |event: Event| {
                event.prevent_default();
                lost.set(true);
            })
        };
        surface
            .event_target()
            .add_event_listener_with_callback(CONTEXT_LOST_EVENT, on_lost.as_ref().unchecked_ref())
            .map_err(|e| js_reason(&e))?;

        Ok(CanvasContext {
            gl,
            surface,
            lost,
            on_lost,
        })
    }
}

impl ContextFactory for CanvasFactory {
    fn construct(&mut self, version: ContextVersion) -> Result<ContextHandle> {
        let context = self
            .create(version)
            .map_err(|reason| ContextError::ContextCreation { version, reason })?;
        Ok(Rc::new(context))
    }
}
