//! Shared test doubles: a recording mock context and counting policies.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use glctx::{
    Capability, ContextError, ContextHandle, ContextManager, ContextVersion, CullFace, Flags,
    GraphicsContext, Result,
};

/// One call observed on a [`MockContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Enable(Capability),
    Disable(Capability),
    CullFace(CullFace),
    GetError,
    Release,
}

/// Expected state calls issued by bootstrap, in order.
pub const BOOTSTRAP_CALLS: [Call; 9] = [
    Call::Disable(Capability::DepthTest),
    Call::Disable(Capability::StencilTest),
    Call::Disable(Capability::Blend),
    Call::Disable(Capability::Dither),
    Call::Disable(Capability::PolygonOffsetFill),
    Call::Disable(Capability::SampleCoverage),
    Call::Enable(Capability::ScissorTest),
    Call::Enable(Capability::CullFace),
    Call::CullFace(CullFace::Back),
];

pub struct MockContext {
    pub id: usize,
    pub tag: &'static str,
    pub version: ContextVersion,
    calls: RefCell<Vec<Call>>,
    errors: RefCell<VecDeque<u32>>,
    lost: Cell<bool>,
    release_fails: Cell<bool>,
}

impl MockContext {
    pub fn new(id: usize, tag: &'static str, version: ContextVersion) -> Self {
        Self {
            id,
            tag,
            version,
            calls: RefCell::new(Vec::new()),
            errors: RefCell::new(VecDeque::new()),
            lost: Cell::new(false),
            release_fails: Cell::new(false),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// State calls only, without error queries.
    pub fn state_calls(&self) -> Vec<Call> {
        self.calls
            .borrow()
            .iter()
            .copied()
            .filter(|call| !matches!(call, Call::GetError | Call::Release))
            .collect()
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls.borrow().iter().filter(|c| **c == call).count()
    }

    /// The next `get_error` returns `code`.
    pub fn queue_error(&self, code: u32) {
        self.errors.borrow_mut().push_back(code);
    }

    pub fn lose(&self) {
        self.lost.set(true);
    }

    pub fn fail_release(&self) {
        self.release_fails.set(true);
    }
}

impl GraphicsContext for MockContext {
    fn enable(&self, capability: Capability) {
        self.calls.borrow_mut().push(Call::Enable(capability));
    }

    fn disable(&self, capability: Capability) {
        self.calls.borrow_mut().push(Call::Disable(capability));
    }

    fn cull_face(&self, face: CullFace) {
        self.calls.borrow_mut().push(Call::CullFace(face));
    }

    fn get_error(&self) -> u32 {
        self.calls.borrow_mut().push(Call::GetError);
        self.errors.borrow_mut().pop_front().unwrap_or(0)
    }

    fn is_context_lost(&self) -> bool {
        self.lost.get()
    }

    fn release(&self) -> std::result::Result<(), String> {
        self.calls.borrow_mut().push(Call::Release);
        if self.release_fails.get() {
            Err("release refused".to_string())
        } else {
            Ok(())
        }
    }
}

/// Returns `true` when `handle` points at `mock`.
pub fn same(handle: &ContextHandle, mock: &Rc<MockContext>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(handle), Rc::as_ptr(mock))
}

/// Flags, a construction log and a destruction log shared with the
/// policies handed to a manager.
pub struct Harness {
    pub flags: Rc<RefCell<Flags>>,
    pub created: Rc<RefCell<Vec<Rc<MockContext>>>>,
    pub destroyed: Rc<RefCell<Vec<(ContextVersion, usize)>>>,
}

impl Harness {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self {
            flags: Rc::new(RefCell::new(Flags {
                version: 1,
                debug: false,
                is_interactive_client: false,
            })),
            created: Rc::new(RefCell::new(Vec::new())),
            destroyed: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn set_flags(&self, update: impl FnOnce(&mut Flags)) {
        update(&mut self.flags.borrow_mut());
    }

    /// A manager over these flags with no built-in client policy.
    pub fn manager(&self) -> ContextManager {
        ContextManager::new(Rc::clone(&self.flags)).without_client_fallback()
    }

    /// A manager with a counting factory and cleanup installed.
    pub fn ready_manager(&self) -> ContextManager {
        let mut manager = self.manager();
        manager.set_context_factory(self.factory("default"));
        manager.set_context_cleanup(self.cleanup());
        manager
    }

    pub fn factory(
        &self,
        tag: &'static str,
    ) -> impl FnMut(ContextVersion) -> Result<ContextHandle> + 'static {
        self.factory_with(tag, |_| {})
    }

    /// A factory whose contexts are passed through `configure` before being
    /// handed to the manager.
    pub fn factory_with(
        &self,
        tag: &'static str,
        configure: impl Fn(&MockContext) + 'static,
    ) -> impl FnMut(ContextVersion) -> Result<ContextHandle> + 'static {
        let created = Rc::clone(&self.created);
        move |version: ContextVersion| -> Result<ContextHandle> {
            let id = created.borrow().len();
            let mock = Rc::new(MockContext::new(id, tag, version));
            configure(&mock);
            created.borrow_mut().push(Rc::clone(&mock));
            Ok(mock)
        }
    }

    /// Records the destroyed context and forces its release.
    pub fn cleanup(&self) -> impl FnMut(ContextVersion, ContextHandle) -> Result<()> + 'static {
        let created = Rc::clone(&self.created);
        let destroyed = Rc::clone(&self.destroyed);
        move |version: ContextVersion, handle: ContextHandle| -> Result<()> {
            let id = created
                .borrow()
                .iter()
                .find(|mock| same(&handle, mock))
                .map_or(usize::MAX, |mock| mock.id);
            destroyed.borrow_mut().push((version, id));
            handle
                .release()
                .map_err(|reason| ContextError::Cleanup { version, reason })
        }
    }

    pub fn context(&self, id: usize) -> Rc<MockContext> {
        Rc::clone(&self.created.borrow()[id])
    }

    pub fn constructed(&self) -> usize {
        self.created.borrow().len()
    }

    pub fn destroyed_ids(&self) -> Vec<usize> {
        self.destroyed.borrow().iter().map(|(_, id)| *id).collect()
    }
}
