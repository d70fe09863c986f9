//! Lifecycle Policy Tests
//!
//! Tests for:
//! - Client fallback: lazy resolution, injected policies taking precedence
//! - Combined policies installed through `set_policy`
//! - ReleaseCleanup forcing native release

mod support;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glctx::{
    ClientFallback, ContextCleanup, ContextError, ContextFactory, ContextHandle, ContextManager,
    ContextVersion, ReleaseCleanup, Result,
};

use support::{Call, Harness, MockContext, same};

const V1: ContextVersion = ContextVersion::V1;

/// A fallback whose providers count how often they are resolved.
fn counting_fallback(harness: &Harness) -> (ClientFallback, Rc<Cell<u32>>, Rc<Cell<u32>>) {
    let factory_resolutions = Rc::new(Cell::new(0));
    let cleanup_resolutions = Rc::new(Cell::new(0));

    let created = Rc::clone(&harness.created);
    let factory_count = Rc::clone(&factory_resolutions);
    let cleanup_count = Rc::clone(&cleanup_resolutions);

    let fallback = ClientFallback::new(
        move || {
            factory_count.set(factory_count.get() + 1);
            let created = Rc::clone(&created);
            Box::new(move |version: ContextVersion| -> Result<ContextHandle> {
                let id = created.borrow().len();
                let mock = Rc::new(MockContext::new(id, "client", version));
                created.borrow_mut().push(Rc::clone(&mock));
                Ok(mock)
            }) as Box<dyn ContextFactory>
        },
        move || {
            cleanup_count.set(cleanup_count.get() + 1);
            Box::new(ReleaseCleanup) as Box<dyn ContextCleanup>
        },
    );

    (fallback, factory_resolutions, cleanup_resolutions)
}

// ============================================================================
// Client fallback
// ============================================================================

#[test]
fn fallback_is_resolved_lazily_on_first_request() {
    let harness = Harness::new();
    harness.set_flags(|flags| flags.is_interactive_client = true);
    let (fallback, factories, _) = counting_fallback(&harness);
    let mut manager = harness.manager().with_client_fallback(fallback);

    assert_eq!(factories.get(), 0);
    assert!(!manager.has_factory());

    let handle = manager.get_context_by_version(V1).unwrap();
    manager.get_context_by_version(ContextVersion::V2).unwrap();

    assert_eq!(factories.get(), 1, "resolved once, then reused");
    assert!(manager.has_factory());
    assert_eq!(harness.context(0).tag, "client");
    assert!(same(&handle, &harness.context(0)));
}

#[test]
fn injected_factory_wins_over_fallback() {
    let harness = Harness::new();
    harness.set_flags(|flags| flags.is_interactive_client = true);
    let (fallback, factories, _) = counting_fallback(&harness);
    let mut manager = harness.manager().with_client_fallback(fallback);

    manager.set_context_factory(harness.factory("injected"));
    manager.get_context_by_version(V1).unwrap();

    assert_eq!(factories.get(), 0);
    assert_eq!(harness.context(0).tag, "injected");
}

#[test]
fn fallback_cleanup_releases_the_native_context() {
    let harness = Harness::new();
    harness.set_flags(|flags| flags.is_interactive_client = true);
    let (fallback, _, cleanups) = counting_fallback(&harness);
    let mut manager = harness.manager().with_client_fallback(fallback);

    manager.get_context_by_version(V1).unwrap();
    assert_eq!(cleanups.get(), 0);

    manager.dispose_context(V1).unwrap();

    assert_eq!(cleanups.get(), 1);
    assert!(manager.has_cleanup());
    assert_eq!(harness.context(0).count(Call::Release), 1);
}

#[test]
fn injected_cleanup_wins_over_fallback() {
    let harness = Harness::new();
    harness.set_flags(|flags| flags.is_interactive_client = true);
    let (fallback, _, cleanups) = counting_fallback(&harness);
    let mut manager = harness.manager().with_client_fallback(fallback);
    manager.set_context_cleanup(harness.cleanup());

    manager.get_context_by_version(V1).unwrap();
    manager.dispose_context(V1).unwrap();

    assert_eq!(cleanups.get(), 0);
    assert_eq!(harness.destroyed_ids(), vec![0]);
}

#[test]
fn fallback_is_ignored_outside_the_client() {
    let harness = Harness::new();
    let (fallback, factories, _) = counting_fallback(&harness);
    let mut manager = harness.manager().with_client_fallback(fallback);

    let err = manager.get_context_by_version(V1).unwrap_err();

    assert!(err.is_configuration());
    assert_eq!(factories.get(), 0);
}

#[test]
fn client_without_fallback_is_a_configuration_error() {
    let harness = Harness::new();
    harness.set_flags(|flags| flags.is_interactive_client = true);
    let mut manager = harness.manager();

    let err = manager.get_context_by_version(V1).unwrap_err();

    assert!(err.is_configuration());
    assert!(manager.cached_versions().is_empty());
}

#[cfg(not(target_arch = "wasm32"))]
#[test]
fn native_targets_have_no_platform_fallback() {
    assert!(ClientFallback::platform_default().is_none());
}

// ============================================================================
// Combined policies
// ============================================================================

#[derive(Default)]
struct CountingPolicy {
    constructed: Rc<RefCell<Vec<Rc<MockContext>>>>,
    destroyed: Rc<Cell<u32>>,
}

impl ContextFactory for CountingPolicy {
    fn construct(&mut self, version: ContextVersion) -> Result<ContextHandle> {
        let id = self.constructed.borrow().len();
        let mock = Rc::new(MockContext::new(id, "policy", version));
        self.constructed.borrow_mut().push(Rc::clone(&mock));
        Ok(mock)
    }
}

impl ContextCleanup for CountingPolicy {
    fn destroy(&mut self, _version: ContextVersion, handle: ContextHandle) -> Result<()> {
        self.destroyed.set(self.destroyed.get() + 1);
        drop(handle);
        Ok(())
    }
}

#[test]
fn set_policy_installs_both_strategies() {
    let harness = Harness::new();
    let policy = CountingPolicy::default();
    let constructed = Rc::clone(&policy.constructed);
    let destroyed = Rc::clone(&policy.destroyed);

    let mut manager = harness.manager();
    manager.set_policy(policy);
    assert!(manager.has_factory() && manager.has_cleanup());

    let handle = manager.get_context_by_version(V1).unwrap();
    manager.dispose_context(V1).unwrap();

    assert_eq!(constructed.borrow().len(), 1);
    assert!(same(&handle, &constructed.borrow()[0]));
    assert_eq!(destroyed.get(), 1);
}

#[test]
fn set_policy_releases_old_contexts_through_old_cleanup() {
    let harness = Harness::new();
    let mut manager = harness.ready_manager();
    manager.get_context_by_version(V1).unwrap();

    let policy = CountingPolicy::default();
    let destroyed = Rc::clone(&policy.destroyed);
    manager.set_policy(policy);

    assert_eq!(harness.destroyed_ids(), vec![0]);
    assert_eq!(destroyed.get(), 0);
}

// ============================================================================
// ReleaseCleanup
// ============================================================================

#[test]
fn release_cleanup_forces_release() {
    let mock = Rc::new(MockContext::new(0, "bare", V1));
    let handle: ContextHandle = mock.clone();

    ReleaseCleanup.destroy(V1, handle).unwrap();

    assert_eq!(mock.calls(), vec![Call::Release]);
}

#[test]
fn release_cleanup_reports_refusal() {
    let mock = Rc::new(MockContext::new(0, "bare", V1));
    mock.fail_release();

    let err = ReleaseCleanup.destroy(V1, mock).unwrap_err();

    assert!(matches!(err, ContextError::Cleanup { ref reason, .. } if reason == "release refused"));
}

#[test]
fn manager_debug_output_lists_cached_versions() {
    let harness = Harness::new();
    let mut manager: ContextManager = harness.ready_manager();
    manager.get_context_by_version(V1).unwrap();

    let debug = format!("{manager:?}");

    assert!(debug.contains("cached_versions: [ContextVersion(1)]"));
}
