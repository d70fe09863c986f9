//! Context Registry
//!
//! [`ContextManager`] owns every live rendering context, at most one per
//! [`ContextVersion`], together with the two policy slots used to build and
//! release them.
//!
//! # Retrieval
//!
//! `get_context_by_version` returns the cached handle while it is healthy.
//! On a miss it constructs a context through the factory, applies the
//! bootstrap state and caches it. A cached handle that reports itself lost
//! is disposed through the cleanup and rebuilt before the call returns, so
//! callers never observe a half-recovered registry. Rebuilding is bounded by
//! [`ManagerOptions::max_loss_retries`]; a context that is still lost after
//! that fails with [`ContextError::PersistentContextLoss`].
//!
//! # Threading
//!
//! Rendering contexts are single-threaded resources and so is the manager:
//! it is `!Send`, holds no locks, and every call completes synchronously.
//! Sharing one manager across threads is the caller's problem to avoid.
//!
//! ```rust,ignore
//! let mut manager = ContextManager::new(Flags::from_env());
//! manager.set_context_factory(my_factory);
//! manager.set_context_cleanup(ReleaseCleanup);
//!
//! let gl = manager.get_active_context()?;
//! ```

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::context::{ContextHandle, ContextVersion, bootstrap, check_error};
use crate::errors::{ContextError, Result};
use crate::flags::{self, Environment};
use crate::policy::{ClientFallback, ContextCleanup, ContextFactory, SharedPolicy};

// ---------------------------------------------------------------------------
// ManagerOptions
// ---------------------------------------------------------------------------

/// Behavior switches for [`ContextManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerOptions {
    /// Hand every cached context to the current cleanup when the factory is
    /// replaced. When `false` the cache is only forgotten and native release
    /// is left to the handles' own drop.
    pub eager_dispose_on_swap: bool,

    /// Rebuilds allowed per retrieval after a context is found lost.
    pub max_loss_retries: u32,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            eager_dispose_on_swap: true,
            max_loss_retries: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// ContextManager
// ---------------------------------------------------------------------------

/// Owner of cached rendering contexts and their lifecycle policy.
pub struct ContextManager {
    contexts: FxHashMap<ContextVersion, ContextHandle>,
    factory: Option<Box<dyn ContextFactory>>,
    cleanup: Option<Box<dyn ContextCleanup>>,
    fallback: Option<ClientFallback>,
    environment: Box<dyn Environment>,
    options: ManagerOptions,
}

impl ContextManager {
    /// Creates an empty manager reading flags from `environment`.
    ///
    /// The platform's built-in client policy, if any, is registered as the
    /// fallback but not resolved.
    pub fn new(environment: impl Environment + 'static) -> Self {
        Self {
            contexts: FxHashMap::default(),
            factory: None,
            cleanup: None,
            fallback: ClientFallback::platform_default(),
            environment: Box::new(environment),
            options: ManagerOptions::default(),
        }
    }

    /// Replaces the behavior switches.
    #[must_use]
    pub fn with_options(mut self, options: ManagerOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the built-in client policy.
    #[must_use]
    pub fn with_client_fallback(mut self, fallback: ClientFallback) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Removes the built-in client policy.
    #[must_use]
    pub fn without_client_fallback(mut self) -> Self {
        self.fallback = None;
        self
    }

    /// Current behavior switches.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ManagerOptions {
        &self.options
    }

    // === Flags ===

    fn debug_enabled(&self) -> bool {
        self.environment.get_bool(flags::DEBUG).unwrap_or(false)
    }

    fn is_interactive_client(&self) -> bool {
        self.environment
            .get_bool(flags::IS_INTERACTIVE_CLIENT)
            .unwrap_or(false)
    }

    /// Resolves the version named by the `VERSION` flag.
    pub fn active_version(&self) -> Result<ContextVersion> {
        let raw = self.environment.get_number(flags::VERSION).ok_or_else(|| {
            ContextError::configuration(format!("flag {} is not set", flags::VERSION))
        })?;

        if !raw.is_finite() || raw.fract() != 0.0 || raw < 1.0 || raw > f64::from(u32::MAX) {
            return Err(ContextError::configuration(format!(
                "flag {} must be a positive integer, got {raw}",
                flags::VERSION
            )));
        }
        Ok(ContextVersion::new(raw as u32))
    }

    // === Retrieval ===

    /// Returns a live context for the version named by the `VERSION` flag.
    pub fn get_active_context(&mut self) -> Result<ContextHandle> {
        let version = self.active_version()?;
        self.get_context_by_version(version)
    }

    /// Returns a live context for `version`, building or rebuilding it as
    /// needed.
    pub fn get_context_by_version(&mut self, version: ContextVersion) -> Result<ContextHandle> {
        let mut rebuilds = 0;
        loop {
            self.ensure_factory()?;

            let live = match self.contexts.get(&version) {
                Some(handle) => Some(Rc::clone(handle)),
                None => self.create_context(version)?,
            };

            if let Some(handle) = live {
                if !handle.is_context_lost() {
                    return Ok(handle);
                }
            }

            if rebuilds >= self.options.max_loss_retries {
                self.dispose_lost(version);
                return Err(ContextError::PersistentContextLoss {
                    version,
                    attempts: rebuilds,
                });
            }

            rebuilds += 1;
            log::warn!("Context for version {version} was lost, rebuilding (attempt {rebuilds})");
            self.dispose_lost(version);
        }
    }

    fn ensure_factory(&mut self) -> Result<()> {
        if self.factory.is_some() {
            return Ok(());
        }
        if !self.is_interactive_client() {
            return Err(ContextError::configuration("no context factory registered"));
        }
        let Some(fallback) = &self.fallback else {
            return Err(ContextError::configuration(
                "no context factory registered and this platform has no built-in client policy",
            ));
        };

        log::info!("No context factory registered, using the built-in client policy");
        self.factory = Some(fallback.resolve_factory());
        Ok(())
    }

    /// Builds, bootstraps and caches a context.
    ///
    /// Returns `None` when the context was lost before bootstrap finished; it
    /// has already been released and nothing is cached.
    fn create_context(&mut self, version: ContextVersion) -> Result<Option<ContextHandle>> {
        let factory = self
            .factory
            .as_mut()
            .ok_or_else(|| ContextError::configuration("no context factory registered"))?;
        let handle = factory.construct(version)?;

        let debug = self.debug_enabled();
        let initialized = bootstrap(handle.as_ref(), debug).and_then(|()| {
            if debug {
                check_error(handle.as_ref())
            } else {
                Ok(())
            }
        });

        if let Err(err) = initialized {
            let lost = handle.is_context_lost();
            if let Err(cleanup_err) = self.release(version, handle) {
                log::warn!("Cleanup after failed bootstrap of version {version}: {cleanup_err}");
            }
            if lost {
                log::debug!("Context for version {version} was lost during bootstrap: {err}");
                return Ok(None);
            }
            return Err(err);
        }

        log::debug!("Created context for version {version}");
        self.contexts.insert(version, Rc::clone(&handle));
        Ok(Some(handle))
    }

    // === Disposal ===

    /// Disposes the context named by the `VERSION` flag. No-op when none is
    /// cached.
    pub fn dispose_active_context(&mut self) -> Result<()> {
        let version = self.active_version()?;
        self.dispose_context(version)
    }

    /// Disposes the cached context for `version`. No-op when none is cached.
    ///
    /// The entry is removed before cleanup runs, so a failing cleanup never
    /// leaves a stale entry behind.
    pub fn dispose_context(&mut self, version: ContextVersion) -> Result<()> {
        let Some(handle) = self.contexts.remove(&version) else {
            return Ok(());
        };
        log::debug!("Disposing context for version {version}");
        self.release(version, handle)
    }

    /// Disposes every cached context. All entries are removed; the first
    /// cleanup failure is returned.
    pub fn dispose_all(&mut self) -> Result<()> {
        let mut first_err = None;
        for version in self.cached_versions() {
            if let Err(err) = self.dispose_context(version) {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn dispose_lost(&mut self, version: ContextVersion) {
        if let Err(err) = self.dispose_context(version) {
            log::warn!("Cleanup of lost context for version {version} failed: {err}");
        }
    }

    fn release(&mut self, version: ContextVersion, handle: ContextHandle) -> Result<()> {
        if self.cleanup.is_none() && self.is_interactive_client() {
            if let Some(fallback) = &self.fallback {
                log::info!("No context cleanup registered, using the built-in client policy");
                self.cleanup = Some(fallback.resolve_cleanup());
            }
        }

        match self.cleanup.as_mut() {
            Some(cleanup) => cleanup.destroy(version, handle),
            None => {
                log::debug!("No context cleanup registered, dropping version {version}");
                Ok(())
            }
        }
    }

    // === Policy ===

    /// Installs a new construction strategy and invalidates the cache.
    ///
    /// With [`ManagerOptions::eager_dispose_on_swap`] every cached context is
    /// handed to the cleanup first; failures are logged and the cache is
    /// emptied regardless.
    pub fn set_context_factory(&mut self, factory: impl ContextFactory + 'static) {
        self.invalidate();
        self.factory = Some(Box::new(factory));
    }

    /// Installs a new destruction strategy. Cached contexts are untouched.
    pub fn set_context_cleanup(&mut self, cleanup: impl ContextCleanup + 'static) {
        self.cleanup = Some(Box::new(cleanup));
    }

    /// Installs one object as both factory and cleanup.
    ///
    /// Contexts built by the previous factory are released by the previous
    /// cleanup.
    pub fn set_policy<P>(&mut self, policy: P)
    where
        P: ContextFactory + ContextCleanup + 'static,
    {
        let shared = SharedPolicy::new(policy);
        self.set_context_factory(shared.clone());
        self.set_context_cleanup(shared);
    }

    fn invalidate(&mut self) {
        if self.contexts.is_empty() {
            return;
        }
        if self.options.eager_dispose_on_swap {
            log::debug!("Factory replaced, disposing {} cached context(s)", self.contexts.len());
            if let Err(err) = self.dispose_all() {
                log::warn!("Cleanup during factory swap failed: {err}");
            }
        } else {
            log::debug!("Factory replaced, forgetting {} cached context(s)", self.contexts.len());
            self.contexts.clear();
        }
    }

    // === Introspection ===

    /// Versions with a cached context, ascending.
    #[must_use]
    pub fn cached_versions(&self) -> Vec<ContextVersion> {
        let mut versions: Vec<_> = self.contexts.keys().copied().collect();
        versions.sort_unstable();
        versions
    }

    #[inline]
    #[must_use]
    pub fn is_cached(&self, version: ContextVersion) -> bool {
        self.contexts.contains_key(&version)
    }

    #[inline]
    #[must_use]
    pub fn has_factory(&self) -> bool {
        self.factory.is_some()
    }

    #[inline]
    #[must_use]
    pub fn has_cleanup(&self) -> bool {
        self.cleanup.is_some()
    }
}

impl fmt::Debug for ContextManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextManager")
            .field("cached_versions", &self.cached_versions())
            .field("has_factory", &self.has_factory())
            .field("has_cleanup", &self.has_cleanup())
            .field("has_client_fallback", &self.fallback.is_some())
            .field("options", &self.options)
            .finish()
    }
}
