//! Environment Flags
//!
//! The registry reads three flags from the embedding environment:
//!
//! | Key                     | Type   | Meaning                                   |
//! |-------------------------|--------|-------------------------------------------|
//! | `VERSION`               | number | API version resolved by `get_active_context` |
//! | `DEBUG`                 | bool   | check the driver error state after each call |
//! | `IS_INTERACTIVE_CLIENT` | bool   | the built-in client policy may be used    |
//!
//! Any store can serve them by implementing [`Environment`]. [`Flags`] is the
//! plain in-process store; it loads from JSON or from `GLCTX_*` process
//! variables.
//!
//! ```rust,ignore
//! use glctx::flags::Flags;
//!
//! let flags = Flags::from_json(r#"{ "VERSION": 1, "DEBUG": true }"#)?;
//! assert_eq!(flags.version, 1);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Key of the API version flag.
pub const VERSION: &str = "VERSION";
/// Key of the debug-mode flag.
pub const DEBUG: &str = "DEBUG";
/// Key of the interactive-client flag.
pub const IS_INTERACTIVE_CLIENT: &str = "IS_INTERACTIVE_CLIENT";

/// Prefix of the process variables read by [`Flags::from_env`].
pub const ENV_PREFIX: &str = "GLCTX_";

/// Read-only flag store.
///
/// Reads must be pure: no side effects, same answer until the store is
/// changed by its owner.
pub trait Environment {
    fn get_number(&self, key: &str) -> Option<f64>;
    fn get_bool(&self, key: &str) -> Option<bool>;
}

impl<E: Environment + ?Sized> Environment for Rc<E> {
    fn get_number(&self, key: &str) -> Option<f64> {
        (**self).get_number(key)
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        (**self).get_bool(key)
    }
}

impl<E: Environment> Environment for RefCell<E> {
    fn get_number(&self, key: &str) -> Option<f64> {
        self.borrow().get_number(key)
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.borrow().get_bool(key)
    }
}

/// In-process flag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Flags {
    /// API version used by `get_active_context`.
    pub version: u32,
    /// Check the driver error state after each state-setting call.
    pub debug: bool,
    /// Allow the built-in client policy when none was injected.
    pub is_interactive_client: bool,
}

impl Default for Flags {
    fn default() -> Self {
        Self {
            version: 2,
            debug: false,
            is_interactive_client: false,
        }
    }
}

impl Flags {
    /// Parses a JSON document. Missing keys keep their defaults.
    pub fn from_json(document: &str) -> Result<Self> {
        Ok(serde_json::from_str(document)?)
    }

    /// Defaults overridden by `GLCTX_VERSION`, `GLCTX_DEBUG` and
    /// `GLCTX_IS_INTERACTIVE_CLIENT`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut flags = Self::default();

        if let Some(raw) = lookup(&format!("{ENV_PREFIX}{VERSION}")) {
            match raw.trim().parse::<u32>() {
                Ok(version) => flags.version = version,
                Err(_) => log::warn!("Ignoring {ENV_PREFIX}{VERSION}={raw:?}: not an integer"),
            }
        }
        if let Some(value) = lookup_bool(&lookup, DEBUG) {
            flags.debug = value;
        }
        if let Some(value) = lookup_bool(&lookup, IS_INTERACTIVE_CLIENT) {
            flags.is_interactive_client = value;
        }

        flags
    }
}

fn lookup_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    let raw = lookup(&format!("{ENV_PREFIX}{key}"))?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            log::warn!("Ignoring {ENV_PREFIX}{key}={raw:?}: not a boolean");
            None
        }
    }
}

impl Environment for Flags {
    fn get_number(&self, key: &str) -> Option<f64> {
        match key {
            VERSION => Some(f64::from(self.version)),
            _ => None,
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        match key {
            DEBUG => Some(self.debug),
            IS_INTERACTIVE_CLIENT => Some(self.is_interactive_client),
            _ => None,
        }
    }
}
