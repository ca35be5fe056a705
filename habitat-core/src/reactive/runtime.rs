//! Reactive Runtime
//!
//! Process-wide setup for the reactive engine. Each level calls
//! [`register_dot_dee`] once before creating signals; repeated calls are
//! harmless no-ops.
//!
//! The one-time setup installs the [`RuntimeConfig`] that every effect run
//! consults. Signals and effects keep working before registration, falling
//! back to the default configuration.

use std::sync::OnceLock;

use parking_lot::Once;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;

/// Tunables for the reactive engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Maximum number of effect runs nested inside a single cascade.
    pub max_cascade_depth: usize,
}

impl RuntimeConfig {
    /// Default ceiling on nested effect runs.
    pub const DEFAULT_MAX_CASCADE_DEPTH: usize = 256;

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        DEFAULT_CONFIG
    }
}

const DEFAULT_CONFIG: RuntimeConfig = RuntimeConfig {
    max_cascade_depth: RuntimeConfig::DEFAULT_MAX_CASCADE_DEPTH,
};

static FALLBACK: RuntimeConfig = DEFAULT_CONFIG;
static CONFIG: OnceLock<RuntimeConfig> = OnceLock::new();
static SETUP: Once = Once::new();

/// Perform the process-wide setup with the default configuration.
///
/// Only the first call does anything.
pub fn register_dot_dee() {
    register_dot_dee_with(RuntimeConfig::default());
}

/// Perform the process-wide setup with a custom configuration.
///
/// Only the first call does anything; a config passed to any later call is
/// dropped.
pub fn register_dot_dee_with(config: RuntimeConfig) {
    let mut pending = Some(config);

    SETUP.call_once(|| {
        if let Some(config) = pending.take() {
            info!(max_cascade_depth = config.max_cascade_depth, "reactive runtime registered");
            // SETUP guarantees this is the only writer.
            let _ = CONFIG.set(config);
        }
    });

    if pending.is_some() {
        debug!("reactive runtime already registered, ignoring");
    }
}

/// Whether the one-time setup has run in this process.
pub fn is_registered() -> bool {
    SETUP.state().done()
}

/// The active configuration.
pub fn config() -> &'static RuntimeConfig {
    CONFIG.get().unwrap_or(&FALLBACK)
}
