//! Operation Configuration Module
//!
//! Provides per-operation configuration loaded from TOML files, replacing
//! hardcoded cycle constants with operator-tunable values.
//!
//! ## Loading Order
//!
//! 1. `--config` CLI flag
//! 2. `RELIEF_CONFIG` environment variable (path to TOML file)
//! 3. `relief_config.toml` in the current working directory
//! 4. Built-in defaults
//!
//! `OLLAMA_BASE_URL` and `OLLAMA_MODEL` (also read from `.env`) override the
//! `[llm]` section after loading.
//!
//! ## Usage
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere:
//!
//! ```ignore
//! config::init(ReliefConfig::load());
//! let capacity = config::get().logistics.vehicle_capacity_kg;
//! ```

mod relief_config;
pub mod defaults;
pub mod validation;

pub use relief_config::*;

use std::sync::OnceLock;

/// Global configuration, initialized once at startup.
static RELIEF_CONFIG: OnceLock<ReliefConfig> = OnceLock::new();

/// Initialize the global configuration.
///
/// Later calls are ignored with a warning.
pub fn init(config: ReliefConfig) {
    if RELIEF_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get a reference to the global configuration.
///
/// Falls back to built-in defaults when `init()` has not been called, which
/// is the normal case for library users and unit tests.
pub fn get() -> &'static ReliefConfig {
    RELIEF_CONFIG.get_or_init(ReliefConfig::default)
}

/// Check whether the config has been initialized.
pub fn is_initialized() -> bool {
    RELIEF_CONFIG.get().is_some()
}
