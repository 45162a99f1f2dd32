//! Process-wide current config.
//!
//! A convenience slot for application entry points. Library code should pass
//! a [`Config`] explicitly; nothing else in this crate reads the slot.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::config::Config;
use crate::error::OcioResult;

static CURRENT: RwLock<Option<Arc<Config>>> = RwLock::new(None);

/// Returns the current config, loading it from `$OCIO` on first use.
///
/// Concurrent first calls may each load the environment config; the first
/// one stored wins.
pub fn current_config() -> OcioResult<Arc<Config>> {
    if let Some(config) = CURRENT.read().as_ref() {
        return Ok(Arc::clone(config));
    }

    let loaded = Arc::new(Config::from_env()?);
    let mut slot = CURRENT.write();
    Ok(Arc::clone(slot.get_or_insert(loaded)))
}

/// Stores a copy of `config` as the current config. Last writer wins.
pub fn set_current_config(config: &Config) {
    debug!("setting current config");
    *CURRENT.write() = Some(Arc::new(config.editable_copy()));
}

/// Drops the cached processors and file content of the current config.
///
/// Other configs keep their caches; use [`Config::clear_caches`] on them.
/// Does nothing when no current config is set.
pub fn clear_all_caches() {
    if let Some(config) = CURRENT.read().as_ref() {
        debug!(cached = config.num_cached_processors(), "clearing current config caches");
        config.clear_caches();
    }
}
