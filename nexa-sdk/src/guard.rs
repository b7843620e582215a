//! Process-wide SDK load guard.
//!
//! Linking two copies of the SDK into one process produces types that
//! look alike but do not compare equal, which surfaces as baffling
//! downstream errors. The guard is an explicit registry: the first
//! `register` call records the loaded version, later calls must agree.
//! Tests can tear the registry down with `reset`.

use std::sync::Mutex;

/// The version string this crate registers.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

static REGISTRY: Mutex<Option<String>> = Mutex::new(None);

/// Error raised when two different SDK versions register in one process.
#[derive(Debug, thiserror::Error)]
#[error("SDK version {attempted} conflicts with already-registered version {registered}")]
pub struct VersionConflict {
    /// The version already in the registry.
    pub registered: String,
    /// The version that attempted to register.
    pub attempted: String,
}

/// Register an SDK version with the process-wide registry.
///
/// The first call records the version; subsequent calls succeed only
/// for the same version string.
///
/// # Arguments
/// * `version` - The version string to register.
///
/// # Returns
/// `Ok(())`, or a `VersionConflict` describing both versions.
pub fn register(version: &str) -> Result<(), VersionConflict> {
    let mut registry = REGISTRY.lock().expect("registry mutex poisoned");
    match registry.as_ref() {
        None => {
            *registry = Some(version.to_string());
            Ok(())
        }
        Some(registered) if registered == version => Ok(()),
        Some(registered) => Err(VersionConflict {
            registered: registered.clone(),
            attempted: version.to_string(),
        }),
    }
}

/// Return the currently registered version, if any.
///
/// # Returns
/// `Some(version)` once a registration has happened.
pub fn registered() -> Option<String> {
    REGISTRY.lock().expect("registry mutex poisoned").clone()
}

/// Clear the registry. Intended for test teardown.
pub fn reset() {
    *REGISTRY.lock().expect("registry mutex poisoned") = None;
}
