#![forbid(unsafe_code)]

//! Ambient configuration shared by every boundary under one scope.
//!
//! A [`BoundaryScope`] plays the role a provider plays in component trees:
//! one value, set once near the top of the application, read by every
//! boundary handed a clone of the scope. Boundaries resolve their effective
//! configuration by merging per-instance overrides over the scope value.

use std::sync::Arc;

use crate::config::{BoundaryConfig, DisplayMode};

/// Shared, read-only ambient configuration.
///
/// Cloning is cheap and every clone observes the same value. A boundary
/// without a scope behaves as if attached to the default (empty) one.
#[derive(Debug, Clone, Default)]
pub struct BoundaryScope {
    config: Arc<BoundaryConfig>,
}

impl BoundaryScope {
    /// Wrap a configuration as the ambient value.
    pub fn new(config: BoundaryConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// The ambient configuration.
    pub fn config(&self) -> &BoundaryConfig {
        &self.config
    }

    /// Effective configuration for one boundary: `overrides` merged over
    /// the ambient value, defined override fields winning.
    pub fn resolve(&self, overrides: &BoundaryConfig) -> BoundaryConfig {
        overrides.merged_over(&self.config)
    }

    /// Shorthand for the common case of overriding only the mode.
    pub fn resolve_mode(&self, mode: DisplayMode) -> BoundaryConfig {
        let mut resolved = (*self.config).clone();
        resolved.mode = Some(mode);
        resolved
    }
}
