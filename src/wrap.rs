#![forbid(unsafe_code)]

//! One-call wrapping of a render closure in its own boundary.
//!
//! [`guard`] is the convenience path for the common case: a child closure,
//! a configuration layer, done. The result owns a regular
//! [`ErrorBoundary`] underneath, reachable for resets, reporters, and
//! inspection.

use std::fmt;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;

use crate::boundary::ErrorBoundary;
use crate::config::BoundaryConfig;
use crate::scope::BoundaryScope;

/// A child render closure pre-bound to its own boundary.
pub struct Guarded<F> {
    name: String,
    boundary: ErrorBoundary,
    child: F,
}

/// Wrap `child` in a boundary configured by `config`.
///
/// `name` becomes the boundary's source name; the unit itself reports as
/// `guarded(<name>)` in diagnostics.
pub fn guard<F>(name: &'static str, config: BoundaryConfig, child: F) -> Guarded<F>
where
    F: FnMut(Rect, &mut Buffer),
{
    Guarded {
        name: format!("guarded({name})"),
        boundary: ErrorBoundary::new(name).with_config(config),
        child,
    }
}

impl<F> Guarded<F>
where
    F: FnMut(Rect, &mut Buffer),
{
    /// Render the wrapped child through its boundary.
    pub fn render(&mut self, area: Rect, buf: &mut Buffer) {
        let child = &mut self.child;
        self.boundary.render(area, buf, |child_area, child_buf| {
            child(child_area, child_buf);
        });
    }

    /// Diagnostic name, `guarded(<name>)`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying boundary, for resets and reporter access.
    pub fn boundary(&self) -> &ErrorBoundary {
        &self.boundary
    }

    /// Attach the unit's boundary to an ambient scope.
    #[must_use]
    pub fn in_scope(mut self, scope: &BoundaryScope) -> Self {
        self.boundary = self.boundary.in_scope(scope);
        self
    }
}

impl<F> fmt::Debug for Guarded<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guarded")
            .field("name", &self.name)
            .field("has_error", &self.boundary.has_error())
            .finish()
    }
}
