#![forbid(unsafe_code)]

//! Fault isolation for [ratatui] interfaces.
//!
//! A panicking widget normally tears down the whole application and leaves
//! the terminal in a broken state. This crate confines the damage to the
//! region that failed: wrap a child render in an [`ErrorBoundary`] and a
//! panic (or a reported failure) is captured, latched, and replaced by a
//! recovery view while every sibling keeps rendering.
//!
//! ```
//! use ratatui::buffer::Buffer;
//! use ratatui::layout::Rect;
//! use tui_bulwark::{DisplayMode, ErrorBoundary};
//!
//! let mut sidebar = ErrorBoundary::new("sidebar").mode(DisplayMode::Inline);
//!
//! // Every frame, render the guarded child through the boundary.
//! let area = Rect::new(0, 0, 40, 12);
//! let mut buf = Buffer::empty(area);
//! sidebar.render(area, &mut buf, |area, buf| {
//!     // draw the sidebar widgets here
//!     let _ = (area, buf);
//! });
//! ```
//!
//! The pieces:
//!
//! - [`ErrorBoundary`] captures panics and [`Fault`] values from one child
//!   region, latches the first failure, and renders a fallback until reset.
//! - [`BoundaryConfig`] and [`BoundaryScope`] layer configuration: scope
//!   defaults under instance overrides, merged field by field.
//! - [`FaultReporter`] hands failures from event handlers and background
//!   tasks to the boundary between frames.
//! - [`ResetHandle`] clears a boundary from toasts, key maps, and timers,
//!   and outlives the boundary safely.
//! - [`MessageOverrides`] maps error codes and HTTP statuses to the copy
//!   shown to the user.
//! - [`guard`] bundles a boundary and its child into one retained value.
//!
//! When a fault is latched, presentation is chosen in a fixed order: a
//! caller-owned toast/popup channel for the effective mode, then pre-built
//! [`FallbackContent`], the bare render function, the view slots, the
//! per-mode table, and finally the built-in recovery view.
//!
//! [ratatui]: https://docs.rs/ratatui

pub mod boundary;
pub mod config;
pub mod error;
pub mod fallback;
pub mod messages;
pub mod reporter;
pub mod scope;
pub mod wrap;

#[cfg(test)]
pub(crate) mod test_util;

// --- Boundary re-exports ---------------------------------------------------

pub use boundary::{ErrorBoundary, ResetDetails, ResetHandle, ResetHook, ResetKey};

// --- Configuration re-exports ----------------------------------------------

pub use config::{
    BoundaryConfig, ChannelFn, DisplayMode, ErrorHook, FallbackContent, FallbackProps,
    FallbackRenderFn, FallbackStyles, FallbackView, ModeFallbacks, SharedFallbackView,
};
pub use scope::BoundaryScope;

// --- Fault re-exports ------------------------------------------------------

pub use error::{Fault, FaultContext, FaultPhase};
pub use reporter::FaultReporter;

// --- Presentation re-exports -----------------------------------------------

pub use fallback::{DefaultFallback, render_default_fallback};
pub use messages::{MessageOverrides, resolve_message};
pub use wrap::{Guarded, guard};

// --- Prelude ---------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        BoundaryConfig, BoundaryScope, DisplayMode, ErrorBoundary, FallbackProps, FallbackStyles,
        FallbackView, Fault, FaultContext, FaultPhase, FaultReporter, MessageOverrides,
        ResetDetails, ResetHandle, guard,
    };
}
