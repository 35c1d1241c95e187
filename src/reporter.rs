#![forbid(unsafe_code)]

//! Imperative fault reporting from event handlers and background tasks.
//!
//! Render-pass failures are caught in place, but failures often surface
//! elsewhere: a keypress handler, a channel receiver, a spawned task. A
//! [`FaultReporter`] carries those into its boundary. Reports normally park
//! as pending state that the next render pass captures; when the boundary's
//! effective mode has a caller-owned toast or popup channel, reports route
//! straight to that channel instead and the boundary never leaves the
//! healthy state.

use std::sync::{Arc, Mutex};

use crate::boundary::ResetHandle;
use crate::config::ChannelFn;
use crate::error::Fault;
use crate::messages::{MessageOverrides, resolve_message};

/// Snapshot of the direct-dispatch route, refreshed by the owning boundary
/// on every render pass.
#[derive(Clone)]
pub(crate) struct ChannelRoute {
    pub(crate) channel: ChannelFn,
    pub(crate) messages: Option<MessageOverrides>,
    pub(crate) reset: ResetHandle,
}

#[derive(Default)]
struct ReporterShared {
    pending: Mutex<Option<Fault>>,
    route: Mutex<Option<ChannelRoute>>,
}

/// Hands failures to a boundary from outside the render pass.
///
/// Clonable and `Send + Sync`; every clone reports into the same boundary.
/// A reporter outlives nothing: once its boundary is gone, reports still
/// park as pending but no render pass will ever collect them.
#[derive(Clone, Default)]
pub struct FaultReporter {
    shared: Arc<ReporterShared>,
}

impl FaultReporter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Report a failure into the boundary.
    ///
    /// With a direct route in place (toast or popup mode with a registered
    /// channel, observed at the boundary's last render) the channel fires
    /// immediately with the resolved message and the boundary stays
    /// healthy. Otherwise the fault parks until the next render pass, and a
    /// newer report replaces an unconsumed one.
    pub fn report(&self, fault: impl Into<Fault>) {
        let fault = fault.into();

        let route = self
            .shared
            .route
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(route) = route {
            #[cfg(feature = "tracing")]
            tracing::debug!(fault = %fault, "routing reported fault to channel");
            let message = resolve_message(Some(&fault), route.messages.as_ref());
            (route.channel)(&message, &fault, route.reset);
            return;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(fault = %fault, "parking reported fault for next render");
        *self
            .shared
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(fault);
    }

    /// Drop any pending report. Local to the reporter; a boundary already
    /// in the faulted state is not touched.
    pub fn clear(&self) {
        *self
            .shared
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Whether a report is waiting for the next render pass.
    pub fn has_pending(&self) -> bool {
        self.shared
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    pub(crate) fn take_pending(&self) -> Option<Fault> {
        self.shared
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }

    pub(crate) fn set_route(&self, route: Option<ChannelRoute>) {
        *self.shared.route.lock().unwrap_or_else(|e| e.into_inner()) = route;
    }
}
