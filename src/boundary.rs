#![forbid(unsafe_code)]

//! The fault-isolating boundary.
//!
//! An [`ErrorBoundary`] wraps one child region of a frame. While the child
//! behaves, the boundary is invisible: the child draws straight into the
//! buffer. When the child panics (or reports a failure), the boundary
//! captures it, confines the damage to its own area, and presents a
//! fallback chosen by the effective configuration. The rest of the frame
//! keeps rendering.
//!
//! Capture is sticky. A faulted boundary skips its child on later frames
//! and keeps showing the fallback until something clears it: an explicit
//! [`reset`](ErrorBoundary::reset), a [`ResetHandle`] fired from a toast or
//! key handler, or a change in the reset-key sequence.

use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::{Clear, Widget};

use crate::config::{
    BoundaryConfig, DisplayMode, FallbackContent, FallbackProps, FallbackStyles, FallbackView,
};
use crate::error::{Fault, FaultContext, FaultPhase};
use crate::fallback::render_default_fallback;
use crate::messages::{MessageOverrides, resolve_message};
use crate::reporter::{ChannelRoute, FaultReporter};
use crate::scope::BoundaryScope;

/// Opaque comparison value for reset-key sequences.
///
/// Two sequences count as changed when their lengths differ or any position
/// compares unequal. Variants never compare equal across constructors, so
/// `2i64` and `2u64` are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResetKey {
    Unit,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Text(String),
}

impl From<()> for ResetKey {
    fn from(_: ()) -> Self {
        Self::Unit
    }
}

impl From<bool> for ResetKey {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for ResetKey {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for ResetKey {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for ResetKey {
    fn from(value: u32) -> Self {
        Self::Uint(u64::from(value))
    }
}

impl From<u64> for ResetKey {
    fn from(value: u64) -> Self {
        Self::Uint(value)
    }
}

impl From<usize> for ResetKey {
    fn from(value: usize) -> Self {
        Self::Uint(value as u64)
    }
}

impl From<&str> for ResetKey {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ResetKey {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Why a boundary reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetDetails {
    /// An explicit reset call, from the boundary itself, a [`ResetHandle`],
    /// or a channel collaborator. Carries whatever arguments the caller
    /// passed along.
    Imperative { args: Vec<String> },
    /// The reset-key sequence changed while the boundary was faulted.
    Keys {
        prev: Vec<ResetKey>,
        next: Vec<ResetKey>,
    },
}

impl ResetDetails {
    /// Stable reason tag for logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Imperative { .. } => "imperative-api",
            Self::Keys { .. } => "keys",
        }
    }
}

/// Observer notified when a boundary resets.
pub type ResetHook = Arc<dyn Fn(&ResetDetails) + Send + Sync>;

struct Core {
    fault: Option<Fault>,
    prev_keys: Option<Vec<ResetKey>>,
    on_reset: Option<ResetHook>,
}

impl Core {
    fn new() -> Self {
        Self {
            fault: None,
            prev_keys: None,
            on_reset: None,
        }
    }
}

type SharedCore = Arc<Mutex<Core>>;

fn lock(core: &Mutex<Core>) -> MutexGuard<'_, Core> {
    core.lock().unwrap_or_else(|e| e.into_inner())
}

/// Notify first, then clear. The clear is unconditional; a reset on a
/// healthy boundary still notifies.
fn reset_core(core: &SharedCore, details: ResetDetails) {
    #[cfg(feature = "tracing")]
    tracing::debug!(reason = details.reason(), "boundary reset");

    let hook = lock(core).on_reset.clone();
    if let Some(hook) = hook {
        hook(&details);
    }
    lock(core).fault = None;
}

fn keys_changed(prev: &[ResetKey], next: &[ResetKey]) -> bool {
    prev.len() != next.len() || prev.iter().zip(next).any(|(a, b)| a != b)
}

/// Clears the owning boundary when invoked.
///
/// Holds only a weak reference, so handles can sit in toasts, timers, and
/// key maps that outlive the boundary; invocations after the boundary is
/// gone are no-ops.
#[derive(Clone)]
pub struct ResetHandle {
    core: Weak<Mutex<Core>>,
}

impl ResetHandle {
    /// A handle bound to no boundary; every invocation is a no-op. Useful
    /// for previewing fallback views outside a boundary.
    pub fn detached() -> Self {
        Self { core: Weak::new() }
    }

    pub(crate) fn attached(core: &SharedCore) -> Self {
        Self {
            core: Arc::downgrade(core),
        }
    }

    /// Clear the boundary with no arguments.
    pub fn reset(&self) {
        self.reset_with(std::iter::empty::<String>());
    }

    /// Clear the boundary, recording `args` in the reset notification.
    pub fn reset_with<I, S>(&self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let Some(core) = self.core.upgrade() else {
            return;
        };
        let args = args.into_iter().map(Into::into).collect();
        reset_core(&core, ResetDetails::Imperative { args });
    }

    /// Whether the owning boundary is still alive.
    pub fn is_attached(&self) -> bool {
        self.core.strong_count() > 0
    }
}

impl fmt::Debug for ResetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResetHandle")
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// A retained fault-isolation wrapper around one child region.
///
/// Build one per guarded region and keep it across frames; the latched
/// fault, the reset-key sequence, and the reporter all live in the
/// boundary. Pass the child as a closure each frame:
///
/// ```ignore
/// let mut boundary = ErrorBoundary::new("stats-panel")
///     .mode(DisplayMode::Inline)
///     .on_error(|fault, ctx| log_failure(fault, ctx));
///
/// // each frame:
/// boundary.render(panel_area, frame.buffer_mut(), |area, buf| {
///     StatsPanel::new(&model).render(area, buf);
/// });
/// ```
///
/// When a fault is latched the fallback is chosen in a fixed order: a
/// caller-owned toast/popup channel for the effective mode, then the
/// pre-built content slot, the render function, the view slots, the
/// per-mode table, and finally the built-in recovery view.
pub struct ErrorBoundary {
    source: &'static str,
    overrides: BoundaryConfig,
    scope: BoundaryScope,
    core: SharedCore,
    reporter: FaultReporter,
}

impl ErrorBoundary {
    /// Create a boundary named `source`. The name shows up in capture
    /// context and log lines; use the region it guards ("sidebar",
    /// "detail-view").
    pub fn new(source: &'static str) -> Self {
        Self {
            source,
            overrides: BoundaryConfig::default(),
            scope: BoundaryScope::default(),
            core: Arc::new(Mutex::new(Core::new())),
            reporter: FaultReporter::new(),
        }
    }

    /// Presentation strategy for this boundary.
    #[must_use]
    pub fn mode(mut self, mode: DisplayMode) -> Self {
        self.overrides.mode = Some(mode);
        self
    }

    /// Style slots patched over the default fallback theme.
    #[must_use]
    pub fn styles(mut self, styles: FallbackStyles) -> Self {
        self.overrides.styles = Some(styles);
        self
    }

    /// Caption for the fallback container.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.overrides.title = Some(title.into());
        self
    }

    /// Pre-built fallback content; outranks every other fallback strategy.
    #[must_use]
    pub fn fallback(mut self, content: impl Into<FallbackContent>) -> Self {
        self.overrides.fallback = Some(content.into());
        self
    }

    /// Fallback view instantiated per fault.
    #[must_use]
    pub fn fallback_view(mut self, view: impl FallbackView + 'static) -> Self {
        self.overrides.fallback_view = Some(Arc::new(view));
        self
    }

    /// Bare render-function fallback; outranks the view slots.
    #[must_use]
    pub fn fallback_render(
        mut self,
        render: impl Fn(&FallbackProps<'_>, Rect, &mut Buffer) + Send + Sync + 'static,
    ) -> Self {
        self.overrides.fallback_render = Some(Arc::new(render));
        self
    }

    /// Register a fallback view for one mode.
    #[must_use]
    pub fn fallback_for(mut self, mode: DisplayMode, view: impl FallbackView + 'static) -> Self {
        self.overrides
            .fallbacks
            .get_or_insert_with(HashMap::new)
            .insert(mode, Arc::new(view));
        self
    }

    /// Message table overrides for this boundary.
    #[must_use]
    pub fn messages(mut self, overrides: MessageOverrides) -> Self {
        self.overrides.messages = Some(overrides);
        self
    }

    /// Caller-owned toast channel, consulted when the effective mode is
    /// [`DisplayMode::Toast`].
    #[must_use]
    pub fn on_show_toast(
        mut self,
        channel: impl Fn(&str, &Fault, ResetHandle) + Send + Sync + 'static,
    ) -> Self {
        self.overrides.on_show_toast = Some(Arc::new(channel));
        self
    }

    /// Caller-owned popup channel, consulted when the effective mode is
    /// [`DisplayMode::Popup`].
    #[must_use]
    pub fn on_show_popup(
        mut self,
        channel: impl Fn(&str, &Fault, ResetHandle) + Send + Sync + 'static,
    ) -> Self {
        self.overrides.on_show_popup = Some(Arc::new(channel));
        self
    }

    /// Observer notified once per capture transition, before any fallback
    /// is drawn. The instance observer fires before the ambient one.
    #[must_use]
    pub fn on_error(
        mut self,
        hook: impl Fn(&Fault, &FaultContext) + Send + Sync + 'static,
    ) -> Self {
        self.overrides.on_error = Some(Arc::new(hook));
        self
    }

    /// Observer notified on every reset, imperative or key-driven.
    #[must_use]
    pub fn on_reset(self, hook: impl Fn(&ResetDetails) + Send + Sync + 'static) -> Self {
        lock(&self.core).on_reset = Some(Arc::new(hook));
        self
    }

    /// Initial reset-key sequence. Providing keys here never triggers a
    /// reset; only later changes via [`set_reset_keys`](Self::set_reset_keys)
    /// do.
    #[must_use]
    pub fn reset_keys<I, K>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<ResetKey>,
    {
        lock(&self.core).prev_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Attach this boundary to an ambient scope. Instance overrides win
    /// field by field over the scope value.
    #[must_use]
    pub fn in_scope(mut self, scope: &BoundaryScope) -> Self {
        self.scope = scope.clone();
        self
    }

    /// Apply a whole configuration layer at once; defined fields of
    /// `config` override anything set so far.
    #[must_use]
    pub fn with_config(mut self, config: BoundaryConfig) -> Self {
        self.overrides = config.merged_over(&self.overrides);
        self
    }

    /// Boundary name, as passed to [`new`](Self::new).
    pub fn source(&self) -> &'static str {
        self.source
    }

    /// Whether a fault is currently latched.
    pub fn has_error(&self) -> bool {
        lock(&self.core).fault.is_some()
    }

    /// The latched fault, if any.
    pub fn error(&self) -> Option<Fault> {
        lock(&self.core).fault.clone()
    }

    /// A detachable handle that clears this boundary when invoked.
    pub fn reset_handle(&self) -> ResetHandle {
        ResetHandle::attached(&self.core)
    }

    /// A reporter that hands failures to this boundary from event handlers
    /// and background tasks.
    pub fn reporter(&self) -> FaultReporter {
        self.reporter.clone()
    }

    /// Clear the latched fault with no arguments.
    pub fn reset(&self) {
        reset_core(&self.core, ResetDetails::Imperative { args: Vec::new() });
    }

    /// Clear the latched fault, recording `args` in the notification.
    pub fn reset_with<I, S>(&self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args = args.into_iter().map(Into::into).collect();
        reset_core(&self.core, ResetDetails::Imperative { args });
    }

    /// Replace the reset-key sequence.
    ///
    /// While faulted, a changed sequence clears the fault and notifies
    /// `on_reset` with both sequences. While healthy, the sequence is
    /// tracked without side effects. The first provision ever never
    /// triggers.
    pub fn set_reset_keys<I, K>(&self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<ResetKey>,
    {
        let next: Vec<ResetKey> = keys.into_iter().map(Into::into).collect();
        let details = {
            let mut core = lock(&self.core);
            let faulted = core.fault.is_some();
            let changed = matches!(&core.prev_keys, Some(prev) if keys_changed(prev, &next));
            let prev = core.prev_keys.replace(next.clone());
            (faulted && changed).then(|| ResetDetails::Keys {
                prev: prev.unwrap_or_default(),
                next,
            })
        };
        if let Some(details) = details {
            reset_core(&self.core, details);
        }
    }

    /// Render the child, capturing any panic it raises.
    ///
    /// Healthy boundaries invoke `child` with the boundary's own area.
    /// Faulted boundaries skip the child entirely and render the configured
    /// fallback instead. An empty area renders nothing and captures
    /// nothing.
    pub fn render<F>(&mut self, area: Rect, buf: &mut Buffer, child: F)
    where
        F: FnOnce(Rect, &mut Buffer),
    {
        self.try_render(area, buf, |child_area, child_buf| {
            child(child_area, child_buf);
            Ok(())
        });
    }

    /// Render a fallible child. An `Err` counts as a captured fault, same
    /// as a panic, without unwinding.
    pub fn try_render<F>(&mut self, area: Rect, buf: &mut Buffer, child: F)
    where
        F: FnOnce(Rect, &mut Buffer) -> Result<(), Fault>,
    {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "widget_render",
            widget = "ErrorBoundary",
            source = self.source,
            x = area.x,
            y = area.y,
            w = area.width,
            h = area.height
        )
        .entered();

        if area.is_empty() {
            return;
        }

        let effective = self.scope.resolve(&self.overrides);
        let mode = effective.resolved_mode();
        self.reporter
            .set_route(route_for(&effective, mode, self.reset_handle()));

        // Reported faults join the capture path before the child runs.
        if let Some(fault) = self.reporter.take_pending() {
            self.capture(fault, FaultPhase::Reported, &effective, mode, area, buf);
            return;
        }

        let latched = lock(&self.core).fault.clone();
        if let Some(fault) = latched {
            self.render_faulted(&effective, mode, &fault, area, buf);
            return;
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| child(area, &mut *buf)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(fault)) => self.capture(fault, FaultPhase::Render, &effective, mode, area, buf),
            Err(payload) => self.capture(
                Fault::from_panic(payload),
                FaultPhase::Render,
                &effective,
                mode,
                area,
                buf,
            ),
        }
    }

    /// Latch the fault, notify observers, and present the first fallback
    /// frame.
    fn capture(
        &self,
        fault: Fault,
        phase: FaultPhase,
        effective: &BoundaryConfig,
        mode: DisplayMode,
        area: Rect,
        buf: &mut Buffer,
    ) {
        #[cfg(feature = "tracing")]
        tracing::error!(
            source = self.source,
            mode = mode.name(),
            phase = ?phase,
            fault = %fault,
            "captured child failure"
        );

        lock(&self.core).fault = Some(fault.clone());

        let context = FaultContext::new(self.source, area, phase);
        // Instance observer first, then the ambient one.
        if let Some(hook) = &self.overrides.on_error {
            hook(&fault, &context);
        }
        if let Some(hook) = &self.scope.config().on_error {
            hook(&fault, &context);
        }

        // Wipe whatever the child managed to draw before failing.
        Clear.render(area, buf);

        // A caller-owned channel is told exactly once, at this transition,
        // and then owns presentation for the episode.
        if let Some(channel) = effective.channel_for(mode) {
            let message = resolve_message(Some(&fault), effective.messages.as_ref());
            channel(&message, &fault, self.reset_handle());
            return;
        }

        self.render_faulted(effective, mode, &fault, area, buf);
    }

    fn render_faulted(
        &self,
        effective: &BoundaryConfig,
        mode: DisplayMode,
        fault: &Fault,
        area: Rect,
        buf: &mut Buffer,
    ) {
        // A registered channel for the mode owns presentation; the
        // boundary contributes no cells of its own.
        if effective.channel_for(mode).is_some() {
            return;
        }

        // Pre-built content renders exactly as supplied.
        if let Some(FallbackContent::Static(text)) = &effective.fallback {
            text.clone().render(area, buf);
            return;
        }

        let props = FallbackProps {
            error: fault,
            origin: self.source,
            reset: self.reset_handle(),
            mode,
            styles: effective.styles.unwrap_or_default(),
            title: effective.title.as_deref(),
            messages: effective.messages.as_ref(),
        };

        if let Some(render) = &effective.fallback_render {
            render(&props, area, buf);
            return;
        }
        if let Some(view) = &effective.fallback_view {
            view.render(&props, area, buf);
            return;
        }
        if let Some(FallbackContent::View(view)) = &effective.fallback {
            view.render(&props, area, buf);
            return;
        }

        if let Some(table) = &effective.fallbacks
            && let Some(view) = table.get(&mode)
        {
            view.render(&props, area, buf);
            return;
        }

        render_default_fallback(&props, area, buf);
    }
}

impl fmt::Debug for ErrorBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorBoundary")
            .field("source", &self.source)
            .field("has_error", &self.has_error())
            .field("overrides", &self.overrides)
            .finish()
    }
}

impl Drop for ErrorBoundary {
    fn drop(&mut self) {
        // Reports arriving after the boundary is gone park instead of
        // firing a stale channel snapshot.
        self.reporter.set_route(None);
    }
}

fn route_for(
    effective: &BoundaryConfig,
    mode: DisplayMode,
    reset: ResetHandle,
) -> Option<ChannelRoute> {
    effective.channel_for(mode).map(|channel| ChannelRoute {
        channel: channel.clone(),
        messages: effective.messages.clone(),
        reset,
    })
}
