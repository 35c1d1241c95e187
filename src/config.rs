#![forbid(unsafe_code)]

//! Boundary configuration: display modes, style slots, fallback strategies,
//! and the override-wins merge.
//!
//! One shape, [`BoundaryConfig`], serves three roles: the ambient value
//! carried by a [`BoundaryScope`](crate::BoundaryScope), the per-instance
//! overrides a boundary builder accumulates, and the patches passed to
//! [`guard`](crate::guard). Every field is optional; merging keeps defined
//! fields from the override layer and falls through to the base otherwise.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span, Text};

use crate::boundary::ResetHandle;
use crate::error::{Fault, FaultContext};
use crate::messages::MessageOverrides;

/// Presentation strategy for a faulted boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DisplayMode {
    /// Render the fallback inside the child's own area, bordered, leaving
    /// the rest of the layout alone.
    Inline,
    /// Treat the area as the whole view and take it over with a centered
    /// recovery screen.
    #[default]
    FullPage,
    /// A compact corner notice. When a toast channel is registered the
    /// boundary hands off to it and draws nothing itself.
    Toast,
    /// A centered panel over a dimmed backdrop. When a popup channel is
    /// registered the boundary hands off to it and draws nothing itself.
    Popup,
}

impl DisplayMode {
    /// All modes, in declaration order.
    pub const ALL: [DisplayMode; 4] = [
        DisplayMode::Inline,
        DisplayMode::FullPage,
        DisplayMode::Toast,
        DisplayMode::Popup,
    ];

    /// Stable lowercase name, for logs and config files.
    pub const fn name(self) -> &'static str {
        match self {
            DisplayMode::Inline => "inline",
            DisplayMode::FullPage => "full-page",
            DisplayMode::Toast => "toast",
            DisplayMode::Popup => "popup",
        }
    }
}

/// Style slots patched over the default fallback theme.
///
/// Each slot is a [`Style`] applied with [`Style::patch`] semantics, so an
/// empty slot changes nothing and a slot that only sets `fg` keeps the
/// theme's background.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FallbackStyles {
    /// Container fill and border.
    pub container: Style,
    /// Resolved message text.
    pub message: Style,
    /// The retry action label.
    pub action: Style,
    /// The leading failure marker.
    pub icon: Style,
}

impl FallbackStyles {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn container(mut self, style: Style) -> Self {
        self.container = style;
        self
    }

    #[must_use]
    pub fn message(mut self, style: Style) -> Self {
        self.message = style;
        self
    }

    #[must_use]
    pub fn action(mut self, style: Style) -> Self {
        self.action = style;
        self
    }

    #[must_use]
    pub fn icon(mut self, style: Style) -> Self {
        self.icon = style;
        self
    }
}

/// Everything a fallback strategy needs to render.
#[derive(Debug)]
pub struct FallbackProps<'a> {
    /// The captured failure.
    pub error: &'a Fault,
    /// Debug name of the boundary that captured it.
    pub origin: &'a str,
    /// Clears the owning boundary when invoked.
    pub reset: ResetHandle,
    /// Active display mode after config resolution.
    pub mode: DisplayMode,
    /// Style slots, defaults when the caller set none.
    pub styles: FallbackStyles,
    /// Caption for the fallback container, when the caller set one.
    pub title: Option<&'a str>,
    /// Message table used for resolution inside the fallback.
    pub messages: Option<&'a MessageOverrides>,
}

/// A reusable fallback renderer, instantiated per fault with live
/// [`FallbackProps`].
///
/// Closures of the matching shape implement this automatically, so
/// `|props, area, buf| ...` can go anywhere a view is expected.
pub trait FallbackView: Send + Sync {
    fn render(&self, props: &FallbackProps<'_>, area: Rect, buf: &mut Buffer);
}

impl<F> FallbackView for F
where
    F: Fn(&FallbackProps<'_>, Rect, &mut Buffer) + Send + Sync,
{
    fn render(&self, props: &FallbackProps<'_>, area: Rect, buf: &mut Buffer) {
        self(props, area, buf)
    }
}

/// Shared, clonable fallback view.
pub type SharedFallbackView = Arc<dyn FallbackView>;

/// Bare render-function fallback.
pub type FallbackRenderFn = Arc<dyn Fn(&FallbackProps<'_>, Rect, &mut Buffer) + Send + Sync>;

/// Per-mode fallback table; the active mode picks its entry.
pub type ModeFallbacks = HashMap<DisplayMode, SharedFallbackView>;

/// Callback for a caller-owned toast or popup channel.
///
/// Receives the resolved message, the fault, and a reset handle the channel
/// must invoke once the user dismisses or retries.
pub type ChannelFn = Arc<dyn Fn(&str, &Fault, ResetHandle) + Send + Sync>;

/// Observer notified once per capture transition.
pub type ErrorHook = Arc<dyn Fn(&Fault, &FaultContext) + Send + Sync>;

/// Content for the `fallback` slot.
#[derive(Clone)]
pub enum FallbackContent {
    /// Pre-built content rendered exactly as supplied. It outranks every
    /// other fallback strategy and carries no reset wiring of its own.
    Static(Text<'static>),
    /// A view in the content slot. Kept for call sites that predate the
    /// dedicated view field; ranks just below it. Candidate for removal
    /// once those call sites migrate to
    /// [`fallback_view`](BoundaryConfig::fallback_view).
    View(SharedFallbackView),
}

impl FallbackContent {
    /// Wrap a view for the content slot.
    pub fn view(view: impl FallbackView + 'static) -> Self {
        Self::View(Arc::new(view))
    }
}

impl From<Text<'static>> for FallbackContent {
    fn from(content: Text<'static>) -> Self {
        Self::Static(content)
    }
}

impl From<Line<'static>> for FallbackContent {
    fn from(content: Line<'static>) -> Self {
        Self::Static(content.into())
    }
}

impl From<Span<'static>> for FallbackContent {
    fn from(content: Span<'static>) -> Self {
        Self::Static(content.into())
    }
}

impl From<&'static str> for FallbackContent {
    fn from(content: &'static str) -> Self {
        Self::Static(Text::raw(content))
    }
}

impl From<String> for FallbackContent {
    fn from(content: String) -> Self {
        Self::Static(Text::raw(content))
    }
}

impl fmt::Debug for FallbackContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(text) => f.debug_tuple("Static").field(text).finish(),
            Self::View(_) => f.write_str("View(..)"),
        }
    }
}

/// One layer of boundary configuration.
#[derive(Clone, Default)]
pub struct BoundaryConfig {
    /// Presentation strategy; unset resolves to [`DisplayMode::FullPage`].
    pub mode: Option<DisplayMode>,
    /// Style slots for the default fallback.
    pub styles: Option<FallbackStyles>,
    /// Caption for the fallback container.
    pub title: Option<String>,
    /// Content slot; outranks everything else when set.
    pub fallback: Option<FallbackContent>,
    /// View slot.
    pub fallback_view: Option<SharedFallbackView>,
    /// Render-function slot; outranks the view slot.
    pub fallback_render: Option<FallbackRenderFn>,
    /// Per-mode fallback table, consulted after the dedicated slots.
    pub fallbacks: Option<ModeFallbacks>,
    /// Message table overrides.
    pub messages: Option<MessageOverrides>,
    /// Caller-owned toast channel.
    pub on_show_toast: Option<ChannelFn>,
    /// Caller-owned popup channel.
    pub on_show_popup: Option<ChannelFn>,
    /// Capture observer.
    pub on_error: Option<ErrorHook>,
}

impl BoundaryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mode(mut self, mode: DisplayMode) -> Self {
        self.mode = Some(mode);
        self
    }

    #[must_use]
    pub fn styles(mut self, styles: FallbackStyles) -> Self {
        self.styles = Some(styles);
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn fallback(mut self, content: impl Into<FallbackContent>) -> Self {
        self.fallback = Some(content.into());
        self
    }

    #[must_use]
    pub fn fallback_view(mut self, view: impl FallbackView + 'static) -> Self {
        self.fallback_view = Some(Arc::new(view));
        self
    }

    #[must_use]
    pub fn fallback_render(
        mut self,
        render: impl Fn(&FallbackProps<'_>, Rect, &mut Buffer) + Send + Sync + 'static,
    ) -> Self {
        self.fallback_render = Some(Arc::new(render));
        self
    }

    /// Register a view for one mode in the per-mode table.
    #[must_use]
    pub fn fallback_for(mut self, mode: DisplayMode, view: impl FallbackView + 'static) -> Self {
        self.fallbacks
            .get_or_insert_with(HashMap::new)
            .insert(mode, Arc::new(view));
        self
    }

    #[must_use]
    pub fn messages(mut self, overrides: MessageOverrides) -> Self {
        self.messages = Some(overrides);
        self
    }

    #[must_use]
    pub fn on_show_toast(
        mut self,
        channel: impl Fn(&str, &Fault, ResetHandle) + Send + Sync + 'static,
    ) -> Self {
        self.on_show_toast = Some(Arc::new(channel));
        self
    }

    #[must_use]
    pub fn on_show_popup(
        mut self,
        channel: impl Fn(&str, &Fault, ResetHandle) + Send + Sync + 'static,
    ) -> Self {
        self.on_show_popup = Some(Arc::new(channel));
        self
    }

    #[must_use]
    pub fn on_error(mut self, hook: impl Fn(&Fault, &FaultContext) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(hook));
        self
    }

    /// Merge `self` over `base`.
    ///
    /// Defined fields of `self` win; unset fields fall through. Fields
    /// replace whole, so a `messages` table in `self` hides the base table
    /// rather than deep-merging with it.
    #[must_use]
    pub fn merged_over(&self, base: &Self) -> Self {
        Self {
            mode: self.mode.or(base.mode),
            styles: self.styles.or(base.styles),
            title: self.title.clone().or_else(|| base.title.clone()),
            fallback: self.fallback.clone().or_else(|| base.fallback.clone()),
            fallback_view: self
                .fallback_view
                .clone()
                .or_else(|| base.fallback_view.clone()),
            fallback_render: self
                .fallback_render
                .clone()
                .or_else(|| base.fallback_render.clone()),
            fallbacks: self.fallbacks.clone().or_else(|| base.fallbacks.clone()),
            messages: self.messages.clone().or_else(|| base.messages.clone()),
            on_show_toast: self
                .on_show_toast
                .clone()
                .or_else(|| base.on_show_toast.clone()),
            on_show_popup: self
                .on_show_popup
                .clone()
                .or_else(|| base.on_show_popup.clone()),
            on_error: self.on_error.clone().or_else(|| base.on_error.clone()),
        }
    }

    /// Mode after resolution, [`DisplayMode::FullPage`] when unset.
    pub fn resolved_mode(&self) -> DisplayMode {
        self.mode.unwrap_or_default()
    }

    /// The caller-owned channel for `mode`, if one is registered.
    pub fn channel_for(&self, mode: DisplayMode) -> Option<&ChannelFn> {
        match mode {
            DisplayMode::Toast => self.on_show_toast.as_ref(),
            DisplayMode::Popup => self.on_show_popup.as_ref(),
            DisplayMode::Inline | DisplayMode::FullPage => None,
        }
    }
}

impl fmt::Debug for BoundaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn slot<T>(value: &Option<T>) -> &'static str {
            if value.is_some() { "set" } else { "unset" }
        }
        f.debug_struct("BoundaryConfig")
            .field("mode", &self.mode)
            .field("styles", &self.styles)
            .field("title", &self.title)
            .field("fallback", &self.fallback)
            .field("fallback_view", &slot(&self.fallback_view))
            .field("fallback_render", &slot(&self.fallback_render))
            .field("fallbacks", &self.fallbacks.as_ref().map(HashMap::len))
            .field("messages", &slot(&self.messages))
            .field("on_show_toast", &slot(&self.on_show_toast))
            .field("on_show_popup", &slot(&self.on_show_popup))
            .field("on_error", &slot(&self.on_error))
            .finish()
    }
}
