#![forbid(unsafe_code)]

//! The built-in recovery view.
//!
//! Every fallback chain ends here: a red-accented notice that shows the
//! resolved message, a retry action, and (in debug builds, where there is
//! room) a diagnostics panel with the raw fault. Layout adapts to the
//! active [`DisplayMode`]; degenerate areas degrade to a bare marker.

use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Clear, Paragraph, Widget, Wrap};

use crate::config::{DisplayMode, FallbackProps, FallbackView};
use crate::messages::resolve_message;

const ACTION_LABEL: &str = "[ Try Again ]";
const RETRY_HINT: &str = "press r to retry";
const SUBTEXT: &str = "Please try again or contact support if the problem persists.";
const DEFAULT_TITLE: &str = "Error";
const MARKER: &str = "!";

/// Minimum area below which only the marker is drawn.
const MIN_WIDTH: u16 = 12;
const MIN_HEIGHT: u16 = 3;

/// The built-in recovery view, also usable directly as a [`FallbackView`]
/// anywhere a custom one is accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFallback;

impl FallbackView for DefaultFallback {
    fn render(&self, props: &FallbackProps<'_>, area: Rect, buf: &mut Buffer) {
        render_default_fallback(props, area, buf);
    }
}

/// Render the built-in recovery view for `props` into `area`.
pub fn render_default_fallback(props: &FallbackProps<'_>, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
        return;
    }
    let message = resolve_message(Some(props.error), props.messages);

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        buf.set_stringn(area.x, area.y, MARKER, 1, icon_style(props));
        return;
    }

    match props.mode {
        DisplayMode::Inline => render_inline(props, &message, area, buf),
        DisplayMode::FullPage => render_full_page(props, &message, area, buf),
        DisplayMode::Toast => render_toast(props, &message, area, buf),
        DisplayMode::Popup => render_popup(props, &message, area, buf),
    }
}

fn frame_style(props: &FallbackProps<'_>) -> Style {
    Style::new().fg(Color::Red).patch(props.styles.container)
}

fn message_style(props: &FallbackProps<'_>) -> Style {
    Style::new()
        .add_modifier(Modifier::BOLD)
        .patch(props.styles.message)
}

fn action_style(props: &FallbackProps<'_>) -> Style {
    Style::new()
        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
        .patch(props.styles.action)
}

fn icon_style(props: &FallbackProps<'_>) -> Style {
    Style::new()
        .fg(Color::Red)
        .add_modifier(Modifier::BOLD)
        .patch(props.styles.icon)
}

fn hint_style() -> Style {
    Style::new().fg(Color::DarkGray)
}

fn title<'a>(props: &FallbackProps<'a>) -> &'a str {
    props.title.unwrap_or(DEFAULT_TITLE)
}

fn message_line<'a>(props: &FallbackProps<'a>, message: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(MARKER, icon_style(props)),
        Span::raw(" "),
        Span::styled(message, message_style(props)),
    ])
}

fn action_line<'a>(props: &FallbackProps<'a>) -> Line<'a> {
    Line::from(vec![
        Span::styled(ACTION_LABEL, action_style(props)),
        Span::raw("  "),
        Span::styled(RETRY_HINT, hint_style()),
    ])
}

fn bordered_frame<'a>(props: &FallbackProps<'a>) -> Block<'a> {
    Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(frame_style(props))
        .title(Span::styled(title(props), frame_style(props)))
}

/// Center a `width` x `height` box inside `area`, clamping to fit.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Rows the lines need at `width` once word wrap kicks in. An estimate;
/// word boundaries can cost one extra row on pathological input.
fn estimated_rows(lines: &[Line<'_>], width: u16) -> u16 {
    let width = width.max(1);
    lines
        .iter()
        .map(|line| {
            let w = line.width().min(usize::from(u16::MAX)) as u16;
            if w == 0 { 1 } else { w.div_ceil(width) }
        })
        .sum()
}

fn render_inline(props: &FallbackProps<'_>, message: &str, area: Rect, buf: &mut Buffer) {
    let lines = vec![message_line(props, message), action_line(props)];
    let rows = estimated_rows(&lines, area.width.saturating_sub(2));
    let target = Rect {
        height: (rows + 2).min(area.height),
        ..area
    };
    Paragraph::new(lines)
        .block(bordered_frame(props))
        .wrap(Wrap { trim: true })
        .render(target, buf);

    #[cfg(debug_assertions)]
    render_details(props, space_below(area, target), buf);
}

fn render_full_page(props: &FallbackProps<'_>, message: &str, area: Rect, buf: &mut Buffer) {
    buf.set_style(area, props.styles.container);

    let mut lines = vec![
        Line::styled(MARKER, icon_style(props)),
        Line::raw(""),
    ];
    if let Some(caption) = props.title {
        lines.push(Line::styled(caption, frame_style(props)));
    }
    lines.push(Line::styled(message.to_string(), message_style(props)));
    lines.push(Line::styled(SUBTEXT, hint_style()));
    lines.push(Line::raw(""));
    lines.push(action_line(props));

    let height = estimated_rows(&lines, area.width).min(area.height);
    let content = Rect {
        y: area.y + (area.height - height) / 2,
        height,
        ..area
    };
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(content, buf);

    #[cfg(debug_assertions)]
    render_details(props, space_below(area, content), buf);
}

fn render_toast(props: &FallbackProps<'_>, message: &str, area: Rect, buf: &mut Buffer) {
    let text_width = message.chars().count().min(60) as u16;
    let width = (text_width + 6).clamp(16, 40).min(area.width);

    // Toasts stay compact: action label only, no key hint.
    let lines = vec![
        message_line(props, message),
        Line::from(Span::styled(ACTION_LABEL, action_style(props))),
    ];
    let rows = estimated_rows(&lines, width.saturating_sub(2));
    let height = (rows + 2).min(area.height);
    let card = Rect {
        x: area.right().saturating_sub(width),
        y: area.bottom().saturating_sub(height),
        width,
        height,
    };

    Clear.render(card, buf);
    Paragraph::new(lines)
        .block(bordered_frame(props))
        .wrap(Wrap { trim: true })
        .render(card, buf);
}

fn render_popup(props: &FallbackProps<'_>, message: &str, area: Rect, buf: &mut Buffer) {
    buf.set_style(area, Style::new().add_modifier(Modifier::DIM));

    let text_width = message.chars().count().min(60) as u16;
    let width = (text_width + 6).clamp(24, 50).min(area.width);
    let lines = vec![
        Line::styled(message.to_string(), message_style(props)),
        Line::styled(SUBTEXT, hint_style()),
        Line::raw(""),
        action_line(props),
    ];
    let rows = estimated_rows(&lines, width.saturating_sub(2));
    let card = centered(area, width, (rows + 2).min(area.height));

    Clear.render(card, buf);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(bordered_frame(props))
        .wrap(Wrap { trim: true })
        .render(card, buf);

    #[cfg(debug_assertions)]
    render_details(props, space_below(area, card), buf);
}

/// Space left in `area` below `inner`, one row of gap removed.
#[cfg(debug_assertions)]
fn space_below(area: Rect, inner: Rect) -> Rect {
    let top = inner.bottom().saturating_add(1);
    Rect {
        x: inner.x,
        y: top,
        width: inner.width,
        height: area.bottom().saturating_sub(top),
    }
}

/// Debug-build diagnostics strip in the space under the recovery content.
/// Skipped entirely when `region` cannot hold it; toast cards never get one.
#[cfg(debug_assertions)]
fn render_details(props: &FallbackProps<'_>, region: Rect, buf: &mut Buffer) {
    let mut lines = vec![Line::raw(format!("raw: {}", props.error))];
    if !props.origin.is_empty() {
        lines.push(Line::raw(format!("origin: {}", props.origin)));
    }
    if props.error.code().is_some() || props.error.status().is_some() {
        let code = props.error.code().unwrap_or("-");
        let status = props
            .error
            .status()
            .map_or_else(|| "-".to_string(), |s| s.to_string());
        lines.push(Line::raw(format!("code: {code}  status: {status}")));
    }
    if let Some(detail) = props.error.detail() {
        lines.push(Line::raw(detail.to_string()));
    }

    let height = lines.len() as u16 + 2;
    if region.width < MIN_WIDTH || region.height < height {
        return;
    }
    let strip = Rect { height, ..region };
    // Popup backdrops are dimmed; lift the strip off the backdrop like the card.
    if props.mode == DisplayMode::Popup {
        Clear.render(strip, buf);
    }

    let block = Block::bordered()
        .border_style(hint_style())
        .title(Span::styled("details (debug)", hint_style()));
    Paragraph::new(lines)
        .style(hint_style())
        .block(block)
        .wrap(Wrap { trim: true })
        .render(strip, buf);
}
