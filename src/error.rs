#![forbid(unsafe_code)]

//! Captured failure values and the context they were captured in.
//!
//! A [`Fault`] is the boundary-side record of a child failure. It carries the
//! raw message plus optional classification fields (`code`, `status`) that
//! drive message resolution, and an optional free-form `detail` blob for
//! diagnostics panels and logs.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::time::Instant;

use ratatui::layout::Rect;

/// Prefix added by `unreachable!` to its panic payload.
const UNREACHABLE_PREFIX: &str = "internal error: entered unreachable code: ";

/// A failure captured by a boundary.
///
/// Construct one directly for reported failures, or let the boundary build
/// one from a panic payload. The `code` and `status` fields feed the message
/// catalog lookup in [`resolve_message`](crate::messages::resolve_message);
/// a fault without either falls through to its own message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    message: String,
    code: Option<String>,
    status: Option<u16>,
    detail: Option<String>,
}

impl Fault {
    /// Create a fault from a human-readable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            status: None,
            detail: None,
        }
    }

    /// Build a fault from a panic payload.
    ///
    /// String payloads (the common case for `panic!` and `unreachable!`)
    /// become the fault message. Non-string payloads produce an empty
    /// message, which message resolution later maps to the catalog default.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let mut message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            String::new()
        };

        if let Some(stripped) = message.strip_prefix(UNREACHABLE_PREFIX) {
            message = stripped.to_string();
        }

        Self::new(message)
    }

    /// Build a fault from any error value, keeping the source chain as
    /// detail text.
    pub fn from_error(error: &(dyn StdError + 'static)) -> Self {
        let mut fault = Self::new(error.to_string());
        let mut chain = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        if !chain.is_empty() {
            fault.detail = Some(chain.join(": "));
        }
        fault
    }

    /// Attach an application error code (looked up before `status`).
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attach an HTTP-style status (looked up after `code`).
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach free-form diagnostic detail (backtraces, response bodies).
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Raw message text. May be empty for opaque panic payloads.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Application error code, if classified.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// HTTP-style status, if classified.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Diagnostic detail, if attached.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str("unrecognized failure payload")
        } else {
            f.write_str(&self.message)
        }
    }
}

impl StdError for Fault {}

impl From<&str> for Fault {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for Fault {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Where in the frame cycle a fault was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPhase {
    /// The child panicked (or returned an error) during a render pass.
    Render,
    /// The fault arrived through a [`FaultReporter`](crate::FaultReporter)
    /// between render passes.
    Reported,
}

/// Context snapshot handed to error observers alongside the fault.
#[derive(Debug, Clone)]
pub struct FaultContext {
    /// Name of the boundary that captured the fault.
    pub origin: &'static str,
    /// Area the boundary was rendering into.
    pub area: Rect,
    /// How the fault entered the boundary.
    pub phase: FaultPhase,
    /// When the boundary captured it.
    pub captured_at: Instant,
}

impl FaultContext {
    pub(crate) fn new(origin: &'static str, area: Rect, phase: FaultPhase) -> Self {
        Self {
            origin,
            area,
            phase,
            captured_at: Instant::now(),
        }
    }
}
