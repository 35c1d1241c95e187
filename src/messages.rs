#![forbid(unsafe_code)]

//! User-facing message resolution.
//!
//! Raw fault text is rarely fit to show. [`resolve_message`] maps a captured
//! [`Fault`] to presentable copy through a layered lookup: caller overrides
//! first, then the built-in catalog, then the fault's own message, then the
//! catalog default. The function is total; it always returns something
//! displayable.

use std::collections::HashMap;

use crate::error::Fault;

/// Message text that marks a connectivity failure regardless of status.
const NETWORK_MARKER: &str = "Network Error";

const DEFAULT_MESSAGE: &str = "Something went wrong. Please try again.";
const NETWORK_MESSAGE: &str = "Unable to reach the server. Check your connection and try again.";
const STATUS_401_MESSAGE: &str = "Your session has expired. Please sign in again.";
const STATUS_500_MESSAGE: &str = "The server hit an internal error. Please try again shortly.";

fn builtin_status(status: u16) -> Option<&'static str> {
    match status {
        401 => Some(STATUS_401_MESSAGE),
        500 => Some(STATUS_500_MESSAGE),
        _ => None,
    }
}

/// Caller-supplied message table, consulted before the built-in catalog.
///
/// Entries are keyed by application code, by status, or by the two
/// catch-all slots (`network`, `default_message`). Unset slots fall through
/// to the built-ins, so a table that only remaps `401` leaves every other
/// lookup untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageOverrides {
    status: HashMap<u16, String>,
    codes: HashMap<String, String>,
    network: Option<String>,
    default: Option<String>,
}

impl MessageOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a status to replacement copy.
    #[must_use]
    pub fn status(mut self, status: u16, message: impl Into<String>) -> Self {
        self.status.insert(status, message.into());
        self
    }

    /// Map an application error code to replacement copy.
    #[must_use]
    pub fn code(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.codes.insert(code.into(), message.into());
        self
    }

    /// Replace the connectivity-failure copy.
    #[must_use]
    pub fn network(mut self, message: impl Into<String>) -> Self {
        self.network = Some(message.into());
        self
    }

    /// Replace the last-resort copy.
    #[must_use]
    pub fn default_message(mut self, message: impl Into<String>) -> Self {
        self.default = Some(message.into());
        self
    }

    fn for_code(&self, code: &str) -> Option<&str> {
        self.codes.get(code).map(String::as_str)
    }

    fn for_status(&self, status: u16) -> Option<&str> {
        self.status.get(&status).map(String::as_str)
    }
}

/// Resolve the copy to show for `fault`.
///
/// Lookup order:
/// 1. the fault's `code`, in the override table;
/// 2. the fault's `status`, overrides first, then the built-in catalog;
/// 3. the network marker, when the raw message is exactly `"Network Error"`;
/// 4. the fault's own non-empty message;
/// 5. the default slot.
///
/// `None` for the fault (nothing captured) resolves straight to the default
/// slot, so callers never branch before asking.
pub fn resolve_message(fault: Option<&Fault>, overrides: Option<&MessageOverrides>) -> String {
    let Some(fault) = fault else {
        return default_entry(overrides);
    };

    if let Some(code) = fault.code()
        && let Some(message) = overrides.and_then(|o| o.for_code(code))
    {
        return message.to_string();
    }

    if let Some(status) = fault.status() {
        if let Some(message) = overrides.and_then(|o| o.for_status(status)) {
            return message.to_string();
        }
        if let Some(message) = builtin_status(status) {
            return message.to_string();
        }
    }

    if fault.message() == NETWORK_MARKER {
        return overrides
            .and_then(|o| o.network.clone())
            .unwrap_or_else(|| NETWORK_MESSAGE.to_string());
    }

    if !fault.message().is_empty() {
        return fault.message().to_string();
    }

    default_entry(overrides)
}

fn default_entry(overrides: Option<&MessageOverrides>) -> String {
    overrides
        .and_then(|o| o.default.clone())
        .unwrap_or_else(|| DEFAULT_MESSAGE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_captured_resolves_to_default() {
        assert_eq!(resolve_message(None, None), DEFAULT_MESSAGE);
    }

    #[test]
    fn status_401_uses_builtin_entry() {
        let fault = Fault::new("Request failed").with_status(401);
        assert_eq!(resolve_message(Some(&fault), None), STATUS_401_MESSAGE);
    }

    #[test]
    fn status_500_uses_builtin_entry() {
        let fault = Fault::new("Request failed").with_status(500);
        assert_eq!(resolve_message(Some(&fault), None), STATUS_500_MESSAGE);
    }

    #[test]
    fn unknown_status_falls_through_to_message() {
        let fault = Fault::new("teapot refused").with_status(418);
        assert_eq!(resolve_message(Some(&fault), None), "teapot refused");
    }

    #[test]
    fn code_outranks_status() {
        let overrides = MessageOverrides::new()
            .code("QUOTA", "Storage quota reached.")
            .status(401, "ignored");
        let fault = Fault::new("Request failed")
            .with_code("QUOTA")
            .with_status(401);
        assert_eq!(
            resolve_message(Some(&fault), Some(&overrides)),
            "Storage quota reached."
        );
    }

    #[test]
    fn unmatched_code_falls_through_to_status() {
        let overrides = MessageOverrides::new().code("QUOTA", "Storage quota reached.");
        let fault = Fault::new("Request failed")
            .with_code("OTHER")
            .with_status(401);
        assert_eq!(
            resolve_message(Some(&fault), Some(&overrides)),
            STATUS_401_MESSAGE
        );
    }

    #[test]
    fn status_override_beats_builtin() {
        let overrides = MessageOverrides::new().status(401, "Please log in once more.");
        let fault = Fault::new("x").with_status(401);
        assert_eq!(
            resolve_message(Some(&fault), Some(&overrides)),
            "Please log in once more."
        );
    }

    #[test]
    fn network_marker_matches_exact_text() {
        let fault = Fault::new("Network Error");
        assert_eq!(resolve_message(Some(&fault), None), NETWORK_MESSAGE);

        let near_miss = Fault::new("network error");
        assert_eq!(resolve_message(Some(&near_miss), None), "network error");
    }

    #[test]
    fn network_override_replaces_builtin() {
        let overrides = MessageOverrides::new().network("You appear to be offline.");
        let fault = Fault::new("Network Error");
        assert_eq!(
            resolve_message(Some(&fault), Some(&overrides)),
            "You appear to be offline."
        );
    }

    #[test]
    fn plain_message_passes_through() {
        let fault = Fault::new("config file missing");
        assert_eq!(resolve_message(Some(&fault), None), "config file missing");
    }

    #[test]
    fn empty_message_resolves_to_default() {
        let fault = Fault::new("");
        assert_eq!(resolve_message(Some(&fault), None), DEFAULT_MESSAGE);
    }

    #[test]
    fn default_override_replaces_builtin() {
        let overrides = MessageOverrides::new().default_message("That did not work.");
        let fault = Fault::new("");
        assert_eq!(
            resolve_message(Some(&fault), Some(&overrides)),
            "That did not work."
        );
    }

    #[test]
    fn status_with_network_text_prefers_status() {
        // Classification fields outrank the marker text.
        let fault = Fault::new("Network Error").with_status(500);
        assert_eq!(resolve_message(Some(&fault), None), STATUS_500_MESSAGE);
    }
}
