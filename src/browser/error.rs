//! Browser capability error types.

use std::time::Duration;

use thiserror::Error;

use super::Locator;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Element not found: {0}")]
    ElementNotFound(Locator),

    #[error("Timed out after {timeout:?} waiting for {locator}")]
    Timeout { locator: Locator, timeout: Duration },

    #[error("Stale element reference: {0}")]
    StaleReference(String),

    #[error("No option labelled '{label}' in {control}")]
    NoMatchingOption { control: String, label: String },

    #[error("Dropdown {0} has no selectable options")]
    DegenerateOptionSet(String),

    #[error("Element is not clickable: {0}")]
    NotClickable(Locator),

    #[error("No such window: {0}")]
    NoSuchWindow(String),

    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BrowserError {
    /// Errors that a bounded wait should keep polling through.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BrowserError::ElementNotFound(_)
                | BrowserError::StaleReference(_)
                | BrowserError::NotClickable(_)
        )
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, BrowserError::StaleReference(_))
    }
}
