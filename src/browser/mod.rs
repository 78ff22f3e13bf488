//! Browser capability used by the portal workflow.
//!
//! The workflow only ever talks to the [`Browser`] trait. [`ChromeSession`]
//! drives a real Chrome over the DevTools protocol (feature `browser`);
//! tests drive an in-memory page instead.
//!
//! Element handles returned by a [`Browser`] are only valid until the page
//! re-renders. Callers resolve them right before use and never keep them
//! across a reload, a dropdown change, a submit or a tab switch.

mod chrome;
mod error;
pub mod profile;
pub mod wait;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use chrome::ChromeSession;
pub use error::BrowserError;

/// How to find an element on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Id(String),
    Css(String),
    XPath(String),
    Tag(String),
}

impl Locator {
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Self::Tag(name.into())
    }

    /// CSS equivalent of this locator, if there is one.
    pub fn as_css(&self) -> Option<String> {
        match self {
            Locator::Id(id) => Some(format!("[id='{}']", id.replace('\'', "\\'"))),
            Locator::Css(sel) => Some(sel.clone()),
            Locator::Tag(tag) => Some(tag.clone()),
            Locator::XPath(_) => None,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "#{}", id),
            Locator::Css(sel) => write!(f, "css `{}`", sel),
            Locator::XPath(expr) => write!(f, "xpath `{}`", expr),
            Locator::Tag(tag) => write!(f, "<{}>", tag),
        }
    }
}

/// Opaque identifier of a browser tab/window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowHandle(pub String);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handles present in `after` but not in `before`, in `after` order.
pub fn new_handles(before: &[WindowHandle], after: &[WindowHandle]) -> Vec<WindowHandle> {
    after
        .iter()
        .filter(|h| !before.contains(h))
        .cloned()
        .collect()
}

/// One `<option>` of a select control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Capability interface over a single browser session.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Handle to an element of the currently active window.
    type Element: Send + Sync;

    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    async fn reload(&mut self) -> Result<(), BrowserError>;

    async fn current_url(&self) -> Result<String, BrowserError>;

    /// Look an element up once, without waiting.
    async fn find_element(&self, locator: &Locator) -> Result<Self::Element, BrowserError>;

    /// All current matches; empty when nothing matches.
    async fn find_elements(&self, locator: &Locator) -> Result<Vec<Self::Element>, BrowserError>;

    /// Descendants of `parent` matching `locator`, in document order.
    async fn find_children(
        &self,
        parent: &Self::Element,
        locator: &Locator,
    ) -> Result<Vec<Self::Element>, BrowserError>;

    /// Visible and enabled.
    async fn is_clickable(&self, element: &Self::Element) -> Result<bool, BrowserError>;

    async fn click(&self, element: &Self::Element) -> Result<(), BrowserError>;

    async fn clear(&self, element: &Self::Element) -> Result<(), BrowserError>;

    async fn type_text(&self, element: &Self::Element, text: &str) -> Result<(), BrowserError>;

    /// Rendered text content, trimmed.
    async fn text(&self, element: &Self::Element) -> Result<String, BrowserError>;

    /// Options of a `<select>` in document order.
    async fn select_options(&self, element: &Self::Element)
        -> Result<Vec<SelectOption>, BrowserError>;

    /// Select the option whose visible label equals `label`.
    async fn select_by_label(&self, element: &Self::Element, label: &str)
        -> Result<(), BrowserError>;

    async fn select_by_value(&self, element: &Self::Element, value: &str)
        -> Result<(), BrowserError>;

    async fn window_handles(&self) -> Result<Vec<WindowHandle>, BrowserError>;

    async fn current_window(&self) -> Result<WindowHandle, BrowserError>;

    async fn switch_to_window(&mut self, handle: &WindowHandle) -> Result<(), BrowserError>;

    /// Close the active window. A switch is needed before further page access.
    async fn close_window(&mut self) -> Result<(), BrowserError>;
}
