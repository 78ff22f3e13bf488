//! Chrome session over the DevTools protocol (chromiumoxide).
//!
//! Tabs are exposed as window handles using their CDP target ids. The
//! session tracks which tab is active; element lookups always go to it.

use std::path::Path;
#[cfg(feature = "browser")]
use std::path::PathBuf;
#[cfg(feature = "browser")]
use std::time::Duration;

use async_trait::async_trait;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
#[cfg(feature = "browser")]
use chromiumoxide::element::Element;
#[cfg(feature = "browser")]
use chromiumoxide::error::CdpError;
#[cfg(feature = "browser")]
use chromiumoxide::{Browser as CdpBrowser, BrowserConfig, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tempfile::TempDir;
#[cfg(feature = "browser")]
use tokio::task::JoinHandle;

#[cfg(feature = "browser")]
use super::profile;
use super::{Browser, BrowserError, Locator, SelectOption, WindowHandle};
use crate::config::BrowserEngineConfig;

/// CDP error texts that mean a node or its document went away.
#[cfg(feature = "browser")]
const STALE_MARKERS: &[&str] = &[
    "Could not find node with given id",
    "No node with given id",
    "Node is detached",
    "Could not find object with given id",
    "Cannot find context with specified id",
    "Execution context was destroyed",
    "Inspected target navigated or closed",
];

#[cfg(feature = "browser")]
fn is_stale_message(msg: &str) -> bool {
    STALE_MARKERS.iter().any(|m| msg.contains(m))
}

/// Map an error from an operation on an existing element.
#[cfg(feature = "browser")]
fn element_error(e: CdpError) -> BrowserError {
    let msg = e.to_string();
    if is_stale_message(&msg) {
        BrowserError::StaleReference(msg)
    } else {
        BrowserError::Protocol(msg)
    }
}

/// Map an error from a lookup.
#[cfg(feature = "browser")]
fn lookup_error(e: CdpError, locator: &Locator) -> BrowserError {
    let msg = e.to_string();
    if matches!(e, CdpError::NotFound) || msg.contains("Could not find node") {
        BrowserError::ElementNotFound(locator.clone())
    } else if is_stale_message(&msg) {
        BrowserError::StaleReference(msg)
    } else {
        BrowserError::Protocol(msg)
    }
}

#[cfg(feature = "browser")]
fn protocol(e: CdpError) -> BrowserError {
    BrowserError::Protocol(e.to_string())
}

/// Embed a string as a JavaScript literal.
#[cfg(feature = "browser")]
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

#[cfg(feature = "browser")]
const IS_CLICKABLE_JS: &str = r#"function() {
    const style = window.getComputedStyle(this);
    return !this.disabled
        && style.visibility !== 'hidden'
        && style.display !== 'none'
        && this.getClientRects().length > 0;
}"#;

#[cfg(feature = "browser")]
const CLEAR_JS: &str = r#"function() {
    this.focus();
    this.value = '';
    this.dispatchEvent(new Event('input', { bubbles: true }));
    this.dispatchEvent(new Event('change', { bubbles: true }));
}"#;

#[cfg(feature = "browser")]
const OPTIONS_JS: &str = r#"function() {
    return JSON.stringify(Array.from(this.options || []).map(o => ({
        label: (o.text || '').trim(),
        value: o.value
    })));
}"#;

/// Select the first option for which `pick(option)` holds and fire `change`
/// so ASP.NET auto-postback handlers run.
#[cfg(feature = "browser")]
fn select_js(predicate: &str) -> String {
    format!(
        r#"function() {{
    const options = Array.from(this.options || []);
    const index = options.findIndex(o => {});
    if (index < 0) return false;
    this.selectedIndex = index;
    this.dispatchEvent(new Event('input', {{ bubbles: true }}));
    this.dispatchEvent(new Event('change', {{ bubbles: true }}));
    return true;
}}"#,
        predicate
    )
}

/// A single Chrome session with one active tab.
#[cfg(feature = "browser")]
pub struct ChromeSession {
    browser: CdpBrowser,
    handler_task: JoinHandle<()>,
    current: Option<Page>,
    remote: bool,
    download_dir: PathBuf,
    /// Profile of a launched browser; removed when the session is dropped.
    _profile: Option<TempDir>,
}

#[cfg(feature = "browser")]
impl ChromeSession {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        // Common install locations
        "/opt/google/chrome/google-chrome",
    ];

    /// Find Chrome executable.
    pub fn find_chrome(config: &BrowserEngineConfig) -> Result<PathBuf, BrowserError> {
        if let Some(ref path) = config.chrome_path {
            if path.exists() {
                return Ok(path.clone());
            }
            return Err(BrowserError::Launch(format!(
                "Configured Chrome not found at {}",
                path.display()
            )));
        }

        for path in Self::CHROME_PATHS {
            let p = Path::new(path);
            if p.exists() {
                info!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in [
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(path) = which::which(cmd) {
                info!("Found Chrome in PATH: {}", path.display());
                return Ok(path);
            }
        }

        Err(BrowserError::Launch(
            "Chrome/Chromium not found. Please install it:\n\
             - Arch/Manjaro: sudo pacman -S chromium\n\
             - Ubuntu/Debian: sudo apt install chromium-browser\n\
             - Fedora: sudo dnf install chromium\n\
             - Or download from: https://www.google.com/chrome/"
                .to_string(),
        ))
    }

    /// Launch (or connect to) Chrome with downloads going to `download_dir`.
    ///
    /// The directory is created if absent.
    pub async fn launch(
        config: &BrowserEngineConfig,
        download_dir: &Path,
    ) -> Result<Self, BrowserError> {
        if !download_dir.exists() {
            std::fs::create_dir_all(download_dir)?;
            info!("Created download directory: {}", download_dir.display());
        }
        let download_dir = std::fs::canonicalize(download_dir)?;

        let (browser, handler_task, profile) = match config.remote_url.clone() {
            Some(url) => {
                let (browser, task) = Self::connect_remote(config, &url).await?;
                (browser, task, None)
            }
            None => {
                let (browser, task, profile) = Self::launch_local(config, &download_dir).await?;
                (browser, task, Some(profile))
            }
        };

        let mut session = Self {
            browser,
            handler_task,
            current: None,
            remote: profile.is_none(),
            download_dir,
            _profile: profile,
        };
        session.configure_downloads().await?;

        let page = session
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;
        session.current = Some(page);

        Ok(session)
    }

    async fn launch_local(
        config: &BrowserEngineConfig,
        download_dir: &Path,
    ) -> Result<(CdpBrowser, JoinHandle<()>, TempDir), BrowserError> {
        info!("Launching browser (headless={})", config.headless);

        let chrome_path = Self::find_chrome(config)?;

        let profile_dir = tempfile::Builder::new().prefix("firharvest-profile-").tempdir()?;
        profile::write_profile(profile_dir.path(), download_dir)?;
        debug!("Chrome profile at {}", profile_dir.path().display());

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .user_data_dir(profile_dir.path());

        // with_head means NOT headless
        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = match config.window_size {
            Some((width, height)) => builder.window_size(width, height).viewport(None),
            None => builder.arg("--start-maximized").viewport(None),
        };

        builder = builder
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-popup-blocking")
            .arg("--no-sandbox"); // Often needed in containers/restricted environments

        for arg in &config.chrome_args {
            builder = builder.arg(arg);
        }

        let browser_config = builder
            .request_timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| BrowserError::Launch(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = CdpBrowser::launch(browser_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok((browser, task, profile_dir))
    }

    /// Connect to a remote Chrome instance.
    async fn connect_remote(
        config: &BrowserEngineConfig,
        url: &str,
    ) -> Result<(CdpBrowser, JoinHandle<()>), BrowserError> {
        info!(
            "Connecting to remote browser at {} (timeout: {}s)",
            url, config.timeout
        );

        // Get WebSocket URL from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .send()
            .await
            .map_err(|e| BrowserError::Launch(format!("Failed to reach remote browser: {}", e)))?
            .json()
            .await
            .map_err(|e| BrowserError::Launch(format!("Failed to parse browser version info: {}", e)))?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| BrowserError::Launch("No webSocketDebuggerUrl in response".to_string()))?;

        info!("Connecting to WebSocket: {}", ws_url);

        let handler_config = chromiumoxide::handler::HandlerConfig {
            request_timeout: Duration::from_secs(config.timeout),
            ..Default::default()
        };

        let (browser, mut handler) = CdpBrowser::connect_with_config(ws_url, handler_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok((browser, task))
    }

    /// Save downloads without prompting.
    async fn configure_downloads(&self) -> Result<(), BrowserError> {
        let params = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::Allow)
            .download_path(self.download_dir.to_string_lossy().to_string())
            .build()
            .map_err(BrowserError::Protocol)?;
        self.browser.execute(params).await.map_err(protocol)?;
        debug!("Downloads go to {}", self.download_dir.display());
        Ok(())
    }

    fn page(&self) -> Result<&Page, BrowserError> {
        self.current
            .as_ref()
            .ok_or_else(|| BrowserError::NoSuchWindow("active window was closed".to_string()))
    }

    async fn call_fn(element: &Element, declaration: &str) -> Result<serde_json::Value, BrowserError> {
        let ret = element
            .call_js_fn(declaration, false)
            .await
            .map_err(element_error)?;
        if let Some(details) = ret.exception_details {
            return Err(BrowserError::Protocol(details.text));
        }
        Ok(ret.result.value.unwrap_or(serde_json::Value::Null))
    }

    async fn control_name(element: &Element) -> String {
        match element.attribute("id").await {
            Ok(Some(id)) => id,
            _ => "select".to_string(),
        }
    }

    /// End the session. Launched browsers are shut down; for a remote
    /// browser only the tab this session was using is closed.
    pub async fn close(mut self) {
        if self.remote {
            if let Some(page) = self.current.take() {
                let _ = page.close().await;
            }
        } else {
            if let Err(e) = self.browser.close().await {
                warn!("Failed to close browser: {}", e);
            }
            let _ = self.browser.wait().await;
        }
        self.handler_task.abort();
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl Browser for ChromeSession {
    type Element = Element;

    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        debug!("Navigating to {}", url);
        self.page()?.goto(url).await.map_err(protocol)?;
        Ok(())
    }

    async fn reload(&mut self) -> Result<(), BrowserError> {
        self.page()?.reload().await.map_err(protocol)?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok(self
            .page()?
            .url()
            .await
            .map_err(protocol)?
            .unwrap_or_default())
    }

    async fn find_element(&self, locator: &Locator) -> Result<Element, BrowserError> {
        let page = self.page()?;
        let found = match (locator, locator.as_css()) {
            (_, Some(css)) => page.find_element(css).await,
            (Locator::XPath(expr), None) => page.find_xpath(expr.as_str()).await,
            (_, None) => return Err(BrowserError::ElementNotFound(locator.clone())),
        };
        found.map_err(|e| lookup_error(e, locator))
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<Element>, BrowserError> {
        let page = self.page()?;
        let found = match (locator, locator.as_css()) {
            (_, Some(css)) => page.find_elements(css).await,
            (Locator::XPath(expr), None) => page.find_xpaths(expr.as_str()).await,
            (_, None) => return Ok(Vec::new()),
        };
        match found.map_err(|e| lookup_error(e, locator)) {
            Err(BrowserError::ElementNotFound(_)) => Ok(Vec::new()),
            other => other,
        }
    }

    async fn find_children(
        &self,
        parent: &Element,
        locator: &Locator,
    ) -> Result<Vec<Element>, BrowserError> {
        let css = locator.as_css().ok_or_else(|| {
            BrowserError::Protocol(format!("{} is not supported below an element", locator))
        })?;
        match parent.find_elements(css).await {
            Ok(children) => Ok(children),
            Err(CdpError::NotFound) => Ok(Vec::new()),
            Err(e) => Err(element_error(e)),
        }
    }

    async fn is_clickable(&self, element: &Element) -> Result<bool, BrowserError> {
        Ok(Self::call_fn(element, IS_CLICKABLE_JS)
            .await?
            .as_bool()
            .unwrap_or(false))
    }

    async fn click(&self, element: &Element) -> Result<(), BrowserError> {
        element.click().await.map_err(element_error)?;
        Ok(())
    }

    async fn clear(&self, element: &Element) -> Result<(), BrowserError> {
        Self::call_fn(element, CLEAR_JS).await?;
        Ok(())
    }

    async fn type_text(&self, element: &Element, text: &str) -> Result<(), BrowserError> {
        element.type_str(text).await.map_err(element_error)?;
        Ok(())
    }

    async fn text(&self, element: &Element) -> Result<String, BrowserError> {
        Ok(element
            .inner_text()
            .await
            .map_err(element_error)?
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    async fn select_options(&self, element: &Element) -> Result<Vec<SelectOption>, BrowserError> {
        let raw = Self::call_fn(element, OPTIONS_JS).await?;
        let json = raw.as_str().unwrap_or("[]");
        serde_json::from_str(json)
            .map_err(|e| BrowserError::Protocol(format!("Unreadable option list: {}", e)))
    }

    async fn select_by_label(&self, element: &Element, label: &str) -> Result<(), BrowserError> {
        let predicate = format!("(o.text || '').trim() === {}", js_string(label.trim()));
        let selected = Self::call_fn(element, &select_js(&predicate)).await?;
        if selected.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(BrowserError::NoMatchingOption {
                control: Self::control_name(element).await,
                label: label.to_string(),
            })
        }
    }

    async fn select_by_value(&self, element: &Element, value: &str) -> Result<(), BrowserError> {
        let predicate = format!("o.value === {}", js_string(value));
        let selected = Self::call_fn(element, &select_js(&predicate)).await?;
        if selected.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(BrowserError::NoMatchingOption {
                control: Self::control_name(element).await,
                label: value.to_string(),
            })
        }
    }

    async fn window_handles(&self) -> Result<Vec<WindowHandle>, BrowserError> {
        let pages = self.browser.pages().await.map_err(protocol)?;
        Ok(pages
            .iter()
            .map(|p| WindowHandle(p.target_id().as_ref().to_string()))
            .collect())
    }

    async fn current_window(&self) -> Result<WindowHandle, BrowserError> {
        Ok(WindowHandle(self.page()?.target_id().as_ref().to_string()))
    }

    async fn switch_to_window(&mut self, handle: &WindowHandle) -> Result<(), BrowserError> {
        let pages = self.browser.pages().await.map_err(protocol)?;
        let page = pages
            .into_iter()
            .find(|p| p.target_id().as_ref() == handle.0.as_str())
            .ok_or_else(|| BrowserError::NoSuchWindow(handle.0.clone()))?;
        if let Err(e) = page.bring_to_front().await {
            debug!("Could not bring {} to front: {}", handle, e);
        }
        self.current = Some(page);
        Ok(())
    }

    async fn close_window(&mut self) -> Result<(), BrowserError> {
        let page = self
            .current
            .take()
            .ok_or_else(|| BrowserError::NoSuchWindow("active window was closed".to_string()))?;
        page.close().await.map_err(protocol)
    }
}

#[cfg(not(feature = "browser"))]
fn not_compiled() -> BrowserError {
    BrowserError::Launch(
        "Browser support not compiled. Rebuild with: cargo build --features browser".to_string(),
    )
}

/// Stand-in when built without the `browser` feature. `launch` always fails.
#[cfg(not(feature = "browser"))]
pub struct ChromeSession {
    _private: (),
}

#[cfg(not(feature = "browser"))]
impl ChromeSession {
    pub async fn launch(
        _config: &BrowserEngineConfig,
        _download_dir: &Path,
    ) -> Result<Self, BrowserError> {
        Err(not_compiled())
    }

    pub async fn close(self) {}
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl Browser for ChromeSession {
    type Element = std::convert::Infallible;

    async fn navigate(&mut self, _url: &str) -> Result<(), BrowserError> {
        Err(not_compiled())
    }

    async fn reload(&mut self) -> Result<(), BrowserError> {
        Err(not_compiled())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        Err(not_compiled())
    }

    async fn find_element(&self, _locator: &Locator) -> Result<Self::Element, BrowserError> {
        Err(not_compiled())
    }

    async fn find_elements(&self, _locator: &Locator) -> Result<Vec<Self::Element>, BrowserError> {
        Err(not_compiled())
    }

    async fn find_children(
        &self,
        _parent: &Self::Element,
        _locator: &Locator,
    ) -> Result<Vec<Self::Element>, BrowserError> {
        Err(not_compiled())
    }

    async fn is_clickable(&self, _element: &Self::Element) -> Result<bool, BrowserError> {
        Err(not_compiled())
    }

    async fn click(&self, _element: &Self::Element) -> Result<(), BrowserError> {
        Err(not_compiled())
    }

    async fn clear(&self, _element: &Self::Element) -> Result<(), BrowserError> {
        Err(not_compiled())
    }

    async fn type_text(&self, _element: &Self::Element, _text: &str) -> Result<(), BrowserError> {
        Err(not_compiled())
    }

    async fn text(&self, _element: &Self::Element) -> Result<String, BrowserError> {
        Err(not_compiled())
    }

    async fn select_options(
        &self,
        _element: &Self::Element,
    ) -> Result<Vec<SelectOption>, BrowserError> {
        Err(not_compiled())
    }

    async fn select_by_label(
        &self,
        _element: &Self::Element,
        _label: &str,
    ) -> Result<(), BrowserError> {
        Err(not_compiled())
    }

    async fn select_by_value(
        &self,
        _element: &Self::Element,
        _value: &str,
    ) -> Result<(), BrowserError> {
        Err(not_compiled())
    }

    async fn window_handles(&self) -> Result<Vec<WindowHandle>, BrowserError> {
        Err(not_compiled())
    }

    async fn current_window(&self) -> Result<WindowHandle, BrowserError> {
        Err(not_compiled())
    }

    async fn switch_to_window(&mut self, _handle: &WindowHandle) -> Result<(), BrowserError> {
        Err(not_compiled())
    }

    async fn close_window(&mut self) -> Result<(), BrowserError> {
        Err(not_compiled())
    }
}
