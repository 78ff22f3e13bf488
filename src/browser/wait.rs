//! Bounded waits on top of the [`Browser`] capability.
//!
//! Every wait polls at a fixed interval and gives up with
//! [`BrowserError::Timeout`] once the deadline passes. A zero timeout probes
//! exactly once.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::{Browser, BrowserError, Locator};

/// Poll settings for a wait.
#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl WaitPolicy {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }
}

/// Wait until `locator` is present and return a fresh handle to it.
pub async fn wait_for_element<B: Browser + ?Sized>(
    browser: &B,
    locator: &Locator,
    policy: WaitPolicy,
) -> Result<B::Element, BrowserError> {
    let deadline = Instant::now() + policy.timeout;
    loop {
        match browser.find_element(locator).await {
            Ok(element) => return Ok(element),
            Err(e) if e.is_transient() => {
                debug!("{} not present yet: {}", locator, e);
            }
            Err(e) => return Err(e),
        }
        if Instant::now() >= deadline {
            return Err(BrowserError::Timeout {
                locator: locator.clone(),
                timeout: policy.timeout,
            });
        }
        tokio::time::sleep(policy.poll_interval).await;
    }
}

/// Wait until `locator` is present, visible and enabled.
pub async fn wait_for_clickable<B: Browser + ?Sized>(
    browser: &B,
    locator: &Locator,
    policy: WaitPolicy,
) -> Result<B::Element, BrowserError> {
    let deadline = Instant::now() + policy.timeout;
    loop {
        let err = match browser.find_element(locator).await {
            Ok(element) => match browser.is_clickable(&element).await {
                Ok(true) => return Ok(element),
                Ok(false) => BrowserError::NotClickable(locator.clone()),
                Err(e) => e,
            },
            Err(e) => e,
        };
        if !err.is_transient() {
            return Err(err);
        }
        debug!("{} not clickable yet: {}", locator, err);
        if Instant::now() >= deadline {
            return Err(BrowserError::Timeout {
                locator: locator.clone(),
                timeout: policy.timeout,
            });
        }
        tokio::time::sleep(policy.poll_interval).await;
    }
}

/// Whether `locator` shows up within the wait.
pub async fn element_exists<B: Browser + ?Sized>(
    browser: &B,
    locator: &Locator,
    policy: WaitPolicy,
) -> bool {
    wait_for_element(browser, locator, policy).await.is_ok()
}
