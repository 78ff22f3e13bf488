//! Results grid reading and download activation.

use std::path::Path;

use tracing::{debug, info, warn};

use super::types::{DownloadTarget, HarvestReport, ResultRow};
use super::{ids, DOWNLOAD_PATTERNS, PDF_CONTENT_SELECTOR};
use crate::browser::wait::{element_exists, WaitPolicy};
use crate::browser::{new_handles, Browser, BrowserError, Locator, WindowHandle};
use crate::config::Timings;

/// What clicking one download control did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activation {
    /// No new window; the download (if any) started in place.
    SameWindow,
    /// A tab opened and was inspected then closed.
    NewTab { has_pdf: bool },
}

pub struct ResultHarvester<'a, B: Browser> {
    browser: &'a mut B,
    timings: &'a Timings,
    download_dir: &'a Path,
}

impl<'a, B: Browser> ResultHarvester<'a, B> {
    pub fn new(browser: &'a mut B, timings: &'a Timings, download_dir: &'a Path) -> Self {
        Self {
            browser,
            timings,
            download_dir,
        }
    }

    /// Read result rows, then click every download control.
    ///
    /// Download controls are tried whether or not the table showed up.
    /// Only failing to create the download directory is an error; anything
    /// going wrong with a single row, control or pattern is logged and
    /// skipped.
    pub async fn harvest(&mut self) -> Result<HarvestReport, BrowserError> {
        self.ensure_download_dir()?;

        let mut report = HarvestReport::default();

        let policy = WaitPolicy::new(self.timings.exists_timeout(), self.timings.poll_interval());
        if element_exists(&*self.browser, &Locator::id(ids::RESULTS_TABLE), policy).await {
            info!("Results table found");
            report.table_present = true;
            report.rows = self.extract_rows().await;
        } else {
            info!("Results table not present");
        }

        info!("Attempting to download FIR PDFs");
        self.activate_downloads(&mut report).await;

        Ok(report)
    }

    fn ensure_download_dir(&self) -> Result<(), BrowserError> {
        if !self.download_dir.exists() {
            std::fs::create_dir_all(self.download_dir)?;
            info!("Created download directory: {}", self.download_dir.display());
        }
        Ok(())
    }

    async fn extract_rows(&self) -> Vec<ResultRow> {
        let table = match self.browser.find_element(&Locator::id(ids::RESULTS_TABLE)).await {
            Ok(table) => table,
            Err(e) => {
                warn!("Results table vanished before it could be read: {}", e);
                return Vec::new();
            }
        };
        let rows = match self.browser.find_children(&table, &Locator::tag("tr")).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Could not list result rows: {}", e);
                return Vec::new();
            }
        };

        if rows.len() <= 1 {
            info!("No results found or only header row present.");
            return Vec::new();
        }

        let mut results = Vec::with_capacity(rows.len() - 1);
        for (i, row) in rows.iter().enumerate().skip(1) {
            match self.read_row(row).await {
                Ok(Some(result)) => {
                    info!("{}", result);
                    results.push(result);
                }
                Ok(None) => warn!("Row {} has fewer than four cells, skipped", i),
                Err(e) => warn!("Could not read row {}: {}", i, e),
            }
        }
        results
    }

    async fn read_row(&self, row: &B::Element) -> Result<Option<ResultRow>, BrowserError> {
        let cells = self.browser.find_children(row, &Locator::tag("td")).await?;
        let mut texts = Vec::with_capacity(4);
        for cell in cells.iter().take(4) {
            texts.push(self.browser.text(cell).await?);
        }
        Ok(ResultRow::from_cells(&texts))
    }

    async fn activate_downloads(&mut self, report: &mut HarvestReport) {
        for &pattern in DOWNLOAD_PATTERNS {
            debug!("Searching for download elements using pattern: {}", pattern);
            let count = match self.browser.find_elements(&Locator::css(pattern)).await {
                Ok(found) => found.len(),
                Err(e) => {
                    warn!("Error with pattern {}: {}", pattern, e);
                    continue;
                }
            };
            if count == 0 {
                continue;
            }

            info!("Found {} download elements with pattern: {}", count, pattern);
            report.downloads_matched += count;

            for index in 0..count {
                let target = DownloadTarget { pattern, index };
                info!("Clicking download element {}/{}", index + 1, count);
                match self.activate(&target).await {
                    Ok(Activation::SameWindow) => report.downloads_activated += 1,
                    Ok(Activation::NewTab { has_pdf }) => {
                        report.downloads_activated += 1;
                        report.tabs_opened += 1;
                        if has_pdf {
                            report.pdf_tabs += 1;
                        }
                    }
                    Err(e) => warn!("Error clicking element {}: {}", index + 1, e),
                }
            }
        }
    }

    /// Fresh handle to the target's control.
    async fn resolve(&self, target: &DownloadTarget) -> Result<B::Element, BrowserError> {
        let locator = Locator::css(target.pattern);
        self.browser
            .find_elements(&locator)
            .await?
            .into_iter()
            .nth(target.index)
            .ok_or_else(|| BrowserError::ElementNotFound(locator.clone()))
    }

    /// Click one control and deal with any tab it opens. Once a new tab has
    /// been entered, the original window is switched back to before
    /// returning, whatever happened in the tab.
    async fn activate(&mut self, target: &DownloadTarget) -> Result<Activation, BrowserError> {
        let original = self.browser.current_window().await?;
        let before = self.browser.window_handles().await?;

        let control = self.resolve(target).await?;
        self.browser.click(&control).await?;
        tokio::time::sleep(self.timings.click_settle()).await;

        let after = self.browser.window_handles().await?;
        let Some(tab) = new_handles(&before, &after).into_iter().next() else {
            return Ok(Activation::SameWindow);
        };

        let inspected = self.inspect_tab(&tab).await;
        self.browser.switch_to_window(&original).await?;

        let has_pdf = inspected.unwrap_or_else(|e| {
            warn!("Error processing new tab: {}", e);
            false
        });
        Ok(Activation::NewTab { has_pdf })
    }

    /// Switch to `tab`, look for PDF content and close it.
    async fn inspect_tab(&mut self, tab: &WindowHandle) -> Result<bool, BrowserError> {
        self.browser.switch_to_window(tab).await?;
        match self.browser.current_url().await {
            Ok(url) => info!("Switched to new tab with URL: {}", url),
            Err(e) => debug!("New tab URL unavailable: {}", e),
        }
        tokio::time::sleep(self.timings.tab_load()).await;

        let found = self
            .browser
            .find_elements(&Locator::css(PDF_CONTENT_SELECTOR))
            .await;
        let closed = self.browser.close_window().await;

        let has_pdf = !found?.is_empty();
        closed?;

        if has_pdf {
            info!("Found PDF content in new tab");
        } else {
            info!("No PDF content found in new tab");
        }
        Ok(has_pdf)
    }
}
