//! Published-FIR search workflow.
//!
//! [`FormNavigator`] fills the search form, [`ResultHarvester`] reads the
//! results grid and triggers downloads, and [`RetryOrchestrator`] repeats
//! the whole sequence from a fresh page load until something is found or
//! the attempt budget runs out.

mod harvester;
mod navigator;
mod orchestrator;
mod types;

pub use harvester::ResultHarvester;
pub use navigator::{FormNavigator, PageSizeOutcome};
pub use orchestrator::{AttemptFailure, AttemptState, RetryOrchestrator, RunOutcome};
pub use types::{DownloadTarget, DropdownState, HarvestReport, ResultRow, SearchCriteria};

/// Element ids of the portal's ASP.NET search page.
pub mod ids {
    pub const DATE_FROM: &str = "ContentPlaceHolder1_txtDateOfRegistrationFrom";
    pub const DATE_TO: &str = "ContentPlaceHolder1_txtDateOfRegistrationTo";
    pub const DISTRICT: &str = "ContentPlaceHolder1_ddlDistrict";
    pub const POLICE_STATION: &str = "ContentPlaceHolder1_ddlPoliceStation";
    pub const SEARCH_BUTTON: &str = "ContentPlaceHolder1_btnSearch";
    pub const PAGE_SIZE: &str = "ContentPlaceHolder1_ucRecordView_ddlPageSize";
    pub const RESULTS_TABLE: &str = "ContentPlaceHolder1_gvFIRs";
}

/// Selectors for controls that may start a document download, tried in
/// order. Matches are not exclusive; a control may match several patterns.
pub const DOWNLOAD_PATTERNS: &[&str] = &[
    "[id^='ContentPlaceHolder1_gdvDeadBody_btnDownload_']",
    "[id^='ContentPlaceHolder1_gvFIRs_btnDownload_']",
    "a[href*='ViewFIR']",
    "a[target='_blank']",
    "input[type='button'][value*='Download']",
    "button[id*='Download']",
];

/// PDF content in a tab opened by a download control.
pub const PDF_CONTENT_SELECTOR: &str = "a[href$='.pdf'], embed[type='application/pdf']";

/// Fallback page-size control: a pager link whose text is the size.
pub fn page_size_link_xpath(size: u32) -> String {
    format!("//a[text()='{}']", size)
}
