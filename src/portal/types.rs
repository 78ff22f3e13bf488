//! Data carried through a single scrape run.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::browser::SelectOption;

/// What to search for. Fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// Registration date lower bound, typed into the form as-is.
    pub date_from: String,
    /// Registration date upper bound, typed into the form as-is.
    pub date_to: String,
    pub district: String,
    pub police_station: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    50
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            date_from: "01/02/2025".to_string(),
            date_to: "01/03/2025".to_string(),
            district: "THANE CITY".to_string(),
            police_station: "NAUPADA".to_string(),
            page_size: default_page_size(),
        }
    }
}

/// Options of a dropdown as read at one moment.
///
/// Stale as soon as the page reloads or an upstream control changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownState {
    pub control_id: String,
    pub options: Vec<SelectOption>,
}

impl DropdownState {
    pub fn new(control_id: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Self {
            control_id: control_id.into(),
            options,
        }
    }

    /// A lone option is the placeholder; there is nothing real to pick.
    pub fn is_degenerate(&self) -> bool {
        self.options.len() <= 1
    }

    /// Options a caller may pick, optionally skipping the leading placeholder.
    pub fn eligible(&self, skip_first: bool) -> &[SelectOption] {
        let start = usize::from(skip_first).min(self.options.len());
        &self.options[start..]
    }
}

/// One data row of the results grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRow {
    pub fir_number: String,
    pub fir_date: String,
    pub police_station: String,
    pub section: String,
}

impl ResultRow {
    /// Build a row from cell texts; the first four cells are positional.
    pub fn from_cells(cells: &[String]) -> Option<Self> {
        match cells {
            [fir_number, fir_date, police_station, section, ..] => Some(Self {
                fir_number: fir_number.trim().to_string(),
                fir_date: fir_date.trim().to_string(),
                police_station: police_station.trim().to_string(),
                section: section.trim().to_string(),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for ResultRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FIR: {}, Date: {}, PS: {}, Section: {}",
            self.fir_number, self.fir_date, self.police_station, self.section
        )
    }
}

/// The n-th match of a download selector pattern.
///
/// Never holds an element handle; the control is looked up again right
/// before it is clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub pattern: &'static str,
    pub index: usize,
}

/// What one harvesting pass saw and did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub table_present: bool,
    pub rows: Vec<ResultRow>,
    /// Matches summed over every pattern; overlapping patterns count twice.
    pub downloads_matched: usize,
    pub downloads_activated: usize,
    pub tabs_opened: usize,
    pub pdf_tabs: usize,
}

impl HarvestReport {
    /// Result rows or download controls were found.
    pub fn found_anything(&self) -> bool {
        !self.rows.is_empty() || self.downloads_matched > 0
    }
}
