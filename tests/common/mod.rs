//! In-memory stand-in for the portal page, driven through the `Browser` trait.
//!
//! Every select and click re-renders the page (as the ASP.NET postbacks do),
//! so element handles taken before it come back as stale.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use firharvest::browser::{Browser, BrowserError, Locator, SelectOption, WindowHandle};
use firharvest::config::Timings;
use firharvest::portal::{ids, page_size_link_xpath, PDF_CONTENT_SELECTOR};

pub const PORTAL_URL: &str = "https://portal.test/PublishedFIRs.aspx";
pub const MAIN_WINDOW: &str = "main";

pub fn option(label: &str, value: &str) -> SelectOption {
    SelectOption::new(label, value)
}

fn placeholder() -> SelectOption {
    option("--Select--", "")
}

fn with_placeholder(labels: &[&str]) -> Vec<SelectOption> {
    let mut options = vec![placeholder()];
    options.extend(
        labels
            .iter()
            .enumerate()
            .map(|(i, l)| option(l, &(i + 1).to_string())),
    );
    options
}

/// What a tab opened by a download control contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabSpec {
    pub has_pdf: bool,
    /// Every lookup in the tab fails with a protocol error.
    pub broken: bool,
}

/// A download control shown with the results.
#[derive(Debug, Clone)]
pub struct DownloadSpec {
    pub id: String,
    /// CSS selectors this control answers to.
    pub selectors: Vec<String>,
    pub tab: Option<TabSpec>,
}

impl DownloadSpec {
    pub fn grid_button(index: usize) -> Self {
        Self {
            id: format!("ContentPlaceHolder1_gvFIRs_btnDownload_{}", index),
            selectors: vec!["[id^='ContentPlaceHolder1_gvFIRs_btnDownload_']".to_string()],
            tab: None,
        }
    }

    pub fn view_link(index: usize, tab: TabSpec) -> Self {
        Self {
            id: format!("lnkView_{}", index),
            selectors: vec![
                "a[href*='ViewFIR']".to_string(),
                "a[target='_blank']".to_string(),
            ],
            tab: Some(tab),
        }
    }
}

/// How the scripted portal behaves.
#[derive(Debug, Clone)]
pub struct Portal {
    pub districts: Vec<SelectOption>,
    /// Station options by district label, placeholder included.
    pub stations: HashMap<String, Vec<SelectOption>>,
    /// District list holds only the placeholder for this many page loads.
    pub degenerate_loads: usize,
    pub date_fields: bool,
    pub results_table: bool,
    /// Result cells per row; rows may be short.
    pub rows: Vec<Vec<String>>,
    pub downloads: Vec<DownloadSpec>,
    /// Results only show up from this page load on.
    pub results_from_load: usize,
    pub page_size_selector: bool,
    pub page_size_link: bool,
    /// CSS selectors the page rejects with a protocol error.
    pub failing_selectors: Vec<String>,
}

impl Default for Portal {
    fn default() -> Self {
        let mut stations = HashMap::new();
        stations.insert(
            "THANE CITY".to_string(),
            with_placeholder(&["KOPRI", "NAUPADA", "WAGLE ESTATE"]),
        );
        stations.insert(
            "PUNE CITY".to_string(),
            with_placeholder(&["DECCAN", "SHIVAJINAGAR"]),
        );
        stations.insert("NAGPUR CITY".to_string(), with_placeholder(&["SITABULDI"]));

        Self {
            districts: with_placeholder(&["NAGPUR CITY", "PUNE CITY", "THANE CITY"]),
            stations,
            degenerate_loads: 0,
            date_fields: true,
            results_table: true,
            rows: vec![
                row(&["0301/2025", "03/02/2025", "NAUPADA", "BNS 303(2)"]),
                row(&["0322/2025", "15/02/2025", "NAUPADA", "BNS 318(4)"]),
            ],
            downloads: vec![DownloadSpec::grid_button(0), DownloadSpec::grid_button(1)],
            results_from_load: 1,
            page_size_selector: true,
            page_size_link: false,
            failing_selectors: Vec::new(),
        }
    }
}

impl Portal {
    /// Search returns a grid with only its header row and no download controls.
    pub fn empty_results() -> Self {
        Self {
            rows: Vec::new(),
            downloads: Vec::new(),
            ..Default::default()
        }
    }

    pub fn without_district(mut self, label: &str) -> Self {
        self.districts.retain(|o| o.label != label);
        self
    }
}

pub fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

/// Everything the workflow did to the page, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Navigate(String),
    Reload,
    Clear(String),
    Type { control: String, text: String },
    Select { control: String, label: String },
    SelectValue { control: String, value: String },
    Click(String),
    SwitchTo(String),
    CloseWindow(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeAction {
    None,
    Search,
    Download(Option<TabSpec>),
}

#[derive(Debug, Clone)]
struct Node {
    id: Option<String>,
    tag: &'static str,
    selectors: Vec<String>,
    text: String,
    options: Vec<SelectOption>,
    clickable: bool,
    children: Vec<usize>,
    action: NodeAction,
}

impl Node {
    fn new(tag: &'static str) -> Self {
        Self {
            id: None,
            tag,
            selectors: Vec::new(),
            text: String::new(),
            options: Vec::new(),
            clickable: true,
            children: Vec::new(),
            action: NodeAction::None,
        }
    }

    fn with_id(tag: &'static str, id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            ..Self::new(tag)
        }
    }

    fn name(&self) -> String {
        self.id
            .clone()
            .or_else(|| self.selectors.first().cloned())
            .unwrap_or_else(|| self.tag.to_string())
    }

    fn matches(&self, locator: &Locator) -> bool {
        match locator {
            Locator::Id(id) => self.id.as_deref() == Some(id.as_str()),
            Locator::Tag(tag) => self.tag == tag.as_str(),
            Locator::Css(sel) | Locator::XPath(sel) => self.selectors.iter().any(|s| s == sel),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Page {
    url: String,
    nodes: Vec<Node>,
    generation: u64,
    broken: bool,
}

impl Page {
    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id.as_deref() == Some(id))
    }
}

#[derive(Debug)]
struct Window {
    handle: String,
    page: Page,
}

#[derive(Debug)]
struct State {
    portal: Portal,
    windows: Vec<Window>,
    current: Option<String>,
    loads: usize,
    tabs_created: usize,
    generations: u64,
    stale_budget: HashMap<String, usize>,
    actions: Vec<Action>,
}

impl State {
    fn next_generation(&mut self) -> u64 {
        self.generations += 1;
        self.generations
    }

    fn window_mut(&mut self, handle: &str) -> Result<&mut Window, BrowserError> {
        self.windows
            .iter_mut()
            .find(|w| w.handle == handle)
            .ok_or_else(|| BrowserError::NoSuchWindow(handle.to_string()))
    }

    fn current_handle(&self) -> Result<String, BrowserError> {
        self.current
            .clone()
            .ok_or_else(|| BrowserError::NoSuchWindow("no active window".to_string()))
    }

    fn current_page(&mut self) -> Result<&mut Page, BrowserError> {
        let handle = self.current_handle()?;
        Ok(&mut self.window_mut(&handle)?.page)
    }

    fn load_portal(&mut self, url: &str) -> Result<(), BrowserError> {
        self.loads += 1;
        let generation = self.next_generation();
        let portal = &self.portal;

        let mut page = Page {
            url: url.to_string(),
            generation,
            ..Default::default()
        };

        if portal.date_fields {
            page.push(Node::with_id("input", ids::DATE_FROM));
            page.push(Node::with_id("input", ids::DATE_TO));
        }

        let mut district = Node::with_id("select", ids::DISTRICT);
        district.options = if self.loads <= portal.degenerate_loads {
            vec![placeholder()]
        } else {
            portal.districts.clone()
        };
        page.push(district);

        let mut station = Node::with_id("select", ids::POLICE_STATION);
        station.options = vec![placeholder()];
        page.push(station);

        page.push(Node {
            action: NodeAction::Search,
            ..Node::with_id("input", ids::SEARCH_BUTTON)
        });

        *self.current_page()? = page;
        Ok(())
    }

    fn show_results(&mut self) -> Result<(), BrowserError> {
        let generation = self.next_generation();
        let show = self.loads >= self.portal.results_from_load;
        let portal = self.portal.clone();
        let page = self.current_page()?;
        page.generation = generation;

        if portal.page_size_selector {
            let mut size = Node::with_id("select", ids::PAGE_SIZE);
            size.options = vec![option("10", "10"), option("25", "25"), option("50", "50")];
            page.push(size);
        }
        if portal.page_size_link {
            let mut link = Node::new("a");
            link.selectors = vec![page_size_link_xpath(50)];
            link.text = "50".to_string();
            page.push(link);
        }
        if !show {
            return Ok(());
        }

        if portal.results_table {
            let mut header = Node::new("tr");
            for title in ["FIR No", "Date", "Police Station", "Section"] {
                let th = page.push(Node {
                    text: title.to_string(),
                    ..Node::new("th")
                });
                header.children.push(th);
            }
            let mut table_children = vec![page.push(header)];

            for cells in &portal.rows {
                let mut tr = Node::new("tr");
                for cell in cells {
                    let td = page.push(Node {
                        text: cell.clone(),
                        ..Node::new("td")
                    });
                    tr.children.push(td);
                }
                table_children.push(page.push(tr));
            }

            page.push(Node {
                children: table_children,
                ..Node::with_id("table", ids::RESULTS_TABLE)
            });
        }

        for download in &portal.downloads {
            page.push(Node {
                selectors: download.selectors.clone(),
                action: NodeAction::Download(download.tab),
                ..Node::with_id("a", &download.id)
            });
        }
        Ok(())
    }

    fn open_tab(&mut self, spec: TabSpec) -> String {
        self.tabs_created += 1;
        let handle = format!("tab-{}", self.tabs_created);
        let generation = self.next_generation();
        let mut page = Page {
            url: format!("https://portal.test/ViewFIR.aspx?id={}", self.tabs_created),
            generation,
            broken: spec.broken,
            ..Default::default()
        };
        if spec.has_pdf {
            let mut embed = Node::new("embed");
            embed.selectors = vec![PDF_CONTENT_SELECTOR.to_string()];
            page.push(embed);
        }
        self.windows.push(Window {
            handle: handle.clone(),
            page,
        });
        handle
    }

    /// Resolve a handle, failing the way a real page does once it re-rendered.
    fn node(&mut self, element: &FakeElement) -> Result<Node, BrowserError> {
        let window = self
            .windows
            .iter()
            .find(|w| w.handle == element.window)
            .ok_or_else(|| BrowserError::StaleReference("window closed".to_string()))?;
        if window.page.generation != element.generation {
            return Err(BrowserError::StaleReference(format!(
                "node {} belongs to an old render",
                element.index
            )));
        }
        let node = window.page.nodes[element.index].clone();
        if let Some(id) = node.id.as_deref() {
            if let Some(left) = self.stale_budget.get_mut(id) {
                if *left > 0 {
                    *left -= 1;
                    return Err(BrowserError::StaleReference(id.to_string()));
                }
            }
        }
        Ok(node)
    }

    fn rerender(&mut self, window: &str) -> Result<(), BrowserError> {
        let generation = self.next_generation();
        self.window_mut(window)?.page.generation = generation;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FakeElement {
    window: String,
    generation: u64,
    index: usize,
}

/// Scripted browser session over [`Portal`].
pub struct FakeBrowser {
    state: Mutex<State>,
}

impl FakeBrowser {
    pub fn new(portal: Portal) -> Self {
        Self {
            state: Mutex::new(State {
                portal,
                windows: vec![Window {
                    handle: MAIN_WINDOW.to_string(),
                    page: Page {
                        url: "about:blank".to_string(),
                        ..Default::default()
                    },
                }],
                current: Some(MAIN_WINDOW.to_string()),
                loads: 0,
                tabs_created: 0,
                generations: 0,
                stale_budget: HashMap::new(),
                actions: Vec::new(),
            }),
        }
    }

    /// The next `times` uses of element `id` report a stale reference.
    pub fn make_stale(&self, id: &str, times: usize) {
        self.state
            .lock()
            .unwrap()
            .stale_budget
            .insert(id.to_string(), times);
    }

    pub fn actions(&self) -> Vec<Action> {
        self.state.lock().unwrap().actions.clone()
    }

    pub fn navigations(&self) -> usize {
        self.actions()
            .iter()
            .filter(|a| matches!(a, Action::Navigate(_)))
            .count()
    }

    pub fn reloads(&self) -> usize {
        self.actions()
            .iter()
            .filter(|a| matches!(a, Action::Reload))
            .count()
    }

    /// Labels selected in `control`, in order.
    pub fn selections(&self, control: &str) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                Action::Select { control: c, label } if c == control => Some(label),
                _ => None,
            })
            .collect()
    }

    pub fn open_windows(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .windows
            .iter()
            .map(|w| w.handle.clone())
            .collect()
    }

    pub fn active_window(&self) -> Option<String> {
        self.state.lock().unwrap().current.clone()
    }

    fn record(&self, action: Action) {
        self.state.lock().unwrap().actions.push(action);
    }
}

/// Load the portal and submit the search, leaving the results page showing.
pub async fn open_results(browser: &mut FakeBrowser) {
    browser.navigate(PORTAL_URL).await.unwrap();
    let search = browser
        .find_element(&Locator::id(ids::SEARCH_BUTTON))
        .await
        .unwrap();
    browser.click(&search).await.unwrap();
}

/// No delays, single-probe waits.
pub fn timings() -> Timings {
    Timings::immediate()
}

#[async_trait]
impl Browser for FakeBrowser {
    type Element = FakeElement;

    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        let mut state = self.state.lock().unwrap();
        state.actions.push(Action::Navigate(url.to_string()));
        state.load_portal(url)
    }

    async fn reload(&mut self) -> Result<(), BrowserError> {
        let mut state = self.state.lock().unwrap();
        state.actions.push(Action::Reload);
        let url = state.current_page()?.url.clone();
        state.load_portal(&url)
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok(self.state.lock().unwrap().current_page()?.url.clone())
    }

    async fn find_element(&self, locator: &Locator) -> Result<FakeElement, BrowserError> {
        self.find_elements(locator)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BrowserError::ElementNotFound(locator.clone()))
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<FakeElement>, BrowserError> {
        let mut state = self.state.lock().unwrap();
        if let Locator::Css(selector) = locator {
            if state.portal.failing_selectors.contains(selector) {
                return Err(BrowserError::Protocol(format!(
                    "DOM.querySelectorAll failed for {}",
                    selector
                )));
            }
        }
        let window = state.current_handle()?;
        let page = state.current_page()?;
        if page.broken {
            return Err(BrowserError::Protocol("Target crashed".to_string()));
        }
        let generation = page.generation;
        Ok(page
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.matches(locator))
            .map(|(index, _)| FakeElement {
                window: window.clone(),
                generation,
                index,
            })
            .collect())
    }

    async fn find_children(
        &self,
        parent: &FakeElement,
        locator: &Locator,
    ) -> Result<Vec<FakeElement>, BrowserError> {
        let mut state = self.state.lock().unwrap();
        let node = state.node(parent)?;
        let page = &state.window_mut(&parent.window)?.page;
        Ok(node
            .children
            .iter()
            .filter(|&&i| page.nodes[i].matches(locator))
            .map(|&index| FakeElement {
                window: parent.window.clone(),
                generation: parent.generation,
                index,
            })
            .collect())
    }

    async fn is_clickable(&self, element: &FakeElement) -> Result<bool, BrowserError> {
        Ok(self.state.lock().unwrap().node(element)?.clickable)
    }

    async fn click(&self, element: &FakeElement) -> Result<(), BrowserError> {
        let mut state = self.state.lock().unwrap();
        let node = state.node(element)?;
        state.actions.push(Action::Click(node.name()));
        match node.action {
            NodeAction::Search => state.show_results(),
            NodeAction::Download(Some(tab)) => {
                state.open_tab(tab);
                Ok(())
            }
            // Grid buttons post back and the page renders again
            NodeAction::Download(None) => state.rerender(&element.window),
            NodeAction::None => Ok(()),
        }
    }

    async fn clear(&self, element: &FakeElement) -> Result<(), BrowserError> {
        let mut state = self.state.lock().unwrap();
        let node = state.node(element)?;
        state.actions.push(Action::Clear(node.name()));
        Ok(())
    }

    async fn type_text(&self, element: &FakeElement, text: &str) -> Result<(), BrowserError> {
        let mut state = self.state.lock().unwrap();
        let node = state.node(element)?;
        state.actions.push(Action::Type {
            control: node.name(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn text(&self, element: &FakeElement) -> Result<String, BrowserError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .node(element)?
            .text
            .trim()
            .to_string())
    }

    async fn select_options(&self, element: &FakeElement) -> Result<Vec<SelectOption>, BrowserError> {
        Ok(self.state.lock().unwrap().node(element)?.options)
    }

    async fn select_by_label(&self, element: &FakeElement, label: &str) -> Result<(), BrowserError> {
        let mut state = self.state.lock().unwrap();
        let node = state.node(element)?;
        let control = node.name();
        if !node.options.iter().any(|o| o.label == label) {
            return Err(BrowserError::NoMatchingOption {
                control,
                label: label.to_string(),
            });
        }
        state.actions.push(Action::Select {
            control: control.clone(),
            label: label.to_string(),
        });

        if control == ids::DISTRICT {
            let stations = state
                .portal
                .stations
                .get(label)
                .cloned()
                .unwrap_or_else(|| vec![placeholder()]);
            let page = &mut state.window_mut(&element.window)?.page;
            if let Some(i) = page.position(ids::POLICE_STATION) {
                page.nodes[i].options = stations;
            }
        }
        state.rerender(&element.window)
    }

    async fn select_by_value(&self, element: &FakeElement, value: &str) -> Result<(), BrowserError> {
        let mut state = self.state.lock().unwrap();
        let node = state.node(element)?;
        let control = node.name();
        if !node.options.iter().any(|o| o.value == value) {
            return Err(BrowserError::NoMatchingOption {
                control,
                label: value.to_string(),
            });
        }
        state.actions.push(Action::SelectValue {
            control,
            value: value.to_string(),
        });
        state.rerender(&element.window)
    }

    async fn window_handles(&self) -> Result<Vec<WindowHandle>, BrowserError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .windows
            .iter()
            .map(|w| WindowHandle(w.handle.clone()))
            .collect())
    }

    async fn current_window(&self) -> Result<WindowHandle, BrowserError> {
        Ok(WindowHandle(self.state.lock().unwrap().current_handle()?))
    }

    async fn switch_to_window(&mut self, handle: &WindowHandle) -> Result<(), BrowserError> {
        let mut state = self.state.lock().unwrap();
        state.window_mut(&handle.0)?;
        state.actions.push(Action::SwitchTo(handle.0.clone()));
        state.current = Some(handle.0.clone());
        Ok(())
    }

    async fn close_window(&mut self) -> Result<(), BrowserError> {
        let mut state = self.state.lock().unwrap();
        let handle = state.current_handle()?;
        state.windows.retain(|w| w.handle != handle);
        state.actions.push(Action::CloseWindow(handle));
        state.current = None;
        Ok(())
    }
}
