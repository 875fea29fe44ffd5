//! In-memory stand-in for the listing site.
//!
//! [`SimSession`] behaves like an ASP.NET grid with a numeric pager: a window
//! of page numbers, `...` links on either side of it, postbacks that replace
//! every element on the page, and a page-size drop-down that re-paginates the
//! rows. Faults can be injected to reproduce the ways the real site misbehaves.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use harvester_core::PageLayout;

use crate::session::{Locator, PageSession, SessionError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimRow {
    pub class: Option<String>,
    pub cells: Vec<String>,
}

impl SimRow {
    pub fn new<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            class: None,
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }
}

/// Misbehaviour to inject into a [`SimSession`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimFaults {
    /// This many pager clicks are accepted but trigger no postback.
    pub swallowed_clicks: u32,
    /// The next forward `...` click lands on this page instead of the one
    /// after the visible window.
    pub ellipsis_landing: Option<u32>,
    /// Pages on which the data table never renders.
    pub tableless_pages: Vec<u32>,
    /// The page-size control accepts a selection but never posts back.
    pub frozen_page_size: bool,
    /// The page has no page-size control at all.
    pub hidden_page_size: bool,
    /// The browser goes away as soon as a pager click lands on this page.
    pub disconnect_on_page: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct SimSite {
    layout: PageLayout,
    rows: Vec<SimRow>,
    page_size: u32,
    page_size_options: Vec<u32>,
    pager_window: u32,
    faults: SimFaults,
}

impl SimSite {
    pub fn new(rows: Vec<SimRow>) -> Self {
        Self {
            layout: PageLayout::default(),
            rows,
            page_size: 10,
            page_size_options: vec![10, 20, 50, 100, 500],
            pager_window: 10,
            faults: SimFaults::default(),
        }
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size_options(mut self, options: Vec<u32>) -> Self {
        self.page_size_options = options;
        self
    }

    /// How many page numbers the pager shows at once.
    pub fn pager_window(mut self, window: u32) -> Self {
        self.pager_window = window.max(1);
        self
    }

    pub fn layout(mut self, layout: PageLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn faults(mut self, faults: SimFaults) -> Self {
        self.faults = faults;
        self
    }

    pub fn rows(&self) -> &[SimRow] {
        &self.rows
    }

    pub fn total_pages(&self) -> u32 {
        let size = self.page_size as usize;
        let pages = self.rows.len().div_ceil(size).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PagerLink {
    label: String,
    target: u32,
    forward_ellipsis: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SimNode {
    Table,
    Row(usize),
    Link(PagerLink),
    ActivePage,
    PageSizeSelect,
}

/// Handle to an element of one rendering; stale once the page posts back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimElement {
    generation: u64,
    node: SimNode,
}

#[derive(Debug)]
struct SimState {
    site: SimSite,
    page: u32,
    generation: u64,
    loaded: bool,
    closed: bool,
    navigations: Vec<String>,
    lookups: Vec<Locator>,
    clicks: Vec<String>,
}

impl SimState {
    fn element(&self, node: SimNode) -> SimElement {
        SimElement {
            generation: self.generation,
            node,
        }
    }

    fn ensure_live(&self, element: &SimElement) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::Driver("session closed".to_string()));
        }
        if element.generation != self.generation {
            return Err(SessionError::Stale);
        }
        Ok(())
    }

    fn table_rendered(&self) -> bool {
        !self.site.faults.tableless_pages.contains(&self.page)
    }

    fn pager_links(&self) -> Vec<PagerLink> {
        let total = self.site.total_pages();
        if total <= 1 {
            return Vec::new();
        }
        let window = self.site.pager_window;
        let start = (self.page - 1) / window * window + 1;
        let end = (start + window - 1).min(total);
        let ellipsis = &self.site.layout.ellipsis_label;

        let mut links = Vec::new();
        if start > 1 {
            links.push(PagerLink {
                label: ellipsis.clone(),
                target: start - 1,
                forward_ellipsis: false,
            });
        }
        for page in (start..=end).filter(|&page| page != self.page) {
            links.push(PagerLink {
                label: page.to_string(),
                target: page,
                forward_ellipsis: false,
            });
        }
        if end < total {
            links.push(PagerLink {
                label: ellipsis.clone(),
                target: end + 1,
                forward_ellipsis: true,
            });
        }
        links
    }

    fn pager_row(&self) -> Option<SimRow> {
        if self.site.total_pages() <= 1 {
            return None;
        }
        let window = self.site.pager_window;
        let start = (self.page - 1) / window * window + 1;
        let end = (start + window - 1).min(self.site.total_pages());
        let ellipsis = &self.site.layout.ellipsis_label;

        let mut cells = Vec::new();
        if start > 1 {
            cells.push(ellipsis.clone());
        }
        cells.extend((start..=end).map(|page| page.to_string()));
        if end < self.site.total_pages() {
            cells.push(ellipsis.clone());
        }
        Some(SimRow {
            class: Some(self.site.layout.pager_class.clone()),
            cells,
        })
    }

    /// Table rows as rendered: pager on top and bottom around the data rows.
    fn rendered_rows(&self) -> Vec<SimRow> {
        let size = self.site.page_size as usize;
        let start = (self.page as usize - 1) * size;
        let data = self.site.rows.iter().skip(start).take(size).cloned();

        let pager = self.pager_row();
        pager
            .clone()
            .into_iter()
            .chain(data)
            .chain(pager)
            .collect()
    }

    fn resolve(&self, locator: &Locator) -> Vec<SimNode> {
        let layout = &self.site.layout;
        match locator {
            Locator::Id(id) if *id == layout.table_id => {
                if self.table_rendered() {
                    vec![SimNode::Table]
                } else {
                    Vec::new()
                }
            }
            Locator::Id(id) if *id == layout.page_size_id => {
                if self.site.faults.hidden_page_size {
                    Vec::new()
                } else {
                    vec![SimNode::PageSizeSelect]
                }
            }
            Locator::Id(_) => Vec::new(),
            Locator::TableRows => {
                if self.table_rendered() {
                    (0..self.rendered_rows().len()).map(SimNode::Row).collect()
                } else {
                    Vec::new()
                }
            }
            Locator::PagerLink(label) => self
                .pager_links()
                .into_iter()
                .find(|link| link.label == *label)
                .map(SimNode::Link)
                .into_iter()
                .collect(),
            Locator::ForwardPagerLink(label) => self
                .pager_links()
                .into_iter()
                .find(|link| link.label == *label && link.target > self.page)
                .map(SimNode::Link)
                .into_iter()
                .collect(),
            Locator::ActivePage => {
                if self.site.total_pages() > 1 {
                    vec![SimNode::ActivePage]
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn lookup(&mut self, locator: &Locator) -> Result<Vec<SimElement>, SessionError> {
        if self.closed {
            return Err(SessionError::Driver("session closed".to_string()));
        }
        if !self.loaded {
            return Err(SessionError::NotNavigated);
        }
        self.lookups.push(locator.clone());
        let nodes = self.resolve(locator);
        if nodes.is_empty() {
            return Err(SessionError::timeout(locator));
        }
        Ok(nodes.into_iter().map(|node| self.element(node)).collect())
    }

    fn postback(&mut self, page: u32) {
        self.page = page.clamp(1, self.site.total_pages());
        self.generation += 1;
    }
}

/// A [`PageSession`] over a [`SimSite`]. Waits resolve immediately: an element
/// that is not there now is reported as a timeout.
#[derive(Debug)]
pub struct SimSession {
    state: Mutex<SimState>,
}

impl SimSession {
    pub fn new(site: SimSite) -> Self {
        Self {
            state: Mutex::new(SimState {
                site,
                page: 1,
                generation: 0,
                loaded: false,
                closed: false,
                navigations: Vec::new(),
                lookups: Vec::new(),
                clicks: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current_page(&self) -> u32 {
        self.state().page
    }

    pub fn page_size(&self) -> u32 {
        self.state().site.page_size
    }

    pub fn total_pages(&self) -> u32 {
        self.state().site.total_pages()
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state().navigations.clone()
    }

    /// Every locator queried so far, in order.
    pub fn lookups(&self) -> Vec<Locator> {
        self.state().lookups.clone()
    }

    /// Labels of every pager link clicked so far, swallowed clicks included.
    pub fn clicks(&self) -> Vec<String> {
        self.state().clicks.clone()
    }
}

#[async_trait::async_trait]
impl PageSession for SimSession {
    type Element = SimElement;

    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        let mut state = self.state();
        if state.closed {
            return Err(SessionError::Driver("session closed".to_string()));
        }
        state.navigations.push(url.to_string());
        state.loaded = true;
        state.postback(1);
        Ok(())
    }

    async fn find_one(
        &self,
        locator: &Locator,
        _timeout: Duration,
    ) -> Result<SimElement, SessionError> {
        let mut found = self.state().lookup(locator)?;
        Ok(found.swap_remove(0))
    }

    async fn find_all(
        &self,
        locator: &Locator,
        _timeout: Duration,
    ) -> Result<Vec<SimElement>, SessionError> {
        self.state().lookup(locator)
    }

    async fn wait_for_clickable(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<SimElement, SessionError> {
        self.find_one(locator, timeout).await
    }

    async fn click(&self, element: &SimElement) -> Result<(), SessionError> {
        let mut state = self.state();
        state.ensure_live(element)?;
        let SimNode::Link(link) = &element.node else {
            return Ok(());
        };
        state.clicks.push(link.label.clone());

        if state.site.faults.swallowed_clicks > 0 {
            state.site.faults.swallowed_clicks -= 1;
            return Ok(());
        }
        let landing = if link.forward_ellipsis {
            state.site.faults.ellipsis_landing.take()
        } else {
            None
        };
        state.postback(landing.unwrap_or(link.target));
        if state.site.faults.disconnect_on_page == Some(state.page) {
            state.closed = true;
        }
        Ok(())
    }

    async fn wait_for_staleness(&self, element: &SimElement, _timeout: Duration) -> bool {
        element.generation != self.state().generation
    }

    async fn read_text(&self, element: &SimElement) -> Result<String, SessionError> {
        let state = self.state();
        state.ensure_live(element)?;
        let text = match &element.node {
            SimNode::Table => state
                .rendered_rows()
                .iter()
                .map(|row| row.cells.join(" "))
                .collect::<Vec<_>>()
                .join("\n"),
            SimNode::Row(idx) => state
                .rendered_rows()
                .get(*idx)
                .map(|row| row.cells.join(" "))
                .unwrap_or_default(),
            SimNode::Link(link) => link.label.clone(),
            SimNode::ActivePage => state.page.to_string(),
            SimNode::PageSizeSelect => state.site.page_size.to_string(),
        };
        Ok(text)
    }

    async fn read_attribute(
        &self,
        element: &SimElement,
        name: &str,
    ) -> Result<Option<String>, SessionError> {
        let state = self.state();
        state.ensure_live(element)?;
        let value = match (&element.node, name) {
            (SimNode::Row(idx), "class") => state
                .rendered_rows()
                .get(*idx)
                .and_then(|row| row.class.clone()),
            (SimNode::Table, "id") => Some(state.site.layout.table_id.clone()),
            (SimNode::PageSizeSelect, "id") => Some(state.site.layout.page_size_id.clone()),
            _ => None,
        };
        Ok(value)
    }

    async fn read_cells(&self, row: &SimElement) -> Result<Vec<String>, SessionError> {
        let state = self.state();
        state.ensure_live(row)?;
        match &row.node {
            SimNode::Row(idx) => state
                .rendered_rows()
                .get(*idx)
                .map(|row| row.cells.clone())
                .ok_or(SessionError::Stale),
            other => Err(SessionError::Driver(format!("{other:?} is not a table row"))),
        }
    }

    async fn selected_value(&self, select: &SimElement) -> Result<Option<String>, SessionError> {
        let state = self.state();
        state.ensure_live(select)?;
        match select.node {
            SimNode::PageSizeSelect => Ok(Some(state.site.page_size.to_string())),
            _ => Ok(None),
        }
    }

    async fn select_value(&self, select: &SimElement, value: &str) -> Result<(), SessionError> {
        let mut state = self.state();
        state.ensure_live(select)?;
        if select.node != SimNode::PageSizeSelect {
            return Err(SessionError::Driver("not a select element".to_string()));
        }
        let size = value
            .parse::<u32>()
            .ok()
            .filter(|size| state.site.page_size_options.contains(size))
            .ok_or_else(|| SessionError::Driver(format!("no option with value {value:?}")))?;

        if state.site.faults.frozen_page_size || size == state.site.page_size {
            return Ok(());
        }
        state.site.page_size = size;
        state.postback(1);
        Ok(())
    }

    async fn close(&self) -> Result<(), SessionError> {
        self.state().closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(rows: usize) -> SimSite {
        let rows = (0..rows)
            .map(|idx| SimRow::new([format!("row {idx}")]))
            .collect();
        SimSite::new(rows)
    }

    fn labels(state: &SimState) -> Vec<String> {
        state
            .pager_links()
            .into_iter()
            .map(|link| link.label)
            .collect()
    }

    #[test]
    fn pager_shows_window_and_ellipses() {
        let session = SimSession::new(site(120).page_size(10).pager_window(5));
        let mut state = session.state();
        state.loaded = true;
        assert_eq!(labels(&state), ["2", "3", "4", "5", "..."]);

        state.postback(7);
        assert_eq!(labels(&state), ["...", "6", "8", "9", "10", "..."]);

        state.postback(12);
        assert_eq!(labels(&state), ["...", "11"]);
    }

    #[test]
    fn only_the_ellipsis_after_the_active_page_leads_forward() {
        let session = SimSession::new(site(120).page_size(10).pager_window(5));
        let mut state = session.state();
        state.loaded = true;
        let forward = Locator::ForwardPagerLink("...".into());

        state.postback(7);
        let found = state.lookup(&forward).unwrap();
        assert!(matches!(&found[0].node, SimNode::Link(link) if link.target == 11));

        state.postback(12);
        assert!(state.lookup(&forward).unwrap_err().is_timeout());
        assert!(state.lookup(&Locator::PagerLink("...".into())).is_ok());
    }

    #[test]
    fn single_page_has_no_pager() {
        let session = SimSession::new(site(4));
        let mut state = session.state();
        state.loaded = true;
        assert!(state.pager_links().is_empty());
        assert_eq!(state.rendered_rows().len(), 4);
        assert!(state.lookup(&Locator::ActivePage).is_err());
    }

    #[test]
    fn rendered_rows_are_framed_by_pager_rows() {
        let session = SimSession::new(site(25).page_size(10));
        let mut state = session.state();
        state.postback(3);
        let rows = state.rendered_rows();
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0].class.as_deref(), Some("pager"));
        assert_eq!(rows[1].cells, ["row 20"]);
        assert_eq!(rows[6].class.as_deref(), Some("pager"));
    }

    #[test]
    fn lookups_before_navigation_fail() {
        let session = SimSession::new(site(3));
        let err = session.state().lookup(&Locator::TableRows).unwrap_err();
        assert_eq!(err, SessionError::NotNavigated);
    }
}
