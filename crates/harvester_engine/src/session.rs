use std::fmt;
use std::time::Duration;

use harvester_core::PageLayout;

/// What to look for on the listing page. Adapters decide how to express it
/// (the WebDriver adapter renders XPath against a [`PageLayout`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Element by its `id` attribute.
    Id(String),
    /// Rows of the data table, pager rows included.
    TableRows,
    /// First postback link in the pager with exactly this text.
    PagerLink(String),
    /// Postback link with exactly this text that comes after the active page
    /// marker, so a `...` pointing back to earlier pages never matches.
    ForwardPagerLink(String),
    /// The non-link marker of the page currently shown.
    ActivePage,
}

impl Locator {
    pub fn page_link(page: u32) -> Self {
        Locator::PagerLink(page.to_string())
    }

    pub fn to_xpath(&self, layout: &PageLayout) -> String {
        let pager = format!("//tr[@class='{}']", layout.pager_class);
        match self {
            Locator::Id(id) => format!("//*[@id='{id}']"),
            Locator::TableRows => format!("//table[@id='{}']/tbody/tr", layout.table_id),
            Locator::PagerLink(label) => format!(
                "{pager}//a[contains(@href, '{}') and text()='{label}']",
                layout.postback_marker
            ),
            Locator::ForwardPagerLink(label) => format!(
                "{pager}//span/ancestor::td[1]/following-sibling::td\
                 //a[contains(@href, '{}') and text()='{label}']",
                layout.postback_marker
            ),
            Locator::ActivePage => format!("{pager}//span"),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "#{id}"),
            Locator::TableRows => f.write_str("table rows"),
            Locator::PagerLink(label) => write!(f, "pager link '{label}'"),
            Locator::ForwardPagerLink(label) => write!(f, "forward pager link '{label}'"),
            Locator::ActivePage => f.write_str("active page marker"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("timed out waiting for {what}")]
    Timeout { what: String },
    #[error("element reference is stale")]
    Stale,
    #[error("no page has been loaded yet")]
    NotNavigated,
    #[error("driver error: {0}")]
    Driver(String),
}

impl SessionError {
    pub(crate) fn timeout(locator: &Locator) -> Self {
        SessionError::Timeout {
            what: locator.to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, SessionError::Timeout { .. })
    }
}

/// The browser as seen by the harvester: one page, queried and clicked.
///
/// Every wait is bounded by the timeout passed in and fails with
/// [`SessionError::Timeout`]; implementations never retry on their own.
#[async_trait::async_trait]
pub trait PageSession: Send + Sync {
    type Element: Clone + Send + Sync;

    async fn navigate(&self, url: &str) -> Result<(), SessionError>;

    /// First element matching `locator`, waiting up to `timeout` for it to appear.
    async fn find_one(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Self::Element, SessionError>;

    /// All matching elements once at least one is present.
    async fn find_all(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Vec<Self::Element>, SessionError>;

    async fn wait_for_presence(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Self::Element, SessionError> {
        self.find_one(locator, timeout).await
    }

    /// First matching element that is displayed and enabled.
    async fn wait_for_clickable(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Self::Element, SessionError>;

    /// Clicks through script, so occluded or off-screen controls still fire.
    async fn click(&self, element: &Self::Element) -> Result<(), SessionError>;

    /// `true` once `element` has been detached by a page refresh.
    async fn wait_for_staleness(&self, element: &Self::Element, timeout: Duration) -> bool;

    async fn read_text(&self, element: &Self::Element) -> Result<String, SessionError>;

    async fn read_attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, SessionError>;

    /// Text of each cell in a table row. A cell without a `span` reads as empty.
    async fn read_cells(&self, row: &Self::Element) -> Result<Vec<String>, SessionError>;

    async fn selected_value(&self, select: &Self::Element)
        -> Result<Option<String>, SessionError>;

    /// Selects the option with `value`, firing the control's change handler.
    async fn select_value(&self, select: &Self::Element, value: &str) -> Result<(), SessionError>;

    async fn close(&self) -> Result<(), SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pager_links_render_as_postback_xpath() {
        let layout = PageLayout::default();
        assert_eq!(
            Locator::page_link(4).to_xpath(&layout),
            "//tr[@class='pager']//a[contains(@href, '__doPostBack') and text()='4']"
        );
        assert_eq!(
            Locator::ForwardPagerLink("...".into()).to_xpath(&layout),
            "//tr[@class='pager']//span/ancestor::td[1]/following-sibling::td\
             //a[contains(@href, '__doPostBack') and text()='...']"
        );
        assert_eq!(
            Locator::TableRows.to_xpath(&layout),
            "//table[@id='ctl00_SheetContentPlaceHolder_ctl00_ctl01_GridView1']/tbody/tr"
        );
    }
}
