use std::time::Duration;

use url::Url;

use crate::pagination::PageCap;

pub const DEFAULT_BASE_URL: &str = "https://www.lunch-card.ch/public/LunchCheck/LC_Directory.aspx";
pub const DEFAULT_PAGE_SIZE: u32 = 500;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);
/// Click attempts per page transition before navigation is declared failed.
pub const MAX_ADVANCE_ATTEMPTS: u32 = 3;

/// Element identities of the listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLayout {
    pub table_id: String,
    pub page_size_id: String,
    /// Class carried by pager rows, both inside and around the grid.
    pub pager_class: String,
    /// Substring of the `href` of every postback link in the pager.
    pub postback_marker: String,
    pub ellipsis_label: String,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            table_id: "ctl00_SheetContentPlaceHolder_ctl00_ctl01_GridView1".to_string(),
            page_size_id: "ctl00_SheetContentPlaceHolder_ctl00_ctl01_ddlPageSize".to_string(),
            pager_class: "pager".to_string(),
            postback_marker: "__doPostBack".to_string(),
            ellipsis_label: "...".to_string(),
        }
    }
}

impl PageLayout {
    pub fn is_pager_class(&self, class: &str) -> bool {
        class.contains(self.pager_class.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestConfig {
    pub base_url: String,
    pub desired_page_size: u32,
    pub max_pages: PageCap,
    /// Bound applied to every individual wait.
    pub timeout: Duration,
    /// Pause after each confirmed page transition.
    pub settle_delay: Duration,
    pub layout: PageLayout,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            desired_page_size: DEFAULT_PAGE_SIZE,
            max_pages: PageCap::Unbounded,
            timeout: DEFAULT_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            layout: PageLayout::default(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base url {url:?}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("unsupported url scheme {0:?}")]
    UnsupportedScheme(String),
    #[error("desired page size must be positive")]
    ZeroPageSize,
    #[error("timeout must be positive")]
    ZeroTimeout,
    #[error("layout field {0} is empty")]
    EmptyLayoutField(&'static str),
}

impl HarvestConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.base_url).map_err(|err| ConfigError::InvalidUrl {
            url: self.base_url.clone(),
            message: err.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" | "file" => {}
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
        if self.desired_page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }

        let layout = &self.layout;
        for (field, value) in [
            ("table_id", &layout.table_id),
            ("page_size_id", &layout.page_size_id),
            ("pager_class", &layout.pager_class),
            ("ellipsis_label", &layout.ellipsis_label),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyLayoutField(field));
            }
        }
        Ok(())
    }
}
