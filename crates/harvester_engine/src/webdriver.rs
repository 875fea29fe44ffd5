//! [`PageSession`] backed by a WebDriver server (chromedriver).

use std::time::Duration;

use engine_logging::{engine_info, engine_trace};
use harvester_core::PageLayout;
use serde_json::Value;
use thirtyfour::error::WebDriverErrorInner;
use thirtyfour::extensions::query::ElementQuery;
use thirtyfour::prelude::*;
use thirtyfour::ChromiumLikeCapabilities;

use crate::session::{Locator, PageSession, SessionError};

const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const CLICK_SCRIPT: &str = "arguments[0].click();";
const SELECTED_VALUE_SCRIPT: &str = "return arguments[0].value;";
const SELECT_VALUE_SCRIPT: &str = r#"
const select = arguments[0];
const value = arguments[1];
if (!Array.from(select.options).some((option) => option.value === value)) {
    return false;
}
select.value = value;
select.dispatchEvent(new Event('change', { bubbles: true }));
return true;
"#;
const ROW_CELLS_SCRIPT: &str = r#"
return Array.from(arguments[0].querySelectorAll(':scope > td')).map((cell) => {
    const span = cell.querySelector('span');
    return span ? span.innerText.trim() : '';
});
"#;

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// A chromedriver (or compatible) server that is already running.
    pub webdriver_url: String,
    /// Hide the browser window.
    pub headless: bool,
    pub user_agent: String,
    /// Delay between two polls of the same wait.
    pub poll_interval: Duration,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: false,
            user_agent: DESKTOP_USER_AGENT.to_string(),
            poll_interval: Duration::from_millis(100),
        }
    }
}

fn driver_error(err: impl std::fmt::Display) -> SessionError {
    SessionError::Driver(err.to_string())
}

/// A query that ran out of time is a timeout; anything else is the browser failing.
fn query_error(locator: &Locator, err: WebDriverError) -> SessionError {
    match &*err {
        WebDriverErrorInner::NoSuchElement(_) => SessionError::timeout(locator),
        _ => driver_error(err),
    }
}

pub struct WebDriverSession {
    driver: WebDriver,
    layout: PageLayout,
    poll_interval: Duration,
}

impl WebDriverSession {
    /// Start a Chrome session on the WebDriver server in `settings`.
    pub async fn connect(
        settings: &BrowserSettings,
        layout: PageLayout,
    ) -> Result<Self, SessionError> {
        let mut caps = DesiredCapabilities::chrome();
        if settings.headless {
            caps.add_arg("--headless").map_err(driver_error)?;
        }
        for arg in [
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--start-maximized",
        ] {
            caps.add_arg(arg).map_err(driver_error)?;
        }
        caps.add_arg(&format!("user-agent={}", settings.user_agent))
            .map_err(driver_error)?;

        let driver = WebDriver::new(settings.webdriver_url.as_str(), caps)
            .await
            .map_err(driver_error)?;
        engine_info!(
            "Browser session started webdriver={} headless={}",
            settings.webdriver_url,
            settings.headless
        );
        Ok(Self {
            driver,
            layout,
            poll_interval: settings.poll_interval,
        })
    }

    /// A query for `locator` that polls until `timeout` runs out.
    fn query(&self, locator: &Locator, timeout: Duration) -> ElementQuery {
        let xpath = locator.to_xpath(&self.layout);
        engine_trace!("Querying {} xpath={}", locator, xpath);
        self.driver
            .query(By::XPath(xpath))
            .desc(&locator.to_string())
            .wait(timeout, self.poll_interval)
    }

    async fn script(&self, script: &str, args: Vec<Value>) -> Result<Value, SessionError> {
        let ret = self
            .driver
            .execute(script, args)
            .await
            .map_err(driver_error)?;
        Ok(ret.json().clone())
    }
}

#[async_trait::async_trait]
impl PageSession for WebDriverSession {
    type Element = WebElement;

    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        self.driver.goto(url).await.map_err(driver_error)
    }

    async fn find_one(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<WebElement, SessionError> {
        let mut found = self.find_all(locator, timeout).await?;
        Ok(found.swap_remove(0))
    }

    async fn find_all(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Vec<WebElement>, SessionError> {
        self.query(locator, timeout)
            .all_from_selector_required()
            .await
            .map_err(|err| query_error(locator, err))
    }

    async fn wait_for_clickable(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<WebElement, SessionError> {
        // A link replaced mid-check is simply not clickable yet.
        self.query(locator, timeout)
            .ignore_errors(true)
            .and_clickable()
            .first()
            .await
            .map_err(|err| query_error(locator, err))
    }

    async fn click(&self, element: &WebElement) -> Result<(), SessionError> {
        let target = element.to_json().map_err(driver_error)?;
        self.script(CLICK_SCRIPT, vec![target]).await.map(|_| ())
    }

    async fn wait_for_staleness(&self, element: &WebElement, timeout: Duration) -> bool {
        element
            .wait_until()
            .wait(timeout, self.poll_interval)
            .stale()
            .await
            .is_ok()
    }

    async fn read_text(&self, element: &WebElement) -> Result<String, SessionError> {
        element.text().await.map_err(driver_error)
    }

    async fn read_attribute(
        &self,
        element: &WebElement,
        name: &str,
    ) -> Result<Option<String>, SessionError> {
        element.attr(name).await.map_err(driver_error)
    }

    async fn read_cells(&self, row: &WebElement) -> Result<Vec<String>, SessionError> {
        let target = row.to_json().map_err(driver_error)?;
        let cells = self.script(ROW_CELLS_SCRIPT, vec![target]).await?;
        serde_json::from_value(cells).map_err(driver_error)
    }

    async fn selected_value(&self, select: &WebElement) -> Result<Option<String>, SessionError> {
        let target = select.to_json().map_err(driver_error)?;
        let value = self.script(SELECTED_VALUE_SCRIPT, vec![target]).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn select_value(&self, select: &WebElement, value: &str) -> Result<(), SessionError> {
        let target = select.to_json().map_err(driver_error)?;
        let selected = self
            .script(SELECT_VALUE_SCRIPT, vec![target, Value::from(value)])
            .await?;
        if selected.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(SessionError::Driver(format!("no option with value {value:?}")))
        }
    }

    async fn close(&self) -> Result<(), SessionError> {
        self.driver.clone().quit().await.map_err(driver_error)
    }
}
