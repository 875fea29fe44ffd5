use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use engine_logging::{engine_info, engine_warn};
use harvester_core::{
    Advance, ConfigError, HarvestConfig, HarvestReport, PageSizeOutcome, RowStats, StopReason,
};

use crate::extract::PageExtractor;
use crate::navigator::{read_active_page, Navigator};
use crate::page_size::{PageSizeError, PageSizeNegotiator};
use crate::session::{Locator, PageSession, SessionError};

/// Asks a running harvest to stop after the page it is working on.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.requested.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Relaxed)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("could not open {url}: {source}")]
    Navigate {
        url: String,
        #[source]
        source: SessionError,
    },
}

/// Runs a whole harvest against one page session.
pub struct Harvester {
    config: HarvestConfig,
    stop: StopHandle,
}

impl Harvester {
    pub fn new(config: HarvestConfig) -> Result<Self, HarvestError> {
        config.validate()?;
        Ok(Self {
            config,
            stop: StopHandle::new(),
        })
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Handle that can stop this harvest from another task.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Harvest every reachable page, then close the session.
    ///
    /// Ending because the pages ran out, the cap was hit, the table vanished
    /// or navigation broke down is not an error: the report carries the
    /// reason and every record gathered until then.
    pub async fn run<S: PageSession>(&self, session: &S) -> Result<HarvestReport, HarvestError> {
        let outcome = self.harvest(session).await;
        match session.close().await {
            Ok(()) => engine_info!("Browser session closed"),
            Err(err) => engine_warn!("Closing browser session failed: {}", err),
        }
        outcome
    }

    async fn harvest<S: PageSession>(&self, session: &S) -> Result<HarvestReport, HarvestError> {
        let config = &self.config;
        let layout = &config.layout;

        engine_info!("Navigating to {}", config.base_url);
        session
            .navigate(&config.base_url)
            .await
            .map_err(|source| HarvestError::Navigate {
                url: config.base_url.clone(),
                source,
            })?;

        let table = Locator::Id(layout.table_id.clone());
        match session.wait_for_presence(&table, config.timeout).await {
            Ok(_) => engine_info!("Initial table loaded"),
            Err(err) => engine_warn!("Initial table not loaded: {}", err),
        }

        let negotiator = PageSizeNegotiator::new(layout.clone(), config.timeout);
        let page_size = match negotiator.negotiate(session, config.desired_page_size).await {
            Ok(outcome) => outcome,
            Err(err @ PageSizeError::Unconfirmed { .. }) => {
                engine_warn!("{}; continuing with the server's page size", err);
                PageSizeOutcome::Unconfirmed
            }
        };

        let start_page = match read_active_page(session, config.timeout).await {
            Some(page) => page,
            None => {
                engine_info!("Could not determine initial page number, starting from page 1");
                1
            }
        };
        engine_info!("Starting at page {} cap={}", start_page, config.max_pages);

        let extractor = PageExtractor::new(layout.clone(), config.timeout);
        let mut navigator = Navigator::new(session, layout.clone(), config.timeout, start_page)
            .with_settle_delay(config.settle_delay);

        let mut records = Vec::new();
        let mut rows = RowStats::default();
        let mut pages_scraped = 0u32;

        let stop_reason = loop {
            if self.stop.is_requested() {
                engine_info!("Stop requested, ending harvest");
                break StopReason::Cancelled;
            }
            if config.max_pages.reached(pages_scraped) {
                engine_info!("Reached maximum page limit of {}", config.max_pages);
                break StopReason::CapReached;
            }

            let page = navigator.current_page();
            engine_info!("Scraping page {}", page);
            let content = extractor.extract(session).await;
            if !content.table_found {
                break StopReason::NoTable;
            }
            pages_scraped += 1;
            engine_info!(
                "Found {} records on page {} (rejected rows={})",
                content.records.len(),
                page,
                content.stats.rejected()
            );
            records.extend(content.records);
            rows.merge(content.stats);

            if config.max_pages.reached(pages_scraped) {
                engine_info!("Reached maximum page limit of {}", config.max_pages);
                break StopReason::CapReached;
            }
            match navigator.advance().await {
                Advance::Advanced { .. } => {}
                Advance::Exhausted(reason) if reason.is_failure() => {
                    engine_warn!("Navigation failed: {}", reason);
                    break StopReason::NavigationFailure;
                }
                Advance::Exhausted(_) => break StopReason::Exhausted,
            }
        };

        engine_info!(
            "Harvest finished reason={} pages={} records={}",
            stop_reason,
            pages_scraped,
            records.len()
        );
        Ok(HarvestReport {
            records,
            pages_scraped,
            last_page: navigator.current_page(),
            stop_reason,
            page_size,
            rows,
        })
    }
}
