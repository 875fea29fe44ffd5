use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use harvester_core::{PageLayout, PageSizeOutcome};

use crate::session::{Locator, PageSession, SessionError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageSizeError {
    #[error("page size change to {desired} unconfirmed: {reason}")]
    Unconfirmed { desired: u32, reason: String },
}

/// One-shot setup of the grid's rows-per-page drop-down.
#[derive(Debug, Clone)]
pub struct PageSizeNegotiator {
    layout: PageLayout,
    timeout: Duration,
}

impl PageSizeNegotiator {
    pub fn new(layout: PageLayout, timeout: Duration) -> Self {
        Self { layout, timeout }
    }

    /// Ask the server for `desired` rows per page.
    ///
    /// A missing control is not an error: the server default is used. An
    /// unconfirmed change is an error, but callers are expected to carry on
    /// with whatever size the server is actually serving.
    pub async fn negotiate<S: PageSession>(
        &self,
        session: &S,
        desired: u32,
    ) -> Result<PageSizeOutcome, PageSizeError> {
        let control = Locator::Id(self.layout.page_size_id.clone());
        let select = match session.find_one(&control, self.timeout).await {
            Ok(select) => select,
            Err(err) => {
                engine_warn!(
                    "Page size control {} not found, keeping default size: {}",
                    self.layout.page_size_id,
                    err
                );
                return Ok(PageSizeOutcome::Unavailable);
            }
        };

        let wanted = desired.to_string();
        let unconfirmed = |reason: String| PageSizeError::Unconfirmed { desired, reason };

        let current = session
            .selected_value(&select)
            .await
            .map_err(|err| unconfirmed(err.to_string()))?;
        if current.as_deref() == Some(wanted.as_str()) {
            engine_info!("Page size already {}", desired);
            return Ok(PageSizeOutcome::Unchanged);
        }

        engine_info!("Current page size is {:?}, changing to {}", current, desired);
        session
            .select_value(&select, &wanted)
            .await
            .map_err(|err| unconfirmed(err.to_string()))?;

        if !session.wait_for_staleness(&select, self.timeout).await {
            return Err(unconfirmed("page did not refresh".to_string()));
        }
        let table = Locator::Id(self.layout.table_id.clone());
        self.require(session, &table)
            .await
            .map_err(|err| unconfirmed(err.to_string()))?;
        self.require(session, &Locator::TableRows)
            .await
            .map_err(|err| unconfirmed(err.to_string()))?;

        engine_info!("Page refreshed with page size {}", desired);
        Ok(PageSizeOutcome::Changed)
    }

    async fn require<S: PageSession>(
        &self,
        session: &S,
        locator: &Locator,
    ) -> Result<(), SessionError> {
        session.find_all(locator, self.timeout).await.map(|_| ())
    }
}
