//! Pager navigation.
//!
//! The pager only shows a window of page numbers. Moving forward means
//! clicking the link for the next number when it is visible, and otherwise
//! clicking the `...` link that follows the active page, which posts back to
//! the first page past the window. Every click is confirmed by waiting for the old table to go
//! stale and a new one (with rows) to appear; after a `...` click the page
//! number is read back from the pager instead of being assumed.

use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use harvester_core::{
    Advance, AdvanceVia, ExhaustReason, NavPhase, PageLayout, PaginationState,
    MAX_ADVANCE_ATTEMPTS,
};

use crate::session::{Locator, PageSession, SessionError};

pub struct Navigator<'s, S: PageSession> {
    session: &'s S,
    layout: PageLayout,
    timeout: Duration,
    settle_delay: Duration,
    state: PaginationState,
    phase: NavPhase,
    exhausted: Option<ExhaustReason>,
}

impl<'s, S: PageSession> Navigator<'s, S> {
    pub fn new(session: &'s S, layout: PageLayout, timeout: Duration, start_page: u32) -> Self {
        let state = PaginationState::starting_at(start_page);
        Self {
            session,
            layout,
            timeout,
            settle_delay: Duration::ZERO,
            phase: NavPhase::AtPage(state.current_page()),
            state,
            exhausted: None,
        }
    }

    /// Pause after every confirmed transition before handing control back.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn current_page(&self) -> u32 {
        self.state.current_page()
    }

    pub fn phase(&self) -> NavPhase {
        self.phase
    }

    /// Move to the page after the current one.
    ///
    /// Once this has returned [`Advance::Exhausted`] it keeps returning the
    /// same reason without touching the session.
    pub async fn advance(&mut self) -> Advance {
        if let Some(reason) = self.exhausted {
            return Advance::Exhausted(reason);
        }

        let current = self.state.current_page();
        let target = self.state.next_page();

        self.phase = NavPhase::SeekingSequential;
        match self
            .session
            .wait_for_clickable(&Locator::page_link(target), self.timeout)
            .await
        {
            Ok(_) => {
                engine_debug!("Found link for page {}", target);
                self.phase = NavPhase::Advancing;
                return self.click_through(target).await;
            }
            Err(err) if err.is_timeout() => {
                engine_debug!("Link for page {} not found directly: {}", target, err);
            }
            Err(err) => return self.session_lost(&err),
        }

        self.phase = NavPhase::SeekingEllipsis;
        self.reveal_more(current).await
    }

    async fn click_through(&mut self, target: u32) -> Advance {
        let link = Locator::page_link(target);
        for attempt in 1..=MAX_ADVANCE_ATTEMPTS {
            // Re-locate every attempt: the previous handle may already be stale.
            let element = match self.session.wait_for_clickable(&link, self.timeout).await {
                Ok(element) => element,
                Err(err) if err.is_timeout() => {
                    engine_warn!(
                        "Re-locating link for page {} failed attempt={} err={}",
                        target,
                        attempt,
                        err
                    );
                    continue;
                }
                Err(err) => return self.session_lost(&err),
            };
            let anchor = match self.anchor().await {
                Ok(anchor) => anchor,
                Err(err) if err.is_timeout() => continue,
                Err(err) => return self.session_lost(&err),
            };
            if let Err(err) = self.session.click(&element).await {
                engine_warn!(
                    "Clicking link for page {} failed attempt={} err={}",
                    target,
                    attempt,
                    err
                );
                continue;
            }
            if self.await_refresh(&anchor).await {
                let page = self.state.step();
                self.phase = NavPhase::AtPage(page);
                engine_info!("Advanced to page {} attempt={}", page, attempt);
                self.settle().await;
                return Advance::Advanced {
                    page,
                    via: AdvanceVia::Sequential,
                };
            }
            engine_warn!(
                "Page {} did not load after click attempt={}/{}",
                target,
                attempt,
                MAX_ADVANCE_ATTEMPTS
            );
        }

        self.exhaust(ExhaustReason::NavigationFailed {
            target,
            attempts: MAX_ADVANCE_ATTEMPTS,
        })
    }

    async fn reveal_more(&mut self, current: u32) -> Advance {
        let ellipsis = Locator::ForwardPagerLink(self.layout.ellipsis_label.clone());
        let element = match self.session.wait_for_clickable(&ellipsis, self.timeout).await {
            Ok(element) => element,
            Err(err) if err.is_timeout() => {
                engine_info!("No further page links after page {}", current);
                return self.exhaust(ExhaustReason::NoFurtherControls);
            }
            Err(err) => return self.session_lost(&err),
        };

        engine_debug!("Clicking '{}' to reveal more pages", self.layout.ellipsis_label);
        let stalled = ExhaustReason::EllipsisStalled { page: current };
        let anchor = match self.anchor().await {
            Ok(anchor) => anchor,
            Err(err) if err.is_timeout() => return self.exhaust(stalled),
            Err(err) => return self.session_lost(&err),
        };
        if let Err(err) = self.session.click(&element).await {
            engine_warn!("Clicking ellipsis failed: {}", err);
            return self.exhaust(stalled);
        }
        if !self.await_refresh(&anchor).await {
            engine_warn!("Page did not reload after ellipsis click");
            return self.exhaust(stalled);
        }

        match read_active_page(self.session, self.timeout).await {
            Some(page) if self.state.rebase(page) => {
                self.phase = NavPhase::AtPage(page);
                engine_info!("Advanced to page {} after clicking ellipsis", page);
                self.settle().await;
                Advance::Advanced {
                    page,
                    via: AdvanceVia::Ellipsis,
                }
            }
            read => {
                engine_warn!(
                    "Ellipsis did not advance past page {} (active page read {:?})",
                    current,
                    read
                );
                self.exhaust(stalled)
            }
        }
    }

    /// The current data table, whose staleness signals a completed postback.
    async fn anchor(&self) -> Result<S::Element, SessionError> {
        let table = Locator::Id(self.layout.table_id.clone());
        self.session
            .find_one(&table, self.timeout)
            .await
            .inspect_err(|err| engine_warn!("Data table not present before click: {}", err))
    }

    /// Stale old table, then a present table, then at least one row.
    async fn await_refresh(&self, anchor: &S::Element) -> bool {
        if !self.session.wait_for_staleness(anchor, self.timeout).await {
            return false;
        }
        let table = Locator::Id(self.layout.table_id.clone());
        if self.session.find_one(&table, self.timeout).await.is_err() {
            return false;
        }
        self.session
            .find_all(&Locator::TableRows, self.timeout)
            .await
            .is_ok()
    }

    async fn settle(&self) {
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
    }

    /// Anything other than a timed-out wait means the browser is gone.
    fn session_lost(&mut self, err: &SessionError) -> Advance {
        engine_warn!("Browser session lost at page {}: {}", self.state.current_page(), err);
        self.exhaust(ExhaustReason::SessionLost)
    }

    fn exhaust(&mut self, reason: ExhaustReason) -> Advance {
        engine_info!("Pagination exhausted at page {}: {}", self.state.current_page(), reason);
        self.phase = NavPhase::Exhausted;
        self.exhausted = Some(reason);
        Advance::Exhausted(reason)
    }
}

/// Page number shown as active in the pager, if it can be read.
pub async fn read_active_page<S: PageSession>(session: &S, timeout: Duration) -> Option<u32> {
    let marker = session.find_one(&Locator::ActivePage, timeout).await.ok()?;
    let text = session.read_text(&marker).await.ok()?;
    text.trim().parse().ok()
}
