use std::sync::Once;
use std::time::Duration;

use harvester_core::{PageLayout, PageSizeOutcome};
use harvester_engine::{
    PageExtractor, PageSession, PageSizeError, PageSizeNegotiator, SimFaults, SimRow, SimSession,
    SimSite,
};
use pretty_assertions::assert_eq;

const TIMEOUT: Duration = Duration::from_millis(10);

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

/// A 13-column data row.
fn data_row(name: &str, city: &str) -> SimRow {
    SimRow::new([
        "", "", name, "Bahnhofstrasse 1", "8001", city, "ZH", "044 000 00 00", "", "", "", "", "",
    ])
}

fn negotiator() -> PageSizeNegotiator {
    PageSizeNegotiator::new(PageLayout::default(), TIMEOUT)
}

async fn loaded(site: SimSite) -> SimSession {
    let session = SimSession::new(site);
    session.navigate("https://example.test/list").await.unwrap();
    session
}

#[tokio::test]
async fn page_size_already_desired_is_left_alone() {
    init_logging();
    let session = loaded(SimSite::new(vec![data_row("Alpha", "Zürich")]).page_size(500)).await;
    let negotiator = negotiator();

    let outcome = negotiator.negotiate(&session, 500).await;
    assert_eq!(outcome, Ok(PageSizeOutcome::Unchanged));
    assert_eq!(session.page_size(), 500);
}

#[tokio::test]
async fn page_size_change_repaginates() {
    init_logging();
    let rows = (0..120).map(|idx| data_row(&format!("R{idx}"), "Sion")).collect();
    let session = loaded(SimSite::new(rows).page_size(10)).await;
    assert_eq!(session.total_pages(), 12);
    let negotiator = negotiator();

    let outcome = negotiator.negotiate(&session, 500).await;
    assert_eq!(outcome, Ok(PageSizeOutcome::Changed));
    assert_eq!(session.page_size(), 500);
    assert_eq!(session.total_pages(), 1);

    let content = PageExtractor::new(PageLayout::default(), TIMEOUT)
        .extract(&session)
        .await;
    assert_eq!(content.records.len(), 120);
}

#[tokio::test]
async fn missing_page_size_control_keeps_default() {
    init_logging();
    let site = SimSite::new(vec![data_row("Alpha", "Zürich")]).faults(SimFaults {
        hidden_page_size: true,
        ..SimFaults::default()
    });
    let session = loaded(site).await;
    let negotiator = negotiator();

    let outcome = negotiator.negotiate(&session, 500).await;
    assert_eq!(outcome, Ok(PageSizeOutcome::Unavailable));
    assert_eq!(session.page_size(), 10);
}

#[tokio::test]
async fn unobserved_page_size_refresh_is_unconfirmed() {
    init_logging();
    let site = SimSite::new(vec![data_row("Alpha", "Zürich")]).faults(SimFaults {
        frozen_page_size: true,
        ..SimFaults::default()
    });
    let session = loaded(site).await;
    let negotiator = negotiator();

    let outcome = negotiator.negotiate(&session, 500).await;
    assert!(matches!(
        outcome,
        Err(PageSizeError::Unconfirmed { desired: 500, .. })
    ));
}

#[tokio::test]
async fn unknown_page_size_option_is_unconfirmed() {
    init_logging();
    let session = loaded(SimSite::new(vec![data_row("Alpha", "Zürich")])).await;
    let negotiator = negotiator();

    let outcome = negotiator.negotiate(&session, 42).await;
    assert!(matches!(
        outcome,
        Err(PageSizeError::Unconfirmed { desired: 42, .. })
    ));
    assert_eq!(session.page_size(), 10);
}
