use std::sync::Once;
use std::time::Duration;

use harvester_core::{PageLayout, Record, RowStats};
use harvester_engine::{PageExtractor, PageSession, SimFaults, SimRow, SimSession, SimSite};
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

fn extractor() -> PageExtractor {
    PageExtractor::new(PageLayout::default(), TIMEOUT)
}

async fn loaded(site: SimSite) -> SimSession {
    let session = SimSession::new(site);
    session.navigate("https://example.test/list").await.unwrap();
    session
}

#[tokio::test]
async fn records_follow_visual_order() {
    init_logging();
    let session = loaded(SimSite::new(vec![
        data_row("Alpha", "Zürich"),
        data_row("Beta", "Basel"),
        data_row("Gamma", "Bern"),
    ]))
    .await;

    let content = extractor().extract(&session).await;
    assert!(content.table_found);
    let names: Vec<&str> = content.records.iter().map(Record::name).collect();
    assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
    assert_eq!(content.records[1].city(), "Basel");
}

#[tokio::test]
async fn pager_and_junk_rows_are_skipped() {
    init_logging();
    let rows = vec![
        data_row("Alpha", "Zürich"),
        SimRow::new(vec![""; 13]),
        SimRow::new(["only", "three", "cells"]),
        SimRow::new([
            "", "", "", "No Name Street", "8001", "Zürich", "ZH", "", "", "", "", "", "",
        ]),
        SimRow::new([
            "", "", "Styled", "Seestrasse 9", "8800", "Thalwil", "ZH", "", "", "", "", "", "",
        ])
        .with_class("pager-highlight"),
        data_row("Beta", "Basel"),
    ];
    // Two pages, so the simulator renders pager rows around the data.
    let mut all = rows.clone();
    all.extend((0..rows.len()).map(|idx| data_row(&format!("Next {idx}"), "Chur")));
    let session = loaded(SimSite::new(all).page_size(6)).await;

    let content = extractor().extract(&session).await;
    let names: Vec<&str> = content.records.iter().map(Record::name).collect();
    assert_eq!(names, vec!["Alpha", "Beta"]);
    assert_eq!(
        content.stats,
        RowStats {
            accepted: 2,
            spacers: 1,
            unknown_layout: 1,
            missing_required: 1,
            unreadable: 0,
        }
    );
}

#[tokio::test]
async fn missing_table_is_reported() {
    init_logging();
    let site = SimSite::new(vec![data_row("Alpha", "Zürich")]).faults(SimFaults {
        tableless_pages: vec![1],
        ..SimFaults::default()
    });
    let session = loaded(site).await;

    let content = extractor().extract(&session).await;
    assert!(!content.table_found);
    assert!(content.records.is_empty());
}

#[tokio::test]
async fn extraction_does_not_navigate() {
    init_logging();
    let rows = (0..25).map(|idx| data_row(&format!("R{idx}"), "Lugano")).collect();
    let session = loaded(SimSite::new(rows)).await;

    let first = extractor().extract(&session).await;
    let second = extractor().extract(&session).await;
    assert_eq!(first, second);
    assert_eq!(session.current_page(), 1);
    assert!(session.clicks().is_empty());
}
