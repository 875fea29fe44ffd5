use scraper::{ElementRef, Html, Selector};

use harvester_core::PageLayout;

use crate::sim::{SimFaults, SimRow, SimSite};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("invalid selector {selector:?}: {message}")]
    Selector { selector: String, message: String },
    #[error("table #{0} not found in snapshot")]
    TableMissing(String),
}

/// Read the grid rows out of a saved listing page.
///
/// Pager rows are dropped (the simulator renders its own) and each cell is
/// reduced to the text of its first `span`, like the live extractor sees it.
pub fn parse_grid_rows(html: &str, layout: &PageLayout) -> Result<Vec<SimRow>, SnapshotError> {
    let document = Html::parse_document(html);
    let table_sel = selector(&format!("table[id='{}']", layout.table_id))?;
    let span_sel = selector("span")?;

    let table = document
        .select(&table_sel)
        .next()
        .ok_or_else(|| SnapshotError::TableMissing(layout.table_id.clone()))?;

    let rows = child_elements(table, "tbody")
        .flat_map(|body| child_elements(body, "tr"))
        .filter(|row| {
            !row.value()
                .attr("class")
                .is_some_and(|class| layout.is_pager_class(class))
        })
        .map(|row| SimRow {
            class: row.value().attr("class").map(str::to_string),
            cells: child_elements(row, "td")
                .map(|cell| {
                    cell.select(&span_sel)
                        .next()
                        .map(|span| span.text().collect::<String>().trim().to_string())
                        .unwrap_or_default()
                })
                .collect(),
        })
        .collect();
    Ok(rows)
}

/// Single-page simulated site holding the rows of a saved listing page. A
/// snapshot carries no working page-size control, so none is offered.
pub fn site_from_snapshot(html: &str, layout: &PageLayout) -> Result<SimSite, SnapshotError> {
    let rows = parse_grid_rows(html, layout)?;
    let page_size = u32::try_from(rows.len()).unwrap_or(u32::MAX).max(1);
    Ok(SimSite::new(rows)
        .layout(layout.clone())
        .page_size(page_size)
        .page_size_options(vec![page_size])
        .faults(SimFaults {
            hidden_page_size: true,
            ..SimFaults::default()
        }))
}

fn selector(css: &str) -> Result<Selector, SnapshotError> {
    Selector::parse(css).map_err(|err| SnapshotError::Selector {
        selector: css.to_string(),
        message: err.to_string(),
    })
}

fn child_elements<'a>(parent: ElementRef<'a>, tag: &'a str) -> impl Iterator<Item = ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name().eq_ignore_ascii_case(tag))
}
