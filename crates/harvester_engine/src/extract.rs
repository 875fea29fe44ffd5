use std::time::Duration;

use engine_logging::{engine_debug, engine_warn};
use harvester_core::{inspect, PageLayout, Record, RowStats, RowVerdict};

use crate::session::{Locator, PageSession};

/// Records of the page currently displayed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageContent {
    /// In visual top-to-bottom order.
    pub records: Vec<Record>,
    /// `false` when the data table itself never appeared.
    pub table_found: bool,
    pub stats: RowStats,
}

/// Reads the data table of the current page. Holds no state between pages.
#[derive(Debug, Clone)]
pub struct PageExtractor {
    layout: PageLayout,
    timeout: Duration,
}

impl PageExtractor {
    pub fn new(layout: PageLayout, timeout: Duration) -> Self {
        Self { layout, timeout }
    }

    pub async fn extract<S: PageSession>(&self, session: &S) -> PageContent {
        let table = Locator::Id(self.layout.table_id.clone());
        if let Err(err) = session.find_one(&table, self.timeout).await {
            engine_warn!("Data table missing table_id={} err={}", self.layout.table_id, err);
            return PageContent::default();
        }

        let rows = match session.find_all(&Locator::TableRows, self.timeout).await {
            Ok(rows) => rows,
            Err(err) => {
                engine_warn!("No rows in data table within {:?}: {}", self.timeout, err);
                return PageContent {
                    table_found: true,
                    ..PageContent::default()
                };
            }
        };

        let mut content = PageContent {
            table_found: true,
            ..PageContent::default()
        };
        for (idx, row) in rows.iter().enumerate() {
            let class = match session.read_attribute(row, "class").await {
                Ok(class) => class.unwrap_or_default(),
                Err(err) => {
                    engine_debug!("Skipping unreadable row idx={} err={}", idx, err);
                    content.stats.note_unreadable();
                    continue;
                }
            };
            if self.layout.is_pager_class(&class) {
                continue;
            }

            let cells = match session.read_cells(row).await {
                Ok(cells) => cells,
                Err(err) => {
                    engine_debug!("Skipping unreadable row idx={} err={}", idx, err);
                    content.stats.note_unreadable();
                    continue;
                }
            };

            let verdict = inspect(&cells);
            content.stats.note(&verdict);
            match verdict {
                RowVerdict::Record(record) => content.records.push(record),
                RowVerdict::UnknownLayout { columns } => {
                    engine_debug!(
                        "Skipping row with unexpected column count idx={} columns={} cells={:?}",
                        idx,
                        columns,
                        cells
                    );
                }
                RowVerdict::MissingRequired { columns } => {
                    engine_debug!(
                        "Skipping row without name or address idx={} columns={}",
                        idx,
                        columns
                    );
                }
                RowVerdict::Spacer => {}
            }
        }
        content
    }
}
