//! Harvester engine: page sessions, navigation, extraction and export.
mod driver;
mod export;
mod extract;
mod navigator;
mod page_size;
mod session;
mod sim;
mod snapshot;
mod webdriver;

pub use driver::{HarvestError, Harvester, StopHandle};
pub use export::{render_csv, CsvExporter, ExportError, ExportSummary};
pub use extract::{PageContent, PageExtractor};
pub use navigator::{read_active_page, Navigator};
pub use page_size::{PageSizeError, PageSizeNegotiator};
pub use session::{Locator, PageSession, SessionError};
pub use sim::{SimElement, SimFaults, SimRow, SimSession, SimSite};
pub use snapshot::{parse_grid_rows, site_from_snapshot, SnapshotError};
pub use webdriver::{BrowserSettings, WebDriverSession};
