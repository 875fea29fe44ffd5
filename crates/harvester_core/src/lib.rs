//! Harvester core: records, row schemas and pagination state. No IO.
mod config;
mod pagination;
mod record;
mod report;
mod schema;

pub use config::{
    ConfigError, HarvestConfig, PageLayout, DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE,
    DEFAULT_SETTLE_DELAY, DEFAULT_TIMEOUT, MAX_ADVANCE_ATTEMPTS,
};
pub use pagination::{Advance, AdvanceVia, ExhaustReason, NavPhase, PageCap, PaginationState};
pub use record::{Field, Record};
pub use report::{HarvestReport, PageSizeOutcome, RowStats, StopReason};
pub use schema::{classify, inspect, schema_for, RowSchema, RowVerdict, SCHEMAS};
