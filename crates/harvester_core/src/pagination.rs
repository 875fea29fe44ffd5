use std::fmt;

/// Upper bound on the number of pages a run may extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageCap {
    #[default]
    Unbounded,
    Limit(u32),
}

impl PageCap {
    /// Interpret the raw command-line value: `-1` (or anything not positive)
    /// means "no cap".
    pub fn from_raw(raw: i64) -> Self {
        if raw <= 0 {
            PageCap::Unbounded
        } else {
            PageCap::Limit(u32::try_from(raw).unwrap_or(u32::MAX))
        }
    }

    pub fn as_raw(self) -> i64 {
        match self {
            PageCap::Unbounded => -1,
            PageCap::Limit(limit) => i64::from(limit),
        }
    }

    pub fn reached(self, pages_scraped: u32) -> bool {
        match self {
            PageCap::Unbounded => false,
            PageCap::Limit(limit) => pages_scraped >= limit,
        }
    }
}

impl fmt::Display for PageCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageCap::Unbounded => f.write_str("unbounded"),
            PageCap::Limit(limit) => write!(f, "{limit}"),
        }
    }
}

/// The navigator's notion of which page is displayed. The page number only
/// moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    current_page: u32,
}

impl PaginationState {
    pub fn starting_at(page: u32) -> Self {
        Self {
            current_page: page.max(1),
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn next_page(&self) -> u32 {
        self.current_page.saturating_add(1)
    }

    pub fn step(&mut self) -> u32 {
        self.current_page = self.next_page();
        self.current_page
    }

    /// Adopt a page number read back from the pager. Returns `false` and
    /// leaves the state untouched unless `page` is strictly ahead.
    pub fn rebase(&mut self, page: u32) -> bool {
        if page > self.current_page {
            self.current_page = page;
            true
        } else {
            false
        }
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

/// Navigator states. `Exhausted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavPhase {
    AtPage(u32),
    SeekingSequential,
    SeekingEllipsis,
    Advancing,
    Exhausted,
}

impl NavPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, NavPhase::Exhausted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceVia {
    Sequential,
    Ellipsis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustReason {
    /// Neither the next page link nor an ellipsis control exists.
    NoFurtherControls,
    /// The ellipsis was clicked but the active page did not move past `page`.
    EllipsisStalled { page: u32 },
    /// Clicking the link to `target` never produced a confirmed refresh.
    NavigationFailed { target: u32, attempts: u32 },
    /// The browser stopped answering while looking for the next page.
    SessionLost,
}

impl ExhaustReason {
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            ExhaustReason::NavigationFailed { .. } | ExhaustReason::SessionLost
        )
    }
}

impl fmt::Display for ExhaustReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExhaustReason::NoFurtherControls => f.write_str("no further page controls"),
            ExhaustReason::EllipsisStalled { page } => {
                write!(f, "ellipsis did not advance past page {page}")
            }
            ExhaustReason::NavigationFailed { target, attempts } => write!(
                f,
                "navigation to page {target} unconfirmed after {attempts} attempts"
            ),
            ExhaustReason::SessionLost => f.write_str("browser session lost"),
        }
    }
}

/// Result of one advance request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Advanced { page: u32, via: AdvanceVia },
    Exhausted(ExhaustReason),
}
