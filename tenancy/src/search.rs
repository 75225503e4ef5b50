//! Sequencing for debounced, overlapping searches.
//!
//! Every dispatched search takes a ticket. A response is applied only when its
//! ticket is still the latest one issued, so a slow early query can never
//! overwrite the results of a later one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Delay between the last keystroke and dispatching the search.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Maximum number of results a member search returns.
pub const SEARCH_LIMIT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SearchTicket(u64);

impl SearchTicket {
    #[must_use]
    pub fn sequence(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct SearchSequencer {
    latest: AtomicU64,
}

impl SearchSequencer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a ticket for a new request. Invalidates every earlier ticket.
    pub fn issue(&self) -> SearchTicket {
        SearchTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether results tagged with `ticket` may still be shown.
    #[must_use]
    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Invalidate all outstanding tickets without issuing a request (input cleared).
    pub fn cancel(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }
}

/// Trimmed query, or `None` when there is nothing to search for.
#[must_use]
pub fn normalize_query(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
