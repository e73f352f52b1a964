//! # Search Sequencing
//!
//! Debounced lookups (product search, customer search) can resolve out of
//! order: a slow response for `"co"` may land after the fast one for
//! `"coke"`. A timer alone cannot prevent the stale one from overwriting the
//! newer results.
//!
//! ## Latest Query Wins
//! ```text
//! keystroke "co"   → issue() → ticket #1 ─────────────────────┐ (slow)
//! keystroke "coke" → issue() → ticket #2 ──────┐ (fast)       │
//!                                              ▼              ▼
//!                                   is_latest(#2) = true   is_latest(#1) = false
//!                                   → apply results        → discard
//! ```
//!
//! Ordering is by when the query was *issued*, never by when the response
//! arrived.

/// Opaque handle identifying one issued lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SearchTicket(u64);

impl SearchTicket {
    /// Sequence number of this ticket (1-based).
    pub fn seq(&self) -> u64 {
        self.0
    }
}

/// Issues monotonically increasing tickets and remembers the newest.
#[derive(Debug, Default)]
pub struct SearchSequencer {
    latest: u64,
}

impl SearchSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a ticket for a new query, superseding every earlier one.
    pub fn issue(&mut self) -> SearchTicket {
        self.latest += 1;
        SearchTicket(self.latest)
    }

    /// Returns true if no newer query has been issued since `ticket`.
    pub fn is_latest(&self, ticket: SearchTicket) -> bool {
        ticket.0 == self.latest
    }

    /// The most recently issued ticket, if any.
    pub fn latest(&self) -> Option<SearchTicket> {
        (self.latest > 0).then_some(SearchTicket(self.latest))
    }
}

/// Trims a query and returns `None` when it is too short to send.
///
/// ## Example
/// ```rust
/// use till_core::search::normalize_query;
///
/// assert_eq!(normalize_query("  coke ", 2), Some("coke".to_string()));
/// assert_eq!(normalize_query(" c ", 2), None);
/// assert_eq!(normalize_query("", 0), Some(String::new()));
/// ```
pub fn normalize_query(query: &str, min_chars: usize) -> Option<String> {
    let trimmed = query.trim();
    (trimmed.chars().count() >= min_chars).then(|| trimmed.to_string())
}
