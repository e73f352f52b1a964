//! # Debounced Search
//!
//! Per-keystroke search with a quiet period and stale-response discard.
//!
//! ## Timeline
//! ```text
//!  t=0    submit("co")    ticket #1 ── sleep 250ms ──► still latest → request ─────┐
//!  t=300  submit("coke")  ticket #2 ── sleep 250ms ──► still latest → request ─┐   │
//!                                                                              ▼   │
//!  t=560                               response #2, latest → publish "coke"        │
//!  t=750                               response #1, not latest → discarded ◄───────┘
//! ```
//!
//! A keystroke inside the quiet period supersedes the pending one, so only
//! the last query of a burst reaches the server. Results are published on a
//! `tokio::sync::watch` channel; a failed lookup publishes an empty list.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use till_core::search::{normalize_query, SearchSequencer, SearchTicket};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::ClientResult;

type LookupFuture<T> = Pin<Box<dyn Future<Output = ClientResult<Vec<T>>> + Send>>;
type LookupFn<T> = dyn Fn(String) -> LookupFuture<T> + Send + Sync;

/// Results of the latest applied search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults<T> {
    /// Ticket of the query these results answer; `None` before any search.
    pub ticket: Option<SearchTicket>,
    /// The trimmed query.
    pub query: String,
    pub items: Vec<T>,
}

impl<T> Default for SearchResults<T> {
    fn default() -> Self {
        SearchResults {
            ticket: None,
            query: String::new(),
            items: Vec::new(),
        }
    }
}

struct Shared<T> {
    sequencer: Mutex<SearchSequencer>,
    results: watch::Sender<SearchResults<T>>,
    lookup: Box<LookupFn<T>>,
    delay: Duration,
    min_chars: usize,
}

impl<T> Shared<T> {
    fn is_latest(&self, ticket: SearchTicket) -> bool {
        self.sequencer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_latest(ticket)
    }

    fn publish(&self, ticket: SearchTicket, query: String, items: Vec<T>) {
        if !self.is_latest(ticket) {
            debug!(ticket = ticket.seq(), query = %query, "Discarding stale search results");
            return;
        }
        self.results.send_replace(SearchResults {
            ticket: Some(ticket),
            query,
            items,
        });
    }
}

/// Debounced, latest-wins search over an async lookup.
///
/// Must be used from within a Tokio runtime; each [`submit`](Self::submit)
/// spawns a task.
pub struct DebouncedSearch<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for DebouncedSearch<T> {
    fn clone(&self) -> Self {
        DebouncedSearch {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> DebouncedSearch<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a search that waits `delay` after the last keystroke and
    /// sends nothing for queries shorter than `min_chars`.
    pub fn new<F, Fut>(delay: Duration, min_chars: usize, lookup: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ClientResult<Vec<T>>> + Send + 'static,
    {
        let (results, _) = watch::channel(SearchResults::default());
        let lookup: Box<LookupFn<T>> = Box::new(move |query| Box::pin(lookup(query)));

        DebouncedSearch {
            shared: Arc::new(Shared {
                sequencer: Mutex::new(SearchSequencer::new()),
                results,
                lookup,
                delay,
                min_chars,
            }),
        }
    }

    /// Registers a keystroke. Supersedes every earlier query.
    pub fn submit(&self, query: &str) -> SearchTicket {
        let ticket = self
            .shared
            .sequencer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .issue();

        let Some(query) = normalize_query(query, self.shared.min_chars) else {
            debug!(ticket = ticket.seq(), "Query too short, clearing results");
            self.shared.publish(ticket, query.trim().to_string(), Vec::new());
            return ticket;
        };

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            tokio::time::sleep(shared.delay).await;
            if !shared.is_latest(ticket) {
                debug!(ticket = ticket.seq(), query = %query, "Search superseded before sending");
                return;
            }

            let items = match (shared.lookup)(query.clone()).await {
                Ok(items) => items,
                Err(e) => {
                    warn!(query = %query, error = %e, "Search failed, showing no results");
                    Vec::new()
                }
            };
            shared.publish(ticket, query, items);
        });

        ticket
    }

    /// Receiver that observes every applied result set.
    pub fn subscribe(&self) -> watch::Receiver<SearchResults<T>> {
        self.shared.results.subscribe()
    }
}

impl<T: Clone> DebouncedSearch<T> {
    /// Snapshot of the latest applied results.
    pub fn current(&self) -> SearchResults<T> {
        self.shared.results.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_search(
        calls: Arc<AtomicUsize>,
        min_chars: usize,
    ) -> DebouncedSearch<String> {
        DebouncedSearch::new(Duration::from_millis(250), min_chars, move |query: String| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                // Shorter queries answer slower.
                let latency = if query.len() < 4 { 500 } else { 10 };
                tokio::time::sleep(Duration::from_millis(latency)).await;
                Ok(vec![format!("result for {}", query)])
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_sends_only_last_query() {
        let calls = Arc::new(AtomicUsize::new(0));
        let search = counting_search(Arc::clone(&calls), 2);

        for query in ["co", "cok", "coke"] {
            search.submit(query);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let current = search.current();
        assert_eq!(current.query, "coke");
        assert_eq!(current.items, vec!["result for coke".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_stale_response_is_discarded() {
        let calls = Arc::new(AtomicUsize::new(0));
        let search = counting_search(Arc::clone(&calls), 2);

        search.submit("co");
        // "co" is in flight (slow) when "coke" is typed.
        tokio::time::sleep(Duration::from_millis(300)).await;
        let latest = search.submit("coke");
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let current = search.current();
        assert_eq!(current.ticket, Some(latest));
        assert_eq!(current.query, "coke");
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_query_clears_without_request() {
        let calls = Arc::new(AtomicUsize::new(0));
        let search = counting_search(Arc::clone(&calls), 2);

        search.submit("coke");
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(search.current().items.len(), 1);

        search.submit(" c ");
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(search.current().items.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_lookup_publishes_empty() {
        let search: DebouncedSearch<String> =
            DebouncedSearch::new(Duration::from_millis(250), 0, |_query: String| async {
                Err(ClientError::ConnectionFailed("refused".into()))
            });
        let mut rx = search.subscribe();

        let ticket = search.submit("");
        rx.changed().await.unwrap();

        let results = rx.borrow().clone();
        assert_eq!(results.ticket, Some(ticket));
        assert!(results.items.is_empty());
    }
}
