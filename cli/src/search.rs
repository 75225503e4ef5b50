//! Debounced member search.
//!
//! Each query waits out [`SEARCH_DEBOUNCE`] before it is sent. Every query
//! takes a ticket from a shared [`SearchSequencer`]; once the response
//! arrives it is shown only if no newer query was typed in the meantime.

use std::sync::Arc;

use tenancy::MemberSummary;
use tenancy::search::{SEARCH_DEBOUNCE, SearchSequencer, normalize_query};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::api::ApiClient;
use crate::error::CliError;
use crate::output;

#[async_trait::async_trait]
pub trait MemberSearch: Send + Sync {
    async fn search(&self, query: &str, exclude: &[Uuid]) -> Result<Vec<MemberSummary>, CliError>;
}

#[async_trait::async_trait]
impl MemberSearch for ApiClient {
    async fn search(&self, query: &str, exclude: &[Uuid]) -> Result<Vec<MemberSummary>, CliError> {
        self.search_members(query, exclude).await
    }
}

/// What happened to one keystroke's query.
#[derive(Debug)]
pub enum SearchOutcome {
    /// Results for the latest query.
    Results(Vec<MemberSummary>),
    /// A newer query superseded this one; nothing to show.
    Stale,
    /// The input was blank; results are cleared.
    Cleared,
}

pub struct DebouncedSearch<S> {
    source: Arc<S>,
    sequencer: Arc<SearchSequencer>,
    exclude: Arc<[Uuid]>,
}

impl<S> Clone for DebouncedSearch<S> {
    fn clone(&self) -> Self {
        Self { source: Arc::clone(&self.source), sequencer: Arc::clone(&self.sequencer), exclude: Arc::clone(&self.exclude) }
    }
}

impl<S: MemberSearch + 'static> DebouncedSearch<S> {
    #[must_use]
    pub fn new(source: S, exclude: Vec<Uuid>) -> Self {
        Self { source: Arc::new(source), sequencer: Arc::new(SearchSequencer::new()), exclude: exclude.into() }
    }

    /// Handle one change of the query text.
    ///
    /// # Errors
    ///
    /// Search failures for the latest query. Failures of superseded
    /// queries are reported as [`SearchOutcome::Stale`].
    pub async fn on_input(&self, raw: &str) -> Result<SearchOutcome, CliError> {
        let Some(query) = normalize_query(raw) else {
            self.sequencer.cancel();
            return Ok(SearchOutcome::Cleared);
        };
        let ticket = self.sequencer.issue();

        tokio::time::sleep(SEARCH_DEBOUNCE).await;
        if !self.sequencer.is_current(ticket) {
            return Ok(SearchOutcome::Stale);
        }

        let result = self.source.search(query, &self.exclude).await;
        if !self.sequencer.is_current(ticket) {
            return Ok(SearchOutcome::Stale);
        }
        result.map(SearchOutcome::Results)
    }
}

/// Read queries line by line from stdin and print results as they settle.
/// An empty line clears; end of input stops.
///
/// # Errors
///
/// Failures reading stdin.
pub async fn run_interactive(client: ApiClient, exclude: Vec<Uuid>) -> Result<(), CliError> {
    let search = DebouncedSearch::new(client, exclude);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprintln!("type to search members; empty line clears, Ctrl-D exits");

    let mut pending = Vec::new();
    while let Some(line) = lines.next_line().await? {
        let search = search.clone();
        pending.push(tokio::spawn(async move {
            match search.on_input(&line).await {
                Ok(SearchOutcome::Results(members)) => output::print_members(&members),
                Ok(SearchOutcome::Cleared) => println!("(cleared)"),
                Ok(SearchOutcome::Stale) => {}
                Err(e) => eprintln!("error: {e}"),
            }
        }));
    }
    drain(pending).await;
    Ok(())
}

/// Wait for every search task, reporting any that panicked or were cancelled.
/// Returns how many failed.
pub(crate) async fn drain(pending: Vec<JoinHandle<()>>) -> usize {
    let mut failed = 0;
    for task in pending {
        if let Err(e) = task.await {
            eprintln!("error: search task failed: {e}");
            failed += 1;
        }
    }
    failed
}

#[cfg(test)]
#[path = "search_test.rs"]
mod tests;
