//! Search orchestration
//!
//! Drives searches and AI expansion against the keyword store. Every
//! operation is split in three so it fits an Elm-style update loop:
//!
//! - `begin_*` mutates state synchronously and hands back a ticket,
//! - `run_*` returns a `'static` future that only talks to a collaborator,
//! - `finish_*` applies the outcome.
//!
//! Searches carry a per-entry sequence number; only the latest request for an
//! entry may write its result, and results for deleted entries are dropped.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::ai::AiError;
use crate::backend::{BackendError, SearchResult};
use crate::config::AppConfig;
use crate::keywords::{KeywordEntry, KeywordId, KeywordStore};

/// Result cap used by auto-search and refresh
pub const DEFAULT_RESULT_CAP: u32 = 50;

const TRANSPORT_ERROR: &str = "Network error while contacting the search backend";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub api_key: String,
    pub cx: String,
    pub total: u32,
}

/// Image search collaborator
#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, BackendError>;
}

/// Related-keyword collaborator
#[async_trait]
pub trait KeywordExpander: Send + Sync {
    async fn expand(&self, seed: &str, api_key: &str) -> Result<Vec<String>, AiError>;
}

/// An in-flight search for one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub keyword: KeywordId,
    seq: u64,
    query: SearchQuery,
}

impl SearchTicket {
    pub fn term(&self) -> &str {
        &self.query.term
    }

    /// Same request, capped at `total` results
    pub fn with_total(mut self, total: u32) -> Self {
        self.query.total = total;
        self
    }
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub ticket: SearchTicket,
    pub result: Result<Vec<SearchResult>, String>,
}

/// What happened to a finished search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    /// A newer search for the same entry was issued
    Stale,
    /// The entry was deleted while the search was in flight
    Orphaned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandTicket {
    pub seed: String,
    api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandRequest {
    Started(ExpandTicket),
    /// No AI key; the caller should open the settings
    NeedsConfiguration,
    Busy,
    /// No keywords to expand from
    NothingToExpand,
}

pub struct Orchestrator {
    store: KeywordStore,
    config: AppConfig,
    search: Arc<dyn ImageSearch>,
    expander: Arc<dyn KeywordExpander>,
    /// Latest issued sequence number per entry with a search in flight
    in_flight: HashMap<KeywordId, u64>,
    next_seq: u64,
    expanding: bool,
}

impl Orchestrator {
    pub fn new(
        config: AppConfig,
        search: Arc<dyn ImageSearch>,
        expander: Arc<dyn KeywordExpander>,
    ) -> Self {
        Self {
            store: KeywordStore::new(),
            config,
            search,
            expander,
            in_flight: HashMap::new(),
            next_seq: 0,
            expanding: false,
        }
    }

    pub fn store(&self) -> &KeywordStore {
        &self.store
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn is_search_configured(&self) -> bool {
        self.config.is_search_configured()
    }

    pub fn is_expanding(&self) -> bool {
        self.expanding
    }

    /// Replace the whole config; may auto-search the active entry
    pub fn set_config(&mut self, config: AppConfig) -> Option<SearchTicket> {
        let was_configured = self.config.is_search_configured();
        self.config = config;
        if !was_configured && self.config.is_search_configured() {
            self.auto_search()
        } else {
            None
        }
    }

    /// Ingest raw lines; if this selected a new entry, it may be auto-searched
    pub fn ingest<I, S>(&mut self, lines: I) -> Option<SearchTicket>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let before = self.store.active_id();
        let added = self.store.ingest(lines);
        if added.is_empty() || self.store.active_id() == before {
            return None;
        }
        self.auto_search()
    }

    pub fn select(&mut self, id: KeywordId) -> Option<SearchTicket> {
        if self.store.select(id) {
            self.auto_search()
        } else {
            None
        }
    }

    pub fn delete(&mut self, id: KeywordId) -> Option<KeywordEntry> {
        self.in_flight.remove(&id);
        let removed = self.store.remove(id);
        if let Some(entry) = &removed {
            tracing::info!(keyword = %entry.label, "keyword deleted");
        }
        removed
    }

    /// Search the active entry if it has never been searched
    fn auto_search(&mut self) -> Option<SearchTicket> {
        let entry = self.store.active()?;
        if !entry.status.is_idle() || !self.config.is_search_configured() {
            return None;
        }
        let id = entry.id;
        self.begin_search(id, DEFAULT_RESULT_CAP)
    }

    /// Move the entry to loading and issue a ticket.
    ///
    /// Declines (returns `None`) for unknown entries or without search credentials.
    pub fn begin_search(&mut self, id: KeywordId, total: u32) -> Option<SearchTicket> {
        if !self.config.is_search_configured() {
            tracing::debug!("search declined: not configured");
            return None;
        }
        let term = self.store.get(id)?.term.clone();

        self.store.begin_loading(id);
        self.next_seq += 1;
        let seq = self.next_seq;
        self.in_flight.insert(id, seq);

        tracing::info!(keyword = %term, seq, total, "search started");
        Some(SearchTicket {
            keyword: id,
            seq,
            query: SearchQuery {
                term,
                api_key: self.config.google_api_key.clone(),
                cx: self.config.google_cx_id.clone(),
                total,
            },
        })
    }

    pub fn run_search(&self, ticket: SearchTicket) -> impl Future<Output = SearchOutcome> + Send + 'static {
        let search = Arc::clone(&self.search);
        async move {
            let result = search
                .search(&ticket.query)
                .await
                .map_err(|e| failure_message(&e));
            SearchOutcome { ticket, result }
        }
    }

    pub fn finish_search(&mut self, outcome: SearchOutcome) -> Applied {
        let SearchOutcome { ticket, result } = outcome;
        let id = ticket.keyword;

        if self.store.get(id).is_none() {
            tracing::debug!(seq = ticket.seq, "dropping search result for deleted keyword");
            return Applied::Orphaned;
        }
        if self.in_flight.get(&id) != Some(&ticket.seq) {
            tracing::debug!(seq = ticket.seq, "dropping stale search result");
            return Applied::Stale;
        }
        self.in_flight.remove(&id);

        match result {
            Ok(results) => {
                tracing::info!(keyword = %ticket.query.term, count = results.len(), "search finished");
                self.store.complete(id, results);
            }
            Err(message) => {
                tracing::warn!(keyword = %ticket.query.term, "search failed: {}", message);
                self.store.fail(id, message);
            }
        }
        Applied::Applied
    }

    /// Expand the active entry, or the newest one when nothing is selected
    pub fn begin_expand(&mut self) -> ExpandRequest {
        if !self.config.has_ai_key() {
            return ExpandRequest::NeedsConfiguration;
        }
        if self.expanding {
            return ExpandRequest::Busy;
        }
        let Some(target) = self.store.active().or_else(|| self.store.last()) else {
            return ExpandRequest::NothingToExpand;
        };

        let seed = target.term.clone();
        self.expanding = true;
        tracing::info!(seed = %seed, "expanding keyword");
        ExpandRequest::Started(ExpandTicket {
            seed,
            api_key: self.config.gemini_api_key.clone(),
        })
    }

    pub fn run_expand(
        &self,
        ticket: ExpandTicket,
    ) -> impl Future<Output = Result<Vec<String>, AiError>> + Send + 'static {
        let expander = Arc::clone(&self.expander);
        async move { expander.expand(&ticket.seed, &ticket.api_key).await }
    }

    /// Feed suggestions through ingest; failures only get logged
    pub fn finish_expand(&mut self, result: Result<Vec<String>, AiError>) -> Option<SearchTicket> {
        self.expanding = false;
        match result {
            Ok(lines) => {
                tracing::info!(suggestions = lines.len(), "expansion finished");
                self.ingest(lines)
            }
            Err(e) => {
                tracing::warn!("Failed to expand: {}", e);
                None
            }
        }
    }
}

fn failure_message(error: &BackendError) -> String {
    let message = error.to_string();
    if message.trim().is_empty() {
        TRANSPORT_ERROR.to_string()
    } else {
        message
    }
}
