//! Keyword store
//!
//! Parses keyword lines of the form `term | timecode`, de-duplicates them by
//! label and tracks the search status of each entry. No I/O happens here
//! except for [`read_keyword_file`].

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use uuid::Uuid;

use crate::backend::SearchResult;

/// Stable identifier of a keyword entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeywordId(Uuid);

impl KeywordId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for KeywordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KeywordStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error(String),
}

impl KeywordStatus {
    pub fn is_idle(&self) -> bool {
        matches!(self, KeywordStatus::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, KeywordStatus::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            KeywordStatus::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }
}

/// A keyword line split into its searchable part and annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub term: String,
    pub timecode: Option<String>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordEntry {
    pub id: KeywordId,
    /// What gets searched
    pub term: String,
    pub timecode: Option<String>,
    /// De-duplication key
    pub label: String,
    /// `None` until a search has succeeded at least once
    pub results: Option<Vec<SearchResult>>,
    pub status: KeywordStatus,
}

impl KeywordEntry {
    fn from_parsed(parsed: ParsedLine) -> Self {
        Self {
            id: KeywordId::new(),
            term: parsed.term,
            timecode: parsed.timecode,
            label: parsed.label,
            results: None,
            status: KeywordStatus::Idle,
        }
    }

    pub fn result_count(&self) -> usize {
        self.results.as_ref().map_or(0, Vec::len)
    }
}

/// Parse `"scene description | 00:01:23"` into term and timecode.
///
/// Returns `None` when the term is empty.
pub fn parse_line(line: &str) -> Option<ParsedLine> {
    let (term, timecode) = match line.split_once('|') {
        Some((term, rest)) => (term.trim(), Some(rest.trim())),
        None => (line.trim(), None),
    };

    if term.is_empty() {
        return None;
    }

    let timecode = timecode.filter(|t| !t.is_empty()).map(str::to_string);
    let label = match &timecode {
        Some(tc) => format!("{} | {}", term, tc),
        None => term.to_string(),
    };

    Some(ParsedLine {
        term: term.to_string(),
        timecode,
        label,
    })
}

/// Ordered keyword list plus the active selection
#[derive(Debug, Default)]
pub struct KeywordStore {
    entries: Vec<KeywordEntry>,
    active: Option<KeywordId>,
}

impl KeywordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[KeywordEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: KeywordId) -> Option<&KeywordEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn active_id(&self) -> Option<KeywordId> {
        self.active
    }

    pub fn active(&self) -> Option<&KeywordEntry> {
        self.active.and_then(|id| self.get(id))
    }

    pub fn last(&self) -> Option<&KeywordEntry> {
        self.entries.last()
    }

    /// Add a batch of raw lines, returning the ids of the new entries.
    ///
    /// Labels are checked against the entries present before the batch only,
    /// so repeats inside one batch are all kept.
    pub fn ingest<I, S>(&mut self, lines: I) -> Vec<KeywordId>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fresh: Vec<KeywordEntry> = {
            let existing: HashSet<&str> =
                self.entries.iter().map(|e| e.label.as_str()).collect();
            lines
                .into_iter()
                .filter_map(|line| {
                    let line = line.as_ref().trim();
                    if line.is_empty() {
                        None
                    } else {
                        parse_line(line)
                    }
                })
                .filter(|parsed| !existing.contains(parsed.label.as_str()))
                .map(KeywordEntry::from_parsed)
                .collect()
        };

        if fresh.is_empty() {
            return Vec::new();
        }

        let ids: Vec<KeywordId> = fresh.iter().map(|e| e.id).collect();
        self.entries.extend(fresh);
        if self.active.is_none() {
            self.active = ids.first().copied();
        }

        tracing::debug!(added = ids.len(), total = self.entries.len(), "keywords ingested");
        ids
    }

    /// Make `id` the active entry. Returns true if the selection changed.
    pub fn select(&mut self, id: KeywordId) -> bool {
        if self.active == Some(id) || self.get(id).is_none() {
            return false;
        }
        self.active = Some(id);
        true
    }

    /// Remove an entry; clears the selection if it was active
    pub fn remove(&mut self, id: KeywordId) -> Option<KeywordEntry> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        let removed = self.entries.remove(index);
        if self.active == Some(id) {
            self.active = None;
        }
        Some(removed)
    }

    /// Move an entry to `Loading`, dropping any previous error
    pub fn begin_loading(&mut self, id: KeywordId) -> bool {
        self.replace(id, |entry| KeywordEntry {
            status: KeywordStatus::Loading,
            ..entry.clone()
        })
    }

    pub fn complete(&mut self, id: KeywordId, results: Vec<SearchResult>) -> bool {
        self.replace(id, |entry| KeywordEntry {
            status: KeywordStatus::Success,
            results: Some(results),
            ..entry.clone()
        })
    }

    pub fn fail(&mut self, id: KeywordId, message: String) -> bool {
        self.replace(id, |entry| KeywordEntry {
            status: KeywordStatus::Error(message),
            ..entry.clone()
        })
    }

    // Entries are swapped whole so a reader never sees a half-updated one.
    fn replace(&mut self, id: KeywordId, update: impl FnOnce(&KeywordEntry) -> KeywordEntry) -> bool {
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(slot) => {
                *slot = update(slot);
                true
            }
            None => false,
        }
    }
}

/// Read a keyword file, one line per keyword; blank lines are dropped
pub async fn read_keyword_file(path: impl AsRef<Path>) -> std::io::Result<Vec<String>> {
    let text = tokio::fs::read_to_string(path.as_ref()).await?;
    Ok(text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(store: &KeywordStore) -> Vec<&str> {
        store.entries().iter().map(|e| e.term.as_str()).collect()
    }

    #[test]
    fn test_parse_with_timecode() {
        let parsed = parse_line("cat | 00:01:00").unwrap();
        assert_eq!(parsed.term, "cat");
        assert_eq!(parsed.timecode.as_deref(), Some("00:01:00"));
        assert_eq!(parsed.label, "cat | 00:01:00");
    }

    #[test]
    fn test_parse_plain() {
        let parsed = parse_line("cat").unwrap();
        assert_eq!(parsed.term, "cat");
        assert_eq!(parsed.timecode, None);
        assert_eq!(parsed.label, "cat");
    }

    #[test]
    fn test_parse_empty_term_is_discarded() {
        assert_eq!(parse_line("  | x"), None);
        assert_eq!(parse_line("   "), None);
    }

    #[test]
    fn test_parse_rejoins_extra_pipes() {
        let parsed = parse_line("  old map |00:01 | reel 2 ").unwrap();
        assert_eq!(parsed.term, "old map");
        assert_eq!(parsed.timecode.as_deref(), Some("00:01 | reel 2"));
        assert_eq!(parsed.label, "old map | 00:01 | reel 2");
    }

    #[test]
    fn test_parse_empty_timecode_is_absent() {
        let parsed = parse_line("cat |   ").unwrap();
        assert_eq!(parsed.timecode, None);
        assert_eq!(parsed.label, "cat");
    }

    #[test]
    fn test_ingest_keeps_duplicates_within_one_batch() {
        let mut store = KeywordStore::new();
        let ids = store.ingest(["cat", "cat"]);
        assert_eq!(ids.len(), 2);
        assert_eq!(store.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_ingest_distinguishes_timecodes() {
        let mut store = KeywordStore::new();
        store.ingest(["cat | t1", "cat | t2"]);
        assert_eq!(store.len(), 2);
        assert_eq!(terms(&store), vec!["cat", "cat"]);
    }

    #[test]
    fn test_reingest_existing_label_is_noop() {
        let mut store = KeywordStore::new();
        store.ingest(["cat", "dog | 00:02"]);
        let added = store.ingest(["cat", "  dog |00:02  ", ""]);
        assert!(added.is_empty());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_ingest_skips_blank_and_empty_terms() {
        let mut store = KeywordStore::new();
        let added = store.ingest(["", "   ", " | 00:01", "owl"]);
        assert_eq!(added.len(), 1);
        assert_eq!(terms(&store), vec!["owl"]);
    }

    #[test]
    fn test_ingest_preserves_order_and_starts_idle() {
        let mut store = KeywordStore::new();
        store.ingest(["a", "b"]);
        store.ingest(["c", "a", "d"]);
        assert_eq!(terms(&store), vec!["a", "b", "c", "d"]);
        for entry in store.entries() {
            assert_eq!(entry.status, KeywordStatus::Idle);
            assert!(entry.results.is_none());
        }
    }

    #[test]
    fn test_first_ingest_selects_first_new_entry() {
        let mut store = KeywordStore::new();
        let ids = store.ingest(["a", "b"]);
        assert_eq!(store.active_id(), Some(ids[0]));

        store.ingest(["c"]);
        assert_eq!(store.active_id(), Some(ids[0]));
    }

    #[test]
    fn test_ingest_after_clearing_selection_selects_new_entry() {
        let mut store = KeywordStore::new();
        let first = store.ingest(["a"]);
        store.remove(first[0]);
        assert_eq!(store.active_id(), None);

        let next = store.ingest(["b", "c"]);
        assert_eq!(store.active_id(), Some(next[0]));
    }

    #[test]
    fn test_delete_active_clears_selection() {
        let mut store = KeywordStore::new();
        let ids = store.ingest(["a", "b"]);
        assert!(store.remove(ids[0]).is_some());
        assert_eq!(store.active_id(), None);
        assert_eq!(terms(&store), vec!["b"]);
    }

    #[test]
    fn test_delete_other_keeps_selection() {
        let mut store = KeywordStore::new();
        let ids = store.ingest(["a", "b"]);
        store.remove(ids[1]);
        assert_eq!(store.active_id(), Some(ids[0]));
        assert!(store.remove(ids[1]).is_none());
    }

    #[test]
    fn test_select_reports_change() {
        let mut store = KeywordStore::new();
        let ids = store.ingest(["a", "b"]);
        assert!(!store.select(ids[0]));
        assert!(store.select(ids[1]));
        assert_eq!(store.active().map(|e| e.term.as_str()), Some("b"));
    }

    #[test]
    fn test_status_transitions_replace_entry() {
        let mut store = KeywordStore::new();
        let id = store.ingest(["a"])[0];

        assert!(store.begin_loading(id));
        assert!(store.get(id).unwrap().status.is_loading());

        assert!(store.fail(id, "boom".to_string()));
        assert_eq!(store.get(id).unwrap().status.error(), Some("boom"));
        assert!(store.get(id).unwrap().results.is_none());

        store.begin_loading(id);
        assert_eq!(store.get(id).unwrap().status.error(), None);

        store.complete(id, Vec::new());
        let entry = store.get(id).unwrap();
        assert_eq!(entry.status, KeywordStatus::Success);
        assert_eq!(entry.results.as_deref(), Some(&[][..]));
        assert_eq!(entry.result_count(), 0);
    }

    #[test]
    fn test_transition_on_missing_entry_is_rejected() {
        let mut store = KeywordStore::new();
        let id = store.ingest(["a"])[0];
        store.remove(id);
        assert!(!store.complete(id, Vec::new()));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_read_keyword_file_drops_blank_lines() {
        let path = std::env::temp_dir().join(format!("image-scout-{}.txt", Uuid::new_v4()));
        tokio::fs::write(&path, "cat | 00:01\r\n\r\n  \ndog\n").await.unwrap();

        let lines = read_keyword_file(&path).await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(lines, vec!["cat | 00:01", "dog"]);
    }
}
