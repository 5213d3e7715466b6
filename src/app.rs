//! Core application state and Iced Application implementation
//!
//! The orchestrator owns the keyword list; this layer turns its tickets into
//! `Task`s and routes the finished work back as messages.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use iced::widget::{column, container, image, row, text, text_editor, Space};
use iced::keyboard::{self, Key};
use iced::{Element, Event, Length, Subscription, Task, Theme};

use crate::ai::{AiError, GeminiClient};
use crate::backend::{BackendClient, BackendError, DownloadRequest, DownloadResponse};
use crate::config::{self, AppConfig, ConfigError};
use crate::keywords::{self, KeywordEntry, KeywordId, KeywordStore};
use crate::orchestrator::{
    Applied, ExpandRequest, Orchestrator, SearchOutcome, SearchTicket, DEFAULT_RESULT_CAP,
};
use crate::ui::{grid, settings, sidebar, theme};

// ============================================================================
// UI State Types
// ============================================================================

/// Preview image for one result link
#[derive(Debug, Clone)]
pub enum Preview {
    Loading,
    Ready(image::Handle),
    /// Every source in the fallback chain failed
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadState {
    Downloading,
    Saved(String),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    GoogleApiKey,
    GoogleCxId,
    GeminiApiKey,
}

/// Settings form state. A failed save keeps the panel open and its error
/// stays until a later save succeeds.
#[derive(Debug, Default)]
struct SettingsPanel {
    open: bool,
    draft: AppConfig,
    error: Option<String>,
}

impl SettingsPanel {
    fn show(&mut self, current: &AppConfig) {
        self.draft = current.clone();
        self.open = true;
    }

    fn edit(&mut self, field: SettingsField, value: String) {
        let slot = match field {
            SettingsField::GoogleApiKey => &mut self.draft.google_api_key,
            SettingsField::GoogleCxId => &mut self.draft.google_cx_id,
            SettingsField::GeminiApiKey => &mut self.draft.gemini_api_key,
        };
        *slot = value;
    }

    fn saved(&mut self, result: Result<PathBuf, ConfigError>) {
        match result {
            Ok(_) => {
                self.error = None;
                self.open = false;
            }
            Err(e) => {
                tracing::error!("Failed to save config: {}", e);
                self.error = Some(format!("Could not save settings: {}", e));
                self.open = true;
            }
        }
    }
}

// ============================================================================
// Application State
// ============================================================================

pub struct ImageScout {
    orchestrator: Orchestrator,
    backend: BackendClient,
    adding: bool,
    bulk_input: text_editor::Content,
    import_path: String,
    import_error: Option<String>,
    previews: HashMap<String, Preview>,
    downloads: HashMap<String, DownloadState>,
    settings: SettingsPanel,
}

#[derive(Debug, Clone)]
pub enum Message {
    KeywordsLoaded(Vec<String>),
    KeywordSelected(KeywordId),
    DeleteKeyword(KeywordId),
    ToggleAddPanel,
    BulkEdited(text_editor::Action),
    AddKeywords,
    ImportPathChanged(String),
    ImportFile,
    FileLoaded(Result<Vec<String>, String>),
    Refresh,
    SearchFinished(SearchOutcome),
    Expand,
    ExpandFinished(Result<Vec<String>, AiError>),
    PreviewLoaded(String, Option<Vec<u8>>),
    Download(usize),
    DownloadFinished(String, Result<DownloadResponse, BackendError>),
    OpenSettings,
    CloseSettings,
    SettingsChanged(SettingsField, String),
    SaveSettings,
    IcedEvent(Event),
}

impl ImageScout {
    pub fn new() -> (Self, Task<Message>) {
        let config = config::load();
        let backend = BackendClient::from_env();
        tracing::info!("Using search backend at {}", backend.base_url());

        let orchestrator = Orchestrator::new(
            config.clone(),
            Arc::new(backend.clone()),
            Arc::new(GeminiClient::from_env()),
        );

        let app = Self {
            orchestrator,
            settings: SettingsPanel {
                open: !config.is_search_configured(),
                draft: config,
                error: None,
            },
            backend: backend.clone(),
            adding: false,
            bulk_input: text_editor::Content::new(),
            import_path: String::new(),
            import_error: None,
            previews: HashMap::new(),
            downloads: HashMap::new(),
        };

        let load = Task::perform(async move { backend.keywords().await }, Message::KeywordsLoaded);
        (app, load)
    }

    pub fn title(&self) -> String {
        match self.orchestrator.store().active() {
            Some(entry) => format!("Image Scout - {}", entry.term),
            None => String::from("Image Scout"),
        }
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::KeywordsLoaded(lines) => {
                tracing::info!("Loaded {} keyword lines from backend", lines.len());
                let ticket = self.orchestrator.ingest(lines);
                self.search_task(ticket)
            }

            Message::KeywordSelected(id) => {
                let ticket = self.orchestrator.select(id);
                Task::batch([self.search_task(ticket), self.load_previews()])
            }

            Message::DeleteKeyword(id) => {
                if let Some(removed) = self.orchestrator.delete(id) {
                    let store = self.orchestrator.store();
                    forget_links(&mut self.previews, &removed, store);
                    forget_links(&mut self.downloads, &removed, store);
                }
                Task::none()
            }

            Message::ToggleAddPanel => {
                self.adding = !self.adding;
                Task::none()
            }

            Message::BulkEdited(action) => {
                self.bulk_input.perform(action);
                Task::none()
            }

            Message::AddKeywords => {
                let input = self.bulk_input.text();
                let ticket = self.orchestrator.ingest(input.lines());
                self.bulk_input = text_editor::Content::new();
                self.adding = false;
                self.search_task(ticket)
            }

            Message::ImportPathChanged(path) => {
                self.import_path = path;
                self.import_error = None;
                Task::none()
            }

            Message::ImportFile => {
                let path = PathBuf::from(self.import_path.trim());
                if path.as_os_str().is_empty() {
                    return Task::none();
                }
                Task::perform(keywords::read_keyword_file(path), |result| {
                    Message::FileLoaded(result.map_err(|e| e.to_string()))
                })
            }

            Message::FileLoaded(Ok(lines)) => {
                tracing::info!("Imported {} keyword lines", lines.len());
                self.import_path.clear();
                self.import_error = None;
                let ticket = self.orchestrator.ingest(lines);
                self.search_task(ticket)
            }

            Message::FileLoaded(Err(e)) => {
                tracing::warn!("Keyword import failed: {}", e);
                self.import_error = Some(e);
                Task::none()
            }

            Message::Refresh => {
                let ticket = self
                    .orchestrator
                    .store()
                    .active_id()
                    .and_then(|id| self.orchestrator.begin_search(id, DEFAULT_RESULT_CAP));
                self.search_task(ticket)
            }

            Message::SearchFinished(outcome) => {
                let keyword = outcome.ticket.keyword;
                let applied = self.orchestrator.finish_search(outcome);
                if applied == Applied::Applied && self.orchestrator.store().active_id() == Some(keyword) {
                    self.load_previews()
                } else {
                    Task::none()
                }
            }

            Message::Expand => match self.orchestrator.begin_expand() {
                ExpandRequest::Started(ticket) => {
                    Task::perform(self.orchestrator.run_expand(ticket), Message::ExpandFinished)
                }
                ExpandRequest::NeedsConfiguration => self.update(Message::OpenSettings),
                ExpandRequest::Busy | ExpandRequest::NothingToExpand => Task::none(),
            },

            Message::ExpandFinished(result) => {
                let ticket = self.orchestrator.finish_expand(result);
                self.search_task(ticket)
            }

            Message::PreviewLoaded(link, bytes) => {
                let preview = match bytes {
                    Some(bytes) => Preview::Ready(image::Handle::from_bytes(bytes)),
                    None => Preview::Missing,
                };
                self.previews.insert(link, preview);
                Task::none()
            }

            Message::Download(index) => {
                let Some(entry) = self.orchestrator.store().active() else {
                    return Task::none();
                };
                let Some(result) = entry.results.as_ref().and_then(|r| r.get(index)) else {
                    return Task::none();
                };

                let request = DownloadRequest {
                    id: result.id.unwrap_or(index as u64 + 1),
                    image_url: result.link.clone(),
                    query: entry.term.clone(),
                };
                let link = request.image_url.clone();
                self.downloads.insert(link.clone(), DownloadState::Downloading);

                let backend = self.backend.clone();
                Task::perform(async move { backend.download(&request).await }, move |result| {
                    Message::DownloadFinished(link.clone(), result)
                })
            }

            Message::DownloadFinished(link, result) => {
                let state = match result {
                    Ok(response) => {
                        tracing::info!("Saved {} ({})", link, response.status);
                        DownloadState::Saved(response.path.unwrap_or(response.status))
                    }
                    Err(e) => {
                        tracing::warn!("Download of {} failed: {}", link, e);
                        DownloadState::Failed(e.to_string())
                    }
                };
                self.downloads.insert(link, state);
                Task::none()
            }

            Message::OpenSettings => {
                self.settings.show(self.orchestrator.config());
                Task::none()
            }

            Message::CloseSettings => {
                self.settings.open = false;
                Task::none()
            }

            Message::SettingsChanged(field, value) => {
                self.settings.edit(field, value);
                Task::none()
            }

            Message::SaveSettings => {
                let draft = self.settings.draft.clone();
                self.settings.saved(config::save(&draft));
                // Applied even when persisting failed, so the session can search
                let ticket = self.orchestrator.set_config(draft);
                self.search_task(ticket)
            }

            Message::IcedEvent(event) => {
                if let Event::Keyboard(keyboard::Event::KeyPressed {
                    key: Key::Named(keyboard::key::Named::Escape),
                    ..
                }) = event
                {
                    self.settings.open = false;
                    self.adding = false;
                }
                Task::none()
            }
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let store = self.orchestrator.store();

        let sidebar = sidebar::view(sidebar::SidebarState {
            store,
            adding: self.adding,
            bulk_input: &self.bulk_input,
            import_path: &self.import_path,
            import_error: self.import_error.as_deref(),
            expanding: self.orchestrator.is_expanding(),
        });

        let main: Element<'_, Message> = if self.settings.open {
            settings::view(&self.settings.draft, self.settings.error.as_deref())
        } else if !self.orchestrator.is_search_configured() {
            settings::required()
        } else {
            match store.active() {
                Some(entry) => grid::view(entry, &self.previews, &self.downloads),
                None => empty_state(),
            }
        };

        container(row![sidebar, main].height(Length::Fill))
            .width(Length::Fill)
            .height(Length::Fill)
            .style(theme::background)
            .into()
    }

    pub fn subscription(&self) -> Subscription<Message> {
        iced::event::listen().map(Message::IcedEvent)
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    // ========================================================================
    // Task plumbing
    // ========================================================================

    fn search_task(&self, ticket: Option<SearchTicket>) -> Task<Message> {
        match ticket {
            Some(ticket) => Task::perform(self.orchestrator.run_search(ticket), Message::SearchFinished),
            None => Task::none(),
        }
    }

    /// Fetch previews for the active entry's results that are not cached yet
    fn load_previews(&mut self) -> Task<Message> {
        let Some(results) = self
            .orchestrator
            .store()
            .active()
            .and_then(|entry| entry.results.clone())
        else {
            return Task::none();
        };

        let pending: Vec<_> = results
            .into_iter()
            .filter(|result| !self.previews.contains_key(&result.link))
            .collect();

        let mut tasks = Vec::with_capacity(pending.len());
        for result in pending {
            self.previews.insert(result.link.clone(), Preview::Loading);
            let backend = self.backend.clone();
            let sources = result.preview_sources();
            let link = result.link;
            tasks.push(Task::perform(
                async move { backend.fetch_preview(&sources).await },
                move |bytes| Message::PreviewLoaded(link.clone(), bytes),
            ));
        }

        Task::batch(tasks)
    }
}

/// Drop cached state for a deleted entry's links that no remaining entry shows
fn forget_links<V>(cache: &mut HashMap<String, V>, removed: &KeywordEntry, store: &KeywordStore) {
    let Some(results) = &removed.results else {
        return;
    };
    for result in results {
        let still_shown = store.entries().iter().any(|entry| {
            entry
                .results
                .as_ref()
                .is_some_and(|rs| rs.iter().any(|r| r.link == result.link))
        });
        if !still_shown {
            cache.remove(&result.link);
        }
    }
}

fn empty_state<'a>() -> Element<'a, Message> {
    container(
        column![
            text("No keyword selected").size(20).color(theme::DarkTheme::TEXT_MUTED),
            Space::with_height(8),
            text("Select or add a keyword to begin")
                .size(14)
                .color(theme::DarkTheme::TEXT_MUTED),
        ]
        .align_x(iced::Alignment::Center),
    )
    .width(Length::Fill)
    .height(Length::Fill)
    .center_x(Length::Fill)
    .center_y(Length::Fill)
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SearchResult;

    fn hit(link: &str) -> SearchResult {
        SearchResult {
            id: None,
            link: link.to_string(),
            title: String::new(),
            image: None,
            display_link: String::new(),
            mime: String::new(),
            file_format: String::new(),
        }
    }

    fn save_error() -> ConfigError {
        ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        ))
    }

    #[test]
    fn test_failed_save_keeps_panel_open_with_error() {
        let mut panel = SettingsPanel::default();
        panel.show(&AppConfig::default());
        panel.edit(SettingsField::GoogleCxId, "cx".to_string());

        panel.saved(Err(save_error()));
        assert!(panel.open);
        assert!(panel.error.as_deref().is_some_and(|e| e.contains("read-only")));
        assert_eq!(panel.draft.google_cx_id, "cx");
    }

    #[test]
    fn test_save_error_survives_reopen_until_success() {
        let mut panel = SettingsPanel::default();
        panel.saved(Err(save_error()));
        panel.open = false;

        panel.show(&AppConfig::default());
        assert!(panel.open);
        assert!(panel.error.is_some());

        panel.saved(Ok(PathBuf::from("/tmp/config.json")));
        assert!(!panel.open);
        assert_eq!(panel.error, None);
    }

    #[test]
    fn test_forget_links_keeps_links_still_shown() {
        let mut store = KeywordStore::new();
        let ids = store.ingest(["cat", "cat | 00:02"]);
        store.complete(ids[0], vec![hit("https://a/1.jpg"), hit("https://a/shared.jpg")]);
        store.complete(ids[1], vec![hit("https://a/shared.jpg")]);

        let mut downloads = HashMap::new();
        downloads.insert("https://a/1.jpg".to_string(), DownloadState::Downloading);
        downloads.insert("https://a/shared.jpg".to_string(), DownloadState::Downloading);
        downloads.insert("https://other/x.jpg".to_string(), DownloadState::Downloading);

        let removed = store.remove(ids[0]).unwrap();
        forget_links(&mut downloads, &removed, &store);

        assert!(!downloads.contains_key("https://a/1.jpg"));
        assert!(downloads.contains_key("https://a/shared.jpg"));
        assert!(downloads.contains_key("https://other/x.jpg"));
    }

    #[test]
    fn test_forget_links_without_results_is_noop() {
        let mut store = KeywordStore::new();
        let id = store.ingest(["cat"])[0];
        let mut downloads: HashMap<String, DownloadState> = HashMap::new();
        downloads.insert("https://a/1.jpg".to_string(), DownloadState::Downloading);

        let removed = store.remove(id).unwrap();
        forget_links(&mut downloads, &removed, &store);
        assert_eq!(downloads.len(), 1);
    }
}
