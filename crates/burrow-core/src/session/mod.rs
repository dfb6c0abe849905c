//! Per-user navigation sessions.
//!
//! A session turns fetched Gopher content into a paginated, resumable
//! browsing experience: a history stack of views, pagination cursors,
//! and a pending-search prompt. Every operation returns the text to
//! send back to the user; invalid requests (off-page selection, search
//! with nothing pending) are answered with plain messages, never
//! errors, and a failed fetch always leaves the previous view intact.

mod command;
mod store;

use std::sync::Arc;

use tracing::debug;

use crate::constants::{FILE_PAGE_SIZE, MENU_PAGE_SIZE};
use crate::gopher::{Fetch, FetchResult, MenuEntry};
use crate::search::build_query;
use crate::url::{parent_selector, GopherUrl};
use crate::Error;

pub use command::{Command, HELP_TEXT};
pub use store::{SessionStore, StoreConfig};

/// One fetched, renderable unit of content with its own pagination
/// cursors.
#[derive(Debug, Clone)]
pub struct ViewState {
    /// The URL this view was fetched from.
    pub url: GopherUrl,
    /// Decoded content.
    pub body: FetchResult,
    /// First selectable entry shown (menus).
    pub menu_offset: usize,
    /// First line shown (files).
    pub file_offset: usize,
}

impl ViewState {
    fn new(url: GopherUrl, body: FetchResult) -> Self {
        Self {
            url,
            body,
            menu_offset: 0,
            file_offset: 0,
        }
    }
}

/// Navigation state for one remote identity.
pub struct Session {
    client: Arc<dyn Fetch>,
    /// Stack of navigable pages; the top is the current page unless a
    /// search prompt overlays it.
    history: Vec<ViewState>,
    /// Pending search prompt. Never pushed onto history: a prompt is
    /// not a navigable page until the search resolves into content.
    prompt: Option<ViewState>,
}

const NOTHING_OPEN: &str = "Nothing open yet. Try: u gopher://gopher.floodgap.com/";

impl Session {
    pub fn new(client: Arc<dyn Fetch>) -> Self {
        Self {
            client,
            history: Vec::new(),
            prompt: None,
        }
    }

    /// The view the user currently sees.
    fn current(&self) -> Option<&ViewState> {
        self.prompt.as_ref().or_else(|| self.history.last())
    }

    fn current_mut(&mut self) -> Option<&mut ViewState> {
        self.prompt.as_mut().or_else(|| self.history.last_mut())
    }

    /// Interpret one inbound command line and run it.
    pub async fn handle_line(&mut self, line: &str) -> String {
        match Command::parse(line) {
            Command::Open(url) => self.open(&url).await,
            Command::Select(idx) => self.select_index(idx).await,
            Command::Search(terms) => self.search(&terms).await,
            Command::Back => self.back().await,
            Command::Next => self.next_page(),
            Command::Prev => self.prev_page(),
            Command::ShowUrl => self.current_url(),
            Command::Help => HELP_TEXT.to_string(),
        }
    }

    /// Open a fresh URL, discarding prior navigation depth.
    pub async fn open(&mut self, url_str: &str) -> String {
        let url = match GopherUrl::parse(url_str) {
            Ok(url) => url,
            Err(Error::MalformedUrl { message }) => return format!("Invalid URL: {message}"),
            Err(e) => return format!("Invalid URL: {e}"),
        };

        debug!(%url, "opening");
        match self.client.fetch(&url).await {
            Ok(FetchResult::Search(endpoint)) => {
                // A search prompt is shown but not navigable; history
                // stays as it was until a search produces content.
                let prompt = render_search_prompt(&endpoint);
                self.prompt = Some(ViewState::new(url, FetchResult::Search(endpoint)));
                prompt
            }
            Ok(body) => {
                self.prompt = None;
                self.history = vec![ViewState::new(url, body)];
                self.render()
            }
            Err(e) => format!("Error fetching {url}: {e}"),
        }
    }

    /// Selectable entries of the current menu view (type `i` lines are
    /// display-only).
    fn selectable_entries(&self) -> Vec<&MenuEntry> {
        match self.current().map(|v| &v.body) {
            Some(FetchResult::Menu(entries)) => {
                entries.iter().filter(|e| e.is_selectable()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Select an item by its index on the current menu page.
    pub async fn select_index(&mut self, idx: usize) -> String {
        let Some(view) = self.current() else {
            return NOTHING_OPEN.to_string();
        };
        if !matches!(view.body, FetchResult::Menu(_)) {
            return "Not in a menu; numbers apply only to menu listings.".to_string();
        }

        let offset = view.menu_offset;
        let base_url = view.url.clone();
        let entries = self.selectable_entries();
        let page: Vec<&MenuEntry> = entries
            .into_iter()
            .skip(offset)
            .take(MENU_PAGE_SIZE)
            .collect();
        let Some(entry) = page.get(idx).copied() else {
            return "Invalid selection on this page.".to_string();
        };
        let entry = entry.clone();

        // Listings commonly elide host/port that match the menu they
        // came from; inherit from the current view in that case.
        let entry_url = GopherUrl {
            host: if entry.host.is_empty() {
                base_url.host.clone()
            } else {
                entry.host.clone()
            },
            port: if entry.port == 0 {
                base_url.port
            } else {
                entry.port
            },
            item_type: entry.item_type,
            selector: entry.selector.clone(),
        };

        if matches!(entry.item_type, '7' | 't' | 'T') {
            let prompt = render_search_prompt(&entry);
            let mut endpoint = entry;
            endpoint.host = entry_url.host.clone();
            endpoint.port = entry_url.port;
            self.prompt = Some(ViewState::new(entry_url, FetchResult::Search(endpoint)));
            return prompt;
        }

        debug!(url = %entry_url, "selecting entry");
        match self.client.fetch(&entry_url).await {
            Ok(body) => {
                self.prompt = None;
                self.history.push(ViewState::new(entry_url, body));
                self.render()
            }
            Err(e) => format!("Error fetching {entry_url}: {e}"),
        }
    }

    /// Run the pending search with the user's terms.
    pub async fn search(&mut self, terms: &str) -> String {
        let endpoint = match self.prompt.as_ref().map(|v| &v.body) {
            Some(FetchResult::Search(endpoint)) => endpoint.clone(),
            _ => {
                return if self.current().is_none() {
                    "Open a gopher search endpoint first.".to_string()
                } else {
                    "No search pending. Select a '7' item first, then use 's <terms>'."
                        .to_string()
                };
            }
        };

        if terms.trim().is_empty() {
            return render_search_prompt(&endpoint);
        }

        let payload = build_query(&endpoint, terms);
        if payload.is_empty() {
            return "Usage: s <search terms>".to_string();
        }

        debug!(selector = %endpoint.selector, %payload, "running search");
        match self.client.search(&endpoint, &payload).await {
            Ok(entries) => {
                let url = GopherUrl {
                    host: endpoint.host.clone(),
                    port: endpoint.port,
                    item_type: '1',
                    selector: endpoint.selector.clone(),
                };
                self.prompt = None;
                self.history
                    .push(ViewState::new(url, FetchResult::Menu(entries)));
                self.render()
            }
            Err(e) => format!("Search failed: {e}"),
        }
    }

    /// Go back one page, or up one selector level when there is no
    /// history left to pop.
    pub async fn back(&mut self) -> String {
        if self.history.len() > 1 {
            // Pure history navigation, no network I/O.
            self.prompt = None;
            self.history.pop();
            return self.render();
        }

        let Some(view) = self.current() else {
            return NOTHING_OPEN.to_string();
        };
        let parent_url = GopherUrl {
            host: view.url.host.clone(),
            port: view.url.port,
            item_type: '1',
            selector: parent_selector(&view.url.selector),
        };

        debug!(url = %parent_url, "going up");
        match self.client.fetch(&parent_url).await {
            Ok(body) => {
                self.prompt = None;
                self.history = vec![ViewState::new(parent_url, body)];
                self.render()
            }
            Err(e) => format!("Error fetching {parent_url}: {e}"),
        }
    }

    /// Advance one page forward (menus and files only).
    pub fn next_page(&mut self) -> String {
        let selectable = self.selectable_entries().len();
        let Some(view) = self.current_mut() else {
            return "Nothing open yet.".to_string();
        };
        match &view.body {
            FetchResult::Menu(_) => {
                if view.menu_offset + MENU_PAGE_SIZE >= selectable {
                    return "End of menu.".to_string();
                }
                view.menu_offset += MENU_PAGE_SIZE;
                self.render()
            }
            FetchResult::File(lines) => {
                if view.file_offset + FILE_PAGE_SIZE >= lines.len() {
                    return "End of file.".to_string();
                }
                view.file_offset += FILE_PAGE_SIZE;
                self.render()
            }
            _ => "Paging not applicable for this view.".to_string(),
        }
    }

    /// Step one page back (menus and files only).
    pub fn prev_page(&mut self) -> String {
        let Some(view) = self.current_mut() else {
            return "Nothing open yet.".to_string();
        };
        match &view.body {
            FetchResult::Menu(_) => {
                if view.menu_offset == 0 {
                    return "Already at start.".to_string();
                }
                view.menu_offset = view.menu_offset.saturating_sub(MENU_PAGE_SIZE);
                self.render()
            }
            FetchResult::File(_) => {
                if view.file_offset == 0 {
                    return "Already at start.".to_string();
                }
                view.file_offset = view.file_offset.saturating_sub(FILE_PAGE_SIZE);
                self.render()
            }
            _ => "Paging not applicable for this view.".to_string(),
        }
    }

    /// Canonical URL of the current view, for bookmarking. Never
    /// mutates state.
    pub fn current_url(&self) -> String {
        match self.current() {
            Some(view) => view.url.to_string(),
            None => "Nothing open yet.".to_string(),
        }
    }

    /// Render the current view. Pure: two calls without a mutating
    /// operation in between yield identical text.
    pub fn render(&self) -> String {
        let Some(view) = self.current() else {
            return "Nothing open yet.".to_string();
        };
        let header = format!("[{}]", view.url);

        match &view.body {
            FetchResult::Menu(_) => {
                let entries = self.selectable_entries();
                if entries.is_empty() {
                    return format!("{header}\n(Empty menu)\nCommands: u <URL>, b");
                }

                let start = view.menu_offset;
                let page: Vec<&&MenuEntry> =
                    entries.iter().skip(start).take(MENU_PAGE_SIZE).collect();

                let mut lines = vec![
                    header,
                    format!(
                        "Showing items {}-{} of {}:",
                        start + 1,
                        start + page.len(),
                        entries.len()
                    ),
                ];
                for (i, entry) in page.iter().enumerate() {
                    let display = if entry.display.is_empty() {
                        "(no title)"
                    } else {
                        entry.display.as_str()
                    };
                    lines.push(format!("{i}) [{}] {display}", entry.item_type));
                }
                lines.push(
                    "Commands: number to select, n (next), p (prev), b (back), u <URL>"
                        .to_string(),
                );
                lines.join("\n")
            }
            FetchResult::File(file_lines) => {
                let start = view.file_offset;
                let page: Vec<&String> =
                    file_lines.iter().skip(start).take(FILE_PAGE_SIZE).collect();
                let body = page
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join("\n");
                format!(
                    "{header}\n{body}\n[Lines {}-{} of {}]\nCommands: n, p, b, u <URL>",
                    start + 1,
                    start + page.len(),
                    file_lines.len()
                )
            }
            FetchResult::Search(endpoint) => render_search_prompt(endpoint),
            FetchResult::Binary { byte_len, note } => {
                format!("{header}\n(Binary content, {byte_len} bytes) {note}\nCommands: b, u <URL>")
            }
        }
    }
}

/// Render the prompt for a search endpoint: declared fields and any
/// PROMPT/ABSTRACT notes recovered from Gopher+ attributes, else just
/// the generic send-terms line.
fn render_search_prompt(endpoint: &MenuEntry) -> String {
    let mut lines = Vec::new();
    if endpoint.display.is_empty() || endpoint.display == "[SEARCH]" {
        lines.push("Search".to_string());
    } else {
        lines.push(format!("Search: {}", endpoint.display));
    }
    if let Some(fields) = endpoint.search_fields() {
        lines.push(format!("Fields: {}", fields.join(", ")));
    }
    if let Some(notes) = endpoint.attribute(&["PROMPT"]) {
        lines.extend(notes.iter().cloned());
    }
    if let Some(notes) = endpoint.attribute(&["ABSTRACT"]) {
        lines.extend(notes.iter().cloned());
    }
    lines.push("Send: s <terms>".to_string());
    lines.join("\n")
}
