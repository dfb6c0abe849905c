//! Gopher transaction client and response decoding.
//!
//! One transaction is: connect, write `selector CRLF`, half-close the
//! write side, read until the peer closes or the idle timeout fires,
//! then decode. Menus are probed for Gopher+ first and fall back to the
//! classic format.

mod client;
mod menu;
mod plus;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::url::GopherUrl;
use crate::Result;

pub use client::GopherClient;
pub use menu::parse_menu;
pub use plus::parse_extended_menu;

/// One line of a Gopher menu listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    /// Item type character; `i` lines are informational and never
    /// selectable.
    pub item_type: char,
    /// Human-readable display string.
    pub display: String,
    /// Selector to request from `host:port`.
    pub selector: String,
    /// Host field (may be empty; listings commonly elide it when it
    /// matches the serving menu).
    pub host: String,
    /// Port field (70 when absent or unparsable).
    pub port: u16,
    /// Gopher+ attribute blocks keyed by upper-cased label, values in
    /// line order. `Some` (possibly empty) only for entries decoded
    /// from an extended response.
    pub attributes: Option<HashMap<String, Vec<String>>>,
}

impl MenuEntry {
    /// True for entries a user can select from a listing.
    pub fn is_selectable(&self) -> bool {
        self.item_type != 'i'
    }

    /// Look up an attribute block by any of several labels, first hit
    /// wins. Labels are stored upper-cased.
    pub fn attribute(&self, labels: &[&str]) -> Option<&Vec<String>> {
        let attrs = self.attributes.as_ref()?;
        labels.iter().find_map(|label| attrs.get(*label))
    }

    /// Declared search field names, from `FIELDS` or its synonyms.
    /// Absent means a single free-text field.
    pub fn search_fields(&self) -> Option<&Vec<String>> {
        self.attribute(&["FIELDS", "FIELD", "SEARCHFIELDS"])
    }
}

/// Decoded result of one fetch, one variant per view shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// Menu listing (type `1`, or search results).
    Menu(Vec<MenuEntry>),
    /// Plain text file, lines verbatim (type `0`).
    File(Vec<String>),
    /// Anything without a text representation; only its size is
    /// reported.
    Binary { byte_len: usize, note: String },
    /// Search endpoint (type `7`/`t`): no request was made yet, the
    /// entry carries the coordinates a later search call will target.
    Search(MenuEntry),
}

/// Seam between the navigation session and the network.
///
/// The production implementation is [`GopherClient`]; tests substitute
/// an in-memory fake.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch the resource a URL points at, dispatching on item type.
    async fn fetch(&self, url: &GopherUrl) -> Result<FetchResult>;

    /// Issue a search query against an endpoint entry. The payload is
    /// appended to the endpoint's selector after a tab.
    async fn search(&self, endpoint: &MenuEntry, payload: &str) -> Result<Vec<MenuEntry>>;
}
