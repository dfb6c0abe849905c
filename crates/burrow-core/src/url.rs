//! Gopher URL parsing.
//!
//! A `gopher://` URL carries host, optional port, a one-character item
//! type, and an opaque selector: `gopher://host[:port]/Tselector`.

use std::fmt;

use crate::constants::{DEFAULT_GOPHER_PORT, KNOWN_ITEM_TYPES};
use crate::{Error, Result};

const SCHEME: &str = "gopher://";

/// Parsed coordinates of a single Gopher resource.
///
/// Immutable once built; consumed by the transaction client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GopherUrl {
    /// Server hostname or address.
    pub host: String,
    /// Server TCP port (70 when the URL omits it).
    pub port: u16,
    /// Item type character (`1` menu, `0` file, `7` search, ...).
    pub item_type: char,
    /// Server-defined selector string, opaque to the client.
    pub selector: String,
}

impl GopherUrl {
    /// Parse a `gopher://` URL.
    ///
    /// A bare host yields a type-`1` menu with an empty selector. A
    /// remainder whose first character is not a recognized item type is
    /// kept whole as the selector, with the type falling back to `1`;
    /// this preserves selectors that start with arbitrary punctuation.
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        // get() also rejects a multibyte char straddling the scheme
        // length, which a direct slice would panic on.
        match url.get(..SCHEME.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(SCHEME) => {}
            _ => return Err(Error::malformed_url("URL must start with gopher://")),
        }

        let body = &url[SCHEME.len()..];
        let (host_port, remainder) = match body.split_once('/') {
            Some((hp, rest)) => (hp, rest),
            None => (body, ""),
        };

        let (host, port) = match host_port.split_once(':') {
            Some((host, port_str)) => {
                let port = port_str
                    .parse::<u16>()
                    .map_err(|_| Error::malformed_url(format!("invalid port: {port_str}")))?;
                (host, port)
            }
            None => (host_port, DEFAULT_GOPHER_PORT),
        };
        if host.is_empty() {
            return Err(Error::malformed_url("missing host"));
        }

        if remainder.is_empty() {
            return Ok(Self {
                host: host.to_string(),
                port,
                item_type: '1',
                selector: String::new(),
            });
        }

        let type_char = remainder.chars().next().unwrap_or('1');
        if KNOWN_ITEM_TYPES.contains(type_char) {
            Ok(Self {
                host: host.to_string(),
                port,
                item_type: type_char,
                selector: remainder[type_char.len_utf8()..].to_string(),
            })
        } else {
            Ok(Self {
                host: host.to_string(),
                port,
                item_type: '1',
                selector: remainder.to_string(),
            })
        }
    }
}

impl fmt::Display for GopherUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gopher://{}:{}/{}{}",
            self.host, self.port, self.item_type, self.selector
        )
    }
}

/// Strip the last `/`-delimited segment from a selector.
///
/// Used as the "go up a directory" fallback when there is no history to
/// pop. A selector with no `/` has the root (empty selector) as its
/// parent.
pub fn parent_selector(selector: &str) -> String {
    match selector.rfind('/') {
        Some(idx) => selector[..idx].to_string(),
        None => String::new(),
    }
}
