//! Search query construction.
//!
//! Gopher+ search endpoints may declare an ordered field list (via a
//! `FIELDS` attribute block); the wire payload is the field values in
//! declaration order, tab-separated. User input mixes `key=value`
//! tokens with positional ones, and values with spaces can be quoted
//! shell-style.

use crate::gopher::MenuEntry;

/// Build the tab-delimited query payload for a search endpoint.
///
/// An empty return string signals "nothing to send". Extra user input
/// beyond the declared fields is appended (positionals first, then
/// leftover named values) rather than silently dropped.
pub fn build_query(endpoint: &MenuEntry, raw: &str) -> String {
    let tokens = tokenize(raw);
    if tokens.is_empty() {
        return String::new();
    }

    let Some(fields) = endpoint.search_fields().filter(|f| !f.is_empty()) else {
        // No declared fields: one free-text value.
        return tokens.join(" ");
    };

    let mut named: Vec<(String, String)> = Vec::new();
    let mut positional: Vec<String> = Vec::new();
    for token in tokens {
        match token.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                named.push((key.to_string(), value.to_string()));
            }
            _ => positional.push(token),
        }
    }

    let mut used = vec![false; named.len()];
    let mut next_positional = 0usize;
    let mut values = Vec::with_capacity(fields.len());

    for field in fields {
        let named_match = named
            .iter()
            .zip(used.iter_mut())
            .find(|((key, _), taken)| !**taken && key.eq_ignore_ascii_case(field));
        if let Some(((_, value), taken)) = named_match {
            *taken = true;
            values.push(value.clone());
        } else if next_positional < positional.len() {
            values.push(positional[next_positional].clone());
            next_positional += 1;
        } else {
            values.push(String::new());
        }
    }

    values.extend(positional.drain(next_positional..));
    for ((_, value), taken) in named.into_iter().zip(used) {
        if !taken {
            values.push(value);
        }
    }

    values.join("\t")
}

/// Shell-style tokenization; unbalanced quotes degrade to plain
/// whitespace splitting instead of dropping the input.
fn tokenize(raw: &str) -> Vec<String> {
    shell_words::split(raw)
        .unwrap_or_else(|_| raw.split_whitespace().map(str::to_string).collect())
}
