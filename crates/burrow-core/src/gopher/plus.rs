//! Gopher+ extended menu decoding.
//!
//! A Gopher+ response interleaves `+INFO:` entry records with
//! `+LABEL:` attribute blocks (search fields, prompts, abstracts) whose
//! content follows on subsequent lines. Decoding is an explicit
//! three-state machine so the block buffering can be tested without
//! socket I/O.

use super::menu::parse_menu_line;
use super::MenuEntry;

const INFO_PREFIX: &str = "+INFO:";

/// Decoder states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing seen yet.
    Idle,
    /// An entry record is current; attribute blocks attach to it.
    InEntry,
    /// An attribute block is open and buffering lines.
    InAttributeBlock,
}

/// Streaming decoder for extended menu responses.
#[derive(Debug)]
pub struct ExtendedMenuParser {
    state: State,
    entries: Vec<MenuEntry>,
    /// Open block label and its buffered lines.
    block: Option<(String, Vec<String>)>,
}

impl ExtendedMenuParser {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            entries: Vec::new(),
            block: None,
        }
    }

    /// Feed one response line. Returns `false` once the terminator has
    /// been seen and parsing is complete.
    pub fn feed(&mut self, line: &str) -> bool {
        if line == "." {
            self.flush_block();
            return false;
        }

        if let Some(rest) = line.strip_prefix(INFO_PREFIX) {
            self.flush_block();
            if let Some(mut entry) = parse_menu_line(rest) {
                entry.attributes = Some(Default::default());
                self.entries.push(entry);
                self.state = State::InEntry;
            }
            return true;
        }

        if let Some(label) = block_label(line) {
            self.flush_block();
            self.block = Some((label, Vec::new()));
            self.state = State::InAttributeBlock;
            return true;
        }

        if !line.is_empty() {
            if let Some((_, buffer)) = self.block.as_mut() {
                buffer.push(line.to_string());
            }
        }
        true
    }

    /// Finish decoding and take the accumulated entries.
    pub fn finish(mut self) -> Vec<MenuEntry> {
        self.flush_block();
        self.entries
    }

    /// Move the open block's buffer onto the current entry. No-op with
    /// no open block or no current entry.
    fn flush_block(&mut self) {
        let Some((label, buffer)) = self.block.take() else {
            return;
        };
        if let Some(entry) = self.entries.last_mut() {
            entry
                .attributes
                .get_or_insert_with(Default::default)
                .entry(label)
                .or_default()
                .extend(buffer);
        }
        if self.state == State::InAttributeBlock {
            self.state = State::InEntry;
        }
    }
}

impl Default for ExtendedMenuParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Recognize a `+LABEL:` block header: a non-empty label with nothing
/// after the trailing colon. (`+INFO:` lines carry data after the colon
/// and never match.)
fn block_label(line: &str) -> Option<String> {
    let rest = line.strip_prefix('+')?;
    let label = rest.strip_suffix(':')?;
    if label.is_empty() || label.contains(':') {
        return None;
    }
    Some(label.to_uppercase())
}

/// Decode a full extended menu response.
pub fn parse_extended_menu(lines: &[String]) -> Vec<MenuEntry> {
    let mut parser = ExtendedMenuParser::new();
    for line in lines {
        if !parser.feed(line) {
            break;
        }
    }
    parser.finish()
}

/// Heuristic for the Gopher+ probe: the first non-empty line of an
/// extended response is an `+INFO:` record.
pub(crate) fn looks_extended(lines: &[String]) -> bool {
    lines
        .iter()
        .find(|l| !l.trim().is_empty())
        .is_some_and(|l| l.starts_with(INFO_PREFIX))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &str) -> Vec<String> {
        raw.lines().map(str::to_string).collect()
    }

    #[test]
    fn entry_with_fields_and_prompt() {
        let entries = parse_extended_menu(&lines(
            "+INFO:1Title\t/s\th\t70\n+FIELDS:\nq\n+PROMPT:\nEnter terms\n.",
        ));
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.item_type, '1');
        assert_eq!(e.display, "Title");
        let attrs = e.attributes.as_ref().unwrap();
        assert_eq!(attrs["FIELDS"], vec!["q"]);
        assert_eq!(attrs["PROMPT"], vec!["Enter terms"]);
    }

    #[test]
    fn info_entry_gets_empty_attribute_map() {
        let entries = parse_extended_menu(&lines("+INFO:0File\t/f\th\t70\n."));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].attributes.as_ref().unwrap().len(), 0);
    }

    #[test]
    fn terminator_flushes_open_block() {
        let entries = parse_extended_menu(&lines("+INFO:7S\t/s\th\t70\n+ABSTRACT:\nA search.\n."));
        let attrs = entries[0].attributes.as_ref().unwrap();
        assert_eq!(attrs["ABSTRACT"], vec!["A search."]);
    }

    #[test]
    fn labels_are_upper_cased_and_line_ordered() {
        let entries =
            parse_extended_menu(&lines("+INFO:7S\t/s\th\t70\n+fields:\nauthor\ntitle\n."));
        let fields = entries[0].search_fields().unwrap();
        assert_eq!(fields, &vec!["author".to_string(), "title".to_string()]);
    }

    #[test]
    fn block_before_any_entry_is_dropped() {
        let entries = parse_extended_menu(&lines("+FIELDS:\nq\n+INFO:1T\t/t\th\t70\n."));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].attributes.as_ref().unwrap().len(), 0);
    }

    #[test]
    fn repeated_label_appends() {
        let entries = parse_extended_menu(&lines(
            "+INFO:7S\t/s\th\t70\n+FIELDS:\na\n+FIELDS:\nb\n.",
        ));
        assert_eq!(
            entries[0].attributes.as_ref().unwrap()["FIELDS"],
            vec!["a", "b"]
        );
    }

    #[test]
    fn multiple_entries_each_own_their_blocks() {
        let entries = parse_extended_menu(&lines(
            "+INFO:1A\t/a\th\t70\n+ABSTRACT:\nfirst\n+INFO:1B\t/b\th\t70\n+ABSTRACT:\nsecond\n.",
        ));
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].attributes.as_ref().unwrap()["ABSTRACT"],
            vec!["first"]
        );
        assert_eq!(
            entries[1].attributes.as_ref().unwrap()["ABSTRACT"],
            vec!["second"]
        );
    }

    #[test]
    fn missing_terminator_still_yields_entries() {
        let entries = parse_extended_menu(&lines("+INFO:1A\t/a\th\t70\n+FIELDS:\nq"));
        assert_eq!(
            entries[0].attributes.as_ref().unwrap()["FIELDS"],
            vec!["q"]
        );
    }

    #[test]
    fn extended_detection() {
        assert!(looks_extended(&lines("\n+INFO:1T\t/t\th\t70")));
        assert!(!looks_extended(&lines("1T\t/t\th\t70")));
        assert!(!looks_extended(&lines("")));
    }
}
