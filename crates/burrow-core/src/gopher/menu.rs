//! Classic Gopher menu decoding.

use crate::constants::DEFAULT_GOPHER_PORT;

use super::MenuEntry;

/// Decode a classic menu listing.
///
/// Each line up to a lone `.` terminator is one entry: the first
/// character is the item type, the rest splits on tab into at most four
/// fields (display, selector, host, port). Short lines pad missing
/// fields with empty strings; an unparsable port defaults to 70 rather
/// than failing the listing.
pub fn parse_menu(lines: &[String]) -> Vec<MenuEntry> {
    let mut out = Vec::new();
    for line in lines {
        if line.trim() == "." {
            break;
        }
        if line.is_empty() {
            continue;
        }
        if let Some(entry) = parse_menu_line(line) {
            out.push(entry);
        }
    }
    out
}

/// Decode one menu line. Returns `None` only for empty input.
pub(crate) fn parse_menu_line(line: &str) -> Option<MenuEntry> {
    let item_type = line.chars().next()?;
    let rest = &line[item_type.len_utf8()..];

    let mut fields = rest.splitn(4, '\t');
    let display = fields.next().unwrap_or("").to_string();
    let selector = fields.next().unwrap_or("").to_string();
    let host = fields.next().unwrap_or("").to_string();
    let port = fields
        .next()
        .and_then(|p| p.trim().parse::<u16>().ok())
        .unwrap_or(DEFAULT_GOPHER_PORT);

    Some(MenuEntry {
        item_type,
        display,
        selector,
        host,
        port,
        attributes: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &str) -> Vec<String> {
        raw.lines().map(str::to_string).collect()
    }

    #[test]
    fn single_entry_with_terminator() {
        let entries = parse_menu(&lines("1Menu\t/sel\thost\t70\n."));
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.item_type, '1');
        assert_eq!(e.display, "Menu");
        assert_eq!(e.selector, "/sel");
        assert_eq!(e.host, "host");
        assert_eq!(e.port, 70);
        assert!(e.attributes.is_none());
    }

    #[test]
    fn terminator_stops_parsing() {
        let entries = parse_menu(&lines("0One\t/a\th\t70\n.\n0Two\t/b\th\t70"));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].display, "One");
    }

    #[test]
    fn short_lines_pad_with_empty_fields() {
        let entries = parse_menu(&lines("iJust a comment"));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].item_type, 'i');
        assert_eq!(entries[0].display, "Just a comment");
        assert_eq!(entries[0].selector, "");
        assert_eq!(entries[0].host, "");
        assert_eq!(entries[0].port, 70);
        assert!(!entries[0].is_selectable());
    }

    #[test]
    fn unparsable_port_defaults() {
        let entries = parse_menu(&lines("1X\t/x\thost\tnot-a-port"));
        assert_eq!(entries[0].port, 70);
    }

    #[test]
    fn empty_lines_are_skipped() {
        let entries = parse_menu(&lines("1A\t/a\th\t70\n\n1B\t/b\th\t70"));
        assert_eq!(entries.len(), 2);
    }
}
