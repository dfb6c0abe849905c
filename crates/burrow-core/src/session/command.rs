//! The one-line command surface.
//!
//! Commands arrive as short free-text messages; the leading token is
//! case-insensitive. Anything unrecognized (including `h`, `help`, or a
//! blank line) yields the static help text.

/// A parsed inbound command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `u <url>`: open a gopher URL.
    Open(String),
    /// `n`: next page.
    Next,
    /// `p`: previous page.
    Prev,
    /// `b`: back / up a directory.
    Back,
    /// `x`: show the current URL.
    ShowUrl,
    /// `s <terms>`: run the pending search.
    Search(String),
    /// A bare digit: select that item on the current page.
    Select(usize),
    /// Everything else.
    Help,
}

/// Static help/overview text.
pub const HELP_TEXT: &str = "\
Gopher DM Navigator
Commands:
  u <URL>    open gopher URL (e.g., gopher://gopher.floodgap.com/1/world)
  n / p      next / previous page
  b          back / up directory
  x          show current URL
  0..9       select item (menus only)
  s <terms>  run search after selecting a type-7 item";

impl Command {
    /// Parse one command line.
    pub fn parse(line: &str) -> Command {
        let trimmed = line.trim();
        let mut parts = trimmed.splitn(2, char::is_whitespace);
        let head = parts.next().unwrap_or("").to_ascii_lowercase();
        let rest = parts.next().unwrap_or("").trim();

        match head.as_str() {
            "u" => {
                // Exactly one URL argument; anything else is not an
                // open command.
                let mut args = rest.split_whitespace();
                match (args.next(), args.next()) {
                    (Some(url), None) => Command::Open(url.to_string()),
                    _ => Command::Help,
                }
            }
            "n" if rest.is_empty() => Command::Next,
            "p" if rest.is_empty() => Command::Prev,
            "b" if rest.is_empty() => Command::Back,
            "x" if rest.is_empty() => Command::ShowUrl,
            "s" => Command::Search(rest.to_string()),
            d if d.len() == 1 && d.chars().all(|c| c.is_ascii_digit()) && rest.is_empty() => {
                Command::Select(d.parse().unwrap_or(0))
            }
            _ => Command::Help,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_takes_one_url() {
        assert_eq!(
            Command::parse("u gopher://x.org/"),
            Command::Open("gopher://x.org/".to_string())
        );
        assert_eq!(
            Command::parse("  U   gopher://x.org/  "),
            Command::Open("gopher://x.org/".to_string())
        );
        assert_eq!(Command::parse("u"), Command::Help);
        assert_eq!(Command::parse("u one two"), Command::Help);
    }

    #[test]
    fn single_letters_are_case_insensitive() {
        assert_eq!(Command::parse("n"), Command::Next);
        assert_eq!(Command::parse("P"), Command::Prev);
        assert_eq!(Command::parse("b"), Command::Back);
        assert_eq!(Command::parse("X"), Command::ShowUrl);
    }

    #[test]
    fn search_keeps_terms_verbatim() {
        assert_eq!(
            Command::parse("s title=Dune author=Herbert"),
            Command::Search("title=Dune author=Herbert".to_string())
        );
        assert_eq!(Command::parse("s"), Command::Search(String::new()));
    }

    #[test]
    fn bare_digits_select() {
        assert_eq!(Command::parse("0"), Command::Select(0));
        assert_eq!(Command::parse("9"), Command::Select(9));
        // Multi-digit input is not a selection.
        assert_eq!(Command::parse("12"), Command::Help);
        assert_eq!(Command::parse("3 x"), Command::Help);
    }

    #[test]
    fn anything_else_is_help() {
        assert_eq!(Command::parse(""), Command::Help);
        assert_eq!(Command::parse("help"), Command::Help);
        assert_eq!(Command::parse("open gopher://x"), Command::Help);
    }
}
