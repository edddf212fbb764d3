use crate::menu::MenuKey;

pub const HISTORY_KEYWORD: &str = "history";
pub const COPY_KEYWORD: &str = "cp";

pub const HISTORY_USAGE: &str =
    "Invalid history command. Use 'history', 'history search <term>', or 'history <index>'.";

/// One line typed at the `heycli>` prompt, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    History(HistoryCommand),
    Menu(MenuKey),
    Copy,
    Query(String),
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryCommand {
    List,
    Search(String),
    Recall(usize),
    /// Recall of an index too large to represent
    InvalidIndex,
    Usage,
}

/// Classify a raw input line.
///
/// `history` must be the first word (any case); `cp` and menu keys must be
/// the whole line (any case). Everything else is a query, passed on trimmed.
pub fn classify(raw: &str) -> Input {
    let input = raw.trim();
    if input.is_empty() {
        return Input::Empty;
    }

    let mut words = input.split_whitespace();
    if words
        .next()
        .is_some_and(|first| first.eq_ignore_ascii_case(HISTORY_KEYWORD))
    {
        return Input::History(parse_history_args(words.collect()));
    }

    if input.eq_ignore_ascii_case(COPY_KEYWORD) {
        return Input::Copy;
    }

    if let Some(key) = MenuKey::parse(input) {
        return Input::Menu(key);
    }

    Input::Query(input.to_string())
}

fn parse_history_args(args: Vec<&str>) -> HistoryCommand {
    match args.as_slice() {
        [] => HistoryCommand::List,
        ["search", terms @ ..] if !terms.is_empty() => HistoryCommand::Search(terms.join(" ")),
        [index] if index.chars().all(|c| c.is_ascii_digit()) => index
            .parse()
            .map(HistoryCommand::Recall)
            .unwrap_or(HistoryCommand::InvalidIndex),
        _ => HistoryCommand::Usage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_variants() {
        assert_eq!(classify("history"), Input::History(HistoryCommand::List));
        assert_eq!(classify("  HISTORY  "), Input::History(HistoryCommand::List));
        assert_eq!(
            classify("history search disk   space"),
            Input::History(HistoryCommand::Search("disk space".to_string()))
        );
        assert_eq!(classify("history 12"), Input::History(HistoryCommand::Recall(12)));
    }

    #[test]
    fn test_history_usage_errors() {
        assert_eq!(classify("history search"), Input::History(HistoryCommand::Usage));
        assert_eq!(classify("history -1"), Input::History(HistoryCommand::Usage));
        assert_eq!(classify("history foo"), Input::History(HistoryCommand::Usage));
        assert_eq!(classify("history 1 2"), Input::History(HistoryCommand::Usage));
        assert_eq!(
            classify("history 99999999999999999999999"),
            Input::History(HistoryCommand::InvalidIndex)
        );
    }

    #[test]
    fn test_history_must_be_whole_first_word() {
        assert_eq!(
            classify("historical unix commands"),
            Input::Query("historical unix commands".to_string())
        );
    }

    #[test]
    fn test_copy_keyword() {
        assert_eq!(classify("cp"), Input::Copy);
        assert_eq!(classify("CP "), Input::Copy);
        assert_eq!(
            classify("cp a file to another dir"),
            Input::Query("cp a file to another dir".to_string())
        );
    }

    #[test]
    fn test_menu_keys() {
        assert!(matches!(classify("m"), Input::Menu(key) if key.key() == 'm'));
        assert!(matches!(classify("Q"), Input::Menu(key) if key.key() == 'q'));
        assert!(matches!(classify("4"), Input::Menu(key) if key.key() == '4'));
        assert_eq!(classify("9"), Input::Query("9".to_string()));
    }

    #[test]
    fn test_empty_and_query() {
        assert_eq!(classify(""), Input::Empty);
        assert_eq!(classify("   \t"), Input::Empty);
        assert_eq!(
            classify("  how do I find large files?  "),
            Input::Query("how do I find large files?".to_string())
        );
    }
}
