use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// `-p`: preview card only.
    Picture,
    /// `-t`: text summary only.
    Text,
    /// Text summary followed by the preview card.
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCommand {
    pub mode: SearchMode,
    pub keyword: String,
}

fn command_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^#github\s(-.{1,10}? )?(.*)$").expect("search command pattern is valid")
    })
}

/// Recognize `#github [-p|-t] <keyword>`. Anything else is not a command.
pub fn parse_command(message: &str) -> Option<SearchCommand> {
    let captures = command_pattern().captures(message)?;
    let flag = captures.get(1).map(|m| m.as_str().trim()).unwrap_or("");
    let keyword = captures.get(2).map(|m| m.as_str().trim()).unwrap_or("");

    let mode = match flag {
        "-p" => SearchMode::Picture,
        "-t" => SearchMode::Text,
        _ => SearchMode::Full,
    };
    Some(SearchCommand {
        mode,
        keyword: keyword.to_string(),
    })
}
