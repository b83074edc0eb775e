/// A line typed at the dashboard prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Replace the search text; empty clears it.
    Search(String),
    /// Open the email at a 1-based position in the visible list.
    Open(usize),
    Back,
    Retry,
    Live(bool),
    Help,
    Quit,
    /// Blank line, just redraw.
    Redraw,
}

pub const HELP: &str = "commands: /<text> or search <text>, open <n> (or just <n>), back, retry, live on|off, help, quit";

pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Redraw);
    }
    if let Some(query) = line.strip_prefix('/') {
        return Ok(Command::Search(query.trim().to_string()));
    }
    if let Ok(number) = line.parse::<usize>() {
        return open(number);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    match word.to_ascii_lowercase().as_str() {
        "search" | "s" => Ok(Command::Search(rest.to_string())),
        "open" | "o" => {
            let number = rest
                .parse::<usize>()
                .map_err(|_| format!("`open` needs a row number, got `{rest}`"))?;
            open(number)
        }
        "back" | "close" | "b" => Ok(Command::Back),
        "retry" | "refresh" | "r" => Ok(Command::Retry),
        "live" => match rest {
            "on" => Ok(Command::Live(true)),
            "off" => Ok(Command::Live(false)),
            other => Err(format!("`live` takes on or off, got `{other}`")),
        },
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(format!("unknown command `{other}`, type `help`")),
    }
}

fn open(number: usize) -> Result<Command, String> {
    if number == 0 {
        return Err("rows are numbered from 1".to_string());
    }
    Ok(Command::Open(number))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_search_forms() {
        assert_eq!(parse("/ invoice "), Ok(Command::Search("invoice".to_string())));
        assert_eq!(parse("search Team Lunch"), Ok(Command::Search("Team Lunch".to_string())));
        assert_eq!(parse("search"), Ok(Command::Search(String::new())));
    }

    #[test]
    fn parses_row_selection() {
        assert_eq!(parse("3"), Ok(Command::Open(3)));
        assert_eq!(parse("open 12"), Ok(Command::Open(12)));
        assert!(parse("open").is_err());
        assert!(parse("0").is_err());
    }

    #[test]
    fn parses_simple_commands() {
        assert_eq!(parse(""), Ok(Command::Redraw));
        assert_eq!(parse("BACK"), Ok(Command::Back));
        assert_eq!(parse("retry"), Ok(Command::Retry));
        assert_eq!(parse("live off"), Ok(Command::Live(false)));
        assert_eq!(parse("q"), Ok(Command::Quit));
        assert!(parse("live maybe").is_err());
        assert!(parse("frobnicate").is_err());
    }
}
