//! Operator input parsing.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentCommand {
    Open(String),
    List(String),
    Attach(PathBuf),
    Discard,
    Typing,
    /// Send the text together with any staged attachment. `/send` with no
    /// text sends just the attachment.
    Send(Option<String>),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    MissingArgument(&'static str),
    UnknownCommand(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingArgument(cmd) => write!(f, "/{cmd} needs an argument"),
            Self::UnknownCommand(cmd) => write!(f, "Unknown command: /{cmd} (try /help)"),
        }
    }
}

/// Parse one line of input. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<AgentCommand>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(AgentCommand::Send(Some(line.to_string()))));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let command = match name {
        "open" if arg.is_empty() => return Err(ParseError::MissingArgument("open")),
        "open" => AgentCommand::Open(arg.to_string()),
        "list" => AgentCommand::List(arg.to_string()),
        "attach" if arg.is_empty() => return Err(ParseError::MissingArgument("attach")),
        "attach" => AgentCommand::Attach(PathBuf::from(arg)),
        "discard" => AgentCommand::Discard,
        "typing" => AgentCommand::Typing,
        "send" => AgentCommand::Send((!arg.is_empty()).then(|| arg.to_string())),
        "help" => AgentCommand::Help,
        "quit" | "exit" => AgentCommand::Quit,
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(Some(command))
}

pub const HELP: &str = "\
/open <id>      open a conversation
/list [term]    list conversations, optionally filtered
/attach <path>  stage a file for the next send
/discard        drop the staged file
/send [text]    send text and/or the staged file
/typing         tell the customer you are typing
/quit           exit
anything else   send as a message";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_send() {
        assert_eq!(
            parse_line("  hello there "),
            Ok(Some(AgentCommand::Send(Some("hello there".into()))))
        );
        assert_eq!(parse_line("   "), Ok(None));
    }

    #[test]
    fn parses_slash_commands() {
        assert_eq!(parse_line("/open t-42"), Ok(Some(AgentCommand::Open("t-42".into()))));
        assert_eq!(parse_line("/list"), Ok(Some(AgentCommand::List(String::new()))));
        assert_eq!(parse_line("/list  ana "), Ok(Some(AgentCommand::List("ana".into()))));
        assert_eq!(
            parse_line("/attach /tmp/receipt scan.pdf"),
            Ok(Some(AgentCommand::Attach("/tmp/receipt scan.pdf".into())))
        );
        assert_eq!(parse_line("/send"), Ok(Some(AgentCommand::Send(None))));
        assert_eq!(parse_line("/exit"), Ok(Some(AgentCommand::Quit)));
    }

    #[test]
    fn rejects_bad_commands() {
        assert_eq!(parse_line("/open"), Err(ParseError::MissingArgument("open")));
        assert_eq!(
            parse_line("/frobnicate now"),
            Err(ParseError::UnknownCommand("frobnicate".into()))
        );
    }
}
