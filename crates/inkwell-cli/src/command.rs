//! Input line parsing.
//!
//! Lines starting with `/` are commands; anything else is a chat message.

use inkwell_app::SessionEvent;

/// Help text for the slash commands.
pub const HELP: &str = "\
Commands:
  /reconnect   connect again (after giving up or /disconnect)
  /disconnect  close the connection
  /quit        leave
  /help        show this help
Anything else is sent to the assistant.";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Forward to the session.
    Session(SessionEvent),
    /// Print [`HELP`].
    Help,
    /// Slash command nobody knows.
    Unknown(String),
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Some(name) = trimmed.strip_prefix('/') else {
        return Some(Command::Session(SessionEvent::Submit { text: line.to_string() }));
    };

    let command = match name {
        "reconnect" | "connect" => Command::Session(SessionEvent::Mount),
        "disconnect" => Command::Session(SessionEvent::Unmount),
        "quit" | "exit" => Command::Session(SessionEvent::Quit),
        "help" | "?" => Command::Help,
        other => Command::Unknown(other.to_string()),
    };
    Some(command)
}
