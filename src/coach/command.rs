//! Parsing of inbound text into the closed command set.

/// The commands the coach understands. Adding one is a compile-time change:
/// the dispatch match is exhaustive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Ping,
    /// `/log <text>`; the argument is the remaining tokens whitespace-joined
    /// and may be empty.
    Log(String),
    Status,
}

impl Command {
    /// Parse a raw message. `None` means the fallback reply: plain text
    /// without the `/` prefix, a bare `/`, or an unknown command word.
    ///
    /// The command word is case-sensitive. A trailing `@botname` mention
    /// (the group-chat form) is stripped before matching.
    pub fn parse(text: &str) -> Option<Command> {
        let trimmed = text.trim();
        if !trimmed.starts_with('/') {
            return None;
        }
        let mut tokens = trimmed.split_whitespace();
        let head = tokens.next()?;
        let name = head[1..].split('@').next().unwrap_or("");
        let argument = tokens.collect::<Vec<_>>().join(" ");

        match name {
            "start" => Some(Command::Start),
            "ping" => Some(Command::Ping),
            "log" => Some(Command::Log(argument)),
            "status" => Some(Command::Status),
            _ => None,
        }
    }
}
