/// In-band commands accepted at the guess prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Commands,
    Players,
    Hint,
    Exit,
}

impl Command {
    pub const ALL: [Command; 4] = [Command::Hint, Command::Exit, Command::Players, Command::Commands];

    pub fn text(self) -> &'static str {
        match self {
            Self::Commands => "/commands",
            Self::Players => "/players",
            Self::Hint => "/hint",
            Self::Exit => "/exit",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Commands => "list these commands",
            Self::Players => "show every player's score",
            Self::Hint => "reveal one letter (costs attempts or points)",
            Self::Exit => "leave the game",
        }
    }

    fn from_text(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cmd| cmd.text() == text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedInput {
    Command(Command),
    Guess(char),
    /// Neither a command nor a single letter. Re-prompt, no attempt lost.
    Invalid(String),
}

/// Classify normalized (trimmed, lowercased) guess-prompt input.
pub fn interpret(input: &str) -> ParsedInput {
    if let Some(command) = Command::from_text(input) {
        return ParsedInput::Command(command);
    }
    let mut chars = input.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) if letter.is_alphabetic() => ParsedInput::Guess(letter),
        _ => ParsedInput::Invalid(input.to_string()),
    }
}
