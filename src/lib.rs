// Library interface for guess-the-word
// The binary is a thin shell; integration tests drive these modules directly.

pub mod cli;
pub mod command;
pub mod ledger;
pub mod logging;
pub mod round;
pub mod session;
pub mod timer;
pub mod wordbank;

pub use command::{Command, ParsedInput, interpret};
pub use ledger::{
    FileStore, PlayerLedger, ScoreStore, load_ledger_from_file, load_ledger_from_str,
    save_ledger_to_file,
};
pub use round::{Difficulty, GuessOutcome, HintOutcome, RoundStart, RoundState, start_round};
pub use session::{
    GameInterface, Session, SessionConfig, SessionOutcome, SessionReport, SessionState,
    StartupError,
};
pub use timer::{TimedInput, TimedRead};
pub use wordbank::{EMBEDDED_GAMEDATA, LineIssue, WordBank, load_wordbank_from_file, load_wordbank_from_str};
