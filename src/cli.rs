use crate::command::Command;
use crate::debug_log;
use crate::ledger::PlayerLedger;
use crate::round::{Difficulty, GuessOutcome, HintOutcome, RoundState};
use crate::session::{GameInterface, SessionConfig, SessionOutcome, SessionReport, SessionState};
use crate::timer::{TimedInput, TimedRead};
use crate::wordbank::LineIssue;
use clap::Parser;
use crossterm::{
    cursor, queue,
    style::{Color, Print, Stylize, style},
    terminal::{Clear, ClearType},
};
use std::fmt::Display;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const BANNER_WIDTH: usize = 20;

/// Guess-the-word: a timed hangman game with persistent scores
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Word data file, one `category: word, word, ...` per line (built-in words if omitted)
    #[arg(short = 'w', long = "words")]
    pub words_path: Option<PathBuf>,

    /// Player score file, one `name: score` per line
    #[arg(short = 'p', long = "players", default_value = "playersdata.txt")]
    pub players_path: PathBuf,

    /// Seconds allowed for each guess
    #[arg(
        short = 't',
        long = "timeout",
        default_value_t = 15,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Seed for word selection and hints, for a repeatable game
    #[arg(long)]
    pub seed: Option<u64>,

    /// Plain output without colors
    #[arg(long)]
    pub no_color: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            guess_timeout_secs: self.timeout_secs,
            ..SessionConfig::default()
        }
    }
}

#[must_use]
pub fn parse_cli() -> Cli {
    Cli::parse()
}

fn render_countdown<W: Write>(out: &mut W, seconds_left: u64) -> io::Result<()> {
    queue!(
        out,
        cursor::MoveToColumn(0),
        Clear(ClearType::CurrentLine),
        Print(format!(
            "You have {seconds_left} seconds left to guess... Enter the letter: "
        ))
    )?;
    out.flush()
}

fn format_duration(duration: chrono::TimeDelta) -> String {
    let secs = duration.num_seconds().max(0);
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Console implementation of [`GameInterface`]: line prompts on `W`, input
/// through a [`TimedInput`].
pub struct ConsoleInterface<W: Write> {
    input: TimedInput,
    out: W,
    color: bool,
}

impl<W: Write> ConsoleInterface<W> {
    pub fn new(input: TimedInput, out: W) -> Self {
        Self {
            input,
            out,
            color: true,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn into_output(self) -> W {
        self.out
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            style(text).with(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn say(&mut self, text: impl Display) {
        if let Err(e) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            debug_log!("say() - write failed: {}", e);
        }
    }

    pub fn display_load_error(&mut self, what: &str, path: &Path, error: &io::Error) {
        log::warn!("could not read {what} from {}: {error}", path.display());
        let text = format!("Error: the {what} file '{}' could not be read: {error}", path.display());
        let painted = self.paint(&text, Color::Red);
        self.say(painted);
    }

    pub fn display_load_issues(&mut self, what: &str, issues: &[LineIssue]) {
        for issue in issues {
            log::warn!("{what}: {issue}");
            let painted = self.paint(&format!("Skipped in {what}: {issue}"), Color::Yellow);
            self.say(painted);
        }
    }

    pub fn display_data_loaded(&mut self, categories: usize, words: usize, players: usize) {
        self.say(format!(
            "Game data loaded successfully ({words} words in {categories} categories)."
        ));
        self.say(format!(
            "Players data loaded successfully ({players} players).\nYou can start playing the game.\n"
        ));
    }
}

impl<W: Write> GameInterface for ConsoleInterface<W> {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        if let Err(e) = write!(self.out, "{prompt}").and_then(|()| self.out.flush()) {
            debug_log!("read_line() - prompt write failed: {}", e);
        }
        self.input.read_line()
    }

    fn read_guess(&mut self, timeout_secs: u64) -> TimedRead {
        let out = &mut self.out;
        self.input.read_with_timeout(timeout_secs, |seconds_left| {
            if let Err(e) = render_countdown(out, seconds_left) {
                debug_log!("read_guess() - countdown render failed: {}", e);
            }
        })
    }

    fn display_welcome(&mut self, player: &str, score: u32, is_new: bool, config: &SessionConfig) {
        if is_new {
            self.say(format!("Welcome, *{player}* You are a new player."));
            self.say(format!("Your current score is: '{score}' pts."));
        } else {
            self.say(format!(
                "Welcome back, *{player}* Your current score is: '{score}' pts."
            ));
        }
        self.say(format!(
            "\nThe attempts will be reset after a right guess.\n\
             The game ends if you run out of attempts, or you win with more than {} pts.\n\
             Each solved word is worth {} pts. You have {} seconds per guess; type /commands for help.\n",
            config.win_score, config.word_reward, config.guess_timeout_secs
        ));
    }

    fn display_difficulty(&mut self, difficulty: Difficulty, attempts: u32, defaulted: bool) {
        if defaulted {
            let painted = self.paint(
                &format!("Invalid difficulty level! Defaulting to '{difficulty}'."),
                Color::Yellow,
            );
            self.say(painted);
        }
        self.say(format!("You have '{attempts}' attempts to guess the word."));
    }

    fn display_category(&mut self, category: &str) {
        let rule = "=".repeat(BANNER_WIDTH);
        self.say(format!(
            "\nThe category chosen for you is:\n{rule}\n*{category}*\n{rule}"
        ));
    }

    fn display_category_exhausted(&mut self, category: &str) {
        self.say(format!(
            "All words in the category '{category}' have been guessed!"
        ));
    }

    fn display_board(&mut self, round: &RoundState) {
        self.say(format!("The word is: {}", round.masked()));
    }

    fn display_guess_outcome(&mut self, outcome: &GuessOutcome, round: &RoundState, state: &SessionState) {
        match outcome {
            GuessOutcome::AlreadyGuessed => {
                let letters: Vec<String> = round
                    .guessed_letters()
                    .iter()
                    .map(char::to_string)
                    .collect();
                self.say(format!(
                    "You already guessed that letter! Guessed letters: {}",
                    letters.join(", ")
                ));
            }
            GuessOutcome::Correct(_) => {
                let painted = self.paint(&format!("The word now is: {}", round.masked()), Color::Green);
                self.say(format!("{painted}\n"));
            }
            GuessOutcome::Incorrect => {
                let painted = self.paint(
                    &format!("Wrong guess! You have {} attempts left.", state.attempts_remaining),
                    Color::Red,
                );
                self.say(format!("{painted}\n"));
            }
            GuessOutcome::RoundWon | GuessOutcome::RoundLost => {}
        }
    }

    fn display_hint_outcome(&mut self, outcome: &HintOutcome, round: &RoundState, state: &SessionState) {
        let message = match outcome {
            HintOutcome::AttemptsDeducted { .. } => format!(
                "Hint used! You have '{}' attempts left.",
                state.attempts_remaining
            ),
            HintOutcome::ScorePenalized { amount, .. } => format!(
                "Hint used! You lost {amount} points. Your score is now '{}' points.",
                state.score
            ),
            HintOutcome::Unavailable => {
                self.say("You don't have enough attempts or points to use a hint.");
                return;
            }
            HintOutcome::NothingToReveal => {
                self.say("Every letter is already showing, so no hint was used.");
                return;
            }
        };
        let painted = self.paint(&message, Color::Yellow);
        self.say(painted);
        self.say(format!("Hint: The word now is {}\n", round.masked()));
    }

    fn display_timeout(&mut self, attempts_left: u32) {
        let painted = self.paint("Time is up! You lost an attempt.", Color::Red);
        self.say(format!("\n{painted}"));
        self.say(format!("You have {attempts_left} attempts left.\n"));
    }

    fn display_invalid_input(&mut self, _input: &str) {
        self.say("Invalid input! Please enter a single alphabetic letter.\n");
    }

    fn display_commands(&mut self, commands: &[Command]) {
        self.say("Available commands:");
        for command in commands {
            self.say(format!("  {:<10} {}", command.text(), command.description()));
        }
    }

    fn display_players(&mut self, ledger: &PlayerLedger) {
        self.say("The players and their scores are:");
        for (name, score) in ledger.iter() {
            self.say(format!("{name}: {score} pts"));
        }
    }

    fn display_round_won(&mut self, word: &str, state: &SessionState) {
        let painted = self.paint(
            &format!(
                "Congratulations *{}* You guessed right, The word is: '{word}', \
                 Your score now is: '{}' pts, You have '{}' attempts now.",
                state.player_name, state.score, state.attempts_remaining
            ),
            Color::Green,
        );
        self.say(painted);
    }

    fn display_round_lost(&mut self, word: &str, state: &SessionState) {
        let painted = self.paint(&format!("Game over! The word was: '{word}'."), Color::Red);
        self.say(painted);
        self.say(format!("Game over! Your score is {} pts.", state.score));
    }

    fn display_save_failure(&mut self, error: &io::Error) {
        let painted = self.paint(&format!("Could not save player scores: {error}"), Color::Red);
        self.say(painted);
    }

    fn display_report(&mut self, report: &SessionReport) {
        match report.outcome {
            SessionOutcome::Won => {
                let painted = self.paint(
                    &format!(
                        "*Congratulations *{}*, You have won the game with a score of '{}' pts.*",
                        report.player_name, report.score
                    ),
                    Color::Green,
                );
                self.say(painted);
            }
            SessionOutcome::Lost => {}
            SessionOutcome::Exited => self.say("Exiting the game."),
            SessionOutcome::Exhausted => self.say("No words remain, ending session."),
        }
        self.say(format!(
            "Words solved: {} | Final score: {} pts | Played {} (started {})",
            report.words_solved,
            report.score,
            format_duration(report.duration),
            report.started_at.format("%H:%M")
        ));
        self.say("Thank you for playing!");
    }
}
