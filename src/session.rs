use crate::command::{Command, ParsedInput, interpret};
use crate::ledger::{PlayerLedger, ScoreStore};
use crate::round::{Difficulty, GuessOutcome, HintOutcome, RoundStart, RoundState, start_round};
use crate::timer::TimedRead;
use crate::wordbank::WordBank;
use crate::{debug_log, info_log};
use chrono::{DateTime, Local, TimeDelta};
use rand::Rng;
use std::collections::HashSet;
use std::fmt;
use std::io;

/// Tunable numbers of a session. Attempt counts live on [`Difficulty`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub guess_timeout_secs: u64,
    /// The session is won once the score goes strictly above this.
    pub win_score: u32,
    pub word_reward: u32,
    pub hint_score_cost: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            guess_timeout_secs: 15,
            win_score: 200,
            word_reward: 12,
            hint_score_cost: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub player_name: String,
    pub score: u32,
    pub difficulty: Difficulty,
    pub initial_attempts: u32,
    pub attempts_remaining: u32,
    /// Solved words; never drawn again this session.
    pub used_words: HashSet<String>,
}

impl SessionState {
    pub fn new(player_name: impl Into<String>, score: u32, difficulty: Difficulty) -> Self {
        let initial_attempts = difficulty.initial_attempts();
        Self {
            player_name: player_name.into(),
            score,
            difficulty,
            initial_attempts,
            attempts_remaining: initial_attempts,
            used_words: HashSet::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Won,
    Lost,
    Exited,
    /// Every word in the bank has been solved.
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct SessionReport {
    pub player_name: String,
    pub outcome: SessionOutcome,
    pub score: u32,
    pub words_solved: usize,
    pub started_at: DateTime<Local>,
    pub duration: TimeDelta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupError {
    NoWords,
    NoPlayers,
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoWords => f.write_str("no game data available"),
            Self::NoPlayers => f.write_str("no players data available"),
        }
    }
}

impl std::error::Error for StartupError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoundEnd {
    Won,
    Lost,
    Exited,
}

/// Everything the session needs from the player and the screen.
pub trait GameInterface {
    /// Untimed prompt. `None` when input is closed.
    fn read_line(&mut self, prompt: &str) -> Option<String>;
    /// Timed guess prompt; renders its own countdown.
    fn read_guess(&mut self, timeout_secs: u64) -> TimedRead;

    fn display_welcome(&mut self, player: &str, score: u32, is_new: bool, config: &SessionConfig);
    fn display_difficulty(&mut self, difficulty: Difficulty, attempts: u32, defaulted: bool);
    fn display_category(&mut self, category: &str);
    fn display_category_exhausted(&mut self, category: &str);
    fn display_board(&mut self, round: &RoundState);
    fn display_guess_outcome(&mut self, outcome: &GuessOutcome, round: &RoundState, state: &SessionState);
    fn display_hint_outcome(&mut self, outcome: &HintOutcome, round: &RoundState, state: &SessionState);
    fn display_timeout(&mut self, attempts_left: u32);
    fn display_invalid_input(&mut self, input: &str);
    fn display_commands(&mut self, commands: &[Command]);
    fn display_players(&mut self, ledger: &PlayerLedger);
    fn display_round_won(&mut self, word: &str, state: &SessionState);
    fn display_round_lost(&mut self, word: &str, state: &SessionState);
    fn display_save_failure(&mut self, error: &io::Error);
    fn display_report(&mut self, report: &SessionReport);
}

/// Cross-round controller. Owns the loaded data for the length of one
/// session; the ledger changes only through `record_score`.
pub struct Session<S: ScoreStore> {
    wordbank: WordBank,
    ledger: PlayerLedger,
    store: S,
    config: SessionConfig,
}

impl<S: ScoreStore> Session<S> {
    pub fn new(
        wordbank: WordBank,
        ledger: PlayerLedger,
        store: S,
        config: SessionConfig,
    ) -> Result<Self, StartupError> {
        if wordbank.is_empty() {
            return Err(StartupError::NoWords);
        }
        if ledger.is_empty() {
            return Err(StartupError::NoPlayers);
        }
        Ok(Self {
            wordbank,
            ledger,
            store,
            config,
        })
    }

    pub fn ledger(&self) -> &PlayerLedger {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn run<I: GameInterface, R: Rng + ?Sized>(&mut self, ui: &mut I, rng: &mut R) -> SessionReport {
        let started_at = Local::now();

        let Some(player_name) = prompt_player_name(ui) else {
            return self.finish(ui, String::new(), 0, 0, SessionOutcome::Exited, started_at);
        };
        let (score, is_new) = self.ledger.get_or_create(&player_name);
        info_log!("Session::run() - player '{}' (new: {}) score {}", player_name, is_new, score);
        ui.display_welcome(&player_name, score, is_new, &self.config);

        let Some((difficulty, defaulted)) = prompt_difficulty(ui) else {
            return self.finish(ui, player_name, score, 0, SessionOutcome::Exited, started_at);
        };
        let mut state = SessionState::new(player_name, score, difficulty);
        ui.display_difficulty(difficulty, state.initial_attempts, defaulted);

        let outcome = self.play(&mut state, ui, rng);
        let words_solved = state.used_words.len();
        self.finish(ui, state.player_name, state.score, words_solved, outcome, started_at)
    }

    fn play<I: GameInterface, R: Rng + ?Sized>(
        &mut self,
        state: &mut SessionState,
        ui: &mut I,
        rng: &mut R,
    ) -> SessionOutcome {
        let mut reported_exhausted = HashSet::new();
        loop {
            let mut round = match start_round(&self.wordbank, &state.used_words, rng) {
                RoundStart::Ready(round) => round,
                RoundStart::CategoryExhausted(category) => {
                    if reported_exhausted.insert(category.clone()) {
                        ui.display_category_exhausted(&category);
                    }
                    continue;
                }
                RoundStart::AllExhausted => return SessionOutcome::Exhausted,
            };
            ui.display_category(round.category());
            ui.display_board(&round);

            let end = self.play_round(&mut round, state, ui, rng);
            debug_log!("Session::play() - round '{}' ended {:?}", round.word(), end);
            match end {
                RoundEnd::Won => {
                    state.score += self.config.word_reward;
                    state.attempts_remaining = state.initial_attempts;
                    state.used_words.insert(round.word());
                    ui.display_round_won(&round.word(), state);
                }
                RoundEnd::Lost => ui.display_round_lost(&round.word(), state),
                RoundEnd::Exited => {}
            }
            self.record_score(state, ui);

            match end {
                RoundEnd::Lost => return SessionOutcome::Lost,
                RoundEnd::Exited => return SessionOutcome::Exited,
                RoundEnd::Won if state.score > self.config.win_score => return SessionOutcome::Won,
                RoundEnd::Won => {}
            }
        }
    }

    fn play_round<I: GameInterface, R: Rng + ?Sized>(
        &mut self,
        round: &mut RoundState,
        state: &mut SessionState,
        ui: &mut I,
        rng: &mut R,
    ) -> RoundEnd {
        loop {
            let input = match ui.read_guess(self.config.guess_timeout_secs) {
                TimedRead::Input(input) => input,
                TimedRead::Timeout => {
                    let outcome = round.apply_timeout(state);
                    ui.display_timeout(state.attempts_remaining);
                    if outcome == GuessOutcome::RoundLost {
                        return RoundEnd::Lost;
                    }
                    continue;
                }
                TimedRead::Closed => return RoundEnd::Exited,
            };

            match interpret(&input) {
                ParsedInput::Command(Command::Commands) => ui.display_commands(&Command::ALL),
                ParsedInput::Command(Command::Players) => {
                    self.ledger.set_score(&state.player_name, state.score);
                    ui.display_players(&self.ledger);
                }
                ParsedInput::Command(Command::Hint) => {
                    let outcome = round.apply_hint(state, self.config.hint_score_cost, rng);
                    ui.display_hint_outcome(&outcome, round, state);
                    if round.is_solved() {
                        return RoundEnd::Won;
                    }
                }
                ParsedInput::Command(Command::Exit) => return RoundEnd::Exited,
                ParsedInput::Invalid(text) => ui.display_invalid_input(&text),
                ParsedInput::Guess(letter) => match round.apply_guess(letter, state) {
                    GuessOutcome::RoundWon => return RoundEnd::Won,
                    GuessOutcome::RoundLost => return RoundEnd::Lost,
                    outcome => ui.display_guess_outcome(&outcome, round, state),
                },
            }
        }
    }

    /// Write the player's current score into the ledger and persist all of
    /// it. A failed write is reported; the in-memory ledger keeps the score.
    fn record_score<I: GameInterface>(&mut self, state: &SessionState, ui: &mut I) {
        self.ledger.set_score(&state.player_name, state.score);
        if let Err(e) = self.store.save(&self.ledger) {
            log::warn!("saving player ledger failed: {e}");
            ui.display_save_failure(&e);
        }
    }

    fn finish<I: GameInterface>(
        &self,
        ui: &mut I,
        player_name: String,
        score: u32,
        words_solved: usize,
        outcome: SessionOutcome,
        started_at: DateTime<Local>,
    ) -> SessionReport {
        let report = SessionReport {
            player_name,
            outcome,
            score,
            words_solved,
            started_at,
            duration: Local::now() - started_at,
        };
        info_log!("Session::finish() - {:?} with score {}", report.outcome, report.score);
        ui.display_report(&report);
        report
    }
}

fn prompt_player_name<I: GameInterface>(ui: &mut I) -> Option<String> {
    loop {
        let name = ui.read_line("Enter your name: ")?;
        if !name.is_empty() {
            return Some(name);
        }
    }
}

/// Unknown answers fall back to medium; the flag says whether that happened.
fn prompt_difficulty<I: GameInterface>(ui: &mut I) -> Option<(Difficulty, bool)> {
    let answer = ui.read_line("Choose difficulty level (easy--medium--hard): ")?;
    Some(match Difficulty::parse(&answer) {
        Some(difficulty) => (difficulty, false),
        None => (Difficulty::default(), true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryStore;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::VecDeque;

    enum Step {
        Line(&'static str),
        Guess(TimedRead),
    }

    fn line(text: &'static str) -> Step {
        Step::Line(text)
    }

    fn guess(text: &str) -> Step {
        Step::Guess(TimedRead::Input(text.to_string()))
    }

    fn timeout() -> Step {
        Step::Guess(TimedRead::Timeout)
    }

    /// Replays scripted input and records what the session showed.
    struct ScriptedInterface {
        steps: VecDeque<Step>,
        shown: Vec<String>,
    }

    impl ScriptedInterface {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: steps.into(),
                shown: Vec::new(),
            }
        }

        fn saw(&self, prefix: &str) -> bool {
            self.shown.iter().any(|entry| entry.starts_with(prefix))
        }
    }

    impl GameInterface for ScriptedInterface {
        fn read_line(&mut self, _prompt: &str) -> Option<String> {
            match self.steps.pop_front() {
                Some(Step::Line(text)) => Some(text.to_string()),
                Some(Step::Guess(_)) => panic!("expected a line prompt"),
                None => None,
            }
        }

        fn read_guess(&mut self, _timeout_secs: u64) -> TimedRead {
            match self.steps.pop_front() {
                Some(Step::Guess(read)) => read,
                Some(Step::Line(_)) => panic!("expected a guess prompt"),
                None => TimedRead::Closed,
            }
        }

        fn display_welcome(&mut self, player: &str, score: u32, is_new: bool, _config: &SessionConfig) {
            self.shown.push(format!("welcome:{player}:{score}:{is_new}"));
        }

        fn display_difficulty(&mut self, difficulty: Difficulty, attempts: u32, defaulted: bool) {
            self.shown.push(format!("difficulty:{difficulty}:{attempts}:{defaulted}"));
        }

        fn display_category(&mut self, category: &str) {
            self.shown.push(format!("category:{category}"));
        }

        fn display_category_exhausted(&mut self, category: &str) {
            self.shown.push(format!("exhausted:{category}"));
        }

        fn display_board(&mut self, round: &RoundState) {
            self.shown.push(format!("board:{}", round.masked()));
        }

        fn display_guess_outcome(&mut self, outcome: &GuessOutcome, round: &RoundState, state: &SessionState) {
            self.shown.push(format!(
                "guess:{outcome:?}:{}:{}",
                round.masked(),
                state.attempts_remaining
            ));
        }

        fn display_hint_outcome(&mut self, outcome: &HintOutcome, _round: &RoundState, state: &SessionState) {
            let kind = match outcome {
                HintOutcome::AttemptsDeducted { .. } => "attempts",
                HintOutcome::ScorePenalized { .. } => "score",
                HintOutcome::Unavailable => "unavailable",
                HintOutcome::NothingToReveal => "nothing",
            };
            self.shown.push(format!(
                "hint:{kind}:{}:{}",
                state.attempts_remaining, state.score
            ));
        }

        fn display_timeout(&mut self, attempts_left: u32) {
            self.shown.push(format!("timeout:{attempts_left}"));
        }

        fn display_invalid_input(&mut self, input: &str) {
            self.shown.push(format!("invalid:{input}"));
        }

        fn display_commands(&mut self, commands: &[Command]) {
            self.shown.push(format!("commands:{}", commands.len()));
        }

        fn display_players(&mut self, ledger: &PlayerLedger) {
            self.shown.push(format!("players:{}", ledger.to_text().trim_end()));
        }

        fn display_round_won(&mut self, word: &str, state: &SessionState) {
            self.shown.push(format!(
                "won:{word}:{}:{}",
                state.score, state.attempts_remaining
            ));
        }

        fn display_round_lost(&mut self, word: &str, state: &SessionState) {
            self.shown.push(format!("lost:{word}:{}", state.score));
        }

        fn display_save_failure(&mut self, _error: &io::Error) {
            self.shown.push("save-failed".to_string());
        }

        fn display_report(&mut self, report: &SessionReport) {
            self.shown.push(format!("report:{:?}:{}", report.outcome, report.score));
        }
    }

    fn bank(words: &[&str]) -> WordBank {
        [("animals", words.to_vec())].into_iter().collect()
    }

    fn ledger() -> PlayerLedger {
        [("alice", 48u32)].into_iter().collect()
    }

    fn play(
        wordbank: WordBank,
        ledger: PlayerLedger,
        steps: Vec<Step>,
    ) -> (SessionReport, ScriptedInterface, Session<MemoryStore>) {
        let mut session =
            Session::new(wordbank, ledger, MemoryStore::default(), SessionConfig::default()).unwrap();
        let mut ui = ScriptedInterface::new(steps);
        let mut rng = StdRng::seed_from_u64(42);
        let report = session.run(&mut ui, &mut rng);
        (report, ui, session)
    }

    #[test]
    fn test_startup_requires_words_and_players() {
        let empty_bank = Session::new(
            WordBank::default(),
            ledger(),
            MemoryStore::default(),
            SessionConfig::default(),
        );
        assert_eq!(empty_bank.err(), Some(StartupError::NoWords));

        let empty_ledger = Session::new(
            bank(&["cat"]),
            PlayerLedger::default(),
            MemoryStore::default(),
            SessionConfig::default(),
        );
        assert_eq!(empty_ledger.err(), Some(StartupError::NoPlayers));
    }

    #[test]
    fn test_new_player_wins_word_then_bank_runs_out() {
        let steps = vec![line("dave"), line("hard"), guess("c"), guess("a"), guess("t")];
        let (report, ui, session) = play(bank(&["cat"]), ledger(), steps);

        assert!(ui.saw("welcome:dave:0:true"));
        assert!(ui.saw("difficulty:hard:5:false"));
        assert!(ui.saw("won:cat:12:5"));
        assert_eq!(report.outcome, SessionOutcome::Exhausted);
        assert_eq!(report.words_solved, 1);
        assert_eq!(report.score, 12);
        assert_eq!(session.ledger().score("dave"), Some(12));
        assert_eq!(session.store().last().unwrap().score("dave"), Some(12));
        assert_eq!(session.store().last().unwrap().score("alice"), Some(48));
    }

    #[test]
    fn test_returning_player_keeps_score() {
        let steps = vec![line("alice"), line("easy"), guess("/exit")];
        let (report, ui, _) = play(bank(&["cat"]), ledger(), steps);

        assert!(ui.saw("welcome:alice:48:false"));
        assert_eq!(report.outcome, SessionOutcome::Exited);
        assert_eq!(report.score, 48);
    }

    #[test]
    fn test_invalid_difficulty_defaults_to_medium() {
        let steps = vec![line("alice"), line("nightmare"), guess("/exit")];
        let (_, ui, _) = play(bank(&["cat"]), ledger(), steps);
        assert!(ui.saw("difficulty:medium:7:true"));
    }

    #[test]
    fn test_blank_name_is_asked_again() {
        let steps = vec![line(""), line("alice"), line("easy"), guess("/exit")];
        let (_, ui, _) = play(bank(&["cat"]), ledger(), steps);
        assert!(ui.saw("welcome:alice:48:false"));
    }

    #[test]
    fn test_running_out_of_attempts_loses_session() {
        let steps = vec![
            line("alice"),
            line("hard"),
            guess("x"),
            guess("y"),
            guess("z"),
            guess("q"),
            guess("w"),
        ];
        let (report, ui, session) = play(bank(&["cat"]), ledger(), steps);

        assert!(ui.saw("guess:Incorrect:_ _ _:1"));
        assert!(ui.saw("lost:cat:48"));
        assert_eq!(report.outcome, SessionOutcome::Lost);
        assert_eq!(session.store().snapshots.len(), 1);
    }

    #[test]
    fn test_timeout_costs_one_attempt() {
        let steps = vec![line("alice"), line("medium"), timeout(), guess("/exit")];
        let (report, ui, _) = play(bank(&["cat"]), ledger(), steps);

        assert!(ui.saw("timeout:6"));
        assert_eq!(report.outcome, SessionOutcome::Exited);
    }

    #[test]
    fn test_timeouts_alone_can_lose_the_session() {
        let mut steps = vec![line("alice"), line("hard")];
        steps.extend((0..5).map(|_| timeout()));
        let (report, ui, _) = play(bank(&["cat"]), ledger(), steps);

        assert!(ui.saw("timeout:0"));
        assert_eq!(report.outcome, SessionOutcome::Lost);
    }

    #[test]
    fn test_commands_and_invalid_input_cost_nothing() {
        let steps = vec![
            line("alice"),
            line("hard"),
            guess("/commands"),
            guess("/players"),
            guess("ab"),
            guess("7"),
            guess("x"),
            guess("/exit"),
        ];
        let (_, ui, _) = play(bank(&["cat"]), ledger(), steps);

        assert!(ui.saw("commands:4"));
        assert!(ui.saw("players:alice: 48"));
        assert!(ui.saw("invalid:ab"));
        assert!(ui.saw("invalid:7"));
        assert!(ui.saw("guess:Incorrect:_ _ _:4"));
    }

    #[test]
    fn test_hint_on_hard_costs_three_attempts() {
        let steps = vec![line("alice"), line("hard"), guess("/hint"), guess("/exit")];
        let (_, ui, _) = play(bank(&["giraffe"]), ledger(), steps);
        assert!(ui.saw("hint:attempts:2:48"));
    }

    #[test]
    fn test_hint_falls_back_to_score() {
        let steps = vec![
            line("alice"),
            line("hard"),
            guess("x"),
            guess("y"),
            guess("z"),
            guess("/hint"),
            guess("/exit"),
        ];
        let (report, ui, session) = play(bank(&["giraffe"]), ledger(), steps);

        assert!(ui.saw("hint:score:2:28"));
        assert_eq!(report.score, 28);
        assert_eq!(session.store().last().unwrap().score("alice"), Some(28));
    }

    #[test]
    fn test_hint_that_completes_word_wins_round() {
        let steps = vec![line("alice"), line("easy"), guess("o"), guess("/hint")];
        let (report, ui, _) = play(bank(&["ox"]), ledger(), steps);

        assert!(ui.saw("won:ox:60:10"));
        assert_eq!(report.outcome, SessionOutcome::Exhausted);
    }

    #[test]
    fn test_win_resets_attempts() {
        let steps = vec![
            line("alice"),
            line("easy"),
            guess("z"),
            guess("z"),
            guess("o"),
            guess("x"),
        ];
        let (_, ui, _) = play(bank(&["ox"]), ledger(), steps);

        assert!(ui.saw("guess:AlreadyGuessed:_ _:9"));
        assert!(ui.saw("won:ox:60:10"));
    }

    #[test]
    fn test_score_above_threshold_wins_session() {
        let players: PlayerLedger = [("bob", 195u32)].into_iter().collect();
        let steps = vec![line("bob"), line("easy"), guess("o"), guess("x")];
        let (report, ui, _) = play(bank(&["ox"]), players, steps);

        assert_eq!(report.outcome, SessionOutcome::Won);
        assert_eq!(report.score, 207);
        assert!(ui.saw("report:Won:207"));
    }

    #[test]
    fn test_reaching_exactly_threshold_does_not_win() {
        let players: PlayerLedger = [("bob", 188u32)].into_iter().collect();
        let steps = vec![line("bob"), line("easy"), guess("o"), guess("x")];
        let (report, _, _) = play(bank(&["ox"]), players, steps);

        assert_eq!(report.score, 200);
        assert_eq!(report.outcome, SessionOutcome::Exhausted);
    }

    #[test]
    fn test_exhausted_category_reported_once() {
        let wordbank: WordBank = [("animals", vec!["ox"]), ("fruits", vec!["fig"])]
            .into_iter()
            .collect();
        let steps = vec![
            line("alice"),
            line("easy"),
            guess("o"),
            guess("x"),
            guess("f"),
            guess("i"),
            guess("g"),
            guess("o"),
            guess("x"),
        ];
        let mut session =
            Session::new(wordbank, ledger(), MemoryStore::default(), SessionConfig::default()).unwrap();
        let mut ui = ScriptedInterface::new(steps);
        // Whichever word comes first, the script solves both.
        let mut rng = StdRng::seed_from_u64(9);
        let report = session.run(&mut ui, &mut rng);

        assert_eq!(report.outcome, SessionOutcome::Exhausted);
        assert_eq!(report.words_solved, 2);
        let exhausted = ui.shown.iter().filter(|s| s.starts_with("exhausted:")).count();
        assert!(exhausted <= 1);
    }

    #[test]
    fn test_save_failure_is_reported_and_session_continues() {
        let mut session = Session::new(
            bank(&["ox", "cat"]),
            ledger(),
            MemoryStore::failing(),
            SessionConfig::default(),
        )
        .unwrap();
        let steps = vec![line("alice"), line("easy"), guess("o"), guess("x"), guess("c"), guess("/exit")];
        let mut ui = ScriptedInterface::new(steps);
        let mut rng = StdRng::seed_from_u64(1);
        let report = session.run(&mut ui, &mut rng);

        assert!(ui.saw("save-failed"));
        assert_eq!(report.outcome, SessionOutcome::Exited);
        assert!(session.ledger().score("alice").unwrap() >= 48);
    }

    #[test]
    fn test_closed_input_ends_session() {
        let (report, ui, _) = play(bank(&["cat"]), ledger(), vec![line("alice")]);
        assert_eq!(report.outcome, SessionOutcome::Exited);
        assert!(ui.saw("report:Exited:48"));

        let (report, _, _) = play(bank(&["cat"]), ledger(), vec![line("alice"), line("easy")]);
        assert_eq!(report.outcome, SessionOutcome::Exited);
    }
}
