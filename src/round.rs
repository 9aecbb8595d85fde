//! Round engine: one word, from selection until it is solved or the attempts
//! run out.
//!
//! The engine mutates only the attempt and score fields of the
//! [`SessionState`] it is handed. Rewards and resets at the end of a round
//! are the session controller's job.

use crate::session::SessionState;
use crate::wordbank::WordBank;
use crate::debug_log;
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

pub const PLACEHOLDER: char = '_';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }

    pub fn initial_attempts(self) -> u32 {
        match self {
            Self::Easy => 10,
            Self::Medium => 7,
            Self::Hard => 5,
        }
    }

    /// Attempts a hint costs when the player can afford them.
    pub fn hint_attempt_cost(self) -> u32 {
        match self {
            Self::Easy => 1,
            Self::Medium => 2,
            Self::Hard => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessOutcome {
    AlreadyGuessed,
    /// Positions newly revealed by this guess.
    Correct(Vec<usize>),
    Incorrect,
    RoundWon,
    RoundLost,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HintOutcome {
    AttemptsDeducted { amount: u32, position: usize },
    ScorePenalized { amount: u32, position: usize },
    /// Not enough attempts or score to pay for a hint.
    Unavailable,
    /// Every letter is already showing; nothing is charged.
    NothingToReveal,
}

#[derive(Debug)]
pub enum RoundStart {
    Ready(RoundState),
    /// The drawn category has no unused words left.
    CategoryExhausted(String),
    /// No category has unused words left.
    AllExhausted,
}

#[derive(Debug, Clone)]
pub struct RoundState {
    category: String,
    target: Vec<char>,
    mask: Vec<Option<char>>,
    guessed: BTreeSet<char>,
}

/// Draw a category uniformly, then an unused word from it uniformly.
pub fn start_round<R: Rng + ?Sized>(
    wordbank: &WordBank,
    used_words: &HashSet<String>,
    rng: &mut R,
) -> RoundStart {
    let category = match wordbank.random_category(rng) {
        Some(category) if !wordbank.open_categories(used_words).is_empty() => category,
        _ => return RoundStart::AllExhausted,
    };
    let remaining = wordbank.remaining_words(category, used_words);
    match remaining.choose(rng) {
        Some(word) => {
            debug_log!("start_round() - category '{}', {} candidates", category, remaining.len());
            RoundStart::Ready(RoundState::new(category, word))
        }
        None => RoundStart::CategoryExhausted(category.to_string()),
    }
}

impl RoundState {
    pub fn new(category: &str, word: &str) -> Self {
        let target: Vec<char> = word.chars().collect();
        let mask = vec![None; target.len()];
        Self {
            category: category.to_string(),
            target,
            mask,
            guessed: BTreeSet::new(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn word(&self) -> String {
        self.target.iter().collect()
    }

    pub fn mask(&self) -> &[Option<char>] {
        &self.mask
    }

    /// The mask as shown to the player, e.g. `b a _ a _ a`.
    pub fn masked(&self) -> String {
        self.mask
            .iter()
            .map(|slot| slot.unwrap_or(PLACEHOLDER).to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn guessed_letters(&self) -> Vec<char> {
        self.guessed.iter().copied().collect()
    }

    pub fn hidden_positions(&self) -> Vec<usize> {
        self.mask
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn is_solved(&self) -> bool {
        self.mask
            .iter()
            .zip(&self.target)
            .all(|(slot, letter)| *slot == Some(*letter))
    }

    /// Apply one already-validated single-letter guess.
    pub fn apply_guess(&mut self, letter: char, session: &mut SessionState) -> GuessOutcome {
        if !self.guessed.insert(letter) {
            return GuessOutcome::AlreadyGuessed;
        }

        if !self.target.contains(&letter) {
            return Self::charge_miss(session);
        }

        let revealed: Vec<usize> = self
            .target
            .iter()
            .enumerate()
            .filter(|(i, c)| **c == letter && self.mask[*i].is_none())
            .map(|(i, _)| i)
            .collect();
        if revealed.is_empty() {
            // Every occurrence was already exposed by hints.
            return GuessOutcome::AlreadyGuessed;
        }
        for &i in &revealed {
            self.mask[i] = Some(letter);
        }

        if self.is_solved() {
            GuessOutcome::RoundWon
        } else {
            GuessOutcome::Correct(revealed)
        }
    }

    /// A guess that never arrived costs one attempt, like a wrong letter.
    pub fn apply_timeout(&mut self, session: &mut SessionState) -> GuessOutcome {
        Self::charge_miss(session)
    }

    fn charge_miss(session: &mut SessionState) -> GuessOutcome {
        session.attempts_remaining = session.attempts_remaining.saturating_sub(1);
        if session.attempts_remaining == 0 {
            GuessOutcome::RoundLost
        } else {
            GuessOutcome::Incorrect
        }
    }

    /// Reveal one random hidden letter, paid for in attempts when the player
    /// has more than the difficulty's hint cost, otherwise in score. A hint
    /// the score cannot pay for is refused.
    pub fn apply_hint<R: Rng + ?Sized>(
        &mut self,
        session: &mut SessionState,
        score_cost: u32,
        rng: &mut R,
    ) -> HintOutcome {
        let hidden = self.hidden_positions();
        let Some(&position) = hidden.choose(rng) else {
            return HintOutcome::NothingToReveal;
        };
        if session.attempts_remaining <= 1 && session.score <= score_cost {
            return HintOutcome::Unavailable;
        }

        let attempt_cost = session.difficulty.hint_attempt_cost();
        let outcome = if session.attempts_remaining > attempt_cost {
            session.attempts_remaining -= attempt_cost;
            HintOutcome::AttemptsDeducted {
                amount: attempt_cost,
                position,
            }
        } else if session.score >= score_cost {
            session.score -= score_cost;
            HintOutcome::ScorePenalized {
                amount: score_cost,
                position,
            }
        } else {
            return HintOutcome::Unavailable;
        };
        self.mask[position] = Some(self.target[position]);
        outcome
    }
}
