use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::Path;

pub const EMBEDDED_GAMEDATA: &str = include_str!("resources/gamedata.txt");

/// A problem found on one line of a data file. The line is skipped (or partly
/// skipped) and loading carries on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIssue {
    pub line: usize,
    pub reason: String,
}

impl LineIssue {
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for LineIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

/// Category name to candidate words. Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordBank {
    categories: BTreeMap<String, Vec<String>>,
}

impl WordBank {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn word_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn words(&self, category: &str) -> Option<&[String]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    /// Words of `category` that are not in `used`, in file order.
    pub fn remaining_words<'a>(&'a self, category: &str, used: &HashSet<String>) -> Vec<&'a str> {
        self.words(category)
            .unwrap_or_default()
            .iter()
            .filter(|word| !used.contains(*word))
            .map(String::as_str)
            .collect()
    }

    /// Categories that still have at least one word outside `used`.
    pub fn open_categories(&self, used: &HashSet<String>) -> Vec<&str> {
        self.categories
            .iter()
            .filter(|(_, words)| words.iter().any(|word| !used.contains(word)))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn random_category<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        let names: Vec<&str> = self.categories().collect();
        names.choose(rng).copied()
    }

    fn insert(&mut self, category: String, words: Vec<String>) {
        let entry = self.categories.entry(category).or_default();
        for word in words {
            if !entry.contains(&word) {
                entry.push(word);
            }
        }
    }
}

impl<C, W> FromIterator<(C, W)> for WordBank
where
    C: Into<String>,
    W: IntoIterator,
    W::Item: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (C, W)>>(iter: I) -> Self {
        let mut bank = WordBank::default();
        for (category, words) in iter {
            bank.insert(category.into(), words.into_iter().map(Into::into).collect());
        }
        bank
    }
}

fn is_valid_word(word: &str) -> bool {
    !word.is_empty() && word.chars().all(char::is_alphabetic)
}

/// Parse `category: word1, word2, ...` lines. Malformed lines and invalid words
/// are reported and skipped; everything else is kept.
pub fn load_wordbank_from_str(data: &str) -> (WordBank, Vec<LineIssue>) {
    let mut bank = WordBank::default();
    let mut issues = Vec::new();

    for (index, raw) in data.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let Some((category, words)) = line.split_once(':') else {
            issues.push(LineIssue::new(line_no, "expected `category: word, word, ...`"));
            continue;
        };
        let category = category.trim();
        if category.is_empty() {
            issues.push(LineIssue::new(line_no, "missing category name"));
            continue;
        }

        let mut accepted = Vec::new();
        for word in words.split(',').map(str::trim).filter(|w| !w.is_empty()) {
            let word = word.to_lowercase();
            if is_valid_word(&word) {
                accepted.push(word);
            } else {
                issues.push(LineIssue::new(
                    line_no,
                    format!("skipped '{word}': words must be letters only"),
                ));
            }
        }
        if accepted.is_empty() {
            issues.push(LineIssue::new(
                line_no,
                format!("category '{category}' has no usable words"),
            ));
            continue;
        }
        bank.insert(category.to_string(), accepted);
    }

    (bank, issues)
}

pub fn load_wordbank_from_file<P: AsRef<Path>>(path: P) -> io::Result<(WordBank, Vec<LineIssue>)> {
    let data = fs::read_to_string(path)?;
    Ok(load_wordbank_from_str(&data))
}
