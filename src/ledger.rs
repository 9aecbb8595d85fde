use crate::wordbank::LineIssue;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Player name to score.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerLedger {
    scores: BTreeMap<String, u32>,
}

impl PlayerLedger {
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn score(&self, name: &str) -> Option<u32> {
        self.scores.get(name).copied()
    }

    /// Returns the stored score and whether the player had to be created.
    pub fn get_or_create(&mut self, name: &str) -> (u32, bool) {
        match self.scores.get(name) {
            Some(&score) => (score, false),
            None => {
                self.scores.insert(name.to_string(), 0);
                (0, true)
            }
        }
    }

    pub fn set_score(&mut self, name: &str, score: u32) {
        self.scores.insert(name.to_string(), score);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.scores.iter().map(|(name, score)| (name.as_str(), *score))
    }

    /// Serialized form, one `name: score` line per player.
    pub fn to_text(&self) -> String {
        self.iter()
            .map(|(name, score)| format!("{name}: {score}\n"))
            .collect()
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for PlayerLedger {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        Self {
            scores: iter.into_iter().map(|(name, score)| (name.into(), score)).collect(),
        }
    }
}

pub fn load_ledger_from_str(data: &str) -> (PlayerLedger, Vec<LineIssue>) {
    let mut ledger = PlayerLedger::default();
    let mut issues = Vec::new();

    for (index, raw) in data.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        // Split on the last colon so the score is always the final field.
        let Some((name, score)) = line.rsplit_once(':') else {
            issues.push(LineIssue::new(line_no, "expected `name: score`"));
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            issues.push(LineIssue::new(line_no, "missing player name"));
            continue;
        }
        match score.trim().parse::<u32>() {
            Ok(score) => ledger.set_score(name, score),
            Err(_) => issues.push(LineIssue::new(
                line_no,
                format!("score '{}' for '{name}' is not a non-negative integer", score.trim()),
            )),
        }
    }

    (ledger, issues)
}

pub fn load_ledger_from_file<P: AsRef<Path>>(path: P) -> io::Result<(PlayerLedger, Vec<LineIssue>)> {
    let data = fs::read_to_string(path)?;
    Ok(load_ledger_from_str(&data))
}

/// Overwrite `path` with the whole ledger. The new content is written to a
/// temporary file next to it and renamed into place.
pub fn save_ledger_to_file<P: AsRef<Path>>(path: P, ledger: &PlayerLedger) -> io::Result<()> {
    let path = path.as_ref();
    let parent_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir)?;

    let temp_file = NamedTempFile::new_in(parent_dir)?;
    {
        let mut writer = BufWriter::new(&temp_file);
        writer.write_all(ledger.to_text().as_bytes())?;
        writer.flush()?;
    }
    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Where the session persists the ledger after every round.
pub trait ScoreStore {
    fn save(&mut self, ledger: &PlayerLedger) -> io::Result<()>;
}

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScoreStore for FileStore {
    fn save(&mut self, ledger: &PlayerLedger) -> io::Result<()> {
        save_ledger_to_file(&self.path, ledger)
    }
}

/// Keeps every saved snapshot in memory. Can be told to fail.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub snapshots: Vec<PlayerLedger>,
    pub fail_writes: bool,
}

#[cfg(test)]
impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            snapshots: Vec::new(),
            fail_writes: true,
        }
    }

    pub fn last(&self) -> Option<&PlayerLedger> {
        self.snapshots.last()
    }
}

#[cfg(test)]
impl ScoreStore for MemoryStore {
    fn save(&mut self, ledger: &PlayerLedger) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "ledger is read-only"));
        }
        self.snapshots.push(ledger.clone());
        Ok(())
    }
}
