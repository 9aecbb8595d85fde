use anyhow::Result;
use guess_the_word::cli::{ConsoleInterface, parse_cli};
use guess_the_word::{
    EMBEDDED_GAMEDATA, FileStore, PlayerLedger, Session, StartupError, TimedInput, WordBank, info_log, load_ledger_from_file,
    load_wordbank_from_file, load_wordbank_from_str, logging,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::{self, BufReader, Write};
use std::path::Path;

fn load_words<W: Write>(path: Option<&Path>, console: &mut ConsoleInterface<W>) -> WordBank {
    let (wordbank, issues) = match path {
        Some(path) => match load_wordbank_from_file(path) {
            Ok(loaded) => loaded,
            Err(e) => {
                console.display_load_error("game data", path, &e);
                return WordBank::default();
            }
        },
        None => load_wordbank_from_str(EMBEDDED_GAMEDATA),
    };
    console.display_load_issues("game data", &issues);
    wordbank
}

fn load_players<W: Write>(path: &Path, console: &mut ConsoleInterface<W>) -> PlayerLedger {
    match load_ledger_from_file(path) {
        Ok((ledger, issues)) => {
            console.display_load_issues("players data", &issues);
            ledger
        }
        Err(e) => {
            console.display_load_error("players data", path, &e);
            PlayerLedger::default()
        }
    }
}

fn startup_context(error: StartupError, words_path: Option<&Path>, players_path: &Path) -> String {
    match error {
        StartupError::NoWords => match words_path {
            Some(path) => format!("cannot start a game with words from '{}'", path.display()),
            None => "cannot start a game with the built-in words".to_string(),
        },
        StartupError::NoPlayers => format!(
            "cannot start a game with players from '{}'",
            players_path.display()
        ),
    }
}

fn main() -> Result<()> {
    let cli = parse_cli();
    logging::init(cli.verbose);

    let input = TimedInput::spawn(BufReader::new(io::stdin()));
    let mut console = ConsoleInterface::new(input, io::stdout()).with_color(!cli.no_color);

    let wordbank = load_words(cli.words_path.as_deref(), &mut console);
    let ledger = load_players(&cli.players_path, &mut console);
    let (categories, words, players) = (wordbank.category_count(), wordbank.word_count(), ledger.len());

    let store = FileStore::new(&cli.players_path);
    let mut session = Session::new(wordbank, ledger, store, cli.session_config()).map_err(|e| {
        let context = startup_context(e, cli.words_path.as_deref(), &cli.players_path);
        anyhow::Error::new(e).context(context)
    })?;
    console.display_data_loaded(categories, words, players);

    let report = match cli.seed {
        Some(seed) => session.run(&mut console, &mut StdRng::seed_from_u64(seed)),
        None => session.run(&mut console, &mut rand::rng()),
    };
    info_log!(
        "main() - session for '{}' ended {:?}, score {}",
        report.player_name,
        report.outcome,
        report.score
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_context_names_the_failing_source() {
        let words = Path::new("gamedata.txt");
        let players = Path::new("playersdata.txt");

        let no_words = startup_context(StartupError::NoWords, Some(words), players);
        assert_eq!(no_words, "cannot start a game with words from 'gamedata.txt'");
        assert!(!no_words.contains("playersdata.txt"));

        let no_players = startup_context(StartupError::NoPlayers, Some(words), players);
        assert_eq!(no_players, "cannot start a game with players from 'playersdata.txt'");

        assert_eq!(
            startup_context(StartupError::NoWords, None, players),
            "cannot start a game with the built-in words"
        );
    }
}
