use anyhow::{bail, Context, Result};
use clap::Parser;
use libkana::{kana_engine, kana_engine_with_service, ImeEngine, KanaComposer, KanaConfig};
use libkana::{KeyEvent, TableConverter};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Dictionary used when neither an endpoint nor a dictionary is configured.
const SAMPLE_DICTIONARY: &str = r#"
[dictionary]
"きょう" = ["今日", "京", "強"]
"は" = ["は", "葉", "歯"]
"いい" = ["良い", "いい"]
"てんき" = ["天気", "転機"]
"です" = ["です"]
"にほん" = ["日本", "二本"]
"にほんご" = ["日本語"]
"こんにちは" = ["今日は"]
"かんじ" = ["漢字", "感じ", "幹事"]

[predictions]
"今日" = ["は", "の"]
"日本" = ["語", "人"]
"#;

#[derive(Parser, Debug)]
#[command(name = "kana-demo", about = "Type romaji, convert to kanji")]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Remote converter endpoint; overrides the configuration file
    #[arg(long)]
    endpoint: Option<String>,

    /// Conversion dictionary (TOML); overrides the configuration file
    #[arg(long)]
    dictionary: Option<PathBuf>,

    /// Show converted text while typing
    #[arg(long)]
    live: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true);
    if subscriber.try_init().is_ok() {
        tracing::debug!("tracing initialized");
    }
}

fn build_engine(args: &Args) -> Result<ImeEngine<KanaComposer>> {
    let mut config = match &args.config {
        Some(path) => KanaConfig::load_toml(path)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("loading {}", path.display()))?,
        None => KanaConfig::default(),
    };
    if args.endpoint.is_some() {
        config.endpoint = args.endpoint.clone();
    }
    if args.dictionary.is_some() {
        config.dictionary = args.dictionary.clone();
    }
    if args.live {
        config.base_mut().live_conversion = true;
    }

    if config.endpoint.is_none() && config.dictionary.is_none() {
        let converter = TableConverter::from_toml_str(SAMPLE_DICTIONARY)
            .context("parsing sample dictionary")?;
        return Ok(kana_engine_with_service(config.into_base(), Box::new(converter)));
    }
    kana_engine(config).map_err(|e| anyhow::anyhow!("{e}"))
}

/// Split a line into keys. Named keys are written in angle brackets:
/// `<space>`, `<enter>`, `<esc>`, `<bs>`, `<up>`, `<down>`, `<left>`,
/// `<right>`, `<pgup>`, `<pgdn>`, `<tab>`.
fn parse_keys(line: &str) -> Result<Vec<KeyEvent>> {
    let mut keys = Vec::new();
    let mut rest = line;
    while let Some(ch) = rest.chars().next() {
        if ch == '<' {
            if let Some(end) = rest.find('>') {
                let key = match &rest[1..end] {
                    "space" => KeyEvent::Space,
                    "enter" => KeyEvent::Enter,
                    "esc" => KeyEvent::Escape,
                    "bs" => KeyEvent::Backspace,
                    "up" => KeyEvent::Up,
                    "down" => KeyEvent::Down,
                    "left" => KeyEvent::Left,
                    "right" => KeyEvent::Right,
                    "pgup" => KeyEvent::PageUp,
                    "pgdn" => KeyEvent::PageDown,
                    "tab" => KeyEvent::Tab,
                    other => bail!("unknown key <{}>", other),
                };
                keys.push(key);
                rest = &rest[end + 1..];
                continue;
            }
        }
        keys.push(KeyEvent::Char(ch));
        rest = &rest[ch.len_utf8()..];
    }
    Ok(keys)
}

fn print_state(ime: &mut ImeEngine<KanaComposer>, out: &mut impl Write) -> io::Result<()> {
    let committed = ime.context_mut().take_commit();
    if !committed.is_empty() {
        writeln!(out, "commit:  {}", committed)?;
    }
    let ctx = ime.context();
    writeln!(out, "preedit: {}", ctx.preedit_text())?;
    if !ctx.candidates.is_empty() {
        let keys: Vec<char> = ime.config().select_keys().chars().collect();
        for (i, cand) in ctx.candidates.iter().enumerate() {
            let marker = if i == ctx.candidate_cursor { '>' } else { ' ' };
            let key = keys.get(i).copied().unwrap_or(' ');
            writeln!(out, " {}{}. {}", marker, key, cand)?;
        }
        if !ctx.auxiliary_text.is_empty() {
            writeln!(out, "   {}", ctx.auxiliary_text)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let mut ime = build_engine(&args)?;

    println!("Type romaji and press Enter to feed the line.");
    println!("Named keys: <space> <enter> <esc> <bs> <up> <down> <left> <right> <pgup> <pgdn>");
    println!("Example: kyouha<space><enter>");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let keys = match parse_keys(line.trim_end()) {
            Ok(keys) => keys,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };
        for key in keys {
            ime.process_key(key);
        }
        print_state(&mut ime, &mut stdout)?;
        stdout.flush()?;
    }

    ime.focus_lost();
    print_state(&mut ime, &mut stdout)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keys() {
        let keys = parse_keys("ka<space><enter>").unwrap();
        assert_eq!(
            keys,
            vec![
                KeyEvent::Char('k'),
                KeyEvent::Char('a'),
                KeyEvent::Space,
                KeyEvent::Enter
            ]
        );
        assert!(parse_keys("<nope>").is_err());
        assert_eq!(parse_keys("a<b").unwrap().len(), 3);
    }

    #[test]
    fn test_sample_dictionary_parses() {
        let converter = TableConverter::from_toml_str(SAMPLE_DICTIONARY).unwrap();
        assert_eq!(converter.lookup("きょう")[0], "今日");
    }
}
