//! midilint: normalize, align, identify, correct and transpose MIDI files

mod codec;
mod config;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use midilint_core::{Key, MidilintError, Piece, Strategy};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "midilint=info,midilint_core=info";

const USAGE: &str = "\
Usage: midilint <command> SOURCE [DEST] [options]

Commands:
  normalize SOURCE DEST [--velocity N]       set every note velocity (default 127)
  align     SOURCE DEST [--precision N]      snap timing to 1/N beat (default 1)
  identify  SOURCE                           print statistics and the key as JSON
  correct   SOURCE DEST --key K [--strategy S]
                                             snap pitches into K (nearest, shift_up, shift_down)
  transpose SOURCE DEST --key K              move notes from the identified key into K
  run       SOURCE DEST                      apply the [[pipeline]] from the config file

Options:
  --config PATH                              config file (default <config dir>/midilint/config.toml)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Normalize,
    Align,
    Identify,
    Correct,
    Transpose,
    Run,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "normalize" => Ok(Self::Normalize),
            "align" => Ok(Self::Align),
            "identify" => Ok(Self::Identify),
            "correct" => Ok(Self::Correct),
            "transpose" => Ok(Self::Transpose),
            "run" => Ok(Self::Run),
            _ => Err(anyhow!("Unknown command '{}'\n\n{}", s, USAGE)),
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging; RUST_LOG replaces the defaults entirely
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(log_filter())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("{}", USAGE);
        return Ok(());
    }
    run(&args)
}

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn run(args: &[String]) -> Result<()> {
    let command: Command = args[0].parse()?;
    let positional = positional_args(&args[1..]);
    let source = positional
        .first()
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("Missing SOURCE\n\n{}", USAGE))?;

    let config_file: Option<PathBuf> = parse_flag(args, "--config")?;
    let config = config::load_config(config_file.as_deref())?;

    // Validate everything before reading the file
    let velocity = match parse_flag::<i64>(args, "--velocity")? {
        Some(v) => check_velocity(v)?,
        None => config.velocity,
    };
    let precision: u32 = parse_flag(args, "--precision")?.unwrap_or(config.precision);
    let strategy: Strategy = parse_flag(args, "--strategy")?.unwrap_or(config.strategy);
    let key: Option<Key> = parse_flag(args, "--key")?;

    if !source.exists() {
        bail!("Source file {} does not exist", source.display());
    }

    let bytes = std::fs::read(&source).with_context(|| format!("Failed to read {}", source.display()))?;
    let mut smf = midly::Smf::parse(&bytes).with_context(|| format!("Failed to parse {}", source.display()))?;
    let piece = codec::decode(&smf)?;
    tracing::info!(
        path = %source.display(),
        tracks = piece.tracks.len(),
        ticks_per_beat = piece.ticks_per_beat,
        "Loaded MIDI file"
    );

    let dest = match command {
        Command::Identify => {
            let summary = midilint_core::identify(&piece)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }
        _ => positional
            .get(1)
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("Missing DEST\n\n{}", USAGE))?,
    };
    if dest.exists() {
        bail!("Destination file {} already exists", dest.display());
    }

    let require_key = || key.ok_or_else(|| anyhow!("--key is required for this command"));
    let piece: Piece = match command {
        Command::Normalize => midilint_core::normalize(piece, velocity)?,
        Command::Align => midilint_core::align(piece, precision)?,
        Command::Correct => midilint_core::correct_pitch(piece, require_key()?, strategy)?,
        Command::Transpose => midilint_core::transpose(piece, require_key()?).map_err(|e| match e {
            MidilintError::UnidentifiableKey { .. } => {
                anyhow!(e).context("Use `correct --key` to snap the piece into a key you choose instead")
            }
            e => anyhow!(e),
        })?,
        Command::Run => {
            let chain = config.chain();
            if chain.is_empty() {
                bail!("No [[pipeline]] steps configured");
            }
            chain.apply(piece)?
        }
        Command::Identify => bail!("identify does not write a destination file"),
    };

    codec::encode(&mut smf, &piece)?;
    save(&smf, &dest)?;
    tracing::info!(path = %dest.display(), "Wrote MIDI file");
    Ok(())
}

fn save(smf: &midly::Smf, dest: &Path) -> Result<()> {
    smf.save(dest).with_context(|| format!("Failed to write {}", dest.display()))
}

fn check_velocity(velocity: i64) -> Result<u8> {
    if !(0..=127).contains(&velocity) {
        bail!("velocity was {} but must be between 0 and 127 (inclusive)", velocity);
    }
    Ok(velocity as u8)
}

/// Arguments that are neither flags nor flag values
fn positional_args(args: &[String]) -> Vec<&str> {
    let mut positional = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            iter.next();
        } else {
            positional.push(arg.as_str());
        }
    }
    positional
}

fn parse_flag<T>(args: &[String], name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Some(pos) = args.iter().position(|a| a == name) else {
        return Ok(None);
    };
    let value = args
        .get(pos + 1)
        .ok_or_else(|| anyhow!("{} needs a value", name))?;
    let parsed = value
        .parse::<T>()
        .with_context(|| format!("Invalid value '{}' for {}", value, name))?;
    Ok(Some(parsed))
}
