use std::path::PathBuf;

use anyhow::Context as _;
use stackfall_engine::{CommandResult, GameSession, PieceSeed};

use crate::{script, util};

#[derive(Debug, Clone, clap::Args)]
pub struct RunArg {
    /// Path to the command script
    script: PathBuf,
    /// Game config (JSON format); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Piece seed as 32 hex digits
    #[arg(long, value_parser = util::parse_seed)]
    seed: Option<PieceSeed>,
    /// Resume from a save file instead of starting a new session
    #[arg(long, conflicts_with = "seed")]
    load: Option<PathBuf>,
    /// Start a new session when the save file cannot be restored
    #[arg(long, requires = "load")]
    fresh_on_error: bool,
    /// Write the final session state to this file
    #[arg(long)]
    save: Option<PathBuf>,
    /// Print the board after every command
    #[arg(long)]
    trace: bool,
}

pub fn run(arg: &RunArg) -> anyhow::Result<()> {
    let RunArg {
        script,
        config,
        seed,
        load,
        fresh_on_error,
        save,
        trace,
    } = arg;

    let config = util::read_config(config.as_deref())?;
    let lines = script::parse(&util::read_text_file("script", script)?)
        .with_context(|| format!("Failed to parse script: {}", script.display()))?;

    let mut session = match (load, seed) {
        (Some(path), _) => {
            let json = util::read_text_file("save", path)?;
            if *fresh_on_error {
                GameSession::load_or_reset(&json, config.clone())?
            } else {
                GameSession::from_json(&json)
                    .with_context(|| format!("Failed to restore save: {}", path.display()))?
            }
        }
        (None, Some(seed)) => GameSession::with_seed(config.clone(), *seed)?,
        (None, None) => GameSession::new(config.clone())?,
    };
    eprintln!("Seed: {:?}", session.next_queue().seed());

    let mut applied = 0;
    let mut blocked = 0;
    'script: for line in lines {
        for _ in 0..line.repeat {
            let lines_before = session.lines_cleared();
            let (result, snapshot) = session.step(line.action.to_command(&config));
            match result {
                CommandResult::Applied => applied += 1,
                CommandResult::NoOp => blocked += 1,
                CommandResult::SessionEnded => {
                    log::info!("Session ended; skipping the rest of the script");
                    break 'script;
                }
            }
            if *trace {
                eprintln!("{:?} -> {result:?}", line.action);
                eprint!("{}", snapshot.to_ascii());
                if snapshot.lines_cleared > lines_before {
                    if let Some(clear) = session.last_clear() {
                        eprintln!(
                            "cleared rows {:?} for {} points",
                            clear.rows.rows(),
                            clear.delta.points
                        );
                    }
                }
            }
        }
    }
    log::info!("Applied {applied} command(s), {blocked} blocked");

    util::print_snapshot(&session.snapshot());

    if let Some(path) = save {
        util::write_json_file("save", path, &session.save())?;
        log::info!("Saved session to {}", path.display());
    }
    Ok(())
}
