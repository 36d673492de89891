use std::path::PathBuf;

use anyhow::Context as _;
use stackfall_engine::{GameSession, SaveData};

use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub struct ShowArg {
    /// Path to the save file (JSON format)
    save_file: PathBuf,
}

pub fn run(arg: &ShowArg) -> anyhow::Result<()> {
    let ShowArg { save_file } = arg;

    eprintln!("Loading save from {}", save_file.display());
    let data: SaveData = util::read_json_file("save", save_file)?;
    let saved_at = data.saved_at;
    let seed = data.seed;
    let session = GameSession::restore(data)
        .with_context(|| format!("Failed to restore save: {}", save_file.display()))?;

    println!("saved: {}", saved_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("seed:  {seed:?}");
    util::print_snapshot(&session.snapshot());
    Ok(())
}
