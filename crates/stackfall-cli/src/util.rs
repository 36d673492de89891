use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use anyhow::Context;
use stackfall_engine::{GameConfig, PieceSeed, Snapshot};

pub fn write_json_file<T, P>(file_kind: &str, path: P, value: &T) -> anyhow::Result<()>
where
    T: serde::Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create {} file: {}", file_kind, path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to write {} file: {}", file_kind, path.display()))?;
    writeln!(writer)
        .and_then(|()| writer.flush())
        .with_context(|| format!("Failed to flush {} file: {}", file_kind, path.display()))?;
    Ok(())
}

pub fn read_text_file<P>(file_kind: &str, path: P) -> anyhow::Result<String>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} file: {}", file_kind, path.display()))
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Reads and validates a game config, or returns the default one.
pub fn read_config(path: Option<&Path>) -> anyhow::Result<GameConfig> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };
    let config: GameConfig = read_json_file("config", path)?;
    config
        .validate()
        .with_context(|| format!("Invalid config in {}", path.display()))?;
    Ok(config)
}

/// Parses a 32-digit hex piece seed.
pub fn parse_seed(s: &str) -> Result<PieceSeed, String> {
    serde_json::from_value(serde_json::Value::String(s.to_owned())).map_err(|e| e.to_string())
}

/// Prints the board and stats of a snapshot.
pub fn print_snapshot(snapshot: &Snapshot) {
    print!("{}", snapshot.to_ascii());
    let next: String = snapshot.next.iter().map(|kind| kind.as_char()).collect();
    println!("next:  {next}");
    println!("score: {}", snapshot.score);
    println!("level: {}", snapshot.level);
    println!("lines: {}", snapshot.lines_cleared);
    println!("ticks: {}", snapshot.elapsed_ticks);
    match snapshot.end_reason {
        Some(reason) => println!("game over: {reason}"),
        None => println!("phase: {:?}", snapshot.phase),
    }
}
