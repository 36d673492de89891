use std::str::FromStr;

use anyhow::{Context as _, bail};
use stackfall_engine::{Command, GameConfig};

/// One action of a command script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Left,
    Right,
    RotateCw,
    RotateCcw,
    SoftDrop,
    HardDrop,
    Tick,
    Reset,
}

impl Action {
    /// Converts to an engine command; `reset` restarts with `config`.
    pub fn to_command(self, config: &GameConfig) -> Command {
        match self {
            Action::Left => Command::MoveLeft,
            Action::Right => Command::MoveRight,
            Action::RotateCw => Command::RotateCw,
            Action::RotateCcw => Command::RotateCcw,
            Action::SoftDrop => Command::SoftDrop,
            Action::HardDrop => Command::HardDrop,
            Action::Tick => Command::Tick,
            Action::Reset => Command::Reset(config.clone()),
        }
    }
}

impl FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let action = match s.to_ascii_lowercase().as_str() {
            "left" | "l" => Action::Left,
            "right" | "r" => Action::Right,
            "cw" | "rotate-cw" => Action::RotateCw,
            "ccw" | "rotate-ccw" => Action::RotateCcw,
            "soft" | "soft-drop" | "down" => Action::SoftDrop,
            "hard" | "hard-drop" | "drop" => Action::HardDrop,
            "tick" => Action::Tick,
            "reset" => Action::Reset,
            _ => bail!("unknown command {s:?}"),
        };
        Ok(action)
    }
}

/// A script line: an action and how many times to repeat it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptLine {
    pub action: Action,
    pub repeat: usize,
}

/// Parses a command script.
///
/// Each non-empty line holds one action name, optionally followed by a repeat
/// count (`left 3`, `tick 18`). Text after `#` is ignored.
pub fn parse(text: &str) -> anyhow::Result<Vec<ScriptLine>> {
    let mut lines = vec![];
    for (lineno, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let parsed =
            parse_line(line).with_context(|| format!("script line {}: {line}", lineno + 1))?;
        lines.push(parsed);
    }
    Ok(lines)
}

fn parse_line(line: &str) -> anyhow::Result<ScriptLine> {
    let mut words = line.split_whitespace();
    let action: Action = words.next().unwrap_or_default().parse()?;
    let repeat = match words.next() {
        Some(count) => count
            .parse()
            .with_context(|| format!("invalid repeat count {count:?}"))?,
        None => 1,
    };
    if let Some(extra) = words.next() {
        bail!("unexpected trailing {extra:?}");
    }
    Ok(ScriptLine { action, repeat })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let script = "
            # opening
            left 3
            CW
            hard   # lock it

            tick 18
        ";
        let lines = parse(script).unwrap();
        assert_eq!(
            lines,
            [
                ScriptLine {
                    action: Action::Left,
                    repeat: 3
                },
                ScriptLine {
                    action: Action::RotateCw,
                    repeat: 1
                },
                ScriptLine {
                    action: Action::HardDrop,
                    repeat: 1
                },
                ScriptLine {
                    action: Action::Tick,
                    repeat: 18
                },
            ]
        );
    }

    #[test]
    fn test_parse_errors_name_the_line() {
        let err = parse("left\njump\n").unwrap_err();
        assert!(format!("{err:#}").contains("script line 2"), "{err:#}");

        assert!(parse("left x").is_err());
        assert!(parse("left 1 2").is_err());
    }

    #[test]
    fn test_reset_uses_given_config() {
        let config = GameConfig {
            initial_level: 4,
            ..GameConfig::default()
        };
        assert_eq!(
            Action::Reset.to_command(&config),
            Command::Reset(config.clone())
        );
        assert_eq!(Action::Tick.to_command(&config), Command::Tick);
    }
}
