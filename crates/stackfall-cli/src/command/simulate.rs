use std::{path::PathBuf, time::Duration};

use rand::{Rng, SeedableRng as _, rngs::StdRng};
use stackfall_engine::{Command, GameSession, PieceSeed};

use crate::util;

/// Virtual time between two player inputs.
const INPUT_PERIOD: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, clap::Args)]
pub struct SimulateArg {
    /// Game config (JSON format); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Piece seed as 32 hex digits
    #[arg(long, value_parser = util::parse_seed)]
    seed: Option<PieceSeed>,
    /// Seed for the random player inputs
    #[arg(long, default_value_t = 0)]
    input_seed: u64,
    /// Number of player inputs to simulate
    #[arg(long, default_value_t = 2000)]
    inputs: usize,
    /// Write the final session state to this file
    #[arg(long)]
    save: Option<PathBuf>,
}

pub fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let SimulateArg {
        config,
        seed,
        input_seed,
        inputs,
        save,
    } = arg;

    let config = util::read_config(config.as_deref())?;
    let mut session = match seed {
        Some(seed) => GameSession::with_seed(config, *seed)?,
        None => GameSession::new(config)?,
    };
    let mut rng = StdRng::seed_from_u64(*input_seed);

    let mut clock = VirtualClock::new(session.fall_interval());
    for _ in 0..*inputs {
        if session.is_game_over() {
            break;
        }
        session.apply(random_input(&mut rng));
        for _ in 0..clock.advance(INPUT_PERIOD) {
            session.apply(Command::Tick);
        }
        clock.set_interval(session.fall_interval());
    }
    log::info!(
        "Simulated {:.1}s of play, {} pieces locked",
        clock.now.as_secs_f64(),
        session.stats().completed_pieces()
    );

    util::print_snapshot(&session.snapshot());

    if let Some(path) = save {
        util::write_json_file("save", path, &session.save())?;
        log::info!("Saved session to {}", path.display());
    }
    Ok(())
}

fn random_input<R>(rng: &mut R) -> Command
where
    R: Rng + ?Sized,
{
    match rng.random_range(0..10) {
        0..=2 => Command::MoveLeft,
        3..=5 => Command::MoveRight,
        6 => Command::RotateCw,
        7 => Command::RotateCcw,
        8 => Command::SoftDrop,
        _ => Command::HardDrop,
    }
}

/// Converts elapsed time into gravity ticks.
#[derive(Debug, Clone, Copy)]
struct VirtualClock {
    now: Duration,
    next_tick: Duration,
    interval: Duration,
}

impl VirtualClock {
    fn new(interval: Duration) -> Self {
        Self {
            now: Duration::ZERO,
            next_tick: interval,
            interval,
        }
    }

    /// Moves the clock forward and returns the number of ticks due.
    fn advance(&mut self, dt: Duration) -> u32 {
        self.now += dt;
        let mut due = 0;
        while self.next_tick <= self.now {
            self.next_tick += self.interval;
            due += 1;
        }
        due
    }

    /// Applies a new gravity interval from the next tick on.
    fn set_interval(&mut self, interval: Duration) {
        if interval != self.interval {
            self.next_tick = (self.next_tick - self.interval + interval).max(self.now);
            self.interval = interval;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_emits_ticks_at_interval() {
        let mut clock = VirtualClock::new(Duration::from_millis(300));
        assert_eq!(clock.advance(Duration::from_millis(150)), 0);
        assert_eq!(clock.advance(Duration::from_millis(150)), 1);
        assert_eq!(clock.advance(Duration::from_millis(1000)), 3);
    }

    #[test]
    fn test_clock_interval_change() {
        let mut clock = VirtualClock::new(Duration::from_millis(1000));
        assert_eq!(clock.advance(Duration::from_millis(500)), 0);
        clock.set_interval(Duration::from_millis(200));
        // The pending tick at 1000ms would now fall at 200ms, so it is due right away.
        assert_eq!(clock.advance(Duration::from_millis(100)), 1);
    }
}
