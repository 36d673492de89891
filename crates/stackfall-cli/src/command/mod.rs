use clap::{Parser, Subcommand};

use self::{run::RunArg, show::ShowArg, simulate::SimulateArg};

mod run;
mod show;
mod simulate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Apply a script of commands to a session
    Run(#[clap(flatten)] RunArg),
    /// Play random inputs against a virtual gravity clock
    Simulate(#[clap(flatten)] SimulateArg),
    /// Print the board and stats stored in a save file
    Show(#[clap(flatten)] ShowArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Run(arg) => run::run(&arg)?,
        Mode::Simulate(arg) => simulate::run(&arg)?,
        Mode::Show(arg) => show::run(&arg)?,
    }
    Ok(())
}
