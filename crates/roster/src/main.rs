//! `roster` - manage a shared game character roster from the command line.

/// CLI module - command-line interface for roster
mod cli;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    cli::run_cli();
}
