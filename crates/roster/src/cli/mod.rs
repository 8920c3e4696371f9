//! Command-line interface for the roster.

mod args;
mod auth;
mod config;
mod export;
mod history;
mod list;
mod players;
mod util;

use clap::Parser;

use args::{Cli, Commands};
use list::ListOptions;
use util::CliApp;

/// Parse arguments, run the command and exit non-zero on failure.
pub fn run_cli() {
    let cli = Cli::parse();

    let success = match cli.command {
        Commands::Signup {
            email,
            discord,
            password,
        } => auth::handle_signup(&email, discord.as_deref(), password),

        Commands::Login { email, password } => auth::handle_login(&email, password),

        Commands::Logout => auth::handle_logout(),

        Commands::Whoami => auth::handle_whoami(),

        Commands::List {
            class,
            status,
            guild,
            sort,
            json,
        } => with_app(|app| {
            let options = ListOptions {
                class,
                status,
                guild,
                sort,
                json,
            };
            list::handle_list(app, &options)
        }),

        Commands::Show { name, json } => with_app(|app| players::handle_show(app, &name, json)),

        Commands::Add {
            name,
            level,
            class,
            fields,
        } => with_app(|app| players::handle_add(app, &name, &level, &class, &fields)),

        Commands::Update {
            name,
            level,
            class,
            fields,
            export,
        } => with_app(|app| {
            players::handle_update(
                app,
                &name,
                level.as_deref(),
                class.as_deref(),
                &fields,
                export,
            )
        }),

        Commands::Export { dest } => with_app(|app| export::handle_export(app, dest)),

        Commands::Log { player, limit } => {
            with_app(|app| history::handle_log(app, player.as_deref(), limit))
        }

        Commands::Config { command } => config::handle_config_command(command),
    };

    if !success {
        std::process::exit(1);
    }
}

/// Run a roster command against the cached session.
fn with_app(command: impl FnOnce(&CliApp) -> bool) -> bool {
    match util::connect() {
        Some(app) => command(&app),
        None => false,
    }
}
