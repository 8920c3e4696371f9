//! Command-line argument structures and enums

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use roster_core::query::SortKey;

#[derive(Parser)]
#[command(name = "roster")]
#[command(about = "Manage a shared roster of game characters", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account (it must be verified before it can read the roster)
    Signup {
        /// Account email
        email: String,

        /// Discord handle stored on the account profile
        #[arg(long)]
        discord: Option<String>,

        /// Password (falls back to ROSTER_PASSWORD, then a prompt)
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign in and cache the session
    Login {
        /// Account email
        email: String,

        /// Password (falls back to ROSTER_PASSWORD, then a prompt)
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the cached session
    Logout,

    /// Show the signed-in account
    Whoami,

    /// List players
    #[command(alias = "ls")]
    List {
        /// Only players of this class
        #[arg(long)]
        class: Option<String>,

        /// Only players with this hostile status (friendly, neutral, hostile)
        #[arg(long)]
        status: Option<String>,

        /// Only members of this guild ("N/A" for players without one)
        #[arg(long)]
        guild: Option<String>,

        /// Sort column: name, level, class, hostile-status, guild
        #[arg(short, long, default_value = "name")]
        sort: SortKey,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one player
    Show {
        /// Player name (case-insensitive)
        name: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Add a new player
    Add {
        /// Player name
        name: String,

        /// Level (1-50)
        #[arg(short, long)]
        level: String,

        /// Class
        #[arg(short, long)]
        class: String,

        #[command(flatten)]
        fields: PlayerFields,
    },

    /// Update an existing player (unspecified fields keep their value)
    Update {
        /// Player name (case-insensitive)
        name: String,

        /// Level (1-50)
        #[arg(short, long)]
        level: Option<String>,

        /// Class
        #[arg(short, long)]
        class: Option<String>,

        #[command(flatten)]
        fields: PlayerFields,

        /// Re-export the roster after the update
        #[arg(long)]
        export: bool,
    },

    /// Export the roster as cross-linked markdown files
    Export {
        /// Destination directory (default: export_root from config)
        #[arg(short, long)]
        dest: Option<PathBuf>,
    },

    /// Show the audit log, newest first
    Log {
        /// Only entries for this player
        #[arg(short, long)]
        player: Option<String>,

        /// Show at most this many entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

/// Optional player fields shared by `add` and `update`.
#[derive(Args, Debug, Default, Clone)]
pub struct PlayerFields {
    /// Subclass (ignored below level 25)
    #[arg(long)]
    pub subclass: Option<String>,

    /// Hostile status: friendly, neutral or hostile
    #[arg(long)]
    pub status: Option<String>,

    /// Guild name
    #[arg(short, long, conflicts_with = "no_guild")]
    pub guild: Option<String>,

    /// Leave the current guild
    #[arg(long)]
    pub no_guild: bool,

    /// Guild rank ("unknown" when not disclosed)
    #[arg(long)]
    pub rank: Option<String>,

    /// Free-text notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Discord handle ("" to clear)
    #[arg(long)]
    pub discord: Option<String>,

    /// Comma-separated known associates (replaces the current list)
    #[arg(short, long)]
    pub associates: Option<String>,
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the current configuration
    Show,

    /// Set a configuration key
    Set {
        /// One of: project_id, api_key, auth_url, database_url, export_root
        key: String,

        /// New value ("" to reset)
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_parses_filters_and_sort() {
        let cli = Cli::try_parse_from([
            "roster", "list", "--class", "Mage", "--sort", "level",
        ])
        .unwrap();
        match cli.command {
            Commands::List { class, sort, .. } => {
                assert_eq!(class.as_deref(), Some("Mage"));
                assert_eq!(sort, SortKey::Level);
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_add_requires_level_and_class() {
        assert!(Cli::try_parse_from(["roster", "add", "Thorne"]).is_err());
        assert!(
            Cli::try_parse_from(["roster", "add", "Thorne", "-l", "10", "-c", "Warrior"]).is_ok()
        );
    }

    #[test]
    fn test_guild_conflicts_with_no_guild() {
        assert!(
            Cli::try_parse_from(["roster", "update", "Thorne", "--guild", "X", "--no-guild"])
                .is_err()
        );
    }

    #[test]
    fn test_unknown_sort_key_is_rejected() {
        assert!(Cli::try_parse_from(["roster", "list", "--sort", "age"]).is_err());
    }
}
