//! Config command handlers.

use roster_core::config::Config;

use crate::cli::args::ConfigCommands;
use crate::cli::util::{self, describe_session, report_error};

/// Handle the config command; no subcommand shows the config.
pub fn handle_config_command(command: Option<ConfigCommands>) -> bool {
    let Some(mut config) = util::load_config() else {
        return false;
    };

    match command.unwrap_or(ConfigCommands::Show) {
        ConfigCommands::Show => {
            show(&config);
            true
        }
        ConfigCommands::Set { key, value } => {
            if let Err(e) = config.set(&key, &value) {
                report_error(&e);
                return false;
            }
            if !util::save_config(&config) {
                return false;
            }
            println!("✓ Set {}", key);
            true
        }
    }
}

fn show(config: &Config) {
    if let Some(path) = Config::config_path() {
        println!("Config file:  {}", path.display());
        println!();
    }
    println!("project_id:   {}", config.project_id.as_deref().unwrap_or("(not set)"));
    println!(
        "api_key:      {}",
        config
            .api_key
            .as_deref()
            .map(mask)
            .unwrap_or_else(|| "(not set)".to_string())
    );
    println!("auth_url:     {}", config.auth_url);
    if let Some(url) = &config.database_url {
        println!("database_url: {}", url);
    }
    println!("export_root:  {}", config.export_root.display());
    match &config.session {
        Some(session) => println!("session:      {}", describe_session(session)),
        None => println!("session:      (signed out)"),
    }
}

/// Show only the last four characters of a secret.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_keeps_tail_only() {
        assert_eq!(mask("AIzaSyExample1234"), "****1234");
        assert_eq!(mask("abc"), "****");
    }
}
