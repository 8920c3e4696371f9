//! The export command.

use std::path::PathBuf;

use roster_core::fs::RealFileSystem;

use crate::cli::util::{self, CliApp, report_error};

/// Handle the export command.
///
/// Writes to `dest`, or to the configured `export_root` when none is given.
pub fn handle_export(app: &CliApp, dest: Option<PathBuf>) -> bool {
    let dest = match dest {
        Some(dest) => dest,
        None => match util::load_config() {
            Some(config) => config.export_root,
            None => return false,
        },
    };

    println!("Exporting roster to {}...", dest.display());
    match app.export(RealFileSystem, &dest) {
        Ok(stats) => {
            println!("✓ {}", stats);
            true
        }
        Err(e) => {
            report_error(&e);
            false
        }
    }
}
