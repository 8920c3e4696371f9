//! The list command.

use roster_core::error::RosterError;
use roster_core::player::Player;
use roster_core::query::{RosterQuery, SortKey};

use crate::cli::util::{CliApp, report_error};

/// Filters and ordering taken from the command line.
pub struct ListOptions {
    pub class: Option<String>,
    pub status: Option<String>,
    pub guild: Option<String>,
    pub sort: SortKey,
    pub json: bool,
}

impl ListOptions {
    fn to_query(&self) -> RosterQuery {
        let mut query = RosterQuery::new().sort_by(self.sort);
        if let Some(class) = &self.class {
            query = query.class(class);
        }
        if let Some(status) = &self.status {
            query = query.hostile_status(status);
        }
        if let Some(guild) = &self.guild {
            query = query.guild(guild);
        }
        query
    }
}

/// Handle the list command.
pub fn handle_list(app: &CliApp, options: &ListOptions) -> bool {
    let players = match app.query(&options.to_query()) {
        Ok(players) => players,
        Err(e) => {
            report_error(&e);
            return false;
        }
    };

    if options.json {
        return match serde_json::to_string_pretty(&players) {
            Ok(out) => {
                println!("{}", out);
                true
            }
            Err(e) => {
                report_error(&RosterError::from(e));
                false
            }
        };
    }

    if players.is_empty() {
        println!("No players match.");
        return true;
    }

    print!("{}", render_table(&players));
    println!();
    println!("Total: {} players", players.len());
    true
}

const HEADERS: [&str; 5] = ["Name", "Level", "Class", "Status", "Guild"];

fn row(player: &Player) -> [String; 5] {
    [
        player.name.clone(),
        player.level.to_string(),
        player.class.clone(),
        player.hostile_status.to_string(),
        player.guild.to_string(),
    ]
}

/// Left-aligned table sized to its widest cells.
fn render_table(players: &[Player]) -> String {
    let rows: Vec<[String; 5]> = players.iter().map(row).collect();
    let mut widths = HEADERS.map(|h| h.chars().count());
    for cells in &rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    push_line(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    for cells in &rows {
        push_line(&mut out, cells, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize; 5]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}
