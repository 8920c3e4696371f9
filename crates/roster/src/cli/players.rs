//! Player command handlers: show, add, update.

use roster_core::error::RosterError;
use roster_core::links::LinkReport;
use roster_core::player::{Player, PlayerForm};

use crate::cli::args::PlayerFields;
use crate::cli::export;
use crate::cli::util::{self, CliApp, report_error};

impl PlayerFields {
    /// Overlay the flags that were given onto a form.
    pub fn apply(&self, form: &mut PlayerForm) {
        if let Some(subclass) = &self.subclass {
            form.subclass = subclass.clone();
        }
        if let Some(status) = &self.status {
            form.hostile_status = status.clone();
        }
        if let Some(guild) = &self.guild {
            form.in_guild = true;
            form.guild_name = guild.clone();
        }
        if self.no_guild {
            form.in_guild = false;
            form.guild_name.clear();
            form.guild_rank_known = false;
            form.guild_rank.clear();
        }
        if let Some(rank) = &self.rank {
            let rank = rank.trim();
            form.guild_rank_known = !rank.is_empty() && !rank.eq_ignore_ascii_case("unknown");
            form.guild_rank = if form.guild_rank_known {
                rank.to_string()
            } else {
                String::new()
            };
        }
        if let Some(notes) = &self.notes {
            form.notes = notes.clone();
        }
        if let Some(discord) = &self.discord {
            form.discord = discord.clone();
        }
        if let Some(associates) = &self.associates {
            form.associates = associates.clone();
        }
    }
}

/// Handle the show command.
pub fn handle_show(app: &CliApp, name: &str, json: bool) -> bool {
    match app.get_player(name) {
        Ok(Some(player)) => {
            if json {
                match serde_json::to_string_pretty(&player) {
                    Ok(out) => println!("{}", out),
                    Err(e) => {
                        report_error(&RosterError::from(e));
                        return false;
                    }
                }
            } else {
                print_player(&player);
            }
            true
        }
        Ok(None) => {
            report_error(&RosterError::NotFound(name.to_string()));
            false
        }
        Err(e) => {
            report_error(&e);
            false
        }
    }
}

/// Handle the add command.
pub fn handle_add(app: &CliApp, name: &str, level: &str, class: &str, fields: &PlayerFields) -> bool {
    let mut form = PlayerForm {
        name: name.to_string(),
        level: level.to_string(),
        class: class.to_string(),
        ..Default::default()
    };
    fields.apply(&mut form);

    match app.add_player(&form) {
        Ok(outcome) => {
            println!("✓ Added '{}'", outcome.player.name);
            if let Some(e) = outcome.audit_error {
                eprintln!("⚠ Audit entry not written: {}", e);
            }
            true
        }
        Err(e) => {
            report_error(&e);
            false
        }
    }
}

/// Handle the update command.
pub fn handle_update(
    app: &CliApp,
    name: &str,
    level: Option<&str>,
    class: Option<&str>,
    fields: &PlayerFields,
    then_export: bool,
) -> bool {
    let current = match app.get_player(name) {
        Ok(Some(player)) => player,
        Ok(None) => {
            report_error(&RosterError::NotFound(name.to_string()));
            return false;
        }
        Err(e) => {
            report_error(&e);
            return false;
        }
    };

    let mut form = PlayerForm::from_player(&current);
    if let Some(level) = level {
        form.level = level.to_string();
    }
    if let Some(class) = class {
        form.class = class.to_string();
    }
    fields.apply(&mut form);

    let outcome = match app.update_player(&form) {
        Ok(outcome) => outcome,
        Err(e) => {
            report_error(&e);
            return false;
        }
    };

    println!("✓ Updated '{}'", outcome.player.name);
    println!("  Changes: {}", outcome.changes);
    if let Some(e) = &outcome.audit_error {
        eprintln!("⚠ Audit entry not written: {}", e);
    }

    let links = &outcome.links;
    if !links.linked.is_empty() {
        println!("  Linked back from: {}", links.linked.join(", "));
    }
    if !links.missing.is_empty() {
        println!(
            "  Not on the roster (no back-link): {}",
            links.missing.join(", ")
        );
    }
    for failure in &links.failures {
        eprintln!("⚠ Could not link '{}': {}", failure.associate, failure.error);
    }

    let exported = then_export.then(|| export::handle_export(app, None));
    update_succeeded(links, exported)
}

/// Exit status of an update: failed back-links and a failed export both count.
fn update_succeeded(links: &LinkReport, exported: Option<bool>) -> bool {
    links.failures.is_empty() && exported.unwrap_or(true)
}

fn print_player(player: &Player) {
    println!("{}", player.name);
    println!("{}", "=".repeat(player.name.chars().count()));
    println!("Level:          {}", player.level);
    println!("Class:          {}", player.class);
    println!("Subclass:       {}", player.subclass);
    println!("Hostile status: {}", player.hostile_status);
    println!("Guild:          {}", player.guild);
    println!(
        "Discord:        {}",
        player.discord.as_deref().unwrap_or(roster_core::player::NOT_APPLICABLE)
    );
    if player.known_associates.is_empty() {
        println!("Associates:     (none)");
    } else {
        println!("Associates:     {}", player.known_associates.join(", "));
    }
    if !player.notes.is_empty() {
        println!("Notes:          {}", player.notes);
    }
    if let Some(by) = &player.updated_by {
        println!(
            "Last update:    {} by {}",
            util::format_time(player.updated_at),
            by
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::links::LinkFailure;

    fn failed_link() -> LinkReport {
        LinkReport {
            failures: vec![LinkFailure {
                associate: "Mira".into(),
                error: RosterError::NotFound("mira".into()),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_update_status_counts_link_failures_with_export() {
        assert!(!update_succeeded(&failed_link(), Some(true)));
        assert!(!update_succeeded(&failed_link(), None));
        assert!(!update_succeeded(&LinkReport::default(), Some(false)));
        assert!(update_succeeded(&LinkReport::default(), Some(true)));
        assert!(update_succeeded(&LinkReport::default(), None));
    }

    #[test]
    fn test_rank_unknown_clears_known_flag() {
        let mut form = PlayerForm {
            in_guild: true,
            guild_name: "Ashen Vow".into(),
            guild_rank_known: true,
            guild_rank: "Officer".into(),
            ..Default::default()
        };
        let fields = PlayerFields {
            rank: Some("Unknown".into()),
            ..Default::default()
        };
        fields.apply(&mut form);
        assert!(!form.guild_rank_known);
        assert!(form.guild_rank.is_empty());
        assert!(form.in_guild);
    }

    #[test]
    fn test_no_guild_resets_guild_fields() {
        let mut form = PlayerForm {
            in_guild: true,
            guild_name: "Ashen Vow".into(),
            ..Default::default()
        };
        let fields = PlayerFields {
            no_guild: true,
            ..Default::default()
        };
        fields.apply(&mut form);
        assert!(!form.in_guild);
        assert!(form.guild_name.is_empty());
    }

    #[test]
    fn test_unset_flags_leave_form_alone() {
        let mut form = PlayerForm {
            notes: "keep".into(),
            associates: "Mira".into(),
            ..Default::default()
        };
        let before = form.clone();
        PlayerFields::default().apply(&mut form);
        assert_eq!(form, before);
    }
}
