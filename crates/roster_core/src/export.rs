//! Export module - write the roster out as cross-linked markdown files
//!
//! The export tree has three folders under the destination:
//!
//! - `players/<Name>.md`: attributes as YAML frontmatter, then links to the
//!   player's guild, associates and Discord handle, then the notes
//! - `guilds/<Guild>.md`: the guild's members
//! - `discord-handles/<Handle>.md`: the characters played from that handle
//!
//! Names that sanitize to the same file name within a folder (compared
//! case-insensitively) are told apart by a numeric suffix given in roster
//! order: `Mr. Smith.md`, then `Mr. Smith (2).md`.
//!
//! Guilds and handles without members produce no file. Existing files with
//! the same name are overwritten; files from earlier exports that no longer
//! match an entity are left alone.

use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{Result, RosterError};
use crate::fs::FileSystem;
use crate::player::{GuildRank, NOT_APPLICABLE, Player};

pub const PLAYERS_DIR: &str = "players";
pub const GUILDS_DIR: &str = "guilds";
pub const DISCORD_DIR: &str = "discord-handles";

/// Kind of export unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitKind {
    Player,
    Guild,
    DiscordHandle,
}

impl UnitKind {
    /// Folder holding units of this kind.
    pub fn dir(&self) -> &'static str {
        match self {
            UnitKind::Player => PLAYERS_DIR,
            UnitKind::Guild => GUILDS_DIR,
            UnitKind::DiscordHandle => DISCORD_DIR,
        }
    }

    /// Path of the unit for `name`, relative to the export root.
    pub fn unit_path(&self, name: &str) -> PathBuf {
        Path::new(self.dir()).join(format!("{}.md", sanitize_file_name(name)))
    }
}

/// One rendered file.
#[derive(Debug, Clone, Serialize)]
pub struct ExportUnit {
    pub kind: UnitKind,
    /// Path relative to the destination
    pub relative_path: PathBuf,
    pub content: String,
}

/// Result of planning an export operation
#[derive(Debug, Clone, Serialize)]
pub struct ExportPlan {
    /// Units in write order: players, then guilds, then Discord handles
    pub units: Vec<ExportUnit>,
    /// Destination directory
    pub destination: PathBuf,
}

impl ExportPlan {
    pub fn count(&self, kind: UnitKind) -> usize {
        self.units.iter().filter(|u| u.kind == kind).count()
    }
}

/// Statistics from an export operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    pub players: usize,
    pub guilds: usize,
    pub discord_handles: usize,
}

impl std::fmt::Display for ExportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Exported {} players, {} guilds, {} discord handles",
            self.players, self.guilds, self.discord_handles
        )
    }
}

/// Group players by guild name.
///
/// Names match case-insensitively; the first spelling seen names the group.
/// Groups and their members keep roster order.
pub fn guild_members(roster: &[Player]) -> IndexMap<String, Vec<&Player>> {
    group_by(roster, |p| p.guild.name())
}

/// Group players by Discord handle, like [`guild_members`].
pub fn discord_characters(roster: &[Player]) -> IndexMap<String, Vec<&Player>> {
    group_by(roster, |p| p.discord.as_deref())
}

fn group_by<'a, F>(roster: &'a [Player], key: F) -> IndexMap<String, Vec<&'a Player>>
where
    F: Fn(&'a Player) -> Option<&'a str>,
{
    let mut groups: IndexMap<String, Vec<&Player>> = IndexMap::new();
    for player in roster {
        let Some(name) = key(player).map(str::trim).filter(|n| !n.is_empty()) else {
            continue;
        };
        match groups
            .iter_mut()
            .find(|(existing, _)| existing.to_lowercase() == name.to_lowercase())
        {
            Some((_, members)) => members.push(player),
            None => {
                groups.insert(name.to_string(), vec![player]);
            }
        }
    }
    groups
}

/// Look up the group spelling for `name`.
fn group_name<'g>(groups: &'g IndexMap<String, Vec<&Player>>, name: &str) -> Option<&'g str> {
    let name = name.trim().to_lowercase();
    groups
        .keys()
        .find(|k| k.to_lowercase() == name)
        .map(String::as_str)
}

/// Replace path separators and characters that are reserved in file names.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_end_matches('.');
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned.to_string()
    }
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Unit paths for one export, unique within each folder.
struct UnitPaths {
    players: HashMap<String, PathBuf>,
    guilds: HashMap<String, PathBuf>,
    handles: HashMap<String, PathBuf>,
}

impl UnitPaths {
    fn allocate(
        roster: &[Player],
        guilds: &IndexMap<String, Vec<&Player>>,
        handles: &IndexMap<String, Vec<&Player>>,
    ) -> Self {
        Self {
            players: allocate_paths(UnitKind::Player, roster.iter().map(|p| p.name.as_str())),
            guilds: allocate_paths(UnitKind::Guild, guilds.keys().map(String::as_str)),
            handles: allocate_paths(UnitKind::DiscordHandle, handles.keys().map(String::as_str)),
        }
    }

    fn path(&self, kind: UnitKind, name: &str) -> PathBuf {
        let paths = match kind {
            UnitKind::Player => &self.players,
            UnitKind::Guild => &self.guilds,
            UnitKind::DiscordHandle => &self.handles,
        };
        paths
            .get(&name_key(name))
            .cloned()
            .unwrap_or_else(|| kind.unit_path(name))
    }
}

fn allocate_paths<'a>(
    kind: UnitKind,
    names: impl Iterator<Item = &'a str>,
) -> HashMap<String, PathBuf> {
    let mut taken = HashSet::new();
    let mut paths = HashMap::new();
    for name in names {
        let key = name_key(name);
        if paths.contains_key(&key) {
            continue;
        }
        let base = sanitize_file_name(name);
        let mut file = base.clone();
        let mut n = 1;
        while !taken.insert(file.to_lowercase()) {
            n += 1;
            file = format!("{} ({})", base, n);
        }
        if n > 1 {
            log::debug!("'{}' exported as '{}.md' to avoid a name clash", name, file);
        }
        paths.insert(key, Path::new(kind.dir()).join(format!("{}.md", file)));
    }
    paths
}

/// Markdown link from the unit at `from` to the unit at `to` (both relative
/// to the export root).
fn link(label: &str, from: &Path, to: &Path) -> String {
    let from_dir = from.parent().unwrap_or(Path::new(""));
    let relative = pathdiff::diff_paths(to, from_dir).unwrap_or_else(|| to.to_path_buf());
    let target = relative
        .components()
        .map(|c| match c {
            Component::ParentDir => "..".to_string(),
            other => other.as_os_str().to_string_lossy().into_owned(),
        })
        .collect::<Vec<_>>()
        .join("/");

    if target.contains(' ') {
        format!("[{}](<{}>)", label, target)
    } else {
        format!("[{}]({})", label, target)
    }
}

#[derive(Serialize)]
struct PlayerAttributes<'a> {
    name: &'a str,
    level: u8,
    class: &'a str,
    subclass: String,
    hostile_status: &'a str,
    guild: &'a str,
    guild_rank: &'a str,
    discord: &'a str,
    known_associates: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_by: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<String>,
}

impl<'a> PlayerAttributes<'a> {
    fn new(player: &'a Player) -> Self {
        let guild_rank = match player.guild.rank() {
            None => NOT_APPLICABLE,
            Some(GuildRank::Undisclosed) => crate::player::UNDISCLOSED,
            Some(GuildRank::Named(rank)) => rank,
        };
        Self {
            name: &player.name,
            level: player.level,
            class: &player.class,
            subclass: player.subclass.to_string(),
            hostile_status: player.hostile_status.as_str(),
            guild: player.guild.name().unwrap_or(NOT_APPLICABLE),
            guild_rank,
            discord: player.discord.as_deref().unwrap_or(NOT_APPLICABLE),
            known_associates: &player.known_associates,
            updated_by: player.updated_by.as_deref(),
            updated_at: player.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Build the export plan for a roster snapshot.
///
/// Pure: the same roster always yields the same units in the same order.
pub fn plan_export(roster: &[Player], destination: &Path) -> Result<ExportPlan> {
    let guilds = guild_members(roster);
    let handles = discord_characters(roster);
    let paths = UnitPaths::allocate(roster, &guilds, &handles);
    let mut units = Vec::with_capacity(roster.len() + guilds.len() + handles.len());

    for player in roster {
        units.push(render_player(player, roster, &guilds, &handles, &paths)?);
    }
    for (guild, members) in &guilds {
        units.push(render_group(UnitKind::Guild, guild, members, "Members", &paths));
    }
    for (handle, characters) in &handles {
        units.push(render_group(
            UnitKind::DiscordHandle,
            handle,
            characters,
            "Characters",
            &paths,
        ));
    }

    Ok(ExportPlan {
        units,
        destination: destination.to_path_buf(),
    })
}

fn render_player(
    player: &Player,
    roster: &[Player],
    guilds: &IndexMap<String, Vec<&Player>>,
    handles: &IndexMap<String, Vec<&Player>>,
    paths: &UnitPaths,
) -> Result<ExportUnit> {
    let path = paths.path(UnitKind::Player, &player.name);
    let yaml = serde_yaml::to_string(&PlayerAttributes::new(player))?;

    let mut body = format!("# {}\n\n", player.name);

    let guild_line = match player.guild.name().and_then(|g| group_name(guilds, g)) {
        Some(guild) => link(guild, &path, &paths.path(UnitKind::Guild, guild)),
        None => NOT_APPLICABLE.to_string(),
    };
    body.push_str(&format!("- Guild: {}\n", guild_line));

    let discord_line = match player.discord.as_deref().and_then(|d| group_name(handles, d)) {
        Some(handle) => link(handle, &path, &paths.path(UnitKind::DiscordHandle, handle)),
        None => NOT_APPLICABLE.to_string(),
    };
    body.push_str(&format!("- Discord: {}\n", discord_line));

    if !player.known_associates.is_empty() {
        body.push_str("\n## Known Associates\n\n");
        for associate in &player.known_associates {
            // Only link associates that have a unit of their own.
            match roster.iter().find(|p| p.is_named(associate)) {
                Some(other) => body.push_str(&format!(
                    "- {}\n",
                    link(associate, &path, &paths.path(UnitKind::Player, &other.name))
                )),
                None => body.push_str(&format!("- {}\n", associate)),
            }
        }
    }

    if !player.notes.trim().is_empty() {
        body.push_str(&format!("\n## Notes\n\n{}\n", player.notes.trim()));
    }

    Ok(ExportUnit {
        kind: UnitKind::Player,
        relative_path: path,
        content: format!("---\n{}---\n{}", yaml, body),
    })
}

fn render_group(
    kind: UnitKind,
    name: &str,
    members: &[&Player],
    heading: &str,
    paths: &UnitPaths,
) -> ExportUnit {
    let path = paths.path(kind, name);
    let mut content = format!("# {}\n\n## {}\n\n", name, heading);
    for member in members {
        let mut line = link(
            &member.name,
            &path,
            &paths.path(UnitKind::Player, &member.name),
        );
        if kind == UnitKind::Guild
            && let Some(GuildRank::Named(rank)) = member.guild.rank()
        {
            line.push_str(&format!(" ({})", rank));
        }
        content.push_str(&format!("- {}\n", line));
    }
    ExportUnit {
        kind,
        relative_path: path,
        content,
    }
}

/// Export operations
pub struct Exporter<FS: FileSystem> {
    fs: FS,
}

impl<FS: FileSystem> Exporter<FS> {
    pub fn new(fs: FS) -> Self {
        Self { fs }
    }

    /// Plan and write an export in one step.
    pub fn export(&self, roster: &[Player], destination: &Path) -> Result<ExportStats> {
        let plan = plan_export(roster, destination)?;
        self.execute_export(&plan)
    }

    /// Write every unit of a plan, creating folders as needed.
    ///
    /// Stops at the first write failure; units written before it stay on disk.
    pub fn execute_export(&self, plan: &ExportPlan) -> Result<ExportStats> {
        let mut stats = ExportStats::default();

        for unit in &plan.units {
            let dest_path = plan.destination.join(&unit.relative_path);
            if let Some(parent) = dest_path.parent()
                && !self.fs.is_dir(parent)
            {
                self.fs
                    .create_dir_all(parent)
                    .map_err(|source| RosterError::FileWrite {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }

            self.fs
                .write_file(&dest_path, &unit.content)
                .map_err(|source| RosterError::FileWrite {
                    path: dest_path.clone(),
                    source,
                })?;
            log::debug!("Exported {}", dest_path.display());

            match unit.kind {
                UnitKind::Player => stats.players += 1,
                UnitKind::Guild => stats.guilds += 1,
                UnitKind::DiscordHandle => stats.discord_handles += 1,
            }
        }

        log::info!("{} to {}", stats, plan.destination.display());
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{Guild, HostileStatus};
    use crate::test_utils::MockFileSystem;

    fn roster() -> Vec<Player> {
        let mut thorne = Player::new("Thorne", 10, "Warrior");
        thorne.known_associates = vec!["Mira".into(), "Ghost".into()];
        thorne.notes = "Guards the north gate".into();

        let mut mira = Player::new("Mira", 30, "Mage");
        mira.guild = Guild::member("Ashen Vow", GuildRank::Named("Officer".into()));
        mira.discord = Some("raven".into());
        mira.hostile_status = HostileStatus::Hostile;
        mira.known_associates = vec!["Thorne".into()];

        let mut bob = Player::new("Bob", 12, "Rogue");
        bob.guild = Guild::member("ashen vow", GuildRank::Undisclosed);
        bob.discord = Some("raven".into());

        vec![thorne, mira, bob]
    }

    #[test]
    fn test_groups_keep_first_seen_spelling_and_roster_order() {
        let roster = roster();
        let guilds = guild_members(&roster);
        assert_eq!(guilds.len(), 1);
        let (name, members) = guilds.get_index(0).unwrap();
        assert_eq!(name, "Ashen Vow");
        let names: Vec<&str> = members.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Mira", "Bob"]);

        let handles = discord_characters(&roster);
        assert_eq!(handles.keys().collect::<Vec<_>>(), vec!["raven"]);
    }

    #[test]
    fn test_plan_has_no_empty_units() {
        let plan = plan_export(&roster(), Path::new("/export")).unwrap();
        assert_eq!(plan.count(UnitKind::Player), 3);
        assert_eq!(plan.count(UnitKind::Guild), 1);
        assert_eq!(plan.count(UnitKind::DiscordHandle), 1);

        let solo = vec![Player::new("Thorne", 10, "Warrior")];
        let plan = plan_export(&solo, Path::new("/export")).unwrap();
        assert_eq!(plan.units.len(), 1);
    }

    #[test]
    fn test_player_unit_links() {
        let plan = plan_export(&roster(), Path::new("/export")).unwrap();
        let mira = &plan.units[1];
        assert_eq!(mira.relative_path, PathBuf::from("players/Mira.md"));
        assert!(mira.content.starts_with("---\nname: Mira\n"));
        assert!(mira.content.contains("guild_rank: Officer"));
        assert!(mira.content.contains("- Guild: [Ashen Vow](<../guilds/Ashen Vow.md>)"));
        assert!(mira.content.contains("- Discord: [raven](../discord-handles/raven.md)"));
        assert!(mira.content.contains("- [Thorne](Thorne.md)"));

        let thorne = &plan.units[0];
        assert!(thorne.content.contains("guild: N/A"));
        assert!(thorne.content.contains("- Guild: N/A"));
        assert!(thorne.content.contains("- [Mira](Mira.md)"));
        assert!(thorne.content.contains("- Ghost\n"));
        assert!(thorne.content.contains("## Notes\n\nGuards the north gate"));
    }

    #[test]
    fn test_bob_links_to_canonical_guild_unit() {
        let plan = plan_export(&roster(), Path::new("/export")).unwrap();
        let bob = &plan.units[2];
        assert!(bob.content.contains("[Ashen Vow](<../guilds/Ashen Vow.md>)"));
    }

    #[test]
    fn test_group_units_list_members() {
        let plan = plan_export(&roster(), Path::new("/export")).unwrap();
        let guild = &plan.units[3];
        assert_eq!(guild.kind, UnitKind::Guild);
        assert_eq!(
            guild.content,
            "# Ashen Vow\n\n## Members\n\n- [Mira](../players/Mira.md) (Officer)\n- [Bob](../players/Bob.md)\n"
        );
        let handle = &plan.units[4];
        assert_eq!(
            handle.content,
            "# raven\n\n## Characters\n\n- [Mira](../players/Mira.md)\n- [Bob](../players/Bob.md)\n"
        );
    }

    #[test]
    fn test_plan_is_deterministic() {
        let a = plan_export(&roster(), Path::new("/export")).unwrap();
        let b = plan_export(&roster(), Path::new("/export")).unwrap();
        let contents = |p: &ExportPlan| p.units.iter().map(|u| u.content.clone()).collect::<Vec<_>>();
        assert_eq!(contents(&a), contents(&b));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Ashen Vow"), "Ashen Vow");
        assert_eq!(sanitize_file_name("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_file_name(" ..."), "_");
        assert_eq!(sanitize_file_name("Mr. Smith."), "Mr. Smith");
    }

    #[test]
    fn test_execute_overwrites_and_keeps_stale_units() {
        let fs = MockFileSystem::new()
            .with_file("/export/players/Mira.md", "old")
            .with_file("/export/players/Retired.md", "stale");

        let stats = Exporter::new(fs.clone())
            .export(&roster(), Path::new("/export"))
            .unwrap();
        assert_eq!(
            stats,
            ExportStats {
                players: 3,
                guilds: 1,
                discord_handles: 1
            }
        );

        let mira = fs.get_content("/export/players/Mira.md").unwrap();
        assert!(mira.contains("name: Mira"));
        assert_eq!(
            fs.get_content("/export/players/Retired.md").as_deref(),
            Some("stale")
        );
        assert!(fs.get_content("/export/guilds/Ashen Vow.md").is_some());
        assert!(fs.get_content("/export/discord-handles/raven.md").is_some());
    }

    #[test]
    fn test_clashing_file_names_get_distinct_units() {
        let mut smith = Player::new("Mr. Smith", 10, "Warrior");
        smith.guild = Guild::member("Iron: Hand", GuildRank::Undisclosed);
        let mut dotted = Player::new("Mr. Smith.", 20, "Rogue");
        dotted.known_associates = vec!["Mr. Smith".into()];
        dotted.guild = Guild::member("Iron? Hand", GuildRank::Undisclosed);
        let roster = vec![smith, dotted];

        let plan = plan_export(&roster, Path::new("/export")).unwrap();
        let paths: Vec<&Path> = plan.units.iter().map(|u| u.relative_path.as_path()).collect();
        assert_eq!(
            paths,
            vec![
                Path::new("players/Mr. Smith.md"),
                Path::new("players/Mr. Smith (2).md"),
                Path::new("guilds/Iron_ Hand.md"),
                Path::new("guilds/Iron_ Hand (2).md"),
            ]
        );
        assert!(plan.units[1].content.contains("- [Mr. Smith](<Mr. Smith.md>)"));
        assert!(
            plan.units[1]
                .content
                .contains("- Guild: [Iron? Hand](<../guilds/Iron_ Hand (2).md>)")
        );
        assert!(
            plan.units[3]
                .content
                .contains("- [Mr. Smith.](<../players/Mr. Smith (2).md>)")
        );

        let fs = MockFileSystem::new();
        let stats = Exporter::new(fs.clone())
            .export(&roster, Path::new("/export"))
            .unwrap();
        assert_eq!(stats.players, 2);
        assert_eq!(stats.guilds, 2);
        assert!(fs.get_content("/export/players/Mr. Smith (2).md").is_some());
    }
}
