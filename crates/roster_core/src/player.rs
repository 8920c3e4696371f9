//! Player records.
//!
//! [`Player`] is the typed record stored in the `players` collection, keyed by
//! the lowercased name. Optional parts are explicit enums; the sentinel
//! strings `"N/A"`, `"Unknown"` and `"Unavailable"` only appear on the wire.
//!
//! [`PlayerForm`] is the raw operator input behind an add or update. Calling
//! [`PlayerForm::validate`] is the only way input becomes a [`Player`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::document::{Document, FieldValue, Record};
use crate::error::{Result, RosterError};
use crate::store::Collection;

/// Lowest valid level
pub const MIN_LEVEL: u8 = 1;
/// Highest valid level
pub const MAX_LEVEL: u8 = 50;
/// Level from which a subclass can be chosen
pub const SUBCLASS_LEVEL: u8 = 25;

/// Wire sentinel: not in a guild / no Discord handle
pub const NOT_APPLICABLE: &str = "N/A";
/// Wire sentinel: guild rank not disclosed
pub const UNDISCLOSED: &str = "Unknown";
/// Wire sentinel: subclass gated by level
pub const UNAVAILABLE: &str = "Unavailable";

/// Stored field names.
pub mod fields {
    pub const NAME: &str = "Name";
    pub const LEVEL: &str = "Level";
    pub const CLASS: &str = "Class";
    pub const SUBCLASS: &str = "Subclass";
    pub const HOSTILE_STATUS: &str = "Hostile Status";
    pub const GUILD: &str = "Guild";
    pub const GUILD_RANK: &str = "Guild Rank";
    pub const NOTES: &str = "Notes";
    pub const DISCORD: &str = "Discord";
    pub const KNOWN_ASSOCIATES: &str = "Known Associates";
    pub const UPDATED_BY: &str = "updatedBy";
    pub const UPDATED_AT: &str = "updatedAt";
}

/// Store key for a player name (names are unique case-insensitively).
pub fn player_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Stored form of `updatedAt`: an RFC 3339 string in UTC.
pub fn stored_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Read `updatedAt`, written either as a string or as a timestamp value.
fn read_time(value: &FieldValue) -> Option<DateTime<Utc>> {
    match value {
        FieldValue::Timestamp(ts) => Some(*ts),
        FieldValue::String(raw) => parse_stored_time(raw),
        _ => None,
    }
}

/// Older records carry an offset followed by a stray `Z` (`...+00:00Z`).
fn parse_stored_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw.strip_suffix('Z').unwrap_or(raw)))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Set `updatedBy`/`updatedAt` on a stored player document in place.
pub(crate) fn stamp_document(doc: &mut Document, operator: &str, at: DateTime<Utc>) {
    doc.set(fields::UPDATED_BY, operator);
    doc.set(fields::UPDATED_AT, stored_time(at));
}

/// Attitude of a player toward the operators' group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostileStatus {
    Friendly,
    #[default]
    Neutral,
    Hostile,
}

impl HostileStatus {
    pub const ALL: [HostileStatus; 3] = [
        HostileStatus::Friendly,
        HostileStatus::Neutral,
        HostileStatus::Hostile,
    ];

    /// Stored (capitalized) form.
    pub fn as_str(&self) -> &'static str {
        match self {
            HostileStatus::Friendly => "Friendly",
            HostileStatus::Neutral => "Neutral",
            HostileStatus::Hostile => "Hostile",
        }
    }

    /// Case-insensitive parse.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value))
    }
}

impl std::fmt::Display for HostileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subclass, which only exists from [`SUBCLASS_LEVEL`] on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Subclass {
    /// Below the subclass level, or none chosen yet
    #[default]
    Unavailable,
    Named(String),
}

impl Subclass {
    pub fn name(&self) -> Option<&str> {
        match self {
            Subclass::Unavailable => None,
            Subclass::Named(name) => Some(name),
        }
    }
}

impl std::fmt::Display for Subclass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name().unwrap_or(UNAVAILABLE))
    }
}

/// Rank inside a guild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuildRank {
    /// The player is in a guild but the rank is not known
    #[default]
    Undisclosed,
    Named(String),
}

impl GuildRank {
    pub fn name(&self) -> Option<&str> {
        match self {
            GuildRank::Undisclosed => None,
            GuildRank::Named(name) => Some(name),
        }
    }
}

/// Guild membership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Guild {
    /// Not in a guild (rank does not apply)
    #[default]
    Unaffiliated,
    Member { name: String, rank: GuildRank },
}

impl Guild {
    pub fn member(name: impl Into<String>, rank: GuildRank) -> Self {
        Guild::Member {
            name: name.into(),
            rank,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Guild::Unaffiliated => None,
            Guild::Member { name, .. } => Some(name),
        }
    }

    pub fn rank(&self) -> Option<&GuildRank> {
        match self {
            Guild::Unaffiliated => None,
            Guild::Member { rank, .. } => Some(rank),
        }
    }

    /// Stored guild-name field.
    fn wire_name(&self) -> &str {
        self.name().unwrap_or(NOT_APPLICABLE)
    }

    /// Stored guild-rank field.
    fn wire_rank(&self) -> &str {
        match self {
            Guild::Unaffiliated => NOT_APPLICABLE,
            Guild::Member { rank, .. } => rank.name().unwrap_or(UNDISCLOSED),
        }
    }
}

/// List-view form: `Guild (Rank)` when the rank is known.
impl std::fmt::Display for Guild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Guild::Unaffiliated => f.write_str(NOT_APPLICABLE),
            Guild::Member {
                name,
                rank: GuildRank::Named(rank),
            } => write!(f, "{} ({})", name, rank),
            Guild::Member { name, .. } => f.write_str(name),
        }
    }
}

/// A player character on the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    /// 1..=50 for records written by this crate; 0 when a stored record has no level
    pub level: u8,
    pub class: String,
    pub subclass: Subclass,
    pub hostile_status: HostileStatus,
    pub guild: Guild,
    pub notes: String,
    pub discord: Option<String>,
    /// Intended-symmetric relation, kept in operator order
    pub known_associates: Vec<String>,
    pub updated_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Player {
    /// Create a minimal player (level-gated fields at their defaults).
    pub fn new(name: impl Into<String>, level: u8, class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level,
            class: class.into(),
            subclass: Subclass::Unavailable,
            hostile_status: HostileStatus::Neutral,
            guild: Guild::Unaffiliated,
            notes: String::new(),
            discord: None,
            known_associates: Vec::new(),
            updated_by: None,
            updated_at: None,
        }
    }

    /// Store key for this player.
    pub fn key(&self) -> String {
        player_key(&self.name)
    }

    /// Whether `name` refers to this player (case-insensitive).
    pub fn is_named(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }

    /// Whether `name` is listed as a known associate (case-insensitive).
    pub fn has_associate(&self, name: &str) -> bool {
        self.known_associates
            .iter()
            .any(|a| a.trim().eq_ignore_ascii_case(name.trim()))
    }

    /// Record who changed this player and when.
    pub fn stamp(&mut self, operator: &str, at: DateTime<Utc>) {
        self.updated_by = Some(operator.to_string());
        self.updated_at = Some(at);
    }
}

impl Record for Player {
    const COLLECTION: Collection = Collection::Players;

    fn to_document(&self) -> Document {
        Document::new()
            .with(fields::NAME, self.name.as_str())
            .with(fields::LEVEL, i64::from(self.level))
            .with(fields::CLASS, self.class.as_str())
            .with(fields::SUBCLASS, self.subclass.to_string())
            .with(fields::HOSTILE_STATUS, self.hostile_status.as_str())
            .with(fields::GUILD, self.guild.wire_name())
            .with(fields::GUILD_RANK, self.guild.wire_rank())
            .with(fields::NOTES, self.notes.as_str())
            .with(
                fields::DISCORD,
                self.discord.as_deref().unwrap_or(NOT_APPLICABLE),
            )
            .with(fields::KNOWN_ASSOCIATES, self.known_associates.clone())
            .with(fields::UPDATED_BY, self.updated_by.clone())
            .with(fields::UPDATED_AT, self.updated_at.map(stored_time))
    }

    fn from_document(doc: &Document) -> Result<Self> {
        let name = doc
            .get_str(fields::NAME)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| RosterError::MalformedDocument {
                key: doc.key().unwrap_or("?").to_string(),
                reason: format!("missing '{}' field", fields::NAME),
            })?
            .to_string();

        let level = doc
            .get_integer(fields::LEVEL)
            .and_then(|l| u8::try_from(l).ok())
            .unwrap_or(0);

        let subclass = match present(doc, fields::SUBCLASS) {
            Some(s) if level >= SUBCLASS_LEVEL && s != UNAVAILABLE => {
                Subclass::Named(s.to_string())
            }
            _ => Subclass::Unavailable,
        };

        let guild = match present(doc, fields::GUILD) {
            Some(g) if g != NOT_APPLICABLE => {
                let rank = match present(doc, fields::GUILD_RANK) {
                    Some(r) if r != UNDISCLOSED && r != NOT_APPLICABLE => {
                        GuildRank::Named(r.to_string())
                    }
                    _ => GuildRank::Undisclosed,
                };
                Guild::member(g, rank)
            }
            _ => Guild::Unaffiliated,
        };

        let discord = present(doc, fields::DISCORD)
            .filter(|d| *d != NOT_APPLICABLE)
            .map(String::from);

        // Older records sometimes hold a single associate as a plain string.
        let known_associates = match doc.get(fields::KNOWN_ASSOCIATES) {
            FieldValue::StringArray(values) => values.clone(),
            FieldValue::String(single) if !single.trim().is_empty() => vec![single.clone()],
            _ => Vec::new(),
        };

        Ok(Self {
            name,
            level,
            class: doc.get_str(fields::CLASS).unwrap_or_default().to_string(),
            subclass,
            hostile_status: doc
                .get_str(fields::HOSTILE_STATUS)
                .and_then(HostileStatus::parse)
                .unwrap_or_default(),
            guild,
            notes: doc.get_str(fields::NOTES).unwrap_or_default().to_string(),
            discord,
            known_associates,
            updated_by: doc.get_str(fields::UPDATED_BY).map(String::from),
            updated_at: read_time(doc.get(fields::UPDATED_AT)),
        })
    }
}

/// Non-empty trimmed string field.
fn present<'a>(doc: &'a Document, field: &str) -> Option<&'a str> {
    doc.get_str(field).map(str::trim).filter(|s| !s.is_empty())
}

/// Raw operator input for an add or update.
///
/// Mirrors what an operator types: the level is text, associates are one
/// comma-separated string, and the guild fields are driven by two toggles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerForm {
    pub name: String,
    pub level: String,
    pub class: String,
    pub subclass: String,
    /// Empty means neutral
    pub hostile_status: String,
    pub in_guild: bool,
    pub guild_name: String,
    pub guild_rank_known: bool,
    pub guild_rank: String,
    pub notes: String,
    pub discord: String,
    /// Comma-separated names
    pub associates: String,
}

impl PlayerForm {
    /// Pre-fill a form from a stored record (used for updates).
    pub fn from_player(player: &Player) -> Self {
        Self {
            name: player.name.clone(),
            level: player.level.to_string(),
            class: player.class.clone(),
            subclass: player.subclass.name().unwrap_or_default().to_string(),
            hostile_status: player.hostile_status.as_str().to_lowercase(),
            in_guild: player.guild.name().is_some(),
            guild_name: player.guild.name().unwrap_or_default().to_string(),
            guild_rank_known: matches!(player.guild.rank(), Some(GuildRank::Named(_))),
            guild_rank: player
                .guild
                .rank()
                .and_then(GuildRank::name)
                .unwrap_or_default()
                .to_string(),
            notes: player.notes.clone(),
            discord: player.discord.clone().unwrap_or_default(),
            associates: player.known_associates.join(", "),
        }
    }

    /// Validate and normalize into a [`Player`].
    ///
    /// `updated_by`/`updated_at` are left empty; the caller stamps them when
    /// the record is written.
    pub fn validate(&self) -> Result<Player> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(RosterError::validation("player name cannot be empty"));
        }
        if name.contains('/') {
            return Err(RosterError::validation(format!(
                "player name cannot contain '/', got '{}'",
                name
            )));
        }

        let level: i64 = self.level.trim().parse().map_err(|_| {
            RosterError::validation(format!("level must be a whole number, got '{}'", self.level.trim()))
        })?;
        if !(i64::from(MIN_LEVEL)..=i64::from(MAX_LEVEL)).contains(&level) {
            return Err(RosterError::validation(format!(
                "level must be between {} and {}",
                MIN_LEVEL, MAX_LEVEL
            )));
        }
        let level = level as u8;

        let class = self.class.trim();
        if class.is_empty() {
            return Err(RosterError::validation("player class cannot be empty"));
        }

        let subclass = match self.subclass.trim() {
            s if level >= SUBCLASS_LEVEL
                && !s.is_empty()
                && !s.eq_ignore_ascii_case(UNAVAILABLE) =>
            {
                Subclass::Named(s.to_string())
            }
            _ => Subclass::Unavailable,
        };

        let hostile_status = match self.hostile_status.trim() {
            "" => HostileStatus::default(),
            s => HostileStatus::parse(s).ok_or_else(|| {
                RosterError::validation(format!(
                    "hostile status must be friendly, neutral or hostile, got '{}'",
                    s
                ))
            })?,
        };

        let guild = if self.in_guild {
            let guild_name = self.guild_name.trim();
            if guild_name.is_empty() {
                return Err(RosterError::validation(
                    "guild name cannot be empty if in a guild",
                ));
            }
            if guild_name.eq_ignore_ascii_case(NOT_APPLICABLE) {
                return Err(RosterError::validation(format!(
                    "guild name cannot be '{}'; leave the guild instead",
                    NOT_APPLICABLE
                )));
            }
            let rank = match self.guild_rank.trim() {
                r if self.guild_rank_known
                    && !r.is_empty()
                    && !r.eq_ignore_ascii_case(NOT_APPLICABLE)
                    && !r.eq_ignore_ascii_case(UNDISCLOSED) =>
                {
                    GuildRank::Named(r.to_string())
                }
                _ => GuildRank::Undisclosed,
            };
            Guild::member(guild_name, rank)
        } else {
            Guild::Unaffiliated
        };

        let discord = Some(self.discord.trim())
            .filter(|d| !d.is_empty() && !d.eq_ignore_ascii_case(NOT_APPLICABLE))
            .map(String::from);

        let mut known_associates: Vec<String> = Vec::new();
        for associate in self.associates.split(',').map(str::trim) {
            if associate.is_empty() {
                continue;
            }
            if associate.eq_ignore_ascii_case(name) {
                return Err(RosterError::validation(format!(
                    "'{}' cannot be their own known associate",
                    name
                )));
            }
            if !known_associates
                .iter()
                .any(|a| a.eq_ignore_ascii_case(associate))
            {
                known_associates.push(associate.to_string());
            }
        }

        Ok(Player {
            name: name.to_string(),
            level,
            class: class.to_string(),
            subclass,
            hostile_status,
            guild,
            notes: self.notes.trim().to_string(),
            discord,
            known_associates,
            updated_by: None,
            updated_at: None,
        })
    }
}
