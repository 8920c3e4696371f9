//! Filtering and sorting over a roster snapshot.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RosterError;
use crate::player::{NOT_APPLICABLE, Player};

/// Column a roster listing is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    Name,
    Level,
    Class,
    HostileStatus,
    Guild,
}

impl FromStr for SortKey {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "name" => Ok(SortKey::Name),
            "level" => Ok(SortKey::Level),
            "class" => Ok(SortKey::Class),
            "hostile-status" | "status" => Ok(SortKey::HostileStatus),
            "guild" => Ok(SortKey::Guild),
            other => Err(RosterError::Validation(format!(
                "unknown sort key '{}' (expected name, level, class, hostile-status or guild)",
                other
            ))),
        }
    }
}

/// Filters and sort order for a roster listing.
///
/// Each filter is an exact, case-insensitive match; set filters are ANDed
/// and an empty filter means no constraint. The guild filter matches the
/// guild name, and `N/A` selects players without a guild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterQuery {
    pub class: Option<String>,
    pub hostile_status: Option<String>,
    pub guild: Option<String>,
    pub sort: SortKey,
}

impl RosterQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn hostile_status(mut self, status: impl Into<String>) -> Self {
        self.hostile_status = Some(status.into());
        self
    }

    pub fn guild(mut self, guild: impl Into<String>) -> Self {
        self.guild = Some(guild.into());
        self
    }

    pub fn sort_by(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    /// Whether `player` passes every filter.
    pub fn matches(&self, player: &Player) -> bool {
        filter_matches(self.class.as_deref(), &player.class)
            && filter_matches(self.hostile_status.as_deref(), player.hostile_status.as_str())
            && filter_matches(
                self.guild.as_deref(),
                player.guild.name().unwrap_or(NOT_APPLICABLE),
            )
    }

    /// Filter and sort a roster snapshot.
    ///
    /// The sort is stable, so ties keep their roster order.
    pub fn apply(&self, roster: &[Player]) -> Vec<Player> {
        let mut result: Vec<Player> = roster
            .iter()
            .filter(|p| self.matches(p))
            .cloned()
            .collect();
        result.sort_by(|a, b| compare(self.sort, a, b));
        result
    }
}

fn filter_matches(filter: Option<&str>, value: &str) -> bool {
    match filter.map(str::trim) {
        None | Some("") => true,
        Some(wanted) => wanted.to_lowercase() == value.trim().to_lowercase(),
    }
}

fn compare(key: SortKey, a: &Player, b: &Player) -> Ordering {
    match key {
        SortKey::Name => caseless(&a.name, &b.name),
        SortKey::Level => a.level.cmp(&b.level),
        SortKey::Class => caseless(&a.class, &b.class),
        SortKey::HostileStatus => {
            caseless(a.hostile_status.as_str(), b.hostile_status.as_str())
        }
        SortKey::Guild => caseless(
            a.guild.name().unwrap_or_default(),
            b.guild.name().unwrap_or_default(),
        ),
    }
}

fn caseless(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}
