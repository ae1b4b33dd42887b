//! Category grouping.
//!
//! The catalog tags songs with fine-grained categories; the game exposes four
//! coarse genre groups on top of them. `ROCK`, `RAP` and `POP` are configured
//! explicitly. `OTHER` is either configured too or derived as every category
//! that no named group claims.

use crate::catalog_store::{CatalogStore, Category, CategoryClause};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupName {
    Rock,
    Rap,
    Pop,
    Other,
}

impl GroupName {
    pub const ALL: [GroupName; 4] = [
        GroupName::Rock,
        GroupName::Rap,
        GroupName::Pop,
        GroupName::Other,
    ];

    /// Groups that are always configured explicitly.
    pub const NAMED: [GroupName; 3] = [GroupName::Rock, GroupName::Rap, GroupName::Pop];

    pub fn token(&self) -> &'static str {
        match self {
            GroupName::Rock => "ROCK",
            GroupName::Rap => "RAP",
            GroupName::Pop => "POP",
            GroupName::Other => "OTHER",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.token() == token)
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Group membership as written in the `[groups]` section of the config file.
///
/// Entries are category ids; an entry equal to a category name is accepted too
/// and translated to that category's id during resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    pub rock: BTreeSet<String>,
    pub rap: BTreeSet<String>,
    pub pop: BTreeSet<String>,
    pub other: BTreeSet<String>,
}

impl GroupConfig {
    pub fn configured(&self, group: GroupName) -> &BTreeSet<String> {
        match group {
            GroupName::Rock => &self.rock,
            GroupName::Rap => &self.rap,
            GroupName::Pop => &self.pop,
            GroupName::Other => &self.other,
        }
    }
}

/// Concrete category id sets for every group, fixed at resolution time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedGroups {
    members: BTreeMap<GroupName, BTreeSet<String>>,
    other_derived: bool,
}

impl ResolvedGroups {
    pub fn resolve(config: &GroupConfig, all_categories: &[Category]) -> Self {
        let ids_by_name: HashMap<&str, &str> = all_categories
            .iter()
            .map(|c| (c.name.as_str(), c.id.as_str()))
            .collect();
        let translate = |entries: &BTreeSet<String>| -> BTreeSet<String> {
            entries
                .iter()
                .map(|entry| match ids_by_name.get(entry.as_str()) {
                    Some(id) => id.to_string(),
                    None => entry.clone(),
                })
                .collect()
        };

        let mut members = BTreeMap::new();
        for group in GroupName::NAMED {
            members.insert(group, translate(config.configured(group)));
        }

        let other_derived = config.other.is_empty();
        let other = if other_derived {
            let claimed: BTreeSet<&String> = members.values().flatten().collect();
            all_categories
                .iter()
                .map(|c| &c.id)
                .filter(|id| !claimed.contains(id))
                .cloned()
                .collect()
        } else {
            translate(&config.other)
        };
        members.insert(GroupName::Other, other);

        for (group, ids) in &members {
            if ids.is_empty() {
                warn!("Genre group {} has no categories, it will match no song", group);
            } else {
                debug!("Genre group {} -> {} categories", group, ids.len());
            }
        }

        ResolvedGroups {
            members,
            other_derived,
        }
    }

    /// Reads every category from `store` and resolves `config` against them.
    pub fn load(config: &GroupConfig, store: &dyn CatalogStore) -> Result<Self> {
        let categories = store
            .list_categories()
            .context("Failed to list catalog categories")?;
        Ok(Self::resolve(config, &categories))
    }

    pub fn members(&self, group: GroupName) -> &BTreeSet<String> {
        static EMPTY: BTreeSet<String> = BTreeSet::new();
        self.members.get(&group).unwrap_or(&EMPTY)
    }

    pub fn is_other_derived(&self) -> bool {
        self.other_derived
    }

    /// Category clause selecting the songs of `group`.
    ///
    /// A derived `OTHER` also excludes every category claimed by a named
    /// group, so a song tagged with both a named and an unclaimed category
    /// never lands in `OTHER`.
    pub fn clause(&self, group: GroupName) -> CategoryClause {
        let exclude = if group == GroupName::Other && self.other_derived {
            GroupName::NAMED
                .iter()
                .flat_map(|g| self.members(*g).iter().cloned())
                .collect()
        } else {
            BTreeSet::new()
        };
        CategoryClause {
            include: self.members(group).clone(),
            exclude,
        }
    }
}
