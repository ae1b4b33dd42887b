//! The four game dimensions a variant key is made of.

use crate::catalog_store::{RatingRange, YearBound};
use crate::groups::GroupName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token shared by every dimension for "any value".
pub const WILDCARD_TOKEN: &str = "RANDOM";

/// A closed, ordered set of values, one of which is the wildcard.
pub trait Dimension: Copy + Eq + Sized + 'static {
    /// Every value, wildcard last.
    const ALL: &'static [Self];

    fn token(&self) -> &'static str;

    fn is_wildcard(&self) -> bool;

    fn from_token(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.token() == token)
    }

    /// Every value except the wildcard.
    fn concrete() -> impl Iterator<Item = Self> {
        Self::ALL.iter().copied().filter(|v| !v.is_wildcard())
    }
}

macro_rules! impl_display_by_token {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.token())
                }
            }
        )*
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    VeryEasy,
    Easy,
    Medium,
    Hard,
    VeryHard,
    Random,
}

impl Dimension for Difficulty {
    const ALL: &'static [Self] = &[
        Difficulty::VeryEasy,
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::VeryHard,
        Difficulty::Random,
    ];

    fn token(&self) -> &'static str {
        match self {
            Difficulty::VeryEasy => "VERYEASY",
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
            Difficulty::VeryHard => "VERYHARD",
            Difficulty::Random => WILDCARD_TOKEN,
        }
    }

    fn is_wildcard(&self) -> bool {
        *self == Difficulty::Random
    }
}

impl Difficulty {
    /// Ratings a song may have to fit this tier. Neighbouring tiers overlap.
    pub fn rating_range(&self) -> Option<RatingRange> {
        match self {
            Difficulty::VeryEasy => Some(RatingRange::new(1, 2)),
            Difficulty::Easy => Some(RatingRange::new(1, 3)),
            Difficulty::Medium => Some(RatingRange::new(2, 4)),
            Difficulty::Hard => Some(RatingRange::new(3, 5)),
            Difficulty::VeryHard => Some(RatingRange::new(4, 5)),
            Difficulty::Random => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Genre {
    Rock,
    Rap,
    Pop,
    Other,
    Random,
}

impl Dimension for Genre {
    const ALL: &'static [Self] = &[
        Genre::Rock,
        Genre::Rap,
        Genre::Pop,
        Genre::Other,
        Genre::Random,
    ];

    fn token(&self) -> &'static str {
        match self {
            Genre::Rock => "ROCK",
            Genre::Rap => "RAP",
            Genre::Pop => "POP",
            Genre::Other => "OTHER",
            Genre::Random => WILDCARD_TOKEN,
        }
    }

    fn is_wildcard(&self) -> bool {
        *self == Genre::Random
    }
}

impl Genre {
    pub fn group(&self) -> Option<GroupName> {
        match self {
            Genre::Rock => Some(GroupName::Rock),
            Genre::Rap => Some(GroupName::Rap),
            Genre::Pop => Some(GroupName::Pop),
            Genre::Other => Some(GroupName::Other),
            Genre::Random => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    Local,
    International,
    Random,
}

impl Dimension for Region {
    const ALL: &'static [Self] = &[Region::Local, Region::International, Region::Random];

    fn token(&self) -> &'static str {
        match self {
            Region::Local => "LOCAL",
            Region::International => "INTERNATIONAL",
            Region::Random => WILDCARD_TOKEN,
        }
    }

    fn is_wildcard(&self) -> bool {
        *self == Region::Random
    }
}

/// Catalog tags the region dimension maps to.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegionTags {
    pub local: String,
    pub international: String,
}

impl Default for RegionTags {
    fn default() -> Self {
        RegionTags {
            local: "local".to_string(),
            international: "international".to_string(),
        }
    }
}

impl Region {
    pub fn tag(&self, tags: &RegionTags) -> Option<String> {
        match self {
            Region::Local => Some(tags.local.clone()),
            Region::International => Some(tags.international.clone()),
            Region::Random => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Era {
    #[serde(rename = "PRE2000")]
    Pre2000,
    #[serde(rename = "2000TO2015")]
    From2000To2015,
    #[serde(rename = "POST2015")]
    Post2015,
    #[serde(rename = "RANDOM")]
    Random,
}

impl Dimension for Era {
    const ALL: &'static [Self] = &[Era::Pre2000, Era::From2000To2015, Era::Post2015, Era::Random];

    fn token(&self) -> &'static str {
        match self {
            Era::Pre2000 => "PRE2000",
            Era::From2000To2015 => "2000TO2015",
            Era::Post2015 => "POST2015",
            Era::Random => WILDCARD_TOKEN,
        }
    }

    fn is_wildcard(&self) -> bool {
        *self == Era::Random
    }
}

impl Era {
    pub fn year_bound(&self) -> Option<YearBound> {
        match self {
            Era::Pre2000 => Some(YearBound::Before(2000)),
            Era::From2000To2015 => Some(YearBound::Between {
                from: 2000,
                to: 2015,
            }),
            Era::Post2015 => Some(YearBound::After(2015)),
            Era::Random => None,
        }
    }
}

impl_display_by_token!(Difficulty, Genre, Region, Era);
