//! Variant keys: `DIFFICULTY-GENRE-REGION-ERA`.

use super::dimensions::{Difficulty, Dimension, Era, Genre, Region};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref KEY_GRAMMAR: Regex = Regex::new(r"^[A-Z0-9]+(-[A-Z0-9]+){3}$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid variant key {key:?}: {reason}")]
pub struct KeyParseError {
    pub key: String,
    pub reason: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantKey {
    pub difficulty: Difficulty,
    pub genre: Genre,
    pub region: Region,
    pub era: Era,
}

impl VariantKey {
    pub fn new(difficulty: Difficulty, genre: Genre, region: Region, era: Era) -> Self {
        VariantKey {
            difficulty,
            genre,
            region,
            era,
        }
    }

    /// Every key of the cartesian product, in dimension order.
    pub fn all() -> Vec<VariantKey> {
        let mut keys = Vec::with_capacity(
            Difficulty::ALL.len() * Genre::ALL.len() * Region::ALL.len() * Era::ALL.len(),
        );
        for difficulty in Difficulty::ALL {
            for genre in Genre::ALL {
                for region in Region::ALL {
                    for era in Era::ALL {
                        keys.push(VariantKey::new(*difficulty, *genre, *region, *era));
                    }
                }
            }
        }
        keys
    }

    /// Number of wildcard segments.
    pub fn count_randoms(&self) -> usize {
        [
            self.difficulty.is_wildcard(),
            self.genre.is_wildcard(),
            self.region.is_wildcard(),
            self.era.is_wildcard(),
        ]
        .iter()
        .filter(|w| **w)
        .count()
    }

    /// Number of fixed (non-wildcard) segments.
    pub fn info_count(&self) -> usize {
        4 - self.count_randoms()
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.difficulty, self.genre, self.region, self.era
        )
    }
}

fn segment<D: Dimension>(key: &str, token: &str, dimension: &str) -> Result<D, KeyParseError> {
    D::from_token(token).ok_or_else(|| KeyParseError {
        key: key.to_string(),
        reason: format!("unknown {} {:?}", dimension, token),
    })
}

impl FromStr for VariantKey {
    type Err = KeyParseError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        if !KEY_GRAMMAR.is_match(key) {
            return Err(KeyParseError {
                key: key.to_string(),
                reason: "expected four uppercase segments separated by '-'".to_string(),
            });
        }
        let parts: Vec<&str> = key.split('-').collect();
        Ok(VariantKey {
            difficulty: segment(key, parts[0], "difficulty")?,
            genre: segment(key, parts[1], "genre")?,
            region: segment(key, parts[2], "region")?,
            era: segment(key, parts[3], "era")?,
        })
    }
}

impl Serialize for VariantKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VariantKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
