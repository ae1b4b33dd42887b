//! The published variant table.

use super::key::VariantKey;
use super::predicate::{GroupReference, ResolvedPredicate};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub key: VariantKey,
    pub predicate: ResolvedPredicate,
    pub genre_group_ref: Option<GroupReference>,
    pub match_count: usize,
    /// 1-based position in the table, by match count descending.
    pub rank: usize,
}

/// Immutable snapshot of every variant, produced by one build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariantTable {
    build_id: String,
    built_at: i64,
    catalog_songs: usize,
    ranked: Vec<Variant>,
    by_key: HashMap<VariantKey, usize>,
}

impl VariantTable {
    /// Wraps variants that are already sorted and ranked. Fails with a
    /// description of the first inconsistency found.
    pub fn from_ranked(
        build_id: String,
        built_at: i64,
        catalog_songs: usize,
        ranked: Vec<Variant>,
    ) -> Result<Self, String> {
        check_consistency(&ranked)?;
        let by_key = ranked
            .iter()
            .enumerate()
            .map(|(index, variant)| (variant.key, index))
            .collect();
        Ok(VariantTable {
            build_id,
            built_at,
            catalog_songs,
            ranked,
            by_key,
        })
    }

    /// Table used before any build was published; every lookup misses.
    pub fn empty() -> Self {
        VariantTable {
            build_id: String::new(),
            built_at: 0,
            catalog_songs: 0,
            ranked: Vec::new(),
            by_key: HashMap::new(),
        }
    }

    pub fn get(&self, key: &VariantKey) -> Option<&Variant> {
        self.by_key.get(key).map(|index| &self.ranked[*index])
    }

    pub fn ranked(&self) -> &[Variant] {
        &self.ranked
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    pub fn build_id(&self) -> &str {
        &self.build_id
    }

    pub fn built_at(&self) -> i64 {
        self.built_at
    }

    pub fn catalog_songs(&self) -> usize {
        self.catalog_songs
    }
}

/// Checks that `ranked` covers every key exactly once, is ordered by match
/// count descending with ties in key order, and carries dense ranks from 1.
pub fn check_consistency(ranked: &[Variant]) -> Result<(), String> {
    let mut seen = HashSet::with_capacity(ranked.len());
    for (index, variant) in ranked.iter().enumerate() {
        if !seen.insert(variant.key) {
            return Err(format!("duplicate variant key {}", variant.key));
        }
        if variant.rank != index + 1 {
            return Err(format!(
                "variant {} has rank {}, expected {}",
                variant.key,
                variant.rank,
                index + 1
            ));
        }
        if index > 0 {
            let previous = &ranked[index - 1];
            let in_order = previous.match_count > variant.match_count
                || (previous.match_count == variant.match_count
                    && previous.key.to_string() < variant.key.to_string());
            if !in_order {
                return Err(format!(
                    "variant {} ({} songs) is ranked after {} ({} songs)",
                    variant.key, variant.match_count, previous.key, previous.match_count
                ));
            }
        }
    }

    let expected = VariantKey::all();
    if let Some(missing) = expected.iter().find(|key| !seen.contains(*key)) {
        return Err(format!("variant {} is missing", missing));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::variants::dimensions::RegionTags;
    use crate::variants::predicate::group_reference_for;

    /// A consistent table where every variant has as many songs as its
    /// number of fixed segments.
    pub(crate) fn ranked_variants() -> Vec<Variant> {
        let mut variants: Vec<Variant> = VariantKey::all()
            .into_iter()
            .map(|key| Variant {
                key,
                predicate: ResolvedPredicate::for_key(&key, &RegionTags::default()),
                genre_group_ref: group_reference_for(&key),
                match_count: key.info_count(),
                rank: 0,
            })
            .collect();
        variants.sort_by(|a, b| {
            b.match_count
                .cmp(&a.match_count)
                .then_with(|| a.key.to_string().cmp(&b.key.to_string()))
        });
        for (index, variant) in variants.iter_mut().enumerate() {
            variant.rank = index + 1;
        }
        variants
    }

    #[test]
    fn builds_lookup_by_key() {
        let table =
            VariantTable::from_ranked("b1".to_string(), 10, 5, ranked_variants()).unwrap();
        assert_eq!(table.len(), 360);
        let key: VariantKey = "EASY-ROCK-LOCAL-PRE2000".parse().unwrap();
        let variant = table.get(&key).unwrap();
        assert_eq!(variant.match_count, 4);
        assert_eq!(table.ranked()[variant.rank - 1].key, key);
    }

    #[test]
    fn rejects_duplicate_keys() {
        let mut variants = ranked_variants();
        variants[1].key = variants[0].key;
        let err = check_consistency(&variants).unwrap_err();
        assert!(err.contains("duplicate"));
    }

    #[test]
    fn rejects_gaps_in_ranks() {
        let mut variants = ranked_variants();
        variants[10].rank = 12;
        assert!(check_consistency(&variants).unwrap_err().contains("rank"));
    }

    #[test]
    fn rejects_missing_variants() {
        let mut variants = ranked_variants();
        variants.pop();
        assert!(check_consistency(&variants).unwrap_err().contains("missing"));
    }

    #[test]
    fn rejects_unsorted_counts() {
        let mut variants = ranked_variants();
        variants[0].match_count = 0;
        assert!(check_consistency(&variants)
            .unwrap_err()
            .contains("ranked after"));
    }

    #[test]
    fn empty_table_misses_everything() {
        let table = VariantTable::empty();
        let key: VariantKey = "RANDOM-RANDOM-RANDOM-RANDOM".parse().unwrap();
        assert!(table.get(&key).is_none());
        assert!(table.is_empty());
    }
}
