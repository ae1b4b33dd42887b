//! Build-time predicates and late-bound genre group references.

use super::dimensions::RegionTags;
use super::key::VariantKey;
use crate::catalog_store::{CatalogFilter, RatingRange, YearBound};
use crate::groups::{GroupName, ResolvedGroups};
use serde::{Deserialize, Serialize};

/// The part of a variant's filter that is fixed when the table is built.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedPredicate {
    pub difficulty: Option<RatingRange>,
    pub region: Option<String>,
    pub era: Option<YearBound>,
}

/// Genre group a variant is restricted to. The group name is stored, not the
/// category ids, so group membership is looked up again at every use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupReference(pub GroupName);

impl ResolvedPredicate {
    pub fn for_key(key: &VariantKey, regions: &RegionTags) -> Self {
        ResolvedPredicate {
            difficulty: key.difficulty.rating_range(),
            region: key.region.tag(regions),
            era: key.era.year_bound(),
        }
    }

    /// Combines the fixed clauses with the current members of `group_ref`.
    pub fn bind(
        &self,
        group_ref: Option<GroupReference>,
        groups: &ResolvedGroups,
    ) -> CatalogFilter {
        CatalogFilter {
            difficulty: self.difficulty,
            region: self.region.clone(),
            era: self.era,
            categories: group_ref.map(|GroupReference(group)| groups.clause(group)),
        }
    }
}

pub fn group_reference_for(key: &VariantKey) -> Option<GroupReference> {
    key.genre.group().map(GroupReference)
}
