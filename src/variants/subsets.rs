//! Curated views over a published table, grouped by how much a key reveals.

use super::key::VariantKey;
use super::table::{Variant, VariantTable};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum VariantSubset {
    All,
    /// At most one fixed segment.
    MaxOneInfo,
    /// Exactly two fixed segments.
    TwoInfo,
    /// Exactly three fixed segments.
    ThreeInfo,
    /// No wildcard at all.
    FullInfo,
}

impl VariantSubset {
    pub const ALL: [VariantSubset; 5] = [
        VariantSubset::All,
        VariantSubset::MaxOneInfo,
        VariantSubset::TwoInfo,
        VariantSubset::ThreeInfo,
        VariantSubset::FullInfo,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            VariantSubset::All => "all",
            VariantSubset::MaxOneInfo => "max-one-info",
            VariantSubset::TwoInfo => "two-info",
            VariantSubset::ThreeInfo => "three-info",
            VariantSubset::FullInfo => "full-info",
        }
    }

    pub fn contains(&self, key: &VariantKey) -> bool {
        let randoms = key.count_randoms();
        match self {
            VariantSubset::All => true,
            VariantSubset::MaxOneInfo => randoms >= 3,
            VariantSubset::TwoInfo => randoms == 2,
            VariantSubset::ThreeInfo => randoms == 1,
            VariantSubset::FullInfo => randoms == 0,
        }
    }

    /// Members of this subset in table order.
    pub fn select<'t>(&self, table: &'t VariantTable) -> Vec<SubsetEntry<'t>> {
        table
            .ranked()
            .iter()
            .filter(|v| self.contains(&v.key))
            .enumerate()
            .map(|(index, variant)| SubsetEntry {
                variant,
                subset_rank: index + 1,
            })
            .collect()
    }
}

impl fmt::Display for VariantSubset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VariantSubset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VariantSubset::ALL
            .into_iter()
            .find(|subset| subset.name() == s)
            .ok_or_else(|| format!("unknown subset {:?}", s))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SubsetEntry<'t> {
    pub variant: &'t Variant,
    pub subset_rank: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedVariant {
    pub key: String,
    pub match_count: usize,
    pub rank: usize,
    pub subset_rank: usize,
    pub info_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsetExport {
    pub build_id: String,
    pub built_at: i64,
    pub subset: String,
    pub variants: Vec<ExportedVariant>,
}

impl SubsetExport {
    pub fn new(table: &VariantTable, subset: VariantSubset) -> Self {
        SubsetExport {
            build_id: table.build_id().to_string(),
            built_at: table.built_at(),
            subset: subset.name().to_string(),
            variants: subset
                .select(table)
                .into_iter()
                .map(|entry| ExportedVariant {
                    key: entry.variant.key.to_string(),
                    match_count: entry.variant.match_count,
                    rank: entry.variant.rank,
                    subset_rank: entry.subset_rank,
                    info_count: entry.variant.key.info_count(),
                })
                .collect(),
        }
    }

    /// Writes the export as pretty JSON. The file is written next to `path`
    /// and renamed into place, so readers never see a partial file.
    pub fn write_atomically(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {:?}", dir))?;
        serde_json::to_writer_pretty(&mut tmp, self)?;
        tmp.write_all(b"\n")?;
        tmp.persist(path)
            .with_context(|| format!("Failed to write {:?}", path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::table::tests::ranked_variants;
    use tempfile::TempDir;

    fn table() -> VariantTable {
        VariantTable::from_ranked("b".to_string(), 1, 3, ranked_variants()).unwrap()
    }

    #[test]
    fn subsets_partition_the_table() {
        let table = table();
        let sizes: Vec<usize> = [
            VariantSubset::MaxOneInfo,
            VariantSubset::TwoInfo,
            VariantSubset::ThreeInfo,
            VariantSubset::FullInfo,
        ]
        .iter()
        .map(|s| s.select(&table).len())
        .collect();
        // Every key lands in exactly one of them
        assert_eq!(sizes.iter().sum::<usize>(), 360);
        assert_eq!(sizes[3], 5 * 4 * 2 * 3);
        assert_eq!(VariantSubset::All.select(&table).len(), 360);
    }

    #[test]
    fn subset_ranks_are_dense_and_keep_table_order() {
        let table = table();
        let entries = VariantSubset::TwoInfo.select(&table);
        for (index, entry) in entries.iter().enumerate() {
            assert_eq!(entry.subset_rank, index + 1);
            assert_eq!(entry.variant.key.count_randoms(), 2);
        }
        assert!(entries
            .windows(2)
            .all(|w| w[0].variant.rank < w[1].variant.rank));
    }

    #[test]
    fn max_one_info_includes_all_random() {
        let key: VariantKey = "RANDOM-RANDOM-RANDOM-RANDOM".parse().unwrap();
        assert!(VariantSubset::MaxOneInfo.contains(&key));
        let one: VariantKey = "RANDOM-ROCK-RANDOM-RANDOM".parse().unwrap();
        assert!(VariantSubset::MaxOneInfo.contains(&one));
        assert!(!VariantSubset::TwoInfo.contains(&one));
    }

    #[test]
    fn parses_subset_names() {
        assert_eq!(
            "three-info".parse::<VariantSubset>().unwrap(),
            VariantSubset::ThreeInfo
        );
        assert!("single-random".parse::<VariantSubset>().is_err());
    }

    #[test]
    fn export_writes_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("full-info.json");
        SubsetExport::new(&table(), VariantSubset::FullInfo)
            .write_atomically(&path)
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["subset"], "full-info");
        assert_eq!(json["variants"].as_array().unwrap().len(), 120);
        assert_eq!(json["variants"][0]["subsetRank"], 1);
        assert_eq!(json["variants"][0]["infoCount"], 4);
    }
}
