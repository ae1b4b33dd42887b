use super::key::VariantKey;
use super::subsets::VariantSubset;
use super::table::VariantTable;
use serde::Serialize;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantReport {
    pub build_id: String,
    pub subset: String,
    pub total: usize,
    pub with_songs: usize,
    pub without_songs: usize,
    pub average_songs: f64,
    /// Most populated variant and its song count.
    pub most_populated: Option<(VariantKey, usize)>,
    /// Least populated variant that still has songs.
    pub least_populated: Option<(VariantKey, usize)>,
}

impl VariantReport {
    pub fn new(table: &VariantTable, subset: VariantSubset) -> Self {
        let entries = subset.select(table);
        let total = entries.len();
        let non_empty: Vec<_> = entries
            .iter()
            .filter(|e| e.variant.match_count > 0)
            .map(|e| (e.variant.key, e.variant.match_count))
            .collect();
        let songs: usize = entries.iter().map(|e| e.variant.match_count).sum();

        VariantReport {
            build_id: table.build_id().to_string(),
            subset: subset.name().to_string(),
            total,
            with_songs: non_empty.len(),
            without_songs: total - non_empty.len(),
            average_songs: if total == 0 {
                0.0
            } else {
                songs as f64 / total as f64
            },
            // Entries are sorted by count descending
            most_populated: non_empty.first().copied(),
            least_populated: non_empty.last().copied(),
        }
    }
}

impl fmt::Display for VariantReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Variant table {} ({})", self.build_id, self.subset)?;
        writeln!(f, "  variants:         {}", self.total)?;
        writeln!(f, "  with songs:       {}", self.with_songs)?;
        writeln!(f, "  without songs:    {}", self.without_songs)?;
        writeln!(f, "  avg songs/variant {:.1}", self.average_songs)?;
        if let Some((key, count)) = &self.most_populated {
            writeln!(f, "  most populated:   {} ({} songs)", key, count)?;
        }
        if let Some((key, count)) = &self.least_populated {
            writeln!(f, "  least populated:  {} ({} songs)", key, count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::table::tests::ranked_variants;

    #[test]
    fn summarizes_whole_table() {
        let table = VariantTable::from_ranked("b".to_string(), 1, 3, ranked_variants()).unwrap();
        let report = VariantReport::new(&table, VariantSubset::All);

        assert_eq!(report.total, 360);
        assert_eq!(report.without_songs, 1);
        assert_eq!(report.with_songs, 359);
        assert_eq!(report.most_populated.unwrap().1, 4);
        assert_eq!(report.least_populated.unwrap().1, 1);
        assert!(report.average_songs > 2.0);
        assert!(report.to_string().contains("without songs:    1"));
    }

    #[test]
    fn subset_report_only_counts_members() {
        let table = VariantTable::from_ranked("b".to_string(), 1, 3, ranked_variants()).unwrap();
        let report = VariantReport::new(&table, VariantSubset::FullInfo);
        assert_eq!(report.total, 120);
        assert_eq!(report.without_songs, 0);
        assert_eq!(report.average_songs, 4.0);
    }

    #[test]
    fn empty_table_report() {
        let report = VariantReport::new(&VariantTable::empty(), VariantSubset::All);
        assert_eq!(report.total, 0);
        assert!(report.most_populated.is_none());
        assert_eq!(report.average_songs, 0.0);
    }
}
