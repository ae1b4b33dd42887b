//! Song filters and their translation to parameterized SQL.

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Inclusive range over the difficulty rating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RatingRange {
    pub min: i64,
    pub max: i64,
}

impl RatingRange {
    pub const fn new(min: i64, max: i64) -> Self {
        RatingRange { min, max }
    }

    pub fn contains(&self, rating: i64) -> bool {
        self.min <= rating && rating <= self.max
    }
}

/// Bound over the release year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearBound {
    /// Released strictly before the given year.
    Before(i32),
    /// Released within `from..=to`.
    Between { from: i32, to: i32 },
    /// Released strictly after the given year.
    After(i32),
}

impl YearBound {
    pub fn contains(&self, year: i32) -> bool {
        match *self {
            YearBound::Before(y) => year < y,
            YearBound::Between { from, to } => from <= year && year <= to,
            YearBound::After(y) => year > y,
        }
    }
}

/// Category membership clause.
///
/// A song matches when it belongs to at least one category in `include` and
/// to none in `exclude`. An empty `include` matches nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryClause {
    pub include: BTreeSet<String>,
    pub exclude: BTreeSet<String>,
}

impl CategoryClause {
    pub fn matches_nothing(&self) -> bool {
        self.include.is_empty()
    }
}

/// Conjunction of optional clauses over songs. `None` means unconstrained.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFilter {
    pub difficulty: Option<RatingRange>,
    pub region: Option<String>,
    pub era: Option<YearBound>,
    pub categories: Option<CategoryClause>,
}

impl CatalogFilter {
    /// Builds the `WHERE` body for a query over `songs s`, together with the
    /// values to bind. Values are never interpolated into the SQL text.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(range) = &self.difficulty {
            values.push(Value::Integer(range.min));
            values.push(Value::Integer(range.max));
            clauses.push(format!(
                "s.difficulty BETWEEN ?{} AND ?{}",
                values.len() - 1,
                values.len()
            ));
        }

        if let Some(region) = &self.region {
            values.push(Value::Text(region.clone()));
            clauses.push(format!("s.region = ?{}", values.len()));
        }

        if let Some(era) = &self.era {
            match *era {
                YearBound::Before(year) => {
                    values.push(Value::Integer(year as i64));
                    clauses.push(format!("s.release_year < ?{}", values.len()));
                }
                YearBound::Between { from, to } => {
                    values.push(Value::Integer(from as i64));
                    values.push(Value::Integer(to as i64));
                    clauses.push(format!(
                        "s.release_year BETWEEN ?{} AND ?{}",
                        values.len() - 1,
                        values.len()
                    ));
                }
                YearBound::After(year) => {
                    values.push(Value::Integer(year as i64));
                    clauses.push(format!("s.release_year > ?{}", values.len()));
                }
            }
        }

        if let Some(clause) = &self.categories {
            if clause.matches_nothing() {
                clauses.push("0".to_string());
            } else {
                let include = placeholders(&clause.include, &mut values);
                clauses.push(format!(
                    "EXISTS (SELECT 1 FROM song_categories sc
                       JOIN categories c ON c.rowid = sc.category_rowid
                      WHERE sc.song_rowid = s.rowid AND c.id IN ({}))",
                    include
                ));
                if !clause.exclude.is_empty() {
                    let exclude = placeholders(&clause.exclude, &mut values);
                    clauses.push(format!(
                        "NOT EXISTS (SELECT 1 FROM song_categories sc
                           JOIN categories c ON c.rowid = sc.category_rowid
                          WHERE sc.song_rowid = s.rowid AND c.id IN ({}))",
                        exclude
                    ));
                }
            }
        }

        if clauses.is_empty() {
            ("1".to_string(), values)
        } else {
            (clauses.join(" AND "), values)
        }
    }
}

fn placeholders(ids: &BTreeSet<String>, values: &mut Vec<Value>) -> String {
    ids.iter()
        .map(|id| {
            values.push(Value::Text(id.clone()));
            format!("?{}", values.len())
        })
        .collect::<Vec<_>>()
        .join(", ")
}
