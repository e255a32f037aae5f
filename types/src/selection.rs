use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{Table, TableError};

/// The set of match ids a follow-up query is restricted to.
///
/// Produced by a matches query and handed explicitly to the per-match
/// queries. Ids are kept sorted and unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSelection(Vec<i64>);

impl MatchSelection {
    pub fn from_ids(ids: impl IntoIterator<Item = i64>) -> Self {
        Self(ids.into_iter().sorted().dedup().collect())
    }

    /// Collect the ids held in `column`. An empty table gives an empty
    /// selection even when it has no columns at all.
    pub fn from_table(table: &Table, column: &str) -> Result<Self, TableError> {
        if table.is_empty() {
            return Ok(Self::default());
        }
        let ids = table
            .column_values(column)?
            .map(|v| {
                v.as_i64().ok_or_else(|| TableError::NotAnId {
                    column: column.to_string(),
                    value: v.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_ids(ids))
    }

    pub fn ids(&self) -> &[i64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.0.binary_search(&id).is_ok()
    }
}

impl FromIterator<i64> for MatchSelection {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self::from_ids(iter)
    }
}

impl<'a> IntoIterator for &'a MatchSelection {
    type Item = &'a i64;
    type IntoIter = std::slice::Iter<'a, i64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
