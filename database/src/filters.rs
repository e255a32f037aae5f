use aocrecs_types::RemapPolicy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::queries::{validate_identifier, Param, SqlQuery, MATCH_COLUMNS};
use crate::DatabaseError;

/// Optional filters for the matches query. Unset fields add no condition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchFilter {
    pub diplomacy_type: Option<String>,
    pub platform: Option<String>,
    pub version: Option<String>,
    pub map_ids: Option<Vec<i64>>,
    pub dataset_id: Option<i64>,
    pub ladder_id: Option<i64>,
    pub map_size: Option<i64>,
    pub rated: Option<bool>,
    pub completed: Option<bool>,
    pub played_on: Option<NaiveDate>,
    pub columns: Option<Vec<String>>,
    pub limit: Option<u64>,
    /// Replace the textual `version` column with version ids.
    #[serde(default)]
    pub to_id: bool,
    #[serde(default)]
    pub remap_policy: RemapPolicy,
}

impl MatchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diplomacy_type(mut self, diplomacy_type: impl Into<String>) -> Self {
        self.diplomacy_type = Some(diplomacy_type.into());
        self
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn map_ids(mut self, map_ids: impl IntoIterator<Item = i64>) -> Self {
        self.map_ids = Some(map_ids.into_iter().collect());
        self
    }

    pub fn dataset_id(mut self, dataset_id: i64) -> Self {
        self.dataset_id = Some(dataset_id);
        self
    }

    pub fn ladder_id(mut self, ladder_id: i64) -> Self {
        self.ladder_id = Some(ladder_id);
        self
    }

    pub fn map_size(mut self, map_size: i64) -> Self {
        self.map_size = Some(map_size);
        self
    }

    pub fn rated(mut self, rated: bool) -> Self {
        self.rated = Some(rated);
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn played_on(mut self, day: NaiveDate) -> Self {
        self.played_on = Some(day);
        self
    }

    pub fn columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn to_id(mut self, policy: RemapPolicy) -> Self {
        self.to_id = true;
        self.remap_policy = policy;
        self
    }

    /// Build the statement. Conditions are appended in a fixed order, one
    /// `AND` term per set filter, every value bound as a parameter.
    pub fn to_query(&self) -> Result<SqlQuery, DatabaseError> {
        let columns = match &self.columns {
            Some(columns) if !columns.is_empty() => columns
                .iter()
                .map(|c| validate_identifier(c))
                .collect::<Result<Vec<_>, _>>()?
                .join(", "),
            _ => MATCH_COLUMNS.to_string(),
        };

        let mut query = SqlQuery::default();
        let mut sql = format!("SELECT {columns} FROM matches WHERE TRUE");

        if let Some(diplomacy_type) = &self.diplomacy_type {
            let p = query.placeholder(Param::Text(diplomacy_type.clone()));
            sql.push_str(&format!(" AND diplomacy_type={p}"));
        }
        if let Some(platform) = &self.platform {
            let p = query.placeholder(Param::Text(platform.clone()));
            sql.push_str(&format!(" AND platform_id={p}"));
        }
        if let Some(version) = &self.version {
            let p = query.placeholder(Param::Text(version.clone()));
            sql.push_str(&format!(" AND version={p}"));
        }
        if let Some(map_ids) = &self.map_ids {
            if map_ids.is_empty() {
                sql.push_str(" AND FALSE");
            } else {
                let ids = query.placeholder_list(map_ids);
                sql.push_str(&format!(" AND builtin_map_id IN ({ids})"));
            }
        }
        if let Some(dataset_id) = self.dataset_id {
            let p = query.placeholder(Param::Int(dataset_id));
            sql.push_str(&format!(" AND dataset_id={p}"));
        }
        if let Some(ladder_id) = self.ladder_id {
            let p = query.placeholder(Param::Int(ladder_id));
            sql.push_str(&format!(" AND ladder_id={p}"));
        }
        if let Some(map_size) = self.map_size {
            let p = query.placeholder(Param::Int(map_size));
            sql.push_str(&format!(" AND map_size_id={p}"));
        }
        if let Some(rated) = self.rated {
            let p = query.placeholder(Param::Bool(rated));
            sql.push_str(&format!(" AND rated={p}"));
        }
        if let Some(completed) = self.completed {
            let p = query.placeholder(Param::Bool(completed));
            sql.push_str(&format!(" AND completed={p}"));
        }
        if let Some(day) = self.played_on {
            let p = query.placeholder(Param::Text(day.format("%Y-%m-%d").to_string()));
            sql.push_str(&format!(" AND SUBSTR(CAST(played AS TEXT), 1, 10)={p}"));
        }
        if let Some(limit) = self.limit {
            let limit = i64::try_from(limit).map_err(|_| DatabaseError::LimitOutOfRange(limit))?;
            let p = query.placeholder(Param::Int(limit));
            sql.push_str(&format!(" LIMIT {p}"));
        }

        query.sql = sql;
        Ok(query)
    }
}
