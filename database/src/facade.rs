use aocrecs_types::{unstack, Lookup, MatchSelection, Table};
use serde::Serialize;

use crate::filters::MatchFilter;
use crate::queries::{
    match_rows_query, select_all, splice_limit, MatchTable, SqlQuery, SQLITE_TABLE_NAMES_QUERY,
    TABLE_NAMES_QUERY,
};
use crate::reference::{load_reference_table, version_lookup, ReferenceTables};
use crate::retry::fetch_with_reconnect;
use crate::session::{SqlSession, Session};
use crate::{DatabaseConfig, DatabaseError};

/// Key columns of the timeseries panel, and the column pivoted into suffixes.
pub const TIMESERIES_KEYS: [&str; 2] = ["match_id", "timestamp"];
pub const TIMESERIES_PIVOT: &str = "player_number";

/// Result of a matches query: the rows and the ids they cover.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Matches {
    pub table: Table,
    pub selection: MatchSelection,
}

/// Read access to the match database over a single connection.
pub struct RecsDatabase<S: Session = SqlSession> {
    session: S,
    reference: Option<ReferenceTables>,
}

impl RecsDatabase<SqlSession> {
    /// Connect and, when `save_ref_tables` is set, load every reference
    /// table before returning.
    pub async fn connect(
        config: DatabaseConfig,
        save_ref_tables: bool,
    ) -> Result<Self, DatabaseError> {
        let session = SqlSession::connect(config).await?;
        Self::with_session(session, save_ref_tables).await
    }
}

impl<S: Session> RecsDatabase<S> {
    pub async fn with_session(session: S, save_ref_tables: bool) -> Result<Self, DatabaseError> {
        let mut db = Self {
            session,
            reference: None,
        };
        if save_ref_tables {
            db.load_reference_tables().await?;
        }
        Ok(db)
    }

    pub async fn load_reference_tables(&mut self) -> Result<&ReferenceTables, DatabaseError> {
        let tables = ReferenceTables::load(&mut self.session).await?;
        Ok(&*self.reference.insert(tables))
    }

    pub fn reference_tables(&self) -> Option<&ReferenceTables> {
        self.reference.as_ref()
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    async fn fetch(&mut self, query: &SqlQuery) -> Result<Table, DatabaseError> {
        fetch_with_reconnect(&mut self.session, query).await
    }

    /// Run a complete statement, optionally capped at `limit` rows and
    /// indexed by the `index` column.
    pub async fn get_table(
        &mut self,
        query: &str,
        limit: Option<u64>,
        index: Option<&str>,
    ) -> Result<Table, DatabaseError> {
        let sql = match limit {
            Some(limit) => splice_limit(query, limit)?,
            None => query.to_string(),
        };
        let mut table = self.fetch(&SqlQuery::new(sql)).await?;
        if let Some(column) = index {
            if !table.is_empty() {
                table.set_index(column)?;
            }
        }
        Ok(table)
    }

    /// All rows of a table from the schema catalog.
    pub async fn get_catalog_table(
        &mut self,
        name: &str,
        limit: Option<u64>,
    ) -> Result<Table, DatabaseError> {
        let query = select_all(name)?;
        self.get_table(&query, limit, None).await
    }

    /// Names of the base tables in the connected database.
    pub async fn table_names(&mut self) -> Result<Vec<String>, DatabaseError> {
        let query = if self.session.backend_name() == "SQLite" {
            SQLITE_TABLE_NAMES_QUERY
        } else {
            TABLE_NAMES_QUERY
        };
        let table = self.get_table(query, None, None).await?;
        if table.is_empty() {
            return Ok(Vec::new());
        }
        let names: Vec<String> = table
            .column_values("table_name")?
            .filter_map(|v| v.as_str().map(String::from))
            .collect();
        Ok(names)
    }

    pub async fn get_matches(&mut self, filter: &MatchFilter) -> Result<Matches, DatabaseError> {
        let query = filter.to_query()?;
        let mut table = self.fetch(&query).await?;

        if filter.to_id && !table.is_empty() {
            let lookup = self.version_lookup().await?;
            table.remap_column("version", &lookup, filter.remap_policy)?;
        }

        let selection = MatchSelection::from_table(&table, "id")?;
        tracing::debug!("Selected {} matches", selection.len());
        Ok(Matches { table, selection })
    }

    async fn version_lookup(&mut self) -> Result<Lookup, DatabaseError> {
        match &self.reference {
            Some(reference) => reference.version_lookup(),
            None => {
                let versions = load_reference_table(&mut self.session, "versions").await?;
                version_lookup(&versions)
            }
        }
    }

    /// Timeseries rows of the selected matches, one row per match and
    /// timestamp with a column per value and player (`gold_1`, `gold_2`, ...).
    pub async fn get_timeseries(
        &mut self,
        selection: &MatchSelection,
    ) -> Result<Table, DatabaseError> {
        let long = self.get_match_rows(MatchTable::Timeseries, selection).await?;
        Ok(unstack(&long, &TIMESERIES_KEYS, TIMESERIES_PIVOT)?)
    }

    pub async fn get_players(&mut self, selection: &MatchSelection) -> Result<Table, DatabaseError> {
        self.get_match_rows(MatchTable::Players, selection).await
    }

    pub async fn get_teams(&mut self, selection: &MatchSelection) -> Result<Table, DatabaseError> {
        self.get_match_rows(MatchTable::Teams, selection).await
    }

    /// Rows of a match-keyed table for the selected matches. An empty
    /// selection returns an empty table without querying.
    pub async fn get_match_rows(
        &mut self,
        table: MatchTable,
        selection: &MatchSelection,
    ) -> Result<Table, DatabaseError> {
        if selection.is_empty() {
            return Ok(Table::default());
        }
        self.fetch(&match_rows_query(table, selection)).await
    }

    /// Send statements straight to the connection. Nothing is fetched and
    /// nothing is retried.
    pub async fn sql_execute(&mut self, sql: &str) -> Result<u64, DatabaseError> {
        self.session.execute(sql).await
    }
}
