//! Query text for the match database: the table catalog, the default match
//! column list and the parameterised statements the facade sends.

use std::sync::OnceLock;

use aocrecs_types::MatchSelection;
use itertools::Itertools;
use regex::Regex;
use sqlx::query::Query;
use sqlx::{Database, Encode, Type};

use crate::DatabaseError;

/// Small id -> name tables loaded into memory at construction.
pub const REFERENCE_TABLES: [&str; 22] = [
    "maps",
    "civilization_bonuses",
    "player_colors",
    "civilizations",
    "map_sizes",
    "event_maps",
    "datasets",
    "game_types",
    "technologies",
    "difficulties",
    "map_reveal_choices",
    "speeds",
    "starting_resources",
    "starting_ages",
    "victory_conditions",
    "terrain",
    "versions",
    "actions",
    "resources",
    "formation_types",
    "objects",
    "tournaments",
];

pub const METADATA_TABLES: [&str; 5] = ["participants", "series", "series_metadata", "teams", "matches"];

pub const TIMESTAMPED_TABLES: [&str; 9] = [
    "object_instance_states",
    "action_log",
    "chat",
    "research",
    "market",
    "timeseries",
    "transactions",
    "formations",
    "tribute",
];

pub const MISC_TABLES: [&str; 10] = [
    "users",
    "files",
    "players",
    "people",
    "hc",
    "events",
    "object_instances",
    "rounds",
    "ladders",
    "platforms",
];

pub const TABLE_NAMES_QUERY: &str = "SELECT table_name::text AS table_name FROM information_schema.tables \
     WHERE table_type='BASE TABLE' AND table_schema='public' ORDER BY table_name;";

pub const SQLITE_TABLE_NAMES_QUERY: &str = "SELECT name AS table_name FROM sqlite_master \
     WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name;";

/// Default column list for the matches query.
pub const MATCH_COLUMNS: &str = "id, series_id, tournament_id, event_id, version, minor_version, \
     dataset_id, dataset_version, platform_id, ladder_id, rated, winning_team_id, builtin_map_id, \
     map_size_id, map_name, event_map_id, rms_custom, rms_seed, fixed_positions, \
     played, platform_match_id, duration, \
     completed, postgame, type_id, difficulty_id, population_limit, map_reveal_choice_id, cheats, \
     speed_id, mirror, diplomacy_type, team_size, starting_resources_id, starting_age_id, \
     victory_condition_id, all_technologies, version_id, multiqueue, treaty_length, build, \
     starting_palisades, starting_town_centers, starting_walls, state_reader_interval, \
     state_reader_version, platform_metadata, water_percent, \
     server";

pub fn is_catalog_table(table: &str) -> bool {
    REFERENCE_TABLES
        .iter()
        .chain(&METADATA_TABLES)
        .chain(&TIMESTAMPED_TABLES)
        .chain(&MISC_TABLES)
        .any(|t| *t == table)
}

/// `SELECT *` over a catalog table.
pub fn select_all(table: &str) -> Result<String, DatabaseError> {
    if !is_catalog_table(table) {
        return Err(DatabaseError::UnknownTable(table.to_string()));
    }
    Ok(format!("SELECT * FROM {table};"))
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier pattern"))
}

fn trailing_limit_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\blimit\s+\S+(\s+offset\s+\S+)?\s*$").expect("valid limit pattern"))
}

/// Column names cannot be bound, so only plain identifiers are accepted.
pub fn validate_identifier(name: &str) -> Result<&str, DatabaseError> {
    if identifier_pattern().is_match(name) {
        Ok(name)
    } else {
        Err(DatabaseError::InvalidColumn(name.to_string()))
    }
}

/// Append a `LIMIT` clause to a complete statement, dropping one trailing
/// terminator. A statement that already ends in a `LIMIT` is rejected.
pub fn splice_limit(query: &str, limit: u64) -> Result<String, DatabaseError> {
    let body = query.trim_end();
    let body = body.strip_suffix(';').unwrap_or(body).trim_end();
    if body.is_empty() || trailing_limit_pattern().is_match(body) {
        return Err(DatabaseError::InvalidLimitQuery(query.to_string()));
    }
    Ok(format!("{body} LIMIT {limit}"))
}

/// A value bound to a `$n` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Int(i64),
    Text(String),
    Bool(bool),
}

/// Statement text plus the values bound to its placeholders, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<Param>,
}

impl SqlQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Register a value and return its placeholder.
    pub fn placeholder(&mut self, param: Param) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }

    /// Placeholders for an `IN (...)` list.
    pub fn placeholder_list(&mut self, ids: &[i64]) -> String {
        ids.iter()
            .map(|&id| self.placeholder(Param::Int(id)))
            .join(", ")
    }

    pub(crate) fn bind<'q, DB>(&'q self) -> Query<'q, DB, <DB as Database>::Arguments<'q>>
    where
        DB: Database,
        i64: Encode<'q, DB> + Type<DB>,
        String: Encode<'q, DB> + Type<DB>,
        bool: Encode<'q, DB> + Type<DB>,
    {
        self.params
            .iter()
            .fold(sqlx::query::<DB>(&self.sql), |query, param| match param {
                Param::Int(v) => query.bind(*v),
                Param::Text(v) => query.bind(v.clone()),
                Param::Bool(v) => query.bind(*v),
            })
    }
}

/// Fact tables keyed by `match_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchTable {
    Players,
    Teams,
    Timeseries,
    ObjectInstances,
    ObjectInstanceStates,
    ActionLog,
    Chat,
    Research,
    Market,
    Transactions,
    Formations,
    Tribute,
}

impl MatchTable {
    pub const ALL: [MatchTable; 12] = [
        MatchTable::Players,
        MatchTable::Teams,
        MatchTable::Timeseries,
        MatchTable::ObjectInstances,
        MatchTable::ObjectInstanceStates,
        MatchTable::ActionLog,
        MatchTable::Chat,
        MatchTable::Research,
        MatchTable::Market,
        MatchTable::Transactions,
        MatchTable::Formations,
        MatchTable::Tribute,
    ];

    pub fn table_name(self) -> &'static str {
        match self {
            MatchTable::Players => "players",
            MatchTable::Teams => "teams",
            MatchTable::Timeseries => "timeseries",
            MatchTable::ObjectInstances => "object_instances",
            MatchTable::ObjectInstanceStates => "object_instance_states",
            MatchTable::ActionLog => "action_log",
            MatchTable::Chat => "chat",
            MatchTable::Research => "research",
            MatchTable::Market => "market",
            MatchTable::Transactions => "transactions",
            MatchTable::Formations => "formations",
            MatchTable::Tribute => "tribute",
        }
    }

    pub fn from_table_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.table_name() == name)
    }
}

/// Every row of `table` belonging to the selected matches.
pub fn match_rows_query(table: MatchTable, selection: &MatchSelection) -> SqlQuery {
    let mut query = SqlQuery::default();
    let ids = query.placeholder_list(selection.ids());
    query.sql = format!(
        "SELECT * FROM {} WHERE match_id IN ({ids})",
        table.table_name()
    );
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splice_limit_replaces_terminator() {
        assert_eq!(
            splice_limit("SELECT * FROM maps;", 10).unwrap(),
            "SELECT * FROM maps LIMIT 10"
        );
        assert_eq!(
            splice_limit("SELECT * FROM maps", 3).unwrap(),
            "SELECT * FROM maps LIMIT 3"
        );
    }

    #[test]
    fn test_splice_limit_rejects_existing_limit() {
        let err = splice_limit("SELECT * FROM maps LIMIT 5;", 10).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidLimitQuery(_)));
        assert!(splice_limit(";", 1).is_err());
    }

    #[test]
    fn test_splice_limit_ignores_limit_inside_names() {
        assert!(splice_limit("SELECT speed_limit FROM speeds;", 2).is_ok());
    }

    #[test]
    fn test_select_all_only_for_catalog_tables() {
        assert_eq!(select_all("maps").unwrap(), "SELECT * FROM maps;");
        assert_eq!(
            select_all("object_instance_states").unwrap(),
            "SELECT * FROM object_instance_states;"
        );
        assert!(matches!(
            select_all("maps; DROP TABLE matches"),
            Err(DatabaseError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("map_size_id").is_ok());
        assert!(validate_identifier("id, (SELECT 1)").is_err());
        assert!(validate_identifier("1st").is_err());
    }

    #[test]
    fn test_match_rows_query_binds_every_id() {
        let selection = MatchSelection::from_ids([7, 5]);
        let query = match_rows_query(MatchTable::Players, &selection);

        assert_eq!(query.sql, "SELECT * FROM players WHERE match_id IN ($1, $2)");
        assert_eq!(query.params, vec![Param::Int(5), Param::Int(7)]);
    }

    #[test]
    fn test_match_tables_are_in_catalog() {
        for table in MatchTable::ALL {
            assert!(is_catalog_table(table.table_name()), "{table:?}");
            assert_eq!(MatchTable::from_table_name(table.table_name()), Some(table));
        }
    }
}
