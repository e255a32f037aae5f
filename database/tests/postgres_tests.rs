//! Facade tests against a real Postgres server.
//!
//! These run only when RECS_TEST_POSTGRES_URL names a disposable database;
//! the fixture drops and recreates its tables in the public schema.

use aocrecs_db::{
    DatabaseConfig, MatchFilter, MatchSelection, MatchTable, RecsDatabase, RemapPolicy, Value,
};
use tokio::sync::{Mutex, MutexGuard};

const TEST_URL_ENV_VAR: &str = "RECS_TEST_POSTGRES_URL";

const FIXTURE: &str = "
    DROP TABLE IF EXISTS versions, matches, timeseries;
    CREATE TABLE versions (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
    CREATE TABLE matches (
        id INTEGER PRIMARY KEY,
        version TEXT,
        diplomacy_type VARCHAR(8),
        played TIMESTAMP,
        duration INTERVAL,
        platform_metadata JSONB,
        rated BOOLEAN
    );
    CREATE TABLE timeseries (
        match_id INTEGER NOT NULL,
        player_number SMALLINT NOT NULL,
        timestamp INTERVAL NOT NULL,
        total_food INTEGER,
        military_score NUMERIC(10, 2)
    );
    INSERT INTO versions VALUES (1, '1.0'), (2, '1.0c');
    INSERT INTO matches VALUES
        (5, '1.0', '1v1', '2020-02-29 18:04:11', '42 minutes 17 seconds', '{\"rank\": 3}', TRUE),
        (6, '1.0c', 'TG', '2020-03-01 20:00:00', '1 hour', NULL, FALSE);
    INSERT INTO timeseries VALUES
        (5, 1, '0 seconds', 200, NULL),
        (5, 2, '0 seconds', 200, 0.50),
        (5, 1, '5 seconds', 180, 1.25),
        (5, 2, '5 seconds', 190, 2.00);
";

// Every test rebuilds the same tables, so they take turns.
static FIXTURE_LOCK: Mutex<()> = Mutex::const_new(());

async fn seeded_database() -> Option<(MutexGuard<'static, ()>, RecsDatabase)> {
    let Ok(url) = std::env::var(TEST_URL_ENV_VAR) else {
        eprintln!("{TEST_URL_ENV_VAR} not set, skipping Postgres test");
        return None;
    };
    let guard = FIXTURE_LOCK.lock().await;
    let mut db = RecsDatabase::connect(DatabaseConfig::from_url(url), false)
        .await
        .expect("Failed to connect to Postgres");
    db.sql_execute(FIXTURE)
        .await
        .expect("Failed to apply fixture");
    Some((guard, db))
}

#[tokio::test]
async fn test_postgres_table_names() {
    let Some((_guard, mut db)) = seeded_database().await else {
        return;
    };

    let names = db.table_names().await.expect("Failed to list tables");

    for table in ["matches", "timeseries", "versions"] {
        assert!(names.contains(&table.to_string()), "{table} missing");
    }
}

#[tokio::test]
async fn test_postgres_catalog_table_renders_temporal_columns() {
    let Some((_guard, mut db)) = seeded_database().await else {
        return;
    };

    let matches = db
        .get_catalog_table("matches", None)
        .await
        .expect("Failed to read matches")
        .with_index("id")
        .expect("Match ids should be unique");
    let first = matches.get_by_key(&Value::Int(5)).unwrap();

    assert_eq!(first.get("diplomacy_type"), Some(&Value::from("1v1")));
    assert_eq!(first.get("played"), Some(&Value::from("2020-02-29 18:04:11")));
    assert_eq!(first.get("duration"), Some(&Value::from("00:42:17")));
    assert_eq!(first.get("platform_metadata"), Some(&Value::from(r#"{"rank":3}"#)));
    assert_eq!(first.get("rated"), Some(&Value::Bool(true)));
}

#[tokio::test]
async fn test_postgres_matches_then_timeseries() {
    let Some((_guard, mut db)) = seeded_database().await else {
        return;
    };

    let matches = db
        .get_matches(
            &MatchFilter::new()
                .diplomacy_type("1v1")
                .columns(["id", "version", "played"])
                .to_id(RemapPolicy::Strict),
        )
        .await
        .expect("Failed to get matches");

    assert_eq!(matches.selection.ids(), &[5]);
    assert_eq!(matches.table.value(0, "version").unwrap(), Some(&Value::Int(1)));

    let timeseries = db
        .get_timeseries(&matches.selection)
        .await
        .expect("Failed to get timeseries");

    assert_eq!(timeseries.len(), 2);
    let later = timeseries.row(1).unwrap();
    assert_eq!(later.get("timestamp"), Some(&Value::from("00:00:05")));
    assert_eq!(later.get("total_food_2"), Some(&Value::Int(190)));
    assert_eq!(later.get("military_score_1"), Some(&Value::from("1.25")));
    assert_eq!(
        timeseries.row(0).unwrap().get("military_score_1"),
        Some(&Value::Null)
    );
}

#[tokio::test]
async fn test_postgres_empty_result_keeps_column_names() {
    let Some((_guard, mut db)) = seeded_database().await else {
        return;
    };

    let rows = db
        .get_match_rows(
            MatchTable::Timeseries,
            &MatchSelection::from_ids([404]),
        )
        .await
        .expect("Failed to query timeseries");

    assert!(rows.is_empty());
    assert_eq!(
        rows.columns(),
        &["match_id", "player_number", "timestamp", "total_food", "military_score"]
            .map(String::from)
    );
}
