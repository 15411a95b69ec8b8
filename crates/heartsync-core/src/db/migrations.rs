//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        apply(conn, 1, V1_SCORE_RECORDS).await?;
    }
    if version < 2 {
        apply(conn, 2, V2_SCORE_IMAGES).await?;
    }

    Ok(())
}

/// Version 1: one row per participant document.
const V1_SCORE_RECORDS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER PRIMARY KEY
    )",
    "CREATE TABLE IF NOT EXISTS score_records (
        participant TEXT PRIMARY KEY CHECK (participant IN ('a', 'b')),
        hearts INTEGER NOT NULL DEFAULT 0 CHECK (hearts >= 0),
        competition_end_time INTEGER,
        updated_at INTEGER NOT NULL
    )",
];

/// Version 2: photo slots keyed by (participant, slot).
const V2_SCORE_IMAGES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS score_images (
        participant TEXT NOT NULL REFERENCES score_records(participant),
        slot INTEGER NOT NULL CHECK (slot >= 0),
        url TEXT NOT NULL,
        timestamp INTEGER NOT NULL,
        prompt_label TEXT NOT NULL,
        PRIMARY KEY (participant, slot)
    )",
];

async fn get_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists = match rows.next().await? {
        Some(row) => row.get::<i32>(0)? != 0,
        None => false,
    };
    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;
    match rows.next().await? {
        Some(row) => Ok(row.get(0)?),
        None => Ok(0),
    }
}

/// Run one migration's statements and record its version atomically.
async fn apply(conn: &Connection, version: i32, statements: &[&str]) -> Result<()> {
    conn.execute("BEGIN TRANSACTION", ()).await?;

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    let recorded = conn
        .execute(
            "INSERT INTO schema_version (version) VALUES (?)",
            libsql::params![version],
        )
        .await;
    if let Err(e) = recorded {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    tracing::info!("Migrated score database to version {version}/{CURRENT_VERSION}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use libsql::Builder;

    async fn setup() -> Connection {
        let db = Builder::new_local(":memory:").build().await.unwrap();
        db.connect().unwrap()
    }

    async fn table_exists(conn: &Connection, name: &str) -> bool {
        let mut rows = conn
            .query(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
                [name],
            )
            .await
            .unwrap();

        rows.next()
            .await
            .unwrap()
            .is_some_and(|row| row.get::<i32>(0).unwrap() != 0)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn migrations_reach_current_version() {
        let conn = setup().await;
        run(&conn).await.unwrap();

        assert_eq!(get_version(&conn).await.unwrap(), CURRENT_VERSION);
        assert!(table_exists(&conn, "score_records").await);
        assert!(table_exists(&conn, "score_images").await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn migrations_are_idempotent() {
        let conn = setup().await;
        run(&conn).await.unwrap();
        run(&conn).await.unwrap();

        assert_eq!(get_version(&conn).await.unwrap(), CURRENT_VERSION);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn score_records_reject_unknown_participants() {
        let conn = setup().await;
        run(&conn).await.unwrap();

        let result = conn
            .execute(
                "INSERT INTO score_records (participant, hearts, updated_at) VALUES ('c', 0, 0)",
                (),
            )
            .await;
        assert!(result.is_err());
    }
}
