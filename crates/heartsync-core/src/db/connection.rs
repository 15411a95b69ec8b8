//! Database connection management

use crate::error::{Error, Result};
use libsql::{Builder, Connection, Database as LibSqlDatabase};
use std::path::Path;
use std::time::Duration;

use super::migrations;

/// Embedded-replica settings for sharing the score document with a remote
/// Turso database.
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Remote database URL (e.g., `libsql://your-db.turso.io`)
    pub url: Option<String>,
    /// Authentication token for remote database
    pub auth_token: Option<String>,
    /// Background sync interval; `None` means manual sync only
    pub sync_interval: Option<Duration>,
}

impl SyncConfig {
    /// Both sessions poll the shared document, so the default interval is short.
    pub fn new(url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            auth_token: Some(auth_token.into()),
            sync_interval: Some(Duration::from_secs(1)),
        }
    }

    #[must_use]
    pub const fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = Some(interval);
        self
    }

    /// Read `TURSO_DATABASE_URL` / `TURSO_AUTH_TOKEN`; `None` unless both are set.
    pub fn from_env() -> Option<Self> {
        let url = crate::util::normalize_text_option(std::env::var("TURSO_DATABASE_URL").ok())?;
        let token = crate::util::normalize_text_option(std::env::var("TURSO_AUTH_TOKEN").ok())?;
        Some(Self::new(url, token))
    }

    pub const fn is_configured(&self) -> bool {
        self.url.is_some() && self.auth_token.is_some()
    }
}

/// libSQL database holding the two score documents.
pub struct Database {
    db: LibSqlDatabase,
    conn: Connection,
    sync_config: Option<SyncConfig>,
}

impl Database {
    /// Open (or create) a local database file and migrate it.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let db = Builder::new_local(&path_str).build().await?;
        Self::finish(db, None).await
    }

    /// Open an in-memory database (useful for testing)
    pub async fn open_in_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        Self::finish(db, None).await
    }

    /// Open a local replica of a remote Turso database.
    ///
    /// Reads are served from the replica; writes go to the remote and are
    /// pulled back by `sync`.
    pub async fn open_with_sync(
        local_path: impl AsRef<Path>,
        sync_config: SyncConfig,
    ) -> Result<Self> {
        let path_str = local_path.as_ref().to_string_lossy().to_string();
        let url = sync_config
            .url
            .clone()
            .ok_or_else(|| Error::InvalidInput("Sync URL is required".into()))?;
        let token = sync_config
            .auth_token
            .clone()
            .ok_or_else(|| Error::InvalidInput("Auth token is required".into()))?;

        let mut builder = Builder::new_remote_replica(&path_str, url, token);
        if let Some(interval) = sync_config.sync_interval {
            builder = builder.sync_interval(interval);
            tracing::debug!("Replica sync interval set to {:?}", interval);
        }

        let db = builder.build().await?;
        Self::finish(db, Some(sync_config)).await
    }

    async fn finish(db: LibSqlDatabase, sync_config: Option<SyncConfig>) -> Result<Self> {
        let conn = db.connect()?;
        let database = Self {
            db,
            conn,
            sync_config,
        };

        // Pull the remote schema first so migrations only run where needed.
        database.sync().await?;
        database.configure().await?;
        migrations::run(&database.conn).await?;
        Ok(database)
    }

    async fn configure(&self) -> Result<()> {
        // Replicas reject some pragmas; those are best effort.
        self.conn
            .execute("PRAGMA journal_mode = WAL;", ())
            .await
            .ok();
        self.conn
            .execute("PRAGMA synchronous = NORMAL;", ())
            .await
            .ok();
        self.conn.execute("PRAGMA foreign_keys = ON;", ()).await?;
        Ok(())
    }

    /// Pull remote changes when running as a replica.
    pub async fn sync(&self) -> Result<()> {
        if self.sync_config.is_some() {
            self.db.sync().await?;
            tracing::debug!("Score database synced with remote");
        }
        Ok(())
    }

    pub const fn is_sync_enabled(&self) -> bool {
        self.sync_config.is_some()
    }

    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test(flavor = "multi_thread")]
    async fn open_in_memory_is_local_only() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(!db.is_sync_enabled());
        db.sync().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn open_file_creates_schema() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("heartsync.db");

        let db = Database::open(&path).await.unwrap();
        let mut rows = db
            .connection()
            .query("SELECT COUNT(*) FROM score_records", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 0);
        assert!(path.exists());
    }

    #[test]
    fn sync_config_new_is_configured() {
        let config = SyncConfig::new("libsql://test.turso.io", "test-token");
        assert!(config.is_configured());
        assert_eq!(config.sync_interval, Some(Duration::from_secs(1)));
        assert!(!SyncConfig::default().is_configured());
    }
}
