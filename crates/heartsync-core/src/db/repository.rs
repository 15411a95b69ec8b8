//! Score document repository implementation

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)] // SQLite stores integers as i64

use std::collections::BTreeMap;

use libsql::{params, Connection, Value};

use crate::error::{Error, Result};
use crate::models::{ImageEntry, Participant, ScorePatch, ScoreRecord};

/// Trait for score document storage operations (async)
#[allow(async_fn_in_trait)]
pub trait ScoreRepository {
    /// Load a participant's document, `None` if it was never written
    async fn load(&self, participant: Participant) -> Result<Option<ScoreRecord>>;

    /// Merge a patch into a participant's document, creating it if absent
    async fn merge(&self, participant: Participant, patch: &ScorePatch) -> Result<()>;
}

/// libSQL implementation of `ScoreRepository`
pub struct LibSqlScoreRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlScoreRepository<'a> {
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    async fn merge_statements(&self, participant: Participant, patch: &ScorePatch) -> Result<()> {
        let key = participant.key();
        let now = chrono::Utc::now().timestamp_millis();

        self.conn
            .execute(
                "INSERT OR IGNORE INTO score_records (participant, hearts, competition_end_time, updated_at)
                 VALUES (?, 0, NULL, ?)",
                params![key, now],
            )
            .await?;

        if let Some(hearts) = patch.hearts {
            self.conn
                .execute(
                    "UPDATE score_records SET hearts = ?, updated_at = ? WHERE participant = ?",
                    params![hearts as i64, now, key],
                )
                .await?;
        }

        if let Some(end_time) = patch.competition_end_time {
            let end_time = end_time.map_or(Value::Null, Value::Integer);
            self.conn
                .execute(
                    "UPDATE score_records SET competition_end_time = ?, updated_at = ? WHERE participant = ?",
                    params![end_time, now, key],
                )
                .await?;
        }

        for (slot, entry) in &patch.images {
            self.conn
                .execute(
                    "INSERT OR REPLACE INTO score_images (participant, slot, url, timestamp, prompt_label)
                     VALUES (?, ?, ?, ?, ?)",
                    params![
                        key,
                        *slot as i64,
                        entry.url.as_str(),
                        entry.timestamp,
                        entry.prompt_label.as_str()
                    ],
                )
                .await?;
        }

        Ok(())
    }

    async fn load_images(&self, participant: Participant) -> Result<BTreeMap<usize, ImageEntry>> {
        let mut rows = self
            .conn
            .query(
                "SELECT slot, url, timestamp, prompt_label FROM score_images
                 WHERE participant = ? ORDER BY slot",
                [participant.key()],
            )
            .await?;

        let mut images = BTreeMap::new();
        while let Some(row) = rows.next().await? {
            let slot = usize::try_from(row.get::<i64>(0)?)
                .map_err(|_| Error::Database("Negative photo slot in score_images".into()))?;
            images.insert(
                slot,
                ImageEntry {
                    url: row.get(1)?,
                    timestamp: row.get(2)?,
                    prompt_label: row.get(3)?,
                },
            );
        }
        Ok(images)
    }
}

impl ScoreRepository for LibSqlScoreRepository<'_> {
    async fn load(&self, participant: Participant) -> Result<Option<ScoreRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT hearts, competition_end_time FROM score_records WHERE participant = ?",
                [participant.key()],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let hearts = row.get::<i64>(0)?.max(0) as u64;
        let competition_end_time = match row.get_value(1)? {
            Value::Integer(value) => Some(value),
            _ => None,
        };
        drop(rows);

        Ok(Some(ScoreRecord {
            hearts,
            images: self.load_images(participant).await?,
            competition_end_time,
        }))
    }

    async fn merge(&self, participant: Participant, patch: &ScorePatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }

        self.conn.execute("BEGIN TRANSACTION", ()).await?;
        if let Err(error) = self.merge_statements(participant, patch).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(error);
        }
        if let Err(error) = self.conn.execute("COMMIT", ()).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(error.into());
        }
        Ok(())
    }
}
