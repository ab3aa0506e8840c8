//! The `global_data` content table, as seen from the discovery core.
//!
//! Content semantics (what the scraped text means, how embeddings are
//! produced, clustering) belong to other parts of the system; the core only
//! appends freshly scraped rows, reads back `(url, date)` keys for rank
//! reconciliation, and writes the per-cycle rank into one of the thirty
//! rotating `rank_d1..rank_d30` slots.

use crate::types::{ContentRow, RadarError, RankAssignment, Result, ScrapeOutcome};
use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

pub const RANK_SLOTS: u32 = 30;

pub struct ContentStore {
    db: SqlitePool,
}

impl ContentStore {
    pub async fn new(db: SqlitePool) -> Result<Self> {
        let rank_columns = (1..=RANK_SLOTS)
            .map(|i| format!("rank_d{} INTEGER", i))
            .collect::<Vec<_>>()
            .join(",\n                ");

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS global_data (
                url       TEXT PRIMARY KEY,
                date      TEXT NOT NULL,
                content   TEXT,
                embedding TEXT,
                {},
                cluster   INTEGER
            )
            "#,
            rank_columns
        ))
        .execute(&db)
        .await?;

        Ok(Self { db })
    }

    /// Keys and scrape dates of every stored row.
    pub async fn list_rows(&self) -> Result<Vec<ContentRow>> {
        let rows = sqlx::query("SELECT url, date FROM global_data")
            .fetch_all(&self.db)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let date: String = row.try_get("date")?;
            out.push(ContentRow {
                url: row.try_get("url")?,
                date: NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                    .map_err(|_| RadarError::BadDate(date.clone()))?,
            });
        }

        Ok(out)
    }

    /// Persist a batch of scrape successes. A domain that expired from the
    /// visited window but still has a content row gets re-scraped, so this
    /// is an upsert: the new content and date replace the old, rank history
    /// and cluster are left untouched.
    pub async fn append_rows(
        &self,
        outcomes: &[ScrapeOutcome],
        as_of: NaiveDate,
    ) -> Result<usize> {
        let date = as_of.to_string();

        for outcome in outcomes {
            let embedding = serde_json::to_string(&outcome.embedding)?;

            sqlx::query(
                r#"
                INSERT INTO global_data (url, date, content, embedding)
                VALUES (?, ?, ?, ?)
                ON CONFLICT (url) DO UPDATE SET
                    date = excluded.date,
                    content = excluded.content,
                    embedding = excluded.embedding
                "#,
            )
            .bind(&outcome.url)
            .bind(&date)
            .bind(&outcome.content)
            .bind(&embedding)
            .execute(&self.db)
            .await?;
        }

        info!("Stored {} scraped rows at {}", outcomes.len(), date);
        Ok(outcomes.len())
    }

    /// Write a cycle's dense ranks into one of the thirty rotating slots.
    /// Returns the number of rows that actually carried a rank.
    pub async fn write_ranks(&self, assignment: &RankAssignment, slot: u32) -> Result<usize> {
        if slot < 1 || slot > RANK_SLOTS {
            return Err(RadarError::RankSlotOutOfRange(slot));
        }

        // Slot is validated above; column names cannot be bound.
        let statement = format!("UPDATE global_data SET rank_d{} = ? WHERE url = ?", slot);

        let mut written = 0usize;
        for (url, rank) in &assignment.ranks {
            let result = sqlx::query(&statement)
                .bind(*rank as i64)
                .bind(url)
                .execute(&self.db)
                .await?;
            written += result.rows_affected() as usize;
        }

        debug!(
            "Wrote {} of {} ranks into slot rank_d{}",
            written,
            assignment.len(),
            slot
        );
        Ok(written)
    }
}
