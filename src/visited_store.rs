//! Rolling-window store of domains the pipeline has already accepted.
//!
//! Rows live in `visited_domains (url PRIMARY KEY, date, status)`. A row is
//! created the first time a domain is scraped, its date is refreshed every
//! cycle the domain reappears, and it is purged on the cycle where its date
//! lands exactly on the rolling boundary (`as_of - window_days`). The store
//! is designed around a once-per-day tick: only boundary rows are deleted,
//! so skipping a day leaves that day's cohort in place.

use crate::classifier;
use crate::types::{RadarError, Result, VisitedRecord, STATUS_ACTIVE};
use chrono::{Duration, NaiveDate};
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use tracing::{debug, info};

pub struct VisitedStore {
    db: SqlitePool,
}

impl VisitedStore {
    pub async fn new(db: SqlitePool) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS visited_domains (
                url    TEXT PRIMARY KEY,
                date   TEXT NOT NULL,
                status INTEGER NOT NULL
            )
            "#,
        )
        .execute(&db)
        .await?;

        Ok(Self { db })
    }

    fn boundary(as_of: NaiveDate, window_days: i64) -> NaiveDate {
        as_of - Duration::days(window_days)
    }

    fn parse_date(raw: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| RadarError::BadDate(raw.to_string()))
    }

    /// Registrable domains over every stored row, any status, any age.
    /// This is the dedup universe for "have we ever seen this domain".
    pub async fn list_domains(&self) -> Result<HashSet<String>> {
        let rows = sqlx::query("SELECT url FROM visited_domains")
            .fetch_all(&self.db)
            .await?;

        let mut domains = HashSet::new();
        for row in rows {
            let url: String = row.try_get("url")?;
            if let Ok(domain) = classifier::registrable_domain(&url) {
                domains.insert(domain);
            }
        }

        Ok(domains)
    }

    /// Active rows whose date is not exactly the rolling boundary.
    ///
    /// Rows strictly older than the boundary still come back; expiry
    /// enforcement belongs to `delete_expired`, not to this query. Callers
    /// that need strict recency must check the returned dates themselves.
    pub async fn list_active(
        &self,
        as_of: NaiveDate,
        window_days: i64,
    ) -> Result<Vec<VisitedRecord>> {
        let expired = Self::boundary(as_of, window_days).to_string();

        let rows = sqlx::query(
            "SELECT url, date, status FROM visited_domains WHERE status = ? AND date != ?",
        )
        .bind(STATUS_ACTIVE)
        .bind(&expired)
        .fetch_all(&self.db)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let date: String = row.try_get("date")?;
            records.push(VisitedRecord {
                url: row.try_get("url")?,
                date: Self::parse_date(&date)?,
                status: row.try_get("status")?,
            });
        }

        Ok(records)
    }

    /// Purge active rows sitting exactly on the rolling boundary.
    pub async fn delete_expired(&self, as_of: NaiveDate, window_days: i64) -> Result<u64> {
        let expired = Self::boundary(as_of, window_days).to_string();

        let result = sqlx::query("DELETE FROM visited_domains WHERE status = ? AND date = ?")
            .bind(STATUS_ACTIVE)
            .bind(&expired)
            .execute(&self.db)
            .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            info!("Expired {} visited domains dated {}", deleted, expired);
        } else {
            debug!("No visited domains dated {} to expire", expired);
        }

        Ok(deleted)
    }

    /// Append fresh active rows for domains not previously present.
    ///
    /// No upsert on purpose: a key collision means an upstream caller
    /// failed to pre-filter via `list_domains`, and must surface as an
    /// error rather than be papered over.
    pub async fn insert_new(&self, domains: &[String], as_of: NaiveDate) -> Result<usize> {
        let date = as_of.to_string();

        for domain in domains {
            sqlx::query("INSERT INTO visited_domains (url, date, status) VALUES (?, ?, ?)")
                .bind(domain)
                .bind(&date)
                .bind(STATUS_ACTIVE)
                .execute(&self.db)
                .await?;
        }

        if !domains.is_empty() {
            info!("Recorded {} newly visited domains at {}", domains.len(), date);
        }

        Ok(domains.len())
    }

    /// Refresh the date on existing rows, keeping them alive for another
    /// full window. Idempotent per URL; unknown URLs are a no-op.
    pub async fn touch(&self, urls: &[String], as_of: NaiveDate) -> Result<()> {
        let date = as_of.to_string();

        for url in urls {
            sqlx::query("UPDATE visited_domains SET date = ? WHERE url = ?")
                .bind(&date)
                .bind(url)
                .execute(&self.db)
                .await?;
        }

        debug!("Touched {} visited domains at {}", urls.len(), date);
        Ok(())
    }

    /// One daily maintenance tick: expire, then insert, then touch.
    ///
    /// Expiry must run before insertion so a domain that expires and
    /// reappears in the same cycle does not collide on its key. Touch runs
    /// last; re-touching rows inserted a moment ago is harmless.
    pub async fn update_cycle(
        &self,
        all_seen: &[String],
        new_urls: &[String],
        as_of: NaiveDate,
        window_days: i64,
    ) -> Result<u64> {
        let expired = self.delete_expired(as_of, window_days).await?;
        self.insert_new(new_urls, as_of).await?;
        self.touch(all_seen, as_of).await?;
        Ok(expired)
    }
}
