use chrono::{Duration, NaiveDate};
use domain_radar::types::{RankAssignment, Result, ScrapeOutcome, ScrapeStatus};
use domain_radar::{ContentStore, VisitedStore};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

const WINDOW: i64 = 30;

async fn memory_pool() -> SqlitePool {
    // A pooled :memory: database is per-connection; one connection keeps
    // every query on the same database.
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory SQLite pool")
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("test date")
}

fn domains(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_insert_and_list_domains() -> Result<()> {
    let store = VisitedStore::new(memory_pool().await).await?;
    let d0 = day("2026-08-01");

    store.insert_new(&domains(&["a.com", "b.org"]), d0).await?;

    let listed = store.list_domains().await?;
    assert_eq!(listed.len(), 2);
    assert!(listed.contains("a.com"));
    assert!(listed.contains("b.org"));
    Ok(())
}

#[tokio::test]
async fn test_insert_collision_fails_loudly() -> Result<()> {
    let store = VisitedStore::new(memory_pool().await).await?;
    let d0 = day("2026-08-01");

    store.insert_new(&domains(&["a.com"]), d0).await?;
    let collision = store.insert_new(&domains(&["a.com"]), d0).await;

    assert!(collision.is_err(), "duplicate key must surface as an error");
    Ok(())
}

#[tokio::test]
async fn test_expiry_after_full_window() -> Result<()> {
    let store = VisitedStore::new(memory_pool().await).await?;
    let d0 = day("2026-08-01");
    let d30 = d0 + Duration::days(WINDOW);

    store.insert_new(&domains(&["a.com"]), d0).await?;

    // Exactly on the boundary: the active query excludes it and the
    // deletion tick removes it.
    let active = store.list_active(d30, WINDOW).await?;
    assert!(active.is_empty());

    let deleted = store.delete_expired(d30, WINDOW).await?;
    assert_eq!(deleted, 1);
    assert!(store.list_domains().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_touch_keeps_record_alive() -> Result<()> {
    let store = VisitedStore::new(memory_pool().await).await?;
    let d0 = day("2026-08-01");
    let d10 = d0 + Duration::days(10);
    let d30 = d0 + Duration::days(WINDOW);

    store.insert_new(&domains(&["a.com"]), d0).await?;
    store.touch(&domains(&["a.com"]), d10).await?;

    // 30 days after the original sighting the record no longer sits on the
    // boundary, so the tick leaves it alone.
    let deleted = store.delete_expired(d30, WINDOW).await?;
    assert_eq!(deleted, 0);
    assert!(store.list_domains().await?.contains("a.com"));

    // It expires a full window after the touch instead.
    let deleted = store.delete_expired(d10 + Duration::days(WINDOW), WINDOW).await?;
    assert_eq!(deleted, 1);
    Ok(())
}

#[tokio::test]
async fn test_touch_is_idempotent() -> Result<()> {
    let store = VisitedStore::new(memory_pool().await).await?;
    let d0 = day("2026-08-01");
    let d5 = d0 + Duration::days(5);

    store.insert_new(&domains(&["a.com"]), d0).await?;
    store.touch(&domains(&["a.com"]), d5).await?;
    store.touch(&domains(&["a.com"]), d5).await?;

    let active = store.list_active(d5, WINDOW).await?;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].date, d5);
    Ok(())
}

#[tokio::test]
async fn test_list_active_boundary_asymmetry() -> Result<()> {
    let store = VisitedStore::new(memory_pool().await).await?;
    let d0 = day("2026-08-01");

    store.insert_new(&domains(&["a.com"]), d0).await?;

    // One day past the boundary the record no longer matches the exact
    // boundary date, so the active query returns it again even though it
    // is older than the window. Only the boundary-day tick deletes it.
    let past_boundary = d0 + Duration::days(WINDOW + 1);
    let active = store.list_active(past_boundary, WINDOW).await?;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].url, "a.com");
    Ok(())
}

#[tokio::test]
async fn test_update_cycle_expires_untouched_domain() -> Result<()> {
    let store = VisitedStore::new(memory_pool().await).await?;
    let d0 = day("2026-08-01");
    let d30 = d0 + Duration::days(WINDOW);

    // Cycle 1: a.com is newly discovered.
    store
        .update_cycle(&[], &domains(&["a.com"]), d0, WINDOW)
        .await?;
    assert!(store.list_domains().await?.contains("a.com"));

    // Never touched again: the tick 30 days later removes it.
    let expired = store.update_cycle(&[], &[], d30, WINDOW).await?;
    assert_eq!(expired, 1);
    assert!(store.list_domains().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_update_cycle_touched_record_survives() -> Result<()> {
    let store = VisitedStore::new(memory_pool().await).await?;
    let d0 = day("2026-08-01");
    let d15 = d0 + Duration::days(15);
    let d30 = d0 + Duration::days(WINDOW);

    store
        .update_cycle(&[], &domains(&["a.com"]), d0, WINDOW)
        .await?;

    // a.com reappears mid-window and is touched.
    store
        .update_cycle(&domains(&["a.com"]), &[], d15, WINDOW)
        .await?;

    let expired = store.update_cycle(&[], &[], d30, WINDOW).await?;
    assert_eq!(expired, 0);
    assert!(store.list_domains().await?.contains("a.com"));
    Ok(())
}

#[tokio::test]
async fn test_update_cycle_same_day_expiry_and_reuse() -> Result<()> {
    let store = VisitedStore::new(memory_pool().await).await?;
    let d0 = day("2026-08-01");
    let d30 = d0 + Duration::days(WINDOW);

    store.insert_new(&domains(&["a.com"]), d0).await?;

    // a.com expires and is rediscovered in the same cycle; the
    // delete-before-insert ordering avoids the key collision.
    let expired = store
        .update_cycle(&[], &domains(&["a.com"]), d30, WINDOW)
        .await?;
    assert_eq!(expired, 1);

    let active = store.list_active(d30, WINDOW).await?;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].date, d30);
    Ok(())
}

#[tokio::test]
async fn test_content_store_append_and_list() -> Result<()> {
    let content = ContentStore::new(memory_pool().await).await?;
    let d0 = day("2026-08-01");

    let outcomes = vec![
        ScrapeOutcome {
            status: ScrapeStatus::Success,
            url: "https://a.com/".to_string(),
            content: "hello".to_string(),
            embedding: vec![0.1, 0.2],
        },
        ScrapeOutcome {
            status: ScrapeStatus::Success,
            url: "https://b.org/".to_string(),
            content: "world".to_string(),
            embedding: vec![],
        },
    ];

    content.append_rows(&outcomes, d0).await?;

    let rows = content.list_rows().await?;
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.date == d0));
    Ok(())
}

#[tokio::test]
async fn test_content_store_rescrape_upserts() -> Result<()> {
    let content = ContentStore::new(memory_pool().await).await?;
    let d0 = day("2026-08-01");
    let d40 = d0 + Duration::days(40);

    let first = vec![ScrapeOutcome {
        status: ScrapeStatus::Success,
        url: "https://a.com/".to_string(),
        content: "old".to_string(),
        embedding: vec![],
    }];
    let second = vec![ScrapeOutcome {
        status: ScrapeStatus::Success,
        url: "https://a.com/".to_string(),
        content: "new".to_string(),
        embedding: vec![],
    }];

    content.append_rows(&first, d0).await?;
    content.append_rows(&second, d40).await?;

    let rows = content.list_rows().await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date, d40);
    Ok(())
}

#[tokio::test]
async fn test_content_store_write_ranks() -> Result<()> {
    let pool = memory_pool().await;
    let content = ContentStore::new(pool.clone()).await?;
    let d0 = day("2026-08-01");

    let outcomes = vec![ScrapeOutcome {
        status: ScrapeStatus::Success,
        url: "https://a.com/".to_string(),
        content: String::new(),
        embedding: vec![],
    }];
    content.append_rows(&outcomes, d0).await?;

    let mut assignment = RankAssignment::default();
    assignment.ordered.push("https://a.com/".to_string());
    assignment.ranks.insert("https://a.com/".to_string(), 1);

    let written = content.write_ranks(&assignment, 7).await?;
    assert_eq!(written, 1);

    let row = sqlx::query("SELECT rank_d7 FROM global_data WHERE url = ?")
        .bind("https://a.com/")
        .fetch_one(&pool)
        .await
        .expect("row written above");
    let rank: i64 = row.try_get("rank_d7").expect("rank column");
    assert_eq!(rank, 1);

    // Ranks for unknown URLs update nothing.
    assignment.ranks.insert("https://ghost.com/".to_string(), 2);
    let written = content.write_ranks(&assignment, 7).await?;
    assert_eq!(written, 1);
    Ok(())
}

#[tokio::test]
async fn test_content_store_rejects_bad_rank_slot() -> Result<()> {
    let content = ContentStore::new(memory_pool().await).await?;
    let assignment = RankAssignment::default();

    assert!(content.write_ranks(&assignment, 0).await.is_err());
    assert!(content.write_ranks(&assignment, 31).await.is_err());
    Ok(())
}
