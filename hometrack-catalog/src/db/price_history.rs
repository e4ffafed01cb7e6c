//! Price history database operations
//!
//! Append-only record of plan price changes. Exists solely to answer "did
//! this plan's price change recently"; rows are never mutated.

use chrono::{DateTime, Utc};
use hometrack_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use uuid::Uuid;

/// One recorded price change
#[derive(Debug, Clone)]
pub struct PriceChange {
    pub guid: Uuid,
    pub plan_id: Uuid,
    pub old_price: f64,
    pub new_price: f64,
    pub changed_at: DateTime<Utc>,
}

impl PriceChange {
    pub fn new(plan_id: Uuid, old_price: f64, new_price: f64) -> Self {
        Self {
            guid: Uuid::new_v4(),
            plan_id,
            old_price,
            new_price,
            changed_at: Utc::now(),
        }
    }
}

/// Append a price change record
pub async fn insert_price_change(pool: &SqlitePool, change: &PriceChange) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO price_history (guid, plan_id, old_price, new_price, changed_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(change.guid.to_string())
    .bind(change.plan_id.to_string())
    .bind(change.old_price)
    .bind(change.new_price)
    .bind(change.changed_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// All price changes for one plan, newest first
pub async fn changes_for_plan(pool: &SqlitePool, plan_id: Uuid) -> Result<Vec<PriceChange>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, plan_id, old_price, new_price, changed_at
        FROM price_history
        WHERE plan_id = ?
        ORDER BY changed_at DESC
        "#,
    )
    .bind(plan_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let guid_str: String = row.get("guid");
            let plan_id_str: String = row.get("plan_id");
            Ok(PriceChange {
                guid: Uuid::parse_str(&guid_str)
                    .map_err(|e| Error::Internal(format!("invalid guid in price_history: {e}")))?,
                plan_id: Uuid::parse_str(&plan_id_str)
                    .map_err(|e| Error::Internal(format!("invalid plan_id in price_history: {e}")))?,
                old_price: row.get("old_price"),
                new_price: row.get("new_price"),
                changed_at: row.get("changed_at"),
            })
        })
        .collect()
}

/// Identifiers of plans with at least one price change at or after `since`
pub async fn plans_changed_since(
    pool: &SqlitePool,
    since: DateTime<Utc>,
) -> Result<HashSet<Uuid>> {
    let rows = sqlx::query("SELECT DISTINCT plan_id FROM price_history WHERE changed_at >= ?")
        .bind(since)
        .fetch_all(pool)
        .await?;

    let mut plan_ids = HashSet::with_capacity(rows.len());
    for row in &rows {
        let plan_id_str: String = row.get("plan_id");
        let plan_id = Uuid::parse_str(&plan_id_str)
            .map_err(|e| Error::Internal(format!("invalid plan_id in price_history: {e}")))?;
        plan_ids.insert(plan_id);
    }
    Ok(plan_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::plans::{insert_plan, Plan, PlanType};
    use chrono::Duration;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        hometrack_common::db::create_schema(&pool)
            .await
            .expect("schema");
        pool
    }

    async fn seed_plan(pool: &SqlitePool) -> Uuid {
        let plan = Plan {
            guid: Uuid::new_v4(),
            plan_name: "Magnolia".to_string(),
            price: 450_000.0,
            sqft: None,
            stories: None,
            price_per_sqft: None,
            last_updated: Utc::now(),
            company: "Acme Homes".to_string(),
            community: "Elevon".to_string(),
            plan_type: PlanType::Plan,
            beds: None,
            baths: None,
            address: None,
            design_number: None,
        };
        insert_plan(pool, &plan).await.expect("insert plan");
        plan.guid
    }

    #[tokio::test]
    async fn change_within_window_is_reported() {
        let pool = test_pool().await;
        let plan_id = seed_plan(&pool).await;

        let mut change = PriceChange::new(plan_id, 450_000.0, 460_000.0);
        change.changed_at = Utc::now() - Duration::hours(1);
        insert_price_change(&pool, &change).await.expect("insert");

        let since = Utc::now() - Duration::hours(24);
        let changed = plans_changed_since(&pool, since).await.expect("query");
        assert!(changed.contains(&plan_id));
    }

    #[tokio::test]
    async fn change_outside_window_is_not_reported() {
        let pool = test_pool().await;
        let plan_id = seed_plan(&pool).await;

        let mut change = PriceChange::new(plan_id, 450_000.0, 460_000.0);
        change.changed_at = Utc::now() - Duration::hours(25);
        insert_price_change(&pool, &change).await.expect("insert");

        let since = Utc::now() - Duration::hours(24);
        let changed = plans_changed_since(&pool, since).await.expect("query");
        assert!(!changed.contains(&plan_id));
    }

    #[tokio::test]
    async fn changes_for_plan_newest_first() {
        let pool = test_pool().await;
        let plan_id = seed_plan(&pool).await;

        let mut first = PriceChange::new(plan_id, 450_000.0, 460_000.0);
        first.changed_at = Utc::now() - Duration::hours(5);
        insert_price_change(&pool, &first).await.expect("insert");

        let second = PriceChange::new(plan_id, 460_000.0, 455_000.0);
        insert_price_change(&pool, &second).await.expect("insert");

        let changes = changes_for_plan(&pool, plan_id).await.expect("query");
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].new_price, 455_000.0);
        assert_eq!(changes[1].new_price, 460_000.0);
    }
}
