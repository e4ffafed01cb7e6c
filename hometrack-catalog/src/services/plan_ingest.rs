//! Plan upsert and price-history recording
//!
//! The create-or-update path for plan records. A batch never fails on a bad
//! record; records missing a required field are skipped and the batch
//! reports how many records were written. A price difference on an existing
//! plan appends a price-history row before the price is overwritten.

use crate::db::plans::{self, Plan, PlanType};
use crate::db::price_history::{self, PriceChange};
use chrono::{DateTime, Duration, Utc};
use hometrack_common::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

/// Fixed lookback window for the "recently changed" flag
pub const RECENT_WINDOW_HOURS: i64 = 24;

/// One incoming plan record. Every field is optional at the wire level;
/// validation happens per record inside the batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanInput {
    #[serde(default)]
    pub plan_name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub sqft: Option<i64>,
    #[serde(default)]
    pub stories: Option<String>,
    #[serde(default)]
    pub price_per_sqft: Option<f64>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub community: Option<String>,
    #[serde(rename = "type", default)]
    pub plan_type: PlanType,
    #[serde(default)]
    pub beds: Option<String>,
    #[serde(default)]
    pub baths: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub design_number: Option<String>,
}

/// Required fields for a usable record: name, company, community non-blank
/// and a non-zero price. Anything else is skipped without aborting siblings.
fn required_fields(input: &PlanInput) -> Option<(String, f64, String, String)> {
    let plan_name = input.plan_name.as_deref()?.trim();
    let company = input.company.as_deref()?.trim();
    let community = input.community.as_deref()?.trim();
    let price = input.price?;
    if plan_name.is_empty() || company.is_empty() || community.is_empty() || price == 0.0 {
        return None;
    }
    Some((
        plan_name.to_string(),
        price,
        company.to_string(),
        community.to_string(),
    ))
}

/// Upsert a batch of plan records, returning the count written.
///
/// Which natural keys changed price is recoverable only from price history,
/// not from the return value.
pub async fn upsert_plans(pool: &SqlitePool, batch: &[PlanInput]) -> Result<usize> {
    let mut written = 0usize;

    for input in batch {
        let Some((plan_name, price, company, community)) = required_fields(input) else {
            debug!("skipping plan record with missing required fields");
            continue;
        };

        let existing =
            plans::find_by_natural_key(pool, &plan_name, &company, &community, input.plan_type)
                .await?;

        match existing {
            Some(mut plan) => {
                if plan.price != price {
                    // Record the change before overwriting the price
                    let change = PriceChange::new(plan.guid, plan.price, price);
                    price_history::insert_price_change(pool, &change).await?;
                    plan.price = price;
                    plan.last_updated = Utc::now();
                }

                // Sparse update: only fields present in the input overwrite
                if let Some(sqft) = input.sqft {
                    plan.sqft = Some(sqft);
                }
                if let Some(stories) = &input.stories {
                    plan.stories = Some(stories.clone());
                }
                if let Some(price_per_sqft) = input.price_per_sqft {
                    plan.price_per_sqft = Some(price_per_sqft);
                }
                if let Some(beds) = &input.beds {
                    plan.beds = Some(beds.clone());
                }
                if let Some(baths) = &input.baths {
                    plan.baths = Some(baths.clone());
                }
                if let Some(address) = &input.address {
                    plan.address = Some(address.clone());
                }
                if let Some(design_number) = &input.design_number {
                    plan.design_number = Some(design_number.clone());
                }

                plans::update_plan(pool, &plan).await?;
            }
            None => {
                let plan = Plan {
                    guid: Uuid::new_v4(),
                    plan_name,
                    price,
                    sqft: input.sqft,
                    stories: input.stories.clone(),
                    price_per_sqft: input.price_per_sqft,
                    last_updated: Utc::now(),
                    company,
                    community,
                    plan_type: input.plan_type,
                    beds: input.beds.clone(),
                    baths: input.baths.clone(),
                    address: input.address.clone(),
                    design_number: input.design_number.clone(),
                };
                plans::insert_plan(pool, &plan).await?;
            }
        }
        written += 1;
    }

    Ok(written)
}

/// Plan as listed, annotated with the recently-changed flag
#[derive(Debug, Clone, Serialize)]
pub struct PlanListing {
    pub plan_name: String,
    pub price: f64,
    pub sqft: Option<i64>,
    pub stories: Option<String>,
    pub price_per_sqft: Option<f64>,
    pub last_updated: DateTime<Utc>,
    pub company: String,
    pub community: String,
    #[serde(rename = "type")]
    pub plan_type: PlanType,
    pub address: Option<String>,
    pub price_changed_recently: bool,
}

/// List all plans with the 24-hour recently-changed flag.
///
/// The flag is a query-time join against price history, not a stored field.
pub async fn list_plans_with_recency(pool: &SqlitePool) -> Result<Vec<PlanListing>> {
    let since = Utc::now() - Duration::hours(RECENT_WINDOW_HOURS);
    let changed = price_history::plans_changed_since(pool, since).await?;
    let plans = plans::list_plans(pool).await?;

    Ok(plans
        .into_iter()
        .map(|plan| PlanListing {
            price_changed_recently: changed.contains(&plan.guid),
            plan_name: plan.plan_name,
            price: plan.price,
            sqft: plan.sqft,
            stories: plan.stories,
            price_per_sqft: plan.price_per_sqft,
            last_updated: plan.last_updated,
            company: plan.company,
            community: plan.community,
            plan_type: plan.plan_type,
            address: plan.address,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::plans::find_by_natural_key;
    use crate::db::price_history::changes_for_plan;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        hometrack_common::db::create_schema(&pool)
            .await
            .expect("schema");
        pool
    }

    fn input(name: &str, price: f64) -> PlanInput {
        PlanInput {
            plan_name: Some(name.to_string()),
            price: Some(price),
            company: Some("Acme Homes".to_string()),
            community: Some("Elevon".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn new_plan_is_inserted() {
        let pool = test_pool().await;
        let written = upsert_plans(&pool, &[input("Magnolia", 450_000.0)])
            .await
            .expect("upsert");
        assert_eq!(written, 1);

        let plan = find_by_natural_key(&pool, "Magnolia", "Acme Homes", "Elevon", PlanType::Plan)
            .await
            .expect("query")
            .expect("present");
        assert_eq!(plan.price, 450_000.0);
    }

    #[tokio::test]
    async fn price_change_records_history_once() {
        let pool = test_pool().await;
        upsert_plans(&pool, &[input("Magnolia", 450_000.0)])
            .await
            .expect("first upsert");
        upsert_plans(&pool, &[input("Magnolia", 460_000.0)])
            .await
            .expect("second upsert");

        let plan = find_by_natural_key(&pool, "Magnolia", "Acme Homes", "Elevon", PlanType::Plan)
            .await
            .expect("query")
            .expect("present");
        assert_eq!(plan.price, 460_000.0);

        let changes = changes_for_plan(&pool, plan.guid).await.expect("history");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_price, 450_000.0);
        assert_eq!(changes[0].new_price, 460_000.0);
    }

    #[tokio::test]
    async fn same_price_reupsert_adds_no_history() {
        let pool = test_pool().await;
        upsert_plans(&pool, &[input("Magnolia", 450_000.0)])
            .await
            .expect("first upsert");
        upsert_plans(&pool, &[input("Magnolia", 450_000.0)])
            .await
            .expect("second upsert");

        let plan = find_by_natural_key(&pool, "Magnolia", "Acme Homes", "Elevon", PlanType::Plan)
            .await
            .expect("query")
            .expect("present");
        assert!(changes_for_plan(&pool, plan.guid)
            .await
            .expect("history")
            .is_empty());
    }

    #[tokio::test]
    async fn sparse_update_leaves_omitted_fields_untouched() {
        let pool = test_pool().await;
        let mut first = input("Magnolia", 450_000.0);
        first.sqft = Some(2400);
        first.beds = Some("4".to_string());
        upsert_plans(&pool, &[first]).await.expect("first upsert");

        // Second record omits sqft and beds entirely
        let mut second = input("Magnolia", 450_000.0);
        second.baths = Some("3".to_string());
        upsert_plans(&pool, &[second]).await.expect("second upsert");

        let plan = find_by_natural_key(&pool, "Magnolia", "Acme Homes", "Elevon", PlanType::Plan)
            .await
            .expect("query")
            .expect("present");
        assert_eq!(plan.sqft, Some(2400));
        assert_eq!(plan.beds.as_deref(), Some("4"));
        assert_eq!(plan.baths.as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn bad_records_are_skipped_without_aborting_batch() {
        let pool = test_pool().await;
        let batch = vec![
            input("Magnolia", 450_000.0),
            PlanInput::default(),                  // everything missing
            input("", 450_000.0),                  // blank name
            input("Willow", 0.0),                  // zero price
            input("Juniper", 380_000.0),
        ];

        let written = upsert_plans(&pool, &batch).await.expect("upsert");
        assert_eq!(written, 2);
    }

    #[tokio::test]
    async fn same_name_different_type_is_a_distinct_record() {
        let pool = test_pool().await;
        let mut quick_move_in = input("Magnolia", 455_000.0);
        quick_move_in.plan_type = PlanType::Now;

        let written = upsert_plans(&pool, &[input("Magnolia", 450_000.0), quick_move_in])
            .await
            .expect("upsert");
        assert_eq!(written, 2);

        assert!(
            find_by_natural_key(&pool, "Magnolia", "Acme Homes", "Elevon", PlanType::Now)
                .await
                .expect("query")
                .is_some()
        );
    }

    #[tokio::test]
    async fn listing_reports_recency_flag() {
        let pool = test_pool().await;
        upsert_plans(&pool, &[input("Magnolia", 450_000.0)])
            .await
            .expect("first upsert");
        upsert_plans(&pool, &[input("Magnolia", 460_000.0)])
            .await
            .expect("second upsert");
        upsert_plans(&pool, &[input("Juniper", 380_000.0)])
            .await
            .expect("third upsert");

        let listed = list_plans_with_recency(&pool).await.expect("list");
        let magnolia = listed
            .iter()
            .find(|p| p.plan_name == "Magnolia")
            .expect("magnolia listed");
        let juniper = listed
            .iter()
            .find(|p| p.plan_name == "Juniper")
            .expect("juniper listed");

        assert!(magnolia.price_changed_recently);
        assert!(!juniper.price_changed_recently);
    }
}
