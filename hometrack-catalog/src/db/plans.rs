//! Plan database operations
//!
//! A plan row is either a standing home design (`plan`) or a currently
//! available built home (`now`). Company and community are free-text names;
//! (plan_name, company, community, plan_type) is the natural key for upsert.

use chrono::{DateTime, Utc};
use hometrack_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Kind of plan record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    #[default]
    Plan,
    Now,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Plan => "plan",
            PlanType::Now => "now",
        }
    }

    fn from_db(raw: &str) -> Result<Self> {
        match raw {
            "plan" => Ok(PlanType::Plan),
            "now" => Ok(PlanType::Now),
            other => Err(Error::Internal(format!("invalid plan_type in row: {other}"))),
        }
    }
}

/// Plan record
#[derive(Debug, Clone)]
pub struct Plan {
    pub guid: Uuid,
    pub plan_name: String,
    pub price: f64,
    pub sqft: Option<i64>,
    pub stories: Option<String>,
    pub price_per_sqft: Option<f64>,
    pub last_updated: DateTime<Utc>,
    pub company: String,
    pub community: String,
    pub plan_type: PlanType,
    pub beds: Option<String>,
    pub baths: Option<String>,
    pub address: Option<String>,
    pub design_number: Option<String>,
}

const SELECT_COLUMNS: &str = "guid, plan_name, price, sqft, stories, price_per_sqft, \
     last_updated, company, community, plan_type, beds, baths, address, design_number";

fn plan_from_row(row: &SqliteRow) -> Result<Plan> {
    let guid_str: String = row.get("guid");
    let guid = Uuid::parse_str(&guid_str)
        .map_err(|e| Error::Internal(format!("invalid guid in plans row: {e}")))?;
    let plan_type_str: String = row.get("plan_type");

    Ok(Plan {
        guid,
        plan_name: row.get("plan_name"),
        price: row.get("price"),
        sqft: row.get("sqft"),
        stories: row.get("stories"),
        price_per_sqft: row.get("price_per_sqft"),
        last_updated: row.get("last_updated"),
        company: row.get("company"),
        community: row.get("community"),
        plan_type: PlanType::from_db(&plan_type_str)?,
        beds: row.get("beds"),
        baths: row.get("baths"),
        address: row.get("address"),
        design_number: row.get("design_number"),
    })
}

/// Insert a new plan
pub async fn insert_plan(pool: &SqlitePool, plan: &Plan) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO plans (
            guid, plan_name, price, sqft, stories, price_per_sqft, last_updated,
            company, community, plan_type, beds, baths, address, design_number
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(plan.guid.to_string())
    .bind(&plan.plan_name)
    .bind(plan.price)
    .bind(plan.sqft)
    .bind(&plan.stories)
    .bind(plan.price_per_sqft)
    .bind(plan.last_updated)
    .bind(&plan.company)
    .bind(&plan.community)
    .bind(plan.plan_type.as_str())
    .bind(&plan.beds)
    .bind(&plan.baths)
    .bind(&plan.address)
    .bind(&plan.design_number)
    .execute(pool)
    .await?;

    Ok(())
}

/// Overwrite the mutable fields of an existing plan
pub async fn update_plan(pool: &SqlitePool, plan: &Plan) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE plans SET
            price = ?, sqft = ?, stories = ?, price_per_sqft = ?, last_updated = ?,
            beds = ?, baths = ?, address = ?, design_number = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(plan.price)
    .bind(plan.sqft)
    .bind(&plan.stories)
    .bind(plan.price_per_sqft)
    .bind(plan.last_updated)
    .bind(&plan.beds)
    .bind(&plan.baths)
    .bind(&plan.address)
    .bind(&plan.design_number)
    .bind(plan.guid.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Look up a plan by its natural key (exact, case-sensitive match)
pub async fn find_by_natural_key(
    pool: &SqlitePool,
    plan_name: &str,
    company: &str,
    community: &str,
    plan_type: PlanType,
) -> Result<Option<Plan>> {
    let row = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM plans \
         WHERE plan_name = ? AND company = ? AND community = ? AND plan_type = ?"
    ))
    .bind(plan_name)
    .bind(company)
    .bind(community)
    .bind(plan_type.as_str())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(plan_from_row).transpose()
}

/// List all plans, most recently updated first
pub async fn list_plans(pool: &SqlitePool) -> Result<Vec<Plan>> {
    let rows = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM plans ORDER BY last_updated DESC"
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(plan_from_row).collect()
}
