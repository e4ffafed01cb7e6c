//! Company database operations

use hometrack_common::{Error, Result};
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;

/// Home-building company record
#[derive(Debug, Clone, Serialize)]
pub struct Company {
    pub guid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub headquarters: Option<String>,
    pub founded: Option<String>,
}

impl Company {
    /// Create new company with a fresh stable identifier
    pub fn new(name: String) -> Self {
        Self {
            guid: Uuid::new_v4(),
            name,
            description: None,
            website: None,
            headquarters: None,
            founded: None,
        }
    }
}

const SELECT_COLUMNS: &str = "guid, name, description, website, headquarters, founded";

fn company_from_row(row: &SqliteRow) -> Result<Company> {
    let guid_str: String = row.get("guid");
    let guid = Uuid::parse_str(&guid_str)
        .map_err(|e| Error::Internal(format!("invalid guid in companies row: {e}")))?;

    Ok(Company {
        guid,
        name: row.get("name"),
        description: row.get("description"),
        website: row.get("website"),
        headquarters: row.get("headquarters"),
        founded: row.get("founded"),
    })
}

/// Insert a company. A duplicate name surfaces as a UNIQUE violation;
/// callers translate that into a conflict.
pub async fn insert_company(pool: &SqlitePool, company: &Company) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO companies (guid, name, description, website, headquarters, founded)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(company.guid.to_string())
    .bind(&company.name)
    .bind(&company.description)
    .bind(&company.website)
    .bind(&company.headquarters)
    .bind(&company.founded)
    .execute(pool)
    .await?;

    Ok(())
}

/// List all companies ordered by name
pub async fn list_companies(pool: &SqlitePool) -> Result<Vec<Company>> {
    let rows = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM companies ORDER BY name"
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(company_from_row).collect()
}

/// Load company by stable identifier
pub async fn find_by_guid(pool: &SqlitePool, guid: Uuid) -> Result<Option<Company>> {
    let row = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM companies WHERE guid = ?"
    ))
    .bind(guid.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(company_from_row).transpose()
}

/// Load company by exact (case-sensitive) name
pub async fn find_by_name_exact(pool: &SqlitePool, name: &str) -> Result<Option<Company>> {
    let row = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM companies WHERE name = ?"
    ))
    .bind(name)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(company_from_row).transpose()
}

/// Load company by case-insensitive exact name match
pub async fn find_by_name_ci(pool: &SqlitePool, name: &str) -> Result<Option<Company>> {
    let row = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM companies WHERE name LIKE ? ESCAPE '\\'"
    ))
    .bind(super::escape_like(name.trim()))
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(company_from_row).transpose()
}

/// Batch-load companies whose name matches exactly (case-sensitive).
///
/// Used by the legacy reference migrator; names with no matching company are
/// simply absent from the result.
pub async fn find_by_names(pool: &SqlitePool, names: &[String]) -> Result<Vec<Company>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb = sqlx::QueryBuilder::new(format!(
        "SELECT {SELECT_COLUMNS} FROM companies WHERE name IN ("
    ));
    let mut separated = qb.separated(", ");
    for name in names {
        separated.push_bind(name);
    }
    qb.push(")");

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(company_from_row).collect()
}

/// Batch-resolve stable identifiers to display names
pub async fn names_for_guids(pool: &SqlitePool, guids: &[Uuid]) -> Result<HashMap<Uuid, String>> {
    if guids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut qb = sqlx::QueryBuilder::new("SELECT guid, name FROM companies WHERE guid IN (");
    let mut separated = qb.separated(", ");
    for guid in guids {
        separated.push_bind(guid.to_string());
    }
    qb.push(")");

    let rows = qb.build().fetch_all(pool).await?;

    let mut names = HashMap::with_capacity(rows.len());
    for row in &rows {
        let guid_str: String = row.get("guid");
        let guid = Uuid::parse_str(&guid_str)
            .map_err(|e| Error::Internal(format!("invalid guid in companies row: {e}")))?;
        names.insert(guid, row.get("name"));
    }
    Ok(names)
}

/// Delete company by identifier, returning the deleted record if it existed.
///
/// Membership references to the deleted company are intentionally left in
/// place; they become orphans that later migrations drop.
pub async fn delete_company(pool: &SqlitePool, guid: Uuid) -> Result<Option<Company>> {
    let existing = find_by_guid(pool, guid).await?;
    if existing.is_some() {
        sqlx::query("DELETE FROM companies WHERE guid = ?")
            .bind(guid.to_string())
            .execute(pool)
            .await?;
    }
    Ok(existing)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        hometrack_common::db::create_schema(&pool)
            .await
            .expect("schema");
        pool
    }

    #[tokio::test]
    async fn insert_and_find_by_guid() {
        let pool = test_pool().await;
        let company = Company::new("Acme Homes".to_string());
        insert_company(&pool, &company).await.expect("insert");

        let loaded = find_by_guid(&pool, company.guid)
            .await
            .expect("query")
            .expect("present");
        assert_eq!(loaded.name, "Acme Homes");
    }

    #[tokio::test]
    async fn name_lookup_is_case_insensitive() {
        let pool = test_pool().await;
        insert_company(&pool, &Company::new("Acme Homes".to_string()))
            .await
            .expect("insert");

        let loaded = find_by_name_ci(&pool, "acme homes").await.expect("query");
        assert!(loaded.is_some());
        assert_eq!(loaded.unwrap().name, "Acme Homes");

        let missing = find_by_name_ci(&pool, "acme").await.expect("query");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn wildcard_characters_do_not_widen_the_match() {
        let pool = test_pool().await;
        insert_company(&pool, &Company::new("Acme Homes".to_string()))
            .await
            .expect("insert");

        // '%' would match everything if it were not escaped
        assert!(find_by_name_ci(&pool, "%").await.expect("query").is_none());
        assert!(find_by_name_ci(&pool, "Acme Home_")
            .await
            .expect("query")
            .is_none());
    }

    #[tokio::test]
    async fn duplicate_name_violates_unique_constraint() {
        let pool = test_pool().await;
        insert_company(&pool, &Company::new("Acme Homes".to_string()))
            .await
            .expect("insert");

        let err = insert_company(&pool, &Company::new("Acme Homes".to_string()))
            .await
            .expect_err("duplicate should fail");
        match err {
            hometrack_common::Error::Database(e) => assert!(crate::db::is_unique_violation(&e)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn batch_name_lookup_skips_unknown_names() {
        let pool = test_pool().await;
        insert_company(&pool, &Company::new("Acme Homes".to_string()))
            .await
            .expect("insert");
        insert_company(&pool, &Company::new("Beta Builders".to_string()))
            .await
            .expect("insert");

        let found = find_by_names(
            &pool,
            &[
                "Acme Homes".to_string(),
                "Ghost Co".to_string(),
                "Beta Builders".to_string(),
            ],
        )
        .await
        .expect("query");
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn delete_returns_record_and_removes_row() {
        let pool = test_pool().await;
        let company = Company::new("Acme Homes".to_string());
        insert_company(&pool, &company).await.expect("insert");

        let deleted = delete_company(&pool, company.guid).await.expect("delete");
        assert_eq!(deleted.expect("present").name, "Acme Homes");

        assert!(find_by_guid(&pool, company.guid)
            .await
            .expect("query")
            .is_none());
        assert!(delete_company(&pool, company.guid)
            .await
            .expect("second delete")
            .is_none());
    }
}
