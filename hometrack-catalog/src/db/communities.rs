//! Community database operations
//!
//! A community's membership is a JSON array of company references. Legacy
//! rows hold free-text company names; current rows hold stable identifiers.
//! The two are told apart the same way on every read: an element that parses
//! as a UUID is an identifier, anything else is a name.

use hometrack_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// One entry of a community's membership collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanyRef {
    /// Stable company identifier
    ById(Uuid),
    /// Legacy free-text company name, not yet migrated
    ByName(String),
}

impl CompanyRef {
    /// Classify a raw stored element
    pub fn parse(raw: &str) -> Self {
        match Uuid::parse_str(raw) {
            Ok(guid) => CompanyRef::ById(guid),
            Err(_) => CompanyRef::ByName(raw.to_string()),
        }
    }

    /// Raw stored form of the reference
    pub fn as_raw(&self) -> String {
        match self {
            CompanyRef::ById(guid) => guid.to_string(),
            CompanyRef::ByName(name) => name.clone(),
        }
    }

    pub fn guid(&self) -> Option<Uuid> {
        match self {
            CompanyRef::ById(guid) => Some(*guid),
            CompanyRef::ByName(_) => None,
        }
    }
}

/// Community record
#[derive(Debug, Clone)]
pub struct Community {
    pub guid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub company_refs: Vec<CompanyRef>,
}

impl Community {
    /// Create new community with an empty membership collection
    pub fn new(name: String) -> Self {
        Self {
            guid: Uuid::new_v4(),
            name,
            description: None,
            location: None,
            company_refs: Vec::new(),
        }
    }
}

const SELECT_COLUMNS: &str = "guid, name, description, location, company_refs";

fn refs_to_json(refs: &[CompanyRef]) -> Result<String> {
    let raw: Vec<String> = refs.iter().map(CompanyRef::as_raw).collect();
    serde_json::to_string(&raw).map_err(|e| Error::Internal(format!("encode company_refs: {e}")))
}

fn refs_from_json(json: &str) -> Result<Vec<CompanyRef>> {
    let raw: Vec<String> = serde_json::from_str(json)
        .map_err(|e| Error::Internal(format!("decode company_refs: {e}")))?;
    Ok(raw.iter().map(|s| CompanyRef::parse(s)).collect())
}

fn community_from_row(row: &SqliteRow) -> Result<Community> {
    let guid_str: String = row.get("guid");
    let guid = Uuid::parse_str(&guid_str)
        .map_err(|e| Error::Internal(format!("invalid guid in communities row: {e}")))?;
    let refs_json: String = row.get("company_refs");

    Ok(Community {
        guid,
        name: row.get("name"),
        description: row.get("description"),
        location: row.get("location"),
        company_refs: refs_from_json(&refs_json)?,
    })
}

/// Insert a community. A duplicate name surfaces as a UNIQUE violation.
pub async fn insert_community(pool: &SqlitePool, community: &Community) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO communities (guid, name, description, location, company_refs)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(community.guid.to_string())
    .bind(&community.name)
    .bind(&community.description)
    .bind(&community.location)
    .bind(refs_to_json(&community.company_refs)?)
    .execute(pool)
    .await?;

    Ok(())
}

/// List all communities ordered by name
pub async fn list_communities(pool: &SqlitePool) -> Result<Vec<Community>> {
    let rows = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM communities ORDER BY name"
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(community_from_row).collect()
}

/// Load community by stable identifier
pub async fn find_by_guid(pool: &SqlitePool, guid: Uuid) -> Result<Option<Community>> {
    let row = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM communities WHERE guid = ?"
    ))
    .bind(guid.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(community_from_row).transpose()
}

/// Load community by exact (case-sensitive) name
pub async fn find_by_name_exact(pool: &SqlitePool, name: &str) -> Result<Option<Community>> {
    let row = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM communities WHERE name = ?"
    ))
    .bind(name)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(community_from_row).transpose()
}

/// Load community by case-insensitive exact name match
pub async fn find_by_name_ci(pool: &SqlitePool, name: &str) -> Result<Option<Community>> {
    let row = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM communities WHERE name LIKE ? ESCAPE '\\'"
    ))
    .bind(super::escape_like(name.trim()))
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(community_from_row).transpose()
}

/// Overwrite a community's membership collection
pub async fn set_company_refs(pool: &SqlitePool, guid: Uuid, refs: &[CompanyRef]) -> Result<()> {
    sqlx::query(
        "UPDATE communities SET company_refs = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(refs_to_json(refs)?)
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Atomically append a company identifier unless it is already present.
///
/// Single UPDATE statement, so two concurrent adds of the same company cannot
/// both append; this is the set-union primitive the membership path relies on.
pub async fn add_ref_if_absent(pool: &SqlitePool, guid: Uuid, company_guid: Uuid) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE communities
        SET company_refs = json_insert(company_refs, '$[#]', ?1),
            updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?2
          AND NOT EXISTS (
              SELECT 1 FROM json_each(communities.company_refs)
              WHERE json_each.value = ?1
          )
        "#,
    )
    .bind(company_guid.to_string())
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete community by identifier, returning the deleted record if it existed
pub async fn delete_community(pool: &SqlitePool, guid: Uuid) -> Result<Option<Community>> {
    let existing = find_by_guid(pool, guid).await?;
    if existing.is_some() {
        sqlx::query("DELETE FROM communities WHERE guid = ?")
            .bind(guid.to_string())
            .execute(pool)
            .await?;
    }
    Ok(existing)
}

/// Delete all communities, returning how many were removed
pub async fn delete_all_communities(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM communities").execute(pool).await?;
    Ok(result.rows_affected())
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

    #[test]
    fn company_ref_parse_distinguishes_guid_from_name() {
        let guid = Uuid::new_v4();
        assert_eq!(
            CompanyRef::parse(&guid.to_string()),
            CompanyRef::ById(guid)
        );
        assert_eq!(
            CompanyRef::parse("Acme Homes"),
            CompanyRef::ByName("Acme Homes".to_string())
        );
    }

    #[tokio::test]
    async fn refs_round_trip_through_storage() {
        let pool = test_pool().await;
        let guid = Uuid::new_v4();
        let mut community = Community::new("Elevon".to_string());
        community.company_refs = vec![
            CompanyRef::ById(guid),
            CompanyRef::ByName("Legacy Co".to_string()),
        ];
        insert_community(&pool, &community).await.expect("insert");

        let loaded = find_by_guid(&pool, community.guid)
            .await
            .expect("query")
            .expect("present");
        assert_eq!(loaded.company_refs.len(), 2);
        assert_eq!(loaded.company_refs[0], CompanyRef::ById(guid));
        assert_eq!(
            loaded.company_refs[1],
            CompanyRef::ByName("Legacy Co".to_string())
        );
    }

    #[tokio::test]
    async fn add_ref_if_absent_never_duplicates() {
        let pool = test_pool().await;
        let community = Community::new("Elevon".to_string());
        insert_community(&pool, &community).await.expect("insert");

        let company_guid = Uuid::new_v4();
        let first = add_ref_if_absent(&pool, community.guid, company_guid)
            .await
            .expect("first add");
        let second = add_ref_if_absent(&pool, community.guid, company_guid)
            .await
            .expect("second add");

        assert!(first);
        assert!(!second);

        let loaded = find_by_guid(&pool, community.guid)
            .await
            .expect("query")
            .expect("present");
        assert_eq!(loaded.company_refs, vec![CompanyRef::ById(company_guid)]);
    }

    #[tokio::test]
    async fn name_lookup_is_case_insensitive() {
        let pool = test_pool().await;
        insert_community(&pool, &Community::new("Elevon".to_string()))
            .await
            .expect("insert");

        let loaded = find_by_name_ci(&pool, "ELEVON").await.expect("query");
        assert!(loaded.is_some());
    }

    #[tokio::test]
    async fn delete_all_reports_count() {
        let pool = test_pool().await;
        insert_community(&pool, &Community::new("A".to_string()))
            .await
            .expect("insert");
        insert_community(&pool, &Community::new("B".to_string()))
            .await
            .expect("insert");

        let removed = delete_all_communities(&pool).await.expect("delete all");
        assert_eq!(removed, 2);
        assert!(list_communities(&pool).await.expect("list").is_empty());
    }
}
