//! Identifier resolver
//!
//! Resolves a caller-supplied reference string to an entity. A reference
//! that parses as a UUID is tried as a stable identifier first; otherwise
//! (or when the identifier lookup misses) it falls back to a
//! case-insensitive exact name match.
//!
//! The company/community asymmetry is deliberate: membership operations
//! never create companies, but a community reference that resolves to
//! nothing creates a new community under that name.

use crate::db::{communities, companies};
use hometrack_common::{Error, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Resolve a company reference (identifier or name). Never creates.
pub async fn resolve_company(
    pool: &SqlitePool,
    reference: &str,
) -> Result<Option<companies::Company>> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if let Ok(guid) = Uuid::parse_str(trimmed) {
        if let Some(company) = companies::find_by_guid(pool, guid).await? {
            return Ok(Some(company));
        }
    }

    companies::find_by_name_ci(pool, trimmed).await
}

/// Resolve a community reference (identifier or name). Never creates.
pub async fn resolve_community(
    pool: &SqlitePool,
    reference: &str,
) -> Result<Option<communities::Community>> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if let Ok(guid) = Uuid::parse_str(trimmed) {
        if let Some(community) = communities::find_by_guid(pool, guid).await? {
            return Ok(Some(community));
        }
    }

    communities::find_by_name_ci(pool, trimmed).await
}

/// Resolve a community reference, creating a new community on a total miss.
///
/// The new community keeps the caller's original casing. Two callers racing
/// to create the same name are arbitrated by the UNIQUE constraint; the
/// loser recovers by re-resolving through the name lookup.
pub async fn resolve_or_create_community(
    pool: &SqlitePool,
    reference: &str,
) -> Result<communities::Community> {
    if let Some(existing) = resolve_community(pool, reference).await? {
        return Ok(existing);
    }

    let trimmed = reference.trim();
    let community = communities::Community::new(trimmed.to_string());
    match communities::insert_community(pool, &community).await {
        Ok(()) => Ok(community),
        Err(Error::Database(ref e)) if crate::db::is_unique_violation(e) => {
            communities::find_by_name_ci(pool, trimmed)
                .await?
                .ok_or_else(|| {
                    Error::Internal(format!(
                        "community '{trimmed}' lost create race but cannot be re-resolved"
                    ))
                })
        }
        Err(e) => Err(e),
    }
}
