//! Membership set maintenance
//!
//! Adding and removing a company in a community's membership collection.
//! Add resolves both sides (creating the community if needed), migrates any
//! legacy entries, and relies on the store's atomic add-if-absent primitive
//! so concurrent adds of the same company cannot duplicate it.

use crate::db::communities::{self, Community, CompanyRef};
use crate::db::companies;
use crate::services::{migrator, resolver};
use hometrack_common::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Community with company references expanded to display names
#[derive(Debug, Clone, Serialize)]
pub struct ExpandedCommunity {
    pub guid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub companies: Vec<String>,
}

/// Result of an add operation
#[derive(Debug)]
pub enum AddOutcome {
    Added(ExpandedCommunity),
    /// The company was already a member; carries the current state so the
    /// caller can reconcile without re-querying.
    AlreadyMember(ExpandedCommunity),
}

/// Expand a community's references to display names.
///
/// Identifier entries resolve through the companies table; an identifier
/// with no matching company falls back to its raw string. Legacy name
/// entries pass through unchanged.
pub async fn expand_community(pool: &SqlitePool, community: &Community) -> Result<ExpandedCommunity> {
    let guids: Vec<Uuid> = community
        .company_refs
        .iter()
        .filter_map(CompanyRef::guid)
        .collect();
    let names = companies::names_for_guids(pool, &guids).await?;

    let display: Vec<String> = community
        .company_refs
        .iter()
        .map(|r| match r {
            CompanyRef::ById(guid) => names
                .get(guid)
                .cloned()
                .unwrap_or_else(|| guid.to_string()),
            CompanyRef::ByName(name) => name.clone(),
        })
        .collect();

    Ok(ExpandedCommunity {
        guid: community.guid,
        name: community.name.clone(),
        description: community.description.clone(),
        location: community.location.clone(),
        companies: display,
    })
}

/// Add a company to a community.
///
/// The company reference must resolve to an existing company; the community
/// reference is created on a total miss. Duplicate membership is detected by
/// identifier equality or, for unmigrated legacy entries, case-insensitive
/// name equality.
pub async fn add_company(
    pool: &SqlitePool,
    company_ref: &str,
    community_ref: &str,
) -> Result<AddOutcome> {
    let company = resolver::resolve_company(pool, company_ref)
        .await?
        .ok_or_else(|| Error::NotFound("Company not found".to_string()))?;

    let mut community = resolver::resolve_or_create_community(pool, community_ref).await?;
    migrator::migrate_company_refs(pool, &mut community).await?;

    let already_member = community.company_refs.iter().any(|r| match r {
        CompanyRef::ById(guid) => *guid == company.guid,
        CompanyRef::ByName(name) => {
            name.trim().to_lowercase() == company.name.trim().to_lowercase()
        }
    });
    if already_member {
        let expanded = expand_community(pool, &community).await?;
        return Ok(AddOutcome::AlreadyMember(expanded));
    }

    communities::add_ref_if_absent(pool, community.guid, company.guid).await?;

    // Re-read so the response reflects the stored state, not our local copy
    let updated = communities::find_by_guid(pool, community.guid)
        .await?
        .ok_or_else(|| Error::Internal("community vanished after membership update".to_string()))?;
    let expanded = expand_community(pool, &updated).await?;
    Ok(AddOutcome::Added(expanded))
}

/// Remove a company from a community.
///
/// Both references must resolve; remove never creates a community. Entries
/// are filtered by identifier equality, so removing a non-member (or a
/// company only present as an unmigrated legacy name) is a silent no-op.
pub async fn remove_company(
    pool: &SqlitePool,
    company_ref: &str,
    community_ref: &str,
) -> Result<ExpandedCommunity> {
    let company = resolver::resolve_company(pool, company_ref)
        .await?
        .ok_or_else(|| Error::NotFound("Company not found".to_string()))?;

    let mut community = resolver::resolve_community(pool, community_ref)
        .await?
        .ok_or_else(|| Error::NotFound("Community not found".to_string()))?;

    community
        .company_refs
        .retain(|r| r.guid() != Some(company.guid));
    communities::set_company_refs(pool, community.guid, &community.company_refs).await?;

    expand_community(pool, &community).await
}
