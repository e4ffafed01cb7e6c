//! Legacy reference migrator
//!
//! Converts free-text company names inside a community's membership
//! collection into stable identifiers. Runs before membership mutations and
//! reads so that downstream logic only ever sees identifiers (plus whatever
//! legacy names could not be resolved this pass, which are dropped).

use crate::db::communities::{self, Community, CompanyRef};
use crate::db::companies;
use hometrack_common::Result;
use sqlx::SqlitePool;
use tracing::debug;

/// Migrate a community's legacy name references to identifiers, in place.
///
/// Returns whether a write occurred. A community whose collection already
/// contains only identifiers is left untouched (no write), which makes the
/// operation idempotent. Names that resolve to no existing company are
/// dropped as orphaned legacy data.
pub async fn migrate_company_refs(pool: &SqlitePool, community: &mut Community) -> Result<bool> {
    let legacy_names: Vec<String> = community
        .company_refs
        .iter()
        .filter_map(|r| match r {
            CompanyRef::ByName(name) => Some(name.clone()),
            CompanyRef::ById(_) => None,
        })
        .collect();

    if legacy_names.is_empty() {
        return Ok(false);
    }

    // Batch-resolve by exact name; misses are silently dropped
    let resolved = companies::find_by_names(pool, &legacy_names).await?;
    if resolved.len() < legacy_names.len() {
        debug!(
            community = %community.name,
            dropped = legacy_names.len() - resolved.len(),
            "dropping unresolvable legacy company names"
        );
    }

    let mut migrated: Vec<CompanyRef> = community
        .company_refs
        .iter()
        .filter(|r| matches!(r, CompanyRef::ById(_)))
        .cloned()
        .collect();

    for company in resolved {
        let reference = CompanyRef::ById(company.guid);
        if !migrated.contains(&reference) {
            migrated.push(reference);
        }
    }

    communities::set_company_refs(pool, community.guid, &migrated).await?;
    community.company_refs = migrated;
    Ok(true)
}
