//! Unified community view builder
//!
//! Merges persisted communities with communities implied by plan records
//! into one deduplicated list for display. Persisted communities keep their
//! identity (guid, description, location); an implied community with no
//! persisted counterpart appears as a minimal unpersisted entry.

use crate::db::communities;
use crate::db::companies;
use crate::db::communities::CompanyRef;
use crate::db::plans;
use crate::services::migrator;
use hometrack_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use uuid::Uuid;

/// One entry of the unified community list
#[derive(Debug, Clone, Serialize)]
pub struct UnifiedCommunity {
    /// Absent for plan-derived entries, which have no persisted record
    pub guid: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub companies: Vec<String>,
    pub from_plans: bool,
}

/// Names that are artifacts of bad upstream data rather than communities
pub fn is_placeholder_name(name: &str) -> bool {
    let trimmed = name.trim();
    trimmed.is_empty() || trimmed == "undefined"
}

/// Build the unified community list.
///
/// Persisted communities come first (migrated, references expanded to
/// display names); plan-derived names that match no persisted community are
/// appended as minimal entries. When the same name exists in both sources
/// the company-name sets are unioned, case-sensitively.
pub async fn unified_communities(pool: &SqlitePool) -> Result<Vec<UnifiedCommunity>> {
    let mut result: Vec<UnifiedCommunity> = Vec::new();
    let mut index_by_name: HashMap<String, usize> = HashMap::new();

    for mut community in communities::list_communities(pool).await? {
        if is_placeholder_name(&community.name) {
            continue;
        }

        migrator::migrate_company_refs(pool, &mut community).await?;

        // Anything still not an identifier is dropped defensively
        let guids: Vec<Uuid> = community
            .company_refs
            .iter()
            .filter_map(CompanyRef::guid)
            .collect();
        let names = companies::names_for_guids(pool, &guids).await?;
        let company_names: Vec<String> = guids
            .iter()
            .filter_map(|guid| names.get(guid).cloned())
            .collect();

        index_by_name.insert(community.name.clone(), result.len());
        result.push(UnifiedCommunity {
            guid: Some(community.guid),
            name: community.name,
            description: community.description,
            location: community.location,
            companies: company_names,
            from_plans: false,
        });
    }

    // Communities implied by plan records, keyed by exact community name
    let mut implied_order: Vec<String> = Vec::new();
    let mut implied: HashMap<String, Vec<String>> = HashMap::new();
    for plan in plans::list_plans(pool).await? {
        if is_placeholder_name(&plan.community) || is_placeholder_name(&plan.company) {
            continue;
        }
        let entry = implied.entry(plan.community.clone()).or_insert_with(|| {
            implied_order.push(plan.community.clone());
            Vec::new()
        });
        if !entry.contains(&plan.company) {
            entry.push(plan.company.clone());
        }
    }

    for name in implied_order {
        let company_names = implied.remove(&name).unwrap_or_default();
        match index_by_name.get(&name) {
            Some(&idx) => {
                // Same name in both sources: union the company-name sets
                let existing = &mut result[idx].companies;
                for company in company_names {
                    if !existing.contains(&company) {
                        existing.push(company);
                    }
                }
            }
            None => {
                result.push(UnifiedCommunity {
                    guid: None,
                    name,
                    description: None,
                    location: None,
                    companies: company_names,
                    from_plans: true,
                });
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::communities::{insert_community, Community};
    use crate::db::companies::{insert_company, Company};
    use crate::services::plan_ingest::{upsert_plans, PlanInput};

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        hometrack_common::db::create_schema(&pool)
            .await
            .expect("schema");
        pool
    }

    fn plan_input(community: &str, company: &str) -> PlanInput {
        PlanInput {
            plan_name: Some("Magnolia".to_string()),
            price: Some(450_000.0),
            company: Some(company.to_string()),
            community: Some(community.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn placeholder_names_are_recognized() {
        assert!(is_placeholder_name(""));
        assert!(is_placeholder_name("   "));
        assert!(is_placeholder_name("undefined"));
        assert!(!is_placeholder_name("Elevon"));
    }

    #[tokio::test]
    async fn persisted_and_plan_sources_are_unioned_per_name() {
        let pool = test_pool().await;
        let acme = Company::new("Acme".to_string());
        insert_company(&pool, &acme).await.expect("insert");

        let mut elevon = Community::new("Elevon".to_string());
        elevon.company_refs = vec![CompanyRef::ById(acme.guid)];
        insert_community(&pool, &elevon).await.expect("insert");

        upsert_plans(&pool, &[plan_input("Elevon", "Beta")])
            .await
            .expect("upsert");

        let view = unified_communities(&pool).await.expect("view");
        assert_eq!(view.len(), 1);
        let entry = &view[0];
        assert_eq!(entry.name, "Elevon");
        assert!(!entry.from_plans);
        assert_eq!(entry.guid, Some(elevon.guid));
        assert_eq!(
            entry.companies,
            vec!["Acme".to_string(), "Beta".to_string()]
        );
    }

    #[tokio::test]
    async fn plan_only_community_appears_as_minimal_entry() {
        let pool = test_pool().await;
        upsert_plans(&pool, &[plan_input("Mosaic", "Beta")])
            .await
            .expect("upsert");

        let view = unified_communities(&pool).await.expect("view");
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].name, "Mosaic");
        assert!(view[0].from_plans);
        assert!(view[0].guid.is_none());
        assert_eq!(view[0].companies, vec!["Beta".to_string()]);
    }

    #[tokio::test]
    async fn persisted_entries_precede_plan_derived_entries() {
        let pool = test_pool().await;
        insert_community(&pool, &Community::new("Elevon".to_string()))
            .await
            .expect("insert");
        upsert_plans(&pool, &[plan_input("Mosaic", "Beta")])
            .await
            .expect("upsert");

        let view = unified_communities(&pool).await.expect("view");
        assert_eq!(view.len(), 2);
        assert!(!view[0].from_plans);
        assert!(view[1].from_plans);
    }

    #[tokio::test]
    async fn placeholder_names_never_appear() {
        let pool = test_pool().await;
        insert_community(&pool, &Community::new("undefined".to_string()))
            .await
            .expect("insert");
        upsert_plans(
            &pool,
            &[
                plan_input("undefined", "Beta"),
                plan_input("Elevon", "undefined"),
                plan_input("Elevon", "Beta"),
            ],
        )
        .await
        .expect("upsert");

        let view = unified_communities(&pool).await.expect("view");
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].name, "Elevon");
        assert_eq!(view[0].companies, vec!["Beta".to_string()]);
    }

    #[tokio::test]
    async fn migration_runs_during_view_build() {
        let pool = test_pool().await;
        let acme = Company::new("Acme".to_string());
        insert_company(&pool, &acme).await.expect("insert");

        let mut elevon = Community::new("Elevon".to_string());
        elevon.company_refs = vec![CompanyRef::ByName("Acme".to_string())];
        insert_community(&pool, &elevon).await.expect("insert");

        let view = unified_communities(&pool).await.expect("view");
        assert_eq!(view[0].companies, vec!["Acme".to_string()]);

        // The migration persisted: the stored refs are identifiers now
        let stored = communities::find_by_guid(&pool, elevon.guid)
            .await
            .expect("query")
            .expect("present");
        assert_eq!(stored.company_refs, vec![CompanyRef::ById(acme.guid)]);
    }

    #[tokio::test]
    async fn case_sensitive_union_keeps_both_spellings() {
        let pool = test_pool().await;
        let acme = Company::new("Acme".to_string());
        insert_company(&pool, &acme).await.expect("insert");

        let mut elevon = Community::new("Elevon".to_string());
        elevon.company_refs = vec![CompanyRef::ById(acme.guid)];
        insert_community(&pool, &elevon).await.expect("insert");

        // Plan source spells the same company differently; the merge at this
        // stage is case-sensitive by contract
        upsert_plans(&pool, &[plan_input("Elevon", "ACME")])
            .await
            .expect("upsert");

        let view = unified_communities(&pool).await.expect("view");
        assert_eq!(
            view[0].companies,
            vec!["Acme".to_string(), "ACME".to_string()]
        );
    }
}
