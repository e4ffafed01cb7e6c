//! Reconciliation and ingestion services
//!
//! The non-trivial core of the catalog: resolving human-supplied references,
//! migrating legacy membership data, membership set maintenance, plan upsert
//! with price-change bookkeeping, the unified community view, and the
//! AI-assisted company enrichment client.

pub mod community_view;
pub mod enrichment;
pub mod membership;
pub mod migrator;
pub mod plan_ingest;
pub mod resolver;
