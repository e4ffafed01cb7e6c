//! HTTP API handlers

pub mod communities;
pub mod companies;
pub mod health;
pub mod membership;
pub mod plans;
