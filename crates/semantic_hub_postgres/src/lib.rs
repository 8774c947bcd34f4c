//! Semantic hub PostgreSQL adapter.
//!
//! `PgModelStore` implements `semantic_hub_core::ports::ModelStore` over a
//! single `semantic_hub_models` table. All SQL is runtime-checked
//! (sqlx::query, not sqlx::query!) to avoid a compile-time DB requirement.

pub mod config;
mod sqlx_types;
pub mod store;

pub use config::PgStoreConfig;
pub use store::PgModelStore;
