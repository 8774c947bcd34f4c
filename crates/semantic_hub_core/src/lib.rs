//! Semantic hub core: lifecycle and dependency consistency for aspect models.
//!
//! Pure logic plus port traits. Storage adapters live in
//! `semantic_hub_postgres`; `MemoryModelStore` covers tests and embedding.

pub mod config;
pub mod consistency;
pub mod engine;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod locks;
pub mod lookup;
pub mod ports;
pub mod store_memory;
pub mod turtle;
pub mod types;

pub use config::EngineConfig;
pub use engine::LifecycleEngine;
pub use error::HubError;
pub use lookup::{LookupService, ModelFilter, Page, PageRequest};
pub use ports::{DependencyExtractor, ModelStore, ModelValidator, ParsedModel, WriteExpectation};
pub use store_memory::MemoryModelStore;
pub use turtle::{TurtleModelValidator, UrnReferenceExtractor};
pub use types::{
    CreateModel, ModelRecord, ModelStatus, ModelType, ModelUrn, ResolvedModel, SaveModel,
    UpdateModel,
};
