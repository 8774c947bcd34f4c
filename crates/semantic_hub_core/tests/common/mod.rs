//! Shared fixtures for the semantic hub integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use semantic_hub_core::{
    CreateModel, EngineConfig, LifecycleEngine, MemoryModelStore, ModelRecord, ModelStatus,
    ModelStore, ModelType, ModelUrn, SaveModel, TurtleModelValidator, UpdateModel,
    UrnReferenceExtractor,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "semantic_hub=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

pub fn urn(s: &str) -> ModelUrn {
    ModelUrn::parse(s).unwrap()
}

/// `{prefix}Movement`, the URN the original test suite saves under every prefix.
pub fn movement_urn(prefix: &str) -> ModelUrn {
    urn(&format!("{prefix}Movement"))
}

/// A minimal valid aspect model named after `urn`, referencing `references`.
pub fn aspect(urn: &ModelUrn, references: &[&ModelUrn]) -> String {
    let (meta, characteristic) = match urn.model_type() {
        ModelType::Samm => (
            "urn:samm:org.eclipse.esmf.samm:meta-model:2.0.0#",
            "urn:samm:org.eclipse.esmf.samm:characteristic:2.0.0#",
        ),
        ModelType::Bamm => (
            "urn:bamm:io.openmanufacturing:meta-model:1.0.0#",
            "urn:bamm:io.openmanufacturing:characteristic:1.0.0#",
        ),
    };
    let mut ttl = format!(
        "@prefix samm: <{meta}> .\n\
         @prefix samm-c: <{characteristic}> .\n\
         @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .\n\
         @prefix : <{package}> .\n\
         \n\
         :{name} a samm:Aspect ;\n\
         \x20  samm:preferredName \"{name}\"@en ;\n\
         \x20  samm:description \"Aspect for movement information\"@en ;\n\
         \x20  samm:properties ( :isMoving ) .\n\
         :isMoving a samm:Property ;\n\
         \x20  samm:characteristic samm-c:Boolean .\n",
        package = urn.package_prefix(),
        name = urn.name(),
    );
    for r in references {
        ttl.push_str(&format!(":isMoving samm:see <{r}> .\n"));
    }
    ttl
}

pub fn engine() -> (LifecycleEngine, Arc<MemoryModelStore>) {
    let store = Arc::new(MemoryModelStore::new());
    (engine_with(store.clone(), EngineConfig::default()), store)
}

pub fn engine_with(store: Arc<dyn ModelStore>, config: EngineConfig) -> LifecycleEngine {
    init_tracing();
    LifecycleEngine::new(
        store,
        Arc::new(TurtleModelValidator::new()),
        Arc::new(UrnReferenceExtractor::new()),
        config,
    )
}

pub fn save_req(urn: &ModelUrn, references: &[&ModelUrn], status: ModelStatus) -> SaveModel {
    SaveModel {
        urn: urn.clone(),
        content: aspect(urn, references),
        model_type: urn.model_type(),
        status,
    }
}

pub fn create_req(urn: &ModelUrn, status: ModelStatus) -> CreateModel {
    CreateModel {
        urn: urn.clone(),
        content: aspect(urn, &[]),
        model_type: urn.model_type(),
        status,
    }
}

pub fn update_req(urn: &ModelUrn, references: &[&ModelUrn], status: ModelStatus) -> UpdateModel {
    UpdateModel {
        urn: urn.clone(),
        content: aspect(urn, references),
        model_type: None,
        status,
        full_replace: true,
    }
}

/// Save a dependency-free model and walk it along legal transitions to `target`.
pub async fn drive_to(engine: &LifecycleEngine, urn: &ModelUrn, target: ModelStatus) -> ModelRecord {
    let path: &[ModelStatus] = match target {
        ModelStatus::Draft => &[ModelStatus::Draft],
        ModelStatus::Released => &[ModelStatus::Released],
        ModelStatus::Standardized => &[ModelStatus::Released, ModelStatus::Standardized],
        ModelStatus::Deprecated => &[ModelStatus::Released, ModelStatus::Deprecated],
    };
    let mut last = None;
    for status in path {
        last = Some(engine.save(save_req(urn, &[], *status)).await.unwrap());
    }
    last.unwrap()
}
