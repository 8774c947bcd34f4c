//! Ordered, paginated retrieval of model records.
//!
//! Records are always ordered by URN (byte-lexicographic) before slicing,
//! so concatenating every page of a listing yields the full sorted set.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::consistency::bounded;
use crate::error::HubError;
use crate::ports::{ModelStore, Result};
use crate::types::{ModelRecord, ModelStatus, ModelType, ModelUrn};

/// Requested page (0-based). `page_size = None` means "use the default".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub page_size: Option<usize>,
}

impl PageRequest {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self {
            page,
            page_size: Some(page_size),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub item_count: usize,
}

/// Optional listing filters; an empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelFilter {
    /// Substring of the URN namespace.
    pub namespace: Option<String>,
    /// Substring of the local name.
    pub name: Option<String>,
    pub status: Option<ModelStatus>,
    pub model_type: Option<ModelType>,
}

impl ModelFilter {
    pub fn matches(&self, record: &ModelRecord) -> bool {
        if let Some(ref ns) = self.namespace {
            if !record.urn.namespace().contains(ns.as_str()) {
                return false;
            }
        }
        if let Some(ref name) = self.name {
            if !record.urn.name().contains(name.as_str()) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(model_type) = self.model_type {
            if record.model_type != model_type {
                return false;
            }
        }
        true
    }
}

/// Sort by URN and cut out page `page` of size `page_size`.
pub fn paginate(mut records: Vec<ModelRecord>, page: usize, page_size: usize) -> Result<Page<ModelRecord>> {
    if page_size == 0 {
        return Err(HubError::InvalidInput("page size must be greater than 0".into()));
    }
    records.sort_by(|a, b| a.urn.cmp(&b.urn));

    let total_items = records.len();
    let total_pages = total_items.div_ceil(page_size);
    let items: Vec<ModelRecord> = records
        .into_iter()
        .skip(page.saturating_mul(page_size))
        .take(page_size)
        .collect();

    Ok(Page {
        item_count: items.len(),
        items,
        total_items,
        total_pages,
        current_page: page,
    })
}

fn single_page(mut records: Vec<ModelRecord>) -> Page<ModelRecord> {
    records.sort_by(|a, b| a.urn.cmp(&b.urn));
    Page {
        total_items: records.len(),
        item_count: records.len(),
        items: records,
        total_pages: 1,
        current_page: 0,
    }
}

/// Read-only queries over the store. Takes no locks.
pub struct LookupService {
    store: Arc<dyn ModelStore>,
    config: EngineConfig,
}

impl LookupService {
    pub fn new(store: Arc<dyn ModelStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// All records matching `filter`. Absent page size uses the configured default.
    pub async fn list(&self, filter: &ModelFilter, request: PageRequest) -> Result<Page<ModelRecord>> {
        let all = bounded(self.config.store_timeout(), "list", self.store.list_all()).await?;
        let matching: Vec<ModelRecord> = all.into_iter().filter(|r| filter.matches(r)).collect();
        let page_size = request.page_size.unwrap_or(self.config.default_page_size);
        let page = paginate(matching, request.page, page_size)?;
        tracing::debug!(
            total_items = page.total_items,
            page = page.current_page,
            page_size,
            "listed models"
        );
        Ok(page)
    }

    /// Records for the given URNs; unknown URNs are skipped. Absent page size
    /// returns every match in a single page.
    pub async fn lookup_by_urns(
        &self,
        urns: &BTreeSet<ModelUrn>,
        request: PageRequest,
    ) -> Result<Page<ModelRecord>> {
        let found = bounded(
            self.config.store_timeout(),
            "lookup",
            self.store.list_by_urns(urns),
        )
        .await?;
        match request.page_size {
            Some(page_size) => paginate(found, request.page, page_size),
            None => Ok(single_page(found)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(urn: &str) -> ModelRecord {
        let now = Utc::now();
        ModelRecord {
            urn: ModelUrn::parse(urn).unwrap(),
            content: String::new(),
            status: ModelStatus::Draft,
            model_type: ModelType::Samm,
            dependencies: BTreeSet::new(),
            created_at: now,
            updated_at: now,
            revision: 1,
        }
    }

    fn numbered(n: usize) -> Vec<ModelRecord> {
        (1..=n)
            .map(|i| record(&format!("urn:samm:org.example.list_{i}:1.0.0#Movement")))
            .collect()
    }

    #[test]
    fn totals_round_up() {
        let page = paginate(numbered(5), 0, 2).unwrap();
        assert_eq!(page.total_items, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.item_count, 2);
    }

    #[test]
    fn last_partial_page() {
        let page = paginate(numbered(5), 2, 2).unwrap();
        assert_eq!(page.item_count, 1);
        assert_eq!(page.current_page, 2);
    }

    #[test]
    fn page_past_end_is_empty_with_totals() {
        let page = paginate(numbered(3), 7, 2).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 3);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn zero_page_size_is_invalid() {
        assert!(matches!(
            paginate(numbered(1), 0, 0),
            Err(HubError::InvalidInput(_))
        ));
    }

    #[test]
    fn empty_listing() {
        let page = paginate(Vec::new(), 0, 10).unwrap();
        assert_eq!(page.total_items, 0);
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.item_count, 0);
    }

    #[test]
    fn filter_matches_each_field() {
        let mut r = record("urn:bamm:io.example.vehicle:1.0.0#Movement");
        r.model_type = ModelType::Bamm;
        r.status = ModelStatus::Released;

        let by_ns = ModelFilter {
            namespace: Some("vehicle".into()),
            ..Default::default()
        };
        let by_name = ModelFilter {
            name: Some("Move".into()),
            ..Default::default()
        };
        let by_status = ModelFilter {
            status: Some(ModelStatus::Draft),
            ..Default::default()
        };
        let by_type = ModelFilter {
            model_type: Some(ModelType::Bamm),
            ..Default::default()
        };
        assert!(by_ns.matches(&r));
        assert!(by_name.matches(&r));
        assert!(!by_status.matches(&r));
        assert!(by_type.matches(&r));
        assert!(ModelFilter::default().matches(&r));
    }

    #[test]
    fn page_serializes_camel_case() {
        let page = paginate(numbered(1), 0, 1).unwrap();
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalItems"], 1);
        assert_eq!(json["totalPages"], 1);
        assert_eq!(json["currentPage"], 0);
        assert_eq!(json["itemCount"], 1);
    }
}
