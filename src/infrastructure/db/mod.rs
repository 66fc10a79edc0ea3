pub mod products;

pub use products::SqliteCatalogRepository;

use async_trait::async_trait;

use crate::domain::error::Result;
use crate::domain::product::{ProductRecord, ProductUpdate};

/// What a bulk write does when a SKU is already present.
///
/// Import uses `IgnoreExisting` so a re-run never clobbers rows an
/// operator has hand-edited; `Overwrite` is the explicit opt-in for
/// callers that really want last-write-wins in bulk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    IgnoreExisting,
    Overwrite,
}

/// Predicate over `SKU` and `ITEMS_NAME`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Wildcard: every catalog row.
    All,
    /// Case-insensitive substring over SKU or name. Stored upper-cased.
    Term(String),
}

impl SearchQuery {
    /// `*` is the wildcard; anything else is a substring term.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed == "*" {
            SearchQuery::All
        } else {
            SearchQuery::Term(trimmed.to_uppercase())
        }
    }
}

/// Outcome of an update, disambiguated so "nothing matched because the
/// key does not exist" never looks like success.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Updated(ProductRecord),
    Unchanged,
    NotFound,
}

/// Storage contract the import pipeline and catalog use cases depend
/// on. Implemented by SQLite here; tests substitute fakes.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Bulk write with an explicit conflict policy. Returns the number
    /// of rows actually written.
    async fn upsert(&self, records: &[ProductRecord], policy: ConflictPolicy) -> Result<u64>;

    /// Single-record create; a duplicate SKU is an error.
    async fn insert(&self, record: &ProductRecord) -> Result<()>;

    async fn search(&self, query: &SearchQuery) -> Result<Vec<ProductRecord>>;

    async fn get(&self, sku: &str) -> Result<Option<ProductRecord>>;

    async fn exists(&self, sku: &str) -> Result<bool>;

    /// Replace the named fields on the record with this key.
    async fn update_by_key(&self, sku: &str, update: &ProductUpdate) -> Result<UpdateOutcome>;
}
