use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::error::{AppError, Result};
use crate::domain::product::{normalize_optional, parse_price, ProductRecord};
use crate::infrastructure::csv::{CsvParser, CsvRow, CsvTable};
use crate::infrastructure::db::{CatalogStore, ConflictPolicy};

/// Legacy header -> canonical header, applied once per file. Old
/// exports call the manufacturer column PRODUSEN.
const COLUMN_ALIASES: &[(&str, &str)] = &[("PRODUSEN", "CATEGORY")];

const COL_SKU: &str = "SKU";
const COL_ITEMS_NAME: &str = "ITEMS_NAME";
const COL_CATEGORY: &str = "CATEGORY";
const COL_BRAND_NAME: &str = "BRAND_NAME";
const COL_VARIANT_NAME: &str = "VARIANT_NAME";
const COL_PRICE: &str = "PRICE";

/// Exact counters for one import run.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ImportSummary {
    /// Data rows the parser could decode.
    pub rows_read: usize,
    /// Rows dropped: undecodable lines plus rows missing SKU or name.
    pub rows_skipped: usize,
    /// Rows normalized and handed to the batch loop.
    pub rows_normalized: usize,
    pub batches_attempted: usize,
    pub batches_failed: usize,
}

/// Column positions after aliasing. Resolved once per file; a missing
/// required column aborts the run before any row is touched.
struct HeaderMap {
    sku: usize,
    items_name: usize,
    category: usize,
    brand_name: Option<usize>,
    variant_name: Option<usize>,
    price: Option<usize>,
}

impl HeaderMap {
    fn from_headers(headers: &[String]) -> Result<Self> {
        let canonical: Vec<String> = headers
            .iter()
            .map(|h| {
                let upper = h.trim().to_uppercase();
                COLUMN_ALIASES
                    .iter()
                    .find(|(legacy, _)| *legacy == upper)
                    .map(|(_, target)| target.to_string())
                    .unwrap_or(upper)
            })
            .collect();

        let find = |name: &str| canonical.iter().position(|h| h == name);

        let sku = find(COL_SKU).ok_or_else(|| {
            AppError::ConfigError(format!(
                "Required column '{}' not found; detected columns: {:?}",
                COL_SKU, headers
            ))
        })?;
        let items_name = find(COL_ITEMS_NAME).ok_or_else(|| {
            AppError::ConfigError(format!(
                "Required column '{}' not found; detected columns: {:?}",
                COL_ITEMS_NAME, headers
            ))
        })?;
        let category = find(COL_CATEGORY).ok_or_else(|| {
            AppError::ConfigError(format!(
                "Neither '{}' nor a known alias found; detected columns: {:?}",
                COL_CATEGORY, headers
            ))
        })?;

        Ok(Self {
            sku,
            items_name,
            category,
            brand_name: find(COL_BRAND_NAME),
            variant_name: find(COL_VARIANT_NAME),
            price: find(COL_PRICE),
        })
    }

    /// Normalize one row; `None` means the row was skipped.
    fn normalize_row(&self, row: &CsvRow) -> Option<ProductRecord> {
        let cell = |index: usize| row.values.get(index).map(String::as_str).unwrap_or("");
        let optional_cell = |index: Option<usize>| index.map(cell);

        let sku = cell(self.sku);
        let items_name = cell(self.items_name);
        if sku.trim().is_empty() || items_name.trim().is_empty() {
            warn!(line = row.line, "skipping row without SKU or ITEMS_NAME");
            return None;
        }

        let price = match optional_cell(self.price).map(parse_price).transpose() {
            Ok(price) => price.flatten(),
            Err(e) => {
                warn!(line = row.line, error = %e, "unparsable price stored as NULL");
                None
            }
        };

        let record = ProductRecord {
            sku: sku.to_uppercase(),
            items_name: items_name.to_uppercase(),
            category: normalize_optional(cell(self.category)),
            brand_name: optional_cell(self.brand_name).and_then(normalize_optional),
            variant_name: optional_cell(self.variant_name).and_then(normalize_optional),
            price,
        };
        Some(record)
    }
}

/// Reads a catalog CSV and applies it to the store in fixed-size
/// chunks, insert-if-absent. Best effort: one failed chunk never stops
/// the rest of the run.
pub struct ImportProductsUseCase {
    store: Arc<dyn CatalogStore>,
    chunk_size: usize,
}

impl ImportProductsUseCase {
    pub fn new(store: Arc<dyn CatalogStore>, chunk_size: usize) -> Self {
        Self {
            store,
            chunk_size: chunk_size.max(1),
        }
    }

    pub async fn run(&self, path: &Path) -> Result<ImportSummary> {
        let table = CsvParser::new().parse_file(path)?;
        info!(
            file = %path.display(),
            rows = table.rows.len(),
            skipped = table.skipped_rows,
            "CSV file read"
        );
        self.run_table(&table).await
    }

    pub async fn run_table(&self, table: &CsvTable) -> Result<ImportSummary> {
        let header_map = HeaderMap::from_headers(&table.headers)?;

        let mut summary = ImportSummary {
            rows_read: table.rows.len(),
            rows_skipped: table.skipped_rows,
            ..Default::default()
        };

        let mut records = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            match header_map.normalize_row(row) {
                Some(record) => records.push(record),
                None => summary.rows_skipped += 1,
            }
        }
        summary.rows_normalized = records.len();

        let total_batches = records.len().div_ceil(self.chunk_size);
        for (index, chunk) in records.chunks(self.chunk_size).enumerate() {
            summary.batches_attempted += 1;
            match self
                .store
                .upsert(chunk, ConflictPolicy::IgnoreExisting)
                .await
            {
                Ok(written) => {
                    info!(
                        batch = index + 1,
                        total = total_batches,
                        rows = chunk.len(),
                        written,
                        "batch uploaded"
                    );
                }
                Err(e) => {
                    warn!(
                        batch = index + 1,
                        total = total_batches,
                        error = %e,
                        "batch failed, continuing with next batch"
                    );
                    summary.batches_failed += 1;
                }
            }
        }

        info!(
            rows_read = summary.rows_read,
            rows_normalized = summary.rows_normalized,
            rows_skipped = summary.rows_skipped,
            batches_attempted = summary.batches_attempted,
            batches_failed = summary.batches_failed,
            "import finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::ProductUpdate;
    use crate::infrastructure::db::{SearchQuery, UpdateOutcome};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory store; optionally fails one batch by index.
    struct FakeStore {
        records: Mutex<Vec<ProductRecord>>,
        calls: Mutex<Vec<usize>>,
        fail_call: Option<usize>,
    }

    impl FakeStore {
        fn new(fail_call: Option<usize>) -> Self {
            Self {
                records: Mutex::new(Vec::new()),
                calls: Mutex::new(Vec::new()),
                fail_call,
            }
        }
    }

    #[async_trait]
    impl CatalogStore for FakeStore {
        async fn upsert(
            &self,
            records: &[ProductRecord],
            _policy: ConflictPolicy,
        ) -> crate::domain::error::Result<u64> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(records.len());
                calls.len() - 1
            };
            if self.fail_call == Some(call) {
                return Err(AppError::DatabaseError("simulated outage".to_string()));
            }
            let mut stored = self.records.lock().unwrap();
            for record in records {
                if !stored.iter().any(|r| r.sku == record.sku) {
                    stored.push(record.clone());
                }
            }
            Ok(records.len() as u64)
        }

        async fn insert(&self, _record: &ProductRecord) -> crate::domain::error::Result<()> {
            unimplemented!()
        }

        async fn search(
            &self,
            _query: &SearchQuery,
        ) -> crate::domain::error::Result<Vec<ProductRecord>> {
            Ok(self.records.lock().unwrap().clone())
        }

        async fn get(&self, sku: &str) -> crate::domain::error::Result<Option<ProductRecord>> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.sku == sku)
                .cloned())
        }

        async fn exists(&self, sku: &str) -> crate::domain::error::Result<bool> {
            Ok(self.get(sku).await?.is_some())
        }

        async fn update_by_key(
            &self,
            _sku: &str,
            _update: &ProductUpdate,
        ) -> crate::domain::error::Result<UpdateOutcome> {
            unimplemented!()
        }
    }

    fn table(content: &str) -> CsvTable {
        CsvParser::new().parse_content(content).unwrap()
    }

    #[tokio::test]
    async fn test_alias_and_normalization() {
        let store = Arc::new(FakeStore::new(None));
        let import = ImportProductsUseCase::new(store.clone(), 500);

        let summary = import
            .run_table(&table(
                "SKU,ITEMS_NAME,PRODUSEN,BRAND_NAME,PRICE\n\
                 a1,kopi bubuk,pt sari,kapal api,1500\n\
                 a2,teh celup,,,\n",
            ))
            .await
            .unwrap();

        assert_eq!(summary.rows_normalized, 2);
        assert_eq!(summary.batches_failed, 0);

        let stored = store.records.lock().unwrap();
        assert_eq!(stored[0].sku, "A1");
        assert_eq!(stored[0].category, Some("PT SARI".to_string()));
        assert_eq!(stored[0].price, Some(1500.0));
        // Blanks are NULL, never empty strings.
        assert_eq!(stored[1].category, None);
        assert_eq!(stored[1].brand_name, None);
        assert_eq!(stored[1].price, None);
    }

    #[tokio::test]
    async fn test_blank_price_row_among_priced_rows() {
        let store = Arc::new(FakeStore::new(None));
        let import = ImportProductsUseCase::new(store.clone(), 500);

        import
            .run_table(&table(
                "SKU,ITEMS_NAME,CATEGORY,PRICE\nA1,X,,100\nA2,Y,,\nA3,Z,,300\n",
            ))
            .await
            .unwrap();

        let stored = store.records.lock().unwrap();
        assert_eq!(stored[0].price, Some(100.0));
        assert_eq!(stored[1].price, None);
        assert_eq!(stored[2].price, Some(300.0));
    }

    #[tokio::test]
    async fn test_missing_sku_column_is_fatal() {
        let store = Arc::new(FakeStore::new(None));
        let import = ImportProductsUseCase::new(store.clone(), 500);

        let err = import
            .run_table(&table("CODE,ITEMS_NAME,CATEGORY\nA1,X,\n"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
        // Nothing was sent before the failure.
        assert!(store.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_category_and_alias_is_fatal() {
        let store = Arc::new(FakeStore::new(None));
        let import = ImportProductsUseCase::new(store, 500);

        let err = import
            .run_table(&table("SKU,ITEMS_NAME\nA1,X\n"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_chunking_is_complete_and_ordered() {
        let store = Arc::new(FakeStore::new(None));
        let import = ImportProductsUseCase::new(store.clone(), 2);

        let mut content = String::from("SKU,ITEMS_NAME,CATEGORY\n");
        for i in 0..5 {
            content.push_str(&format!("S{},NAME{},\n", i, i));
        }
        let summary = import.run_table(&table(&content)).await.unwrap();

        // ceil(5 / 2) = 3 chunks, sizes 2 + 2 + 1, order preserved.
        assert_eq!(summary.batches_attempted, 3);
        assert_eq!(*store.calls.lock().unwrap(), vec![2, 2, 1]);
        let stored = store.records.lock().unwrap();
        let skus: Vec<&str> = stored.iter().map(|r| r.sku.as_str()).collect();
        assert_eq!(skus, vec!["S0", "S1", "S2", "S3", "S4"]);
    }

    #[tokio::test]
    async fn test_failed_chunk_does_not_abort_the_rest() {
        // Second of three chunks fails.
        let store = Arc::new(FakeStore::new(Some(1)));
        let import = ImportProductsUseCase::new(store.clone(), 2);

        let mut content = String::from("SKU,ITEMS_NAME,CATEGORY\n");
        for i in 0..6 {
            content.push_str(&format!("S{},NAME{},\n", i, i));
        }
        let summary = import.run_table(&table(&content)).await.unwrap();

        assert_eq!(summary.batches_attempted, 3);
        assert_eq!(summary.batches_failed, 1);

        let stored = store.records.lock().unwrap();
        let skus: Vec<&str> = stored.iter().map(|r| r.sku.as_str()).collect();
        // Chunk 2 (S2, S3) is absent; chunks 1 and 3 landed.
        assert_eq!(skus, vec!["S0", "S1", "S4", "S5"]);
    }

    #[tokio::test]
    async fn test_rows_without_key_are_skipped_with_count() {
        let store = Arc::new(FakeStore::new(None));
        let import = ImportProductsUseCase::new(store, 500);

        let summary = import
            .run_table(&table(
                "SKU,ITEMS_NAME,CATEGORY\nA1,X,\n,NO SKU,\nA3,,\n",
            ))
            .await
            .unwrap();

        assert_eq!(summary.rows_read, 3);
        assert_eq!(summary.rows_normalized, 1);
        assert_eq!(summary.rows_skipped, 2);
    }
}
