pub mod use_cases;

pub use use_cases::{CatalogUseCase, EnrichProductUseCase, ImportProductsUseCase, ImportSummary};
