pub mod catalog;
pub mod enrich_product;
pub mod import_products;
pub mod suggestion;

pub use catalog::CatalogUseCase;
pub use enrich_product::EnrichProductUseCase;
pub use import_products::{ImportProductsUseCase, ImportSummary};
