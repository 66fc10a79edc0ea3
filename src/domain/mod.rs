pub mod enrichment;
pub mod error;
pub mod product;
