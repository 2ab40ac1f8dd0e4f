pub mod data;
pub mod index;

pub use data::{builtin, Catalog, Plan, Provider, Service};
pub use index::{CatalogIndex, PricedPlan};
