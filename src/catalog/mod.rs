pub mod filter;
pub mod store;

pub use filter::{filter_and_sort, sort_courses};
pub use store::{CatalogPage, CatalogQuery, CatalogStore, DEFAULT_PAGE_SIZE};
