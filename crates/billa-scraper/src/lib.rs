pub mod client;
pub mod error;
pub mod normalize;
pub mod pagination;
pub mod retry;
pub mod types;
pub mod user_agent;

pub use client::CatalogClient;
pub use error::ScraperError;
pub use normalize::{minor_units_to_currency, normalize_record, normalize_records};
pub use pagination::{FetchState, PageCursor};
pub use types::CatalogPage;
