//! Catalog of deployable MCP servers.

mod models;
pub mod query;
mod schema;
pub mod seed;
mod store;
mod trait_def;
mod validation;

/// Maximum number of entries returned by the featured listing.
pub const FEATURED_LIMIT: usize = 6;

pub use models::*;
pub use query::{CatalogQuery, CatalogSort};
pub use schema::MCP_TABLE_V_0;
pub use seed::{default_catalog, seed_default_catalog, SeedOutcome};
pub use store::SqliteCatalogStore;
pub(crate) use store::{mcp_from_row_at, MCP_COLUMNS};
pub use trait_def::CatalogStore;
pub use validation::{validate_new_mcp, ValidationError};
