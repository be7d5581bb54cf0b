//! CatalogStore trait definition.

use super::models::{McpServer, NewMcpServer};
use crate::error::MarketplaceResult;
use anyhow::Result;

/// Trait for catalog storage backends.
pub trait CatalogStore: Send + Sync {
    // =========================================================================
    // Listing & Search
    // =========================================================================

    /// All entries, featured first, then by deployment count descending.
    fn list_all(&self) -> Result<Vec<McpServer>>;

    /// Featured entries by deployment count descending, at most
    /// [`FEATURED_LIMIT`](super::FEATURED_LIMIT) of them.
    fn list_featured(&self) -> Result<Vec<McpServer>>;

    /// Entries whose name or description contains `query` (case-insensitive),
    /// or whose tags contain `query` exactly. Same ordering as `list_all`.
    fn search(&self, query: &str) -> Result<Vec<McpServer>>;

    // =========================================================================
    // Single Entry Retrieval
    // =========================================================================

    fn get_by_slug(&self, slug: &str) -> Result<Option<McpServer>>;

    fn get_by_id(&self, id: i64) -> Result<Option<McpServer>>;

    // =========================================================================
    // Write Operations
    // =========================================================================

    /// Inserts a new entry.
    /// Fails with `MarketplaceError::Conflict` if the slug is taken.
    fn create(&self, entry: &NewMcpServer) -> MarketplaceResult<McpServer>;

    /// Inserts all `entries` in one transaction, only if the catalog is empty.
    /// Returns `None` when entries already existed.
    fn create_all_if_empty(&self, entries: &[NewMcpServer]) -> MarketplaceResult<Option<usize>>;

    /// Atomically bumps the deployment counter of an entry.
    /// Returns false if the entry does not exist.
    fn increment_deployment_count(&self, id: i64) -> Result<bool>;

    // =========================================================================
    // Counts (for seeding and metrics)
    // =========================================================================

    fn count(&self) -> Result<usize>;
}
