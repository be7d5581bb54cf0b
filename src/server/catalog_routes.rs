//! Public catalog endpoints: listing, search, single entry and seeding.

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::metrics::set_catalog_entries;
use super::state::{GuardedCatalogStore, ServerState};
use crate::catalog_store::{seed_default_catalog, CatalogQuery, McpServer};
use crate::error::{MarketplaceError, MarketplaceResult};

#[derive(Deserialize, Debug, Default)]
pub struct CatalogParams {
    pub search: Option<String>,
    pub featured: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
}

async fn list_mcps(
    State(catalog): State<GuardedCatalogStore>,
    Query(params): Query<CatalogParams>,
) -> MarketplaceResult<Json<Vec<McpServer>>> {
    debug!("list_mcps() called with {:?}", params);
    let search = params
        .search
        .as_deref()
        .filter(|s| !s.trim().is_empty());

    let entries = if params.featured.as_deref() == Some("true") {
        catalog.list_featured()
    } else if let Some(query) = search {
        catalog.search(query)
    } else {
        catalog.list_all()
    }
    .context("Failed to fetch MCPs")?;

    let query = CatalogQuery::from_params(params.category.as_deref(), params.sort.as_deref());
    Ok(Json(query.apply(entries)))
}

async fn get_mcp(
    State(catalog): State<GuardedCatalogStore>,
    Path(slug): Path<String>,
) -> MarketplaceResult<Json<McpServer>> {
    catalog
        .get_by_slug(&slug)
        .context("Failed to fetch MCP")?
        .map(Json)
        .ok_or_else(|| MarketplaceError::not_found("MCP not found"))
}

async fn seed_mcps(State(catalog): State<GuardedCatalogStore>) -> MarketplaceResult<Json<Value>> {
    let outcome = seed_default_catalog(catalog.as_ref())?;
    if let Ok(count) = catalog.count() {
        set_catalog_entries(count);
    }
    Ok(Json(json!({ "message": outcome.message() })))
}

pub fn make_catalog_routes(state: ServerState) -> Router {
    Router::new()
        .route("/mcps", get(list_mcps))
        .route("/mcps/{slug}", get(get_mcp))
        .route("/seed-mcps", post(seed_mcps))
        .with_state(state)
}
