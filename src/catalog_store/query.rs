//! Category filter and sort applied on top of a catalog listing.

use super::models::McpServer;
use std::cmp::Reverse;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatalogSort {
    Popular,
    Rating,
    Newest,
}

impl FromStr for CatalogSort {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "popular" | "deployments" => Ok(CatalogSort::Popular),
            "rating" => Ok(CatalogSort::Rating),
            "newest" => Ok(CatalogSort::Newest),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub sort: Option<CatalogSort>,
}

impl CatalogQuery {
    /// Builds a query from raw parameters. `all`, blank categories and
    /// unknown sort names are dropped.
    pub fn from_params(category: Option<&str>, sort: Option<&str>) -> Self {
        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
            .map(str::to_string);
        let sort = sort.and_then(|s| s.trim().parse().ok());
        CatalogQuery { category, sort }
    }

    pub fn apply(&self, mut entries: Vec<McpServer>) -> Vec<McpServer> {
        if let Some(category) = &self.category {
            entries.retain(|mcp| &mcp.category == category);
        }
        match self.sort {
            Some(CatalogSort::Popular) => entries.sort_by_key(|mcp| Reverse(mcp.deployment_count)),
            Some(CatalogSort::Rating) => entries.sort_by_key(|mcp| Reverse(mcp.rating)),
            Some(CatalogSort::Newest) => entries.sort_by_key(|mcp| Reverse(mcp.created_at)),
            None => {}
        }
        entries
    }
}
