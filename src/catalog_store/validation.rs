//! Validation for catalog entries.
//!
//! Checks run before a new entry reaches the store.

use super::models::NewMcpServer;
use crate::error::MarketplaceError;
use std::collections::HashSet;
use std::fmt;

pub const MAX_RATING: i64 = 50;

#[derive(Debug, PartialEq)]
pub enum ValidationError {
    EmptyField { field: &'static str },
    InvalidSlug { slug: String },
    OutOfRange { field: &'static str, value: i64 },
    EmptyEnvVarKey,
    DuplicateEnvVarKey { key: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField { field } => {
                write!(f, "Field '{}' is required but was empty", field)
            }
            ValidationError::InvalidSlug { slug } => {
                write!(
                    f,
                    "Slug '{}' must contain only lowercase letters, digits and dashes",
                    slug
                )
            }
            ValidationError::OutOfRange { field, value } => {
                write!(f, "Field '{}' is out of range: {}", field, value)
            }
            ValidationError::EmptyEnvVarKey => {
                write!(f, "Environment variable keys cannot be empty")
            }
            ValidationError::DuplicateEnvVarKey { key } => {
                write!(f, "Environment variable '{}' is declared more than once", key)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for MarketplaceError {
    fn from(err: ValidationError) -> Self {
        MarketplaceError::invalid(err.to_string())
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

fn is_valid_slug(slug: &str) -> bool {
    !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

pub fn validate_new_mcp(mcp: &NewMcpServer) -> ValidationResult<()> {
    for (field, value) in [
        ("name", &mcp.name),
        ("slug", &mcp.slug),
        ("description", &mcp.description),
        ("maintainer", &mcp.maintainer),
        ("version", &mcp.version),
        ("category", &mcp.category),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyField { field });
        }
    }
    if !is_valid_slug(&mcp.slug) {
        return Err(ValidationError::InvalidSlug {
            slug: mcp.slug.clone(),
        });
    }
    if !(0..=MAX_RATING).contains(&mcp.rating) {
        return Err(ValidationError::OutOfRange {
            field: "rating",
            value: mcp.rating,
        });
    }
    if mcp.deployment_count < 0 {
        return Err(ValidationError::OutOfRange {
            field: "deployment_count",
            value: mcp.deployment_count,
        });
    }

    let mut seen = HashSet::new();
    for spec in &mcp.env_vars {
        if spec.key.trim().is_empty() {
            return Err(ValidationError::EmptyEnvVarKey);
        }
        if !seen.insert(spec.key.as_str()) {
            return Err(ValidationError::DuplicateEnvVarKey {
                key: spec.key.clone(),
            });
        }
    }
    Ok(())
}
