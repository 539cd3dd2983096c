#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the blockpress server.
//!
//! These types are serialized to JSON for the public API. They are
//! separate from the database row types to allow independent evolution
//! of the API contract.

use blockpress_database_models::LocationRow;
use serde::{Deserialize, Serialize};

/// Health probe response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Always true when the server answers.
    pub healthy: bool,
    /// Crate version.
    pub version: String,
}

/// A boundary as returned by the list endpoint (no geometry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiLocation {
    /// URL-safe identifier.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// City scope label.
    pub city: String,
    /// Slug of the owning boundary type.
    #[serde(rename = "type")]
    pub location_type: String,
    /// Detail endpoint path.
    pub url: String,
}

impl From<LocationRow> for ApiLocation {
    fn from(row: LocationRow) -> Self {
        let url = format!("/api/locations/{}/{}.json", row.location_type_slug, row.slug);
        Self {
            slug: row.slug,
            name: row.name,
            city: row.city,
            location_type: row.location_type_slug,
            url,
        }
    }
}

/// A boundary type as returned by the type catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiLocationType {
    /// Display name.
    pub name: String,
    /// Plural display name.
    pub plural_name: String,
    /// Scope label.
    pub scope: String,
}

/// Query parameters accepted by every GET endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonpParams {
    /// JSONP callback name; when present and valid, the response body
    /// is wrapped in a function call and served as JavaScript.
    pub jsonp: Option<String>,
}

/// Query parameters for the news item endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemQueryParams {
    /// Restrict to items of this schema slug.
    #[serde(rename = "type")]
    pub schema_type: Option<String>,
    /// Maximum number of results (default 100).
    pub limit: Option<u32>,
    /// Number of results to skip.
    pub offset: Option<u32>,
    /// JSONP callback name.
    pub jsonp: Option<String>,
}

/// Query parameters for the geocode endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeocodeParams {
    /// Name to look up.
    pub q: Option<String>,
    /// JSONP callback name.
    pub jsonp: Option<String>,
}
