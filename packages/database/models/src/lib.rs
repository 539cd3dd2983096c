#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Database row types and query parameter definitions.
//!
//! These types represent the shapes of data as stored in and retrieved
//! from the `PostGIS` database. They are distinct from the API response
//! types in `blockpress_server_models`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A boundary category (e.g., "neighborhood", "ward").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationTypeRow {
    /// Primary key.
    pub id: i32,
    /// Display name (e.g., "Neighborhood").
    pub name: String,
    /// Plural display name (e.g., "Neighborhoods").
    pub plural_name: String,
    /// Scope label, usually the metro name.
    pub scope: String,
    /// URL-safe identifier, unique.
    pub slug: String,
    /// Whether the type appears in browse UIs.
    pub is_browsable: bool,
    /// Whether the type is significant enough to aggregate news by.
    pub is_significant: bool,
}

/// A named geographic boundary as retrieved from the database.
///
/// The polygon itself stays in `PostGIS`; rows carry it as `GeoJSON`
/// text only when a query asks for it (`geojson` field).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRow {
    /// Primary key.
    pub id: i32,
    /// Human-readable name.
    pub name: String,
    /// Canonicalized name used for matching.
    pub normalized_name: String,
    /// URL-safe identifier, unique.
    pub slug: String,
    /// Owning boundary type.
    pub location_type_id: i32,
    /// Slug of the owning boundary type (joined in list queries).
    pub location_type_slug: String,
    /// City scope label.
    pub city: String,
    /// Provenance of the boundary data.
    pub source: String,
    /// Geodesic area in square meters.
    pub area: f64,
    /// Centroid longitude.
    pub centroid_lon: f64,
    /// Centroid latitude.
    pub centroid_lat: f64,
    /// Whether the boundary is publicly listed.
    pub is_public: bool,
    /// Rank under ascending name sort at import time.
    pub display_order: i32,
    /// Boundary polygon as `GeoJSON` text, when requested.
    pub geojson: Option<String>,
}

/// A news item category ("schema" in the original data model).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRow {
    /// Primary key.
    pub id: i32,
    /// URL-safe identifier, unique.
    pub slug: String,
    /// Display name (e.g., "Police report").
    pub name: String,
    /// Plural display name.
    pub plural_name: String,
    /// "a" or "an", for UI copy.
    pub indefinite_article: String,
    /// When items of this schema were last updated.
    pub last_updated: DateTime<Utc>,
    /// Whether items of this schema are publicly visible.
    pub is_public: bool,
}

/// An attribute definition attached to a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaFieldRow {
    /// Owning schema.
    pub schema_id: i32,
    /// URL-safe attribute identifier.
    pub slug: String,
    /// Display name.
    pub pretty_name: String,
    /// Storage datatype (`varchar`, `int`, `date`, ...).
    pub datatype: String,
    /// Whether the field stores lookup references rather than raw
    /// values. Lookup fields are reported as `text` by the API.
    pub is_lookup: bool,
}

/// A geotagged news item as retrieved from the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItemRow {
    /// Primary key.
    pub id: i64,
    /// Owning schema.
    pub schema_id: i32,
    /// Slug of the owning schema (joined in list queries).
    pub schema_slug: String,
    /// Headline.
    pub title: String,
    /// Body text.
    pub description: String,
    /// Link to the original article or record.
    pub url: String,
    /// Publication timestamp.
    pub pub_date: DateTime<Utc>,
    /// Point location as `GeoJSON` text, if the item is geotagged.
    pub location_geojson: Option<String>,
}

/// Parameters for querying news items from the database.
#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    /// Restrict to items of this schema slug.
    pub schema_slug: Option<String>,
    /// Maximum number of results to return.
    pub limit: u32,
    /// Number of results to skip.
    pub offset: u32,
}
