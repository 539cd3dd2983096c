#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Configuration and candidate types for the boundary import pipeline.
//!
//! The [`Metro`] settings are deserialized from TOML and injected into the
//! importer at construction time; the pipeline never reads process-global
//! state. [`LocationCandidate`] is the fully derived field set for one
//! boundary-to-be, produced by the pure preparation stage before any
//! database activity.

use serde::{Deserialize, Serialize};

/// Metro-wide settings, deserialized from TOML.
///
/// The extent is the lon/lat bounding box used by the optional
/// `--filter-bounds` spatial filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metro {
    /// Metro display name (e.g., "Boston"). Stored uppercased as the
    /// `city` scope label on every imported boundary.
    pub metro_name: String,
    /// Lon/lat extent of the metro.
    pub extent: MetroExtent,
}

impl Metro {
    /// The metro name uppercased, as stored in every `city` and scope
    /// column.
    #[must_use]
    pub fn city_label(&self) -> String {
        self.metro_name.to_uppercase()
    }
}

/// A lon/lat bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetroExtent {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl MetroExtent {
    /// Creates a new extent from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }
}

/// Options controlling a single import run.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Feature property that contains the boundary's name.
    pub name_field: String,
    /// Provenance label stored on every imported boundary.
    pub source: String,
    /// Emit per-feature notices (skips, slug munging, create/reuse).
    pub verbose: bool,
    /// Discard features that do not intersect the metro extent.
    pub filter_bounds: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            name_field: "name".to_string(),
            source: "UNKNOWN".to_string(),
            verbose: false,
            filter_bounds: false,
        }
    }
}

/// A prepared boundary candidate, ready for database insertion.
///
/// All fields are derived before the save loop runs; `display_order` is
/// the candidate's rank under the ascending name sort for this run.
#[derive(Debug, Clone)]
pub struct LocationCandidate {
    /// Human-readable boundary name.
    pub name: String,
    /// Canonicalized name used for matching (uppercased, punctuation
    /// stripped, whitespace collapsed).
    pub normalized_name: String,
    /// URL-safe identifier derived from the name. May be re-suffixed by
    /// the save loop on a uniqueness conflict.
    pub slug: String,
    /// `GeoJSON` geometry as a JSON string for `ST_GeomFromGeoJSON`.
    pub geometry_json: String,
    /// Whether the geometry passed the client-side validity predicate.
    /// Invalid geometries get one zero-width-buffer repair attempt at
    /// save time.
    pub geometry_valid: bool,
    /// Centroid longitude.
    pub centroid_lon: f64,
    /// Centroid latitude.
    pub centroid_lat: f64,
    /// Geodesic area in square meters.
    pub area: f64,
    /// Rank of this candidate's name under ascending lexical sort,
    /// 0-indexed, ties broken by input order.
    pub display_order: i32,
}
