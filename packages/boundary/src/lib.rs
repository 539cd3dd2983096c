#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Boundary import pipeline.
//!
//! Reads geographic features from a `GeoJSON` dataset, validates and
//! repairs geometries, derives normalized names and unique slugs, inserts
//! boundary records into `PostGIS`, and back-fills the news-item
//! association table by spatial intersection.
//!
//! The pipeline is single-threaded and batch-sequential. The only
//! concurrency concern is external (two operators importing at once),
//! handled by the optimistic insert-then-recover-on-conflict slug retry
//! in [`importer`].

pub mod backfill;
pub mod dataset;
pub mod geometry;
pub mod importer;
pub mod metro;
pub mod text;

use thiserror::Error;

/// Errors that can occur during boundary import.
#[derive(Debug, Error)]
pub enum BoundaryError {
    /// The dataset file does not exist.
    #[error("Dataset file does not exist: {path}")]
    DatasetNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The requested layer index is out of range for the dataset.
    #[error("Dataset has no layer {index}")]
    NoSuchLayer {
        /// Layer index that was requested.
        index: u32,
    },

    /// The dataset could not be parsed as a `GeoJSON` feature collection.
    #[error("Invalid dataset: {message}")]
    Dataset {
        /// Description of what went wrong.
        message: String,
    },

    /// A slug collided twice; the run cannot continue.
    #[error("Could not make slug unique: {slug}")]
    SlugConflict {
        /// The slug that remained in conflict after one rename.
        slug: String,
    },

    /// I/O error reading the dataset or metro configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `GeoJSON` parsing failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Metro configuration failed to parse.
    #[error("Metro config error: {0}")]
    MetroConfig(#[from] toml::de::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Db(#[from] blockpress_database::DbError),
}
