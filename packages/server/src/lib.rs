#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the blockpress application.
//!
//! Serves the public JSON/Atom API: boundary listings and detail,
//! boundary type and schema catalogs, news item queries, and a
//! boundary-name geocoder. Every GET endpoint honors JSONP wrapping.

pub mod atom;
pub mod flags;
pub mod guards;
pub mod handlers;
pub mod jsonp;

use std::sync::Arc;

use switchy_database::Database;

use crate::flags::SchemaFlags;

/// Shared application state.
pub struct AppState {
    /// Database connection.
    pub db: Arc<dyn Database>,
    /// Schema feature flag provider.
    pub flags: Arc<dyn SchemaFlags>,
}
