//! Database query functions for boundary data.
//!
//! Spatial queries use `query_raw_params()` with `PostGIS` functions.
//! The import pipeline's create-or-fetch is expressed as explicit
//! primitives: a full-field match ([`find_matching_location`]), a
//! conflict-aware insert ([`insert_location`] returning
//! [`CreateOutcome`]), and a slug census ([`count_locations_with_slug`])
//! for the disambiguation retry.

use blockpress_boundary_models::LocationCandidate;
use blockpress_database_models::{LocationRow, LocationTypeRow};
use chrono::{DateTime, Utc};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};

use crate::DbError;

/// Outcome of an insert attempt for one boundary.
///
/// Fully identical rows are detected beforehand via
/// [`find_matching_location`], so the insert itself either creates a
/// row or collides. `Conflict` means the unique slug is taken by a row
/// with different fields, i.e. two distinct features normalized to the
/// same slug. The caller decides whether to re-slug and retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A new row was inserted.
    Created(i32),
    /// The slug is taken by a row with different fields.
    Conflict,
}

/// Fetches a location type by slug.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn get_location_type(
    db: &dyn Database,
    slug: &str,
) -> Result<Option<LocationTypeRow>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT id, name, plural_name, scope, slug, is_browsable, is_significant
             FROM location_types WHERE slug = $1",
            &[DatabaseValue::String(slug.to_string())],
        )
        .await?;

    Ok(rows.first().map(location_type_from_row))
}

/// Inserts a location type if absent and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails or the row
/// cannot be read back.
pub async fn get_or_create_location_type(
    db: &dyn Database,
    slug: &str,
    name: &str,
    plural_name: &str,
    scope: &str,
) -> Result<LocationTypeRow, DbError> {
    db.exec_raw_params(
        "INSERT INTO location_types (name, plural_name, scope, slug, is_browsable, is_significant)
         VALUES ($1, $2, $3, $4, TRUE, TRUE)
         ON CONFLICT (slug) DO NOTHING",
        &[
            DatabaseValue::String(name.to_string()),
            DatabaseValue::String(plural_name.to_string()),
            DatabaseValue::String(scope.to_string()),
            DatabaseValue::String(slug.to_string()),
        ],
    )
    .await?;

    get_location_type(db, slug)
        .await?
        .ok_or_else(|| DbError::Conversion {
            message: format!("Location type {slug} missing after upsert"),
        })
}

/// Lists all location types ordered by name.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn list_location_types(db: &dyn Database) -> Result<Vec<LocationTypeRow>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT id, name, plural_name, scope, slug, is_browsable, is_significant
             FROM location_types ORDER BY name",
            &[],
        )
        .await?;

    Ok(rows.iter().map(|r| location_type_from_row(r)).collect())
}

/// Finds a location whose full business field set matches the candidate.
///
/// Derived fields (centroid, area) and defaulted fields (timestamps,
/// `display_order`) are excluded so an unchanged re-import matches the
/// existing row. Geometry participates via `ST_Equals`.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn find_matching_location(
    db: &dyn Database,
    candidate: &LocationCandidate,
    location_type_id: i32,
    city: &str,
    source: &str,
) -> Result<Option<i32>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT id FROM locations
             WHERE name = $1 AND normalized_name = $2 AND slug = $3
               AND location_type_id = $4 AND city = $5 AND source = $6
               AND is_public = TRUE
               AND ST_Equals(location::geometry, ST_Multi(ST_GeomFromGeoJSON($7)))
             LIMIT 1",
            &[
                DatabaseValue::String(candidate.name.clone()),
                DatabaseValue::String(candidate.normalized_name.clone()),
                DatabaseValue::String(candidate.slug.clone()),
                DatabaseValue::Int32(location_type_id),
                DatabaseValue::String(city.to_string()),
                DatabaseValue::String(source.to_string()),
                DatabaseValue::String(candidate.geometry_json.clone()),
            ],
        )
        .await?;

    match rows.first() {
        Some(row) => {
            let id: i32 = row.to_value("id").map_err(|e| DbError::Conversion {
                message: format!("Failed to parse location id: {e}"),
            })?;
            Ok(Some(id))
        }
        None => Ok(None),
    }
}

/// Inserts a new location row.
///
/// Uses `ON CONFLICT DO NOTHING RETURNING id`, so a slug collision
/// surfaces as [`CreateOutcome::Conflict`] instead of a database error.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
#[allow(clippy::too_many_arguments)]
pub async fn insert_location(
    db: &dyn Database,
    candidate: &LocationCandidate,
    slug: &str,
    location_type_id: i32,
    city: &str,
    source: &str,
    now: DateTime<Utc>,
) -> Result<CreateOutcome, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO locations (
                name, normalized_name, slug, location_type_id,
                location, centroid, city, source, area,
                is_public, display_order, creation_date, last_mod_date
             ) VALUES (
                $1, $2, $3, $4,
                ST_Multi(ST_GeomFromGeoJSON($5))::geography,
                ST_SetSRID(ST_MakePoint($6, $7), 4326)::geography,
                $8, $9, $10, TRUE, $11, $12, $12
             )
             ON CONFLICT (slug) DO NOTHING
             RETURNING id",
            &[
                DatabaseValue::String(candidate.name.clone()),
                DatabaseValue::String(candidate.normalized_name.clone()),
                DatabaseValue::String(slug.to_string()),
                DatabaseValue::Int32(location_type_id),
                DatabaseValue::String(candidate.geometry_json.clone()),
                DatabaseValue::Real64(candidate.centroid_lon),
                DatabaseValue::Real64(candidate.centroid_lat),
                DatabaseValue::String(city.to_string()),
                DatabaseValue::String(source.to_string()),
                DatabaseValue::Real64(candidate.area),
                DatabaseValue::Int32(candidate.display_order),
                DatabaseValue::DateTime(now.naive_utc()),
            ],
        )
        .await?;

    match rows.first() {
        Some(row) => {
            let id: i32 = row.to_value("id").map_err(|e| DbError::Conversion {
                message: format!("Failed to parse inserted location id: {e}"),
            })?;
            Ok(CreateOutcome::Created(id))
        }
        None => Ok(CreateOutcome::Conflict),
    }
}

/// Counts existing locations with the given slug.
///
/// Used to pick the next deterministic `-<n>` suffix after a conflict.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn count_locations_with_slug(db: &dyn Database, slug: &str) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT COUNT(*) as count FROM locations WHERE slug = $1",
            &[DatabaseValue::String(slug.to_string())],
        )
        .await?;

    let Some(row) = rows.first() else {
        return Ok(0);
    };

    let count: i64 = row.to_value("count").unwrap_or(0);
    Ok(count)
}

/// Attempts a zero-width-buffer repair of a `GeoJSON` geometry.
///
/// Returns the repaired geometry as `GeoJSON` text, or `None` if
/// `PostGIS` produced nothing usable.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn repair_geometry(
    db: &dyn Database,
    geometry_json: &str,
) -> Result<Option<String>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT ST_AsGeoJSON(ST_Buffer(ST_GeomFromGeoJSON($1), 0.0)) as geojson",
            &[DatabaseValue::String(geometry_json.to_string())],
        )
        .await?;

    let Some(row) = rows.first() else {
        return Ok(None);
    };

    let geojson: Option<String> = row.to_value("geojson").unwrap_or(None);
    Ok(geojson.filter(|g| !g.is_empty()))
}

/// Returns the total number of news items.
///
/// The backfill partitions the id space `[0, count)` into fixed-size
/// batches.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn news_item_count(db: &dyn Database) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params("SELECT COUNT(*) as count FROM news_items", &[])
        .await?;

    let Some(row) = rows.first() else {
        return Ok(0);
    };

    let count: i64 = row.to_value("count").unwrap_or(0);
    Ok(count)
}

/// Inserts association rows for one backfill batch.
///
/// A single set-based insert: every news item in `[start, end)` whose
/// geometry intersects the target location gets a join row. Each call
/// is its own transaction (auto-commit), so an interrupted backfill
/// leaves a well-defined prefix of batches committed.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn insert_item_location_batch(
    db: &dyn Database,
    location_id: i32,
    start: i64,
    end: i64,
) -> Result<u64, DbError> {
    let inserted = db
        .exec_raw_params(
            "INSERT INTO news_item_locations (news_item_id, location_id)
             SELECT ni.id, loc.id
             FROM news_items ni, locations loc
             WHERE ST_Intersects(ni.location, loc.location)
               AND ni.id >= $1 AND ni.id < $2
               AND loc.id = $3",
            &[
                DatabaseValue::Int64(start),
                DatabaseValue::Int64(end),
                DatabaseValue::Int32(location_id),
            ],
        )
        .await?;

    Ok(inserted)
}

/// Lists public locations ordered by `display_order`, without geometry.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn list_public_locations(db: &dyn Database) -> Result<Vec<LocationRow>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT l.id, l.name, l.normalized_name, l.slug, l.location_type_id,
                    lt.slug as location_type_slug, l.city, l.source, l.area,
                    ST_X(l.centroid::geometry) as centroid_lon,
                    ST_Y(l.centroid::geometry) as centroid_lat,
                    l.is_public, l.display_order
             FROM locations l
             JOIN location_types lt ON l.location_type_id = lt.id
             WHERE l.is_public = TRUE
             ORDER BY l.display_order, l.name",
            &[],
        )
        .await?;

    Ok(rows.iter().map(|r| location_from_row(r, None)).collect())
}

/// Fetches one location with its boundary polygon as `GeoJSON`.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn get_location_detail(
    db: &dyn Database,
    loctype_slug: &str,
    slug: &str,
) -> Result<Option<LocationRow>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT l.id, l.name, l.normalized_name, l.slug, l.location_type_id,
                    lt.slug as location_type_slug, l.city, l.source, l.area,
                    ST_X(l.centroid::geometry) as centroid_lon,
                    ST_Y(l.centroid::geometry) as centroid_lat,
                    l.is_public, l.display_order,
                    ST_AsGeoJSON(l.location::geometry) as geojson
             FROM locations l
             JOIN location_types lt ON l.location_type_id = lt.id
             WHERE lt.slug = $1 AND l.slug = $2",
            &[
                DatabaseValue::String(loctype_slug.to_string()),
                DatabaseValue::String(slug.to_string()),
            ],
        )
        .await?;

    Ok(rows.first().map(|row| {
        let geojson: Option<String> = row.to_value("geojson").unwrap_or(None);
        location_from_row(row, geojson)
    }))
}

/// Finds public locations whose normalized name matches exactly.
///
/// Backs the geocode endpoint: a name lookup against stored
/// boundaries, not an address geocoder.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn find_locations_by_normalized_name(
    db: &dyn Database,
    normalized_name: &str,
) -> Result<Vec<LocationRow>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT l.id, l.name, l.normalized_name, l.slug, l.location_type_id,
                    lt.slug as location_type_slug, l.city, l.source, l.area,
                    ST_X(l.centroid::geometry) as centroid_lon,
                    ST_Y(l.centroid::geometry) as centroid_lat,
                    l.is_public, l.display_order
             FROM locations l
             JOIN location_types lt ON l.location_type_id = lt.id
             WHERE l.is_public = TRUE AND l.normalized_name = $1
             ORDER BY l.name",
            &[DatabaseValue::String(normalized_name.to_string())],
        )
        .await?;

    Ok(rows.iter().map(|r| location_from_row(r, None)).collect())
}

fn location_type_from_row(row: &switchy_database::Row) -> LocationTypeRow {
    LocationTypeRow {
        id: row.to_value("id").unwrap_or(0),
        name: row.to_value("name").unwrap_or_default(),
        plural_name: row.to_value("plural_name").unwrap_or_default(),
        scope: row.to_value("scope").unwrap_or_default(),
        slug: row.to_value("slug").unwrap_or_default(),
        is_browsable: row.to_value("is_browsable").unwrap_or(false),
        is_significant: row.to_value("is_significant").unwrap_or(false),
    }
}

fn location_from_row(row: &switchy_database::Row, geojson: Option<String>) -> LocationRow {
    LocationRow {
        id: row.to_value("id").unwrap_or(0),
        name: row.to_value("name").unwrap_or_default(),
        normalized_name: row.to_value("normalized_name").unwrap_or_default(),
        slug: row.to_value("slug").unwrap_or_default(),
        location_type_id: row.to_value("location_type_id").unwrap_or(0),
        location_type_slug: row.to_value("location_type_slug").unwrap_or_default(),
        city: row.to_value("city").unwrap_or_default(),
        source: row.to_value("source").unwrap_or_default(),
        area: row.to_value("area").unwrap_or(0.0),
        centroid_lon: row.to_value("centroid_lon").unwrap_or(0.0),
        centroid_lat: row.to_value("centroid_lat").unwrap_or(0.0),
        is_public: row.to_value("is_public").unwrap_or(false),
        display_order: row.to_value("display_order").unwrap_or(0),
        geojson,
    }
}
