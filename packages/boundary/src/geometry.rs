//! Client-side geometry helpers for the import pipeline.
//!
//! `GeoJSON` input is WGS84 by definition, so no reprojection happens
//! here. The validity predicate and derived measures (centroid, area)
//! use the `geo` crate; the zero-width-buffer repair itself runs in
//! `PostGIS` (see `blockpress_database::queries::repair_geometry`).

use blockpress_boundary_models::MetroExtent;
use geo::{
    Centroid, ChamberlainDuquetteArea, Intersects, MultiPolygon, Rect, Validation, coord,
};
use geojson::{Feature, GeoJson};

/// Extracts a feature's geometry as a [`MultiPolygon`].
///
/// Plain polygons are wrapped; anything else (points, lines, missing
/// geometry) yields `None`.
#[must_use]
pub fn feature_multipolygon(feature: &Feature) -> Option<MultiPolygon<f64>> {
    let geom = feature.geometry.as_ref()?;
    let geo_geom: geo::Geometry<f64> = geom.clone().try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

/// Parses a `GeoJSON` geometry string into a [`MultiPolygon`].
///
/// Used to re-check validity of a `PostGIS`-repaired geometry.
#[must_use]
pub fn parse_multipolygon(geojson_str: &str) -> Option<MultiPolygon<f64>> {
    let geojson: GeoJson = geojson_str.parse().ok()?;
    if let GeoJson::Geometry(geom) = geojson {
        let geo_geom: geo::Geometry<f64> = geom.try_into().ok()?;
        match geo_geom {
            geo::Geometry::MultiPolygon(mp) => Some(mp),
            geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
            _ => None,
        }
    } else {
        None
    }
}

/// Serializes a [`MultiPolygon`] back to `GeoJSON` text for
/// `ST_GeomFromGeoJSON`.
///
/// # Errors
///
/// Returns a `serde_json` error if serialization fails.
pub fn to_geojson_string(mp: &MultiPolygon<f64>) -> Result<String, serde_json::Error> {
    let geometry = geojson::Geometry::new(geojson::Value::from(mp));
    serde_json::to_string(&geometry)
}

/// Standard geometric validity predicate (OGC simple-feature rules).
#[must_use]
pub fn is_valid(mp: &MultiPolygon<f64>) -> bool {
    mp.is_valid()
}

/// Centroid as (lon, lat). Degenerate geometries yield (0, 0).
#[must_use]
pub fn centroid_lon_lat(mp: &MultiPolygon<f64>) -> (f64, f64) {
    mp.centroid().map_or((0.0, 0.0), |p| (p.x(), p.y()))
}

/// Approximate surface area in square meters.
///
/// Uses the Chamberlain-Duquette spherical excess formula, the
/// equal-area-ish measure for lon/lat polygons.
#[must_use]
pub fn area_square_meters(mp: &MultiPolygon<f64>) -> f64 {
    mp.chamberlain_duquette_unsigned_area()
}

/// Whether the geometry intersects the metro's lon/lat extent.
#[must_use]
pub fn intersects_extent(mp: &MultiPolygon<f64>, extent: &MetroExtent) -> bool {
    let rect = Rect::new(
        coord! { x: extent.west, y: extent.south },
        coord! { x: extent.east, y: extent.north },
    );
    mp.intersects(&rect)
}
