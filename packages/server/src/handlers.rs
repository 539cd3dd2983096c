//! HTTP handler functions for the blockpress API.

use actix_web::{HttpRequest, HttpResponse, web};
use blockpress_boundary::text;
use blockpress_database::{items, queries};
use blockpress_database_models::{ItemQuery, LocationRow, NewsItemRow};
use blockpress_server_models::{
    ApiHealth, ApiLocation, ApiLocationType, GeocodeParams, ItemQueryParams, JsonpParams,
};

use crate::AppState;
use crate::guards::{self, GuardOutcome, NewsItemRef};
use crate::jsonp::{self, ATOM_CONTENT_TYPE, JSON_CONTENT_TYPE};

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/locations.json`
///
/// Lists public boundaries ordered by `display_order`.
pub async fn locations_json(
    state: web::Data<AppState>,
    params: web::Query<JsonpParams>,
) -> HttpResponse {
    match queries::list_public_locations(state.db.as_ref()).await {
        Ok(rows) => {
            let locations: Vec<ApiLocation> = rows.into_iter().map(ApiLocation::from).collect();
            let body = serde_json::to_string(&locations).unwrap_or_else(|_| "[]".to_string());
            jsonp::api_get_response(params.jsonp.as_deref(), body, JSON_CONTENT_TYPE)
        }
        Err(e) => {
            log::error!("Failed to query locations: {e}");
            internal_error("Failed to query locations")
        }
    }
}

/// `GET /api/locations/{loctype}/{slug}.json`
///
/// One boundary as a `GeoJSON` Feature, geometry included.
pub async fn location_detail_json(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    params: web::Query<JsonpParams>,
) -> HttpResponse {
    let (loctype, slug) = path.into_inner();

    match queries::get_location_detail(state.db.as_ref(), &loctype, &slug).await {
        Ok(Some(row)) => {
            let body = location_feature(&row).to_string();
            jsonp::api_get_response(params.jsonp.as_deref(), body, JSON_CONTENT_TYPE)
        }
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("No such location {loctype}/{slug}")
        })),
        Err(e) => {
            log::error!("Failed to query location {loctype}/{slug}: {e}");
            internal_error("Failed to query location")
        }
    }
}

/// `GET /api/location-types.json`
///
/// Boundary type catalog keyed by slug.
pub async fn location_types_json(
    state: web::Data<AppState>,
    params: web::Query<JsonpParams>,
) -> HttpResponse {
    match queries::list_location_types(state.db.as_ref()).await {
        Ok(rows) => {
            let mut catalog = serde_json::Map::new();
            for row in rows {
                catalog.insert(
                    row.slug.clone(),
                    serde_json::to_value(ApiLocationType {
                        name: row.name,
                        plural_name: row.plural_name,
                        scope: row.scope,
                    })
                    .unwrap_or(serde_json::Value::Null),
                );
            }
            let body = serde_json::Value::Object(catalog).to_string();
            jsonp::api_get_response(params.jsonp.as_deref(), body, JSON_CONTENT_TYPE)
        }
        Err(e) => {
            log::error!("Failed to query location types: {e}");
            internal_error("Failed to query location types")
        }
    }
}

/// `GET /api/items.json`
///
/// News items as a `GeoJSON` FeatureCollection. A `type` filter naming
/// a disabled schema 404s rather than leaking its existence.
pub async fn items_json(
    state: web::Data<AppState>,
    params: web::Query<ItemQueryParams>,
) -> HttpResponse {
    match fetch_items(&state, &params).await {
        Ok(Some(rows)) => {
            let body = items_feature_collection(&rows).to_string();
            jsonp::api_get_response(params.jsonp.as_deref(), body, JSON_CONTENT_TYPE)
        }
        Ok(None) => HttpResponse::NotFound().finish(),
        Err(e) => {
            log::error!("Failed to query items: {e}");
            internal_error("Failed to query items")
        }
    }
}

/// `GET /api/items.atom`
pub async fn items_atom(
    state: web::Data<AppState>,
    params: web::Query<ItemQueryParams>,
) -> HttpResponse {
    match fetch_items(&state, &params).await {
        Ok(Some(rows)) => {
            let updated = rows.first().map_or_else(chrono::Utc::now, |r| r.pub_date);
            let body = crate::atom::render_feed("News items", "tag:blockpress:items", updated, &rows);
            jsonp::api_get_response(params.jsonp.as_deref(), body, ATOM_CONTENT_TYPE)
        }
        Ok(None) => HttpResponse::NotFound().finish(),
        Err(e) => {
            log::error!("Failed to query items: {e}");
            internal_error("Failed to query items")
        }
    }
}

/// `GET /api/geocode?q=...`
///
/// Boundary lookup by normalized name. Ambiguous names yield multiple
/// features; unresolvable names yield an empty collection.
pub async fn geocode(state: web::Data<AppState>, params: web::Query<GeocodeParams>) -> HttpResponse {
    let query = params.q.as_deref().unwrap_or("").trim();

    let features = if query.is_empty() {
        Vec::new()
    } else {
        let normalized = text::normalize(query);
        match queries::find_locations_by_normalized_name(state.db.as_ref(), &normalized).await {
            Ok(rows) => rows
                .iter()
                .map(|row| {
                    serde_json::json!({
                        "type": "Feature",
                        "geometry": {
                            "type": "Point",
                            "coordinates": [row.centroid_lon, row.centroid_lat],
                        },
                        "properties": {
                            "type": row.location_type_slug,
                            "name": row.name,
                            "city": row.city,
                            "query": query,
                        }
                    })
                })
                .collect(),
            Err(e) => {
                log::error!("Failed to geocode {query}: {e}");
                return internal_error("Failed to geocode");
            }
        }
    };

    let body = serde_json::json!({
        "type": "FeatureCollection",
        "features": features,
    })
    .to_string();
    jsonp::api_get_response(params.jsonp.as_deref(), body, JSON_CONTENT_TYPE)
}

/// `GET /api/newsitem-types.json`
///
/// Public schema catalog with field metadata.
pub async fn newsitem_types_json(
    state: web::Data<AppState>,
    params: web::Query<JsonpParams>,
) -> HttpResponse {
    let schemas = match items::list_public_schemas(state.db.as_ref()).await {
        Ok(schemas) => schemas,
        Err(e) => {
            log::error!("Failed to query schemas: {e}");
            return internal_error("Failed to query schemas");
        }
    };

    let mut catalog = serde_json::Map::new();
    for schema in schemas {
        let fields = match items::list_schema_fields(state.db.as_ref(), schema.id).await {
            Ok(fields) => fields,
            Err(e) => {
                log::error!("Failed to query fields for {}: {e}", schema.slug);
                return internal_error("Failed to query schema fields");
            }
        };

        let mut attributes = serde_json::Map::new();
        for field in fields {
            // Lookup fields and varchar both surface as plain text.
            let fieldtype = if field.is_lookup || field.datatype == "varchar" {
                "text".to_string()
            } else {
                field.datatype
            };
            attributes.insert(
                field.slug,
                serde_json::json!({
                    "pretty_name": field.pretty_name,
                    "type": fieldtype,
                }),
            );
        }

        catalog.insert(
            schema.slug.clone(),
            serde_json::json!({
                "indefinite_article": schema.indefinite_article,
                "last_updated": schema.last_updated.format("%Y-%m-%d").to_string(),
                "name": schema.name,
                "plural_name": schema.plural_name,
                "slug": schema.slug,
                "attributes": attributes,
            }),
        );
    }

    let body = serde_json::Value::Object(catalog).to_string();
    jsonp::api_get_response(params.jsonp.as_deref(), body, JSON_CONTENT_TYPE)
}

/// `GET /api/items/{id}/editable`
///
/// Guard-gated probe the frontend uses to decide whether to offer
/// editing. 404 when the item is missing or its schema is disabled,
/// 403 for callers without edit rights.
pub async fn item_editable(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    req: HttpRequest,
) -> HttpResponse {
    let item_id = path.into_inner();

    let item = match items::get_item(state.db.as_ref(), item_id).await {
        Ok(Some(item)) => item,
        Ok(None) => return HttpResponse::NotFound().finish(),
        Err(e) => {
            log::error!("Failed to load item {item_id}: {e}");
            return internal_error("Failed to load item");
        }
    };

    if guards::schema_enabled_guard(state.flags.as_ref(), &item.schema_slug).await
        == GuardOutcome::NotFound
    {
        return HttpResponse::NotFound().finish();
    }

    let user_id = req
        .headers()
        .get("X-User-Id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok());

    match guards::edit_guard(state.db.as_ref(), user_id, &NewsItemRef::Item(item)).await {
        Ok(GuardOutcome::Proceed) => {
            HttpResponse::Ok().json(serde_json::json!({ "editable": true }))
        }
        Ok(_) => HttpResponse::Forbidden().finish(),
        Err(e) => {
            log::error!("Failed to evaluate edit guard for item {item_id}: {e}");
            internal_error("Failed to evaluate permissions")
        }
    }
}

/// Runs the shared item query, returning `None` when a `type` filter
/// names a disabled schema.
async fn fetch_items(
    state: &web::Data<AppState>,
    params: &ItemQueryParams,
) -> Result<Option<Vec<NewsItemRow>>, blockpress_database::DbError> {
    if let Some(slug) = params.schema_type.as_deref() {
        if guards::schema_enabled_guard(state.flags.as_ref(), slug).await == GuardOutcome::NotFound
        {
            return Ok(None);
        }
    }

    let query = ItemQuery {
        schema_slug: params.schema_type.clone(),
        limit: params.limit.unwrap_or(100),
        offset: params.offset.unwrap_or(0),
    };

    items::query_items(state.db.as_ref(), &query).await.map(Some)
}

/// Builds the `GeoJSON` FeatureCollection for the items endpoint.
/// Items without a location are omitted.
fn items_feature_collection(rows: &[NewsItemRow]) -> serde_json::Value {
    let features: Vec<serde_json::Value> = rows
        .iter()
        .filter_map(|row| {
            let geojson = row.location_geojson.as_deref()?;
            let geometry: serde_json::Value = serde_json::from_str(geojson).ok()?;
            Some(serde_json::json!({
                "type": "Feature",
                "geometry": geometry,
                "properties": {
                    "type": row.schema_slug,
                    "title": row.title,
                    "description": row.description,
                    "url": row.url,
                    "pub_date": row.pub_date.format("%Y-%m-%d").to_string(),
                }
            }))
        })
        .collect();

    serde_json::json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

/// Builds the `GeoJSON` Feature body for the location detail endpoint.
fn location_feature(row: &LocationRow) -> serde_json::Value {
    let geometry: serde_json::Value = row
        .geojson
        .as_deref()
        .and_then(|g| serde_json::from_str(g).ok())
        .unwrap_or(serde_json::Value::Null);

    serde_json::json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": {
            "type": row.location_type_slug,
            "slug": row.slug,
            "source": row.source,
            "centroid": format!("POINT({} {})", row.centroid_lon, row.centroid_lat),
            "area": row.area,
            "city": row.city,
            "name": row.name,
        }
    })
}

fn internal_error(message: &str) -> HttpResponse {
    HttpResponse::InternalServerError().json(serde_json::json!({ "error": message }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    fn item(id: i64, geojson: Option<&str>) -> NewsItemRow {
        NewsItemRow {
            id,
            schema_id: 1,
            schema_slug: "police-reports".to_string(),
            title: format!("Item {id}"),
            description: "desc".to_string(),
            url: String::new(),
            pub_date: chrono::Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap(),
            location_geojson: geojson.map(str::to_string),
        }
    }

    #[test]
    fn feature_collection_skips_unlocated_items() {
        let rows = vec![
            item(1, Some(r#"{"type":"Point","coordinates":[1.0,2.0]}"#)),
            item(2, None),
        ];

        let collection = items_feature_collection(&rows);
        assert_eq!(collection["type"], "FeatureCollection");
        let features = collection["features"].as_array().unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["properties"]["title"], "Item 1");
        assert_eq!(features[0]["geometry"]["type"], "Point");
    }

    #[test]
    fn location_feature_carries_wkt_centroid() {
        let row = LocationRow {
            id: 1,
            name: "Back Bay".to_string(),
            normalized_name: "BACK BAY".to_string(),
            slug: "back-bay".to_string(),
            location_type_id: 1,
            location_type_slug: "neighborhoods".to_string(),
            city: "BOSTON".to_string(),
            source: "UNKNOWN".to_string(),
            area: 123.0,
            centroid_lon: -71.08,
            centroid_lat: 42.35,
            is_public: true,
            display_order: 0,
            geojson: Some(r#"{"type":"MultiPolygon","coordinates":[]}"#.to_string()),
        };

        let feature = location_feature(&row);
        assert_eq!(feature["properties"]["centroid"], "POINT(-71.08 42.35)");
        assert_eq!(feature["properties"]["type"], "neighborhoods");
        assert_eq!(feature["geometry"]["type"], "MultiPolygon");
    }
}
