//! Dataset reading.
//!
//! A boundary dataset is a `GeoJSON` `FeatureCollection` file: an
//! ordered sequence of features, each with named properties and a
//! geometry. A missing file or a bad layer index is fatal and is
//! reported before any database activity.

use std::path::Path;

use geojson::{Feature, GeoJson};

use crate::BoundaryError;

/// Reads the features of one dataset layer.
///
/// `GeoJSON` files have exactly one layer, so any `layer_index` other
/// than 0 is a configuration error.
///
/// # Errors
///
/// Returns [`BoundaryError`] if the file is missing, the layer index is
/// out of range, or the content is not a `FeatureCollection`.
pub fn read_layer(path: &Path, layer_index: u32) -> Result<Vec<Feature>, BoundaryError> {
    if !path.exists() {
        return Err(BoundaryError::DatasetNotFound {
            path: path.display().to_string(),
        });
    }
    if layer_index != 0 {
        return Err(BoundaryError::NoSuchLayer { index: layer_index });
    }

    let content = std::fs::read_to_string(path)?;
    parse_features(&content)
}

/// Parses `GeoJSON` text into an ordered feature list.
fn parse_features(content: &str) -> Result<Vec<Feature>, BoundaryError> {
    let geojson: GeoJson = content.parse()?;
    match geojson {
        GeoJson::FeatureCollection(fc) => Ok(fc.features),
        other => Err(BoundaryError::Dataset {
            message: format!(
                "expected a FeatureCollection, got {}",
                match other {
                    GeoJson::Geometry(_) => "a bare geometry",
                    GeoJson::Feature(_) => "a single feature",
                    GeoJson::FeatureCollection(_) => unreachable!(),
                }
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_feature_collection() {
        let content = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "name": "Back Bay" },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]
                    }
                }
            ]
        }"#;

        let features = parse_features(content).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(
            features[0]
                .properties
                .as_ref()
                .and_then(|p| p.get("name"))
                .and_then(serde_json::Value::as_str),
            Some("Back Bay")
        );
    }

    #[test]
    fn rejects_bare_geometry() {
        let content = r#"{"type": "Point", "coordinates": [0.0, 0.0]}"#;
        assert!(matches!(
            parse_features(content),
            Err(BoundaryError::Dataset { .. })
        ));
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = read_layer(Path::new("/nonexistent/boundaries.geojson"), 0).unwrap_err();
        assert!(matches!(err, BoundaryError::DatasetNotFound { .. }));
    }

    #[test]
    fn nonzero_layer_index_is_fatal() {
        // The existence check runs first, so use a path that exists.
        let err = read_layer(Path::new("Cargo.toml"), 1).unwrap_err();
        assert!(matches!(err, BoundaryError::NoSuchLayer { index: 1 }));
    }
}
