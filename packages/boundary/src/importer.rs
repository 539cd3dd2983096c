//! Boundary importer.
//!
//! Turns dataset features into persisted location rows. The preparation
//! stage is pure: it derives every field, applies the optional metro
//! extent filter, and assigns `display_order` by stable name sort. The
//! save stage runs the database work: one zero-width-buffer repair
//! attempt for invalid geometries, a full-field create-or-fetch per
//! candidate, the single slug-disambiguation retry on conflict, and a
//! synchronous association backfill per boundary.

use async_trait::async_trait;
use blockpress_boundary_models::{ImportOptions, LocationCandidate, Metro, MetroExtent};
use blockpress_database::queries::{self, CreateOutcome};
use blockpress_database_models::LocationTypeRow;
use geojson::Feature;
use switchy_database::Database;

use crate::{BoundaryError, backfill, geometry, text};

/// Query primitives the create-or-fetch decision runs against.
///
/// The production implementation targets the database; the conflict
/// handling itself is pure control flow over these three answers.
#[async_trait]
trait LocationStore: Send + Sync {
    /// Full-field match for the candidate under its current slug.
    async fn find_matching(
        &self,
        candidate: &LocationCandidate,
    ) -> Result<Option<i32>, BoundaryError>;

    /// Conflict-aware insert under the candidate's current slug.
    async fn insert(&self, candidate: &LocationCandidate) -> Result<CreateOutcome, BoundaryError>;

    /// Number of rows already holding the slug.
    async fn count_with_slug(&self, slug: &str) -> Result<i64, BoundaryError>;
}

struct DbLocationStore<'a> {
    db: &'a dyn Database,
    location_type_id: i32,
    city: &'a str,
    source: &'a str,
}

#[async_trait]
impl LocationStore for DbLocationStore<'_> {
    async fn find_matching(
        &self,
        candidate: &LocationCandidate,
    ) -> Result<Option<i32>, BoundaryError> {
        Ok(queries::find_matching_location(
            self.db,
            candidate,
            self.location_type_id,
            self.city,
            self.source,
        )
        .await?)
    }

    async fn insert(&self, candidate: &LocationCandidate) -> Result<CreateOutcome, BoundaryError> {
        Ok(queries::insert_location(
            self.db,
            candidate,
            &candidate.slug,
            self.location_type_id,
            self.city,
            self.source,
            chrono::Utc::now(),
        )
        .await?)
    }

    async fn count_with_slug(&self, slug: &str) -> Result<i64, BoundaryError> {
        Ok(queries::count_locations_with_slug(self.db, slug).await?)
    }
}

/// Imports boundary features for one location type.
pub struct LocationImporter {
    /// Uppercased metro name, stored as the `city` scope label.
    metro_name: String,
    extent: MetroExtent,
    location_type: LocationTypeRow,
    opts: ImportOptions,
}

impl LocationImporter {
    /// Creates an importer for the given metro, location type, and
    /// options.
    #[must_use]
    pub fn new(metro: &Metro, location_type: LocationTypeRow, opts: ImportOptions) -> Self {
        Self {
            metro_name: metro.city_label(),
            extent: metro.extent,
            location_type,
            opts,
        }
    }

    /// Prepares sorted candidates from raw dataset features.
    ///
    /// Pure except for logging: no database activity happens here.
    /// Features without a usable name or polygon geometry are skipped
    /// with a warning; features outside the metro extent are skipped
    /// when `filter_bounds` is set. Survivors are sorted by name
    /// (ascending, stable, so ties keep input order) and numbered
    /// 0..N-1 as `display_order`.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError`] if geometry serialization fails.
    pub fn prepare_candidates(
        &self,
        features: &[Feature],
    ) -> Result<Vec<LocationCandidate>, BoundaryError> {
        let mut candidates = Vec::with_capacity(features.len());

        for feature in features {
            let Some(name) = feature
                .properties
                .as_ref()
                .and_then(|props| props.get(&self.opts.name_field))
                .and_then(serde_json::Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
            else {
                log::warn!(
                    "Skipping feature without a '{}' property",
                    self.opts.name_field
                );
                continue;
            };

            let Some(mp) = geometry::feature_multipolygon(feature) else {
                log::warn!("Skipping {name}: no polygon geometry");
                continue;
            };

            if self.opts.filter_bounds && !geometry::intersects_extent(&mp, &self.extent) {
                if self.opts.verbose {
                    log::info!("Skipping {name}, out of bounds");
                }
                continue;
            }

            let geometry_valid = geometry::is_valid(&mp);
            let (centroid_lon, centroid_lat) = geometry::centroid_lon_lat(&mp);

            candidates.push(LocationCandidate {
                name: name.to_string(),
                normalized_name: text::normalize(name),
                slug: text::slugify(name),
                geometry_json: geometry::to_geojson_string(&mp)?,
                geometry_valid,
                centroid_lon,
                centroid_lat,
                area: geometry::area_square_meters(&mp),
                // Overwritten below once the sort order is known.
                display_order: 0,
            });
        }

        candidates.sort_by(|a, b| a.name.cmp(&b.name));
        for (i, candidate) in candidates.iter_mut().enumerate() {
            candidate.display_order = i32::try_from(i).unwrap_or(i32::MAX);
        }

        Ok(candidates)
    }

    /// Saves prepared candidates and back-fills associations.
    ///
    /// Returns the number of genuinely new boundary rows (existing rows
    /// matched by the full field set are reused, not counted). Each
    /// created-or-fetched boundary gets a synchronous backfill before
    /// the next candidate is processed; a failure mid-run leaves the
    /// already-committed boundaries in place.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError`] on database failure or when a slug
    /// stays in conflict after the single disambiguation retry.
    pub async fn save(
        &self,
        db: &dyn Database,
        candidates: Vec<LocationCandidate>,
    ) -> Result<u64, BoundaryError> {
        let mut num_created = 0u64;
        let store = DbLocationStore {
            db,
            location_type_id: self.location_type.id,
            city: &self.metro_name,
            source: &self.opts.source,
        };

        for mut candidate in candidates {
            if !candidate.geometry_valid {
                self.try_repair(db, &mut candidate).await?;
            }

            let (id, created) = self.create_or_fetch(&store, &candidate).await?;
            if created {
                num_created += 1;
            }
            if self.opts.verbose {
                log::info!(
                    "{} {} {}",
                    if created { "Created" } else { "Already had" },
                    self.location_type.name,
                    candidate.name
                );
                log::info!("Populating news item locations for {}...", candidate.name);
            }
            backfill::populate_news_item_locations(db, id, backfill::BATCH_SIZE).await?;
        }

        Ok(num_created)
    }

    /// One repair attempt via `PostGIS` `ST_Buffer(geom, 0)`.
    ///
    /// On success the candidate's geometry and derived measures are
    /// replaced; otherwise a warning is logged and the original
    /// geometry is stored as-is (best-effort, not a hard failure).
    async fn try_repair(
        &self,
        db: &dyn Database,
        candidate: &mut LocationCandidate,
    ) -> Result<(), BoundaryError> {
        let repaired = queries::repair_geometry(db, &candidate.geometry_json).await?;

        let repaired_mp = repaired
            .as_deref()
            .and_then(geometry::parse_multipolygon)
            .filter(geometry::is_valid);

        match repaired_mp {
            Some(mp) => {
                let (lon, lat) = geometry::centroid_lon_lat(&mp);
                candidate.geometry_json = geometry::to_geojson_string(&mp)?;
                candidate.centroid_lon = lon;
                candidate.centroid_lat = lat;
                candidate.area = geometry::area_square_meters(&mp);
                candidate.geometry_valid = true;
            }
            None => {
                log::warn!("Warning: invalid geometry: {}", candidate.name);
            }
        }
        Ok(())
    }

    /// Create-or-fetch keyed on the full business field set.
    ///
    /// Returns `(id, created)`. On a slug conflict, counts the rows
    /// holding the slug, re-slugs as `slug-<count+1>`, and retries
    /// exactly once; a second conflict aborts the run.
    async fn create_or_fetch(
        &self,
        store: &dyn LocationStore,
        candidate: &LocationCandidate,
    ) -> Result<(i32, bool), BoundaryError> {
        if let Some(id) = store.find_matching(candidate).await? {
            return Ok((id, false));
        }

        match store.insert(candidate).await? {
            CreateOutcome::Created(id) => Ok((id, true)),
            CreateOutcome::Conflict => {
                // Usually two towns with the same name. Count the rows
                // holding the slug and append a deterministic suffix.
                let existing = store.count_with_slug(&candidate.slug).await?;
                if existing == 0 {
                    // Conflict with no visible row: a concurrent run is
                    // mid-insert. Nothing deterministic to rename
                    // against, so give up.
                    return Err(BoundaryError::SlugConflict {
                        slug: candidate.slug.clone(),
                    });
                }

                let munged = text::slugify(&format!("{}-{}", candidate.slug, existing + 1));
                if self.opts.verbose {
                    log::info!(
                        "Munged slug {} to {munged} to make it unique",
                        candidate.slug
                    );
                }

                let mut retry = candidate.clone();
                retry.slug = munged.clone();
                if let Some(id) = store.find_matching(&retry).await? {
                    return Ok((id, false));
                }
                match store.insert(&retry).await? {
                    CreateOutcome::Created(id) => Ok((id, true)),
                    CreateOutcome::Conflict => Err(BoundaryError::SlugConflict { slug: munged }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockpress_boundary_models::MetroExtent;

    fn test_metro() -> Metro {
        Metro {
            metro_name: "Boston".to_string(),
            extent: MetroExtent::new(-1.0, -1.0, 1.0, 1.0),
        }
    }

    fn test_type() -> LocationTypeRow {
        LocationTypeRow {
            id: 1,
            name: "Neighborhood".to_string(),
            plural_name: "Neighborhoods".to_string(),
            scope: "BOSTON".to_string(),
            slug: "neighborhoods".to_string(),
            is_browsable: true,
            is_significant: true,
        }
    }

    fn polygon_feature(name: &str, x0: f64, y0: f64) -> Feature {
        let geojson_str = format!(
            r#"{{
                "type": "Feature",
                "properties": {{ "name": "{name}" }},
                "geometry": {{
                    "type": "Polygon",
                    "coordinates": [[[{x0}, {y0}], [{x1}, {y0}], [{x1}, {y1}], [{x0}, {y1}], [{x0}, {y0}]]]
                }}
            }}"#,
            x1 = x0 + 0.1,
            y1 = y0 + 0.1,
        );
        geojson_str.parse().unwrap()
    }

    fn bowtie_feature(name: &str) -> Feature {
        format!(
            r#"{{
                "type": "Feature",
                "properties": {{ "name": "{name}" }},
                "geometry": {{
                    "type": "Polygon",
                    "coordinates": [[[0.0, 0.0], [0.2, 0.2], [0.2, 0.0], [0.0, 0.2], [0.0, 0.0]]]
                }}
            }}"#
        )
        .parse()
        .unwrap()
    }

    fn importer(opts: ImportOptions) -> LocationImporter {
        LocationImporter::new(&test_metro(), test_type(), opts)
    }

    #[test]
    fn display_order_follows_name_sort() {
        let imp = importer(ImportOptions::default());
        let features = vec![
            polygon_feature("Charlestown", 0.0, 0.0),
            polygon_feature("Allston", 0.2, 0.0),
            polygon_feature("Back Bay", 0.4, 0.0),
        ];

        let candidates = imp.prepare_candidates(&features).unwrap();
        let names: Vec<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Allston", "Back Bay", "Charlestown"]);
        let orders: Vec<i32> = candidates.iter().map(|c| c.display_order).collect();
        assert_eq!(orders, [0, 1, 2]);
    }

    #[test]
    fn name_sort_is_stable_for_ties() {
        let imp = importer(ImportOptions::default());
        let features = vec![
            polygon_feature("Downtown", 0.0, 0.0),
            polygon_feature("Downtown", 0.5, 0.5),
        ];

        let candidates = imp.prepare_candidates(&features).unwrap();
        assert_eq!(candidates.len(), 2);
        // Input order preserved: the first feature sits at (0, 0).
        assert!((candidates[0].centroid_lon - 0.05).abs() < 1e-9);
        assert!((candidates[1].centroid_lon - 0.55).abs() < 1e-9);
        assert_eq!(candidates[0].display_order, 0);
        assert_eq!(candidates[1].display_order, 1);
    }

    #[test]
    fn derives_normalized_name_and_slug() {
        let imp = importer(ImportOptions::default());
        let features = vec![polygon_feature("Back Bay", 0.0, 0.0)];

        let candidates = imp.prepare_candidates(&features).unwrap();
        assert_eq!(candidates[0].normalized_name, "BACK BAY");
        assert_eq!(candidates[0].slug, "back-bay");
        assert!(candidates[0].geometry_valid);
        assert!(candidates[0].area > 0.0);
    }

    #[test]
    fn filter_bounds_excludes_out_of_extent_features() {
        let imp = importer(ImportOptions {
            filter_bounds: true,
            ..ImportOptions::default()
        });
        let features = vec![
            polygon_feature("Inside", 0.0, 0.0),
            polygon_feature("Far Away", 10.0, 10.0),
        ];

        let candidates = imp.prepare_candidates(&features).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "Inside");
    }

    #[test]
    fn without_filter_bounds_everything_survives() {
        let imp = importer(ImportOptions::default());
        let features = vec![
            polygon_feature("Inside", 0.0, 0.0),
            polygon_feature("Far Away", 10.0, 10.0),
        ];

        assert_eq!(imp.prepare_candidates(&features).unwrap().len(), 2);
    }

    #[test]
    fn invalid_geometry_is_flagged_not_dropped() {
        let imp = importer(ImportOptions::default());
        let features = vec![bowtie_feature("Twisted")];

        let candidates = imp.prepare_candidates(&features).unwrap();
        assert_eq!(candidates.len(), 1);
        assert!(!candidates[0].geometry_valid);
    }

    #[test]
    fn skips_features_without_name_or_polygon() {
        let imp = importer(ImportOptions::default());
        let unnamed: Feature = r#"{
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [0.1, 0.0], [0.1, 0.1], [0.0, 0.1], [0.0, 0.0]]]
            }
        }"#
        .parse()
        .unwrap();
        let point: Feature = r#"{
            "type": "Feature",
            "properties": { "name": "Just A Point" },
            "geometry": { "type": "Point", "coordinates": [0.0, 0.0] }
        }"#
        .parse()
        .unwrap();

        let candidates = imp
            .prepare_candidates(&[unnamed, point, polygon_feature("Kept", 0.0, 0.0)])
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "Kept");
    }

    #[test]
    fn respects_custom_name_field() {
        let imp = importer(ImportOptions {
            name_field: "NBHD_NAME".to_string(),
            ..ImportOptions::default()
        });
        let feature: Feature = r#"{
            "type": "Feature",
            "properties": { "NBHD_NAME": "Roxbury" },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [0.1, 0.0], [0.1, 0.1], [0.0, 0.1], [0.0, 0.0]]]
            }
        }"#
        .parse()
        .unwrap();

        let candidates = imp.prepare_candidates(&[feature]).unwrap();
        assert_eq!(candidates[0].name, "Roxbury");
    }

    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::Mutex;

    /// Scripted store: `matches` answers the full-field lookup,
    /// `conflicts` makes inserts under those slugs collide, and
    /// `slug_counts` feeds the disambiguation census. Attempted insert
    /// slugs are recorded in order.
    struct StubStore {
        matches: BTreeMap<String, i32>,
        conflicts: BTreeSet<String>,
        slug_counts: BTreeMap<String, i64>,
        inserts: Mutex<Vec<String>>,
    }

    impl StubStore {
        fn new() -> Self {
            Self {
                matches: BTreeMap::new(),
                conflicts: BTreeSet::new(),
                slug_counts: BTreeMap::new(),
                inserts: Mutex::new(Vec::new()),
            }
        }

        fn conflicting(mut self, slug: &str, existing: i64) -> Self {
            self.conflicts.insert(slug.to_string());
            self.slug_counts.insert(slug.to_string(), existing);
            self
        }

        fn matching(mut self, slug: &str, id: i32) -> Self {
            self.matches.insert(slug.to_string(), id);
            self
        }

        fn attempted_slugs(&self) -> Vec<String> {
            self.inserts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LocationStore for StubStore {
        async fn find_matching(
            &self,
            candidate: &LocationCandidate,
        ) -> Result<Option<i32>, BoundaryError> {
            Ok(self.matches.get(&candidate.slug).copied())
        }

        async fn insert(
            &self,
            candidate: &LocationCandidate,
        ) -> Result<CreateOutcome, BoundaryError> {
            self.inserts.lock().unwrap().push(candidate.slug.clone());
            if self.conflicts.contains(&candidate.slug) {
                Ok(CreateOutcome::Conflict)
            } else {
                Ok(CreateOutcome::Created(99))
            }
        }

        async fn count_with_slug(&self, slug: &str) -> Result<i64, BoundaryError> {
            Ok(self.slug_counts.get(slug).copied().unwrap_or(0))
        }
    }

    fn candidate(slug: &str) -> LocationCandidate {
        LocationCandidate {
            name: "Downtown".to_string(),
            normalized_name: "DOWNTOWN".to_string(),
            slug: slug.to_string(),
            geometry_json: r#"{"type":"MultiPolygon","coordinates":[]}"#.to_string(),
            geometry_valid: true,
            centroid_lon: 0.0,
            centroid_lat: 0.0,
            area: 1.0,
            display_order: 0,
        }
    }

    #[tokio::test]
    async fn unchanged_re_import_reuses_matching_row() {
        let imp = importer(ImportOptions::default());
        let store = StubStore::new().matching("downtown", 3);

        let (id, created) = imp
            .create_or_fetch(&store, &candidate("downtown"))
            .await
            .unwrap();
        assert_eq!(id, 3);
        assert!(!created);
        assert!(store.attempted_slugs().is_empty());
    }

    #[tokio::test]
    async fn slug_conflict_munges_once_and_retries() {
        let imp = importer(ImportOptions::default());
        let store = StubStore::new().conflicting("downtown", 1);

        let (id, created) = imp
            .create_or_fetch(&store, &candidate("downtown"))
            .await
            .unwrap();
        assert_eq!(id, 99);
        assert!(created);
        assert_eq!(store.attempted_slugs(), ["downtown", "downtown-2"]);
    }

    #[tokio::test]
    async fn re_import_after_munge_matches_suffixed_row() {
        let imp = importer(ImportOptions::default());
        let store = StubStore::new()
            .conflicting("downtown", 1)
            .matching("downtown-2", 7);

        let (id, created) = imp
            .create_or_fetch(&store, &candidate("downtown"))
            .await
            .unwrap();
        assert_eq!(id, 7);
        assert!(!created);
        // The suffixed row is matched, not re-inserted.
        assert_eq!(store.attempted_slugs(), ["downtown"]);
    }

    #[tokio::test]
    async fn second_conflict_aborts_the_run() {
        let imp = importer(ImportOptions::default());
        let store = StubStore::new()
            .conflicting("downtown", 1)
            .conflicting("downtown-2", 1);

        let err = imp
            .create_or_fetch(&store, &candidate("downtown"))
            .await
            .unwrap_err();
        assert!(matches!(err, BoundaryError::SlugConflict { slug } if slug == "downtown-2"));
        assert_eq!(store.attempted_slugs(), ["downtown", "downtown-2"]);
    }

    #[tokio::test]
    async fn conflict_without_counted_rows_aborts() {
        let imp = importer(ImportOptions::default());
        let store = StubStore::new().conflicting("downtown", 0);

        let err = imp
            .create_or_fetch(&store, &candidate("downtown"))
            .await
            .unwrap_err();
        assert!(matches!(err, BoundaryError::SlugConflict { slug } if slug == "downtown"));
    }

    #[tokio::test]
    async fn suffix_follows_existing_slug_count() {
        let imp = importer(ImportOptions::default());
        let store = StubStore::new().conflicting("downtown", 2);

        let (_, created) = imp
            .create_or_fetch(&store, &candidate("downtown"))
            .await
            .unwrap();
        assert!(created);
        assert_eq!(store.attempted_slugs(), ["downtown", "downtown-3"]);
    }
}
