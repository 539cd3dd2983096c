#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the boundary import tool.

use std::path::PathBuf;
use std::time::Instant;

use blockpress_boundary::{dataset, importer::LocationImporter, metro};
use blockpress_boundary_models::ImportOptions;
use blockpress_database::{db, queries, run_migrations};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "blockpress_ingest", about = "Boundary dataset import tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import boundaries from a GeoJSON dataset into a location type
    Locations {
        /// Slug of the location type to import into (e.g., "neighborhoods")
        type_slug: String,
        /// Path to the GeoJSON dataset
        path: PathBuf,
        /// Feature property holding each boundary's name
        #[arg(long, default_value = "name")]
        name_field: String,
        /// Layer index within the dataset (only layer 0 exists for GeoJSON)
        #[arg(long, default_value = "0")]
        layer_index: u32,
        /// Provenance label stored on each imported boundary
        #[arg(long, default_value = "UNKNOWN")]
        source: String,
        /// Log each created or matched boundary
        #[arg(long, short)]
        verbose: bool,
        /// Skip boundaries that fall outside the metro extent
        #[arg(long)]
        filter_bounds: bool,
        /// Display name to create the location type with if it does not
        /// exist (e.g., "Neighborhood")
        #[arg(long)]
        type_name: Option<String>,
        /// Plural display name for a newly created location type
        #[arg(long)]
        type_name_plural: Option<String>,
    },
    /// Run database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate => {
            log::info!("Running database migrations...");
            let db = db::connect_from_env().await?;
            run_migrations(db.as_ref()).await?;
            log::info!("Migrations complete.");
        }
        Commands::Locations {
            type_slug,
            path,
            name_field,
            layer_index,
            source,
            verbose,
            filter_bounds,
            type_name,
            type_name_plural,
        } => {
            // Read and validate the dataset before touching the database
            // so a bad path fails fast.
            let features = dataset::read_layer(&path, layer_index)?;
            log::info!("Read {} feature(s) from {}", features.len(), path.display());

            let metro = metro::load_metro()?;

            let db = db::connect_from_env().await?;
            run_migrations(db.as_ref()).await?;

            let location_type = match queries::get_location_type(db.as_ref(), &type_slug).await? {
                Some(lt) => lt,
                None => {
                    let Some(name) = type_name else {
                        return Err(format!(
                            "Unknown location type: {type_slug} (pass --type-name to create it)"
                        )
                        .into());
                    };
                    let plural = type_name_plural.unwrap_or_else(|| format!("{name}s"));
                    log::info!("Creating location type {type_slug} ({name} / {plural})");
                    queries::get_or_create_location_type(
                        db.as_ref(),
                        &type_slug,
                        &name,
                        &plural,
                        &metro.city_label(),
                    )
                    .await?
                }
            };

            let plural_name = location_type.plural_name.clone();
            let importer = LocationImporter::new(
                &metro,
                location_type,
                ImportOptions {
                    name_field,
                    source,
                    verbose,
                    filter_bounds,
                },
            );

            let start = Instant::now();
            let candidates = importer.prepare_candidates(&features)?;
            let created = importer.save(db.as_ref(), candidates).await?;

            let elapsed = start.elapsed();
            log::info!(
                "Created {created} {plural_name} in {:.1}s",
                elapsed.as_secs_f64()
            );
        }
    }

    Ok(())
}
