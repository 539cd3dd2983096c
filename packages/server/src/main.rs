#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Binary entry point for the blockpress API server.

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use blockpress_database::{db, run_migrations};
use blockpress_server::{AppState, flags::DbSchemaFlags, handlers};
use std::sync::Arc;
use switchy_database::Database;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    log::info!("Connecting to database...");
    let db_conn = db::connect_from_env()
        .await
        .expect("Failed to connect to database");

    log::info!("Running migrations...");
    run_migrations(db_conn.as_ref())
        .await
        .expect("Failed to run migrations");

    let db: Arc<dyn Database> = Arc::from(db_conn);
    let state = web::Data::new(AppState {
        flags: Arc::new(DbSchemaFlags::new(Arc::clone(&db))),
        db,
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .route("/locations.json", web::get().to(handlers::locations_json))
                    .route(
                        "/locations/{loctype}/{slug}.json",
                        web::get().to(handlers::location_detail_json),
                    )
                    .route(
                        "/location-types.json",
                        web::get().to(handlers::location_types_json),
                    )
                    .route("/items.json", web::get().to(handlers::items_json))
                    .route("/items.atom", web::get().to(handlers::items_atom))
                    .route("/items/{id}/editable", web::get().to(handlers::item_editable))
                    .route("/geocode", web::get().to(handlers::geocode))
                    .route(
                        "/newsitem-types.json",
                        web::get().to(handlers::newsitem_types_json),
                    ),
            )
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
