//! Database query functions for news items and their schemas.

use blockpress_database_models::{ItemQuery, NewsItemRow, SchemaFieldRow, SchemaRow};
use chrono::{DateTime, NaiveDateTime, Utc};
use moosicbox_json_utils::database::ToValue as _;
use std::fmt::Write as _;
use switchy_database::{Database, DatabaseValue};

use crate::DbError;

/// Lists all public schemas ordered by slug.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn list_public_schemas(db: &dyn Database) -> Result<Vec<SchemaRow>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT id, slug, name, plural_name, indefinite_article, last_updated, is_public
             FROM schemas WHERE is_public = TRUE ORDER BY slug",
            &[],
        )
        .await?;

    Ok(rows.iter().map(schema_from_row).collect())
}

/// Returns whether a schema exists and is public.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn is_schema_public(db: &dyn Database, slug: &str) -> Result<bool, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT is_public FROM schemas WHERE slug = $1",
            &[DatabaseValue::String(slug.to_string())],
        )
        .await?;

    let Some(row) = rows.first() else {
        return Ok(false);
    };

    let is_public: bool = row.to_value("is_public").unwrap_or(false);
    Ok(is_public)
}

/// Lists the field definitions for one schema.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn list_schema_fields(
    db: &dyn Database,
    schema_id: i32,
) -> Result<Vec<SchemaFieldRow>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT schema_id, slug, pretty_name, datatype, is_lookup
             FROM schema_fields WHERE schema_id = $1 ORDER BY slug",
            &[DatabaseValue::Int32(schema_id)],
        )
        .await?;

    Ok(rows
        .iter()
        .map(|row| SchemaFieldRow {
            schema_id: row.to_value("schema_id").unwrap_or(0),
            slug: row.to_value("slug").unwrap_or_default(),
            pretty_name: row.to_value("pretty_name").unwrap_or_default(),
            datatype: row.to_value("datatype").unwrap_or_default(),
            is_lookup: row.to_value("is_lookup").unwrap_or(false),
        })
        .collect())
}

/// Queries news items of public schemas, newest first.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn query_items(db: &dyn Database, query: &ItemQuery) -> Result<Vec<NewsItemRow>, DbError> {
    let mut sql = String::from(
        "SELECT ni.id, ni.schema_id, s.slug as schema_slug, ni.title,
                ni.description, ni.url, ni.pub_date,
                ST_AsGeoJSON(ni.location::geometry) as location_geojson
         FROM news_items ni
         JOIN schemas s ON ni.schema_id = s.id
         WHERE s.is_public = TRUE",
    );

    let mut params: Vec<DatabaseValue> = Vec::new();
    let mut param_idx = 1u32;

    if let Some(slug) = &query.schema_slug {
        write!(sql, " AND s.slug = ${param_idx}").unwrap();
        params.push(DatabaseValue::String(slug.clone()));
        param_idx += 1;
    }

    sql.push_str(" ORDER BY ni.pub_date DESC, ni.id DESC");

    write!(sql, " LIMIT ${param_idx}").unwrap();
    params.push(DatabaseValue::Int64(i64::from(query.limit)));
    param_idx += 1;

    write!(sql, " OFFSET ${param_idx}").unwrap();
    params.push(DatabaseValue::Int64(i64::from(query.offset)));

    let rows = db.query_raw_params(&sql, &params).await?;

    Ok(rows.iter().map(news_item_from_row).collect())
}

/// Fetches one news item by id, regardless of schema visibility.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn get_item(db: &dyn Database, id: i64) -> Result<Option<NewsItemRow>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT ni.id, ni.schema_id, s.slug as schema_slug, ni.title,
                    ni.description, ni.url, ni.pub_date,
                    ST_AsGeoJSON(ni.location::geometry) as location_geojson
             FROM news_items ni
             JOIN schemas s ON ni.schema_id = s.id
             WHERE ni.id = $1",
            &[DatabaseValue::Int64(id)],
        )
        .await?;

    Ok(rows.first().map(news_item_from_row))
}

/// Returns whether the given user holds the admin flag.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn user_is_admin(db: &dyn Database, user_id: i64) -> Result<bool, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT is_admin FROM users WHERE id = $1",
            &[DatabaseValue::Int64(user_id)],
        )
        .await?;

    let Some(row) = rows.first() else {
        return Ok(false);
    };

    let is_admin: bool = row.to_value("is_admin").unwrap_or(false);
    Ok(is_admin)
}

/// Returns whether a creator row links the user to the news item.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn user_created_item(
    db: &dyn Database,
    user_id: i64,
    news_item_id: i64,
) -> Result<bool, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT COUNT(*) as count FROM news_item_creators
             WHERE news_item_id = $1 AND user_id = $2",
            &[
                DatabaseValue::Int64(news_item_id),
                DatabaseValue::Int64(user_id),
            ],
        )
        .await?;

    let Some(row) = rows.first() else {
        return Ok(false);
    };

    let count: i64 = row.to_value("count").unwrap_or(0);
    Ok(count > 0)
}

fn news_item_from_row(row: &switchy_database::Row) -> NewsItemRow {
    let pub_date_naive: NaiveDateTime = row.to_value("pub_date").unwrap_or_default();
    NewsItemRow {
        id: row.to_value("id").unwrap_or(0),
        schema_id: row.to_value("schema_id").unwrap_or(0),
        schema_slug: row.to_value("schema_slug").unwrap_or_default(),
        title: row.to_value("title").unwrap_or_default(),
        description: row.to_value("description").unwrap_or_default(),
        url: row.to_value("url").unwrap_or_default(),
        pub_date: DateTime::<Utc>::from_naive_utc_and_offset(pub_date_naive, Utc),
        location_geojson: row.to_value("location_geojson").unwrap_or(None),
    }
}

fn schema_from_row(row: &switchy_database::Row) -> SchemaRow {
    let last_updated_naive: NaiveDateTime = row.to_value("last_updated").unwrap_or_default();
    SchemaRow {
        id: row.to_value("id").unwrap_or(0),
        slug: row.to_value("slug").unwrap_or_default(),
        name: row.to_value("name").unwrap_or_default(),
        plural_name: row.to_value("plural_name").unwrap_or_default(),
        indefinite_article: row.to_value("indefinite_article").unwrap_or_default(),
        last_updated: DateTime::<Utc>::from_naive_utc_and_offset(last_updated_naive, Utc),
        is_public: row.to_value("is_public").unwrap_or(false),
    }
}
