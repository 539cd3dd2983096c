//! Pre-handler guards.
//!
//! Guards are explicit predicates evaluated before a handler runs,
//! each yielding either "proceed" or a terminal status. Handlers match
//! on the [`GuardOutcome`] and convert terminal outcomes to responses.

use blockpress_database::DbError;
use blockpress_database::items;
use blockpress_database_models::NewsItemRow;
use switchy_database::Database;

use crate::flags::SchemaFlags;

/// Result of evaluating a guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Continue to the handler.
    Proceed,
    /// Terminate with 404.
    NotFound,
    /// Terminate with 403.
    Forbidden,
}

/// A news item argument at a call boundary: callers hold either a bare
/// id or an already-loaded row.
#[derive(Debug, Clone)]
pub enum NewsItemRef {
    /// Reference by primary key.
    Id(i64),
    /// Reference by loaded row.
    Item(NewsItemRow),
}

impl NewsItemRef {
    /// The referenced news item's id.
    #[must_use]
    pub const fn id(&self) -> i64 {
        match self {
            Self::Id(id) => *id,
            Self::Item(item) => item.id,
        }
    }
}

impl From<i64> for NewsItemRef {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<NewsItemRow> for NewsItemRef {
    fn from(item: NewsItemRow) -> Self {
        Self::Item(item)
    }
}

/// 404-gates a handler on a schema feature flag.
pub async fn schema_enabled_guard(flags: &dyn SchemaFlags, slug: &str) -> GuardOutcome {
    if flags.is_schema_enabled(slug).await {
        GuardOutcome::Proceed
    } else {
        GuardOutcome::NotFound
    }
}

/// Whether the given user may edit the news item.
///
/// Anonymous callers are always denied; admins are always allowed;
/// otherwise a creator row must link the user to the item.
///
/// # Errors
///
/// Returns [`DbError`] if the database lookups fail.
pub async fn user_can_edit(
    db: &dyn Database,
    user_id: Option<i64>,
    item: &NewsItemRef,
) -> Result<bool, DbError> {
    let Some(user_id) = user_id else {
        return Ok(false);
    };

    if items::user_is_admin(db, user_id).await? {
        return Ok(true);
    }

    items::user_created_item(db, user_id, item.id()).await
}

/// 403-gates a handler on edit permission.
///
/// # Errors
///
/// Returns [`DbError`] if the database lookups fail.
pub async fn edit_guard(
    db: &dyn Database,
    user_id: Option<i64>,
    item: &NewsItemRef,
) -> Result<GuardOutcome, DbError> {
    if user_can_edit(db, user_id, item).await? {
        Ok(GuardOutcome::Proceed)
    } else {
        Ok(GuardOutcome::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::StaticSchemaFlags;
    use chrono::Utc;

    #[test]
    fn news_item_ref_resolves_ids() {
        assert_eq!(NewsItemRef::from(42).id(), 42);

        let item = NewsItemRow {
            id: 7,
            schema_id: 1,
            schema_slug: "neighbor-messages".to_string(),
            title: "t".to_string(),
            description: String::new(),
            url: String::new(),
            pub_date: Utc::now(),
            location_geojson: None,
        };
        assert_eq!(NewsItemRef::from(item).id(), 7);
    }

    #[actix_web::test]
    async fn disabled_schema_yields_not_found() {
        let flags = StaticSchemaFlags::new(["enabled-slug"]);
        assert_eq!(
            schema_enabled_guard(&flags, "enabled-slug").await,
            GuardOutcome::Proceed
        );
        assert_eq!(
            schema_enabled_guard(&flags, "disabled-slug").await,
            GuardOutcome::NotFound
        );
    }
}
