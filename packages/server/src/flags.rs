//! Schema feature flags.
//!
//! Whether a news item schema is enabled is a runtime question answered
//! by a [`SchemaFlags`] provider injected into the application state,
//! so handlers never consult process-global configuration and tests can
//! substitute a fixed answer set.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use switchy_database::Database;

/// Answers whether a news item schema is enabled.
#[async_trait]
pub trait SchemaFlags: Send + Sync {
    /// Returns whether the schema exists and is enabled.
    async fn is_schema_enabled(&self, slug: &str) -> bool;
}

/// Database-backed flags: a schema is enabled when its row exists and
/// is public.
pub struct DbSchemaFlags {
    db: Arc<dyn Database>,
}

impl DbSchemaFlags {
    /// Creates a provider reading from the given database.
    #[must_use]
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SchemaFlags for DbSchemaFlags {
    async fn is_schema_enabled(&self, slug: &str) -> bool {
        match blockpress_database::items::is_schema_public(self.db.as_ref(), slug).await {
            Ok(enabled) => enabled,
            Err(e) => {
                log::error!("Failed to check schema flag for {slug}: {e}");
                false
            }
        }
    }
}

/// Fixed flag set for tests.
pub struct StaticSchemaFlags {
    enabled: BTreeSet<String>,
}

impl StaticSchemaFlags {
    /// Creates a provider that enables exactly the given slugs.
    #[must_use]
    pub fn new<I: IntoIterator<Item = S>, S: Into<String>>(enabled: I) -> Self {
        Self {
            enabled: enabled.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl SchemaFlags for StaticSchemaFlags {
    async fn is_schema_enabled(&self, slug: &str) -> bool {
        self.enabled.contains(slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn static_flags_answer_membership() {
        let flags = StaticSchemaFlags::new(["neighbor-messages"]);
        assert!(flags.is_schema_enabled("neighbor-messages").await);
        assert!(!flags.is_schema_enabled("neighbor-events").await);
    }
}
