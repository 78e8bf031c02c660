//! Delegation to an external schema engine.
//!
//! Parsing structure-description files and diffing schemas is the engine's
//! job. The [`Database`] only makes sure a connection exists, then hands
//! itself to the engine.

use std::path::Path;

use async_trait::async_trait;

use crate::database::Database;
use crate::error::SqlPortableError;

/// Structural operations driven by a structure-description file.
#[async_trait]
pub trait SchemaEngine: Send + Sync {
    /// Write the current schema to `file`.
    async fn dump_structure(&self, db: &mut Database, file: &Path) -> Result<(), SqlPortableError>;

    async fn create_from_structure(
        &self,
        db: &mut Database,
        file: &Path,
    ) -> Result<(), SqlPortableError>;

    /// Migrate the live schema towards `file`.
    async fn update_from_structure(
        &self,
        db: &mut Database,
        file: &Path,
    ) -> Result<(), SqlPortableError>;

    async fn drop_table(&self, db: &mut Database, table: &str) -> Result<(), SqlPortableError>;

    /// Drop every table described in `file`.
    async fn remove_structure(&self, db: &mut Database, file: &Path)
    -> Result<(), SqlPortableError>;

    /// Replace the live schema with the one in `file`.
    async fn replace(&self, db: &mut Database, file: &Path) -> Result<(), SqlPortableError>;
}

impl Database {
    async fn connected_for_schema(&mut self) -> Result<(), SqlPortableError> {
        self.ensure_connected().await.map(|_| ())
    }

    /// # Errors
    /// Returns `Unavailable`/`Unsupported` if no connection can be opened, or
    /// whatever the engine reports.
    pub async fn get_db_structure(
        &mut self,
        engine: &dyn SchemaEngine,
        file: &Path,
    ) -> Result<(), SqlPortableError> {
        self.connected_for_schema().await?;
        engine.dump_structure(self, file).await
    }

    /// # Errors
    /// Returns `Unavailable`/`Unsupported` if no connection can be opened, or
    /// whatever the engine reports.
    pub async fn create_db_from_structure(
        &mut self,
        engine: &dyn SchemaEngine,
        file: &Path,
    ) -> Result<(), SqlPortableError> {
        self.connected_for_schema().await?;
        engine.create_from_structure(self, file).await
    }

    /// Engine failures are logged at error level before being returned.
    ///
    /// # Errors
    /// Returns `Unavailable`/`Unsupported` if no connection can be opened, or
    /// whatever the engine reports.
    pub async fn update_db_from_structure(
        &mut self,
        engine: &dyn SchemaEngine,
        file: &Path,
    ) -> Result<(), SqlPortableError> {
        self.connected_for_schema().await?;
        engine
            .update_from_structure(self, file)
            .await
            .inspect_err(|e| {
                tracing::error!(file = %file.display(), error = %e, "failed to update database structure");
            })
    }

    /// # Errors
    /// Returns `Unavailable`/`Unsupported` if no connection can be opened, or
    /// whatever the engine reports.
    pub async fn drop_table(
        &mut self,
        engine: &dyn SchemaEngine,
        table: &str,
    ) -> Result<(), SqlPortableError> {
        self.connected_for_schema().await?;
        let table = self.replace_table_prefix(table);
        engine.drop_table(self, &table).await
    }

    /// # Errors
    /// Returns `Unavailable`/`Unsupported` if no connection can be opened, or
    /// whatever the engine reports.
    pub async fn remove_db_structure(
        &mut self,
        engine: &dyn SchemaEngine,
        file: &Path,
    ) -> Result<(), SqlPortableError> {
        self.connected_for_schema().await?;
        engine.remove_structure(self, file).await
    }

    /// # Errors
    /// Returns `Unavailable`/`Unsupported` if no connection can be opened, or
    /// whatever the engine reports.
    pub async fn replace_db(
        &mut self,
        engine: &dyn SchemaEngine,
        file: &Path,
    ) -> Result<(), SqlPortableError> {
        self.connected_for_schema().await?;
        engine.replace(self, file).await
    }
}
