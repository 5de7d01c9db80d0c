use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{Changeset, EntityDescriptor, Id};

/// A row as read back from a store: column name to JSON value.
pub type Record = Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    ForeignKeyViolation(String),
    #[error("{0}")]
    UniqueViolation(String),
    #[error("{0}")]
    NotNullViolation(String),
    #[error("invalid schema configuration: {0}")]
    Configuration(String),
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind;

        let kind = match &err {
            sqlx::Error::Database(db_err) => Some((db_err.kind(), db_err.message().to_string())),
            _ => None,
        };

        match kind {
            Some((ErrorKind::ForeignKeyViolation, message)) => Self::ForeignKeyViolation(message),
            Some((ErrorKind::UniqueViolation, message)) => Self::UniqueViolation(message),
            Some((ErrorKind::NotNullViolation, message)) => Self::NotNullViolation(message),
            _ => Self::Database(err),
        }
    }
}

/// Schema management for a store backend.
#[async_trait::async_trait]
pub trait SchemaStore: Send + Sync {
    /// Create any missing tables for the configured schema version.
    async fn migrate(&self) -> StoreResult<()>;
}

/// Read access to entity tables.
#[async_trait::async_trait]
pub trait RecordReader: Send + Sync {
    /// All rows of a table, in primary-key order.
    async fn list(&self, entity: &'static EntityDescriptor) -> StoreResult<Vec<Record>>;
    async fn get(&self, entity: &'static EntityDescriptor, id: Id) -> StoreResult<Option<Record>>;
    /// Existence probe used to validate foreign keys before a write.
    async fn exists(&self, entity: &'static EntityDescriptor, id: Id) -> StoreResult<bool>;
}

/// Write access to entity tables.
///
/// Implementations enforce NOT NULL, UNIQUE and foreign-key constraints and
/// maintain the creation/update timestamps themselves.
#[async_trait::async_trait]
pub trait RecordWriter: Send + Sync {
    async fn insert(
        &self,
        entity: &'static EntityDescriptor,
        changes: &Changeset,
    ) -> StoreResult<Record>;
    /// Returns `None` when no row has this id. Always refreshes the update timestamp.
    async fn update(
        &self,
        entity: &'static EntityDescriptor,
        id: Id,
        changes: &Changeset,
    ) -> StoreResult<Option<Record>>;
    /// Deletes the row and, through the cascade, every row that depends on it.
    /// Returns `false` when no row has this id.
    async fn delete(&self, entity: &'static EntityDescriptor, id: Id) -> StoreResult<bool>;
}

pub trait Store: SchemaStore + RecordReader + RecordWriter + Send + Sync {}
impl<T: SchemaStore + RecordReader + RecordWriter + Send + Sync> Store for T {}
