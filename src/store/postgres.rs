use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use itertools::Itertools;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, postgres::PgRow, PgPool, Postgres, QueryBuilder, Row};

use crate::model::{Changeset, ColumnKind, EntityDescriptor, FieldValue, Id, UPDATED_AT};
use crate::store::schema::SchemaNames;
use crate::store::traits::{
    Record, RecordReader, RecordWriter, SchemaStore, StoreError, StoreResult,
};

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    names: SchemaNames,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32, names: SchemaNames) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool, names })
    }

    pub fn names(&self) -> &SchemaNames {
        &self.names
    }

    /// Tables in the current schema that belong to another schema version.
    pub async fn abandoned_tables(&self) -> Result<Vec<(String, u32)>> {
        let rows = sqlx::query(
            "SELECT table_name::TEXT AS table_name FROM information_schema.tables \
             WHERE table_schema = current_schema() ORDER BY table_name",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list tables")?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let name: String = row.get("table_name");
                self.names
                    .abandoned_version(&name)
                    .map(|version| (name, version))
            })
            .collect())
    }

    /// Drop one abandoned table. Refuses names that are not abandoned tables of this prefix.
    pub async fn drop_abandoned_table(&self, table_name: &str) -> Result<()> {
        if self.names.abandoned_version(table_name).is_none() {
            anyhow::bail!("'{}' is not an abandoned table of this schema", table_name);
        }
        sqlx::query(&format!("DROP TABLE IF EXISTS {} CASCADE", table_name))
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to drop table {}", table_name))?;
        Ok(())
    }

}

fn select_list(entity: &EntityDescriptor) -> String {
    entity.select_columns().into_iter().join(", ")
}

/// `INSERT ... RETURNING` with every change bound as a parameter.
fn insert_query(
    table: &str,
    entity: &EntityDescriptor,
    changes: &Changeset,
) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!("INSERT INTO {}", table));
    if changes.is_empty() {
        query.push(" DEFAULT VALUES");
    } else {
        query.push(" (");
        query.push(changes.columns().join(", "));
        query.push(") VALUES (");
        for (i, change) in changes.iter().enumerate() {
            if i > 0 {
                query.push(", ");
            }
            push_value(&mut query, &change.value);
        }
        query.push(")");
    }
    query.push(" RETURNING ");
    query.push(select_list(entity));
    query
}

/// `UPDATE ... RETURNING` over the present fields; the update timestamp is always refreshed.
fn update_query(
    table: &str,
    entity: &EntityDescriptor,
    id: Id,
    changes: &Changeset,
) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!("UPDATE {} SET ", table));
    for change in changes.iter() {
        query.push(change.column);
        query.push(" = ");
        push_value(&mut query, &change.value);
        query.push(", ");
    }
    query.push(UPDATED_AT);
    query.push(" = NOW() WHERE ");
    query.push(entity.primary_key);
    query.push(" = ");
    query.push_bind(id);
    query.push(" RETURNING ");
    query.push(select_list(entity));
    query
}

fn push_value(query: &mut QueryBuilder<'static, Postgres>, value: &FieldValue) {
    match value.clone() {
        FieldValue::Text(v) => query.push_bind(v),
        FieldValue::Integer(v) => query.push_bind(v),
        FieldValue::Date(v) => query.push_bind(v),
        FieldValue::DateTime(v) => query.push_bind(v),
    };
}

/// Decode a row into a [`Record`] using the descriptor's column kinds.
fn decode_row(entity: &EntityDescriptor, row: &PgRow) -> StoreResult<Record> {
    let mut record = Record::new();
    for column in entity.select_columns() {
        let kind = entity.column_kind(column).unwrap_or(ColumnKind::Text);
        let value = match kind {
            ColumnKind::Text => FieldValue::Text(row.try_get::<Option<String>, _>(column)?).to_json(),
            ColumnKind::Integer => FieldValue::Integer(row.try_get::<Option<i64>, _>(column)?).to_json(),
            ColumnKind::Date => FieldValue::Date(row.try_get::<Option<NaiveDate>, _>(column)?).to_json(),
            ColumnKind::DateTime => {
                FieldValue::DateTime(row.try_get::<Option<NaiveDateTime>, _>(column)?).to_json()
            }
            ColumnKind::Timestamp => row
                .try_get::<Option<DateTime<Utc>>, _>(column)?
                .map(|ts| Value::String(ts.to_rfc3339()))
                .unwrap_or(Value::Null),
        };
        record.insert(column.to_string(), value);
    }
    Ok(record)
}

#[async_trait::async_trait]
impl SchemaStore for PostgresStore {
    async fn migrate(&self) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for statement in self.names.create_statements() {
            sqlx::query(&statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        log::info!(
            "Schema version {} ready ({} tables)",
            self.names.version(),
            crate::model::EntityKind::ALL.len()
        );
        Ok(())
    }
}

#[async_trait::async_trait]
impl RecordReader for PostgresStore {
    async fn list(&self, entity: &'static EntityDescriptor) -> StoreResult<Vec<Record>> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            select_list(entity),
            self.names.table(entity),
            entity.primary_key
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(|row| decode_row(entity, row)).collect()
    }

    async fn get(&self, entity: &'static EntityDescriptor, id: Id) -> StoreResult<Option<Record>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = $1",
            select_list(entity),
            self.names.table(entity),
            entity.primary_key
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.map(|row| decode_row(entity, &row)).transpose()
    }

    async fn exists(&self, entity: &'static EntityDescriptor, id: Id) -> StoreResult<bool> {
        let sql = format!(
            "SELECT 1 FROM {} WHERE {} = $1",
            self.names.table(entity),
            entity.primary_key
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.is_some())
    }
}

#[async_trait::async_trait]
impl RecordWriter for PostgresStore {
    async fn insert(
        &self,
        entity: &'static EntityDescriptor,
        changes: &Changeset,
    ) -> StoreResult<Record> {
        let mut query = insert_query(&self.names.table(entity), entity, changes);
        let row = query.build().fetch_one(&self.pool).await?;
        decode_row(entity, &row)
    }

    async fn update(
        &self,
        entity: &'static EntityDescriptor,
        id: Id,
        changes: &Changeset,
    ) -> StoreResult<Option<Record>> {
        let mut query = update_query(&self.names.table(entity), entity, id, changes);
        let row = query.build().fetch_optional(&self.pool).await?;
        row.map(|row| decode_row(entity, &row)).transpose()
    }

    async fn delete(&self, entity: &'static EntityDescriptor, id: Id) -> StoreResult<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = $1",
            self.names.table(entity),
            entity.primary_key
        );

        if !entity.transactional_delete {
            let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
            return Ok(result.rows_affected() > 0);
        }

        // Dependents go through ON DELETE CASCADE inside the same transaction.
        let mut tx = self.pool.begin().await?;
        match sqlx::query(&sql).bind(id).execute(&mut *tx).await {
            Ok(result) => {
                tx.commit().await?;
                Ok(result.rows_affected() > 0)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    log::error!("Rollback of {} delete failed: {}", entity.table, rollback_err);
                }
                Err(StoreError::from(err))
            }
        }
    }
}
