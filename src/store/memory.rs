use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::model::{
    Changeset, ColumnKind, EntityDescriptor, EntityKind, FieldValue, Id, LocalDateTime,
    CREATED_AT, UPDATED_AT,
};
use crate::store::traits::{
    Record, RecordReader, RecordWriter, SchemaStore, StoreError, StoreResult,
};

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<Id, Record>,
    last_id: Id,
}

/// In-process store with the same constraint semantics as the Postgres schema.
///
/// Every operation takes the lock once and never awaits while holding it, so
/// each call is atomic with respect to the others (including cascades).
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<EntityKind, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn timestamp_now() -> Value {
    Value::String(Utc::now().to_rfc3339())
}

fn is_null(record: &Record, column: &str) -> bool {
    record.get(column).map(Value::is_null).unwrap_or(true)
}

/// Check NOT NULL, UNIQUE and foreign keys for a candidate row.
fn check_constraints(
    tables: &HashMap<EntityKind, Table>,
    entity: &EntityDescriptor,
    id: Id,
    candidate: &Record,
) -> StoreResult<()> {
    for column in entity.columns {
        if column.required && is_null(candidate, column.name) {
            return Err(StoreError::NotNullViolation(format!(
                "null value in column \"{}\" of relation \"{}\" violates not-null constraint",
                column.name, entity.table
            )));
        }

        if column.unique && !is_null(candidate, column.name) {
            let value = &candidate[column.name];
            let taken = tables
                .get(&entity.kind)
                .map(|table| {
                    table
                        .rows
                        .iter()
                        .any(|(other_id, row)| *other_id != id && row.get(column.name) == Some(value))
                })
                .unwrap_or(false);
            if taken {
                return Err(StoreError::UniqueViolation(format!(
                    "duplicate key value violates unique constraint \"{}_{}_key\"",
                    entity.table, column.name
                )));
            }
        }
    }

    if let Some(reference) = entity.reference {
        if let Some(target_id) = candidate.get(reference.column).and_then(Value::as_i64) {
            let present = tables
                .get(&reference.target)
                .map(|table| table.rows.contains_key(&target_id))
                .unwrap_or(false);
            if !present {
                return Err(StoreError::ForeignKeyViolation(format!(
                    "insert or update on table \"{}\" violates foreign key constraint \"{}_{}_fkey\"",
                    entity.table, entity.table, reference.column
                )));
            }
        }
    }

    Ok(())
}

fn apply_changes(record: &mut Record, changes: &Changeset) {
    for change in changes.iter() {
        record.insert(change.column.to_string(), change.value.to_json());
    }
}

/// Remove a row and everything that references it, depth first.
fn delete_cascading(tables: &mut HashMap<EntityKind, Table>, kind: EntityKind, id: Id) -> bool {
    let removed = tables
        .get_mut(&kind)
        .and_then(|table| table.rows.remove(&id))
        .is_some();
    if !removed {
        return false;
    }

    for child in kind.children() {
        let column = match child.descriptor().reference {
            Some(reference) => reference.column,
            None => continue,
        };
        let dependents: Vec<Id> = tables
            .get(&child)
            .map(|table| {
                table
                    .rows
                    .iter()
                    .filter(|(_, row)| row.get(column).and_then(Value::as_i64) == Some(id))
                    .map(|(child_id, _)| *child_id)
                    .collect()
            })
            .unwrap_or_default();

        for child_id in dependents {
            delete_cascading(tables, child, child_id);
        }
    }

    true
}

#[async_trait::async_trait]
impl SchemaStore for MemoryStore {
    async fn migrate(&self) -> StoreResult<()> {
        let mut tables = self.tables.write();
        for kind in EntityKind::ALL {
            tables.entry(kind).or_default();
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RecordReader for MemoryStore {
    async fn list(&self, entity: &'static EntityDescriptor) -> StoreResult<Vec<Record>> {
        let tables = self.tables.read();
        Ok(tables
            .get(&entity.kind)
            .map(|table| table.rows.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get(&self, entity: &'static EntityDescriptor, id: Id) -> StoreResult<Option<Record>> {
        let tables = self.tables.read();
        Ok(tables
            .get(&entity.kind)
            .and_then(|table| table.rows.get(&id).cloned()))
    }

    async fn exists(&self, entity: &'static EntityDescriptor, id: Id) -> StoreResult<bool> {
        let tables = self.tables.read();
        Ok(tables
            .get(&entity.kind)
            .map(|table| table.rows.contains_key(&id))
            .unwrap_or(false))
    }
}

#[async_trait::async_trait]
impl RecordWriter for MemoryStore {
    async fn insert(
        &self,
        entity: &'static EntityDescriptor,
        changes: &Changeset,
    ) -> StoreResult<Record> {
        let mut tables = self.tables.write();
        let next_id = tables.get(&entity.kind).map(|t| t.last_id).unwrap_or(0) + 1;

        let mut record = Record::new();
        record.insert(entity.primary_key.to_string(), Value::from(next_id));
        for column in entity.columns {
            let default = match column.kind {
                ColumnKind::DateTime if column.default_now => {
                    FieldValue::DateTime(Some(LocalDateTime::now().0)).to_json()
                }
                _ => Value::Null,
            };
            record.insert(column.name.to_string(), default);
        }
        apply_changes(&mut record, changes);
        let now = timestamp_now();
        record.insert(CREATED_AT.to_string(), now.clone());
        record.insert(UPDATED_AT.to_string(), now);

        check_constraints(&tables, entity, next_id, &record)?;

        let table = tables.entry(entity.kind).or_default();
        table.last_id = next_id;
        table.rows.insert(next_id, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        entity: &'static EntityDescriptor,
        id: Id,
        changes: &Changeset,
    ) -> StoreResult<Option<Record>> {
        let mut tables = self.tables.write();
        let Some(mut record) = tables
            .get(&entity.kind)
            .and_then(|table| table.rows.get(&id).cloned())
        else {
            return Ok(None);
        };

        apply_changes(&mut record, changes);
        record.insert(UPDATED_AT.to_string(), timestamp_now());
        check_constraints(&tables, entity, id, &record)?;

        tables
            .entry(entity.kind)
            .or_default()
            .rows
            .insert(id, record.clone());
        Ok(Some(record))
    }

    async fn delete(&self, entity: &'static EntityDescriptor, id: Id) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        Ok(delete_cascading(&mut tables, entity.kind, id))
    }
}
