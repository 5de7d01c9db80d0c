use serde_json::Value;
use std::marker::PhantomData;

use crate::logic::error::{CrmError, CrmResult};
use crate::logic::validate::ReferenceValidator;
use crate::model::{Entity, Id, Payload};
use crate::store::traits::{Record, Store};

/// Generic CRUD engine for one entity type over any [`Store`].
///
/// All six resource families go through this one code path; what differs
/// between them lives in the entity's descriptor and payload types.
pub struct Repository<'a, S, E> {
    store: &'a S,
    entity: PhantomData<fn() -> E>,
}

impl<'a, S: Store, E: Entity> Repository<'a, S, E> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            entity: PhantomData,
        }
    }

    fn decode(record: Record) -> CrmResult<E> {
        serde_json::from_value(Value::Object(record)).map_err(|err| CrmError::CorruptRecord {
            entity: E::descriptor().label,
            reason: err.to_string(),
        })
    }

    fn not_found(id: Id) -> CrmError {
        CrmError::NotFound {
            entity: E::descriptor().label,
            id,
        }
    }

    pub async fn list(&self) -> CrmResult<Vec<E>> {
        self.store
            .list(E::descriptor())
            .await?
            .into_iter()
            .map(Self::decode)
            .collect()
    }

    pub async fn get(&self, id: Id) -> CrmResult<E> {
        match self.store.get(E::descriptor(), id).await? {
            Some(record) => Self::decode(record),
            None => Err(Self::not_found(id)),
        }
    }

    pub async fn create(&self, draft: E::Draft) -> CrmResult<E> {
        let changes = draft.into_changeset();
        ReferenceValidator::validate(self.store, E::descriptor(), &changes).await?;

        let record = self.store.insert(E::descriptor(), &changes).await?;
        let created = Self::decode(record)?;
        log::info!("Created {} {}", E::descriptor().label, created.id());
        Ok(created)
    }

    /// Apply only the fields present in `patch`; the update timestamp always moves.
    pub async fn update(&self, id: Id, patch: E::Patch) -> CrmResult<E> {
        let changes = patch.into_changeset();
        if changes.is_empty() {
            return Err(CrmError::NoFieldsToUpdate);
        }
        ReferenceValidator::validate(self.store, E::descriptor(), &changes).await?;

        let record = self
            .store
            .update(E::descriptor(), id, &changes)
            .await?
            .ok_or_else(|| Self::not_found(id))?;
        log::info!(
            "Updated {} {} ({} fields)",
            E::descriptor().label,
            id,
            changes.len()
        );
        Self::decode(record)
    }

    pub async fn delete(&self, id: Id) -> CrmResult<()> {
        if !self.store.delete(E::descriptor(), id).await? {
            return Err(Self::not_found(id));
        }
        log::info!("Deleted {} {}", E::descriptor().label, id);
        Ok(())
    }
}

/// Parse a request body into a create or update payload. An empty body is `{}`.
pub fn parse_payload<P: Payload>(body: &[u8]) -> CrmResult<P> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|err| CrmError::InvalidPayload(err.to_string()))
}
