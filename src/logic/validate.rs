use crate::logic::error::{CrmError, CrmResult};
use crate::model::{Changeset, EntityDescriptor};
use crate::store::traits::Store;

pub struct ReferenceValidator;

impl ReferenceValidator {
    /// Probe the referenced table for a foreign key carried by `changes`.
    ///
    /// Absent or null references pass; a dangling one fails before the store's
    /// write path is touched.
    pub async fn validate<S: Store>(
        store: &S,
        entity: &EntityDescriptor,
        changes: &Changeset,
    ) -> CrmResult<()> {
        let Some(reference) = entity.reference else {
            return Ok(());
        };
        let Some(target_id) = changes.get(reference.column).and_then(|v| v.as_integer()) else {
            return Ok(());
        };

        let target = reference.target.descriptor();
        if store.exists(target, target_id).await? {
            Ok(())
        } else {
            Err(CrmError::MissingReference {
                entity: target.label,
                id: target_id,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ENTREPRISE, MEETING, PROSPECT};
    use crate::store::{MemoryStore, RecordReader, RecordWriter};

    #[tokio::test]
    async fn test_dangling_reference_names_entity_and_id() {
        let store = MemoryStore::new();
        let changes = Changeset::new().with("prospect_id", Some(999_999_i64));

        let err = ReferenceValidator::validate(&store, &MEETING, &changes)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Prospect ID '999999' does not exist. Please select a valid Prospect."
        );
    }

    #[tokio::test]
    async fn test_null_and_absent_references_pass() {
        let store = MemoryStore::new();
        let null = Changeset::new().with::<i64>("entreprise_id", None);
        assert!(ReferenceValidator::validate(&store, &PROSPECT, &null).await.is_ok());
        assert!(ReferenceValidator::validate(&store, &PROSPECT, &Changeset::new())
            .await
            .is_ok());
        // Entities without a foreign key never probe.
        assert!(ReferenceValidator::validate(&store, &ENTREPRISE, &null).await.is_ok());
    }

    #[tokio::test]
    async fn test_existing_reference_passes() {
        let store = MemoryStore::new();
        let acme = store
            .insert(
                &ENTREPRISE,
                &Changeset::new().with("nom_entreprise", Some("Acme".to_string())),
            )
            .await
            .unwrap();
        let id = acme["entreprise_id"].as_i64().unwrap();
        assert!(store.exists(&ENTREPRISE, id).await.unwrap());

        let changes = Changeset::new().with("entreprise_id", Some(id));
        assert!(ReferenceValidator::validate(&store, &PROSPECT, &changes).await.is_ok());
    }
}
