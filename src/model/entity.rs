use serde::{de::DeserializeOwned, Serialize};

use crate::model::{Changeset, EntityDescriptor, EntityKind, Id};

/// A CRM table row with its create and update payload types.
///
/// The generic CRUD engine, the HTTP handlers and the stores only ever see
/// entities through this trait plus the kind's [`EntityDescriptor`].
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Body of a create request.
    type Draft: Payload;
    /// Body of a partial update request.
    type Patch: Payload;

    const KIND: EntityKind;

    fn descriptor() -> &'static EntityDescriptor {
        Self::KIND.descriptor()
    }

    fn id(&self) -> Id;
}

/// A request body that compiles to column assignments.
pub trait Payload: DeserializeOwned + Send + Sync {
    fn into_changeset(self) -> Changeset;
}

/// Rows that may point at a prospect (tasks and activity history).
pub trait ProspectLinked {
    fn prospect_id(&self) -> Option<Id>;
}
