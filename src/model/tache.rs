use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Changeset, Entity, EntityKind, Id, Payload, ProspectLinked, Update};

/// Status values offered by the task form.
pub const TACHE_STATUSES: &[&str] = &["À faire", "En cours", "Terminé"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tache {
    pub tache_id: Id,
    pub prospect_id: Option<Id>,
    pub libelle: String,
    pub status: Option<String>,
    pub date_objectif: Option<NaiveDate>,
    pub notes: Option<String>,
    pub date_creation: DateTime<Utc>,
    pub date_mise_a_jour: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTache {
    pub prospect_id: Option<Id>,
    pub libelle: String,
    pub status: Option<String>,
    pub date_objectif: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TachePatch {
    pub prospect_id: Update<Id>,
    pub libelle: Update<String>,
    pub status: Update<String>,
    pub date_objectif: Update<NaiveDate>,
    pub notes: Update<String>,
}

impl Entity for Tache {
    type Draft = NewTache;
    type Patch = TachePatch;

    const KIND: EntityKind = EntityKind::Tache;

    fn id(&self) -> Id {
        self.tache_id
    }
}

impl ProspectLinked for Tache {
    fn prospect_id(&self) -> Option<Id> {
        self.prospect_id
    }
}

impl Payload for NewTache {
    fn into_changeset(self) -> Changeset {
        Changeset::new()
            .with("prospect_id", self.prospect_id)
            .with("libelle", Some(self.libelle))
            .with("status", self.status)
            .with("date_objectif", self.date_objectif)
            .with("notes", self.notes)
    }
}

impl Payload for TachePatch {
    fn into_changeset(self) -> Changeset {
        Changeset::new()
            .with_update("prospect_id", self.prospect_id)
            .with_update("libelle", self.libelle)
            .with_update("status", self.status)
            .with_update("date_objectif", self.date_objectif)
            .with_update("notes", self.notes)
    }
}
