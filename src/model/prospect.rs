use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Changeset, Entity, EntityKind, Id, Payload, Update};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prospect {
    pub prospect_id: Id,
    pub nom: String,
    pub prenom: String,
    pub entreprise_id: Option<Id>,
    pub email: String,
    pub telephone: Option<String>,
    pub fonction: Option<String>,
    pub notes: Option<String>,
    pub date_creation: DateTime<Utc>,
    pub date_mise_a_jour: DateTime<Utc>,
}

impl Prospect {
    /// "nom prenom", the label used wherever a prospect is referenced.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.nom, self.prenom)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProspect {
    pub nom: String,
    pub prenom: String,
    pub entreprise_id: Option<Id>,
    pub email: String,
    pub telephone: Option<String>,
    pub fonction: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProspectPatch {
    pub nom: Update<String>,
    pub prenom: Update<String>,
    pub entreprise_id: Update<Id>,
    pub email: Update<String>,
    pub telephone: Update<String>,
    pub fonction: Update<String>,
    pub notes: Update<String>,
}

impl Entity for Prospect {
    type Draft = NewProspect;
    type Patch = ProspectPatch;

    const KIND: EntityKind = EntityKind::Prospect;

    fn id(&self) -> Id {
        self.prospect_id
    }
}

impl Payload for NewProspect {
    fn into_changeset(self) -> Changeset {
        Changeset::new()
            .with("nom", Some(self.nom))
            .with("prenom", Some(self.prenom))
            .with("entreprise_id", self.entreprise_id)
            .with("email", Some(self.email))
            .with("telephone", self.telephone)
            .with("fonction", self.fonction)
            .with("notes", self.notes)
    }
}

impl Payload for ProspectPatch {
    fn into_changeset(self) -> Changeset {
        Changeset::new()
            .with_update("nom", self.nom)
            .with_update("prenom", self.prenom)
            .with_update("entreprise_id", self.entreprise_id)
            .with_update("email", self.email)
            .with_update("telephone", self.telephone)
            .with_update("fonction", self.fonction)
            .with_update("notes", self.notes)
    }
}
