use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Changeset, Entity, EntityKind, Id, Payload, Update};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entreprise {
    pub entreprise_id: Id,
    pub nom_entreprise: String,
    pub secteur_activite: Option<String>,
    pub taille_entreprise: Option<String>,
    pub adresse: Option<String>,
    pub site_web: Option<String>,
    pub strategie_entreprise: Option<String>,
    pub notes: Option<String>,
    pub date_creation: DateTime<Utc>,
    pub date_mise_a_jour: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewEntreprise {
    pub nom_entreprise: String,
    pub secteur_activite: Option<String>,
    pub taille_entreprise: Option<String>,
    pub adresse: Option<String>,
    pub site_web: Option<String>,
    pub strategie_entreprise: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EntreprisePatch {
    pub nom_entreprise: Update<String>,
    pub secteur_activite: Update<String>,
    pub taille_entreprise: Update<String>,
    pub adresse: Update<String>,
    pub site_web: Update<String>,
    pub strategie_entreprise: Update<String>,
    pub notes: Update<String>,
}

impl Entity for Entreprise {
    type Draft = NewEntreprise;
    type Patch = EntreprisePatch;

    const KIND: EntityKind = EntityKind::Entreprise;

    fn id(&self) -> Id {
        self.entreprise_id
    }
}

impl Payload for NewEntreprise {
    fn into_changeset(self) -> Changeset {
        Changeset::new()
            .with("nom_entreprise", Some(self.nom_entreprise))
            .with("secteur_activite", self.secteur_activite)
            .with("taille_entreprise", self.taille_entreprise)
            .with("adresse", self.adresse)
            .with("site_web", self.site_web)
            .with("strategie_entreprise", self.strategie_entreprise)
            .with("notes", self.notes)
    }
}

impl Payload for EntreprisePatch {
    fn into_changeset(self) -> Changeset {
        Changeset::new()
            .with_update("nom_entreprise", self.nom_entreprise)
            .with_update("secteur_activite", self.secteur_activite)
            .with_update("taille_entreprise", self.taille_entreprise)
            .with_update("adresse", self.adresse)
            .with_update("site_web", self.site_web)
            .with_update("strategie_entreprise", self.strategie_entreprise)
            .with_update("notes", self.notes)
    }
}
