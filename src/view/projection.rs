//! Join-on-read projections used by the list views.
//!
//! Rows keep their own fields and gain one display label resolved against a
//! second collection; nothing here touches the store.

use serde::Serialize;
use std::collections::HashMap;

use crate::model::{Entreprise, Id, Prospect, ProspectLinked};

/// Shown when a reference is empty or points at nothing.
pub const MISSING_LABEL: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProspectView {
    #[serde(flatten)]
    pub prospect: Prospect,
    #[serde(rename = "entrepriseName")]
    pub entreprise_name: String,
}

/// A prospect-linked row with the linked prospect's "nom prenom".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Joined<T> {
    #[serde(flatten)]
    pub row: T,
    #[serde(rename = "prospectFullName")]
    pub prospect_full_name: String,
}

pub fn project_prospects(prospects: &[Prospect], entreprises: &[Entreprise]) -> Vec<ProspectView> {
    let names: HashMap<Id, &str> = entreprises
        .iter()
        .map(|e| (e.entreprise_id, e.nom_entreprise.as_str()))
        .collect();

    prospects
        .iter()
        .map(|prospect| ProspectView {
            entreprise_name: prospect
                .entreprise_id
                .and_then(|id| names.get(&id))
                .unwrap_or(&MISSING_LABEL)
                .to_string(),
            prospect: prospect.clone(),
        })
        .collect()
}

/// Attach `prospectFullName` to each row, or `missing` when it has no prospect.
pub fn join_prospects<T>(rows: &[T], prospects: &[Prospect], missing: &str) -> Vec<Joined<T>>
where
    T: ProspectLinked + Clone,
{
    let names: HashMap<Id, String> = prospects
        .iter()
        .map(|p| (p.prospect_id, p.full_name()))
        .collect();

    rows.iter()
        .map(|row| Joined {
            prospect_full_name: row
                .prospect_id()
                .and_then(|id| names.get(&id).cloned())
                .unwrap_or_else(|| missing.to_string()),
            row: row.clone(),
        })
        .collect()
}
