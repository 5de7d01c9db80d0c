use anyhow::Result;
use chrono::NaiveDate;

use crate::logic::Repository;
use crate::model::{
    Entreprise, HistoriqueAppel, HistoriqueEmail, HistoriqueMeeting, Id, LocalDateTime,
    NewEntreprise, NewHistoriqueAppel, NewHistoriqueEmail, NewHistoriqueMeeting, NewProspect,
    NewTache, Prospect, Tache,
};
use crate::store::traits::Store;

/// Load a small sample CRM through the CRUD engine.
///
/// Does nothing when the store already holds entreprises, so restarting with
/// seeding enabled never duplicates rows.
pub async fn load_seed_data<S: Store>(store: &S) -> Result<()> {
    let entreprises = Repository::<S, Entreprise>::new(store);
    if !entreprises.list().await?.is_empty() {
        log::info!("Store already has data, skipping seed");
        return Ok(());
    }

    let atelier = entreprises
        .create(NewEntreprise {
            nom_entreprise: "Atelier Durand".to_string(),
            secteur_activite: Some("Menuiserie".to_string()),
            taille_entreprise: Some("PME".to_string()),
            adresse: Some("12 rue des Artisans, Lyon".to_string()),
            site_web: Some("https://atelier-durand.example".to_string()),
            strategie_entreprise: Some("Développer la vente en ligne".to_string()),
            notes: None,
        })
        .await?;
    let nordlog = entreprises
        .create(NewEntreprise {
            nom_entreprise: "NordLog".to_string(),
            secteur_activite: Some("Logistique".to_string()),
            taille_entreprise: Some("ETI".to_string()),
            adresse: Some("4 quai du Port, Lille".to_string()),
            site_web: None,
            strategie_entreprise: None,
            notes: Some("Contact via salon 2024".to_string()),
        })
        .await?;

    let prospects = Repository::<S, Prospect>::new(store);
    let claire = prospects
        .create(NewProspect {
            nom: "Durand".to_string(),
            prenom: "Claire".to_string(),
            entreprise_id: Some(atelier.entreprise_id),
            email: "claire.durand@atelier-durand.example".to_string(),
            telephone: Some("04 72 00 00 01".to_string()),
            fonction: Some("Gérante".to_string()),
            notes: None,
        })
        .await?;
    let marc = prospects
        .create(NewProspect {
            nom: "Lefebvre".to_string(),
            prenom: "Marc".to_string(),
            entreprise_id: Some(nordlog.entreprise_id),
            email: "marc.lefebvre@nordlog.example".to_string(),
            telephone: None,
            fonction: Some("Directeur des achats".to_string()),
            notes: Some("Préfère être contacté le matin".to_string()),
        })
        .await?;
    let sofia = prospects
        .create(NewProspect {
            nom: "Martin".to_string(),
            prenom: "Sofia".to_string(),
            entreprise_id: None,
            email: "sofia.martin@example.test".to_string(),
            telephone: None,
            fonction: Some("Consultante".to_string()),
            notes: None,
        })
        .await?;

    load_activity(store, claire.prospect_id, marc.prospect_id, sofia.prospect_id).await?;

    log::info!("Seed data loaded: 2 entreprises, 3 prospects");
    Ok(())
}

async fn load_activity<S: Store>(store: &S, claire: Id, marc: Id, sofia: Id) -> Result<()> {
    let taches = Repository::<S, Tache>::new(store);
    taches
        .create(NewTache {
            prospect_id: Some(claire),
            libelle: "Envoyer le devis".to_string(),
            status: Some("À faire".to_string()),
            date_objectif: NaiveDate::from_ymd_opt(2025, 3, 14),
            notes: None,
        })
        .await?;
    taches
        .create(NewTache {
            prospect_id: Some(marc),
            libelle: "Planifier une démo".to_string(),
            status: Some("En cours".to_string()),
            date_objectif: NaiveDate::from_ymd_opt(2025, 4, 2),
            notes: Some("Démo entrepôt de Lille".to_string()),
        })
        .await?;

    Repository::<S, HistoriqueEmail>::new(store)
        .create(NewHistoriqueEmail {
            prospect_id: Some(claire),
            date_email: LocalDateTime::parse("2025-02-20T09:30"),
            expediteur: Some("commercial@example.test".to_string()),
            destinataire: Some("claire.durand@atelier-durand.example".to_string()),
            sujet: Some("Suite à notre échange".to_string()),
            corps: Some("Bonjour Claire, voici notre présentation.".to_string()),
        })
        .await?;

    Repository::<S, HistoriqueAppel>::new(store)
        .create(NewHistoriqueAppel {
            prospect_id: Some(marc),
            date_appel: LocalDateTime::parse("2025-02-21T14:00"),
            notes: Some("Intéressé par l'offre transport".to_string()),
        })
        .await?;

    Repository::<S, HistoriqueMeeting>::new(store)
        .create(NewHistoriqueMeeting {
            prospect_id: Some(sofia),
            date_meeting: LocalDateTime::parse("2025-03-03T10:00"),
            participants: Some("Sofia Martin, équipe commerciale".to_string()),
            notes: None,
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_seed_is_loaded_once() {
        let store = MemoryStore::new();
        load_seed_data(&store).await.unwrap();
        load_seed_data(&store).await.unwrap();

        let prospects = Repository::<_, Prospect>::new(&store).list().await.unwrap();
        assert_eq!(prospects.len(), 3);
        let taches = Repository::<_, Tache>::new(&store).list().await.unwrap();
        assert_eq!(taches.len(), 2);
        assert!(taches.iter().all(|t| t.prospect_id.is_some()));
    }
}
