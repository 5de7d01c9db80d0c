use crate::model::EntityKind;

/// One tab of the CRM page, each backed by one entity list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    #[default]
    Prospects,
    Entreprises,
    Taches,
    Emails,
    Appels,
    Meetings,
}

impl Tab {
    /// Display order of the tab bar.
    pub const ALL: [Tab; 6] = [
        Tab::Prospects,
        Tab::Entreprises,
        Tab::Taches,
        Tab::Emails,
        Tab::Appels,
        Tab::Meetings,
    ];

    /// Resolve the `tab` query parameter; unknown or missing values open the prospects tab.
    pub fn from_query(value: Option<&str>) -> Self {
        value
            .and_then(|slug| Self::ALL.into_iter().find(|tab| tab.slug() == slug))
            .unwrap_or_default()
    }

    pub fn slug(self) -> &'static str {
        match self {
            Tab::Prospects => "prospects",
            Tab::Entreprises => "entreprises",
            Tab::Taches => "taches",
            Tab::Emails => "historique_emails",
            Tab::Appels => "historique_appels",
            Tab::Meetings => "historique_meetings",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tab::Prospects => "Prospects",
            Tab::Entreprises => "Entreprises",
            Tab::Taches => "Tâches",
            Tab::Emails => "Historique Emails",
            Tab::Appels => "Historique Appels",
            Tab::Meetings => "Historique Meetings",
        }
    }

    pub fn entity(self) -> EntityKind {
        match self {
            Tab::Prospects => EntityKind::Prospect,
            Tab::Entreprises => EntityKind::Entreprise,
            Tab::Taches => EntityKind::Tache,
            Tab::Emails => EntityKind::Email,
            Tab::Appels => EntityKind::Appel,
            Tab::Meetings => EntityKind::Meeting,
        }
    }

    /// Collections that must be loaded to render this tab.
    ///
    /// Entreprises are always present (name lookups and the prospect form);
    /// prospects are needed wherever a row points at one.
    pub fn collections(self) -> Vec<EntityKind> {
        let own = self.entity();
        let needs_prospects = own != EntityKind::Entreprise;
        EntityKind::ALL
            .into_iter()
            .filter(|kind| {
                *kind == EntityKind::Entreprise
                    || (*kind == EntityKind::Prospect && needs_prospects)
                    || *kind == own
            })
            .collect()
    }
}
