use serde::{Deserialize, Serialize};

/// Audit columns carried by every table.
pub const CREATED_AT: &str = "date_creation";
pub const UPDATED_AT: &str = "date_mise_a_jour";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Entreprise,
    Prospect,
    Tache,
    Email,
    Appel,
    Meeting,
}

impl EntityKind {
    /// Every kind, parents before children (the order tables are created in).
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Entreprise,
        EntityKind::Prospect,
        EntityKind::Tache,
        EntityKind::Email,
        EntityKind::Appel,
        EntityKind::Meeting,
    ];

    pub fn descriptor(self) -> &'static EntityDescriptor {
        match self {
            Self::Entreprise => &ENTREPRISE,
            Self::Prospect => &PROSPECT,
            Self::Tache => &TACHE,
            Self::Email => &EMAIL,
            Self::Appel => &APPEL,
            Self::Meeting => &MEETING,
        }
    }

    /// Kinds whose foreign key points at this kind.
    pub fn children(self) -> impl Iterator<Item = EntityKind> {
        Self::ALL.into_iter().filter(move |kind| {
            kind.descriptor()
                .reference
                .map(|reference| reference.target == self)
                .unwrap_or(false)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Date,
    DateTime,
    /// Timezone-aware audit timestamp.
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
    pub unique: bool,
    /// Filled with the current time when an insert leaves it out.
    pub default_now: bool,
}

impl ColumnDef {
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            unique: false,
            default_now: false,
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Text)
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub const fn default_now(mut self) -> Self {
        self.default_now = true;
        self
    }
}

/// Foreign key from `column` to the primary key of `target`, cascading on delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub column: &'static str,
    pub target: EntityKind,
}

/// Everything the CRUD engine and the stores need to know about one table.
#[derive(Debug, PartialEq, Eq)]
pub struct EntityDescriptor {
    pub kind: EntityKind,
    /// Human-readable name used in validation messages.
    pub label: &'static str,
    /// Unversioned table name; the store adds its prefix and schema version.
    pub table: &'static str,
    /// Path segment under `/api`.
    pub route: &'static str,
    pub primary_key: &'static str,
    /// Writable columns, in insertion order.
    pub columns: &'static [ColumnDef],
    pub reference: Option<Reference>,
    /// Deletes run inside an explicit transaction (parents of cascades).
    pub transactional_delete: bool,
}

impl EntityDescriptor {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Columns returned by reads: key, writable columns, then audit timestamps.
    pub fn select_columns(&self) -> Vec<&'static str> {
        std::iter::once(self.primary_key)
            .chain(self.columns.iter().map(|column| column.name))
            .chain([CREATED_AT, UPDATED_AT])
            .collect()
    }

    pub fn column_kind(&self, name: &str) -> Option<ColumnKind> {
        if name == self.primary_key {
            return Some(ColumnKind::Integer);
        }
        if name == CREATED_AT || name == UPDATED_AT {
            return Some(ColumnKind::Timestamp);
        }
        self.column(name).map(|column| column.kind)
    }
}

const PROSPECT_REFERENCE: Option<Reference> = Some(Reference {
    column: "prospect_id",
    target: EntityKind::Prospect,
});

pub static ENTREPRISE: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Entreprise,
    label: "Entreprise",
    table: "entreprises",
    route: "entreprises",
    primary_key: "entreprise_id",
    columns: &[
        ColumnDef::text("nom_entreprise").required(),
        ColumnDef::text("secteur_activite"),
        ColumnDef::text("taille_entreprise"),
        ColumnDef::text("adresse"),
        ColumnDef::text("site_web"),
        ColumnDef::text("strategie_entreprise"),
        ColumnDef::text("notes"),
    ],
    reference: None,
    transactional_delete: true,
};

pub static PROSPECT: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Prospect,
    label: "Prospect",
    table: "prospects",
    route: "prospects",
    primary_key: "prospect_id",
    columns: &[
        ColumnDef::text("nom").required(),
        ColumnDef::text("prenom").required(),
        ColumnDef::new("entreprise_id", ColumnKind::Integer),
        ColumnDef::text("email").required().unique(),
        ColumnDef::text("telephone"),
        ColumnDef::text("fonction"),
        ColumnDef::text("notes"),
    ],
    reference: Some(Reference {
        column: "entreprise_id",
        target: EntityKind::Entreprise,
    }),
    transactional_delete: true,
};

pub static TACHE: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Tache,
    label: "Tache",
    table: "taches",
    route: "taches",
    primary_key: "tache_id",
    columns: &[
        ColumnDef::new("prospect_id", ColumnKind::Integer),
        ColumnDef::text("libelle").required(),
        ColumnDef::text("status"),
        ColumnDef::new("date_objectif", ColumnKind::Date),
        ColumnDef::text("notes"),
    ],
    reference: PROSPECT_REFERENCE,
    transactional_delete: false,
};

pub static EMAIL: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Email,
    label: "Email",
    table: "historique_emails",
    route: "email_history",
    primary_key: "email_id",
    columns: &[
        ColumnDef::new("prospect_id", ColumnKind::Integer),
        ColumnDef::new("date_email", ColumnKind::DateTime).default_now(),
        ColumnDef::text("expediteur"),
        ColumnDef::text("destinataire"),
        ColumnDef::text("sujet"),
        ColumnDef::text("corps"),
    ],
    reference: PROSPECT_REFERENCE,
    transactional_delete: false,
};

pub static APPEL: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Appel,
    label: "Appel",
    table: "historique_appels",
    route: "call_history",
    primary_key: "appel_id",
    columns: &[
        ColumnDef::new("prospect_id", ColumnKind::Integer),
        ColumnDef::new("date_appel", ColumnKind::DateTime).default_now(),
        ColumnDef::text("notes"),
    ],
    reference: PROSPECT_REFERENCE,
    transactional_delete: false,
};

pub static MEETING: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Meeting,
    label: "Meeting",
    table: "historique_meetings",
    route: "meetings",
    primary_key: "meeting_id",
    columns: &[
        ColumnDef::new("prospect_id", ColumnKind::Integer),
        ColumnDef::new("date_meeting", ColumnKind::DateTime).default_now(),
        ColumnDef::text("participants"),
        ColumnDef::text("notes"),
    ],
    reference: PROSPECT_REFERENCE,
    transactional_delete: false,
};
