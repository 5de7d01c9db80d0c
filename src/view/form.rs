use serde::Serialize;
use serde_json::Value;

use crate::model::{Entity, EntityDescriptor, EntityKind, Id};

use InputKind::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Email,
    Tel,
    Textarea,
    Date,
    DateTimeLocal,
    Select(Choices),
    /// Primary key, shown but never submitted.
    ReadOnly,
}

/// Where a select input takes its options from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choices {
    Entreprises,
    Prospects,
    TaskStatuses,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub input: InputKind,
    pub required: bool,
}

impl FieldDescriptor {
    const fn new(name: &'static str, label: &'static str, input: InputKind) -> Self {
        Self {
            name,
            label,
            input,
            required: false,
        }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Whether the submitted value is an integer id rather than text.
    pub fn is_reference(&self) -> bool {
        matches!(
            self.input,
            InputKind::Select(Choices::Entreprises) | InputKind::Select(Choices::Prospects)
        )
    }

    /// Editable value of a stored field, trimmed to what the input accepts.
    fn display_value(&self, value: Option<&Value>) -> String {
        let raw = match value {
            None | Some(Value::Null) => return String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        match self.input {
            InputKind::Date => raw.chars().take(10).collect(),
            InputKind::DateTimeLocal => raw.chars().take(16).collect(),
            _ => raw,
        }
    }
}

const PROSPECT_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("prospect_id", "ID", ReadOnly),
    FieldDescriptor::new("nom", "Nom", Text).required(),
    FieldDescriptor::new("prenom", "Prénom", Text).required(),
    FieldDescriptor::new("entreprise_id", "Entreprise", Select(Choices::Entreprises)),
    FieldDescriptor::new("email", "Email", Email).required(),
    FieldDescriptor::new("telephone", "Téléphone", Tel),
    FieldDescriptor::new("fonction", "Fonction", Text),
    FieldDescriptor::new("notes", "Notes", Textarea),
];

const ENTREPRISE_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("entreprise_id", "ID", ReadOnly),
    FieldDescriptor::new("nom_entreprise", "Nom de l'entreprise", Text).required(),
    FieldDescriptor::new("secteur_activite", "Secteur d'activité", Text),
    FieldDescriptor::new("taille_entreprise", "Taille de l'entreprise", Text),
    FieldDescriptor::new("adresse", "Adresse", Text),
    FieldDescriptor::new("site_web", "Site web", Text),
    FieldDescriptor::new("strategie_entreprise", "Stratégie de l'entreprise", Text),
    FieldDescriptor::new("notes", "Notes", Textarea),
];

const TACHE_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("tache_id", "ID", ReadOnly),
    FieldDescriptor::new("libelle", "Libellé", Text).required(),
    FieldDescriptor::new("status", "Status", Select(Choices::TaskStatuses)),
    FieldDescriptor::new("date_objectif", "Date Objectif", Date),
    FieldDescriptor::new("notes", "Notes", Textarea),
    FieldDescriptor::new("prospect_id", "Prospect", Select(Choices::Prospects)),
];

const EMAIL_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("email_id", "ID", ReadOnly),
    FieldDescriptor::new("prospect_id", "Prospect", Select(Choices::Prospects)),
    FieldDescriptor::new("date_email", "Date Email", DateTimeLocal),
    FieldDescriptor::new("expediteur", "Expéditeur", Text),
    FieldDescriptor::new("destinataire", "Destinataire", Text),
    FieldDescriptor::new("sujet", "Sujet", Text),
    FieldDescriptor::new("corps", "Corps", Textarea),
];

const APPEL_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("appel_id", "ID", ReadOnly),
    FieldDescriptor::new("prospect_id", "Prospect", Select(Choices::Prospects)),
    FieldDescriptor::new("date_appel", "Date Appel", DateTimeLocal),
    FieldDescriptor::new("notes", "Notes", Textarea),
];

const MEETING_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("meeting_id", "ID", ReadOnly),
    FieldDescriptor::new("prospect_id", "Prospect", Select(Choices::Prospects)),
    FieldDescriptor::new("date_meeting", "Date Meeting", DateTimeLocal),
    FieldDescriptor::new("participants", "Participants", Text),
    FieldDescriptor::new("notes", "Notes", Textarea),
];

/// Form fields of an entity, in display order.
pub fn fields(kind: EntityKind) -> &'static [FieldDescriptor] {
    match kind {
        EntityKind::Prospect => PROSPECT_FIELDS,
        EntityKind::Entreprise => ENTREPRISE_FIELDS,
        EntityKind::Tache => TACHE_FIELDS,
        EntityKind::Email => EMAIL_FIELDS,
        EntityKind::Appel => APPEL_FIELDS,
        EntityKind::Meeting => MEETING_FIELDS,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    New,
    Edit(Id),
}

/// How the page script sends a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub method: &'static str,
    pub url: String,
}

/// One form, either blank for a create or filled from an existing row.
#[derive(Debug, Clone, PartialEq)]
pub struct FormDraft {
    pub entity: &'static EntityDescriptor,
    pub mode: FormMode,
    pub values: Vec<(&'static FieldDescriptor, String)>,
}

impl FormDraft {
    pub fn blank(kind: EntityKind) -> Self {
        Self {
            entity: kind.descriptor(),
            mode: FormMode::New,
            values: fields(kind).iter().map(|f| (f, String::new())).collect(),
        }
    }

    pub fn edit<E: Entity>(row: &E) -> Self {
        let record = serde_json::to_value(row).unwrap_or(Value::Null);
        Self {
            entity: E::descriptor(),
            mode: FormMode::Edit(row.id()),
            values: fields(E::KIND)
                .iter()
                .map(|f| (f, f.display_value(record.get(f.name))))
                .collect(),
        }
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.mode, FormMode::Edit(_))
    }

    pub fn value(&self, name: &str) -> &str {
        self.values
            .iter()
            .find(|(field, _)| field.name == name)
            .map(|(_, value)| value.as_str())
            .unwrap_or_default()
    }

    /// POST to the collection for new rows, PUT to the row for edits.
    pub fn submission(&self) -> Submission {
        let endpoint = format!("/api/{}", self.entity.route);
        match self.mode {
            FormMode::New => Submission {
                method: "POST",
                url: endpoint,
            },
            FormMode::Edit(id) => Submission {
                method: "PUT",
                url: format!("{}/{}", endpoint, id),
            },
        }
    }
}
