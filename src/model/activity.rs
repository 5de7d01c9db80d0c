//! Per-prospect activity history: emails, calls and meetings.
//!
//! Each record optionally points at a prospect and carries its own event
//! date, which the store fills with the current time when a create request
//! leaves it out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    Changeset, Entity, EntityKind, Id, LocalDateTime, Payload, ProspectLinked, Update,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoriqueEmail {
    pub email_id: Id,
    pub prospect_id: Option<Id>,
    pub date_email: Option<LocalDateTime>,
    pub expediteur: Option<String>,
    pub destinataire: Option<String>,
    pub sujet: Option<String>,
    pub corps: Option<String>,
    pub date_creation: DateTime<Utc>,
    pub date_mise_a_jour: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewHistoriqueEmail {
    pub prospect_id: Option<Id>,
    pub date_email: Option<LocalDateTime>,
    pub expediteur: Option<String>,
    pub destinataire: Option<String>,
    pub sujet: Option<String>,
    pub corps: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HistoriqueEmailPatch {
    pub prospect_id: Update<Id>,
    pub date_email: Update<LocalDateTime>,
    pub expediteur: Update<String>,
    pub destinataire: Update<String>,
    pub sujet: Update<String>,
    pub corps: Update<String>,
}

impl Entity for HistoriqueEmail {
    type Draft = NewHistoriqueEmail;
    type Patch = HistoriqueEmailPatch;

    const KIND: EntityKind = EntityKind::Email;

    fn id(&self) -> Id {
        self.email_id
    }
}

impl Payload for NewHistoriqueEmail {
    fn into_changeset(self) -> Changeset {
        Changeset::new()
            .with("prospect_id", self.prospect_id)
            .with_present("date_email", self.date_email)
            .with("expediteur", self.expediteur)
            .with("destinataire", self.destinataire)
            .with("sujet", self.sujet)
            .with("corps", self.corps)
    }
}

impl Payload for HistoriqueEmailPatch {
    fn into_changeset(self) -> Changeset {
        Changeset::new()
            .with_update("prospect_id", self.prospect_id)
            .with_update("date_email", self.date_email)
            .with_update("expediteur", self.expediteur)
            .with_update("destinataire", self.destinataire)
            .with_update("sujet", self.sujet)
            .with_update("corps", self.corps)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoriqueAppel {
    pub appel_id: Id,
    pub prospect_id: Option<Id>,
    pub date_appel: Option<LocalDateTime>,
    pub notes: Option<String>,
    pub date_creation: DateTime<Utc>,
    pub date_mise_a_jour: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewHistoriqueAppel {
    pub prospect_id: Option<Id>,
    pub date_appel: Option<LocalDateTime>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HistoriqueAppelPatch {
    pub prospect_id: Update<Id>,
    pub date_appel: Update<LocalDateTime>,
    pub notes: Update<String>,
}

impl Entity for HistoriqueAppel {
    type Draft = NewHistoriqueAppel;
    type Patch = HistoriqueAppelPatch;

    const KIND: EntityKind = EntityKind::Appel;

    fn id(&self) -> Id {
        self.appel_id
    }
}

impl Payload for NewHistoriqueAppel {
    fn into_changeset(self) -> Changeset {
        Changeset::new()
            .with("prospect_id", self.prospect_id)
            .with_present("date_appel", self.date_appel)
            .with("notes", self.notes)
    }
}

impl Payload for HistoriqueAppelPatch {
    fn into_changeset(self) -> Changeset {
        Changeset::new()
            .with_update("prospect_id", self.prospect_id)
            .with_update("date_appel", self.date_appel)
            .with_update("notes", self.notes)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoriqueMeeting {
    pub meeting_id: Id,
    pub prospect_id: Option<Id>,
    pub date_meeting: Option<LocalDateTime>,
    pub participants: Option<String>,
    pub notes: Option<String>,
    pub date_creation: DateTime<Utc>,
    pub date_mise_a_jour: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewHistoriqueMeeting {
    pub prospect_id: Option<Id>,
    pub date_meeting: Option<LocalDateTime>,
    pub participants: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HistoriqueMeetingPatch {
    pub prospect_id: Update<Id>,
    pub date_meeting: Update<LocalDateTime>,
    pub participants: Update<String>,
    pub notes: Update<String>,
}

impl Entity for HistoriqueMeeting {
    type Draft = NewHistoriqueMeeting;
    type Patch = HistoriqueMeetingPatch;

    const KIND: EntityKind = EntityKind::Meeting;

    fn id(&self) -> Id {
        self.meeting_id
    }
}

impl Payload for NewHistoriqueMeeting {
    fn into_changeset(self) -> Changeset {
        Changeset::new()
            .with("prospect_id", self.prospect_id)
            .with_present("date_meeting", self.date_meeting)
            .with("participants", self.participants)
            .with("notes", self.notes)
    }
}

impl Payload for HistoriqueMeetingPatch {
    fn into_changeset(self) -> Changeset {
        Changeset::new()
            .with_update("prospect_id", self.prospect_id)
            .with_update("date_meeting", self.date_meeting)
            .with_update("participants", self.participants)
            .with_update("notes", self.notes)
    }
}

impl ProspectLinked for HistoriqueEmail {
    fn prospect_id(&self) -> Option<Id> {
        self.prospect_id
    }
}

impl ProspectLinked for HistoriqueAppel {
    fn prospect_id(&self) -> Option<Id> {
        self.prospect_id
    }
}

impl ProspectLinked for HistoriqueMeeting {
    fn prospect_id(&self) -> Option<Id> {
        self.prospect_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldValue;

    #[test]
    fn test_missing_event_date_is_left_to_the_store() {
        let draft: NewHistoriqueAppel =
            serde_json::from_str(r#"{"prospect_id": 3, "notes": "voicemail"}"#).unwrap();
        let changes = draft.into_changeset();
        assert!(changes.get("date_appel").is_none());
        assert_eq!(changes.get("prospect_id"), Some(&FieldValue::Integer(Some(3))));
    }

    #[test]
    fn test_browser_date_time_is_accepted() {
        let draft: NewHistoriqueMeeting =
            serde_json::from_str(r#"{"date_meeting": "2024-06-12T09:30", "participants": "Jane"}"#)
                .unwrap();
        assert_eq!(
            draft.date_meeting.map(|d| d.to_string()).as_deref(),
            Some("2024-06-12T09:30:00")
        );
    }
}
