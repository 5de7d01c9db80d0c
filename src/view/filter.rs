use chrono::NaiveDate;

use crate::model::{Entreprise, HistoriqueAppel, HistoriqueEmail, HistoriqueMeeting, Tache};
use crate::view::projection::{Joined, ProspectView};

/// Fields a list row exposes to the free-text filter.
pub trait Searchable {
    fn search_fields(&self) -> Vec<Option<&str>>;
}

impl Searchable for ProspectView {
    fn search_fields(&self) -> Vec<Option<&str>> {
        let p = &self.prospect;
        vec![Some(p.nom.as_str()), Some(p.prenom.as_str()), Some(p.email.as_str())]
    }
}

impl Searchable for Entreprise {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.nom_entreprise.as_str()),
            self.secteur_activite.as_deref(),
            self.adresse.as_deref(),
        ]
    }
}

impl Searchable for Joined<Tache> {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.row.libelle.as_str()),
            self.row.status.as_deref(),
            self.row.notes.as_deref(),
            Some(self.prospect_full_name.as_str()),
        ]
    }
}

impl Searchable for Joined<HistoriqueEmail> {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            self.row.sujet.as_deref(),
            self.row.expediteur.as_deref(),
            self.row.destinataire.as_deref(),
            self.row.corps.as_deref(),
            Some(self.prospect_full_name.as_str()),
        ]
    }
}

impl Searchable for Joined<HistoriqueAppel> {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![self.row.notes.as_deref(), Some(self.prospect_full_name.as_str())]
    }
}

impl Searchable for Joined<HistoriqueMeeting> {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            self.row.notes.as_deref(),
            self.row.participants.as_deref(),
            Some(self.prospect_full_name.as_str()),
        ]
    }
}

/// Case-insensitive substring filter over a row's searchable fields.
#[derive(Debug, Clone, Default)]
pub struct TextFilter {
    needle: String,
}

impl TextFilter {
    pub fn new(query: Option<&str>) -> Self {
        Self {
            needle: query.unwrap_or_default().to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    pub fn matches<T: Searchable>(&self, row: &T) -> bool {
        self.is_empty()
            || row
                .search_fields()
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&self.needle))
    }

    pub fn apply<T: Searchable>(&self, rows: Vec<T>) -> Vec<T> {
        rows.into_iter().filter(|row| self.matches(row)).collect()
    }
}

/// Keep tasks due on or after `from`. Tasks without a target date drop out
/// while the filter is set.
pub fn filter_by_target_date(rows: Vec<Joined<Tache>>, from: Option<NaiveDate>) -> Vec<Joined<Tache>> {
    match from {
        None => rows,
        Some(from) => rows
            .into_iter()
            .filter(|task| task.row.date_objectif.is_some_and(|due| due >= from))
            .collect(),
    }
}

/// Parse the `date` query parameter; anything that is not `YYYY-MM-DD` disables the filter.
pub fn parse_date_filter(value: Option<&str>) -> Option<NaiveDate> {
    value
        .filter(|v| !v.is_empty())
        .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::projection::fixtures::{entreprise, prospect, tache};
    use crate::view::projection::{join_prospects, project_prospects};

    #[test]
    fn test_empty_filter_keeps_everything() {
        let rows = vec![entreprise(1, "Acme"), entreprise(2, "Globex")];
        assert_eq!(TextFilter::new(Some("")).apply(rows.clone()), rows);
        assert_eq!(TextFilter::new(None).apply(rows.clone()), rows);
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let rows = vec![entreprise(1, "Acme"), entreprise(2, "Globex")];
        let kept = TextFilter::new(Some("ACM")).apply(rows);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].nom_entreprise, "Acme");
    }

    #[test]
    fn test_filter_only_looks_at_allowed_fields() {
        let mut acme = entreprise(1, "Acme");
        acme.notes = Some("secret".to_string());
        assert!(!TextFilter::new(Some("secret")).matches(&acme));
        assert!(TextFilter::new(Some("paix")).matches(&acme));

        let views = project_prospects(&[prospect(1, "Doe", "Jane", Some(1))], &[acme]);
        // The joined company name is not searchable on prospects.
        assert!(!TextFilter::new(Some("acme")).matches(&views[0]));
        assert!(TextFilter::new(Some("jane@")).matches(&views[0]));
    }

    #[test]
    fn test_tasks_match_on_prospect_full_name() {
        let prospects = vec![prospect(3, "Doe", "Jane", None)];
        let taches = join_prospects(&[tache(1, "Relancer", Some(3), None)], &prospects, "");
        assert!(TextFilter::new(Some("doe jane")).matches(&taches[0]));
    }

    #[test]
    fn test_target_date_filter() {
        let date = |d: &str| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap();
        let rows = join_prospects(
            &[
                tache(1, "Passée", None, Some(date("2024-01-10"))),
                tache(2, "Le jour même", None, Some(date("2024-02-01"))),
                tache(3, "Future", None, Some(date("2024-03-15"))),
                tache(4, "Sans date", None, None),
            ],
            &[],
            "",
        );

        assert_eq!(filter_by_target_date(rows.clone(), None).len(), 4);
        let kept: Vec<_> = filter_by_target_date(rows, Some(date("2024-02-01")))
            .into_iter()
            .map(|t| t.row.tache_id)
            .collect();
        assert_eq!(kept, vec![2, 3]);
    }

    #[test]
    fn test_parse_date_filter() {
        assert_eq!(parse_date_filter(Some("")), None);
        assert_eq!(parse_date_filter(Some("demain")), None);
        assert_eq!(
            parse_date_filter(Some("2024-05-01")),
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
    }
}
