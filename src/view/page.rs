//! Server-rendered CRM page.
//!
//! The page is rebuilt from the API collections on every request; writes go
//! through `static/crm.js`, which reloads the page once the API answers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::logic::{CrmResult, Repository};
use crate::model::{
    Entity, EntityKind, Entreprise, HistoriqueAppel, HistoriqueEmail, HistoriqueMeeting, Id,
    Prospect, Tache, TACHE_STATUSES,
};
use crate::store::traits::Store;
use crate::view::filter::{filter_by_target_date, parse_date_filter, Searchable, TextFilter};
use crate::view::form::{fields, Choices, FieldDescriptor, FormDraft, InputKind};
use crate::view::projection::{join_prospects, project_prospects, MISSING_LABEL};
use crate::view::tab::Tab;

const TITLE: &str = "Gestion de Prospects et Entreprises";

/// Query string of the page: `?tab=…&q=…&date=…&edit=…`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub tab: Option<String>,
    pub q: Option<String>,
    pub date: Option<String>,
    pub edit: Option<String>,
}

impl PageQuery {
    pub fn tab(&self) -> Tab {
        Tab::from_query(self.tab.as_deref())
    }

    fn edit_id(&self) -> Option<Id> {
        self.edit.as_deref().and_then(|raw| raw.trim().parse().ok())
    }
}

/// The entity lists a page is rendered from. Collections a tab does not
/// need stay empty.
#[derive(Debug, Clone, Default)]
pub struct Collections {
    pub entreprises: Vec<Entreprise>,
    pub prospects: Vec<Prospect>,
    pub taches: Vec<Tache>,
    pub emails: Vec<HistoriqueEmail>,
    pub appels: Vec<HistoriqueAppel>,
    pub meetings: Vec<HistoriqueMeeting>,
}

impl Collections {
    pub async fn load<S: Store>(store: &S, tab: Tab) -> CrmResult<Self> {
        let mut data = Self::default();
        for kind in tab.collections() {
            match kind {
                EntityKind::Entreprise => {
                    data.entreprises = Repository::<S, Entreprise>::new(store).list().await?
                }
                EntityKind::Prospect => {
                    data.prospects = Repository::<S, Prospect>::new(store).list().await?
                }
                EntityKind::Tache => {
                    data.taches = Repository::<S, Tache>::new(store).list().await?
                }
                EntityKind::Email => {
                    data.emails = Repository::<S, HistoriqueEmail>::new(store).list().await?
                }
                EntityKind::Appel => {
                    data.appels = Repository::<S, HistoriqueAppel>::new(store).list().await?
                }
                EntityKind::Meeting => {
                    data.meetings = Repository::<S, HistoriqueMeeting>::new(store).list().await?
                }
            }
        }
        Ok(data)
    }
}

pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn find_draft<E: Entity>(rows: &[E], id: Option<Id>) -> Option<FormDraft> {
    let id = id?;
    rows.iter().find(|row| row.id() == id).map(FormDraft::edit)
}

/// Filter the tab's rows and serialize them for the list.
fn filtered_rows<T: Searchable + Serialize>(filter: &TextFilter, rows: Vec<T>) -> Vec<Map<String, Value>> {
    filter
        .apply(rows)
        .iter()
        .filter_map(|row| match serde_json::to_value(row) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        })
        .collect()
}

pub fn render_page(query: &PageQuery, data: &Collections) -> String {
    let tab = query.tab();
    let filter = TextFilter::new(query.q.as_deref());
    let edit_id = query.edit_id();

    let (rows, draft) = match tab {
        Tab::Prospects => (
            filtered_rows(&filter, project_prospects(&data.prospects, &data.entreprises)),
            find_draft(&data.prospects, edit_id),
        ),
        Tab::Entreprises => (
            filtered_rows(&filter, data.entreprises.clone()),
            find_draft(&data.entreprises, edit_id),
        ),
        Tab::Taches => {
            let joined = join_prospects(&data.taches, &data.prospects, "");
            let dated = filter_by_target_date(joined, parse_date_filter(query.date.as_deref()));
            (filtered_rows(&filter, dated), find_draft(&data.taches, edit_id))
        }
        Tab::Emails => (
            filtered_rows(&filter, join_prospects(&data.emails, &data.prospects, MISSING_LABEL)),
            find_draft(&data.emails, edit_id),
        ),
        Tab::Appels => (
            filtered_rows(&filter, join_prospects(&data.appels, &data.prospects, MISSING_LABEL)),
            find_draft(&data.appels, edit_id),
        ),
        Tab::Meetings => (
            filtered_rows(&filter, join_prospects(&data.meetings, &data.prospects, MISSING_LABEL)),
            find_draft(&data.meetings, edit_id),
        ),
    };
    let draft = draft.unwrap_or_else(|| FormDraft::blank(tab.entity()));

    let mut html = String::new();
    html.push_str(&format!(
        "<!DOCTYPE html>\n<html lang=\"fr\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <link rel=\"stylesheet\" href=\"/static/crm.css\">\n<script src=\"/static/crm.js\" defer></script>\n\
         </head>\n<body>\n<div class=\"container\">\n<h1>{title}</h1>\n",
        title = TITLE
    ));
    html.push_str(&render_tabs(tab));
    html.push_str(&render_filters(tab, query));
    html.push_str(&render_form(tab, &draft, data));
    html.push_str(&render_list(tab, &rows));
    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn render_tabs(active: Tab) -> String {
    let mut html = String::from("<nav class=\"tabs\">\n");
    for tab in Tab::ALL {
        let class = if tab == active { "tab active" } else { "tab" };
        html.push_str(&format!(
            "<a class=\"{}\" href=\"/?tab={}\">{}</a>\n",
            class,
            tab.slug(),
            escape(tab.label())
        ));
    }
    html.push_str("</nav>\n");
    html
}

fn render_filters(tab: Tab, query: &PageQuery) -> String {
    format!(
        "<form class=\"filters\" method=\"get\" action=\"/\">\n\
         <input type=\"hidden\" name=\"tab\" value=\"{}\">\n\
         <input type=\"text\" name=\"q\" value=\"{}\" placeholder=\"Rechercher...\">\n\
         <input type=\"date\" name=\"date\" value=\"{}\" placeholder=\"Filtrer par date\">\n\
         <button type=\"submit\">Filtrer</button>\n</form>\n",
        tab.slug(),
        escape(query.q.as_deref().unwrap_or_default()),
        escape(query.date.as_deref().unwrap_or_default())
    )
}

fn choices(source: Choices, data: &Collections) -> Vec<(String, String)> {
    match source {
        Choices::Entreprises => data
            .entreprises
            .iter()
            .map(|e| (e.entreprise_id.to_string(), e.nom_entreprise.clone()))
            .collect(),
        Choices::Prospects => data
            .prospects
            .iter()
            .map(|p| (p.prospect_id.to_string(), p.full_name()))
            .collect(),
        Choices::TaskStatuses => TACHE_STATUSES
            .iter()
            .map(|s| (s.to_string(), s.to_string()))
            .collect(),
    }
}

fn render_input(field: &FieldDescriptor, value: &str, data: &Collections) -> String {
    let name = field.name;
    let value = escape(value);
    let required = if field.required { " required" } else { "" };
    let number = if field.is_reference() {
        " data-type=\"integer\""
    } else {
        ""
    };

    match field.input {
        InputKind::ReadOnly => format!(
            "<input id=\"{name}\" type=\"text\" name=\"{name}\" value=\"{value}\" readonly data-skip>"
        ),
        InputKind::Textarea => {
            format!("<textarea id=\"{name}\" name=\"{name}\"{required}>{value}</textarea>")
        }
        InputKind::Select(source) => {
            let mut html =
                format!("<select id=\"{name}\" name=\"{name}\"{required}{number}>\n<option value=\"\">Sélectionnez une option</option>\n");
            for (option, label) in choices(source, data) {
                let selected = if escape(&option) == value { " selected" } else { "" };
                html.push_str(&format!(
                    "<option value=\"{}\"{}>{}</option>\n",
                    escape(&option),
                    selected,
                    escape(&label)
                ));
            }
            html.push_str("</select>");
            html
        }
        other => {
            let kind = match other {
                InputKind::Email => "email",
                InputKind::Tel => "tel",
                InputKind::Date => "date",
                InputKind::DateTimeLocal => "datetime-local",
                _ => "text",
            };
            format!(
                "<input id=\"{name}\" type=\"{kind}\" name=\"{name}\" value=\"{value}\" placeholder=\"{}\"{required}>",
                escape(field.label)
            )
        }
    }
}

fn render_form(tab: Tab, draft: &FormDraft, data: &Collections) -> String {
    let submission = draft.submission();
    let mut html = format!(
        "<form class=\"crm-form\" data-method=\"{}\" data-url=\"{}\">\n",
        submission.method,
        escape(&submission.url)
    );
    for (field, value) in &draft.values {
        html.push_str(&format!(
            "<div class=\"field\">\n<label for=\"{}\">{}</label>\n{}\n</div>\n",
            field.name,
            escape(field.label),
            render_input(field, value, data)
        ));
    }
    let action = if draft.is_edit() { "Mettre à jour" } else { "Ajouter" };
    html.push_str(&format!("<button type=\"submit\">{}</button>\n", action));
    if draft.is_edit() {
        html.push_str(&format!(
            "<a class=\"cancel\" href=\"/?tab={}\">Annuler</a>\n",
            tab.slug()
        ));
    }
    html.push_str("</form>\n");
    html
}

/// Text shown for one field of a list row.
fn display_value(kind: EntityKind, field: &FieldDescriptor, row: &Map<String, Value>) -> String {
    let joined = match field.name {
        "entreprise_id" if kind == EntityKind::Prospect => row.get("entrepriseName"),
        "prospect_id" if kind != EntityKind::Prospect => row.get("prospectFullName"),
        _ => row.get(field.name),
    };
    match joined {
        None | Some(Value::Null) => MISSING_LABEL.to_string(),
        Some(Value::String(s)) if s.is_empty() => MISSING_LABEL.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn render_list(tab: Tab, rows: &[Map<String, Value>]) -> String {
    let kind = tab.entity();
    let descriptor = kind.descriptor();
    let endpoint = format!("/api/{}", descriptor.route);

    let mut html = String::from("<ul class=\"crm-list\">\n");
    for row in rows {
        let id = row.get(descriptor.primary_key).and_then(Value::as_i64).unwrap_or_default();
        html.push_str("<li>\n");
        for field in fields(kind) {
            html.push_str(&format!(
                "<span>{}: {}</span><br>\n",
                escape(field.label),
                escape(&display_value(kind, field, row))
            ));
        }
        html.push_str(&format!(
            "<div class=\"actions\">\n<a class=\"edit\" href=\"/?tab={}&amp;edit={}\">Modifier</a>\n\
             <button type=\"button\" data-delete=\"{}/{}\">Supprimer</button>\n</div>\n</li>\n",
            tab.slug(),
            id,
            endpoint,
            id
        ));
    }
    html.push_str("</ul>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewEntreprise, NewProspect, NewTache};
    use crate::store::MemoryStore;
    use crate::view::projection::fixtures::{entreprise, prospect, tache};
    use chrono::NaiveDate;

    fn sample() -> Collections {
        Collections {
            entreprises: vec![entreprise(1, "Acme"), entreprise(2, "Globex")],
            prospects: vec![
                prospect(1, "Doe", "Jane", Some(1)),
                prospect(2, "Roe", "John", None),
            ],
            taches: vec![
                tache(1, "Relancer", Some(1), NaiveDate::from_ymd_opt(2024, 3, 1)),
                tache(2, "Préparer devis", None, None),
            ],
            ..Default::default()
        }
    }

    fn query(tab: &str) -> PageQuery {
        PageQuery {
            tab: Some(tab.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>\"Tom\" & 'Jerry'</b>"), "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;");
    }

    #[test]
    fn test_prospect_tab_shows_entreprise_names() {
        let html = render_page(&query("prospects"), &sample());
        assert!(html.contains("<span>Entreprise: Acme</span>"));
        assert!(html.contains("<span>Entreprise: N/A</span>"));
        assert!(html.contains("data-method=\"POST\" data-url=\"/api/prospects\""));
        assert!(html.contains("<option value=\"1\">Acme</option>"));
    }

    #[test]
    fn test_text_filter_limits_rows() {
        let mut q = query("prospects");
        q.q = Some("john".to_string());
        let html = render_page(&q, &sample());
        assert!(html.contains("Roe"));
        assert!(!html.contains("<span>Nom: Doe</span>"));
    }

    #[test]
    fn test_task_date_filter() {
        let mut q = query("taches");
        q.date = Some("2024-02-01".to_string());
        let html = render_page(&q, &sample());
        assert!(html.contains("Relancer"));
        assert!(html.contains("<span>Prospect: Doe Jane</span>"));
        assert!(!html.contains("Préparer devis"));
    }

    #[test]
    fn test_edit_query_fills_the_form() {
        let mut q = query("prospects");
        q.edit = Some("1".to_string());
        let html = render_page(&q, &sample());
        assert!(html.contains("data-method=\"PUT\" data-url=\"/api/prospects/1\""));
        assert!(html.contains("<option value=\"1\" selected>Acme</option>"));
        assert!(html.contains("Mettre à jour"));

        // An unknown id falls back to a blank form.
        q.edit = Some("99".to_string());
        let html = render_page(&q, &sample());
        assert!(html.contains("data-method=\"POST\""));
    }

    #[test]
    fn test_user_content_is_escaped() {
        let mut data = sample();
        data.entreprises[0].nom_entreprise = "<script>alert(1)</script>".to_string();
        let html = render_page(&query("entreprises"), &data);
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[tokio::test]
    async fn test_load_fetches_only_needed_collections() {
        let store = MemoryStore::new();
        let acme = Repository::<_, Entreprise>::new(&store)
            .create(NewEntreprise {
                nom_entreprise: "Acme".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        Repository::<_, Prospect>::new(&store)
            .create(NewProspect {
                nom: "Doe".to_string(),
                prenom: "Jane".to_string(),
                email: "jane@acme.test".to_string(),
                entreprise_id: Some(acme.entreprise_id),
                ..Default::default()
            })
            .await
            .unwrap();
        Repository::<_, Tache>::new(&store)
            .create(NewTache {
                libelle: "Relancer".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let data = Collections::load(&store, Tab::Entreprises).await.unwrap();
        assert_eq!(data.entreprises.len(), 1);
        assert!(data.prospects.is_empty());
        assert!(data.taches.is_empty());

        let data = Collections::load(&store, Tab::Taches).await.unwrap();
        assert_eq!(data.prospects.len(), 1);
        assert_eq!(data.taches.len(), 1);
    }
}
