use itertools::Itertools;

use crate::model::{ColumnDef, ColumnKind, EntityDescriptor, EntityKind, CREATED_AT, UPDATED_AT};
use crate::store::traits::{StoreError, StoreResult};

pub const DEFAULT_TABLE_PREFIX: &str = "crm";
pub const DEFAULT_SCHEMA_VERSION: u32 = 5;

/// Physical table naming: `{prefix}_{table}_{version}`.
///
/// Structural changes bump the version; tables of older versions are left
/// behind untouched rather than migrated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNames {
    prefix: String,
    version: u32,
}

impl Default for SchemaNames {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_TABLE_PREFIX.to_string(),
            version: DEFAULT_SCHEMA_VERSION,
        }
    }
}

impl SchemaNames {
    /// The prefix ends up inside SQL identifiers, so only `[A-Za-z0-9_]` is allowed.
    pub fn new(prefix: &str, version: u32) -> StoreResult<Self> {
        let valid = !prefix.is_empty()
            && prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !prefix.starts_with(|c: char| c.is_ascii_digit());
        if !valid {
            return Err(StoreError::Configuration(format!(
                "table prefix '{}' must be a non-empty identifier of letters, digits and underscores",
                prefix
            )));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            version,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn table(&self, entity: &EntityDescriptor) -> String {
        format!("{}_{}_{}", self.prefix, entity.table, self.version)
    }

    /// If `table_name` is one of our tables from another schema version, return that version.
    pub fn abandoned_version(&self, table_name: &str) -> Option<u32> {
        EntityKind::ALL.iter().find_map(|kind| {
            let stem = format!("{}_{}_", self.prefix, kind.descriptor().table);
            let suffix = table_name.strip_prefix(&stem)?;
            if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            let version = suffix.parse::<u32>().ok()?;
            (version != self.version).then_some(version)
        })
    }

    /// `CREATE TABLE IF NOT EXISTS` statements, parents first.
    pub fn create_statements(&self) -> Vec<String> {
        EntityKind::ALL
            .iter()
            .flat_map(|kind| {
                let entity = kind.descriptor();
                let mut statements = vec![self.create_table(entity)];
                if let Some(reference) = entity.reference {
                    statements.push(format!(
                        "CREATE INDEX IF NOT EXISTS idx_{table}_{column} ON {table}({column})",
                        table = self.table(entity),
                        column = reference.column,
                    ));
                }
                statements
            })
            .collect()
    }

    fn create_table(&self, entity: &EntityDescriptor) -> String {
        let columns = std::iter::once(format!("{} BIGSERIAL PRIMARY KEY", entity.primary_key))
            .chain(entity.columns.iter().map(|column| self.column_ddl(entity, column)))
            .chain([
                format!("{} TIMESTAMPTZ NOT NULL DEFAULT NOW()", CREATED_AT),
                format!("{} TIMESTAMPTZ NOT NULL DEFAULT NOW()", UPDATED_AT),
            ])
            .join(",\n    ");

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            self.table(entity),
            columns
        )
    }

    fn column_ddl(&self, entity: &EntityDescriptor, column: &ColumnDef) -> String {
        let mut ddl = format!("{} {}", column.name, sql_type(column.kind));
        if column.required {
            ddl.push_str(" NOT NULL");
        }
        if column.unique {
            ddl.push_str(" UNIQUE");
        }
        if column.default_now {
            ddl.push_str(" DEFAULT NOW()");
        }
        if let Some(reference) = entity.reference.filter(|r| r.column == column.name) {
            let target = reference.target.descriptor();
            ddl.push_str(&format!(
                " REFERENCES {}({}) ON DELETE CASCADE",
                self.table(target),
                target.primary_key
            ));
        }
        ddl
    }
}

fn sql_type(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Text => "TEXT",
        ColumnKind::Integer => "BIGINT",
        ColumnKind::Date => "DATE",
        ColumnKind::DateTime => "TIMESTAMP",
        ColumnKind::Timestamp => "TIMESTAMPTZ",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PROSPECT, TACHE};

    #[test]
    fn test_table_names_carry_prefix_and_version() {
        let names = SchemaNames::new("acme", 7).unwrap();
        assert_eq!(names.table(&PROSPECT), "acme_prospects_7");
        assert_eq!(SchemaNames::default().table(&TACHE), "crm_taches_5");
    }

    #[test]
    fn test_prefix_must_be_an_identifier() {
        assert!(SchemaNames::new("crm; DROP TABLE x", 1).is_err());
        assert!(SchemaNames::new("", 1).is_err());
        assert!(SchemaNames::new("9lives", 1).is_err());
        assert!(SchemaNames::new("crm_prod", 1).is_ok());
    }

    #[test]
    fn test_abandoned_version_detection() {
        let names = SchemaNames::new("crm", 5).unwrap();
        assert_eq!(names.abandoned_version("crm_prospects_4"), Some(4));
        assert_eq!(names.abandoned_version("crm_historique_emails_1"), Some(1));
        assert_eq!(names.abandoned_version("crm_prospects_5"), None);
        assert_eq!(names.abandoned_version("other_prospects_4"), None);
        assert_eq!(names.abandoned_version("crm_prospects_old"), None);
    }

    #[test]
    fn test_prospect_ddl_has_unique_email_and_cascading_reference() {
        let statements = SchemaNames::default().create_statements();
        let prospects = statements
            .iter()
            .find(|s| s.starts_with("CREATE TABLE IF NOT EXISTS crm_prospects_5"))
            .unwrap();

        assert!(prospects.contains("prospect_id BIGSERIAL PRIMARY KEY"));
        assert!(prospects.contains("email TEXT NOT NULL UNIQUE"));
        assert!(prospects.contains(
            "entreprise_id BIGINT REFERENCES crm_entreprises_5(entreprise_id) ON DELETE CASCADE"
        ));
        assert!(prospects.contains("date_mise_a_jour TIMESTAMPTZ NOT NULL DEFAULT NOW()"));

        let entreprises_at = statements
            .iter()
            .position(|s| s.contains("TABLE IF NOT EXISTS crm_entreprises_5"))
            .unwrap();
        let prospects_at = statements
            .iter()
            .position(|s| s.contains("TABLE IF NOT EXISTS crm_prospects_5"))
            .unwrap();
        assert!(entreprises_at < prospects_at);
    }
}
