//! Record shapes shared by every tenant.
//!
//! Each shape is plain data; [`RecordSchema::create_statements`] renders it to
//! the DDL a repository handle runs once against its connection before the
//! first query.

use crate::database::models::ShiftRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Uuid,
    Text,
    Boolean,
    Date,
    Timestamp,
}

impl FieldType {
    fn sql_type(&self) -> &'static str {
        match self {
            FieldType::Uuid => "BLOB",
            FieldType::Text => "TEXT",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Date => "DATE",
            FieldType::Timestamp => "TIMESTAMP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    None,
    Text(&'static str),
    Boolean(bool),
    Now,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    pub primary_key: bool,
    pub required: bool,
    pub unique: bool,
    /// Compare and enforce uniqueness ignoring ASCII case.
    pub case_insensitive: bool,
    pub default: FieldDefault,
    /// Closed set of accepted values; empty means unrestricted.
    pub allowed_values: &'static [&'static str],
}

impl FieldSpec {
    pub const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            primary_key: false,
            required: false,
            unique: false,
            case_insensitive: false,
            default: FieldDefault::None,
            allowed_values: &[],
        }
    }

    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.required = true;
        self
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub const fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    pub const fn default(mut self, default: FieldDefault) -> Self {
        self.default = default;
        self
    }

    pub const fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.allowed_values = values;
        self
    }

    fn column_definition(&self) -> String {
        let mut definition = format!("{} {}", self.name, self.field_type.sql_type());

        if self.primary_key {
            definition.push_str(" PRIMARY KEY");
        }
        if self.required {
            definition.push_str(" NOT NULL");
        }
        if self.case_insensitive {
            definition.push_str(" COLLATE NOCASE");
        }
        if self.unique {
            definition.push_str(" UNIQUE");
        }
        match self.default {
            FieldDefault::None => {}
            FieldDefault::Text(value) => {
                definition.push_str(&format!(" DEFAULT '{}'", value.replace('\'', "''")))
            }
            FieldDefault::Boolean(value) => {
                definition.push_str(if value { " DEFAULT 1" } else { " DEFAULT 0" })
            }
            FieldDefault::Now => definition.push_str(" DEFAULT CURRENT_TIMESTAMP"),
        }
        if !self.allowed_values.is_empty() {
            let values = self
                .allowed_values
                .iter()
                .map(|value| format!("'{}'", value.replace('\'', "''")))
                .collect::<Vec<_>>()
                .join(", ");
            definition.push_str(&format!(" CHECK ({} IN ({}))", self.name, values));
        }

        definition
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy)]
pub struct IndexSpec {
    pub name: &'static str,
    pub field: &'static str,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy)]
pub struct RecordSchema {
    pub table: &'static str,
    pub fields: &'static [FieldSpec],
    pub indexes: &'static [IndexSpec],
}

impl RecordSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Idempotent DDL: the table first, then each secondary index.
    pub fn create_statements(&self) -> Vec<String> {
        let columns = self
            .fields
            .iter()
            .map(FieldSpec::column_definition)
            .collect::<Vec<_>>()
            .join(",\n    ");

        let mut statements = vec![format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            self.table, columns
        )];

        statements.extend(self.indexes.iter().map(|index| {
            let order = match index.order {
                SortOrder::Ascending => "ASC",
                SortOrder::Descending => "DESC",
            };
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({} {})",
                index.name, self.table, index.field, order
            )
        }));

        statements
    }
}

pub const USER_SCHEMA: RecordSchema = RecordSchema {
    table: "users",
    fields: &[
        FieldSpec::new("id", FieldType::Uuid).primary_key(),
        FieldSpec::new("email", FieldType::Text)
            .required()
            .unique()
            .case_insensitive(),
        FieldSpec::new("password_hash", FieldType::Text).required(),
        FieldSpec::new("is_owner", FieldType::Boolean)
            .required()
            .default(FieldDefault::Boolean(false)),
        FieldSpec::new("name", FieldType::Text),
        FieldSpec::new("created_at", FieldType::Timestamp)
            .required()
            .default(FieldDefault::Now),
    ],
    indexes: &[],
};

pub const SHIFT_SCHEMA: RecordSchema = RecordSchema {
    table: "shifts",
    fields: &[
        FieldSpec::new("id", FieldType::Uuid).primary_key(),
        FieldSpec::new("date", FieldType::Date).required(),
        FieldSpec::new("start_time", FieldType::Text).required(),
        FieldSpec::new("end_time", FieldType::Text).required(),
        FieldSpec::new("employee_name", FieldType::Text).required(),
        FieldSpec::new("role", FieldType::Text)
            .required()
            .one_of(ShiftRole::VALUES),
        FieldSpec::new("notes", FieldType::Text)
            .required()
            .default(FieldDefault::Text("")),
        FieldSpec::new("created_by", FieldType::Uuid).required(),
        FieldSpec::new("created_at", FieldType::Timestamp)
            .required()
            .default(FieldDefault::Now),
    ],
    indexes: &[IndexSpec {
        name: "idx_shifts_date",
        field: "date",
        order: SortOrder::Ascending,
    }],
};

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn user_table_enforces_case_insensitive_unique_email() {
        let statements = USER_SCHEMA.create_statements();
        assert_eq!(statements.len(), 1);

        let table = &statements[0];
        assert!(table.starts_with("CREATE TABLE IF NOT EXISTS users ("));
        assert!(table.contains("email TEXT NOT NULL COLLATE NOCASE UNIQUE"));
        assert!(table.contains("is_owner BOOLEAN NOT NULL DEFAULT 0"));
        assert!(table.contains("name TEXT,") || table.contains("name TEXT\n"));
    }

    #[test]
    fn shift_table_restricts_roles_and_indexes_date() {
        let statements = SHIFT_SCHEMA.create_statements();
        assert_eq!(statements.len(), 2);

        assert!(statements[0].contains(
            "role TEXT NOT NULL CHECK (role IN ('Server', 'Cook', 'Bartender', 'Host', 'Manager', 'Dishwasher'))"
        ));
        assert!(statements[0].contains("notes TEXT NOT NULL DEFAULT ''"));
        assert_eq!(
            statements[1],
            "CREATE INDEX IF NOT EXISTS idx_shifts_date ON shifts (date ASC)"
        );
    }

    #[test]
    fn field_lookup_exposes_constraints() {
        let email = USER_SCHEMA.field("email").unwrap();
        assert!(email.required && email.unique && email.case_insensitive);

        let name = USER_SCHEMA.field("name").unwrap();
        assert!(!name.required);

        assert!(SHIFT_SCHEMA.field("missing").is_none());
    }
}
