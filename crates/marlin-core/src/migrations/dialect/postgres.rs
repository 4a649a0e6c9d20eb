//! PostgreSQL dialect for migrations.

use super::MigrationDialect;
use crate::config::CompileOptions;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::schema::{normalize_type, postgres_storage_type, postgres_type, Field, Schema};
use crate::value::SqlValue;

/// PostgreSQL dialect for migration SQL generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Auto-increment is expressed through the serial pseudo-types.
    fn column_type(field: &Field) -> String {
        let ty = postgres_type(&field.field_type);
        if !field.auto_increment {
            return ty;
        }
        match normalize_type(&ty).as_str() {
            "int" => String::from("serial"),
            "bigint" => String::from("bigserial"),
            "smallint" => String::from("smallserial"),
            _ => ty,
        }
    }

    fn comment_on(&self, table: &str, field: &Field) -> Option<String> {
        field.comment.as_ref().map(|comment| {
            format!(
                "COMMENT ON COLUMN {}.{} IS {}",
                self.quote_identifier(table),
                self.quote_identifier(&field.name),
                SqlValue::Text(comment.clone()).render_literal(Dialect::Postgres)
            )
        })
    }
}

impl MigrationDialect for PostgresDialect {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn column_definition(&self, field: &Field, default: Option<&str>) -> String {
        let mut sql = format!(
            "{} {}",
            self.quote_identifier(&field.name),
            Self::column_type(field)
        );
        if field.not_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(value) = default {
            sql.push_str(" DEFAULT ");
            sql.push_str(value);
        }
        sql
    }

    /// Indexes and column comments follow as separate statements.
    fn create_table(&self, schema: &Schema, _options: &CompileOptions) -> Result<Vec<String>> {
        let body = self.table_body(schema)?;
        let mut out = vec![format!(
            "CREATE TABLE {} (\n    {}\n)",
            self.quote_identifier(schema.name()),
            body.join(",\n    ")
        )];
        for index in schema.indexes() {
            out.push(self.create_index(schema.name(), index));
        }
        out.extend(
            schema
                .fields()
                .iter()
                .filter_map(|f| self.comment_on(schema.name(), f)),
        );
        Ok(out)
    }

    fn column_comment(&self, table: &str, field: &Field) -> Option<String> {
        self.comment_on(table, field)
    }

    fn change_column_type(&self, table: &str, field: &Field) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} ALTER COLUMN {} TYPE {}",
            self.quote_identifier(table),
            self.quote_identifier(&field.name),
            postgres_storage_type(&field.field_type)
        ))
    }
}
