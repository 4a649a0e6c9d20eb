//! SQLite dialect for migrations.

use super::MigrationDialect;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::schema::{Field, Index, Schema};

/// SQLite dialect for migration SQL generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl MigrationDialect for SqliteDialect {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn column_definition(&self, field: &Field, default: Option<&str>) -> String {
        // AUTOINCREMENT is only accepted on an INTEGER PRIMARY KEY column.
        if field.primary && field.auto_increment {
            return format!(
                "{} INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL",
                self.quote_identifier(&field.name)
            );
        }
        let mut sql = format!(
            "{} {}",
            self.quote_identifier(&field.name),
            field.field_type
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

    /// A column added to an existing table needs a constant default.
    fn backfill_default(&self, field: &Field) -> Result<Option<String>> {
        if let Some(sql) = field.default.expression() {
            return Err(Error::unsupported(
                Dialect::Sqlite,
                format!("ADD COLUMN {} with non-constant default {sql}", field.name),
            ));
        }
        super::default_or_zero(Dialect::Sqlite, field)
    }

    fn table_body(&self, schema: &Schema) -> Result<Vec<String>> {
        let primary = schema.primary_field()?;
        let mut lines: Vec<String> = schema
            .fields()
            .iter()
            .map(|f| self.column_definition(f, f.default.expression()))
            .collect();
        if !primary.auto_increment {
            lines.push(format!(
                "PRIMARY KEY ({})",
                self.quote_identifier(&primary.name)
            ));
        }
        Ok(lines)
    }

    // DROP COLUMN fails on an indexed column.
    fn drops_index_with(&self, _index: &Index, _dropped: &[&str]) -> bool {
        false
    }

    fn change_column_type(&self, _table: &str, _field: &Field) -> Result<String> {
        Err(Error::unsupported(Dialect::Sqlite, "ALTER COLUMN TYPE"))
    }
}
