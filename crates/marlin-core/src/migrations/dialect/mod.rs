//! Dialect-specific DDL generation.
//!
//! Each dialect is a unit struct implementing [`MigrationDialect`]. Shared
//! syntax lives in the trait's provided methods; dialects override what they
//! spell differently.

mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MysqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use crate::config::CompileOptions;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::schema::{zero_value, Field, Index, Schema};

/// Returns the DDL generator for `dialect`.
#[must_use]
pub fn for_dialect(dialect: Dialect) -> &'static dyn MigrationDialect {
    match dialect {
        Dialect::Mysql => &MysqlDialect,
        Dialect::Postgres => &PostgresDialect,
        Dialect::Sqlite => &SqliteDialect,
    }
}

/// Trait for dialect-specific DDL generation.
pub trait MigrationDialect {
    /// Returns the dialect.
    fn dialect(&self) -> Dialect;

    /// Quotes an identifier.
    fn quote_identifier(&self, name: &str) -> String {
        self.dialect().quote_identifier(name)
    }

    /// Generates a column definition. `default` is the rendered default:
    /// expression defaults in CREATE TABLE, any default in ADD COLUMN.
    fn column_definition(&self, field: &Field, default: Option<&str>) -> String {
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

    /// The rendered default an added column is created with.
    ///
    /// A declared default is used as is. A `NOT NULL` column without one
    /// gets the zero value of its type so existing rows can be filled.
    ///
    /// # Errors
    ///
    /// [`Error::Unsupported`] when the column needs a backfill and its type
    /// has no known zero value.
    fn backfill_default(&self, field: &Field) -> Result<Option<String>> {
        default_or_zero(self.dialect(), field)
    }

    /// Statement attaching the column comment, for dialects that cannot
    /// declare it inline.
    fn column_comment(&self, _table: &str, _field: &Field) -> Option<String> {
        None
    }

    /// Generates the column list and table constraints of a CREATE TABLE.
    fn table_body(&self, schema: &Schema) -> Result<Vec<String>> {
        let mut lines: Vec<String> = schema
            .fields()
            .iter()
            .map(|f| self.column_definition(f, f.default.expression()))
            .collect();
        let primary = schema.primary_field()?;
        lines.push(format!(
            "PRIMARY KEY ({})",
            self.quote_identifier(&primary.name)
        ));
        Ok(lines)
    }

    /// Generates CREATE TABLE and any statement that must follow it.
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
        Ok(out)
    }

    /// Generates DROP TABLE.
    fn drop_table(&self, table: &str) -> String {
        format!("DROP TABLE {}", self.quote_identifier(table))
    }

    /// Generates a table rename.
    fn rename_table(&self, old: &str, new: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME TO {}",
            self.quote_identifier(old),
            self.quote_identifier(new)
        )
    }

    /// Generates ADD COLUMN. A constant default backfills existing rows and
    /// is then removed again where the dialect allows it. Expression
    /// defaults stay on the column.
    ///
    /// # Errors
    ///
    /// See [`MigrationDialect::backfill_default`].
    fn add_column(&self, table: &str, field: &Field) -> Result<Vec<String>> {
        let default = self.backfill_default(field)?;
        let mut out = vec![format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.quote_identifier(table),
            self.column_definition(field, default.as_deref())
        )];
        if default.is_some()
            && field.default.expression().is_none()
            && self.dialect().supports_drop_default()
        {
            out.push(format!(
                "ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT",
                self.quote_identifier(table),
                self.quote_identifier(&field.name)
            ));
        }
        out.extend(self.column_comment(table, field));
        Ok(out)
    }

    /// Generates DROP COLUMN.
    fn drop_column(&self, table: &str, field: &Field) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.quote_identifier(table),
            self.quote_identifier(&field.name)
        )
    }

    /// Whether dropping the `dropped` columns also removes `index`.
    fn drops_index_with(&self, index: &Index, dropped: &[&str]) -> bool {
        index.touches(dropped.iter().copied())
    }

    /// Generates a column type change to `field`'s type.
    fn change_column_type(&self, table: &str, field: &Field) -> Result<String>;

    /// Generates CREATE INDEX.
    fn create_index(&self, table: &str, index: &Index) -> String {
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            if index.unique { "UNIQUE " } else { "" },
            self.quote_identifier(&index.name),
            self.quote_identifier(table),
            self.index_columns(index)
        )
    }

    /// Generates DROP INDEX.
    fn drop_index(&self, _table: &str, index: &Index) -> String {
        format!("DROP INDEX {}", self.quote_identifier(&index.name))
    }

    /// Quoted, comma-separated index columns.
    fn index_columns(&self, index: &Index) -> String {
        index
            .fields
            .iter()
            .map(|c| self.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Declared default, or the zero value of a `NOT NULL` column's type.
fn default_or_zero(dialect: Dialect, field: &Field) -> Result<Option<String>> {
    if let Some(sql) = field.default.render(dialect) {
        return Ok(Some(sql));
    }
    if !field.not_null || field.auto_increment {
        return Ok(None);
    }
    zero_value(&field.field_type)
        .map(|v| Some(v.render_literal(dialect)))
        .ok_or_else(|| {
            Error::unsupported(
                dialect,
                format!(
                    "ADD COLUMN {} {} NOT NULL without a default",
                    field.name, field.field_type
                ),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_dialect() {
        for dialect in Dialect::ALL {
            assert_eq!(for_dialect(dialect).dialect(), dialect);
        }
    }

    #[test]
    fn test_drop_index_shapes() {
        let idx = Index::named("a_idx", &["a"], false);
        assert_eq!(
            for_dialect(Dialect::Mysql).drop_index("t", &idx),
            "ALTER TABLE `t` DROP INDEX `a_idx`"
        );
        assert_eq!(
            for_dialect(Dialect::Postgres).drop_index("t", &idx),
            "DROP INDEX \"a_idx\""
        );
        assert_eq!(
            for_dialect(Dialect::Sqlite).drop_index("t", &idx),
            "DROP INDEX `a_idx`"
        );
    }

    #[test]
    fn test_not_null_column_is_backfilled() {
        let field = Field::varchar("name", 64);
        assert_eq!(
            for_dialect(Dialect::Postgres).add_column("user", &field).unwrap(),
            vec![
                "ALTER TABLE \"user\" ADD COLUMN \"name\" varchar(64) NOT NULL DEFAULT ''"
                    .to_string(),
                "ALTER TABLE \"user\" ALTER COLUMN \"name\" DROP DEFAULT".to_string(),
            ]
        );
        assert_eq!(
            for_dialect(Dialect::Sqlite)
                .add_column("user", &Field::int("level"))
                .unwrap(),
            vec!["ALTER TABLE `user` ADD COLUMN `level` int NOT NULL DEFAULT 0".to_string()]
        );
    }

    #[test]
    fn test_nullable_column_is_not_backfilled() {
        let field = Field::int("group_id").nullable();
        assert_eq!(
            for_dialect(Dialect::Postgres).add_column("user", &field).unwrap(),
            vec!["ALTER TABLE \"user\" ADD COLUMN \"group_id\" int".to_string()]
        );
    }

    #[test]
    fn test_not_null_column_without_zero_value() {
        let err = for_dialect(Dialect::Postgres)
            .add_column("user", &Field::new("token", "uuid"))
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported { .. }));
        let ok = for_dialect(Dialect::Postgres)
            .add_column("user", &Field::new("token", "uuid").nullable())
            .unwrap();
        assert_eq!(ok.len(), 1);
    }

    #[test]
    fn test_expression_default_is_kept() {
        let field = Field::datetime("created_at").default_expr("CURRENT_TIMESTAMP");
        assert_eq!(
            for_dialect(Dialect::Postgres).add_column("t", &field).unwrap(),
            vec![
                "ALTER TABLE \"t\" ADD COLUMN \"created_at\" timestamp NOT NULL \
                 DEFAULT CURRENT_TIMESTAMP"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_create_table_keeps_expression_defaults() {
        let schema = Schema::builder("t")
            .field(Field::int("id").primary())
            .field(Field::datetime("created_at").default_expr("CURRENT_TIMESTAMP"))
            .field(Field::int("level").default(3))
            .build()
            .unwrap();
        let stmts = for_dialect(Dialect::Mysql)
            .create_table(&schema, &CompileOptions::default())
            .unwrap();
        assert!(stmts[0].contains("`created_at` datetime NOT NULL DEFAULT CURRENT_TIMESTAMP,"));
        assert!(stmts[0].contains("`level` int NOT NULL,"));
    }

    #[test]
    fn test_create_unique_index() {
        let idx = Index::named("ab_uiq", &["a", "b"], true);
        assert_eq!(
            for_dialect(Dialect::Postgres).create_index("t", &idx),
            "CREATE UNIQUE INDEX \"ab_uiq\" ON \"t\" (\"a\", \"b\")"
        );
    }
}
