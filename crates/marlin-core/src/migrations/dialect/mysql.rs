//! MySQL dialect for migrations.

use super::MigrationDialect;
use crate::config::CompileOptions;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::schema::{Field, Index, Schema};
use crate::value::SqlValue;

/// MySQL dialect for migration SQL generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn comment_literal(comment: &str) -> String {
        SqlValue::Text(comment.to_string()).render_literal(Dialect::Mysql)
    }
}

impl MigrationDialect for MysqlDialect {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    fn column_definition(&self, field: &Field, default: Option<&str>) -> String {
        let mut sql = format!(
            "{} {}",
            self.quote_identifier(&field.name),
            field.field_type
        );
        if field.not_null {
            sql.push_str(" NOT NULL");
        }
        if field.auto_increment {
            sql.push_str(" AUTO_INCREMENT");
        }
        if let Some(value) = default {
            sql.push_str(" DEFAULT ");
            sql.push_str(value);
        }
        if let Some(ref comment) = field.comment {
            sql.push_str(" COMMENT ");
            sql.push_str(&Self::comment_literal(comment));
        }
        sql
    }

    /// MySQL fills existing rows with the implicit default of the type, so
    /// only a declared default is emitted.
    fn backfill_default(&self, field: &Field) -> Result<Option<String>> {
        Ok(field.default.render(Dialect::Mysql))
    }

    /// Indexes are declared inline as `KEY` / `UNIQUE KEY` clauses.
    fn create_table(&self, schema: &Schema, options: &CompileOptions) -> Result<Vec<String>> {
        let mut body = self.table_body(schema)?;
        for index in schema.indexes() {
            body.push(format!(
                "{}KEY {} ({})",
                if index.unique { "UNIQUE " } else { "" },
                self.quote_identifier(&index.name),
                self.index_columns(index)
            ));
        }
        let mut sql = format!(
            "CREATE TABLE {} (\n    {}\n)",
            self.quote_identifier(schema.name()),
            body.join(",\n    ")
        );
        let postfix = options.mysql.postfix();
        if !postfix.is_empty() {
            sql.push(' ');
            sql.push_str(&postfix);
        }
        Ok(vec![sql])
    }

    fn rename_table(&self, old: &str, new: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME {}",
            self.quote_identifier(old),
            self.quote_identifier(new)
        )
    }

    fn change_column_type(&self, table: &str, field: &Field) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} MODIFY COLUMN {}",
            self.quote_identifier(table),
            self.column_definition(field, field.default.expression())
        ))
    }

    /// Dropped columns are removed from their indexes; an index only goes
    /// away once all of its columns are gone.
    fn drops_index_with(&self, index: &Index, dropped: &[&str]) -> bool {
        index.fields.iter().all(|f| dropped.contains(&f.as_str()))
    }

    fn drop_index(&self, table: &str, index: &Index) -> String {
        format!(
            "ALTER TABLE {} DROP INDEX {}",
            self.quote_identifier(table),
            self.quote_identifier(&index.name)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> Schema {
        Schema::builder("user")
            .field(Field::int("id").primary().auto_increment())
            .field(Field::varchar("name", 255).comment("user's name"))
            .field(Field::int("group_id").nullable())
            .named_index("group_idx", &["group_id"], false)
            .named_index("name_uiq", &["name"], true)
            .build()
            .unwrap()
    }

    #[test]
    fn test_create_table() {
        let stmts = MysqlDialect::new()
            .create_table(&user(), &CompileOptions::default())
            .unwrap();
        assert_eq!(stmts.len(), 1);
        assert_eq!(
            stmts[0],
            "CREATE TABLE `user` (\n    \
             `id` int NOT NULL AUTO_INCREMENT,\n    \
             `name` varchar(255) NOT NULL COMMENT 'user''s name',\n    \
             `group_id` int,\n    \
             PRIMARY KEY (`id`),\n    \
             KEY `group_idx` (`group_id`),\n    \
             UNIQUE KEY `name_uiq` (`name`)\n\
             ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci"
        );
    }

    #[test]
    fn test_modify_column() {
        let field = Field::bigint("group_id").comment("g");
        assert_eq!(
            MysqlDialect::new().change_column_type("user", &field).unwrap(),
            "ALTER TABLE `user` MODIFY COLUMN `group_id` bigint NOT NULL COMMENT 'g'"
        );
    }

    #[test]
    fn test_add_column_with_default() {
        let field = Field::varchar("nick", 16).default("x");
        assert_eq!(
            MysqlDialect::new().add_column("user", &field).unwrap(),
            vec![
                "ALTER TABLE `user` ADD COLUMN `nick` varchar(16) NOT NULL DEFAULT 'x'".to_string(),
                "ALTER TABLE `user` ALTER COLUMN `nick` DROP DEFAULT".to_string(),
            ]
        );
    }

    #[test]
    fn test_add_column_relies_on_implicit_default() {
        assert_eq!(
            MysqlDialect::new().add_column("user", &Field::int("level")).unwrap(),
            vec!["ALTER TABLE `user` ADD COLUMN `level` int NOT NULL".to_string()]
        );
    }

    #[test]
    fn test_add_column_with_expression_default() {
        let field = Field::datetime("created_at").default_expr("CURRENT_TIMESTAMP");
        assert_eq!(
            MysqlDialect::new().add_column("user", &field).unwrap(),
            vec![
                "ALTER TABLE `user` ADD COLUMN `created_at` datetime NOT NULL \
                 DEFAULT CURRENT_TIMESTAMP"
                    .to_string()
            ]
        );
    }
}
