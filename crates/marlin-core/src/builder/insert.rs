//! INSERT builder, with optional upsert clause.

use tracing::debug;

use super::{column_list, Statement};
use crate::dialect::{ConflictTarget, Dialect};
use crate::error::{Error, Result};
use crate::expr::Params;
use crate::schema::Schema;
use crate::value::{SqlValue, ToSqlValue};

#[derive(Debug, Clone, Default)]
struct Upsert {
    update_fields: Vec<String>,
    conflict_targets: Vec<String>,
}

/// Multi-row INSERT builder.
///
/// # Example
///
/// ```rust
/// use marlin_core::builder::Insert;
/// use marlin_core::Dialect;
///
/// let stmt = Insert::into("user", &["name", "level"])
///     .row(["ann", "1"])
///     .upsert(&["level"], &["name"])
///     .build(Dialect::Postgres)
///     .unwrap();
///
/// assert_eq!(
///     stmt.sql,
///     "INSERT INTO \"user\" (\"name\", \"level\") VALUES (:p0, :p1) \
///      ON CONFLICT (\"name\") DO UPDATE SET \"level\" = EXCLUDED.\"level\""
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Insert {
    table: String,
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
    upsert: Option<Upsert>,
    returning: Option<String>,
}

impl Insert {
    /// Inserts into `columns` of `table`.
    #[must_use]
    pub fn into(table: &str, columns: &[&str]) -> Self {
        Self {
            table: String::from(table),
            columns: columns.iter().map(|c| String::from(*c)).collect(),
            rows: Vec::new(),
            upsert: None,
            returning: None,
        }
    }

    /// Inserts into every column of `schema` except an auto-increment
    /// primary key, which is returned on PostgreSQL instead.
    #[must_use]
    pub fn from_schema(schema: &Schema) -> Self {
        let columns: Vec<&str> = schema
            .fields()
            .iter()
            .filter(|f| !(f.primary && f.auto_increment))
            .map(|f| f.name.as_str())
            .collect();
        let mut insert = Self::into(schema.name(), &columns);
        insert.returning = schema.primary_field().ok().map(|f| f.name.clone());
        insert
    }

    /// Appends a row. Values are matched to columns by position.
    #[must_use]
    pub fn row<T, I>(mut self, values: I) -> Self
    where
        T: ToSqlValue,
        I: IntoIterator<Item = T>,
    {
        self.rows
            .push(values.into_iter().map(ToSqlValue::to_sql_value).collect());
        self
    }

    /// On conflict, overwrites `update_fields` with the incoming values.
    ///
    /// PostgreSQL needs `conflict_targets`, MySQL rejects them and SQLite
    /// takes them optionally.
    #[must_use]
    pub fn upsert(mut self, update_fields: &[&str], conflict_targets: &[&str]) -> Self {
        self.upsert = Some(Upsert {
            update_fields: update_fields.iter().map(|f| String::from(*f)).collect(),
            conflict_targets: conflict_targets.iter().map(|f| String::from(*f)).collect(),
        });
        self
    }

    /// Skips conflicting rows.
    #[must_use]
    pub fn ignore_conflicts(mut self) -> Self {
        self.upsert = Some(Upsert::default());
        self
    }

    /// Returns `column` of the inserted rows where `RETURNING` is available.
    #[must_use]
    pub fn returning(mut self, column: &str) -> Self {
        self.returning = Some(String::from(column));
        self
    }

    fn conflict_clause(&self, dialect: Dialect, upsert: &Upsert) -> Result<String> {
        let targets = &upsert.conflict_targets;
        match dialect.conflict_target() {
            ConflictTarget::Forbidden if !targets.is_empty() => {
                return Err(Error::unsupported(dialect, "upsert with conflict targets"));
            }
            ConflictTarget::Required if targets.is_empty() && !upsert.update_fields.is_empty() => {
                return Err(Error::unsupported(dialect, "upsert without conflict targets"));
            }
            _ => {}
        }

        let assignments = upsert
            .update_fields
            .iter()
            .map(|f| {
                format!(
                    "{} = {}",
                    dialect.quote_identifier(f),
                    dialect.excluded_column(f)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");

        if dialect == Dialect::Mysql {
            // No update fields means INSERT IGNORE, handled by the caller.
            return Ok(if assignments.is_empty() {
                String::new()
            } else {
                format!(" ON DUPLICATE KEY UPDATE {assignments}")
            });
        }

        let target = if targets.is_empty() {
            String::new()
        } else {
            format!(" ({})", column_list(dialect, targets))
        };
        if assignments.is_empty() {
            Ok(format!(" ON CONFLICT{target} DO NOTHING"))
        } else {
            Ok(format!(" ON CONFLICT{target} DO UPDATE SET {assignments}"))
        }
    }

    /// Compiles the statement.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidStatement`] without rows or with a row whose length
    /// differs from the column list, [`Error::Unsupported`] for a conflict
    /// target the dialect cannot express.
    pub fn build(&self, dialect: Dialect) -> Result<Statement> {
        if self.columns.is_empty() {
            return Err(Error::invalid(format!("INSERT into '{}' without columns", self.table)));
        }
        if self.rows.is_empty() {
            return Err(Error::invalid(format!("INSERT into '{}' without rows", self.table)));
        }
        if let Some(row) = self.rows.iter().find(|r| r.len() != self.columns.len()) {
            return Err(Error::invalid(format!(
                "row has {} values for {} columns",
                row.len(),
                self.columns.len()
            )));
        }

        let conflict = match self.upsert {
            Some(ref upsert) => self.conflict_clause(dialect, upsert)?,
            None => String::new(),
        };
        let ignore = dialect == Dialect::Mysql
            && self
                .upsert
                .as_ref()
                .is_some_and(|u| u.update_fields.is_empty());

        let mut params = Params::new();
        let values = self
            .rows
            .iter()
            .map(|row| {
                let placeholders: Vec<String> =
                    row.iter().map(|v| params.bind(v.clone())).collect();
                format!("({})", placeholders.join(", "))
            })
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!(
            "INSERT {}INTO {} ({}) VALUES {values}{conflict}",
            if ignore { "IGNORE " } else { "" },
            dialect.quote_identifier(&self.table),
            column_list(dialect, &self.columns),
        );
        if let Some(ref column) = self.returning {
            if dialect.supports_returning() {
                sql.push_str(" RETURNING ");
                sql.push_str(&dialect.quote_identifier(column));
            }
        }

        debug!(table = %self.table, rows = self.rows.len(), "Built INSERT");
        Ok(Statement { sql, params })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;

    fn member() -> Insert {
        Insert::into("member", &["user_id", "level"]).row([1, 10]).row([2, 20])
    }

    #[test]
    fn test_multi_row_insert() {
        let stmt = member().build(Dialect::Mysql).unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO `member` (`user_id`, `level`) VALUES (:p0, :p1), (:p2, :p3)"
        );
        assert_eq!(stmt.params.len(), 4);
        assert_eq!(stmt.params.get("p3"), Some(&SqlValue::Int(20)));
    }

    #[test]
    fn test_invalid_rows() {
        let err = Insert::into("member", &["a"]).build(Dialect::Sqlite).unwrap_err();
        assert!(matches!(err, Error::InvalidStatement(_)));
        let err = Insert::into("member", &["a", "b"])
            .row([1])
            .build(Dialect::Sqlite)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidStatement(_)));
    }

    #[test]
    fn test_mysql_upsert() {
        let stmt = member().upsert(&["level"], &[]).build(Dialect::Mysql).unwrap();
        assert!(stmt
            .sql
            .ends_with(" ON DUPLICATE KEY UPDATE `level` = VALUES(`level`)"));

        let err = member()
            .upsert(&["level"], &["user_id"])
            .build(Dialect::Mysql)
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported { dialect: Dialect::Mysql, .. }));
    }

    #[test]
    fn test_postgres_upsert_requires_target() {
        let stmt = member()
            .upsert(&["level"], &["user_id"])
            .build(Dialect::Postgres)
            .unwrap();
        assert!(stmt.sql.ends_with(
            " ON CONFLICT (\"user_id\") DO UPDATE SET \"level\" = EXCLUDED.\"level\""
        ));

        let err = member().upsert(&["level"], &[]).build(Dialect::Postgres).unwrap_err();
        assert!(matches!(err, Error::Unsupported { dialect: Dialect::Postgres, .. }));
    }

    #[test]
    fn test_sqlite_upsert_target_optional() {
        let stmt = member().upsert(&["level"], &[]).build(Dialect::Sqlite).unwrap();
        assert!(stmt
            .sql
            .ends_with(" ON CONFLICT DO UPDATE SET `level` = excluded.`level`"));
        let stmt = member()
            .upsert(&["level"], &["user_id"])
            .build(Dialect::Sqlite)
            .unwrap();
        assert!(stmt.sql.contains(" ON CONFLICT (`user_id`) DO UPDATE"));
    }

    #[test]
    fn test_ignore_conflicts() {
        let sql = member().ignore_conflicts().build(Dialect::Mysql).unwrap().sql;
        assert!(sql.starts_with("INSERT IGNORE INTO `member`"));
        assert!(!sql.contains("ON DUPLICATE"));
        let sql = member().ignore_conflicts().build(Dialect::Postgres).unwrap().sql;
        assert!(sql.ends_with(" ON CONFLICT DO NOTHING"));
        let sql = member().ignore_conflicts().build(Dialect::Sqlite).unwrap().sql;
        assert!(sql.ends_with(" ON CONFLICT DO NOTHING"));
    }

    #[test]
    fn test_from_schema_returns_primary_on_postgres() {
        let schema = Schema::builder("user")
            .field(Field::serial("id").primary())
            .field(Field::varchar("name", 32))
            .build()
            .unwrap();
        let insert = Insert::from_schema(&schema).row(["ann"]);
        assert_eq!(
            insert.build(Dialect::Postgres).unwrap().sql,
            "INSERT INTO \"user\" (\"name\") VALUES (:p0) RETURNING \"id\""
        );
        assert_eq!(
            insert.build(Dialect::Mysql).unwrap().sql,
            "INSERT INTO `user` (`name`) VALUES (:p0)"
        );
    }
}
