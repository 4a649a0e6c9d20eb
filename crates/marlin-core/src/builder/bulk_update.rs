//! Batched per-row updates as one CASE-based UPDATE.

use tracing::debug;

use super::{Statement, Update};
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::expr::{col, Case, Ops};
use crate::schema::Schema;
use crate::value::{SqlValue, ToSqlValue};

/// Updates many rows, each keyed by its primary key, in one statement.
///
/// Every changed column becomes `col = CASE WHEN pk = .. THEN .. ELSE col END`
/// and the statement is restricted with `WHERE pk IN (..)`. Columns are
/// emitted in the order they first appear across rows.
///
/// ```rust
/// use marlin_core::builder::BulkUpdate;
/// use marlin_core::Dialect;
///
/// let stmt = BulkUpdate::new("user", "id")
///     .row(1, [("level", 10)])
///     .row(2, [("level", 20)])
///     .build(Dialect::Mysql)
///     .unwrap();
///
/// assert_eq!(
///     stmt.sql,
///     "UPDATE `user` SET `level` = CASE WHEN `id` = :p0 THEN :p1 \
///      WHEN `id` = :p2 THEN :p3 ELSE `level` END WHERE `id` IN (:p4, :p5)"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct BulkUpdate {
    table: String,
    primary: String,
    types: Vec<(String, String)>,
    rows: Vec<(SqlValue, Vec<(String, SqlValue)>)>,
}

impl BulkUpdate {
    /// Updates `table`, matching rows on the `primary` column.
    #[must_use]
    pub fn new(table: &str, primary: &str) -> Self {
        Self {
            table: String::from(table),
            primary: String::from(primary),
            types: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Updates the table of `schema`. Column types are taken from the schema
    /// so that PostgreSQL can cast CASE branches.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaDefinition`] when the schema has no primary field.
    pub fn from_schema(schema: &Schema) -> Result<Self> {
        let primary = schema.primary_field()?;
        let mut bulk = Self::new(schema.name(), &primary.name);
        bulk.types = schema
            .fields()
            .iter()
            .map(|f| (f.name.clone(), f.field_type.clone()))
            .collect();
        Ok(bulk)
    }

    /// Adds the changes for the row whose primary key is `key`.
    #[must_use]
    pub fn row<'c, K, V, I>(mut self, key: K, changes: I) -> Self
    where
        K: ToSqlValue,
        V: ToSqlValue,
        I: IntoIterator<Item = (&'c str, V)>,
    {
        let changes = changes
            .into_iter()
            .map(|(c, v)| (String::from(c), v.to_sql_value()))
            .collect();
        self.rows.push((key.to_sql_value(), changes));
        self
    }

    fn changed_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for (_, changes) in &self.rows {
            for (column, _) in changes {
                if !columns.contains(&column.as_str()) {
                    columns.push(column);
                }
            }
        }
        columns
    }

    fn column_case(&self, column: &str) -> Case {
        let mut case = Case::new();
        for (key, changes) in &self.rows {
            if let Some((_, value)) = changes.iter().find(|(c, _)| c == column) {
                case = case.when(col(&self.primary).eq(key.clone()), value.clone());
            }
        }
        case = case.otherwise(col(column));
        match self.types.iter().find(|(c, _)| c == column) {
            Some((_, ty)) => case.cast(ty.clone()),
            None => case,
        }
    }

    /// Compiles the statement.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidStatement`] without rows, without any changed column,
    /// for a row whose primary key is NULL, or when two rows share a primary
    /// key.
    pub fn build(&self, dialect: Dialect) -> Result<Statement> {
        if self.rows.is_empty() {
            return Err(Error::invalid(format!(
                "bulk update of '{}' without rows",
                self.table
            )));
        }
        if self.rows.iter().any(|(key, _)| key.is_null()) {
            return Err(Error::invalid(format!(
                "bulk update row without a value for '{}'",
                self.primary
            )));
        }
        for (pos, (key, _)) in self.rows.iter().enumerate() {
            if self.rows[..pos].iter().any(|(seen, _)| seen == key) {
                return Err(Error::invalid(format!(
                    "bulk update of '{}' lists {} = {} more than once",
                    self.table,
                    self.primary,
                    key.render_literal(dialect)
                )));
            }
        }
        let columns = self.changed_columns();
        if columns.is_empty() {
            return Err(Error::invalid(format!(
                "bulk update of '{}' changes no column",
                self.table
            )));
        }

        let mut update = Update::table(&self.table);
        for column in &columns {
            update = update.set(column, self.column_case(column));
        }
        let keys = self.rows.iter().map(|(key, _)| key.clone());
        let statement = update
            .filter(col(&self.primary).in_list(keys))
            .build(dialect)?;

        debug!(
            table = %self.table,
            rows = self.rows.len(),
            columns = columns.len(),
            "Built bulk UPDATE"
        );
        Ok(statement)
    }
}
