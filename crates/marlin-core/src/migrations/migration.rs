//! Directed schema deltas.

use tracing::debug;

use crate::config::CompileOptions;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::schema::{Field, Index, Schema};

use super::dialect::for_dialect;
use super::diff::{diff_schemas, Delta};

/// A delta `old_schema -> schema`.
///
/// Either endpoint may be absent: no `old_schema` means the table is
/// created, no `schema` means it is dropped. Obtained from
/// [`Schema::diff`] or by reversing another migration; it borrows both
/// endpoints and is meant to be compiled and discarded.
#[derive(Debug, Clone)]
pub struct Migration<'a> {
    schema: Option<&'a Schema>,
    old_schema: Option<&'a Schema>,
    add_fields: Vec<&'a Field>,
    drop_fields: Vec<&'a Field>,
    change_type_fields: Vec<&'a Field>,
    add_indexes: Vec<&'a Index>,
    drop_indexes: Vec<&'a Index>,
}

impl<'a> Migration<'a> {
    pub(crate) fn between(schema: &'a Schema, old_schema: Option<&'a Schema>) -> Self {
        let delta = match old_schema {
            Some(old) => diff_schemas(schema, old),
            None => Delta::default(),
        };
        Self {
            schema: Some(schema),
            old_schema,
            add_fields: delta.add_fields,
            drop_fields: delta.drop_fields,
            change_type_fields: delta.change_type_fields,
            add_indexes: delta.add_indexes,
            drop_indexes: delta.drop_indexes,
        }
    }

    /// Target schema, `None` for a drop.
    #[must_use]
    pub const fn schema(&self) -> Option<&'a Schema> {
        self.schema
    }

    /// Source schema, `None` for a create.
    #[must_use]
    pub const fn old_schema(&self) -> Option<&'a Schema> {
        self.old_schema
    }

    /// Fields to add.
    #[must_use]
    pub fn add_fields(&self) -> &[&'a Field] {
        &self.add_fields
    }

    /// Fields to drop.
    #[must_use]
    pub fn drop_fields(&self) -> &[&'a Field] {
        &self.drop_fields
    }

    /// Fields whose type changes, carrying the type to migrate to.
    #[must_use]
    pub fn change_type_fields(&self) -> &[&'a Field] {
        &self.change_type_fields
    }

    /// Indexes to create.
    #[must_use]
    pub fn add_indexes(&self) -> &[&'a Index] {
        &self.add_indexes
    }

    /// Indexes to drop. Those covered by dropped columns may compile to nothing.
    #[must_use]
    pub fn drop_indexes(&self) -> &[&'a Index] {
        &self.drop_indexes
    }

    /// Whether compiling this migration would produce no statement.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match (self.schema, self.old_schema) {
            (None, None) => true,
            (Some(new), Some(old)) => {
                new.name() == old.name()
                    && self.add_fields.is_empty()
                    && self.drop_fields.is_empty()
                    && self.change_type_fields.is_empty()
                    && self.add_indexes.is_empty()
                    && self.drop_indexes.is_empty()
            }
            _ => false,
        }
    }

    /// Returns the migration that undoes this one.
    ///
    /// Type changes in the inverse carry the pre-image definitions, looked up
    /// by name in this migration's old schema.
    #[must_use]
    pub fn reverse(&self) -> Migration<'a> {
        let change_type_fields = match self.old_schema {
            Some(old) => self
                .change_type_fields
                .iter()
                .filter_map(|f| old.field(&f.name))
                .collect(),
            None => Vec::new(),
        };
        Migration {
            schema: self.old_schema,
            old_schema: self.schema,
            add_fields: self.drop_fields.clone(),
            drop_fields: self.add_fields.clone(),
            change_type_fields,
            add_indexes: self.drop_indexes.clone(),
            drop_indexes: self.add_indexes.clone(),
        }
    }

    /// Compiles the migration to individual DDL statements.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Unsupported`] when the dialect cannot express an
    /// operation, e.g. a column type change on SQLite or a `NOT NULL` column
    /// of a type without a known zero value on PostgreSQL.
    pub fn statements(&self, dialect: Dialect, options: &CompileOptions) -> Result<Vec<String>> {
        let ddl = for_dialect(dialect);
        let statements = match (self.schema, self.old_schema) {
            (None, None) => Vec::new(),
            (Some(schema), None) => ddl.create_table(schema, options)?,
            (None, Some(old)) => vec![ddl.drop_table(old.name())],
            (Some(schema), Some(old)) => {
                let table = schema.name();
                let mut out = Vec::new();

                if table != old.name() {
                    out.push(ddl.rename_table(old.name(), table));
                }

                // Dropping a column may take its indexes with it.
                let dropped: Vec<&str> =
                    self.drop_fields.iter().map(|f| f.name.as_str()).collect();
                for index in &self.drop_indexes {
                    if !ddl.drops_index_with(index, &dropped) {
                        out.push(ddl.drop_index(table, index));
                    }
                }

                for field in &self.add_fields {
                    out.extend(ddl.add_column(table, field)?);
                }
                for field in &self.drop_fields {
                    out.push(ddl.drop_column(table, field));
                }
                for field in &self.change_type_fields {
                    out.push(ddl.change_column_type(table, field)?);
                }
                for index in &self.add_indexes {
                    out.push(ddl.create_index(table, index));
                }
                out
            }
        };

        debug!(
            table = self.table_name().unwrap_or_default(),
            dialect = %dialect,
            statements = statements.len(),
            "Compiled migration"
        );
        Ok(statements)
    }

    /// Compiles the migration to one script, statements separated by `;`.
    /// An empty migration compiles to an empty string.
    ///
    /// # Errors
    ///
    /// See [`Migration::statements`].
    pub fn to_sql(&self, dialect: Dialect, options: &CompileOptions) -> Result<String> {
        let statements = self.statements(dialect, options)?;
        if statements.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("{};", statements.join(";\n")))
    }

    fn table_name(&self) -> Option<&'a str> {
        self.schema.or(self.old_schema).map(Schema::name)
    }
}
