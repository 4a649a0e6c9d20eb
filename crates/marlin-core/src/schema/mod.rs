//! Table schemas.
//!
//! A [`Schema`] is the comparison unit of the migration differ: a table name,
//! its ordered fields, its indexes and the designated primary field. Schemas
//! come either from the declarative [`SchemaBuilder`] or from catalog
//! introspection (see [`crate::migrations::introspect`]).

mod field;
mod index;
mod registry;
mod types;

pub use field::{Field, FieldDefault, FieldKey};
pub use index::{generate_index_name, Index, IndexKey};
pub use registry::Registry;
pub use types::{normalize_type, postgres_storage_type, postgres_type, zero_value};

use std::collections::HashSet;

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::migrations::Migration;

/// Shape of one table.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
    indexes: Vec<Index>,
    abstracted: bool,
    primary: Option<usize>,
}

impl Schema {
    /// Starts building a schema for `table`.
    #[must_use]
    pub fn builder(table: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(table)
    }

    /// Assembles a schema from parts, validating it.
    ///
    /// # Errors
    ///
    /// See [`SchemaBuilder::build`].
    pub fn from_parts(
        name: impl Into<String>,
        fields: Vec<Field>,
        indexes: Vec<Index>,
        abstracted: bool,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::schema("table name is empty"));
        }

        let mut seen = HashSet::new();
        let mut primary = None;
        for (pos, field) in fields.iter().enumerate() {
            if !seen.insert(field.name.as_str()) {
                return Err(Error::schema(format!(
                    "duplicate field '{}' in table '{name}'",
                    field.name
                )));
            }
            if field.primary {
                if primary.is_some() {
                    return Err(Error::schema(format!(
                        "table '{name}' declares more than one primary field"
                    )));
                }
                primary = Some(pos);
            }
        }
        if primary.is_none() && !abstracted {
            return Err(Error::schema(format!(
                "table '{name}' has no primary field"
            )));
        }

        for index in &indexes {
            if index.fields.is_empty() {
                return Err(Error::schema(format!(
                    "index '{}' on table '{name}' has no fields",
                    index.name
                )));
            }
            if let Some(unknown) = index.fields.iter().find(|f| !seen.contains(f.as_str())) {
                return Err(Error::schema(format!(
                    "index '{}' on table '{name}' references unknown field '{unknown}'",
                    index.name
                )));
            }
        }

        Ok(Self {
            name,
            fields,
            indexes,
            abstracted,
            primary,
        })
    }

    /// Table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Indexes in declaration order.
    #[must_use]
    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    /// Whether the schema only exists to be extended.
    #[must_use]
    pub const fn is_abstracted(&self) -> bool {
        self.abstracted
    }

    /// Looks a field up by column name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Looks a field up by logical name.
    #[must_use]
    pub fn field_by_model_name(&self, model_name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.model_name == model_name)
    }

    /// Returns a copy with field types spelled the way `dialect` stores them.
    ///
    /// Only PostgreSQL rewrites anything: MySQL shorthands such as `datetime`
    /// or `blob` become `timestamp` and `bytea`.
    #[must_use]
    pub fn for_dialect(&self, dialect: Dialect) -> Self {
        let mut out = self.clone();
        if dialect == Dialect::Postgres {
            for field in &mut out.fields {
                field.field_type = postgres_type(&field.field_type);
            }
        }
        out
    }

    /// Returns the primary field.
    ///
    /// # Errors
    ///
    /// Abstract schemas may lack a primary field; asking for it is then a
    /// [`Error::SchemaDefinition`].
    pub fn primary_field(&self) -> Result<&Field> {
        self.primary
            .and_then(|pos| self.fields.get(pos))
            .ok_or_else(|| Error::schema(format!("table '{}' has no primary field", self.name)))
    }

    /// Diffs `self` (desired) against `current`.
    #[must_use]
    pub fn diff<'a>(&'a self, current: Option<&'a Schema>) -> Migration<'a> {
        Migration::between(self, current)
    }

    /// Differ-based equality: `true` when diffing produces no operation.
    #[must_use]
    pub fn is_equivalent(&self, other: &Schema) -> bool {
        self.diff(Some(other)).is_empty()
    }

    /// Copies logical names from `declared` onto fields with the same column
    /// name. Used on introspected schemas.
    #[must_use]
    pub fn with_model_names_from(mut self, declared: &Schema) -> Self {
        for field in &mut self.fields {
            if let Some(decl) = declared.field(&field.name) {
                field.model_name.clone_from(&decl.model_name);
            }
        }
        self
    }

    /// Adopts the names of live indexes whose diff key matches one of ours.
    pub fn sync_index_names(&mut self, introspected: &Schema) {
        for index in &mut self.indexes {
            let key = index.key();
            if let Some(live) = introspected.indexes.iter().find(|i| i.key() == key) {
                index.name.clone_from(&live.name);
            }
        }
    }
}

/// Fluent builder for [`Schema`].
///
/// ```
/// use marlin_core::{Field, Schema};
///
/// let user = Schema::builder("user")
///     .field(Field::int("id").primary().auto_increment())
///     .field(Field::varchar("name", 255))
///     .field(Field::int("group_id"))
///     .index(&["group_id"])
///     .unique(&["name"])
///     .build()
///     .unwrap();
/// assert_eq!(user.primary_field().unwrap().name, "id");
/// assert_eq!(user.indexes().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<Field>,
    inherited: HashSet<String>,
    indexes: Vec<IndexSpec>,
    abstracted: bool,
}

#[derive(Debug, Clone)]
struct IndexSpec {
    name: Option<String>,
    fields: Vec<String>,
    unique: bool,
}

impl SchemaBuilder {
    /// Creates a builder for `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            name: table.into(),
            fields: Vec::new(),
            inherited: HashSet::new(),
            indexes: Vec::new(),
            abstracted: false,
        }
    }

    /// Adds a field. Redeclaring an inherited field replaces it in place.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        if self.inherited.remove(&field.name) {
            if let Some(slot) = self.fields.iter_mut().find(|f| f.name == field.name) {
                *slot = field;
                return self;
            }
        }
        self.fields.push(field);
        self
    }

    /// Adds a non-unique index.
    #[must_use]
    pub fn index(self, fields: &[&str]) -> Self {
        self.push_index(None, fields, false)
    }

    /// Adds a unique index.
    #[must_use]
    pub fn unique(self, fields: &[&str]) -> Self {
        self.push_index(None, fields, true)
    }

    /// Adds an index with an explicit name.
    #[must_use]
    pub fn named_index(self, name: impl Into<String>, fields: &[&str], unique: bool) -> Self {
        self.push_index(Some(name.into()), fields, unique)
    }

    /// Marks the schema as abstract.
    #[must_use]
    pub fn abstracted(mut self, abstracted: bool) -> Self {
        self.abstracted = abstracted;
        self
    }

    /// Inherits the fields and indexes of `base`.
    ///
    /// Inherited index names are regenerated for this table.
    #[must_use]
    pub fn extend(mut self, base: &Schema) -> Self {
        for field in base.fields() {
            self.inherited.insert(field.name.clone());
            self.fields.push(field.clone());
        }
        for index in base.indexes() {
            self.indexes.push(IndexSpec {
                name: None,
                fields: index.fields.clone(),
                unique: index.unique,
            });
        }
        self
    }

    fn push_index(mut self, name: Option<String>, fields: &[&str], unique: bool) -> Self {
        self.indexes.push(IndexSpec {
            name,
            fields: fields.iter().map(|f| (*f).to_string()).collect(),
            unique,
        });
        self
    }

    /// Validates and builds the schema.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaDefinition`] when a non-abstract schema has no primary
    /// field, when more than one field is primary, when a field name repeats,
    /// or when an index is empty or names an unknown field.
    pub fn build(self) -> Result<Schema> {
        let indexes = self
            .indexes
            .into_iter()
            .map(|spec| {
                let name = spec
                    .name
                    .unwrap_or_else(|| generate_index_name(&self.name, &spec.fields, spec.unique));
                Index {
                    name,
                    fields: spec.fields,
                    unique: spec.unique,
                }
            })
            .collect();
        Schema::from_parts(self.name, self.fields, indexes, self.abstracted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Schema {
        Schema::builder("base")
            .field(Field::int("id").primary().auto_increment())
            .field(Field::datetime("created_at"))
            .index(&["created_at"])
            .abstracted(true)
            .build()
            .unwrap()
    }

    #[test]
    fn test_missing_primary_is_an_error() {
        let err = Schema::builder("t").field(Field::int("a")).build().unwrap_err();
        assert!(matches!(err, Error::SchemaDefinition(_)));
    }

    #[test]
    fn test_abstract_without_primary_is_allowed() {
        let s = Schema::builder("mixin")
            .field(Field::int("a"))
            .abstracted(true)
            .build()
            .unwrap();
        assert!(s.is_abstracted());
        assert!(s.primary_field().is_err());
    }

    #[test]
    fn test_two_primaries_rejected() {
        let err = Schema::builder("t")
            .field(Field::int("a").primary())
            .field(Field::int("b").primary())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("more than one primary"));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = Schema::builder("t")
            .field(Field::int("id").primary())
            .field(Field::int("a"))
            .field(Field::text("a"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("duplicate field 'a'"));
    }

    #[test]
    fn test_index_on_unknown_field_rejected() {
        let err = Schema::builder("t")
            .field(Field::int("id").primary())
            .index(&["nope"])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("unknown field 'nope'"));

        let err = Schema::builder("t")
            .field(Field::int("id").primary())
            .index(&[])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("has no fields"));
    }

    #[test]
    fn test_extend_inherits_and_overrides() {
        let user = Schema::builder("user")
            .extend(&base())
            .field(Field::varchar("name", 64))
            .field(Field::bigint("id").primary().auto_increment())
            .build()
            .unwrap();
        let names: Vec<&str> = user.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["id", "created_at", "name"]);
        assert_eq!(user.primary_field().unwrap().field_type, "bigint");
        assert!(!user.is_abstracted());
        assert_eq!(user.indexes()[0].fields, ["created_at"]);
        assert_ne!(user.indexes()[0].name, base().indexes()[0].name);
    }

    #[test]
    fn test_lookup_by_model_name() {
        let s = Schema::builder("t")
            .field(Field::int("id").primary())
            .field(Field::int("grp").model_name("group_id"))
            .build()
            .unwrap();
        assert_eq!(s.field_by_model_name("group_id").unwrap().name, "grp");
        assert!(s.field("group_id").is_none());
    }

    #[test]
    fn test_with_model_names_from() {
        let declared = Schema::builder("t")
            .field(Field::int("id").primary())
            .field(Field::int("grp").model_name("group_id"))
            .build()
            .unwrap();
        let live = Schema::builder("t")
            .field(Field::new("id", "int(11)").primary())
            .field(Field::new("grp", "int(11)"))
            .build()
            .unwrap()
            .with_model_names_from(&declared);
        assert_eq!(live.field("grp").unwrap().model_name, "group_id");
        assert!(declared.is_equivalent(&live));
    }

    #[test]
    fn test_for_dialect_spells_postgres_types() {
        let declared = Schema::builder("t")
            .field(Field::serial("id").primary())
            .field(Field::datetime("at"))
            .field(Field::blob("raw"))
            .build()
            .unwrap();
        let pg = declared.for_dialect(Dialect::Postgres);
        assert_eq!(pg.field("id").unwrap().field_type, "serial");
        assert_eq!(pg.field("at").unwrap().field_type, "timestamp");
        assert_eq!(pg.field("raw").unwrap().field_type, "bytea");
        assert_eq!(pg.primary_field().unwrap().name, "id");
        let mysql = declared.for_dialect(Dialect::Mysql);
        assert_eq!(mysql.field("at").unwrap().field_type, "datetime");
    }

    #[test]
    fn test_sync_index_names() {
        let mut declared = Schema::builder("t")
            .field(Field::int("id").primary())
            .field(Field::int("a"))
            .index(&["a"])
            .build()
            .unwrap();
        let live = Schema::builder("t")
            .field(Field::int("id").primary())
            .field(Field::int("a"))
            .named_index("a_live", &["a"], false)
            .build()
            .unwrap();
        declared.sync_index_names(&live);
        assert_eq!(declared.indexes()[0].name, "a_live");
    }
}
