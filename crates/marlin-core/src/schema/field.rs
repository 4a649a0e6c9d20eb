//! Column descriptors.

use crate::dialect::Dialect;
use crate::value::{SqlValue, ToSqlValue};

use super::types::normalize_type;

/// Default value of a field.
#[derive(Debug, Clone, Default)]
pub enum FieldDefault {
    /// No default.
    #[default]
    None,
    /// A concrete value.
    Value(SqlValue),
    /// A zero-argument producer, evaluated each time the default is needed.
    Producer(fn() -> SqlValue),
    /// A SQL expression such as `CURRENT_TIMESTAMP`, rendered verbatim.
    Expression(String),
}

impl FieldDefault {
    /// Resolves the default to a value, calling the producer if there is one.
    /// Expressions have no value on this side of the database and resolve to
    /// `None`.
    #[must_use]
    pub fn resolve(&self) -> Option<SqlValue> {
        match self {
            Self::None | Self::Expression(_) => None,
            Self::Value(v) => Some(v.clone()),
            Self::Producer(f) => Some(f()),
        }
    }

    /// Renders the default as it appears after `DEFAULT` in DDL.
    #[must_use]
    pub fn render(&self, dialect: Dialect) -> Option<String> {
        match self {
            Self::Expression(sql) => Some(sql.clone()),
            _ => self.resolve().map(|v| v.render_literal(dialect)),
        }
    }

    /// The SQL of an expression default.
    #[must_use]
    pub fn expression(&self) -> Option<&str> {
        match self {
            Self::Expression(sql) => Some(sql),
            _ => None,
        }
    }

    /// Returns `true` unless this is [`FieldDefault::None`].
    #[must_use]
    pub const fn is_some(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Key a field is compared by when diffing: name and normalized type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey {
    /// Column name.
    pub name: String,
    /// Normalized type.
    pub normalized_type: String,
}

/// Description of one column.
///
/// Built fluently:
///
/// ```
/// use marlin_core::Field;
///
/// let level = Field::int("level").comment("user level").default(1);
/// assert_eq!(level.field_type, "int");
/// assert!(level.not_null);
/// ```
#[derive(Debug, Clone)]
pub struct Field {
    /// Column name.
    pub name: String,
    /// Logical name used by the owning model.
    pub model_name: String,
    /// Declared type, e.g. `int`, `varchar(255)`, `serial`.
    pub field_type: String,
    /// Whether this is the primary key.
    pub primary: bool,
    /// Whether this auto-increments.
    pub auto_increment: bool,
    /// Whether NULL is rejected.
    pub not_null: bool,
    /// Column comment.
    pub comment: Option<String>,
    /// Closed value set. Passed through, never checked here.
    pub enum_values: Vec<String>,
    /// Default value, only consulted when the column is added.
    pub default: FieldDefault,
}

impl Field {
    /// Creates a NOT NULL field with the given column name and type.
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            model_name: name.clone(),
            name,
            field_type: field_type.into(),
            primary: false,
            auto_increment: false,
            not_null: true,
            comment: None,
            enum_values: Vec::new(),
            default: FieldDefault::None,
        }
    }

    /// `int` column.
    #[must_use]
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, "int")
    }

    /// `bigint` column.
    #[must_use]
    pub fn bigint(name: impl Into<String>) -> Self {
        Self::new(name, "bigint")
    }

    /// `smallint` column.
    #[must_use]
    pub fn smallint(name: impl Into<String>) -> Self {
        Self::new(name, "smallint")
    }

    /// `tinyint` column.
    #[must_use]
    pub fn tinyint(name: impl Into<String>) -> Self {
        Self::new(name, "tinyint")
    }

    /// `boolean` column.
    #[must_use]
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, "boolean")
    }

    /// `float` column.
    #[must_use]
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, "float")
    }

    /// `decimal(precision,scale)` column.
    #[must_use]
    pub fn decimal(name: impl Into<String>, precision: u8, scale: u8) -> Self {
        Self::new(name, format!("decimal({precision},{scale})"))
    }

    /// `varchar(len)` column.
    #[must_use]
    pub fn varchar(name: impl Into<String>, len: u32) -> Self {
        Self::new(name, format!("varchar({len})"))
    }

    /// `text` column.
    #[must_use]
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, "text")
    }

    /// `blob` column.
    #[must_use]
    pub fn blob(name: impl Into<String>) -> Self {
        Self::new(name, "blob")
    }

    /// `date` column.
    #[must_use]
    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, "date")
    }

    /// `datetime` column.
    #[must_use]
    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, "datetime")
    }

    /// `json` column.
    #[must_use]
    pub fn json(name: impl Into<String>) -> Self {
        Self::new(name, "json")
    }

    /// PostgreSQL `serial` column, auto-incrementing.
    #[must_use]
    pub fn serial(name: impl Into<String>) -> Self {
        Self::new(name, "serial").auto_increment()
    }

    /// Sets the logical name used by the owning model.
    #[must_use]
    pub fn model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    /// Marks the field as the primary key.
    #[must_use]
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self.not_null = true;
        self
    }

    /// Marks the field as auto-incrementing.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Allows NULL.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.not_null = false;
        self
    }

    /// Sets NOT NULL explicitly.
    #[must_use]
    pub fn not_null(mut self, not_null: bool) -> Self {
        self.not_null = not_null;
        self
    }

    /// Sets the column comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Sets the closed value set.
    #[must_use]
    pub fn enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Sets a concrete default value.
    #[must_use]
    pub fn default(mut self, value: impl ToSqlValue) -> Self {
        self.default = FieldDefault::Value(value.to_sql_value());
        self
    }

    /// Sets a default producer.
    #[must_use]
    pub fn default_with(mut self, producer: fn() -> SqlValue) -> Self {
        self.default = FieldDefault::Producer(producer);
        self
    }

    /// Sets a default SQL expression, e.g. `CURRENT_TIMESTAMP`.
    #[must_use]
    pub fn default_expr(mut self, sql: impl Into<String>) -> Self {
        self.default = FieldDefault::Expression(sql.into());
        self
    }

    /// Normalized type, see [`normalize_type`].
    #[must_use]
    pub fn normalized_type(&self) -> String {
        normalize_type(&self.field_type)
    }

    /// Diff key. Defaults, comments and nullability do not participate.
    #[must_use]
    pub fn key(&self) -> FieldKey {
        FieldKey {
            name: self.name.clone(),
            normalized_type: self.normalized_type(),
        }
    }
}
