//! SQL values.
//!
//! Values travel two ways: bound as named parameters (the normal path for
//! DML) or rendered inline as literals (column defaults in DDL, where no
//! parameter binding exists).

use chrono::{NaiveDate, NaiveDateTime};

use crate::dialect::Dialect;

/// A SQL value that can be bound as a parameter or rendered as a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
    /// Calendar date.
    Date(NaiveDate),
    /// Date and time without zone.
    DateTime(NaiveDateTime),
    /// JSON document.
    Json(serde_json::Value),
}

impl SqlValue {
    /// Renders the value as an inline literal for `dialect`.
    ///
    /// Only DDL uses this; statement builders always bind parameters.
    #[must_use]
    pub fn render_literal(&self, dialect: Dialect) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => match (dialect, b) {
                (Dialect::Sqlite, true) => String::from("1"),
                (Dialect::Sqlite, false) => String::from("0"),
                (_, true) => String::from("TRUE"),
                (_, false) => String::from("FALSE"),
            },
            Self::Int(n) => n.to_string(),
            Self::Float(f) => {
                if f.is_finite() {
                    f.to_string()
                } else {
                    String::from("NULL")
                }
            }
            Self::Text(s) => quote_text(s, dialect),
            Self::Blob(bytes) => {
                let hex: String = bytes.iter().map(|byte| format!("{byte:02X}")).collect();
                match dialect {
                    Dialect::Postgres => format!("'\\x{hex}'::bytea"),
                    Dialect::Mysql | Dialect::Sqlite => format!("X'{hex}'"),
                }
            }
            Self::Date(d) => quote_text(&d.format("%Y-%m-%d").to_string(), dialect),
            Self::DateTime(dt) => {
                quote_text(&dt.format("%Y-%m-%d %H:%M:%S%.f").to_string(), dialect)
            }
            Self::Json(v) => quote_text(&v.to_string(), dialect),
        }
    }

    /// Returns `true` for [`SqlValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

fn quote_text(s: &str, dialect: Dialect) -> String {
    let escaped = s.replace('\'', "''");
    // MySQL treats backslash as an escape inside string literals.
    let escaped = match dialect {
        Dialect::Mysql => escaped.replace('\\', "\\\\"),
        Dialect::Postgres | Dialect::Sqlite => escaped,
    };
    format!("'{escaped}'")
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

macro_rules! int_to_sql_value {
    ($($t:ty),*) => {
        $(
            impl ToSqlValue for $t {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::Int(i64::from(self))
                }
            }
        )*
    };
}

int_to_sql_value!(i8, i16, i32, i64, u8, u16, u32);

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

impl ToSqlValue for NaiveDate {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Date(self)
    }
}

impl ToSqlValue for NaiveDateTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::DateTime(self)
    }
}

impl ToSqlValue for serde_json::Value {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Json(self)
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}
