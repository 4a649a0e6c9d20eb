//! PostgreSQL catalog parsing.
//!
//! Works on rows of `information_schema.columns` (plus the column comment
//! from `col_description`) and `pg_indexes`.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use super::{column_list, parenthesized, parse_default_literal};
use crate::error::{Error, Result};
use crate::schema::{Field, Index, Schema};

static INDEXDEF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?is)^\s*CREATE\s+(UNIQUE\s+)?INDEX\s+\S+\s+",
        r"ON\s+(?:ONLY\s+)?\S+\s+(?:USING\s+\w+\s*)?",
    ))
    .expect("valid regex")
});

static CAST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"::[\w\s]+(?:\[\])?$").expect("valid regex"));

/// One row of `information_schema.columns`, in `ordinal_position` order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PgColumnRow {
    /// Column name.
    pub column_name: String,
    /// Type without arguments, e.g. `character varying` or `numeric`.
    pub data_type: String,
    /// Length of character types.
    pub character_maximum_length: Option<i64>,
    /// Precision of numeric types.
    pub numeric_precision: Option<i64>,
    /// Scale of numeric types.
    pub numeric_scale: Option<i64>,
    /// `YES` or `NO`.
    pub is_nullable: String,
    /// Default expression as the catalog prints it, casts included.
    pub column_default: Option<String>,
    /// `col_description(..)`, if selected.
    pub comment: Option<String>,
}

impl PgColumnRow {
    /// Creates a NOT NULL column row without default.
    #[must_use]
    pub fn new(column_name: &str, data_type: &str) -> Self {
        Self {
            column_name: column_name.to_string(),
            data_type: data_type.to_string(),
            is_nullable: String::from("NO"),
            ..Self::default()
        }
    }
}

/// One row of `pg_indexes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgIndexRow {
    /// Index name.
    pub indexname: String,
    /// Reconstructed `CREATE INDEX` statement.
    pub indexdef: String,
}

impl PgIndexRow {
    /// Creates an index row.
    #[must_use]
    pub fn new(indexname: &str, indexdef: &str) -> Self {
        Self {
            indexname: indexname.to_string(),
            indexdef: indexdef.to_string(),
        }
    }
}

/// Builds the schema of `table` from catalog rows.
///
/// Columns defaulting to `nextval(..)` are reported as `serial`/`bigserial`
/// and marked auto-increment. The `<table>_pkey` index designates the
/// primary field and is not listed among the indexes.
///
/// # Errors
///
/// [`Error::SchemaDefinition`] when an index definition cannot be parsed,
/// the primary key is composite, or the schema is invalid.
pub fn parse_catalog(
    table: &str,
    columns: &[PgColumnRow],
    indexes: &[PgIndexRow],
) -> Result<Schema> {
    let mut fields: Vec<Field> = columns.iter().map(parse_column).collect();
    let mut parsed = Vec::new();

    for row in indexes {
        let (unique, cols) = parse_indexdef(&row.indexdef)?;
        if cols.is_empty() {
            warn!(index = %row.indexname, "Skipping expression index");
            continue;
        }
        if row.indexname.ends_with("_pkey") {
            let [name] = cols.as_slice() else {
                return Err(Error::schema(format!(
                    "table '{table}': composite primary keys are not supported"
                )));
            };
            let field = fields.iter_mut().find(|f| f.name == *name).ok_or_else(|| {
                Error::schema(format!("table '{table}': primary key on unknown field '{name}'"))
            })?;
            field.primary = true;
            continue;
        }
        let refs: Vec<&str> = cols.iter().map(String::as_str).collect();
        parsed.push(Index::named(row.indexname.as_str(), &refs, unique));
    }

    Schema::from_parts(table, fields, parsed, false)
}

fn parse_column(row: &PgColumnRow) -> Field {
    let data_type = row.data_type.to_ascii_lowercase();
    let serial = row
        .column_default
        .as_deref()
        .is_some_and(|d| d.trim_start().starts_with("nextval("));

    let field_type = match (data_type.as_str(), serial) {
        ("integer", true) => String::from("serial"),
        ("bigint", true) => String::from("bigserial"),
        ("smallint", true) => String::from("smallserial"),
        ("character varying" | "character", false) => match row.character_maximum_length {
            Some(len) => format!("{data_type}({len})"),
            None => data_type.clone(),
        },
        ("numeric", false) => match (row.numeric_precision, row.numeric_scale) {
            (Some(p), Some(s)) => format!("numeric({p},{s})"),
            (Some(p), None) => format!("numeric({p})"),
            _ => data_type.clone(),
        },
        _ => data_type.clone(),
    };

    let mut field = Field::new(row.column_name.as_str(), field_type)
        .not_null(row.is_nullable.eq_ignore_ascii_case("NO"));
    if serial {
        field = field.auto_increment();
    } else if let Some(raw) = row.column_default.as_deref() {
        field.default = parse_default_literal(&CAST_RE.replace(raw.trim(), ""));
    }
    field.comment.clone_from(&row.comment);
    field
}

/// Returns the unique flag and plain column names of an index definition.
/// Expression columns yield an empty list.
fn parse_indexdef(indexdef: &str) -> Result<(bool, Vec<String>)> {
    let bad = || Error::schema(format!("cannot parse index definition: {indexdef}"));
    let caps = INDEXDEF_RE.captures(indexdef).ok_or_else(bad)?;
    let unique = caps.get(1).is_some();
    let head_end = caps.get(0).map_or(0, |m| m.end());
    let (inner, _) = parenthesized(&indexdef[head_end..]).ok_or_else(bad)?;
    if inner.contains('(') {
        return Ok((unique, Vec::new()));
    }
    Ok((unique, column_list(inner)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqlValue;

    fn columns() -> Vec<PgColumnRow> {
        vec![
            PgColumnRow {
                column_default: Some(String::from("nextval('user_id_seq'::regclass)")),
                ..PgColumnRow::new("id", "integer")
            },
            PgColumnRow {
                character_maximum_length: Some(255),
                column_default: Some(String::from("'anon'::character varying")),
                comment: Some(String::from("display name")),
                ..PgColumnRow::new("name", "character varying")
            },
            PgColumnRow {
                numeric_precision: Some(4),
                numeric_scale: Some(2),
                is_nullable: String::from("YES"),
                ..PgColumnRow::new("score", "numeric")
            },
            PgColumnRow {
                numeric_precision: Some(32),
                numeric_scale: Some(0),
                column_default: Some(String::from("0")),
                ..PgColumnRow::new("level", "integer")
            },
            PgColumnRow {
                column_default: Some(String::from("now()")),
                ..PgColumnRow::new("created_at", "timestamp without time zone")
            },
        ]
    }

    fn indexes() -> Vec<PgIndexRow> {
        vec![
            PgIndexRow::new(
                "user_pkey",
                "CREATE UNIQUE INDEX user_pkey ON public.\"user\" USING btree (id)",
            ),
            PgIndexRow::new(
                "name_level_idx",
                "CREATE INDEX name_level_idx ON public.\"user\" USING btree (name, level DESC)",
            ),
            PgIndexRow::new(
                "lower_name_idx",
                "CREATE INDEX lower_name_idx ON public.\"user\" USING btree (lower((name)::text))",
            ),
        ]
    }

    #[test]
    fn test_parse_catalog() {
        let schema = parse_catalog("user", &columns(), &indexes()).unwrap();

        let id = schema.primary_field().unwrap();
        assert_eq!(id.name, "id");
        assert_eq!(id.field_type, "serial");
        assert!(id.auto_increment);
        assert!(!id.default.is_some());

        let name = schema.field("name").unwrap();
        assert_eq!(name.field_type, "character varying(255)");
        assert_eq!(name.normalized_type(), "varchar(255)");
        assert_eq!(name.comment.as_deref(), Some("display name"));
        assert_eq!(name.default.resolve(), Some(SqlValue::Text(String::from("anon"))));

        let score = schema.field("score").unwrap();
        assert_eq!(score.normalized_type(), "decimal(4,2)");
        assert!(!score.not_null);

        let level = schema.field("level").unwrap();
        assert_eq!(level.field_type, "integer");
        assert_eq!(level.default.resolve(), Some(SqlValue::Int(0)));

        let created_at = schema.field("created_at").unwrap();
        assert_eq!(created_at.normalized_type(), "timestamp");
        assert_eq!(created_at.default.expression(), Some("now()"));

        assert_eq!(schema.indexes().len(), 1);
        assert_eq!(schema.indexes()[0].name, "name_level_idx");
        assert_eq!(schema.indexes()[0].fields, ["name", "level"]);
    }

    #[test]
    fn test_no_pkey_is_an_error() {
        let err = parse_catalog("user", &columns(), &[]).unwrap_err();
        assert!(matches!(err, Error::SchemaDefinition(_)));
    }

    #[test]
    fn test_quoted_index_columns() {
        let (unique, cols) =
            parse_indexdef("CREATE UNIQUE INDEX \"ab_uiq\" ON \"t\" USING btree (\"Mixed\", plain)")
                .unwrap();
        assert!(unique);
        assert_eq!(cols, ["Mixed", "plain"]);
    }
}
