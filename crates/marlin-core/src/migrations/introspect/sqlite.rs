//! SQLite `sqlite_schema` parsing.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::{
    column_list, leading_identifier, parenthesized, parse_default_literal, split_top_level,
};
use crate::error::{Error, Result};
use crate::schema::{Field, Index, Schema};

static CREATE_TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*CREATE\s+(?:TEMP(?:ORARY)?\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?")
        .expect("valid regex")
});

static CREATE_INDEX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*CREATE\s+(UNIQUE\s+)?INDEX\s+(?:IF\s+NOT\s+EXISTS\s+)?")
        .expect("valid regex")
});

static ON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*ON\s+").expect("valid regex"));

/// Words that end the type name of a column definition.
const CONSTRAINT_KEYWORDS: [&str; 12] = [
    "PRIMARY",
    "NOT",
    "NULL",
    "DEFAULT",
    "UNIQUE",
    "CHECK",
    "REFERENCES",
    "COLLATE",
    "CONSTRAINT",
    "GENERATED",
    "AS",
    "AUTOINCREMENT",
];

/// One row of `SELECT type, name, tbl_name, sql FROM sqlite_schema`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteMasterRow {
    /// Object type: `table`, `index`, `view` or `trigger`.
    pub kind: String,
    /// Object name.
    pub name: String,
    /// Table the object belongs to.
    pub tbl_name: String,
    /// Creating statement. NULL for automatic indexes.
    pub sql: Option<String>,
}

impl SqliteMasterRow {
    /// Creates a row.
    #[must_use]
    pub fn new(kind: &str, name: &str, tbl_name: &str, sql: Option<&str>) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.to_string(),
            tbl_name: tbl_name.to_string(),
            sql: sql.map(str::to_string),
        }
    }
}

/// Builds the schema of `table` from `sqlite_schema` rows.
///
/// # Errors
///
/// [`Error::SchemaDefinition`] when the table row is missing, its SQL cannot
/// be parsed, or the schema is invalid.
pub fn parse_schema(table: &str, rows: &[SqliteMasterRow]) -> Result<Schema> {
    let table_sql = rows
        .iter()
        .find(|r| r.kind == "table" && r.name == table)
        .and_then(|r| r.sql.as_deref())
        .ok_or_else(|| Error::schema(format!("table '{table}' not found in sqlite_schema")))?;

    let (mut fields, mut indexes, primary) = parse_create_table(table, table_sql)?;

    match primary.as_slice() {
        [] => {}
        [name] => {
            let field = fields
                .iter_mut()
                .find(|f| f.name == *name)
                .ok_or_else(|| {
                    Error::schema(format!("table '{table}': primary key on unknown field '{name}'"))
                })?;
            field.primary = true;
        }
        _ => {
            return Err(Error::schema(format!(
                "table '{table}': composite primary keys are not supported"
            )))
        }
    }

    for row in rows.iter().filter(|r| r.kind == "index" && r.tbl_name == table) {
        match row.sql.as_deref() {
            Some(sql) => indexes.push(parse_create_index(sql)?),
            None => debug!(index = %row.name, "Skipping automatic index"),
        }
    }

    Schema::from_parts(table, fields, indexes, false)
}

fn parse_create_table(table: &str, sql: &str) -> Result<(Vec<Field>, Vec<Index>, Vec<String>)> {
    let bad = || Error::schema(format!("table '{table}': cannot parse {sql}"));
    let head = CREATE_TABLE_RE.find(sql).ok_or_else(bad)?;
    let (_, rest) = leading_identifier(&sql[head.end()..]).ok_or_else(bad)?;
    let (body, _) = parenthesized(rest).ok_or_else(bad)?;

    let mut fields = Vec::new();
    let mut indexes = Vec::new();
    let mut primary = Vec::new();

    for part in split_top_level(body, ',') {
        let upper = part.to_ascii_uppercase();
        if upper.starts_with("PRIMARY KEY") {
            let (inner, _) = parenthesized(&part["PRIMARY KEY".len()..]).ok_or_else(bad)?;
            primary = column_list(inner);
        } else if upper.starts_with("UNIQUE") {
            let (inner, _) = parenthesized(&part["UNIQUE".len()..]).ok_or_else(bad)?;
            let columns = column_list(inner);
            let refs: Vec<&str> = columns.iter().map(String::as_str).collect();
            indexes.push(Index::new(table, &refs, true));
        } else if ["CONSTRAINT", "FOREIGN KEY", "CHECK"]
            .iter()
            .any(|kw| upper.starts_with(kw))
        {
            warn!(table = %table, clause = %part, "Skipping unsupported table constraint");
        } else {
            let (field, inline_primary, inline_unique) = parse_column(&part).ok_or_else(bad)?;
            if inline_primary {
                primary = vec![field.name.clone()];
            }
            if inline_unique {
                indexes.push(Index::new(table, &[field.name.as_str()], true));
            }
            fields.push(field);
        }
    }
    Ok((fields, indexes, primary))
}

/// Parses one column definition, returning the field and whether it carries
/// inline PRIMARY KEY and UNIQUE constraints.
fn parse_column(def: &str) -> Option<(Field, bool, bool)> {
    let (name, rest) = leading_identifier(def)?;
    let rest = rest.replace(['\n', '\t', '\r'], " ");
    let tokens: Vec<String> = split_top_level(&rest, ' ')
        .into_iter()
        .filter(|t| !t.is_empty())
        .collect();
    let is_keyword = |t: &str| CONSTRAINT_KEYWORDS.iter().any(|k| t.eq_ignore_ascii_case(k));

    let type_end = tokens.iter().position(|t| is_keyword(t)).unwrap_or(tokens.len());
    let field_type = tokens[..type_end].join(" ");

    let mut field = Field::new(name, field_type).nullable();
    let mut primary = false;
    let mut unique = false;
    let mut i = type_end;
    while i < tokens.len() {
        let token = tokens[i].to_ascii_uppercase();
        match token.as_str() {
            "PRIMARY" => primary = true,
            "AUTOINCREMENT" => field.auto_increment = true,
            "NOT" if tokens.get(i + 1).is_some_and(|t| t.eq_ignore_ascii_case("NULL")) => {
                field.not_null = true;
                i += 1;
            }
            "DEFAULT" => {
                if let Some(raw) = tokens.get(i + 1) {
                    field.default = parse_default_literal(raw);
                }
                i += 1;
            }
            "UNIQUE" => unique = true,
            _ => {}
        }
        i += 1;
    }
    if primary {
        field.not_null = true;
    }
    Some((field, primary, unique))
}

fn parse_create_index(sql: &str) -> Result<Index> {
    let bad = || Error::schema(format!("cannot parse index: {sql}"));
    let caps = CREATE_INDEX_RE.captures(sql).ok_or_else(bad)?;
    let unique = caps.get(1).is_some();
    let head_end = caps.get(0).map_or(0, |m| m.end());
    let (name, rest) = leading_identifier(&sql[head_end..]).ok_or_else(bad)?;
    let on = ON_RE.find(rest).ok_or_else(bad)?;
    let (_, rest) = leading_identifier(&rest[on.end()..]).ok_or_else(bad)?;
    let (inner, _) = parenthesized(rest).ok_or_else(bad)?;
    let columns = column_list(inner);
    let refs: Vec<&str> = columns.iter().map(String::as_str).collect();
    Ok(Index::named(name, &refs, unique))
}
