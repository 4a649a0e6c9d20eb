//! MySQL `SHOW CREATE TABLE` parsing.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use super::{
    column_list, leading_identifier, parenthesized, parse_default_literal, split_top_level,
};
use crate::error::{Error, Result};
use crate::schema::{Field, Index, Schema};

static CREATE_TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*CREATE\s+(?:TEMPORARY\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?")
        .expect("valid regex")
});

static KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(UNIQUE\s+)?(?:KEY|INDEX)\s+").expect("valid regex")
});

static NOT_NULL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bNOT\s+NULL\b").expect("valid regex"));

static AUTO_INCREMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bAUTO_INCREMENT\b").expect("valid regex"));

static DEFAULT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bDEFAULT\s+('(?:[^'\\]|''|\\.)*'|\S+)").expect("valid regex")
});

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bCOMMENT\s+'((?:[^'\\]|''|\\.)*)'").expect("valid regex")
});

/// Parses the DDL returned by `SHOW CREATE TABLE`.
///
/// # Errors
///
/// [`Error::SchemaDefinition`] when the text is not a CREATE TABLE, a line
/// cannot be classified, or the resulting schema is invalid (for instance
/// without a primary key).
pub fn parse_show_create_table(ddl: &str) -> Result<Schema> {
    let head = CREATE_TABLE_RE
        .find(ddl)
        .ok_or_else(|| Error::schema("not a CREATE TABLE statement"))?;
    let (table, rest) = leading_identifier(&ddl[head.end()..])
        .ok_or_else(|| Error::schema("CREATE TABLE without a table name"))?;
    let (body, _options) = parenthesized(rest)
        .ok_or_else(|| Error::schema(format!("table '{table}': unterminated column list")))?;

    let mut fields = Vec::new();
    let mut indexes = Vec::new();
    let mut primary: Vec<String> = Vec::new();

    for line in split_top_level(body, ',') {
        let upper = line.to_ascii_uppercase();
        if upper.starts_with("PRIMARY KEY") {
            let (inner, _) = parenthesized(&line["PRIMARY KEY".len()..])
                .ok_or_else(|| Error::schema(format!("table '{table}': bad line: {line}")))?;
            primary = column_list(inner);
        } else if let Some(m) = KEY_RE.captures(&line) {
            let unique = m.get(1).is_some();
            let after = &line[m.get(0).map_or(0, |g| g.end())..];
            let (name, cols) = leading_identifier(after)
                .ok_or_else(|| Error::schema(format!("table '{table}': bad line: {line}")))?;
            let (inner, _) = parenthesized(cols)
                .ok_or_else(|| Error::schema(format!("table '{table}': bad line: {line}")))?;
            let columns = column_list(inner);
            let refs: Vec<&str> = columns.iter().map(String::as_str).collect();
            indexes.push(Index::named(name, &refs, unique));
        } else if ["CONSTRAINT", "FOREIGN KEY", "CHECK", "FULLTEXT", "SPATIAL"]
            .iter()
            .any(|kw| upper.starts_with(kw))
        {
            warn!(table = %table, line = %line, "Skipping unsupported table clause");
        } else if line.starts_with('`') {
            fields.push(parse_column(&line)?);
        } else {
            return Err(Error::schema(format!(
                "table '{table}': unrecognized line: {line}"
            )));
        }
    }

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

    Schema::from_parts(table, fields, indexes, false)
}

fn parse_column(line: &str) -> Result<Field> {
    let (name, rest) =
        leading_identifier(line).ok_or_else(|| Error::schema(format!("bad column: {line}")))?;
    let (field_type, attrs) = split_type(rest);
    if field_type.is_empty() {
        return Err(Error::schema(format!("column '{name}' has no type")));
    }

    // The comment is removed first so its text cannot match other attributes.
    let mut attrs = attrs.to_string();
    let comment = COMMENT_RE.captures(&attrs).map(|c| {
        let text = c.get(1).map_or("", |m| m.as_str());
        text.replace("''", "'").replace("\\'", "'").replace("\\\\", "\\")
    });
    if let Some(range) = COMMENT_RE.find(&attrs).map(|m| m.range()) {
        attrs.replace_range(range, "");
    }

    let mut field = Field::new(name, field_type).not_null(NOT_NULL_RE.is_match(&attrs));
    if AUTO_INCREMENT_RE.is_match(&attrs) {
        field = field.auto_increment();
    }
    if let Some(raw) = DEFAULT_RE.captures(&attrs).and_then(|c| c.get(1)) {
        field.default = parse_default_literal(raw.as_str());
    }
    field.comment = comment;
    Ok(field)
}

/// Splits a column's type, including `unsigned`/`zerofill` modifiers, from
/// the attributes that follow it.
fn split_type(rest: &str) -> (String, &str) {
    let rest = rest.trim_start();
    let mut depth = 0_usize;
    let mut quoted = false;
    let mut end = rest.len();
    for (i, c) in rest.char_indices() {
        match c {
            '\'' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && !quoted && depth == 0 => {
                end = i;
                break;
            }
            _ => {}
        }
    }
    let mut ty = rest[..end].to_string();
    let mut attrs = &rest[end..];
    loop {
        let trimmed = attrs.trim_start();
        let word_end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        let word = &trimmed[..word_end];
        if word.eq_ignore_ascii_case("unsigned") || word.eq_ignore_ascii_case("zerofill") {
            ty.push(' ');
            ty.push_str(word);
            attrs = &trimmed[word_end..];
        } else {
            break;
        }
    }
    (ty, attrs)
}
