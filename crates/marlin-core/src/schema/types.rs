//! Column type normalization.
//!
//! Declared types and catalog-reported types spell the same storage type in
//! different ways (`int(11)` from `SHOW CREATE TABLE`, `integer` from
//! `information_schema`, `INTEGER` from `sqlite_schema`). The differ compares
//! the normalized spelling so these do not show up as type changes.

use crate::value::SqlValue;

/// Normalizes a column type for comparison.
///
/// Integer display widths and `zerofill` are dropped, aliases are folded to
/// one canonical name, and precision arguments of other types are kept with
/// whitespace removed. `unsigned` survives as a suffix.
#[must_use]
pub fn normalize_type(ty: &str) -> String {
    let lowered = ty.to_ascii_lowercase();
    let mut unsigned = false;
    let words: Vec<&str> = lowered
        .split_whitespace()
        .filter(|w| match *w {
            "unsigned" => {
                unsigned = true;
                false
            }
            "zerofill" | "signed" => false,
            _ => true,
        })
        .collect();
    let collapsed = words.join(" ");

    let (base, args) = match collapsed.find('(') {
        Some(open) => {
            let after = &collapsed[open + 1..];
            match after.find(')') {
                Some(close) => {
                    let args: String = after[..close]
                        .chars()
                        .filter(|c| !c.is_whitespace())
                        .collect();
                    let tail = after[close + 1..].trim();
                    let head = collapsed[..open].trim();
                    let base = if tail.is_empty() {
                        head.to_string()
                    } else {
                        format!("{head} {tail}")
                    };
                    (base, Some(args))
                }
                None => (collapsed.clone(), None),
            }
        }
        None => (collapsed.clone(), None),
    };

    if base == "tinyint" && args.as_deref() == Some("1") {
        return String::from("boolean");
    }

    let canonical = canonical_base(&base);
    let mut out = canonical.to_string();
    if let Some(args) = args {
        if !is_integer_family(canonical) && !args.is_empty() {
            out.push('(');
            out.push_str(&args);
            out.push(')');
        }
    }
    if unsigned {
        out.push_str(" unsigned");
    }
    out
}

fn canonical_base(base: &str) -> &str {
    match base {
        "integer" | "int4" | "serial" | "serial4" => "int",
        "int8" | "bigserial" | "serial8" => "bigint",
        "int2" | "smallserial" | "serial2" => "smallint",
        "bool" => "boolean",
        "character varying" => "varchar",
        "character" => "char",
        "double precision" | "float8" => "double",
        "float4" | "real" => "float",
        "numeric" => "decimal",
        "timestamp without time zone" => "timestamp",
        other => other,
    }
}

fn is_integer_family(base: &str) -> bool {
    matches!(base, "tinyint" | "smallint" | "mediumint" | "int" | "bigint")
}

/// Returns the PostgreSQL storage type for a declared type.
///
/// `serial` pseudo-types only exist in `CREATE TABLE`; casts and
/// `ALTER COLUMN ... TYPE` need the underlying integer type.
#[must_use]
pub fn postgres_storage_type(ty: &str) -> String {
    match ty.trim().to_ascii_lowercase().as_str() {
        "serial" | "serial4" => String::from("integer"),
        "bigserial" | "serial8" => String::from("bigint"),
        "smallserial" | "serial2" => String::from("smallint"),
        _ => postgres_type(ty),
    }
}

/// Translates MySQL-style shorthands into types PostgreSQL accepts.
///
/// Precision arguments survive where PostgreSQL has an equivalent
/// (`datetime(6)` becomes `timestamp(6)`). Anything already valid is returned
/// as declared.
#[must_use]
pub fn postgres_type(ty: &str) -> String {
    let trimmed = ty.trim();
    let lowered = trimmed.to_ascii_lowercase();
    let (base, args) = lowered
        .find('(')
        .map_or((lowered.as_str(), ""), |open| {
            (lowered[..open].trim_end(), &lowered[open..])
        });
    match base {
        "datetime" => format!("timestamp{args}"),
        "tinyint" if normalize_type(&lowered) == "boolean" => String::from("boolean"),
        "tinyint" => String::from("smallint"),
        "mediumint" => String::from("integer"),
        "float" => String::from("real"),
        "double" => String::from("double precision"),
        "blob" | "tinyblob" | "mediumblob" | "longblob" => String::from("bytea"),
        "tinytext" | "mediumtext" | "longtext" => String::from("text"),
        _ => trimmed.to_string(),
    }
}

/// The value existing rows receive when a `NOT NULL` column without a default
/// is added to a populated table. `None` when the type has no obvious zero.
#[must_use]
pub fn zero_value(ty: &str) -> Option<SqlValue> {
    let normalized = normalize_type(ty);
    let base = normalized
        .split(['(', ' '])
        .next()
        .unwrap_or_default();
    let value = match base {
        "tinyint" | "smallint" | "mediumint" | "int" | "bigint" | "decimal" | "float"
        | "double" => SqlValue::Int(0),
        "boolean" => SqlValue::Bool(false),
        "char" | "varchar" | "text" | "tinytext" | "mediumtext" | "longtext" => {
            SqlValue::Text(String::new())
        }
        "blob" | "tinyblob" | "mediumblob" | "longblob" | "bytea" => SqlValue::Blob(Vec::new()),
        "date" => SqlValue::Text(String::from("1970-01-01")),
        "datetime" | "timestamp" => SqlValue::Text(String::from("1970-01-01 00:00:00")),
        "json" | "jsonb" => SqlValue::Text(String::from("{}")),
        _ => return None,
    };
    Some(value)
}
