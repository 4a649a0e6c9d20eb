//! Catalog introspection.
//!
//! Turns what a live database reports about a table into a [`Schema`]. The
//! queries themselves are run by the caller; these parsers only see text and
//! rows.
//!
//! [`Schema`]: crate::schema::Schema

pub mod mysql;
pub mod postgres;
pub mod sqlite;

use crate::schema::FieldDefault;
use crate::value::SqlValue;

/// Strips one level of identifier quoting: backticks, double quotes or
/// brackets. Doubled quote characters inside are unescaped.
pub(crate) fn unquote_identifier(raw: &str) -> String {
    let raw = raw.trim();
    match (raw.chars().next(), raw.chars().last()) {
        (Some('`'), Some('`')) if raw.len() >= 2 => raw[1..raw.len() - 1].replace("``", "`"),
        (Some('"'), Some('"')) if raw.len() >= 2 => raw[1..raw.len() - 1].replace("\"\"", "\""),
        (Some('['), Some(']')) if raw.len() >= 2 => raw[1..raw.len() - 1].to_string(),
        _ => raw.to_string(),
    }
}

/// Splits `s` on `sep` where it is outside parentheses and quotes.
pub(crate) fn split_top_level(s: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0_usize;
    let mut quote: Option<char> = None;
    for c in s.chars() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
                current.push(c);
            }
            None => match c {
                '\'' | '"' | '`' => {
                    quote = Some(c);
                    current.push(c);
                }
                '[' => {
                    quote = Some(']');
                    current.push(c);
                }
                '(' => {
                    depth += 1;
                    current.push(c);
                }
                ')' => {
                    depth = depth.saturating_sub(1);
                    current.push(c);
                }
                c if c == sep && depth == 0 => {
                    parts.push(current.trim().to_string());
                    current.clear();
                }
                _ => current.push(c),
            },
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// Given text starting with `(`, returns the text inside the matching `)`
/// and whatever follows it.
pub(crate) fn parenthesized(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if !s.starts_with('(') {
        return None;
    }
    let mut depth = 0_usize;
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&s[1..i], &s[i + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

/// Reads the leading identifier of `s`, quoted or bare, returning it
/// unquoted along with the remaining text.
pub(crate) fn leading_identifier(s: &str) -> Option<(String, &str)> {
    let s = s.trim_start();
    let first = s.chars().next()?;
    let close = match first {
        '`' => Some('`'),
        '"' => Some('"'),
        '[' => Some(']'),
        _ => None,
    };
    match close {
        Some(close) => {
            let mut end = None;
            let mut iter = s.char_indices().skip(1).peekable();
            while let Some((i, c)) = iter.next() {
                if c == close {
                    // A doubled quote is an escaped quote.
                    if close != ']' && iter.peek().map(|&(_, n)| n) == Some(close) {
                        iter.next();
                        continue;
                    }
                    end = Some(i);
                    break;
                }
            }
            let end = end?;
            Some((unquote_identifier(&s[..=end]), &s[end + 1..]))
        }
        None => {
            let end = s
                .find(|c: char| c.is_whitespace() || c == '(' || c == ',')
                .unwrap_or(s.len());
            if end == 0 {
                return None;
            }
            Some((s[..end].to_string(), &s[end..]))
        }
    }
}

/// Reads the column list of an index or key clause: `(a, b(10) DESC)`.
/// Prefix lengths, collations and sort orders are dropped.
pub(crate) fn column_list(inner: &str) -> Vec<String> {
    split_top_level(inner, ',')
        .iter()
        .filter_map(|part| leading_identifier(part).map(|(name, _)| name))
        .collect()
}

/// Interprets a catalog-reported default. Quoted strings, numbers and
/// booleans become constants; function calls and keywords such as
/// `CURRENT_TIMESTAMP` are kept as expressions.
pub(crate) fn parse_default_literal(raw: &str) -> FieldDefault {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") {
        return FieldDefault::None;
    }
    if raw.len() >= 2 && raw.starts_with('\'') {
        if let Some(end) = raw.rfind('\'') {
            if end > 0 {
                let inner = &raw[1..end];
                return FieldDefault::Value(SqlValue::Text(
                    inner.replace("''", "'").replace("\\'", "'"),
                ));
            }
        }
    }
    if let Ok(n) = raw.parse::<i64>() {
        return FieldDefault::Value(SqlValue::Int(n));
    }
    if let Ok(f) = raw.parse::<f64>() {
        return FieldDefault::Value(SqlValue::Float(f));
    }
    match raw.to_ascii_lowercase().as_str() {
        "true" => FieldDefault::Value(SqlValue::Bool(true)),
        "false" => FieldDefault::Value(SqlValue::Bool(false)),
        _ => FieldDefault::Expression(raw.to_string()),
    }
}
