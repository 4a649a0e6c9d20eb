//! Parameter binding.

use crate::value::SqlValue;

/// Named parameters collected while compiling one statement.
///
/// A fresh `Params` is created per compilation and threaded by `&mut`
/// through every node of the tree, so placeholder names are unique within a
/// statement and never shared across statements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    next: usize,
    values: Vec<(String, SqlValue)>,
}

impl Params {
    /// Creates an empty parameter map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `value` and returns its placeholder. Equal values still get
    /// distinct placeholders.
    pub fn bind(&mut self, value: SqlValue) -> String {
        let name = format!("p{}", self.next);
        self.next += 1;
        let placeholder = format!(":{name}");
        self.values.push((name, value));
        placeholder
    }

    /// Bound values, in binding order, keyed by name without the colon.
    #[must_use]
    pub fn values(&self) -> &[(String, SqlValue)] {
        &self.values
    }

    /// Looks a value up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consumes the map, returning the bound values.
    #[must_use]
    pub fn into_values(self) -> Vec<(String, SqlValue)> {
        self.values
    }
}
