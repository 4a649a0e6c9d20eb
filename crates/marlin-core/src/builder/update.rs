//! UPDATE builder.

use tracing::debug;

use super::{Filter, Statement};
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::expr::{Expression, IntoOperand, Marker, Operand, Params};

/// UPDATE builder.
///
/// Assigned values may be expressions or CASE nodes, so in-place arithmetic
/// such as `level = level + 1` needs no raw SQL.
#[derive(Debug, Clone)]
pub struct Update {
    table: String,
    assignments: Vec<(String, Operand)>,
    filter: Filter,
}

impl Update {
    /// Updates rows of `table`.
    #[must_use]
    pub fn table(table: &str) -> Self {
        Self {
            table: String::from(table),
            assignments: Vec::new(),
            filter: Filter::default(),
        }
    }

    /// Assigns `value` to `column`. A later assignment to the same column
    /// replaces the earlier one.
    #[must_use]
    pub fn set(mut self, column: &str, value: impl IntoOperand) -> Self {
        let value = value.into_operand();
        match self.assignments.iter_mut().find(|(c, _)| c == column) {
            Some(existing) => existing.1 = value,
            None => self.assignments.push((String::from(column), value)),
        }
        self
    }

    #[must_use]
    pub fn filter(mut self, condition: Expression) -> Self {
        self.filter.push(condition);
        self
    }

    #[must_use]
    pub fn filter_any(mut self, conditions: Vec<Expression>) -> Self {
        self.filter.push_any(conditions);
        self
    }

    #[must_use]
    pub fn raw_filter(mut self, sql: &str) -> Self {
        self.filter.push_raw(sql);
        self
    }

    /// Compiles the statement.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidStatement`] when nothing is assigned.
    pub fn build(&self, dialect: Dialect) -> Result<Statement> {
        if self.assignments.is_empty() {
            return Err(Error::invalid(format!(
                "UPDATE of '{}' without assignments",
                self.table
            )));
        }
        let mut params = Params::new();
        let assignments = self
            .assignments
            .iter()
            .map(|(column, value)| {
                Ok(format!(
                    "{} = {}",
                    dialect.quote_identifier(column),
                    value.to_sql(dialect, &mut params)?
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        let sql = format!(
            "UPDATE {} SET {}{}",
            dialect.quote_identifier(&self.table),
            assignments.join(", "),
            self.filter.render(dialect, &mut params)?
        );
        debug!(table = %self.table, "Built UPDATE");
        Ok(Statement { sql, params })
    }
}
