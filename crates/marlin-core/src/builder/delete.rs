//! DELETE builder.

use tracing::debug;

use super::{Filter, Statement};
use crate::dialect::Dialect;
use crate::error::Result;
use crate::expr::{Expression, Params};

/// DELETE builder. Without a filter every row is deleted.
#[derive(Debug, Clone)]
pub struct Delete {
    table: String,
    filter: Filter,
}

impl Delete {
    /// Starts a DELETE on `table`.
    #[must_use]
    pub fn from(table: &str) -> Self {
        Self {
            table: String::from(table),
            filter: Filter::default(),
        }
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
    /// Fails when a condition cannot be rendered.
    pub fn build(&self, dialect: Dialect) -> Result<Statement> {
        let mut params = Params::new();
        let sql = format!(
            "DELETE FROM {}{}",
            dialect.quote_identifier(&self.table),
            self.filter.render(dialect, &mut params)?
        );
        debug!(table = %self.table, "Built DELETE");
        Ok(Statement { sql, params })
    }
}
