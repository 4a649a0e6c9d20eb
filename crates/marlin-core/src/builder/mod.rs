//! Statement builders.
//!
//! Each builder collects table, columns and conditions, and compiles to a
//! [`Statement`]: SQL text with named placeholders plus the bound values.
//! Every `build` call starts a fresh [`Params`] scope.
//!
//! # Example
//!
//! ```rust
//! use marlin_core::builder::Select;
//! use marlin_core::expr::{col, Ops};
//! use marlin_core::Dialect;
//!
//! let stmt = Select::table("user", &["id", "name"])
//!     .filter(col("age").ge(18))
//!     .order_by(col("id"), false)
//!     .limit(10)
//!     .build(Dialect::Mysql)
//!     .unwrap();
//!
//! assert_eq!(
//!     stmt.sql,
//!     "SELECT `id`, `name` FROM `user` WHERE `age` >= :p0 ORDER BY `id` DESC LIMIT 10"
//! );
//! ```

mod bulk_update;
mod delete;
mod insert;
mod select;
mod update;

pub use bulk_update::BulkUpdate;
pub use delete::Delete;
pub use insert::Insert;
pub use select::{HintKind, HintScope, IndexHint, Select};
pub use update::Update;

use crate::dialect::Dialect;
use crate::error::Result;
use crate::expr::{Expression, Marker, Params};

/// Compiled SQL and its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL text with `:name` placeholders.
    pub sql: String,
    /// Values for the placeholders.
    pub params: Params,
}

#[derive(Debug, Clone)]
enum Condition {
    Expr(Expression),
    Raw(String),
}

/// WHERE conditions, ANDed together.
#[derive(Debug, Clone, Default)]
pub(crate) struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub(crate) fn push(&mut self, condition: Expression) {
        self.conditions.push(Condition::Expr(condition));
    }

    pub(crate) fn push_any(&mut self, conditions: Vec<Expression>) {
        if let Some(any) = Expression::any(conditions) {
            self.push(any);
        }
    }

    /// Raw fragments are inserted verbatim and never parameterized.
    pub(crate) fn push_raw(&mut self, sql: impl Into<String>) {
        self.conditions.push(Condition::Raw(sql.into()));
    }

    /// Renders ` WHERE ..`, or nothing when there is no condition.
    pub(crate) fn render(&self, dialect: Dialect, params: &mut Params) -> Result<String> {
        let parts = self
            .conditions
            .iter()
            .map(|c| match c {
                Condition::Expr(expr) => expr.to_sql(dialect, params),
                Condition::Raw(sql) => Ok(sql.clone()),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(match parts.len() {
            0 => String::new(),
            1 => format!(" WHERE {}", parts[0]),
            _ => {
                let grouped: Vec<String> = parts.iter().map(|p| format!("({p})")).collect();
                format!(" WHERE {}", grouped.join(" AND "))
            }
        })
    }
}

/// Quoted, comma-separated column list.
pub(crate) fn column_list(dialect: Dialect, columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| dialect.quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ")
}
