//! Operator chains.

use super::{Marker, Operand, Ops, Params};
use crate::dialect::Dialect;
use crate::error::Result;

/// Operators an [`Expression`] chains with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// `IN`, right operand is a list.
    In,
    /// `NOT IN`, right operand is a list.
    NotIn,
    /// `AND`
    And,
    /// `OR`
    Or,
    /// Postfix, takes no operand.
    IsNull,
    /// Postfix, takes no operand.
    IsNotNull,
}

impl Operator {
    /// Returns the SQL spelling.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::And => "AND",
            Self::Or => "OR",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }
}

/// A head operand followed by `(operator, operand)` pairs, rendered left to
/// right without implicit grouping. Use [`Expression::group`] to
/// parenthesize.
#[derive(Debug, Clone)]
pub struct Expression {
    head: Operand,
    ops: Vec<(Operator, Option<Operand>)>,
    grouped: bool,
}

impl Expression {
    /// Starts an expression at `head`.
    #[must_use]
    pub fn new(head: Operand) -> Self {
        Self {
            head,
            ops: Vec::new(),
            grouped: false,
        }
    }

    /// Appends a binary operator.
    #[must_use]
    pub fn push(mut self, op: Operator, operand: Operand) -> Self {
        self.ops.push((op, Some(operand)));
        self
    }

    /// Appends a postfix operator.
    #[must_use]
    pub fn postfix(mut self, op: Operator) -> Self {
        self.ops.push((op, None));
        self
    }

    /// Wraps the expression in parentheses.
    #[must_use]
    pub fn group(mut self) -> Self {
        self.grouped = true;
        self
    }

    /// `(self) AND (other)`
    #[must_use]
    pub fn and(self, other: Expression) -> Self {
        self.combine(Operator::And, other)
    }

    /// `(self) OR (other)`
    #[must_use]
    pub fn or(self, other: Expression) -> Self {
        self.combine(Operator::Or, other)
    }

    fn combine(self, op: Operator, other: Expression) -> Self {
        Self::new(Operand::Expression(Box::new(self.group())))
            .push(op, Operand::Expression(Box::new(other.group())))
    }

    /// ORs a list of conditions together, `None` when the list is empty.
    #[must_use]
    pub fn any(conditions: impl IntoIterator<Item = Expression>) -> Option<Self> {
        conditions.into_iter().reduce(Self::or)
    }

    /// ANDs a list of conditions together, `None` when the list is empty.
    #[must_use]
    pub fn all(conditions: impl IntoIterator<Item = Expression>) -> Option<Self> {
        conditions.into_iter().reduce(Self::and)
    }
}

impl Ops for Expression {
    /// A grouped expression becomes the head of a new chain, so that
    /// `a.add(1).group().mul(2)` renders `(a + 1) * 2`.
    fn into_expression(self) -> Expression {
        if self.grouped {
            Self::new(Operand::Expression(Box::new(self)))
        } else {
            self
        }
    }
}

impl Marker for Expression {
    fn to_sql(&self, dialect: Dialect, params: &mut Params) -> Result<String> {
        let mut sql = self.head.to_sql(dialect, params)?;
        for (op, operand) in &self.ops {
            sql.push(' ');
            sql.push_str(op.as_sql());
            if let Some(operand) = operand {
                sql.push(' ');
                sql.push_str(&operand.to_sql(dialect, params)?);
            }
        }
        if self.grouped {
            Ok(format!("({sql})"))
        } else {
            Ok(sql)
        }
    }
}
