//! Expression trees.
//!
//! Conditions, arithmetic and CASE nodes are built by chaining methods on
//! columns and fields, then compiled against a [`Dialect`] with a shared
//! [`Params`] map that collects every literal as a named parameter.
//!
//! ```
//! use marlin_core::expr::{col, Marker, Ops, Params};
//! use marlin_core::Dialect;
//!
//! let cond = col("a").eq(1).and(col("b").eq(1));
//! let mut params = Params::new();
//! let sql = cond.to_sql(Dialect::Mysql, &mut params).unwrap();
//! assert_eq!(sql, "(`a` = :p0) AND (`b` = :p1)");
//! assert_eq!(params.len(), 2);
//! ```

mod case;
mod expression;
mod params;

pub use case::Case;
pub use expression::{Expression, Operator};
pub use params::Params;

use chrono::{NaiveDate, NaiveDateTime};

use crate::builder::Select;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::schema::Field;
use crate::value::{SqlValue, ToSqlValue};

/// A node that compiles to SQL, binding its literals into `params`.
pub trait Marker {
    /// Renders the node for `dialect`.
    ///
    /// # Errors
    ///
    /// Fails when a node cannot be expressed in `dialect` or is malformed.
    fn to_sql(&self, dialect: Dialect, params: &mut Params) -> Result<String>;
}

/// Creates a column reference.
#[must_use]
pub fn col(name: &str) -> Column {
    Column {
        name: String::from(name),
    }
}

/// A column reference.
#[derive(Debug, Clone)]
pub struct Column {
    /// Column name.
    pub name: String,
}

impl Marker for Column {
    fn to_sql(&self, dialect: Dialect, _params: &mut Params) -> Result<String> {
        Ok(dialect.quote_identifier(&self.name))
    }
}

/// Right-hand side of an operator.
#[derive(Debug, Clone)]
pub enum Operand {
    /// Quoted identifier, never a parameter.
    Column(String),
    /// Bound as a parameter.
    Value(SqlValue),
    /// Parenthesized list of parameters.
    List(Vec<SqlValue>),
    /// Nested expression.
    Expression(Box<Expression>),
    /// CASE node.
    Case(Box<Case>),
    /// Parenthesized sub-select.
    Select(Box<Select>),
}

impl Marker for Operand {
    fn to_sql(&self, dialect: Dialect, params: &mut Params) -> Result<String> {
        match self {
            Self::Column(name) => Ok(dialect.quote_identifier(name)),
            Self::Value(value) => Ok(params.bind(value.clone())),
            Self::List(values) => {
                if values.is_empty() {
                    // `IN ()` is a syntax error; `IN (NULL)` matches nothing.
                    return Ok(String::from("(NULL)"));
                }
                let placeholders: Vec<String> =
                    values.iter().map(|v| params.bind(v.clone())).collect();
                Ok(format!("({})", placeholders.join(", ")))
            }
            Self::Expression(expr) => expr.to_sql(dialect, params),
            Self::Case(case) => case.to_sql(dialect, params),
            Self::Select(select) => Ok(format!("({})", select.to_sql(dialect, params)?)),
        }
    }
}

/// Conversion into an [`Operand`].
pub trait IntoOperand {
    /// Converts `self`.
    fn into_operand(self) -> Operand;
}

impl IntoOperand for Operand {
    fn into_operand(self) -> Operand {
        self
    }
}

impl IntoOperand for Column {
    fn into_operand(self) -> Operand {
        Operand::Column(self.name)
    }
}

impl IntoOperand for &Field {
    fn into_operand(self) -> Operand {
        Operand::Column(self.name.clone())
    }
}

impl IntoOperand for Expression {
    fn into_operand(self) -> Operand {
        Operand::Expression(Box::new(self))
    }
}

impl IntoOperand for Case {
    fn into_operand(self) -> Operand {
        Operand::Case(Box::new(self))
    }
}

impl IntoOperand for Select {
    fn into_operand(self) -> Operand {
        Operand::Select(Box::new(self))
    }
}

impl<T: ToSqlValue> IntoOperand for Option<T> {
    fn into_operand(self) -> Operand {
        Operand::Value(self.to_sql_value())
    }
}

macro_rules! value_operand {
    ($($t:ty),* $(,)?) => {
        $(
            impl IntoOperand for $t {
                fn into_operand(self) -> Operand {
                    Operand::Value(self.to_sql_value())
                }
            }
        )*
    };
}

value_operand!(
    SqlValue,
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    String,
    &str,
    Vec<u8>,
    &[u8],
    NaiveDate,
    NaiveDateTime,
    serde_json::Value,
);

/// Comparison, pattern, membership and arithmetic builders.
///
/// Implemented by everything that can start an expression: [`Column`],
/// `&Field` and [`Expression`] itself (which appends to its chain).
pub trait Ops: Sized {
    /// Converts `self` into an expression.
    fn into_expression(self) -> Expression;

    /// `self = value`
    fn eq(self, value: impl IntoOperand) -> Expression {
        self.into_expression().push(Operator::Eq, value.into_operand())
    }

    /// `self != value`
    fn ne(self, value: impl IntoOperand) -> Expression {
        self.into_expression().push(Operator::Ne, value.into_operand())
    }

    /// `self > value`
    fn gt(self, value: impl IntoOperand) -> Expression {
        self.into_expression().push(Operator::Gt, value.into_operand())
    }

    /// `self >= value`
    fn ge(self, value: impl IntoOperand) -> Expression {
        self.into_expression().push(Operator::Ge, value.into_operand())
    }

    /// `self < value`
    fn lt(self, value: impl IntoOperand) -> Expression {
        self.into_expression().push(Operator::Lt, value.into_operand())
    }

    /// `self <= value`
    fn le(self, value: impl IntoOperand) -> Expression {
        self.into_expression().push(Operator::Le, value.into_operand())
    }

    /// `self LIKE pattern`
    fn like(self, pattern: impl IntoOperand) -> Expression {
        self.into_expression().push(Operator::Like, pattern.into_operand())
    }

    /// `self NOT LIKE pattern`
    fn not_like(self, pattern: impl IntoOperand) -> Expression {
        self.into_expression()
            .push(Operator::NotLike, pattern.into_operand())
    }

    /// `self IN (values..)`. An empty list renders as `IN (NULL)`.
    fn in_list<T, I>(self, values: I) -> Expression
    where
        T: ToSqlValue,
        I: IntoIterator<Item = T>,
    {
        let values = values.into_iter().map(ToSqlValue::to_sql_value).collect();
        self.into_expression().push(Operator::In, Operand::List(values))
    }

    /// `self NOT IN (values..)`
    fn not_in<T, I>(self, values: I) -> Expression
    where
        T: ToSqlValue,
        I: IntoIterator<Item = T>,
    {
        let values = values.into_iter().map(ToSqlValue::to_sql_value).collect();
        self.into_expression()
            .push(Operator::NotIn, Operand::List(values))
    }

    /// `self IN (SELECT ..)`
    fn in_select(self, select: Select) -> Expression {
        self.into_expression()
            .push(Operator::In, Operand::Select(Box::new(select)))
    }

    /// `self IS NULL`
    fn is_null(self) -> Expression {
        self.into_expression().postfix(Operator::IsNull)
    }

    /// `self IS NOT NULL`
    fn is_not_null(self) -> Expression {
        self.into_expression().postfix(Operator::IsNotNull)
    }

    /// `self + value`
    fn add(self, value: impl IntoOperand) -> Expression {
        self.into_expression().push(Operator::Add, value.into_operand())
    }

    /// `self - value`
    fn sub(self, value: impl IntoOperand) -> Expression {
        self.into_expression().push(Operator::Sub, value.into_operand())
    }

    /// `self * value`
    fn mul(self, value: impl IntoOperand) -> Expression {
        self.into_expression().push(Operator::Mul, value.into_operand())
    }

    /// `self / value`
    fn div(self, value: impl IntoOperand) -> Expression {
        self.into_expression().push(Operator::Div, value.into_operand())
    }
}

impl Ops for Column {
    fn into_expression(self) -> Expression {
        Expression::new(self.into_operand())
    }
}

impl Ops for &Field {
    fn into_expression(self) -> Expression {
        Expression::new(self.into_operand())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(marker: &impl Marker, dialect: Dialect) -> (String, Params) {
        let mut params = Params::new();
        let sql = marker.to_sql(dialect, &mut params).unwrap();
        (sql, params)
    }

    #[test]
    fn test_column_operand_is_not_a_parameter() {
        let (sql, params) = render(&col("a").eq(col("b")), Dialect::Postgres);
        assert_eq!(sql, "\"a\" = \"b\"");
        assert!(params.is_empty());
    }

    #[test]
    fn test_field_starts_expressions() {
        let age = Field::int("age");
        let (sql, params) = render(&(&age).add(1).gt(&age), Dialect::Mysql);
        assert_eq!(sql, "`age` + :p0 > `age`");
        assert_eq!(params.values()[0].1, SqlValue::Int(1));
    }

    #[test]
    fn test_in_list() {
        let (sql, params) = render(&col("id").in_list([1, 2, 3]), Dialect::Sqlite);
        assert_eq!(sql, "`id` IN (:p0, :p1, :p2)");
        assert_eq!(params.len(), 3);

        let (sql, _) = render(&col("id").not_in(Vec::<i64>::new()), Dialect::Sqlite);
        assert_eq!(sql, "`id` NOT IN (NULL)");
    }

    #[test]
    fn test_null_checks_and_patterns() {
        let (sql, _) = render(&col("d").is_null(), Dialect::Mysql);
        assert_eq!(sql, "`d` IS NULL");
        let (sql, _) = render(&col("d").is_not_null(), Dialect::Mysql);
        assert_eq!(sql, "`d` IS NOT NULL");
        let (sql, params) = render(&col("n").not_like("a%"), Dialect::Mysql);
        assert_eq!(sql, "`n` NOT LIKE :p0");
        assert_eq!(params.values()[0].1, SqlValue::Text(String::from("a%")));
    }

    #[test]
    fn test_none_binds_null() {
        let (sql, params) = render(&col("x").eq(None::<i32>), Dialect::Mysql);
        assert_eq!(sql, "`x` = :p0");
        assert!(params.values()[0].1.is_null());
    }
}
