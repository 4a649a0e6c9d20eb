//! CASE expressions.

use super::{Expression, IntoOperand, Marker, Operand, Params};
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::schema::{postgres_storage_type, Field};

/// `CASE WHEN .. THEN .. [ELSE ..] END`
///
/// On PostgreSQL every branch value can be cast to a declared type, since
/// untyped parameters in CASE branches do not always resolve to the column
/// type there.
#[derive(Debug, Clone, Default)]
pub struct Case {
    branches: Vec<(Expression, Operand)>,
    default: Option<Operand>,
    cast: Option<String>,
}

impl Case {
    /// Creates an empty CASE. At least one branch must be added.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `WHEN condition THEN value`.
    #[must_use]
    pub fn when(mut self, condition: Expression, value: impl IntoOperand) -> Self {
        self.branches.push((condition, value.into_operand()));
        self
    }

    /// Sets the ELSE value.
    #[must_use]
    pub fn otherwise(mut self, value: impl IntoOperand) -> Self {
        self.default = Some(value.into_operand());
        self
    }

    /// Casts branch values to `ty` on PostgreSQL.
    #[must_use]
    pub fn cast(mut self, ty: impl Into<String>) -> Self {
        self.cast = Some(ty.into());
        self
    }

    fn branch_value(
        &self,
        value: &Operand,
        dialect: Dialect,
        params: &mut Params,
    ) -> Result<String> {
        let sql = value.to_sql(dialect, params)?;
        match (&self.cast, dialect) {
            (Some(ty), Dialect::Postgres) => Ok(format!("{sql}::{}", postgres_storage_type(ty))),
            _ => Ok(sql),
        }
    }
}

impl Marker for Case {
    fn to_sql(&self, dialect: Dialect, params: &mut Params) -> Result<String> {
        if self.branches.is_empty() {
            return Err(Error::invalid("CASE without a WHEN branch"));
        }
        let mut sql = String::from("CASE");
        for (condition, value) in &self.branches {
            sql.push_str(" WHEN ");
            sql.push_str(&condition.to_sql(dialect, params)?);
            sql.push_str(" THEN ");
            sql.push_str(&self.branch_value(value, dialect, params)?);
        }
        if let Some(ref default) = self.default {
            sql.push_str(" ELSE ");
            sql.push_str(&self.branch_value(default, dialect, params)?);
        }
        sql.push_str(" END");
        Ok(sql)
    }
}

impl Field {
    /// Starts a CASE producing a value for this field.
    ///
    /// The ELSE branch defaults to the field's current value and branches are
    /// cast to the field's type on PostgreSQL.
    #[must_use]
    pub fn case(&self, condition: Expression, value: impl IntoOperand) -> Case {
        Case::new()
            .when(condition, value)
            .otherwise(self)
            .cast(self.field_type.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{col, Ops};

    fn render(case: &Case, dialect: Dialect) -> Result<(String, Params)> {
        let mut params = Params::new();
        let sql = case.to_sql(dialect, &mut params)?;
        Ok((sql, params))
    }

    #[test]
    fn test_field_case_defaults_to_itself() {
        let level = Field::int("level");
        let case = level.case(col("id").eq(1), 10);
        let (sql, params) = render(&case, Dialect::Mysql).unwrap();
        assert_eq!(sql, "CASE WHEN `id` = :p0 THEN :p1 ELSE `level` END");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_postgres_casts_branches() {
        let id = Field::serial("id");
        let case = id.case(col("a").gt(0), 5).when(col("a").lt(0), 6);
        let (sql, _) = render(&case, Dialect::Postgres).unwrap();
        assert_eq!(
            sql,
            "CASE WHEN \"a\" > :p0 THEN :p1::integer WHEN \"a\" < :p2 THEN :p3::integer \
             ELSE \"id\"::integer END"
        );
    }

    #[test]
    fn test_otherwise_overrides() {
        let case = Field::text("s").case(col("x").is_null(), "none").otherwise("some");
        let (sql, params) = render(&case, Dialect::Sqlite).unwrap();
        assert_eq!(sql, "CASE WHEN `x` IS NULL THEN :p0 ELSE :p1 END");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_empty_case_is_invalid() {
        assert!(matches!(
            render(&Case::new(), Dialect::Mysql),
            Err(Error::InvalidStatement(_))
        ));
    }

    #[test]
    fn test_case_as_operand() {
        let expr = col("total").eq(Case::new().when(col("a").eq(1), col("b")));
        let mut params = Params::new();
        let sql = expr.to_sql(Dialect::Mysql, &mut params).unwrap();
        assert_eq!(sql, "`total` = CASE WHEN `a` = :p0 THEN `b` END");
    }
}
