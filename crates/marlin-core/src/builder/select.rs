//! SELECT builder.

use tracing::debug;

use super::{column_list, Filter, Statement};
use crate::dialect::{Dialect, RowLock};
use crate::error::{Error, Result};
use crate::expr::{Expression, IntoOperand, Marker, Operand, Params};
use crate::schema::Schema;

/// Index hint flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintKind {
    /// `USE INDEX` / `INDEXED BY`
    Use,
    /// `IGNORE INDEX` / `NOT INDEXED`
    Ignore,
    /// `FORCE INDEX` / `INDEXED BY`
    Force,
}

/// MySQL index hint scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintScope {
    /// `FOR JOIN`
    Join,
    /// `FOR ORDER BY`
    OrderBy,
    /// `FOR GROUP BY`
    GroupBy,
}

impl HintScope {
    const fn as_sql(self) -> &'static str {
        match self {
            Self::Join => "FOR JOIN",
            Self::OrderBy => "FOR ORDER BY",
            Self::GroupBy => "FOR GROUP BY",
        }
    }
}

/// An index hint attached to the table reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHint {
    /// Use, force or ignore.
    pub kind: HintKind,
    /// Index names, unquoted.
    pub indexes: Vec<String>,
    /// Restricts the hint to one phase of the query.
    pub scope: Option<HintScope>,
}

impl IndexHint {
    fn to_sql(&self, dialect: Dialect) -> Result<String> {
        dialect.require_index_hints()?;
        match dialect {
            Dialect::Mysql => {
                let kind = match self.kind {
                    HintKind::Use => "USE",
                    HintKind::Ignore => "IGNORE",
                    HintKind::Force => "FORCE",
                };
                let scope = self
                    .scope
                    .map(|s| format!(" {}", s.as_sql()))
                    .unwrap_or_default();
                Ok(format!(
                    "{kind} INDEX{scope} ({})",
                    column_list(dialect, &self.indexes)
                ))
            }
            Dialect::Sqlite => match self.kind {
                HintKind::Ignore => Ok(String::from("NOT INDEXED")),
                HintKind::Use | HintKind::Force => {
                    let first = self.indexes.first().ok_or_else(|| {
                        Error::invalid("INDEXED BY needs an index name")
                    })?;
                    Ok(format!("INDEXED BY {}", dialect.quote_identifier(first)))
                }
            },
            Dialect::Postgres => Err(Error::unsupported(dialect, "index hints")),
        }
    }
}

/// SELECT builder.
///
/// Also compiles as a sub-select when used as an operand, sharing the outer
/// statement's parameters.
#[derive(Debug, Clone)]
pub struct Select {
    table: String,
    columns: Vec<String>,
    fields: Option<Vec<String>>,
    exclude: Vec<String>,
    hints: Vec<IndexHint>,
    filter: Filter,
    order: Vec<(Operand, bool)>,
    limit: Option<u64>,
    offset: Option<u64>,
    lock: Option<RowLock>,
    count: bool,
}

impl Select {
    /// Selects from `table`, projecting `columns`.
    #[must_use]
    pub fn table(table: &str, columns: &[&str]) -> Self {
        Self {
            table: String::from(table),
            columns: columns.iter().map(|c| String::from(*c)).collect(),
            fields: None,
            exclude: Vec::new(),
            hints: Vec::new(),
            filter: Filter::default(),
            order: Vec::new(),
            limit: None,
            offset: None,
            lock: None,
            count: false,
        }
    }

    /// Selects all declared columns of `schema`.
    #[must_use]
    pub fn from_schema(schema: &Schema) -> Self {
        let columns: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        Self::table(schema.name(), &columns)
    }

    /// Restricts the projection to `fields`.
    #[must_use]
    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = Some(fields.iter().map(|f| String::from(*f)).collect());
        self
    }

    /// Removes `fields` from the projection.
    #[must_use]
    pub fn exclude(mut self, fields: &[&str]) -> Self {
        self.exclude.extend(fields.iter().map(|f| String::from(*f)));
        self
    }

    /// Adds a condition, ANDed with earlier ones.
    #[must_use]
    pub fn filter(mut self, condition: Expression) -> Self {
        self.filter.push(condition);
        self
    }

    /// Adds the OR of `conditions`, ANDed with earlier ones.
    #[must_use]
    pub fn filter_any(mut self, conditions: Vec<Expression>) -> Self {
        self.filter.push_any(conditions);
        self
    }

    /// Adds a raw SQL condition. It is inserted verbatim.
    #[must_use]
    pub fn raw_filter(mut self, sql: &str) -> Self {
        self.filter.push_raw(sql);
        self
    }

    /// `USE INDEX`
    #[must_use]
    pub fn use_index(self, indexes: &[&str], scope: Option<HintScope>) -> Self {
        self.hint(HintKind::Use, indexes, scope)
    }

    /// `IGNORE INDEX`
    #[must_use]
    pub fn ignore_index(self, indexes: &[&str], scope: Option<HintScope>) -> Self {
        self.hint(HintKind::Ignore, indexes, scope)
    }

    /// `FORCE INDEX`
    #[must_use]
    pub fn force_index(self, indexes: &[&str], scope: Option<HintScope>) -> Self {
        self.hint(HintKind::Force, indexes, scope)
    }

    fn hint(mut self, kind: HintKind, indexes: &[&str], scope: Option<HintScope>) -> Self {
        self.hints.push(IndexHint {
            kind,
            indexes: indexes.iter().map(|i| String::from(*i)).collect(),
            scope,
        });
        self
    }

    /// Orders by a column or expression. Call repeatedly for more keys.
    #[must_use]
    pub fn order_by(mut self, term: impl IntoOperand, ascending: bool) -> Self {
        self.order.push((term.into_operand(), ascending));
        self
    }

    /// Caps the number of returned rows.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Requires a limit.
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Locks the selected rows exclusively.
    #[must_use]
    pub fn for_update(mut self) -> Self {
        self.lock = Some(RowLock::Update);
        self
    }

    /// Locks the selected rows in shared mode.
    #[must_use]
    pub fn for_share(mut self) -> Self {
        self.lock = Some(RowLock::Share);
        self
    }

    /// Turns the query into `SELECT COUNT(*)` with the same table, hints and
    /// conditions. Ordering, paging and locking are dropped.
    #[must_use]
    pub fn count(mut self) -> Self {
        self.count = true;
        self
    }

    fn projection(&self) -> Result<Vec<String>> {
        let base = self.fields.as_ref().unwrap_or(&self.columns);
        if let Some(unknown) = base.iter().find(|f| !self.columns.contains(f)) {
            return Err(Error::invalid(format!(
                "unknown column '{unknown}' for table '{}'",
                self.table
            )));
        }
        let projected: Vec<String> = base
            .iter()
            .filter(|f| !self.exclude.contains(f))
            .cloned()
            .collect();
        if projected.is_empty() {
            return Err(Error::invalid(format!(
                "nothing to select from table '{}'",
                self.table
            )));
        }
        Ok(projected)
    }

    /// Compiles the statement.
    ///
    /// # Errors
    ///
    /// [`Error::Unsupported`] for index hints on PostgreSQL,
    /// [`Error::InvalidStatement`] for an offset without a limit or an empty
    /// projection.
    pub fn build(&self, dialect: Dialect) -> Result<Statement> {
        let mut params = Params::new();
        let sql = self.to_sql(dialect, &mut params)?;
        debug!(sql = %sql, "Built SELECT");
        Ok(Statement { sql, params })
    }
}

impl Marker for Select {
    fn to_sql(&self, dialect: Dialect, params: &mut Params) -> Result<String> {
        let mut sql = if self.count {
            String::from("SELECT COUNT(*)")
        } else {
            format!("SELECT {}", column_list(dialect, &self.projection()?))
        };
        sql.push_str(" FROM ");
        sql.push_str(&dialect.quote_identifier(&self.table));

        if dialect == Dialect::Sqlite && self.hints.len() > 1 {
            return Err(Error::unsupported(dialect, "more than one index hint"));
        }
        for hint in &self.hints {
            sql.push(' ');
            sql.push_str(&hint.to_sql(dialect)?);
        }

        sql.push_str(&self.filter.render(dialect, params)?);

        if self.count {
            return Ok(sql);
        }

        if !self.order.is_empty() {
            let terms = self
                .order
                .iter()
                .map(|(term, asc)| {
                    let direction = if *asc { "ASC" } else { "DESC" };
                    Ok(format!("{} {direction}", term.to_sql(dialect, params)?))
                })
                .collect::<Result<Vec<_>>>()?;
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        match (self.limit, self.offset) {
            (Some(limit), offset) => {
                sql.push_str(&format!(" LIMIT {limit}"));
                if let Some(offset) = offset {
                    sql.push_str(&format!(" OFFSET {offset}"));
                }
            }
            (None, Some(_)) => return Err(Error::invalid("OFFSET requires LIMIT")),
            (None, None) => {}
        }

        if let Some(lock) = self.lock {
            match dialect.lock_clause(lock) {
                Some(clause) => {
                    sql.push(' ');
                    sql.push_str(clause);
                }
                None => debug!(dialect = %dialect, "Row lock not available, omitted"),
            }
        }
        Ok(sql)
    }
}
