//! SQL dialect support.
//!
//! MySQL, PostgreSQL and SQLite differ in identifier quoting, DDL capability,
//! index hint syntax, row-lock spelling and upsert shape. [`Dialect`] answers
//! those questions for the compilers in this crate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Supported database dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// MySQL / MariaDB.
    Mysql,
    /// PostgreSQL.
    #[serde(alias = "postgresql")]
    Postgres,
    /// SQLite 3.
    Sqlite,
}

/// Row-lock strength requested by a SELECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLock {
    /// Exclusive lock.
    Update,
    /// Shared lock.
    Share,
}

/// How a dialect treats the conflict target of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictTarget {
    /// A target column list is mandatory.
    Required,
    /// A target column list is a syntax error.
    Forbidden,
    /// A target column list may be given or omitted.
    Optional,
}

impl Dialect {
    /// All dialects, in a stable order.
    pub const ALL: [Self; 3] = [Self::Mysql, Self::Postgres, Self::Sqlite];

    /// Returns the name of the dialect.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Returns the identifier quote character.
    #[must_use]
    pub const fn identifier_quote(self) -> char {
        match self {
            Self::Mysql | Self::Sqlite => '`',
            Self::Postgres => '"',
        }
    }

    /// Quotes an identifier, doubling any embedded quote character.
    #[must_use]
    pub fn quote_identifier(self, name: &str) -> String {
        let q = self.identifier_quote();
        let escaped = name.replace(q, &format!("{q}{q}"));
        format!("{q}{escaped}{q}")
    }

    /// Returns whether `ALTER COLUMN ... TYPE` (or `MODIFY`) is available.
    #[must_use]
    pub const fn supports_alter_column_type(self) -> bool {
        !matches!(self, Self::Sqlite)
    }

    /// Returns whether index hint clauses can be attached to a table reference.
    #[must_use]
    pub const fn supports_index_hints(self) -> bool {
        !matches!(self, Self::Postgres)
    }

    /// Returns whether `ALTER COLUMN ... DROP DEFAULT` is available.
    #[must_use]
    pub const fn supports_drop_default(self) -> bool {
        !matches!(self, Self::Sqlite)
    }

    /// Returns whether `RETURNING` is used to recover generated keys.
    #[must_use]
    pub const fn supports_returning(self) -> bool {
        matches!(self, Self::Postgres)
    }

    /// Returns whether column comments are stored by the dialect.
    #[must_use]
    pub const fn supports_comments(self) -> bool {
        !matches!(self, Self::Sqlite)
    }

    /// Returns the row-lock clause, or `None` when the dialect has no row
    /// locks (SQLite locks the whole database).
    #[must_use]
    pub const fn lock_clause(self, lock: RowLock) -> Option<&'static str> {
        match (self, lock) {
            (Self::Sqlite, _) => None,
            (_, RowLock::Update) => Some("FOR UPDATE"),
            (Self::Mysql, RowLock::Share) => Some("LOCK IN SHARE MODE"),
            (Self::Postgres, RowLock::Share) => Some("FOR SHARE"),
        }
    }

    /// Returns the conflict-target rule for upserts.
    #[must_use]
    pub const fn conflict_target(self) -> ConflictTarget {
        match self {
            Self::Mysql => ConflictTarget::Forbidden,
            Self::Postgres => ConflictTarget::Required,
            Self::Sqlite => ConflictTarget::Optional,
        }
    }

    /// Returns the expression referring to the would-be-inserted value of
    /// `column` inside an upsert's update list.
    #[must_use]
    pub fn excluded_column(self, column: &str) -> String {
        let quoted = self.quote_identifier(column);
        match self {
            Self::Mysql => format!("VALUES({quoted})"),
            Self::Postgres => format!("EXCLUDED.{quoted}"),
            Self::Sqlite => format!("excluded.{quoted}"),
        }
    }

    /// Checks that index hints can be rendered.
    ///
    /// # Errors
    ///
    /// [`Error::Unsupported`] on PostgreSQL.
    pub fn require_index_hints(self) -> Result<()> {
        if self.supports_index_hints() {
            Ok(())
        } else {
            Err(Error::unsupported(self, "index hints"))
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    /// Accepts a bare name (`mysql`) or a connection URL (`postgres://..`).
    fn from_str(s: &str) -> Result<Self> {
        let scheme = s.split("://").next().unwrap_or(s).to_ascii_lowercase();
        let scheme = scheme.split('+').next().unwrap_or(&scheme);
        match scheme {
            "mysql" | "mariadb" => Ok(Self::Mysql),
            "postgres" | "postgresql" | "asyncpg" | "aiopg" => Ok(Self::Postgres),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            other => Err(Error::schema(format!("unknown dialect '{other}'"))),
        }
    }
}
