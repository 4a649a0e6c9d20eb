//! Compilation options.

use serde::{Deserialize, Serialize};

/// Table options appended to MySQL `CREATE TABLE` statements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MysqlTableOptions {
    /// Storage engine.
    pub engine: String,
    /// Default character set.
    pub charset: String,
    /// Default collation.
    pub collate: String,
}

impl Default for MysqlTableOptions {
    fn default() -> Self {
        Self {
            engine: String::from("InnoDB"),
            charset: String::from("utf8mb4"),
            collate: String::from("utf8mb4_unicode_ci"),
        }
    }
}

impl MysqlTableOptions {
    /// Renders the postfix, e.g.
    /// `ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci`.
    #[must_use]
    pub fn postfix(&self) -> String {
        let mut parts = Vec::new();
        if !self.engine.is_empty() {
            parts.push(format!("ENGINE={}", self.engine));
        }
        if !self.charset.is_empty() {
            parts.push(format!("DEFAULT CHARSET={}", self.charset));
        }
        if !self.collate.is_empty() {
            parts.push(format!("COLLATE={}", self.collate));
        }
        parts.join(" ")
    }
}

/// Options consulted when compiling DDL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// MySQL table options.
    pub mysql: MysqlTableOptions,
    /// Database selected with `USE` at the top of MySQL migration scripts.
    pub database: Option<String>,
}

impl CompileOptions {
    /// Sets the database name.
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }
}
