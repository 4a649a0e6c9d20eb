//! # marlin-core
//!
//! Schema differ, reversible migration compiler and parameterized SQL
//! builder for MySQL, PostgreSQL and SQLite.
//!
//! This crate provides:
//! - A table model ([`Schema`], [`Field`], [`Index`]) with declarative
//!   builders and catalog introspection
//! - A differ producing a reversible [`Migration`] between two schemas,
//!   compiled to dialect-specific DDL
//! - An expression tree and statement builders that render SQL with named
//!   placeholders and a separate parameter map
//!
//! Nothing here talks to a database. Introspection parses catalog text and
//! rows that the caller fetched; compiled SQL is returned, never executed.
//!
//! ## Migrations
//!
//! ```rust
//! use marlin_core::{Dialect, Field, Schema};
//!
//! let current = Schema::builder("user")
//!     .field(Field::int("id").primary().auto_increment())
//!     .build()
//!     .unwrap();
//! let desired = Schema::builder("user")
//!     .field(Field::int("id").primary().auto_increment())
//!     .field(Field::varchar("name", 64))
//!     .index(&["name"])
//!     .build()
//!     .unwrap();
//!
//! let migration = desired.diff(Some(&current));
//! let up = migration.to_sql(Dialect::Postgres, &Default::default()).unwrap();
//! assert!(up.starts_with("ALTER TABLE \"user\" ADD COLUMN \"name\" varchar(64) NOT NULL"));
//!
//! // The inverse migration drops what was added.
//! let down = migration.reverse().to_sql(Dialect::Postgres, &Default::default()).unwrap();
//! assert!(down.contains("DROP COLUMN \"name\""));
//! ```
//!
//! ## Parameterized statements
//!
//! ```rust
//! use marlin_core::builder::Update;
//! use marlin_core::expr::{col, Ops};
//! use marlin_core::Dialect;
//!
//! let stmt = Update::table("user")
//!     .set("level", col("level").add(1))
//!     .filter(col("name").eq("'; DROP TABLE user; --"))
//!     .build(Dialect::Mysql)
//!     .unwrap();
//!
//! assert_eq!(stmt.sql, "UPDATE `user` SET `level` = `level` + :p0 WHERE `name` = :p1");
//! assert_eq!(stmt.params.len(), 2);
//! ```

pub mod builder;
pub mod config;
pub mod dialect;
mod error;
pub mod expr;
pub mod migrations;
pub mod schema;
pub mod value;

pub use config::{CompileOptions, MysqlTableOptions};
pub use dialect::{ConflictTarget, Dialect, RowLock};
pub use error::{Error, Result};
pub use migrations::Migration;
pub use schema::{Field, FieldDefault, Index, Registry, Schema, SchemaBuilder};
pub use value::{SqlValue, ToSqlValue};
