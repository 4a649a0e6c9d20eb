//! Schema migrations.
//!
//! Diff a desired [`Schema`](crate::schema::Schema) against the current one,
//! compile the resulting [`Migration`] to DDL for a dialect, and invert it.

pub mod dialect;
mod diff;
pub mod introspect;
mod migration;
pub mod plan;

pub use dialect::{for_dialect, MigrationDialect, MysqlDialect, PostgresDialect, SqliteDialect};
pub use migration::Migration;
pub use plan::{plan_migrations, MigrationScripts};
