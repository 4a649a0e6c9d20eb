//! Migration planning across a registry.

use std::collections::BTreeMap;

use tracing::info;

use crate::config::CompileOptions;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::schema::{Registry, Schema};

/// Forward and backward scripts for a set of tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationScripts {
    /// Brings the database to the registered schemas.
    pub up: String,
    /// Undoes `up`.
    pub down: String,
}

impl MigrationScripts {
    /// Whether no change was detected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.up.is_empty() && self.down.is_empty()
    }
}

/// Diffs every migratable schema of `registry` against its introspected
/// counterpart in `current` (absent tables are created) and compiles the
/// result.
///
/// Tables are processed in name order; the down script undoes them in
/// reverse order. Tables that exist only in `current` are left alone.
/// Registered types are first spelled the way `dialect` stores them (see
/// [`Schema::for_dialect`]) so catalog spellings compare equal.
///
/// # Errors
///
/// Propagates compilation errors, e.g. a type change on SQLite.
pub fn plan_migrations(
    registry: &Registry,
    current: &BTreeMap<String, Schema>,
    dialect: Dialect,
    options: &CompileOptions,
) -> Result<MigrationScripts> {
    let mut up = Vec::new();
    let mut down = Vec::new();

    for schema in registry.migratable() {
        let schema = schema.for_dialect(dialect);
        let migration = schema.diff(current.get(schema.name()));
        if migration.is_empty() {
            continue;
        }
        info!(
            table = schema.name(),
            create = migration.old_schema().is_none(),
            add_fields = migration.add_fields().len(),
            drop_fields = migration.drop_fields().len(),
            change_type_fields = migration.change_type_fields().len(),
            "Planned migration"
        );
        up.push(migration.to_sql(dialect, options)?);
        down.push(migration.reverse().to_sql(dialect, options)?);
    }

    if up.is_empty() {
        info!("No migration detected");
        return Ok(MigrationScripts::default());
    }
    down.reverse();

    let prefix = match (dialect, options.database.as_deref()) {
        (Dialect::Mysql, Some(db)) => format!("USE {};\n", dialect.quote_identifier(db)),
        _ => String::new(),
    };
    Ok(MigrationScripts {
        up: format!("{prefix}{}", up.join("\n")),
        down: format!("{prefix}{}", down.join("\n")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;

    fn registry() -> Registry {
        let mut reg = Registry::new();
        reg.register(
            Schema::builder("base")
                .field(Field::int("id").primary())
                .abstracted(true)
                .build()
                .unwrap(),
        )
        .unwrap();
        reg.register(
            Schema::builder("user")
                .field(Field::int("id").primary().auto_increment())
                .field(Field::varchar("name", 32))
                .build()
                .unwrap(),
        )
        .unwrap();
        reg.register(
            Schema::builder("post")
                .field(Field::int("id").primary().auto_increment())
                .build()
                .unwrap(),
        )
        .unwrap();
        reg
    }

    #[test]
    fn test_everything_new() {
        let options = CompileOptions::default();
        let scripts =
            plan_migrations(&registry(), &BTreeMap::new(), Dialect::Sqlite, &options).unwrap();
        assert!(scripts.up.starts_with("CREATE TABLE `post`"));
        assert!(scripts.up.contains("CREATE TABLE `user`"));
        assert!(!scripts.up.contains("`base`"));
        assert_eq!(scripts.down, "DROP TABLE `user`;\nDROP TABLE `post`;");
    }

    #[test]
    fn test_nothing_to_do() {
        let reg = registry();
        let current: BTreeMap<String, Schema> = reg
            .migratable()
            .map(|s| (s.name().to_string(), s.clone()))
            .collect();
        let scripts =
            plan_migrations(&reg, &current, Dialect::Postgres, &CompileOptions::default()).unwrap();
        assert!(scripts.is_empty());
    }

    #[test]
    fn test_mysql_use_prefix() {
        let reg = registry();
        let mut current: BTreeMap<String, Schema> = BTreeMap::new();
        current.insert(
            String::from("post"),
            reg.get("post").cloned().unwrap(),
        );
        current.insert(
            String::from("user"),
            Schema::builder("user")
                .field(Field::int("id").primary().auto_increment())
                .build()
                .unwrap(),
        );
        let options = CompileOptions::default().with_database("app");
        let scripts = plan_migrations(&reg, &current, Dialect::Mysql, &options).unwrap();
        assert_eq!(
            scripts.up,
            "USE `app`;\nALTER TABLE `user` ADD COLUMN `name` varchar(32) NOT NULL;"
        );
        assert_eq!(scripts.down, "USE `app`;\nALTER TABLE `user` DROP COLUMN `name`;");
    }
}
