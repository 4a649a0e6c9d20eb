#![allow(dead_code)]

use marlin_core::migrations::introspect::postgres::{PgColumnRow, PgIndexRow};
use marlin_core::migrations::introspect::sqlite::SqliteMasterRow;
use marlin_core::migrations::for_dialect;
use marlin_core::{CompileOptions, Dialect, Field, Schema};

pub fn opts() -> CompileOptions {
    CompileOptions::default()
}

pub fn user_v1() -> Schema {
    Schema::builder("user")
        .field(Field::int("id").primary().auto_increment())
        .field(Field::varchar("name", 64).comment("display name"))
        .field(Field::int("age").nullable())
        .field(Field::int("group_id"))
        .index(&["group_id"])
        .unique(&["name"])
        .build()
        .unwrap_or_else(|e| panic!("user v1: {e}"))
}

/// v1 with `age` widened, `group_id` dropped, `level` added and a composite
/// index.
pub fn user_v2() -> Schema {
    Schema::builder("user")
        .field(Field::int("id").primary().auto_increment())
        .field(Field::varchar("name", 64).comment("display name"))
        .field(Field::bigint("age").nullable())
        .field(Field::int("level").default(1))
        .index(&["level", "age"])
        .unique(&["name"])
        .build()
        .unwrap_or_else(|e| panic!("user v2: {e}"))
}

/// Compiles `schema` for SQLite and returns what `sqlite_master` would hold.
pub fn sqlite_master(schema: &Schema) -> Vec<SqliteMasterRow> {
    let statements = for_dialect(Dialect::Sqlite)
        .create_table(schema, &opts())
        .unwrap_or_else(|e| panic!("create {}: {e}", schema.name()));
    let (table_sql, index_sql) = statements.split_first().expect("CREATE TABLE");
    let mut rows = vec![SqliteMasterRow::new(
        "table",
        schema.name(),
        schema.name(),
        Some(table_sql.as_str()),
    )];
    for (index, sql) in schema.indexes().iter().zip(index_sql) {
        rows.push(SqliteMasterRow::new(
            "index",
            &index.name,
            schema.name(),
            Some(sql.as_str()),
        ));
    }
    rows
}

/// Applies compiled SQLite statements to `sqlite_master` rows the way SQLite
/// rewrites its stored schema: added columns are appended to the table body,
/// dropped ones removed, index rows created and deleted.
pub fn apply_sqlite(rows: &mut Vec<SqliteMasterRow>, statements: &[String]) {
    for stmt in statements {
        if let Some(rest) = stmt.strip_prefix("ALTER TABLE `") {
            let (table, action) = rest.split_once("` ").expect("table name");
            let row = rows
                .iter_mut()
                .find(|r| r.kind == "table" && r.name == table)
                .expect("table row");
            let sql = row.sql.take().expect("table sql");
            let open = sql.find('(').expect("table body");
            let mut parts = split_columns(&sql[open + 1..sql.len() - 1]);
            if let Some(def) = action.strip_prefix("ADD COLUMN ") {
                parts.push(def.to_string());
            } else if let Some(column) = action.strip_prefix("DROP COLUMN ") {
                parts.retain(|p| !p.starts_with(&format!("{column} ")));
            } else {
                panic!("unexpected statement: {stmt}");
            }
            row.sql = Some(format!("{}(\n    {}\n)", &sql[..open], parts.join(",\n    ")));
        } else if let Some(rest) = stmt.strip_prefix("DROP INDEX `") {
            let name = rest.trim_end_matches('`');
            rows.retain(|r| !(r.kind == "index" && r.name == name));
        } else if stmt.starts_with("CREATE INDEX") || stmt.starts_with("CREATE UNIQUE INDEX") {
            let after = &stmt[stmt.find('`').expect("index name") + 1..];
            let (name, rest) = after.split_once('`').expect("index name");
            let table = rest.split('`').nth(1).expect("index table");
            rows.push(SqliteMasterRow::new("index", name, table, Some(stmt.as_str())));
        } else {
            panic!("unexpected statement: {stmt}");
        }
    }
}

fn split_columns(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0_i32;
    for c in body.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    parts.push(current.trim().to_string());
    parts
}

/// What `information_schema.columns` and `pg_indexes` report once the
/// PostgreSQL CREATE TABLE of `schema` has run. Types are read back from the
/// compiled statement, so a type PostgreSQL would reject panics here.
pub fn pg_catalog(schema: &Schema) -> (Vec<PgColumnRow>, Vec<PgIndexRow>) {
    let statements = for_dialect(Dialect::Postgres)
        .create_table(schema, &opts())
        .unwrap_or_else(|e| panic!("create {}: {e}", schema.name()));
    let table = schema.name();
    let create = &statements[0];
    let open = create.find('(').expect("table body");
    let mut columns = Vec::new();
    let mut indexes = Vec::new();
    for part in split_columns(&create[open + 1..create.len() - 1]) {
        if let Some(rest) = part.strip_prefix("PRIMARY KEY (") {
            let column = rest.trim_end_matches(')').replace('"', "");
            let name = format!("{table}_pkey");
            indexes.push(PgIndexRow::new(
                &name,
                &format!("CREATE UNIQUE INDEX {name} ON public.{table} USING btree ({column})"),
            ));
            continue;
        }
        let (name, def) = part[1..].split_once("\" ").expect("quoted column");
        let not_null = def.contains(" NOT NULL");
        let ty = def.split(" NOT NULL").next().unwrap_or(def);
        let ty = ty.split(" DEFAULT ").next().unwrap_or(ty).trim();
        let mut row = catalog_column(table, name, ty);
        row.is_nullable = String::from(if not_null { "NO" } else { "YES" });
        columns.push(row);
    }
    for stmt in &statements[1..] {
        if stmt.starts_with("CREATE") {
            let def = stmt
                .replace('"', "")
                .replacen(" ON ", " ON public.", 1)
                .replacen(" (", " USING btree (", 1);
            let name = def
                .trim_start_matches("CREATE ")
                .trim_start_matches("UNIQUE ")
                .trim_start_matches("INDEX ")
                .split(' ')
                .next()
                .expect("index name")
                .to_string();
            indexes.push(PgIndexRow::new(&name, &def));
        }
    }
    (columns, indexes)
}

fn catalog_column(table: &str, name: &str, ty: &str) -> PgColumnRow {
    let (base, args) = match ty.split_once('(') {
        Some((base, args)) => (base, Some(args.trim_end_matches(')'))),
        None => (ty, None),
    };
    let serial = |data_type: &str| PgColumnRow {
        column_default: Some(format!("nextval('{table}_{name}_seq'::regclass)")),
        ..PgColumnRow::new(name, data_type)
    };
    match (base, args) {
        ("serial", None) => serial("integer"),
        ("bigserial", None) => serial("bigint"),
        ("smallserial", None) => serial("smallint"),
        ("int", None) => PgColumnRow::new(name, "integer"),
        ("varchar", Some(len)) => PgColumnRow {
            character_maximum_length: len.parse().ok(),
            ..PgColumnRow::new(name, "character varying")
        },
        ("decimal" | "numeric", Some(args)) => {
            let (precision, scale) = args.split_once(',').expect("precision and scale");
            PgColumnRow {
                numeric_precision: precision.trim().parse().ok(),
                numeric_scale: scale.trim().parse().ok(),
                ..PgColumnRow::new(name, "numeric")
            }
        }
        ("timestamp", None) => PgColumnRow::new(name, "timestamp without time zone"),
        (
            "smallint" | "bigint" | "real" | "double precision" | "boolean" | "text" | "bytea"
            | "date" | "json" | "jsonb",
            None,
        ) => PgColumnRow::new(name, base),
        _ => panic!("column {name}: {ty} is not a PostgreSQL type"),
    }
}
