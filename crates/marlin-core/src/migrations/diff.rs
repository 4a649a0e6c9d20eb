//! Schema diff algorithm.
//!
//! Compares a desired and a current [`Schema`] by field key
//! (name, normalized type) and index key (unique, ordered columns). Output
//! order follows declaration order of the schema each item comes from, never
//! hash iteration order.

use std::collections::BTreeSet;

use tracing::trace;

use crate::schema::{Field, FieldKey, Index, IndexKey, Schema};

/// Operation lists produced by diffing two schemas.
#[derive(Debug, Clone, Default)]
pub(crate) struct Delta<'a> {
    pub add_fields: Vec<&'a Field>,
    pub drop_fields: Vec<&'a Field>,
    pub change_type_fields: Vec<&'a Field>,
    pub add_indexes: Vec<&'a Index>,
    pub drop_indexes: Vec<&'a Index>,
}

/// Computes the delta that turns `current` into `desired`.
pub(crate) fn diff_schemas<'a>(desired: &'a Schema, current: &'a Schema) -> Delta<'a> {
    let desired_keys: BTreeSet<FieldKey> = desired.fields().iter().map(Field::key).collect();
    let current_keys: BTreeSet<FieldKey> = current.fields().iter().map(Field::key).collect();

    let mut add_fields: Vec<&Field> = desired
        .fields()
        .iter()
        .filter(|f| !current_keys.contains(&f.key()))
        .collect();
    let mut drop_fields: Vec<&Field> = current
        .fields()
        .iter()
        .filter(|f| !desired_keys.contains(&f.key()))
        .collect();

    // Same column on both sides with different types: a type change.
    let dropped_names: BTreeSet<&str> = drop_fields.iter().map(|f| f.name.as_str()).collect();
    let changed: BTreeSet<&str> = add_fields
        .iter()
        .map(|f| f.name.as_str())
        .filter(|n| dropped_names.contains(n))
        .collect();
    let change_type_fields: Vec<&Field> = add_fields
        .iter()
        .copied()
        .filter(|f| changed.contains(f.name.as_str()))
        .collect();
    add_fields.retain(|f| !changed.contains(f.name.as_str()));
    drop_fields.retain(|f| !changed.contains(f.name.as_str()));

    let desired_idx: BTreeSet<IndexKey> = desired.indexes().iter().map(Index::key).collect();
    let current_idx: BTreeSet<IndexKey> = current.indexes().iter().map(Index::key).collect();
    let add_indexes: Vec<&Index> = desired
        .indexes()
        .iter()
        .filter(|i| !current_idx.contains(&i.key()))
        .collect();
    let drop_indexes: Vec<&Index> = current
        .indexes()
        .iter()
        .filter(|i| !desired_idx.contains(&i.key()))
        .collect();

    trace!(
        table = desired.name(),
        add_fields = add_fields.len(),
        drop_fields = drop_fields.len(),
        change_type_fields = change_type_fields.len(),
        add_indexes = add_indexes.len(),
        drop_indexes = drop_indexes.len(),
        "Diffed schema"
    );

    Delta {
        add_fields,
        drop_fields,
        change_type_fields,
        add_indexes,
        drop_indexes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(fields: Vec<Field>, indexes: &[(&[&str], bool)]) -> Schema {
        let mut b = Schema::builder("user").field(Field::int("id").primary());
        for f in fields {
            b = b.field(f);
        }
        for (cols, unique) in indexes {
            b = if *unique { b.unique(cols) } else { b.index(cols) };
        }
        b.build().unwrap()
    }

    fn names(fields: &[&Field]) -> Vec<String> {
        fields.iter().map(|f| f.name.clone()).collect()
    }

    #[test]
    fn test_identical_schemas_produce_nothing() {
        let a = schema(vec![Field::varchar("name", 64)], &[(&["name"], true)]);
        let d = diff_schemas(&a, &a);
        assert!(d.add_fields.is_empty());
        assert!(d.drop_fields.is_empty());
        assert!(d.change_type_fields.is_empty());
        assert!(d.add_indexes.is_empty());
        assert!(d.drop_indexes.is_empty());
    }

    #[test]
    fn test_add_and_drop_in_declaration_order() {
        let desired = schema(vec![Field::int("b"), Field::int("a")], &[]);
        let current = schema(vec![Field::int("y"), Field::int("x")], &[]);
        let d = diff_schemas(&desired, &current);
        assert_eq!(names(&d.add_fields), ["b", "a"]);
        assert_eq!(names(&d.drop_fields), ["y", "x"]);
    }

    #[test]
    fn test_type_change_is_reclassified() {
        let desired = schema(vec![Field::bigint("x")], &[]);
        let current = schema(vec![Field::int("x")], &[]);
        let d = diff_schemas(&desired, &current);
        assert!(d.add_fields.is_empty());
        assert!(d.drop_fields.is_empty());
        assert_eq!(names(&d.change_type_fields), ["x"]);
        assert_eq!(d.change_type_fields[0].field_type, "bigint");
    }

    #[test]
    fn test_equivalent_spellings_do_not_diff() {
        let desired = schema(vec![Field::int("x"), Field::varchar("s", 10)], &[]);
        let current = schema(
            vec![
                Field::new("x", "int(11)"),
                Field::new("s", "character varying(10)"),
            ],
            &[],
        );
        let d = diff_schemas(&desired, &current);
        assert!(d.add_fields.is_empty() && d.drop_fields.is_empty());
        assert!(d.change_type_fields.is_empty());
    }

    #[test]
    fn test_default_change_is_not_structural() {
        let desired = schema(vec![Field::int("x").default(5)], &[]);
        let current = schema(vec![Field::int("x")], &[]);
        let d = diff_schemas(&desired, &current);
        assert!(d.add_fields.is_empty() && d.change_type_fields.is_empty());
    }

    #[test]
    fn test_index_column_order_matters() {
        let fields = || vec![Field::int("a"), Field::int("b")];
        let desired = schema(fields(), &[(&["a", "b"], false)]);
        let current = schema(fields(), &[(&["b", "a"], false)]);
        let d = diff_schemas(&desired, &current);
        assert_eq!(d.add_indexes.len(), 1);
        assert_eq!(d.add_indexes[0].fields, ["a", "b"]);
        assert_eq!(d.drop_indexes.len(), 1);
        assert_eq!(d.drop_indexes[0].fields, ["b", "a"]);
    }

    #[test]
    fn test_index_uniqueness_change() {
        let fields = || vec![Field::int("a")];
        let desired = schema(fields(), &[(&["a"], true)]);
        let current = schema(fields(), &[(&["a"], false)]);
        let d = diff_schemas(&desired, &current);
        assert!(d.add_indexes[0].unique);
        assert!(!d.drop_indexes[0].unique);
    }
}
