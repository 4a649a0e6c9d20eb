//! Index descriptors.

/// Key an index is compared by when diffing. Column order participates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexKey {
    /// Whether the index is unique.
    pub unique: bool,
    /// Ordered column names.
    pub fields: Vec<String>,
}

/// Description of one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    /// Index name. Never part of the diff key.
    pub name: String,
    /// Ordered column names.
    pub fields: Vec<String>,
    /// Whether the index is unique.
    pub unique: bool,
}

impl Index {
    /// Creates an index on `fields` of `table`, naming it deterministically.
    #[must_use]
    pub fn new(table: &str, fields: &[&str], unique: bool) -> Self {
        let fields: Vec<String> = fields.iter().map(|f| (*f).to_string()).collect();
        Self {
            name: generate_index_name(table, &fields, unique),
            fields,
            unique,
        }
    }

    /// Creates an index with an explicit name.
    #[must_use]
    pub fn named(name: impl Into<String>, fields: &[&str], unique: bool) -> Self {
        Self {
            name: name.into(),
            fields: fields.iter().map(|f| (*f).to_string()).collect(),
            unique,
        }
    }

    /// Diff key.
    #[must_use]
    pub fn key(&self) -> IndexKey {
        IndexKey {
            unique: self.unique,
            fields: self.fields.clone(),
        }
    }

    /// Whether any column of this index is in `names`.
    #[must_use]
    pub fn touches<'n>(&self, mut names: impl Iterator<Item = &'n str>) -> bool {
        names.any(|n| self.fields.iter().any(|f| f == n))
    }
}

/// Generates `{columns, at most 15 chars}_{4 digits}_{idx|uiq}`.
///
/// The digits come from an FNV-1a hash of the table, the unique flag and the
/// ordered column names, so the same declaration always yields the same name.
#[must_use]
pub fn generate_index_name(table: &str, fields: &[String], unique: bool) -> String {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET;
    let mut feed = |bytes: &[u8]| {
        for b in bytes {
            hash ^= u64::from(*b);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    };
    feed(table.as_bytes());
    feed(&[0, u8::from(unique), 0]);
    for field in fields {
        feed(field.as_bytes());
        feed(&[0]);
    }

    let prefix: String = fields.join("_").chars().take(15).collect();
    let suffix = if unique { "uiq" } else { "idx" };
    format!("{prefix}_{:04}_{suffix}", hash % 10_000)
}
