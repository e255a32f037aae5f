use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Table, TableError, Value};

/// What to do with a value that has no entry in the lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemapPolicy {
    /// Fail with [`TableError::UnmappedValue`].
    #[default]
    Strict,
    /// Leave the value unchanged.
    PassThrough,
}

/// A value-to-value mapping taken from two columns of a reference table,
/// e.g. version name to version id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lookup {
    entries: BTreeMap<Value, Value>,
}

impl Lookup {
    pub fn from_table(table: &Table, from: &str, to: &str) -> Result<Self, TableError> {
        let from = table.column_position(from)?;
        let to = table.column_position(to)?;
        Ok(Self {
            entries: table
                .rows()
                .iter()
                .map(|row| (row[from].clone(), row[to].clone()))
                .collect(),
        })
    }

    pub fn get(&self, value: &Value) -> Option<&Value> {
        self.entries.get(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for Lookup {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Table {
    /// Replace every non-null value of `column` through `lookup`.
    ///
    /// Under [`RemapPolicy::Strict`] the column is left untouched when any
    /// value is missing from the lookup.
    pub fn remap_column(
        &mut self,
        column: &str,
        lookup: &Lookup,
        policy: RemapPolicy,
    ) -> Result<(), TableError> {
        if policy == RemapPolicy::Strict {
            if let Some(missing) = self
                .column_values(column)?
                .find(|v| !v.is_null() && lookup.get(v).is_none())
            {
                return Err(TableError::UnmappedValue {
                    column: column.to_string(),
                    value: missing.clone(),
                });
            }
        }

        for value in self.column_mut(column)?.filter(|v| !v.is_null()) {
            if let Some(mapped) = lookup.get(value) {
                *value = mapped.clone();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches() -> Table {
        Table::from_rows(
            ["id", "version"],
            vec![
                vec![Value::Int(5), "1.0".into()],
                vec![Value::Int(6), "1.0c".into()],
                vec![Value::Int(7), Value::Null],
            ],
        )
        .unwrap()
    }

    fn versions() -> Table {
        Table::from_rows(
            ["id", "name"],
            vec![
                vec![Value::Int(1), "1.0".into()],
                vec![Value::Int(2), "1.0c".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_from_reference_table() {
        let lookup = Lookup::from_table(&versions(), "name", "id").unwrap();
        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup.get(&"1.0c".into()), Some(&Value::Int(2)));
    }

    #[test]
    fn test_remap_replaces_every_value() {
        let lookup = Lookup::from_table(&versions(), "name", "id").unwrap();
        let mut table = matches();

        table
            .remap_column("version", &lookup, RemapPolicy::Strict)
            .unwrap();

        let remapped = table.column_values("version").unwrap().collect::<Vec<_>>();
        assert_eq!(remapped, vec![&Value::Int(1), &Value::Int(2), &Value::Null]);
    }

    #[test]
    fn test_strict_remap_fails_on_unmapped_value() {
        let lookup: Lookup = [("1.0", 1i64)].into_iter().collect();
        let mut table = matches();

        let err = table
            .remap_column("version", &lookup, RemapPolicy::Strict)
            .unwrap_err();

        assert_eq!(
            err,
            TableError::UnmappedValue {
                column: "version".to_string(),
                value: "1.0c".into(),
            }
        );
        assert_eq!(table, matches());
    }

    #[test]
    fn test_pass_through_keeps_unmapped_value() {
        let lookup: Lookup = [("1.0", 1i64)].into_iter().collect();
        let mut table = matches();

        table
            .remap_column("version", &lookup, RemapPolicy::PassThrough)
            .unwrap();

        assert_eq!(table.value(0, "version").unwrap(), Some(&Value::Int(1)));
        assert_eq!(table.value(1, "version").unwrap(), Some(&"1.0c".into()));
    }
}
