use std::collections::BTreeMap;

use itertools::Itertools;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::{TableError, Value};

/// Column-named rows returned by a query.
///
/// A table may carry an index column whose values are unique, which makes
/// rows addressable by key (reference tables are indexed by `id`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    index: Option<Index>,
}

#[derive(Debug, Clone, PartialEq)]
struct Index {
    column: usize,
    positions: BTreeMap<Value, usize>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            index: None,
        }
    }

    pub fn from_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self, TableError> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        // Appending invalidates key positions.
        self.index = None;
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_position(&self, name: &str) -> Result<usize, TableError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }

    pub fn column_values(&self, name: &str) -> Result<impl Iterator<Item = &Value>, TableError> {
        let position = self.column_position(name)?;
        Ok(self.rows.iter().map(move |row| &row[position]))
    }

    pub fn value(&self, row: usize, column: &str) -> Result<Option<&Value>, TableError> {
        let position = self.column_position(column)?;
        Ok(self.rows.get(row).map(|r| &r[position]))
    }

    pub fn row(&self, row: usize) -> Option<RowRef<'_>> {
        self.rows.get(row).map(|values| RowRef {
            columns: &self.columns,
            values,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = RowRef<'_>> {
        self.rows.iter().map(|values| RowRef {
            columns: &self.columns,
            values,
        })
    }

    /// Index the table by `column`. Every key must be unique.
    pub fn set_index(&mut self, column: &str) -> Result<(), TableError> {
        let position = self.column_position(column)?;
        let mut positions = BTreeMap::new();
        for (i, row) in self.rows.iter().enumerate() {
            if positions.insert(row[position].clone(), i).is_some() {
                return Err(TableError::DuplicateIndex {
                    column: column.to_string(),
                    value: row[position].clone(),
                });
            }
        }
        self.index = Some(Index {
            column: position,
            positions,
        });
        Ok(())
    }

    pub fn with_index(mut self, column: &str) -> Result<Self, TableError> {
        self.set_index(column)?;
        Ok(self)
    }

    pub fn index_column(&self) -> Option<&str> {
        self.index
            .as_ref()
            .map(|index| self.columns[index.column].as_str())
    }

    pub fn get_by_key(&self, key: &Value) -> Option<RowRef<'_>> {
        let index = self.index.as_ref()?;
        index.positions.get(key).and_then(|&i| self.row(i))
    }

    /// Project onto `columns`, in the given order. The index is dropped.
    pub fn select(&self, columns: &[&str]) -> Result<Table, TableError> {
        let positions = columns
            .iter()
            .map(|c| self.column_position(c))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Table {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| positions.iter().map(|&p| row[p].clone()).collect())
                .collect(),
            index: None,
        })
    }

    /// Sorted distinct values of a column.
    pub fn distinct(&self, column: &str) -> Result<Vec<Value>, TableError> {
        Ok(self
            .column_values(column)?
            .cloned()
            .sorted()
            .dedup()
            .collect())
    }

    pub(crate) fn column_mut(
        &mut self,
        name: &str,
    ) -> Result<impl Iterator<Item = &mut Value>, TableError> {
        let position = self.column_position(name)?;
        if self.index.as_ref().is_some_and(|i| i.column == position) {
            self.index = None;
        }
        Ok(self.rows.iter_mut().map(move |row| &mut row[position]))
    }
}

/// A borrowed row with access by column name.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> RowRef<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }
}

impl Serialize for RowRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.values) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

// Records orientation: a list of column -> value maps.
impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in self.iter() {
            seq.serialize_element(&row)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn maps() -> Table {
        Table::from_rows(
            ["id", "name"],
            vec![
                vec![Value::Int(9), "Arabia".into()],
                vec![Value::Int(12), "Black Forest".into()],
                vec![Value::Int(29), "Arena".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_push_row_checks_width() {
        let mut table = Table::new(["id", "name"]);
        let err = table.push_row(vec![Value::Int(1)]).unwrap_err();
        assert_eq!(
            err,
            TableError::RowWidth {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_index_addresses_every_row() {
        let table = maps().with_index("id").unwrap();

        assert_eq!(table.index_column(), Some("id"));
        for id in [9, 12, 29] {
            assert!(table.get_by_key(&Value::Int(id)).is_some());
        }
        let arena = table.get_by_key(&Value::Int(29)).unwrap();
        assert_eq!(arena.get("name"), Some(&Value::from("Arena")));
        assert!(table.get_by_key(&Value::Int(1)).is_none());
    }

    #[test]
    fn test_index_rejects_duplicates() {
        let mut table = maps();
        table.push_row(vec![Value::Int(9), "Arabia 2".into()]).unwrap();
        let err = table.set_index("id").unwrap_err();
        assert!(matches!(err, TableError::DuplicateIndex { .. }));
    }

    #[test]
    fn test_select_reorders_columns() {
        let selected = maps().select(&["name", "id"]).unwrap();
        assert_eq!(selected.columns(), &["name".to_string(), "id".to_string()]);
        assert_eq!(selected.rows()[0], vec![Value::from("Arabia"), Value::Int(9)]);
        assert!(maps().select(&["missing"]).is_err());
    }

    #[test]
    fn test_distinct_is_sorted() {
        let table = Table::from_rows(
            ["player_number"],
            vec![
                vec![Value::Int(2)],
                vec![Value::Int(1)],
                vec![Value::Int(2)],
            ],
        )
        .unwrap();
        assert_eq!(
            table.distinct("player_number").unwrap(),
            vec![Value::Int(1), Value::Int(2)]
        );
    }

    #[test]
    fn test_serializes_as_records() {
        let json = serde_json::to_value(maps()).unwrap();
        assert_eq!(
            json[1],
            serde_json::json!({"id": 12, "name": "Black Forest"})
        );
    }
}
