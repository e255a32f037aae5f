use std::collections::BTreeMap;

use itertools::Itertools;

use crate::{Table, TableError, Value};

/// Reshape a long panel into a wide one.
///
/// Rows are grouped by the `keys` columns; the `pivot` column is moved out of
/// the rows and into the column names. Every other column is repeated once
/// per distinct pivot value, ascending, as `<column>_<pivot value>`. The output
/// has one row per distinct key tuple, ordered by key. Combinations missing
/// from the input are `Null`.
pub fn unstack(table: &Table, keys: &[&str], pivot: &str) -> Result<Table, TableError> {
    if table.is_empty() {
        return Ok(Table::new(keys.iter().copied()));
    }

    let key_positions = keys
        .iter()
        .map(|k| table.column_position(k))
        .collect::<Result<Vec<_>, _>>()?;
    let pivot_position = table.column_position(pivot)?;
    let value_positions = (0..table.columns().len())
        .filter(|p| *p != pivot_position && !key_positions.contains(p))
        .collect::<Vec<_>>();

    let pivot_values = table.distinct(pivot)?;
    let slot_of: BTreeMap<&Value, usize> = pivot_values
        .iter()
        .enumerate()
        .map(|(slot, value)| (value, slot))
        .collect();
    let width = pivot_values.len();

    let columns = keys
        .iter()
        .map(|k| k.to_string())
        .chain(
            value_positions
                .iter()
                .cartesian_product(pivot_values.iter())
                .map(|(&p, value)| format!("{}_{}", table.columns()[p], value)),
        )
        .collect::<Vec<_>>();

    let mut groups: BTreeMap<Vec<Value>, Vec<Option<Value>>> = BTreeMap::new();
    for row in table.rows() {
        let key = key_positions
            .iter()
            .map(|&p| row[p].clone())
            .collect::<Vec<_>>();
        let slot = slot_of[&row[pivot_position]];
        let cells = groups
            .entry(key)
            .or_insert_with(|| vec![None; value_positions.len() * width]);

        if cells.iter().skip(slot).step_by(width).any(Option::is_some) {
            return Err(TableError::DuplicateEntry {
                pivot: pivot.to_string(),
                value: row[pivot_position].clone(),
                key: key_positions.iter().map(|&p| &row[p]).join(", "),
            });
        }
        for (i, &p) in value_positions.iter().enumerate() {
            cells[i * width + slot] = Some(row[p].clone());
        }
    }

    log::debug!(
        "unstacked {} rows on {} into {} rows x {} columns",
        table.len(),
        pivot,
        groups.len(),
        columns.len()
    );

    let mut wide = Table::new(columns);
    for (key, cells) in groups {
        wide.push_row(
            key.into_iter()
                .chain(cells.into_iter().map(|c| c.unwrap_or(Value::Null)))
                .collect(),
        )?;
    }
    Ok(wide)
}
