use thiserror::Error;

use crate::Value;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Row has {found} values but the table has {expected} columns")]
    RowWidth { expected: usize, found: usize },

    #[error("Duplicate key {value} in index column {column}")]
    DuplicateIndex { column: String, value: Value },

    #[error("Duplicate entry for {pivot}={value} at key ({key})")]
    DuplicateEntry {
        pivot: String,
        value: Value,
        key: String,
    },

    #[error("Value {value} in column {column} has no entry in the lookup table")]
    UnmappedValue { column: String, value: Value },

    #[error("Value {value} in column {column} is not an integer id")]
    NotAnId { column: String, value: Value },
}
