pub mod error;
pub mod pivot;
pub mod remap;
pub mod selection;
pub mod table;
pub mod value;

pub use error::TableError;
pub use pivot::unstack;
pub use remap::{Lookup, RemapPolicy};
pub use selection::MatchSelection;
pub use table::{RowRef, Table};
pub use value::Value;
