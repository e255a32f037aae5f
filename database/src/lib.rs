pub mod config;
pub mod error;
pub mod facade;
pub mod filters;
pub mod queries;
pub mod reference;
pub mod retry;
pub mod rows;
pub mod session;


pub use config::DatabaseConfig;
pub use error::DatabaseError;
pub use facade::{Matches, RecsDatabase};
pub use filters::MatchFilter;
pub use queries::{MatchTable, Param, SqlQuery};
pub use reference::ReferenceTables;
pub use retry::fetch_with_reconnect;
pub use session::{Session, SqlSession};

pub use aocrecs_types::{Lookup, MatchSelection, RemapPolicy, Table, Value};
