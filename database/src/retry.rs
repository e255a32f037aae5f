use aocrecs_types::Table;

use crate::queries::SqlQuery;
use crate::session::Session;
use crate::DatabaseError;

/// Fetch `query`, reconnecting and retrying exactly once when the first
/// attempt fails on a lost connection.
///
/// There is no backoff. A failed reconnect, a second failure, or any error
/// that is not a connection error is returned as is.
pub async fn fetch_with_reconnect<S>(session: &mut S, query: &SqlQuery) -> Result<Table, DatabaseError>
where
    S: Session + ?Sized,
{
    match session.fetch(query).await {
        Err(e) if e.is_connection_error() => {
            tracing::warn!("Query failed on a lost connection: {}. Reconnecting and retrying once...", e);
            session.reconnect().await?;
            session.fetch(query).await
        }
        result => result,
    }
}
