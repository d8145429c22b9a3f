//! The execution-collaborator boundary.
//!
//! The core compiles statements; something else runs them. A [`Connection`]
//! receives the qmark SQL, the ordered bindings, and a logical connection
//! name to resolve; it answers with rows or a failure that the core surfaces
//! verbatim — no interpretation, no implicit retry. Transport, pooling,
//! timeouts, and cancellation all live behind this trait.

use crate::error::QueryResult;
use crate::row::Row;
use crate::value::Value;

/// Executes compiled statements.
pub trait Connection: Send + Sync {
    /// Run `sql` with `bindings` against the connection selected by
    /// `connection` (empty string means the default connection).
    ///
    /// Mutation statements may answer with an empty row set.
    fn query(
        &self,
        connection: &str,
        sql: &str,
        bindings: &[Value],
    ) -> impl std::future::Future<Output = QueryResult<Vec<Row>>> + Send;
}
