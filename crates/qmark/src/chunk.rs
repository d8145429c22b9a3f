//! Lazy, bounded-memory iteration over large result sets.
//!
//! [`Chunks`] repeatedly compiles and executes the underlying SELECT with
//! `limit = page_size, offset = cursor`, advancing the cursor after every
//! non-empty batch. It is pull-based: nothing runs until [`next`] is awaited
//! and at most one query is outstanding at a time, so a consumer that simply
//! stops pulling has cancelled the iteration.
//!
//! [`next`]: Chunks::next

use crate::connection::Connection;
use crate::error::QueryResult;
use crate::grammar::{BindMode, Compiler};
use crate::query::Query;
use crate::row::Row;

/// Pager over one SELECT statement.
///
/// The cursor only moves forward; restart by building a new pager.
pub struct Chunks<'a, C: Connection> {
    query: Query,
    conn: &'a C,
    page_size: u64,
    cursor: u64,
    done: bool,
}

impl<'a, C: Connection> std::fmt::Debug for Chunks<'a, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunks")
            .field("page_size", &self.page_size)
            .field("cursor", &self.cursor)
            .field("done", &self.done)
            .finish()
    }
}

impl<'a, C: Connection> Chunks<'a, C> {
    pub(crate) fn new(query: Query, page_size: u64, conn: &'a C) -> Self {
        Self {
            query,
            conn,
            page_size,
            cursor: 0,
            done: false,
        }
    }

    /// The configured page size.
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Fetch the next batch, or `None` once the sequence is exhausted.
    ///
    /// The sequence ends at the first empty batch; a full final page costs
    /// one extra (empty) query to observe the end.
    pub async fn next(&mut self) -> QueryResult<Option<Vec<Row>>> {
        if self.done {
            return Ok(None);
        }

        let mut page = self.query.clone();
        page.limit = Some(self.page_size);
        page.offset = Some(self.cursor);

        let compiled = Compiler::compile(&page, BindMode::Qmark)?;
        tracing::debug!(
            dialect = %page.dialect,
            cursor = self.cursor,
            page_size = self.page_size,
            sql = %compiled.sql,
            "fetching chunk"
        );

        let rows = self
            .conn
            .query(page.connection_name(), &compiled.sql, &compiled.bindings)
            .await?;

        if rows.is_empty() {
            self.done = true;
            return Ok(None);
        }
        self.cursor += self.page_size;
        Ok(Some(rows))
    }
}
