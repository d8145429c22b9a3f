//! # qmark
//!
//! A fluent, dialect-aware SQL query builder for Rust.
//!
//! ## Features
//!
//! - **Fluent building**: chain `where_*` / `join` / `order_by` / pagination
//!   calls over one owned query model
//! - **Safe by construction**: every value travels as a structured binding;
//!   nothing caller-supplied is ever concatenated into SQL text
//! - **Multi-dialect**: one model compiles under MySQL, PostgreSQL, or
//!   SQLite grammars with the right quoting, placeholders, and pagination
//! - **Composable filters**: nested groups, `EXISTS` subqueries, and raw
//!   fragments with positionally checked bindings
//! - **Chunked iteration**: pull-based paging for bounded-memory scans
//! - **Thin execution seam**: bring your own driver behind the
//!   [`Connection`] trait; optional row hydration via [`FromRow`]
//!
//! ## Building queries
//!
//! ```ignore
//! use qmark::table;
//!
//! let compiled = table("users")
//!     .select(["id", "name"])
//!     .where_eq("status", "active")
//!     .where_group(|q| q.where_cmp("age", ">=", 18).or_where_eq("vip", true))
//!     .order_by_desc("created_at")
//!     .limit(20)
//!     .to_qmark()?;
//!
//! // compiled.sql:      SELECT id, name FROM users WHERE status = ? AND
//! //                    (age >= ? OR vip = ?) ORDER BY created_at DESC LIMIT 20
//! // compiled.bindings: ["active", 18, 1]
//! # Ok::<(), qmark::QueryError>(())
//! ```
//!
//! ## Executing
//!
//! ```ignore
//! use qmark::{table, Connection};
//!
//! async fn load(conn: &impl Connection) -> qmark::QueryResult<()> {
//!     let rows = table("users").where_eq("active", true).get(conn).await?;
//!
//!     let mut pages = table("events").order_by("id").chunk(500, conn)?;
//!     while let Some(batch) = pages.next().await? {
//!         // process one bounded batch at a time
//!         let _ = batch.len();
//!     }
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod chunk;
pub mod connection;
pub mod error;
pub mod expr;
pub mod grammar;
pub mod ident;
pub mod query;
pub mod row;
pub mod value;

pub use builder::{QueryBuilder, table};
pub use chunk::Chunks;
pub use connection::Connection;
pub use error::{QueryError, QueryResult};
pub use expr::{CmpOp, Condition, ConditionList, ConditionNode, Connector};
pub use grammar::{
    CompiledQuery, Grammar, MysqlGrammar, PostgresGrammar, SqliteGrammar, grammar_for,
};
pub use ident::Ident;
pub use query::{AggregateFunction, Direction, JoinKind};
pub use row::{FromRow, Row};
pub use value::Value;
