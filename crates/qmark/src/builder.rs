//! The fluent query-building surface.
//!
//! A [`QueryBuilder`] owns one [`Query`] model and mutates it through
//! chained calls, each consuming and returning the builder. Caller mistakes
//! (bad identifier, unknown operator, LIMIT set twice) are recorded in a
//! deferred error slot and surfaced by the next compilation, so no fluent
//! call ever panics and no error is silently dropped.
//!
//! # Example
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
//! assert_eq!(compiled.bindings.len(), 3);
//! # Ok::<(), qmark::QueryError>(())
//! ```

use crate::chunk::Chunks;
use crate::connection::Connection;
use crate::error::{QueryError, QueryResult};
use crate::expr::{CmpOp, Condition, Connector};
use crate::grammar::{BindMode, CompiledQuery, Compiler};
use crate::ident::Ident;
use crate::query::{
    Aggregate, AggregateFunction, AggregateTarget, Direction, Having, Join, JoinKind, OrderBy,
    Query, SelectColumn, StatementKind,
};
use crate::row::{FromRow, Row};
use crate::value::Value;

const DEFAULT_DIALECT: &str = "mysql";

/// Create a query builder for the given table.
///
/// # Example
/// ```ignore
/// let users = qmark::table("users").where_eq("active", true).to_qmark()?;
/// ```
pub fn table(name: &str) -> QueryBuilder {
    QueryBuilder::new().table(name)
}

/// Fluent builder over one query model.
#[derive(Clone, Debug)]
pub struct QueryBuilder {
    query: Query,
    build_error: Option<QueryError>,
}

impl QueryBuilder {
    /// Create an empty builder on the default dialect.
    ///
    /// A table must be set before compilation.
    pub fn new() -> Self {
        Self {
            query: Query::new(DEFAULT_DIALECT),
            build_error: None,
        }
    }

    // ==================== Deferred-error helpers ====================

    fn record(&mut self, err: QueryError) {
        // First error wins; later calls keep chaining but compilation fails.
        self.build_error.get_or_insert(err);
    }

    fn try_ident(&mut self, raw: &str) -> Option<Ident> {
        match Ident::parse(raw) {
            Ok(ident) => Some(ident),
            Err(err) => {
                self.record(err);
                None
            }
        }
    }

    fn try_op(&mut self, raw: &str) -> Option<CmpOp> {
        match CmpOp::parse(raw) {
            Ok(op) => Some(op),
            Err(err) => {
                self.record(err);
                None
            }
        }
    }

    fn validate(&self) -> QueryResult<()> {
        match &self.build_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Fresh child builder pre-scoped to this builder's table, dialect, and
    /// connection; used for group and subquery callbacks.
    fn child(&self) -> QueryBuilder {
        let mut query = Query::new(&self.query.dialect);
        query.table = self.query.table.clone();
        query.connection = self.query.connection.clone();
        QueryBuilder {
            query,
            build_error: None,
        }
    }

    // ==================== Target selection ====================

    /// Set the target table. Idempotent; the last call wins.
    pub fn table(mut self, name: &str) -> Self {
        if let Some(table) = self.try_ident(name) {
            self.query.table = Some(table);
        }
        self
    }

    /// Select the logical connection resolved by the execution collaborator.
    pub fn on(mut self, connection: &str) -> Self {
        self.query.connection = Some(connection.to_string());
        self
    }

    /// Set the dialect whose grammar compiles this query.
    ///
    /// Unknown names surface as [`QueryError::UnknownDialect`] at compile
    /// time.
    pub fn dialect(mut self, name: &str) -> Self {
        self.query.dialect = name.to_string();
        self
    }

    // ==================== Select list ====================

    /// Append columns to the select list.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for column in columns {
            if let Some(ident) = self.try_ident(column.as_ref()) {
                self.query.columns.push(SelectColumn::Column(ident));
            }
        }
        self
    }

    /// Append a raw select expression, rendered verbatim.
    pub fn select_raw(mut self, expr: &str) -> Self {
        self.query.columns.push(SelectColumn::Raw(expr.to_string()));
        self
    }

    /// Select distinct rows.
    pub fn distinct(mut self) -> Self {
        self.query.distinct = true;
        self
    }

    // ==================== WHERE ====================

    fn basic(mut self, connector: Connector, column: &str, op: CmpOp, value: Value) -> Self {
        if let Some(column) = self.try_ident(column) {
            self.query
                .wheres
                .push(connector, Condition::Basic { column, op, value });
        }
        self
    }

    /// Add `column = value`.
    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.basic(Connector::And, column, CmpOp::Eq, value.into())
    }

    /// Add `column = value` joined to its left sibling with OR.
    pub fn or_where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.basic(Connector::Or, column, CmpOp::Eq, value.into())
    }

    /// Add `column op value` with an explicit operator token.
    ///
    /// The operator must be one of `=`, `!=`, `<>`, `>`, `<`, `>=`, `<=`.
    pub fn where_cmp(mut self, column: &str, op: &str, value: impl Into<Value>) -> Self {
        match self.try_op(op) {
            Some(op) => self.basic(Connector::And, column, op, value.into()),
            None => self,
        }
    }

    /// OR-connected form of [`where_cmp`](Self::where_cmp).
    pub fn or_where_cmp(mut self, column: &str, op: &str, value: impl Into<Value>) -> Self {
        match self.try_op(op) {
            Some(op) => self.basic(Connector::Or, column, op, value.into()),
            None => self,
        }
    }

    /// Add one equality condition per pair, in iteration order.
    ///
    /// Sugar for chained [`where_eq`](Self::where_eq); the pair order is the
    /// binding order.
    pub fn where_map<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut builder = self;
        for (column, value) in pairs {
            builder = builder.where_eq(column.as_ref(), value);
        }
        builder
    }

    /// Compose a parenthesized condition group through a callback.
    ///
    /// The callback receives a fresh builder pre-scoped to this builder's
    /// table; its condition tree is appended as one group with AND.
    pub fn where_group<F>(self, f: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        self.group_with(Connector::And, f)
    }

    /// OR-connected form of [`where_group`](Self::where_group).
    pub fn or_where_group<F>(self, f: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        self.group_with(Connector::Or, f)
    }

    fn group_with<F>(mut self, connector: Connector, f: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        let child = f(self.child());
        if let Some(err) = child.build_error {
            self.record(err);
            return self;
        }
        self.query
            .wheres
            .push(connector, Condition::Group(child.query.wheres));
        self
    }

    /// Compare two columns: `left op right`. Binds nothing.
    pub fn where_column(mut self, left: &str, op: &str, right: &str) -> Self {
        let left = self.try_ident(left);
        let op = self.try_op(op);
        let right = self.try_ident(right);
        if let (Some(left), Some(op), Some(right)) = (left, op, right) {
            self.query
                .wheres
                .push(Connector::And, Condition::ColumnCompare { left, op, right });
        }
        self
    }

    /// Add `column IS NULL`.
    pub fn where_null(self, column: &str) -> Self {
        self.null_check(column, false)
    }

    /// Add `column IS NOT NULL`.
    pub fn where_not_null(self, column: &str) -> Self {
        self.null_check(column, true)
    }

    fn null_check(mut self, column: &str, negated: bool) -> Self {
        if let Some(column) = self.try_ident(column) {
            self.query
                .wheres
                .push(Connector::And, Condition::Null { column, negated });
        }
        self
    }

    /// Add `column IN (values...)`.
    ///
    /// An empty list compiles to a condition matching no rows.
    pub fn where_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.in_list(column, values, false)
    }

    /// Add `column NOT IN (values...)`.
    ///
    /// An empty list compiles to a condition matching every row.
    pub fn where_not_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.in_list(column, values, true)
    }

    fn in_list<I, V>(mut self, column: &str, values: I, negated: bool) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        if let Some(column) = self.try_ident(column) {
            self.query.wheres.push(
                Connector::And,
                Condition::In {
                    column,
                    values: values.into_iter().map(Into::into).collect(),
                    negated,
                },
            );
        }
        self
    }

    /// Add `column LIKE pattern`.
    pub fn where_like(self, column: &str, pattern: impl Into<Value>) -> Self {
        self.like(column, pattern.into(), false)
    }

    /// Add `column NOT LIKE pattern`.
    pub fn where_not_like(self, column: &str, pattern: impl Into<Value>) -> Self {
        self.like(column, pattern.into(), true)
    }

    fn like(mut self, column: &str, pattern: Value, negated: bool) -> Self {
        if let Some(column) = self.try_ident(column) {
            self.query.wheres.push(
                Connector::And,
                Condition::Like {
                    column,
                    pattern,
                    negated,
                },
            );
        }
        self
    }

    /// Add `column BETWEEN low AND high`.
    pub fn where_between(self, column: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.between(column, low.into(), high.into(), false)
    }

    /// Add `column NOT BETWEEN low AND high`.
    pub fn where_not_between(
        self,
        column: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        self.between(column, low.into(), high.into(), true)
    }

    /// Alias for [`where_not_between`](Self::where_not_between).
    pub fn not_between(self, column: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.where_not_between(column, low, high)
    }

    fn between(mut self, column: &str, low: Value, high: Value, negated: bool) -> Self {
        if let Some(column) = self.try_ident(column) {
            self.query.wheres.push(
                Connector::And,
                Condition::Between {
                    column,
                    low,
                    high,
                    negated,
                },
            );
        }
        self
    }

    /// Add a trusted raw condition without bindings.
    pub fn where_raw(mut self, sql: &str) -> Self {
        self.query.wheres.push(
            Connector::And,
            Condition::Raw {
                sql: sql.to_string(),
                bindings: Vec::new(),
            },
        );
        self
    }

    /// Add a trusted raw condition with `?` placeholders and bindings.
    ///
    /// The fragment's placeholder count must match the binding count;
    /// compilation fails with [`QueryError::BindingMismatch`] otherwise.
    pub fn where_raw_bound<I, V>(mut self, sql: &str, bindings: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.query.wheres.push(
            Connector::And,
            Condition::Raw {
                sql: sql.to_string(),
                bindings: bindings.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    /// Add `EXISTS (subquery)` composed through a callback.
    ///
    /// The callback's builder starts scoped to this builder's table; call
    /// [`table`](Self::table) inside to target another one.
    pub fn where_exists<F>(self, f: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        self.exists_with(false, None, f)
    }

    /// Add `NOT EXISTS (subquery)` composed through a callback.
    pub fn where_not_exists<F>(self, f: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        self.exists_with(true, None, f)
    }

    /// Add `EXISTS` against the named table; the callback supplies the
    /// correlation conditions (typically [`where_column`](Self::where_column)).
    pub fn where_has<F>(self, related: &str, f: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        self.exists_with(false, Some(related), f)
    }

    fn exists_with<F>(mut self, negated: bool, related: Option<&str>, f: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        let mut child = self.child();
        if let Some(name) = related {
            child = child.table(name);
        }
        let child = f(child);
        if let Some(err) = child.build_error {
            self.record(err);
            return self;
        }
        self.query.wheres.push(
            Connector::And,
            Condition::Exists {
                query: Box::new(child.query),
                negated,
            },
        );
        self
    }

    /// Apply `f` only when `condition` holds; pure control-flow sugar.
    pub fn when<F>(self, condition: bool, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        if condition { f(self) } else { self }
    }

    // ==================== Joins ====================

    /// Add an INNER JOIN: `table ON left op right`.
    pub fn join(self, table: &str, left: &str, op: &str, right: &str) -> Self {
        self.join_with(JoinKind::Inner, table, left, op, right)
    }

    /// Add a LEFT JOIN.
    pub fn left_join(self, table: &str, left: &str, op: &str, right: &str) -> Self {
        self.join_with(JoinKind::Left, table, left, op, right)
    }

    /// Add a RIGHT JOIN.
    pub fn right_join(self, table: &str, left: &str, op: &str, right: &str) -> Self {
        self.join_with(JoinKind::Right, table, left, op, right)
    }

    fn join_with(mut self, kind: JoinKind, table: &str, left: &str, op: &str, right: &str) -> Self {
        let table = self.try_ident(table);
        let left = self.try_ident(left);
        let op = self.try_op(op);
        let right = self.try_ident(right);
        if let (Some(table), Some(left), Some(op), Some(right)) = (table, left, op, right) {
            self.query.joins.push(Join {
                table,
                left,
                op,
                right,
                kind,
            });
        }
        self
    }

    // ==================== Grouping & ordering ====================

    /// Append a GROUP BY column.
    pub fn group_by(mut self, column: &str) -> Self {
        if let Some(column) = self.try_ident(column) {
            self.query.groups.push(column);
        }
        self
    }

    /// Append a bare HAVING entry.
    pub fn having(mut self, column: &str) -> Self {
        if let Some(column) = self.try_ident(column) {
            self.query.havings.push(Having {
                column,
                threshold: None,
            });
        }
        self
    }

    /// Append a HAVING entry with a comparison threshold.
    pub fn having_cmp(mut self, column: &str, op: &str, value: impl Into<Value>) -> Self {
        let column = self.try_ident(column);
        let op = self.try_op(op);
        if let (Some(column), Some(op)) = (column, op) {
            self.query.havings.push(Having {
                column,
                threshold: Some((op, value.into())),
            });
        }
        self
    }

    /// Append an ascending ORDER BY column.
    pub fn order_by(mut self, column: &str) -> Self {
        if let Some(column) = self.try_ident(column) {
            self.query.orders.push(OrderBy {
                column,
                direction: Direction::Asc,
            });
        }
        self
    }

    /// Append a descending ORDER BY column.
    pub fn order_by_desc(mut self, column: &str) -> Self {
        if let Some(column) = self.try_ident(column) {
            self.query.orders.push(OrderBy {
                column,
                direction: Direction::Desc,
            });
        }
        self
    }

    // ==================== Pagination ====================

    /// Set LIMIT. Setting it twice is a structural error.
    pub fn limit(mut self, n: u64) -> Self {
        if self.query.limit.is_some() {
            self.record(QueryError::structural("LIMIT may be set at most once"));
        } else {
            self.query.limit = Some(n);
        }
        self
    }

    /// Set OFFSET. Setting it twice is a structural error.
    pub fn offset(mut self, n: u64) -> Self {
        if self.query.offset.is_some() {
            self.record(QueryError::structural("OFFSET may be set at most once"));
        } else {
            self.query.offset = Some(n);
        }
        self
    }

    /// Pagination helper; `page` is 1-based, both arguments clamp to >= 1.
    pub fn paginate(self, page: u64, per_page: u64) -> Self {
        let page = page.max(1);
        let size = per_page.max(1);
        self.limit(size).offset((page - 1) * size)
    }

    // ==================== Aggregates ====================

    /// Set the aggregate directive for the select list.
    pub fn aggregate(mut self, function: AggregateFunction, column: &str) -> Self {
        let target = if column == "*" {
            if function != AggregateFunction::Count {
                self.record(QueryError::structural(format!(
                    "{} cannot aggregate over '*'",
                    function.keyword()
                )));
                return self;
            }
            AggregateTarget::Star
        } else {
            match self.try_ident(column) {
                Some(ident) => AggregateTarget::Column(ident),
                None => return self,
            }
        };
        self.query.aggregate = Some(Aggregate { function, target });
        self
    }

    /// Select `SUM(column)`.
    pub fn sum(self, column: &str) -> Self {
        self.aggregate(AggregateFunction::Sum, column)
    }

    /// Select `AVG(column)`.
    pub fn avg(self, column: &str) -> Self {
        self.aggregate(AggregateFunction::Avg, column)
    }

    /// Select `COUNT(column)`; pass `"*"` to count rows.
    pub fn count(self, column: &str) -> Self {
        self.aggregate(AggregateFunction::Count, column)
    }

    /// Select `MAX(column)`.
    pub fn max(self, column: &str) -> Self {
        self.aggregate(AggregateFunction::Max, column)
    }

    /// Select `MIN(column)`.
    pub fn min(self, column: &str) -> Self {
        self.aggregate(AggregateFunction::Min, column)
    }

    // ==================== Mutations ====================

    /// Turn this statement into an UPDATE with the given assignments.
    ///
    /// Assignment order is the binding order; chained conditions still apply.
    pub fn update<I, K, V>(self, assignments: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.assignments(assignments, StatementKind::Update)
    }

    /// Turn this statement into an INSERT with the given column values.
    pub fn create<I, K, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.assignments(values, StatementKind::Insert)
    }

    fn assignments<I, K, V>(
        mut self,
        pairs: I,
        kind: fn(Vec<(Ident, Value)>) -> StatementKind,
    ) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut collected = Vec::new();
        for (column, value) in pairs {
            match self.try_ident(column.as_ref()) {
                Some(ident) => collected.push((ident, value.into())),
                None => return self,
            }
        }
        self.query.kind = kind(collected);
        self
    }

    /// Turn this statement into a DELETE.
    ///
    /// Without conditions it compiles to a no-op (`WHERE 1=0`) unless
    /// [`allow_delete_all`](Self::allow_delete_all) was called.
    pub fn delete(mut self) -> Self {
        self.query.kind = StatementKind::Delete;
        self
    }

    /// Allow DELETE without conditions to target every row.
    pub fn allow_delete_all(mut self, allow: bool) -> Self {
        self.query.allow_delete_all = allow;
        self
    }

    /// Increment `column` by 1.
    pub fn increment(self, column: &str) -> Self {
        self.increment_by(column, 1)
    }

    /// Increment `column` by `step`.
    pub fn increment_by(mut self, column: &str, step: u64) -> Self {
        if let Some(column) = self.try_ident(column) {
            self.query.kind = StatementKind::Increment { column, step };
        }
        self
    }

    /// Decrement `column` by 1.
    pub fn decrement(self, column: &str) -> Self {
        self.decrement_by(column, 1)
    }

    /// Decrement `column` by `step`.
    pub fn decrement_by(mut self, column: &str, step: u64) -> Self {
        if let Some(column) = self.try_ident(column) {
            self.query.kind = StatementKind::Decrement { column, step };
        }
        self
    }

    // ==================== Compilation ====================

    /// Compile to placeholder SQL plus the ordered binding list.
    ///
    /// This is the only form safe to hand to an execution collaborator.
    pub fn to_qmark(&self) -> QueryResult<CompiledQuery> {
        self.validate()?;
        Compiler::compile(&self.query, BindMode::Qmark)
    }

    /// Compile with values rendered as quoted literals.
    ///
    /// Diagnostics only; the output is not injection-safe and must never be
    /// executed.
    pub fn to_sql(&self) -> QueryResult<String> {
        self.validate()?;
        Compiler::compile(&self.query, BindMode::Literal).map(|compiled| compiled.sql)
    }

    // ==================== Execution ====================

    async fn run(query: &Query, conn: &impl Connection) -> QueryResult<Vec<Row>> {
        let compiled = Compiler::compile(query, BindMode::Qmark)?;
        tracing::debug!(
            dialect = %query.dialect,
            sql = %compiled.sql,
            bindings = compiled.bindings.len(),
            "executing statement"
        );
        conn.query(query.connection_name(), &compiled.sql, &compiled.bindings)
            .await
    }

    /// Execute and return all rows, honoring everything chained so far.
    pub async fn get(self, conn: &impl Connection) -> QueryResult<Vec<Row>> {
        self.validate()?;
        Self::run(&self.query, conn).await
    }

    /// Execute an unmodified SELECT over the whole table.
    ///
    /// Chaining selection-affecting calls first is a structural error; use
    /// [`get`](Self::get) for refined queries.
    pub async fn all(self, conn: &impl Connection) -> QueryResult<Vec<Row>> {
        self.validate()?;
        if self.query.is_refined() {
            return Err(QueryError::structural(
                "all() requires an unmodified builder; use get() after chaining",
            ));
        }
        Self::run(&self.query, conn).await
    }

    /// Execute with limit 1 and return the first row, if any.
    pub async fn first(self, conn: &impl Connection) -> QueryResult<Option<Row>> {
        self.validate()?;
        let mut query = self.query;
        query.limit = Some(1);
        let rows = Self::run(&query, conn).await?;
        Ok(rows.into_iter().next())
    }

    /// Execute a mutation statement; rows returned by the collaborator pass
    /// through verbatim.
    pub async fn execute(self, conn: &impl Connection) -> QueryResult<Vec<Row>> {
        self.validate()?;
        Self::run(&self.query, conn).await
    }

    /// Execute and hydrate every row into `T`.
    pub async fn get_as<T: FromRow>(self, conn: &impl Connection) -> QueryResult<Vec<T>> {
        let rows = self.get(conn).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Execute with limit 1 and hydrate the first row into `T`, if any.
    pub async fn first_as<T: FromRow>(self, conn: &impl Connection) -> QueryResult<Option<T>> {
        let row = self.first(conn).await?;
        row.as_ref().map(T::from_row).transpose()
    }

    /// Iterate the result set in pages of `page_size` rows.
    ///
    /// Each pull issues one LIMIT/OFFSET query; the sequence ends at the
    /// first empty batch.
    pub fn chunk<C: Connection>(self, page_size: u64, conn: &C) -> QueryResult<Chunks<'_, C>> {
        self.validate()?;
        if page_size == 0 {
            return Err(QueryError::structural("chunk size must be positive"));
        }
        Ok(Chunks::new(self.query, page_size, conn))
    }
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn bare_select() {
        let compiled = table("users").to_qmark().unwrap();
        assert_eq!(compiled.sql, "SELECT * FROM users");
        assert!(compiled.bindings.is_empty());
    }

    #[test]
    fn missing_table_is_structural() {
        let err = QueryBuilder::new().where_eq("a", 1i64).to_qmark().unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn chained_wheres_bind_in_order() {
        let compiled = table("users")
            .where_eq("status", "active")
            .where_cmp("age", ">", 18i64)
            .to_qmark()
            .unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT * FROM users WHERE status = ? AND age > ?"
        );
        assert_eq!(
            compiled.bindings,
            vec![Value::Text("active".into()), Value::Int(18)]
        );
    }

    #[test]
    fn where_map_matches_chained_wheres() {
        let chained = table("users")
            .where_eq("a", 1i64)
            .where_eq("b", 2i64)
            .to_qmark()
            .unwrap();
        let mapped = table("users")
            .where_map(vec![("a", 1i64), ("b", 2i64)])
            .to_qmark()
            .unwrap();
        assert_eq!(chained.sql, mapped.sql);
        assert_eq!(chained.bindings, mapped.bindings);
    }

    #[test]
    fn nested_group_renders_parenthesized() {
        let compiled = table("users")
            .where_group(|q| q.where_eq("active", 1i64).where_null("activated_at"))
            .to_qmark()
            .unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT * FROM users WHERE (active = ? AND activated_at IS NULL)"
        );
        assert_eq!(compiled.bindings, vec![Value::Int(1)]);
    }

    #[test]
    fn or_connectors() {
        let compiled = table("users")
            .where_eq("role", "admin")
            .or_where_eq("role", "owner")
            .to_qmark()
            .unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT * FROM users WHERE role = ? OR role = ?"
        );
    }

    #[test]
    fn group_or_group_composition() {
        let compiled = table("users")
            .where_group(|q| q.where_eq("a", 1i64).where_eq("b", 2i64))
            .or_where_group(|q| q.where_eq("c", 3i64))
            .to_qmark()
            .unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT * FROM users WHERE (a = ? AND b = ?) OR (c = ?)"
        );
        assert_eq!(
            compiled.bindings,
            vec![Value::Int(1), Value::Int(2), Value::Int(3)]
        );
    }

    #[test]
    fn empty_group_is_dropped() {
        let compiled = table("users")
            .where_eq("id", 1i64)
            .where_group(|q| q)
            .to_qmark()
            .unwrap();
        assert_eq!(compiled.sql, "SELECT * FROM users WHERE id = ?");
    }

    #[test]
    fn in_list_and_edge_cases() {
        let compiled = table("users")
            .where_in("age", vec![18i64, 21, 25])
            .to_qmark()
            .unwrap();
        assert_eq!(compiled.sql, "SELECT * FROM users WHERE age IN (?, ?, ?)");
        assert_eq!(
            compiled.bindings,
            vec![Value::Int(18), Value::Int(21), Value::Int(25)]
        );

        let empty = table("users")
            .where_in("age", Vec::<i64>::new())
            .to_qmark()
            .unwrap();
        assert_eq!(empty.sql, "SELECT * FROM users WHERE 1=0");
        assert!(empty.bindings.is_empty());

        let negated = table("users")
            .where_not_in("age", Vec::<i64>::new())
            .to_qmark()
            .unwrap();
        assert_eq!(negated.sql, "SELECT * FROM users WHERE 1=1");
    }

    #[test]
    fn like_between_null_family() {
        let compiled = table("users")
            .where_like("name", "%ali%")
            .where_not_between("age", 30i64, 40i64)
            .where_not_null("email")
            .to_qmark()
            .unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT * FROM users WHERE name LIKE ? AND age NOT BETWEEN ? AND ? AND email IS NOT NULL"
        );
        assert_eq!(compiled.bindings.len(), 3);
    }

    #[test]
    fn where_column_binds_nothing() {
        let compiled = table("orders")
            .where_column("orders.total", ">=", "orders.paid")
            .to_qmark()
            .unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT * FROM orders WHERE orders.total >= orders.paid"
        );
        assert!(compiled.bindings.is_empty());
    }

    #[test]
    fn joins_render_in_insertion_order() {
        let compiled = table("table1")
            .join("table2", "table2.id", "=", "table1.table_id")
            .left_join("table3", "table3.id", "=", "table1.ref_id")
            .right_join("table4", "table4.id", "=", "table1.other_id")
            .to_qmark()
            .unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT * FROM table1 \
             INNER JOIN table2 ON table2.id = table1.table_id \
             LEFT JOIN table3 ON table3.id = table1.ref_id \
             RIGHT JOIN table4 ON table4.id = table1.other_id"
        );
    }

    #[test]
    fn select_list_and_modifiers() {
        let compiled = table("users")
            .distinct()
            .select(["id", "name"])
            .select_raw("COUNT(*) AS total")
            .group_by("name")
            .having_cmp("total", ">", 5i64)
            .order_by("name")
            .order_by_desc("id")
            .to_qmark()
            .unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT DISTINCT id, name, COUNT(*) AS total FROM users \
             GROUP BY name HAVING total > ? ORDER BY name ASC, id DESC"
        );
        assert_eq!(compiled.bindings, vec![Value::Int(5)]);
    }

    #[test]
    fn bare_having_renders_column_only() {
        let compiled = table("orders")
            .group_by("user_id")
            .having("user_id")
            .to_qmark()
            .unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT * FROM orders GROUP BY user_id HAVING user_id"
        );
    }

    #[test]
    fn limit_twice_is_structural() {
        let err = table("users").limit(10).limit(20).to_qmark().unwrap_err();
        assert!(err.is_structural());
        let err = table("users").offset(5).offset(6).to_qmark().unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn paginate_matches_limit_offset() {
        let a = table("users").paginate(2, 10).to_qmark().unwrap();
        let b = table("users").limit(10).offset(10).to_qmark().unwrap();
        assert_eq!(a.sql, b.sql);
    }

    #[test]
    fn when_applies_conditionally() {
        let untouched = table("users").when(false, |q| q.where_eq("x", 1i64));
        assert_eq!(untouched.to_qmark().unwrap().sql, "SELECT * FROM users");

        let applied = table("users")
            .when(true, |q| q.where_eq("x", 1i64))
            .to_qmark()
            .unwrap();
        let direct = table("users").where_eq("x", 1i64).to_qmark().unwrap();
        assert_eq!(applied.sql, direct.sql);
        assert_eq!(applied.bindings, direct.bindings);
    }

    #[test]
    fn aggregates_take_over_the_select_list() {
        let compiled = table("orders").sum("amount").to_qmark().unwrap();
        assert_eq!(compiled.sql, "SELECT SUM(amount) AS sum FROM orders");

        let compiled = table("orders").count("*").to_qmark().unwrap();
        assert_eq!(compiled.sql, "SELECT COUNT(*) AS count FROM orders");
    }

    #[test]
    fn star_is_count_only() {
        let err = table("orders").sum("*").to_qmark().unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn insert_shape_and_order() {
        let compiled = table("users")
            .create(vec![("name", "Alice"), ("email", "a@example.com")])
            .to_qmark()
            .unwrap();
        assert_eq!(
            compiled.sql,
            "INSERT INTO users (name, email) VALUES (?, ?)"
        );
        assert_eq!(
            compiled.bindings,
            vec![
                Value::Text("Alice".into()),
                Value::Text("a@example.com".into())
            ]
        );
    }

    #[test]
    fn update_binds_set_before_where() {
        let compiled = table("users")
            .where_eq("id", 9i64)
            .update(vec![("status", "inactive")])
            .to_qmark()
            .unwrap();
        assert_eq!(compiled.sql, "UPDATE users SET status = ? WHERE id = ?");
        assert_eq!(
            compiled.bindings,
            vec![Value::Text("inactive".into()), Value::Int(9)]
        );
    }

    #[test]
    fn delete_honors_wheres_and_guards_delete_all() {
        let compiled = table("users")
            .where_eq("id", 1i64)
            .delete()
            .to_qmark()
            .unwrap();
        assert_eq!(compiled.sql, "DELETE FROM users WHERE id = ?");

        let guarded = table("users").delete().to_qmark().unwrap();
        assert_eq!(guarded.sql, "DELETE FROM users WHERE 1=0");

        let unguarded = table("users")
            .delete()
            .allow_delete_all(true)
            .to_qmark()
            .unwrap();
        assert_eq!(unguarded.sql, "DELETE FROM users");
    }

    #[test]
    fn joins_are_rejected_on_mutations() {
        let err = table("users")
            .join("orders", "orders.user_id", "=", "users.id")
            .delete()
            .to_qmark()
            .unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn increment_and_decrement() {
        let compiled = table("users").increment("status").to_qmark().unwrap();
        assert_eq!(compiled.sql, "UPDATE users SET status = status + 1");

        let compiled = table("users")
            .where_eq("id", 2i64)
            .decrement_by("status", 5)
            .to_qmark()
            .unwrap();
        assert_eq!(
            compiled.sql,
            "UPDATE users SET status = status - 5 WHERE id = ?"
        );
        assert_eq!(compiled.bindings, vec![Value::Int(2)]);
    }

    #[test]
    fn exists_subquery_composes() {
        let compiled = table("users")
            .where_has("orders", |q| {
                q.where_column("orders.user_id", "=", "users.id")
                    .where_cmp("orders.total", ">", 100i64)
            })
            .to_qmark()
            .unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT * FROM users WHERE EXISTS \
             (SELECT * FROM orders WHERE orders.user_id = users.id AND orders.total > ?)"
        );
        assert_eq!(compiled.bindings, vec![Value::Int(100)]);
    }

    #[test]
    fn unsupported_operator_surfaces_at_compile() {
        let err = table("users")
            .where_cmp("age", "LIKE", 1i64)
            .to_qmark()
            .unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedOperator(op) if op == "LIKE"));
    }

    #[test]
    fn bad_identifier_surfaces_at_compile() {
        let err = table("users")
            .where_eq("age; DROP TABLE users", 1i64)
            .to_qmark()
            .unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn first_error_wins() {
        let err = table("users")
            .where_cmp("a", "~", 1i64)
            .limit(1)
            .limit(2)
            .to_qmark()
            .unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedOperator(_)));
    }

    #[test]
    fn qmark_bindings_match_literal_rendering() {
        let builder = table("users")
            .where_eq("name", "alice")
            .where_cmp("age", ">=", 21i64)
            .where_in("role", vec!["admin", "user"]);

        let compiled = builder.to_qmark().unwrap();
        let literal = builder.to_sql().unwrap();

        // Substituting bindings into the qmark form reproduces the literal form.
        let mut substituted = String::new();
        let mut bindings = compiled.bindings.iter();
        for ch in compiled.sql.chars() {
            if ch == '?' {
                match bindings.next().unwrap() {
                    Value::Text(s) => {
                        substituted.push('\'');
                        substituted.push_str(s);
                        substituted.push('\'');
                    }
                    Value::Int(i) => substituted.push_str(&i.to_string()),
                    other => panic!("unexpected binding {other:?}"),
                }
            } else {
                substituted.push(ch);
            }
        }
        assert_eq!(substituted, literal);
    }
}
