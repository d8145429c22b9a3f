//! Per-dialect translation of a query model into SQL text plus bindings.
//!
//! A [`Grammar`] supplies the lexical rules of one dialect (identifier
//! quoting, placeholder style, boolean literals, pagination syntax). The
//! shared [`Compiler`] walks the query model depth-first in insertion order
//! and emits SQL while appending bindings in lock-step, so the binding list
//! always lines up with the emitted placeholders. Compilation is pure: the
//! same model compiles to byte-identical output on every call.

mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MysqlGrammar;
pub use postgres::PostgresGrammar;
pub use sqlite::SqliteGrammar;

use std::fmt::Write;

use serde::Serialize;

use crate::error::{QueryError, QueryResult};
use crate::expr::{Condition, ConditionList};
use crate::ident::Ident;
use crate::query::{Aggregate, AggregateTarget, Query, SelectColumn, StatementKind};
use crate::value::Value;

/// Lexical rules of one SQL dialect.
pub trait Grammar: Send + Sync {
    /// Registry name of this dialect.
    fn name(&self) -> &'static str;

    /// Identifier quote character.
    fn quote_char(&self) -> char;

    /// Write the placeholder for the binding at `position` (1-based).
    fn write_placeholder(&self, position: usize, out: &mut String);

    /// Literal spelling of a boolean.
    fn boolean(&self, value: bool) -> &'static str;

    /// Write the pagination clause, without a leading space.
    ///
    /// Called only when at least one of `limit`/`offset` is set.
    fn write_pagination(&self, limit: Option<u64>, offset: Option<u64>, out: &mut String);
}

impl std::fmt::Debug for dyn Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grammar").field("name", &self.name()).finish()
    }
}

/// Look up the grammar registered under `name`.
pub fn grammar_for(name: &str) -> QueryResult<&'static dyn Grammar> {
    match name {
        "mysql" => Ok(&MysqlGrammar),
        "postgres" | "postgresql" => Ok(&PostgresGrammar),
        "sqlite" => Ok(&SqliteGrammar),
        other => Err(QueryError::UnknownDialect(other.to_string())),
    }
}

/// The compiled artifact: placeholder SQL plus the ordered binding list.
///
/// `bindings.len()` always equals the number of placeholders in `sql`. This
/// is the only form safe to hand to an execution collaborator.
#[derive(Clone, Debug, Serialize)]
pub struct CompiledQuery {
    pub sql: String,
    pub bindings: Vec<Value>,
}

/// How values are emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BindMode {
    /// Placeholders plus a binding list (executable form).
    Qmark,
    /// Quoted literals inline (diagnostics only, never executed).
    Literal,
}

/// Shared traversal over a query model.
pub(crate) struct Compiler<'g> {
    grammar: &'g dyn Grammar,
    mode: BindMode,
    sql: String,
    bindings: Vec<Value>,
}

impl<'g> Compiler<'g> {
    /// Compile `query` under the grammar its dialect name resolves to.
    pub(crate) fn compile(query: &Query, mode: BindMode) -> QueryResult<CompiledQuery> {
        let grammar = grammar_for(&query.dialect)?;
        let mut compiler = Compiler {
            grammar,
            mode,
            sql: String::new(),
            bindings: Vec::new(),
        };
        compiler.statement(query)?;
        Ok(CompiledQuery {
            sql: compiler.sql,
            bindings: compiler.bindings,
        })
    }

    fn statement(&mut self, query: &Query) -> QueryResult<()> {
        let table = query
            .table
            .clone()
            .ok_or_else(|| QueryError::structural("no table set before compilation"))?;

        match &query.kind {
            StatementKind::Select => self.select(query, &table),
            StatementKind::Insert(assignments) => {
                self.require_no_joins(query, "INSERT")?;
                self.insert(&table, assignments)
            }
            StatementKind::Update(assignments) => {
                self.require_no_joins(query, "UPDATE")?;
                self.update(query, &table, assignments)
            }
            StatementKind::Delete => {
                self.require_no_joins(query, "DELETE")?;
                self.delete(query, &table)
            }
            StatementKind::Increment { column, step } => {
                self.require_no_joins(query, "INCREMENT")?;
                self.crement(query, &table, column, *step, '+')
            }
            StatementKind::Decrement { column, step } => {
                self.require_no_joins(query, "DECREMENT")?;
                self.crement(query, &table, column, *step, '-')
            }
        }
    }

    fn require_no_joins(&self, query: &Query, kind: &str) -> QueryResult<()> {
        if query.joins.is_empty() {
            Ok(())
        } else {
            Err(QueryError::structural(format!(
                "{kind} statements cannot carry joins"
            )))
        }
    }

    // ==================== SELECT ====================

    fn select(&mut self, query: &Query, table: &Ident) -> QueryResult<()> {
        self.sql.push_str("SELECT ");
        if query.distinct {
            self.sql.push_str("DISTINCT ");
        }
        self.select_list(query);
        self.sql.push_str(" FROM ");
        self.write_ident(table);

        for join in &query.joins {
            self.sql.push(' ');
            self.sql.push_str(join.kind.keyword());
            self.sql.push(' ');
            self.write_ident(&join.table);
            self.sql.push_str(" ON ");
            self.write_ident(&join.left);
            self.sql.push(' ');
            self.sql.push_str(join.op.sql());
            self.sql.push(' ');
            self.write_ident(&join.right);
        }

        self.where_clause(&query.wheres)?;

        if !query.groups.is_empty() {
            self.sql.push_str(" GROUP BY ");
            for (i, column) in query.groups.iter().enumerate() {
                if i > 0 {
                    self.sql.push_str(", ");
                }
                self.write_ident(column);
            }
        }

        if !query.havings.is_empty() {
            self.sql.push_str(" HAVING ");
            for (i, having) in query.havings.iter().enumerate() {
                if i > 0 {
                    self.sql.push_str(" AND ");
                }
                self.write_ident(&having.column);
                if let Some((op, value)) = &having.threshold {
                    self.sql.push(' ');
                    self.sql.push_str(op.sql());
                    self.sql.push(' ');
                    self.push_value(value);
                }
            }
        }

        if !query.orders.is_empty() {
            self.sql.push_str(" ORDER BY ");
            for (i, order) in query.orders.iter().enumerate() {
                if i > 0 {
                    self.sql.push_str(", ");
                }
                self.write_ident(&order.column);
                self.sql.push(' ');
                self.sql.push_str(order.direction.keyword());
            }
        }

        if query.limit.is_some() || query.offset.is_some() {
            let mut clause = String::new();
            self.grammar
                .write_pagination(query.limit, query.offset, &mut clause);
            if !clause.is_empty() {
                self.sql.push(' ');
                self.sql.push_str(&clause);
            }
        }

        Ok(())
    }

    fn select_list(&mut self, query: &Query) {
        if let Some(aggregate) = &query.aggregate {
            self.aggregate_expr(aggregate);
            return;
        }
        if query.columns.is_empty() {
            self.sql.push('*');
            return;
        }
        for (i, column) in query.columns.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            match column {
                SelectColumn::Column(ident) => self.write_ident(ident),
                SelectColumn::Raw(expr) => self.sql.push_str(expr),
            }
        }
    }

    fn aggregate_expr(&mut self, aggregate: &Aggregate) {
        self.sql.push_str(aggregate.function.keyword());
        self.sql.push('(');
        match &aggregate.target {
            AggregateTarget::Star => self.sql.push('*'),
            AggregateTarget::Column(ident) => self.write_ident(ident),
        }
        self.sql.push_str(") AS ");
        self.sql.push_str(aggregate.function.alias());
    }

    // ==================== Mutations ====================

    fn insert(&mut self, table: &Ident, assignments: &[(Ident, Value)]) -> QueryResult<()> {
        if assignments.is_empty() {
            return Err(QueryError::structural(
                "INSERT requires at least one column",
            ));
        }
        self.sql.push_str("INSERT INTO ");
        self.write_ident(table);
        self.sql.push_str(" (");
        for (i, (column, _)) in assignments.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.write_ident(column);
        }
        self.sql.push_str(") VALUES (");
        for (i, (_, value)) in assignments.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.push_value(value);
        }
        self.sql.push(')');
        Ok(())
    }

    fn update(
        &mut self,
        query: &Query,
        table: &Ident,
        assignments: &[(Ident, Value)],
    ) -> QueryResult<()> {
        if assignments.is_empty() {
            return Err(QueryError::structural(
                "UPDATE requires at least one assignment",
            ));
        }
        self.sql.push_str("UPDATE ");
        self.write_ident(table);
        self.sql.push_str(" SET ");
        for (i, (column, value)) in assignments.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.write_ident(column);
            self.sql.push_str(" = ");
            self.push_value(value);
        }
        self.where_clause(&query.wheres)
    }

    fn delete(&mut self, query: &Query, table: &Ident) -> QueryResult<()> {
        self.sql.push_str("DELETE FROM ");
        self.write_ident(table);
        if query.wheres.is_renderable() {
            self.where_clause(&query.wheres)
        } else {
            // No conditions: compile to a no-op unless delete-all was opted in.
            if !query.allow_delete_all {
                self.sql.push_str(" WHERE 1=0");
            }
            Ok(())
        }
    }

    fn crement(
        &mut self,
        query: &Query,
        table: &Ident,
        column: &Ident,
        step: u64,
        sign: char,
    ) -> QueryResult<()> {
        self.sql.push_str("UPDATE ");
        self.write_ident(table);
        self.sql.push_str(" SET ");
        self.write_ident(column);
        self.sql.push_str(" = ");
        self.write_ident(column);
        let _ = write!(self.sql, " {sign} {step}");
        self.where_clause(&query.wheres)
    }

    // ==================== WHERE tree ====================

    fn where_clause(&mut self, wheres: &ConditionList) -> QueryResult<()> {
        if !wheres.is_renderable() {
            return Ok(());
        }
        self.sql.push_str(" WHERE ");
        self.condition_list(wheres)
    }

    fn condition_list(&mut self, list: &ConditionList) -> QueryResult<()> {
        let mut first = true;
        for node in list.nodes() {
            if let Condition::Group(inner) = &node.condition {
                if !inner.is_renderable() {
                    continue;
                }
            }
            if !first {
                self.sql.push(' ');
                self.sql.push_str(node.connector.keyword());
                self.sql.push(' ');
            }
            first = false;
            self.condition(&node.condition)?;
        }
        Ok(())
    }

    fn condition(&mut self, condition: &Condition) -> QueryResult<()> {
        match condition {
            Condition::Basic { column, op, value } => {
                self.write_ident(column);
                self.sql.push(' ');
                self.sql.push_str(op.sql());
                self.sql.push(' ');
                self.push_value(value);
            }
            Condition::ColumnCompare { left, op, right } => {
                self.write_ident(left);
                self.sql.push(' ');
                self.sql.push_str(op.sql());
                self.sql.push(' ');
                self.write_ident(right);
            }
            Condition::Null { column, negated } => {
                self.write_ident(column);
                self.sql
                    .push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Condition::In {
                column,
                values,
                negated,
            } => {
                if values.is_empty() {
                    // IN () is invalid SQL; match nothing (everything when negated).
                    self.sql.push_str(if *negated { "1=1" } else { "1=0" });
                    return Ok(());
                }
                self.write_ident(column);
                self.sql
                    .push_str(if *negated { " NOT IN (" } else { " IN (" });
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.sql.push_str(", ");
                    }
                    self.push_value(value);
                }
                self.sql.push(')');
            }
            Condition::Like {
                column,
                pattern,
                negated,
            } => {
                self.write_ident(column);
                self.sql
                    .push_str(if *negated { " NOT LIKE " } else { " LIKE " });
                self.push_value(pattern);
            }
            Condition::Between {
                column,
                low,
                high,
                negated,
            } => {
                self.write_ident(column);
                self.sql
                    .push_str(if *negated { " NOT BETWEEN " } else { " BETWEEN " });
                self.push_value(low);
                self.sql.push_str(" AND ");
                self.push_value(high);
            }
            Condition::Raw { sql, bindings } => self.raw_fragment(sql, bindings)?,
            Condition::Group(inner) => {
                self.sql.push('(');
                self.condition_list(inner)?;
                self.sql.push(')');
            }
            Condition::Exists { query, negated } => {
                if !matches!(query.kind, StatementKind::Select) {
                    return Err(QueryError::structural("EXISTS subquery must be a SELECT"));
                }
                self.sql
                    .push_str(if *negated { "NOT EXISTS (" } else { "EXISTS (" });
                self.statement(query)?;
                self.sql.push(')');
            }
        }
        Ok(())
    }

    /// Splice a trusted fragment, rewriting its `?` placeholders to the
    /// grammar's placeholder style and appending its bindings positionally.
    fn raw_fragment(&mut self, fragment: &str, bindings: &[Value]) -> QueryResult<()> {
        let expected = fragment.chars().filter(|&c| c == '?').count();
        if expected != bindings.len() {
            return Err(QueryError::BindingMismatch {
                expected,
                supplied: bindings.len(),
            });
        }
        let mut next = bindings.iter();
        for ch in fragment.chars() {
            if ch == '?' {
                // Count check above guarantees the iterator is non-empty here.
                if let Some(value) = next.next() {
                    self.push_value(value);
                }
            } else {
                self.sql.push(ch);
            }
        }
        Ok(())
    }

    // ==================== Emission helpers ====================

    fn write_ident(&mut self, ident: &Ident) {
        ident.write_sql(self.grammar.quote_char(), &mut self.sql);
    }

    fn push_value(&mut self, value: &Value) {
        match self.mode {
            BindMode::Qmark => {
                self.bindings.push(value.clone());
                self.grammar
                    .write_placeholder(self.bindings.len(), &mut self.sql);
            }
            BindMode::Literal => self.write_literal(value),
        }
    }

    fn write_literal(&mut self, value: &Value) {
        match value {
            Value::Null => self.sql.push_str("NULL"),
            Value::Bool(b) => self.sql.push_str(self.grammar.boolean(*b)),
            Value::Int(i) => {
                let _ = write!(self.sql, "{i}");
            }
            Value::Float(f) => {
                let _ = write!(self.sql, "{f}");
            }
            Value::Text(s) => self.write_quoted_text(s),
            Value::DateTime(ts) => {
                let rendered = ts.format("%Y-%m-%d %H:%M:%S").to_string();
                self.write_quoted_text(&rendered);
            }
            Value::Uuid(id) => {
                let rendered = id.to_string();
                self.write_quoted_text(&rendered);
            }
        }
    }

    fn write_quoted_text(&mut self, text: &str) {
        self.sql.push('\'');
        for ch in text.chars() {
            if ch == '\'' {
                self.sql.push('\'');
            }
            self.sql.push(ch);
        }
        self.sql.push('\'');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::table;

    #[test]
    fn unknown_dialect_is_rejected() {
        let err = grammar_for("oracle").unwrap_err();
        assert!(matches!(err, QueryError::UnknownDialect(name) if name == "oracle"));
    }

    #[test]
    fn registry_covers_all_dialects() {
        for name in ["mysql", "postgres", "postgresql", "sqlite"] {
            assert!(grammar_for(name).is_ok(), "missing grammar for {name}");
        }
    }

    #[test]
    fn literal_text_escapes_quotes() {
        let sql = table("users")
            .where_eq("name", "O'Brien")
            .to_sql()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE name = 'O''Brien'");
    }

    #[test]
    fn literal_null_and_numbers() {
        let sql = table("users")
            .where_cmp("score", ">", 1.5)
            .where_eq("deleted", Option::<i64>::None)
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM users WHERE score > 1.5 AND deleted = NULL"
        );
    }

    #[test]
    fn raw_fragment_binding_mismatch_is_compile_time() {
        let err = table("users")
            .where_raw_bound("a = ? OR b = ?", vec![1i64])
            .to_qmark()
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::BindingMismatch {
                expected: 2,
                supplied: 1
            }
        ));
    }

    #[test]
    fn compilation_is_deterministic() {
        let build = || {
            table("users")
                .where_eq("status", "active")
                .where_in("role", vec!["admin", "user"])
                .order_by("id")
                .limit(10)
        };
        let a = build().to_qmark().unwrap();
        let b = build().to_qmark().unwrap();
        assert_eq!(a.sql, b.sql);
        assert_eq!(a.bindings, b.bindings);
    }
}
