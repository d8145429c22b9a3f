//! The expression tree backing WHERE clauses.
//!
//! A filter is an ordered list of [`ConditionNode`]s; each node carries the
//! connector (`AND`/`OR`) joining it to its left sibling, and nesting happens
//! through [`Condition::Group`] and [`Condition::Exists`]. Traversal order
//! equals insertion order, and insertion order is the sole determinant of
//! binding order in the compiled output — the tree never inlines a value
//! into a string.

use crate::error::{QueryError, QueryResult};
use crate::ident::Ident;
use crate::query::Query;
use crate::value::Value;

/// Connector between a condition and its left sibling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    /// SQL keyword for this connector.
    pub fn keyword(self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

/// Comparison operator for basic and column-to-column conditions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl CmpOp {
    /// Parse an operator token.
    ///
    /// Accepts `=`, `!=` (or `<>`), `>`, `<`, `>=`, `<=`; anything else is
    /// [`QueryError::UnsupportedOperator`].
    pub fn parse(op: &str) -> QueryResult<Self> {
        match op {
            "=" => Ok(CmpOp::Eq),
            "!=" | "<>" => Ok(CmpOp::Ne),
            ">" => Ok(CmpOp::Gt),
            "<" => Ok(CmpOp::Lt),
            ">=" => Ok(CmpOp::Ge),
            "<=" => Ok(CmpOp::Le),
            other => Err(QueryError::UnsupportedOperator(other.to_string())),
        }
    }

    /// SQL spelling of this operator.
    pub fn sql(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "!=",
            CmpOp::Gt => ">",
            CmpOp::Lt => "<",
            CmpOp::Ge => ">=",
            CmpOp::Le => "<=",
        }
    }
}

/// One condition in the tree.
#[derive(Clone, Debug)]
pub enum Condition {
    /// `column op value`
    Basic {
        column: Ident,
        op: CmpOp,
        value: Value,
    },
    /// `left op right` — compares two columns, binds nothing.
    ColumnCompare {
        left: Ident,
        op: CmpOp,
        right: Ident,
    },
    /// `column IS [NOT] NULL`
    Null { column: Ident, negated: bool },
    /// `column [NOT] IN (...)` — an empty list compiles to a condition that
    /// matches no rows (all rows when negated), never to invalid SQL.
    In {
        column: Ident,
        values: Vec<Value>,
        negated: bool,
    },
    /// `column [NOT] LIKE pattern`
    Like {
        column: Ident,
        pattern: Value,
        negated: bool,
    },
    /// `column [NOT] BETWEEN low AND high`
    Between {
        column: Ident,
        low: Value,
        high: Value,
        negated: bool,
    },
    /// Trusted SQL fragment with `?` placeholders and matching bindings.
    Raw { sql: String, bindings: Vec<Value> },
    /// Parenthesized sub-tree built by a callback.
    Group(ConditionList),
    /// `[NOT] EXISTS (subquery)`
    Exists { query: Box<Query>, negated: bool },
}

/// A condition plus its connector to the left sibling.
///
/// The first node's connector is never rendered.
#[derive(Clone, Debug)]
pub struct ConditionNode {
    pub connector: Connector,
    pub condition: Condition,
}

/// Ordered list of conditions forming one level of the tree.
#[derive(Clone, Debug, Default)]
pub struct ConditionList {
    nodes: Vec<ConditionNode>,
}

impl ConditionList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a condition with its connector.
    pub fn push(&mut self, connector: Connector, condition: Condition) {
        self.nodes.push(ConditionNode {
            connector,
            condition,
        });
    }

    /// The nodes in insertion order.
    pub fn nodes(&self) -> &[ConditionNode] {
        &self.nodes
    }

    /// True when no conditions were appended.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True when the list renders at least one SQL fragment.
    ///
    /// Groups produced by a callback that added nothing are skipped at
    /// compile time, so a list of only-empty groups renders nothing.
    pub fn is_renderable(&self) -> bool {
        self.nodes.iter().any(|node| match &node.condition {
            Condition::Group(inner) => inner.is_renderable(),
            _ => true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_parsing() {
        assert_eq!(CmpOp::parse("=").unwrap(), CmpOp::Eq);
        assert_eq!(CmpOp::parse("!=").unwrap(), CmpOp::Ne);
        assert_eq!(CmpOp::parse("<>").unwrap(), CmpOp::Ne);
        assert_eq!(CmpOp::parse(">=").unwrap(), CmpOp::Ge);
        assert!(matches!(
            CmpOp::parse("LIKE"),
            Err(QueryError::UnsupportedOperator(op)) if op == "LIKE"
        ));
        assert!(CmpOp::parse("== ").is_err());
    }

    #[test]
    fn connector_keywords() {
        assert_eq!(Connector::And.keyword(), "AND");
        assert_eq!(Connector::Or.keyword(), "OR");
    }

    #[test]
    fn list_preserves_insertion_order() {
        let mut list = ConditionList::new();
        for name in ["a", "b", "c"] {
            list.push(
                Connector::And,
                Condition::Null {
                    column: Ident::parse(name).unwrap(),
                    negated: false,
                },
            );
        }
        let cols: Vec<String> = list
            .nodes()
            .iter()
            .map(|n| match &n.condition {
                Condition::Null { column, .. } => column.to_sql('"'),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(cols, ["a", "b", "c"]);
    }

    #[test]
    fn empty_groups_are_not_renderable() {
        let mut list = ConditionList::new();
        list.push(Connector::And, Condition::Group(ConditionList::new()));
        assert!(!list.is_empty());
        assert!(!list.is_renderable());
    }
}
