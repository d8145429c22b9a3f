//! The mutable representation of one statement.
//!
//! A [`Query`] is owned and mutated by exactly one
//! [`QueryBuilder`](crate::builder::QueryBuilder) and read by the grammar
//! compiler. It records everything in insertion order; nothing here knows
//! about dialects.

use crate::expr::{CmpOp, ConditionList};
use crate::ident::Ident;
use crate::value::Value;

/// One entry in the select list.
#[derive(Clone, Debug)]
pub enum SelectColumn {
    /// Validated column reference, quoted per dialect rules.
    Column(Ident),
    /// Raw expression, rendered verbatim.
    Raw(String),
}

/// Join flavor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

/// One join clause: `KIND table ON left op right`.
#[derive(Clone, Debug)]
pub struct Join {
    pub table: Ident,
    pub left: Ident,
    pub op: CmpOp,
    pub right: Ident,
    pub kind: JoinKind,
}

/// Sort direction for ORDER BY entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn keyword(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One ORDER BY entry.
#[derive(Clone, Debug)]
pub struct OrderBy {
    pub column: Ident,
    pub direction: Direction,
}

/// One HAVING entry: a column with an optional comparison threshold.
#[derive(Clone, Debug)]
pub struct Having {
    pub column: Ident,
    pub threshold: Option<(CmpOp, Value)>,
}

/// Column-reducing function applied in the select list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregateFunction {
    Sum,
    Avg,
    Count,
    Max,
    Min,
}

impl AggregateFunction {
    pub fn keyword(self) -> &'static str {
        match self {
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Min => "MIN",
        }
    }

    /// Alias the aggregate expression is selected under.
    pub fn alias(self) -> &'static str {
        match self {
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Count => "count",
            AggregateFunction::Max => "max",
            AggregateFunction::Min => "min",
        }
    }
}

/// What an aggregate reduces over.
#[derive(Clone, Debug)]
pub enum AggregateTarget {
    /// `*` — only meaningful for COUNT.
    Star,
    Column(Ident),
}

/// Aggregate directive for the select list.
#[derive(Clone, Debug)]
pub struct Aggregate {
    pub function: AggregateFunction,
    pub target: AggregateTarget,
}

/// Statement tag with kind-specific payload.
#[derive(Clone, Debug)]
pub enum StatementKind {
    Select,
    /// Column → value assignments in insertion order.
    Insert(Vec<(Ident, Value)>),
    /// Column → value assignments in insertion order.
    Update(Vec<(Ident, Value)>),
    Delete,
    /// `SET column = column + step`
    Increment { column: Ident, step: u64 },
    /// `SET column = column - step`
    Decrement { column: Ident, step: u64 },
}

/// The full mutable representation of one statement.
#[derive(Clone, Debug)]
pub struct Query {
    pub(crate) table: Option<Ident>,
    pub(crate) connection: Option<String>,
    pub(crate) dialect: String,
    pub(crate) columns: Vec<SelectColumn>,
    pub(crate) distinct: bool,
    pub(crate) wheres: ConditionList,
    pub(crate) joins: Vec<Join>,
    pub(crate) groups: Vec<Ident>,
    pub(crate) havings: Vec<Having>,
    pub(crate) orders: Vec<OrderBy>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) aggregate: Option<Aggregate>,
    pub(crate) kind: StatementKind,
    pub(crate) allow_delete_all: bool,
}

impl Query {
    pub(crate) fn new(dialect: &str) -> Self {
        Self {
            table: None,
            connection: None,
            dialect: dialect.to_string(),
            columns: Vec::new(),
            distinct: false,
            wheres: ConditionList::new(),
            joins: Vec::new(),
            groups: Vec::new(),
            havings: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
            aggregate: None,
            kind: StatementKind::Select,
            allow_delete_all: false,
        }
    }

    /// True once any selection-affecting state has been chained.
    ///
    /// `all()` refuses to run on a refined builder; `get()` is the
    /// chained-execution path.
    pub(crate) fn is_refined(&self) -> bool {
        !self.columns.is_empty()
            || self.distinct
            || !self.wheres.is_empty()
            || !self.joins.is_empty()
            || !self.groups.is_empty()
            || !self.havings.is_empty()
            || !self.orders.is_empty()
            || self.limit.is_some()
            || self.offset.is_some()
            || self.aggregate.is_some()
            || !matches!(self.kind, StatementKind::Select)
    }

    /// Logical connection name handed to the execution collaborator.
    pub(crate) fn connection_name(&self) -> &str {
        self.connection.as_deref().unwrap_or("")
    }
}
