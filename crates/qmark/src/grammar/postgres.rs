//! PostgreSQL grammar: double-quote quoting, numbered `$n` placeholders.

use std::fmt::Write;

use super::Grammar;

/// Grammar for PostgreSQL.
pub struct PostgresGrammar;

impl Grammar for PostgresGrammar {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_char(&self) -> char {
        '"'
    }

    fn write_placeholder(&self, position: usize, out: &mut String) {
        let _ = write!(out, "${position}");
    }

    fn boolean(&self, value: bool) -> &'static str {
        if value { "TRUE" } else { "FALSE" }
    }

    fn write_pagination(&self, limit: Option<u64>, offset: Option<u64>, out: &mut String) {
        match (limit, offset) {
            (Some(limit), Some(offset)) => {
                let _ = write!(out, "LIMIT {limit} OFFSET {offset}");
            }
            (Some(limit), None) => {
                let _ = write!(out, "LIMIT {limit}");
            }
            (None, Some(offset)) => {
                let _ = write!(out, "OFFSET {offset}");
            }
            (None, None) => {}
        }
    }
}
