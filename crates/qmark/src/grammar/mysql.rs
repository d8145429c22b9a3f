//! MySQL grammar: backtick quoting, positional `?` placeholders.

use std::fmt::Write;

use super::Grammar;

/// Grammar for MySQL / MariaDB.
pub struct MysqlGrammar;

impl Grammar for MysqlGrammar {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_char(&self) -> char {
        '`'
    }

    fn write_placeholder(&self, _position: usize, out: &mut String) {
        out.push('?');
    }

    fn boolean(&self, value: bool) -> &'static str {
        if value { "1" } else { "0" }
    }

    fn write_pagination(&self, limit: Option<u64>, offset: Option<u64>, out: &mut String) {
        match (limit, offset) {
            (Some(limit), Some(offset)) => {
                let _ = write!(out, "LIMIT {limit} OFFSET {offset}");
            }
            (Some(limit), None) => {
                let _ = write!(out, "LIMIT {limit}");
            }
            // MySQL has no bare OFFSET; the documented idiom is a maximal LIMIT.
            (None, Some(offset)) => {
                let _ = write!(out, "LIMIT 18446744073709551615 OFFSET {offset}");
            }
            (None, None) => {}
        }
    }
}
