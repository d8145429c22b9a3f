//! SQLite grammar: double-quote quoting, positional `?` placeholders.

use std::fmt::Write;

use super::Grammar;

/// Grammar for SQLite.
pub struct SqliteGrammar;

impl Grammar for SqliteGrammar {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_char(&self) -> char {
        '"'
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
            // SQLite spells "no limit" as a negative LIMIT.
            (None, Some(offset)) => {
                let _ = write!(out, "LIMIT -1 OFFSET {offset}");
            }
            (None, None) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::table;

    #[test]
    fn bare_offset_uses_negative_limit() {
        let sql = table("users")
            .dialect("sqlite")
            .offset(15)
            .to_sql()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users LIMIT -1 OFFSET 15");
    }

    #[test]
    fn placeholders_are_question_marks() {
        let compiled = table("users")
            .dialect("sqlite")
            .where_eq("id", 3i64)
            .to_qmark()
            .unwrap();
        assert_eq!(compiled.sql, "SELECT * FROM users WHERE id = ?");
        assert_eq!(compiled.bindings.len(), 1);
    }
}
