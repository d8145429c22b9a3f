//! Safe SQL identifier handling.
//!
//! [`Ident`] represents a table or column reference, supporting dotted
//! notation (`schema.table.column`) and quoted segments (`"Camel Case".id`).
//! Unquoted segments must match `[A-Za-z_][A-Za-z0-9_$]*`; quoted segments
//! allow anything except NUL. Parsing is dialect-independent; rendering takes
//! the active grammar's quote character, so the same identifier prints with
//! backticks under MySQL and double quotes under PostgreSQL or SQLite.

use crate::error::{QueryError, QueryResult};

/// One dot-separated segment of an identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// Validated bare name, rendered as-is.
    Bare(String),
    /// Quoted name, rendered wrapped in the grammar's quote character.
    Quoted(String),
}

/// A SQL identifier (column, table, or schema name).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ident {
    segments: Vec<Segment>,
}

impl Ident {
    /// Parse an identifier, accepting dotted and `"`-quoted forms.
    pub fn parse(raw: &str) -> QueryResult<Self> {
        if raw.is_empty() {
            return Err(QueryError::structural("identifier cannot be empty"));
        }
        if raw.contains('\0') {
            return Err(QueryError::structural(
                "identifier cannot contain a NUL character",
            ));
        }

        let mut segments = Vec::new();
        let mut chars = raw.chars().peekable();
        loop {
            segments.push(Self::parse_segment(raw, &mut chars)?);
            match chars.next() {
                None => break,
                Some('.') => {
                    if chars.peek().is_none() {
                        return Err(QueryError::structural(format!(
                            "identifier {raw:?} has a trailing '.'"
                        )));
                    }
                }
                Some(c) => {
                    return Err(QueryError::structural(format!(
                        "unexpected {c:?} in identifier {raw:?}"
                    )));
                }
            }
        }
        Ok(Self { segments })
    }

    fn parse_segment(
        raw: &str,
        chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    ) -> QueryResult<Segment> {
        if chars.peek() == Some(&'"') {
            chars.next();
            let mut name = String::new();
            loop {
                match chars.next() {
                    Some('"') if chars.peek() == Some(&'"') => {
                        chars.next();
                        name.push('"');
                    }
                    Some('"') => break,
                    Some(c) => name.push(c),
                    None => {
                        return Err(QueryError::structural(format!(
                            "unclosed quote in identifier {raw:?}"
                        )));
                    }
                }
            }
            if name.is_empty() {
                return Err(QueryError::structural(format!(
                    "empty quoted segment in identifier {raw:?}"
                )));
            }
            return Ok(Segment::Quoted(name));
        }

        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if c == '.' {
                break;
            }
            let ok = if name.is_empty() {
                c == '_' || c.is_ascii_alphabetic()
            } else {
                c == '_' || c == '$' || c.is_ascii_alphanumeric()
            };
            if !ok {
                return Err(QueryError::structural(format!(
                    "invalid character {c:?} in identifier {raw:?}"
                )));
            }
            name.push(c);
            chars.next();
        }
        if name.is_empty() {
            return Err(QueryError::structural(format!(
                "empty segment in identifier {raw:?}"
            )));
        }
        Ok(Segment::Bare(name))
    }

    /// Render the identifier into `out` using the given quote character.
    ///
    /// Embedded quote characters inside quoted segments are doubled, per the
    /// quoting rule shared by all supported dialects.
    pub fn write_sql(&self, quote: char, out: &mut String) {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match segment {
                Segment::Bare(name) => out.push_str(name),
                Segment::Quoted(name) => {
                    out.push(quote);
                    for ch in name.chars() {
                        if ch == quote {
                            out.push(quote);
                        }
                        out.push(ch);
                    }
                    out.push(quote);
                }
            }
        }
    }

    /// Render the identifier with the given quote character.
    pub fn to_sql(&self, quote: char) -> String {
        let mut out = String::new();
        self.write_sql(quote, &mut out);
        out
    }

    /// The dot-separated segments of this identifier.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_and_dotted() {
        assert_eq!(Ident::parse("users").unwrap().to_sql('"'), "users");
        assert_eq!(
            Ident::parse("public.users").unwrap().to_sql('"'),
            "public.users"
        );
        assert_eq!(
            Ident::parse("s.t.column_1$").unwrap().to_sql('"'),
            "s.t.column_1$"
        );
    }

    #[test]
    fn quoted_renders_with_dialect_quote() {
        let ident = Ident::parse(r#""Camel Case".id"#).unwrap();
        assert_eq!(ident.to_sql('"'), r#""Camel Case".id"#);
        assert_eq!(ident.to_sql('`'), "`Camel Case`.id");
    }

    #[test]
    fn quote_char_inside_quoted_segment_is_doubled() {
        let ident = Ident::parse(r#""has""quote""#).unwrap();
        assert_eq!(ident.to_sql('"'), r#""has""quote""#);
        // Under backtick quoting the embedded `"` needs no doubling.
        assert_eq!(ident.to_sql('`'), "`has\"quote`");
    }

    #[test]
    fn rejects_malformed() {
        assert!(Ident::parse("").is_err());
        assert!(Ident::parse("1table").is_err());
        assert!(Ident::parse("my table").is_err());
        assert!(Ident::parse("a..b").is_err());
        assert!(Ident::parse("a.").is_err());
        assert!(Ident::parse(r#""open"#).is_err());
        assert!(Ident::parse("a;drop").is_err());
    }
}
