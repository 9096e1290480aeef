// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Text transforms used by dialect paging.
//!
//! These operate on SELECT statements produced by the statement compiler
//! and are not a general SQL parser. A small scanner tracks parenthesis
//! depth and quoted regions (`'...'`, `"..."`, `` `...` ``, `[...]`) so
//! that keywords inside subqueries, literals and identifiers are ignored.
//!
//! | Transform | Result |
//! |-----------|--------|
//! | [`split_order_by`] | statement without its trailing top-level `ORDER BY`, and that clause |
//! | [`is_select_distinct`] | leading `SELECT DISTINCT` |
//! | [`strip_select`] | text after `SELECT` (and `DISTINCT`) |
//! | [`has_unaliased_star`] | top-level projection contains a bare `*` |

/// A SELECT statement prepared for paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlPageStatement {
    sql:            String,
    select_removed: String,
    order_by:       Option<String>
}

impl SqlPageStatement {
    /// Split `sql` into its body and trailing `ORDER BY`.
    pub fn parse(sql: &str) -> Self {
        let trimmed = sql.trim().trim_end_matches(';').trim_end();
        let (body, order_by) = split_order_by(trimmed);
        Self {
            sql: trimmed.to_string(),
            select_removed: body.to_string(),
            order_by: order_by.map(str::to_string)
        }
    }

    /// The statement as given, without a trailing `;`.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The statement without its trailing `ORDER BY`.
    #[must_use]
    pub fn select_removed(&self) -> &str {
        &self.select_removed
    }

    /// The trailing `ORDER BY ...` clause, keyword included.
    #[must_use]
    pub fn order_by(&self) -> Option<&str> {
        self.order_by.as_deref()
    }

    #[must_use]
    pub fn is_distinct(&self) -> bool {
        is_select_distinct(&self.select_removed)
    }

    #[must_use]
    pub fn has_unaliased_star(&self) -> bool {
        has_unaliased_star(&self.select_removed)
    }
}

/// Scanner state over one statement.
struct Scanner<'a> {
    bytes: &'a [u8],
    pos:   usize,
    depth: usize
}

impl<'a> Scanner<'a> {
    fn new(sql: &'a str) -> Self {
        Self {
            bytes: sql.as_bytes(),
            pos:   0,
            depth: 0
        }
    }

    /// Advance over one token-ish unit; returns `(start, depth_before)` of
    /// an unquoted byte, or `None` for skipped quoted regions.
    fn step(&mut self) -> Option<Option<(usize, usize)>> {
        let b = *self.bytes.get(self.pos)?;
        let start = self.pos;
        let closing = match b {
            b'\'' => Some(b'\''),
            b'"' => Some(b'"'),
            b'`' => Some(b'`'),
            b'[' => Some(b']'),
            _ => None
        };
        if let Some(close) = closing {
            self.pos += 1;
            while let Some(&c) = self.bytes.get(self.pos) {
                self.pos += 1;
                if c == close {
                    // doubled quote is an escape
                    if self.bytes.get(self.pos) == Some(&close) && close != b']' {
                        self.pos += 1;
                        continue;
                    }
                    break;
                }
            }
            return Some(None);
        }
        let depth = self.depth;
        match b {
            b'(' => self.depth += 1,
            b')' => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }
        self.pos += 1;
        Some(Some((start, depth)))
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'@' || b == b'$' || b == b'#'
}

/// Whether `keyword` starts at `at` as a whole word.
fn keyword_at(sql: &str, at: usize, keyword: &str) -> bool {
    let bytes = sql.as_bytes();
    let end = at + keyword.len();
    if end > bytes.len() || !bytes[at..end].eq_ignore_ascii_case(keyword.as_bytes()) {
        return false;
    }
    let before_ok = at == 0 || !is_word_byte(bytes[at - 1]);
    let after_ok = end == bytes.len() || !is_word_byte(bytes[end]);
    before_ok && after_ok
}

/// Byte offsets of every top-level occurrence of `keyword`.
fn top_level_keywords(sql: &str, keyword: &str) -> Vec<usize> {
    let mut scanner = Scanner::new(sql);
    let mut found = Vec::new();
    while let Some(step) = scanner.step() {
        if let Some((start, 0)) = step
            && keyword_at(sql, start, keyword)
        {
            found.push(start);
        }
    }
    found
}

/// Position of `ORDER` in a top-level `ORDER BY` (any whitespace between).
fn order_by_positions(sql: &str) -> Vec<usize> {
    top_level_keywords(sql, "ORDER")
        .into_iter()
        .filter(|&at| {
            let rest = sql[at + "ORDER".len()..].trim_start();
            let offset = sql.len() - rest.len();
            keyword_at(sql, offset, "BY")
        })
        .collect()
}

/// Split a statement into its body and trailing top-level `ORDER BY`.
///
/// An `ORDER BY` inside a subquery or window clause is left alone.
///
/// ```rust
/// use entity_sql_core::paging::split_order_by;
///
/// let (body, order) = split_order_by("SELECT a FROM t ORDER BY a DESC");
/// assert_eq!(body, "SELECT a FROM t");
/// assert_eq!(order, Some("ORDER BY a DESC"));
/// ```
pub fn split_order_by(sql: &str) -> (&str, Option<&str>) {
    match order_by_positions(sql).last() {
        Some(&at) => (sql[..at].trim_end(), Some(sql[at..].trim())),
        None => (sql, None)
    }
}

/// Whether the statement starts with `SELECT DISTINCT`.
pub fn is_select_distinct(sql: &str) -> bool {
    let sql = sql.trim_start();
    if !keyword_at(sql, 0, "SELECT") {
        return false;
    }
    let rest = sql["SELECT".len()..].trim_start();
    keyword_at(rest, 0, "DISTINCT")
}

/// Text after the leading `SELECT` (and `DISTINCT` when `keep_distinct` is
/// false). Returns the input unchanged when it is not a SELECT.
pub fn strip_select(sql: &str, keep_distinct: bool) -> &str {
    let sql = sql.trim_start();
    if !keyword_at(sql, 0, "SELECT") {
        return sql;
    }
    let rest = sql["SELECT".len()..].trim_start();
    if !keep_distinct && keyword_at(rest, 0, "DISTINCT") {
        return rest["DISTINCT".len()..].trim_start();
    }
    rest
}

/// Whether the top-level projection contains a bare `*` item.
///
/// `t0.*` and `COUNT(*)` are not bare.
pub fn has_unaliased_star(sql: &str) -> bool {
    let projection = strip_select(sql, false);
    let end = top_level_keywords(projection, "FROM")
        .first()
        .copied()
        .unwrap_or(projection.len());
    split_top_level(&projection[..end], b',')
        .iter()
        .any(|item| item.trim() == "*")
}

/// Split on a separator at depth zero, outside quotes.
fn split_top_level(text: &str, separator: u8) -> Vec<&str> {
    let mut scanner = Scanner::new(text);
    let mut parts = Vec::new();
    let mut last = 0;
    while let Some(step) = scanner.step() {
        if let Some((at, 0)) = step
            && text.as_bytes()[at] == separator
        {
            parts.push(&text[last..at]);
            last = at + 1;
        }
    }
    parts.push(&text[last..]);
    parts
}

/// Drop table qualifiers from each `ORDER BY` term (`t0.[Name] DESC` ->
/// `[Name] DESC`), for ordering over a derived table.
pub fn unqualify_order_by(order_by: &str) -> String {
    let mut terms = order_by.trim();
    if keyword_at(terms, 0, "ORDER") {
        terms = terms["ORDER".len()..].trim_start();
        if keyword_at(terms, 0, "BY") {
            terms = &terms["BY".len()..];
        }
    }
    let terms: Vec<String> = split_top_level(terms, b',')
        .into_iter()
        .map(|term| {
            let term = term.trim();
            let mut scanner = Scanner::new(term);
            let mut cut = 0;
            while let Some(step) = scanner.step() {
                match step {
                    Some((at, 0)) if term.as_bytes()[at] == b'.' => cut = at + 1,
                    Some((at, _)) if term.as_bytes()[at] == b' ' => break,
                    _ => {}
                }
            }
            term[cut..].to_string()
        })
        .collect();
    format!("ORDER BY {}", terms.join(", "))
}
