// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Optimistic revision counter.

/// Revision to write after `current`.
///
/// A row without a revision yet starts at `1`.
///
/// ```rust
/// use entity_sql_core::next_revision;
///
/// assert_eq!(next_revision(None), 1);
/// assert_eq!(next_revision(Some(7)), 8);
/// ```
#[must_use]
pub const fn next_revision(current: Option<i64>) -> i64 {
    match current {
        Some(r) => r.saturating_add(1),
        None => 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_one_and_increments() {
        assert_eq!(next_revision(None), 1);
        assert_eq!(next_revision(Some(0)), 1);
        assert_eq!(next_revision(Some(41)), 42);
        assert_eq!(next_revision(Some(i64::MAX)), i64::MAX);
    }
}
