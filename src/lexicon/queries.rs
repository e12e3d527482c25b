//! SQL issued against the `words` table
//!
//! Case-insensitive matching goes through `unicode_lower` and the
//! `UNICODE_NOCASE` collation registered by the worker, so Cyrillic folds
//! the same way ASCII does. Every LIKE pattern is escaped with `\`.

/// Cap on list-style results
pub const LIST_LIMIT: i64 = 10_000;
/// Cap on similar-form samples
pub const SIMILAR_LIMIT: i64 = 8;
/// Default number of search suggestions
pub const DEFAULT_SUGGESTION_LIMIT: usize = 10;
/// Largest `IN (...)` list sent in one query
pub const BATCH_CHUNK: usize = 500;

pub const COUNT_FORMS: &str = "SELECT COUNT(*) AS cnt FROM words";

pub const ROWID_BOUNDS: &str = "SELECT MIN(rowid) AS min_id, MAX(rowid) AS max_id FROM words";

pub const FORM_AT_OR_AFTER: &str =
    "SELECT form FROM words WHERE rowid >= ?1 ORDER BY rowid LIMIT 1";

pub const WORD_BY_FORM: &str =
    "SELECT form, lemma, tag FROM words WHERE form = ?1 ORDER BY rowid LIMIT 1";

pub const WORD_BY_FORM_NOCASE: &str = r"SELECT form, lemma, tag FROM words
    WHERE unicode_lower(form) = ?1
    ORDER BY rowid
    LIMIT 1";

/// `?1` = escaped pattern, `?2` = limit
pub const WORDS_MATCHING: &str = r"SELECT form, lemma, tag FROM words
    WHERE unicode_lower(form) LIKE ?1 ESCAPE '\'
    ORDER BY form COLLATE UNICODE_NOCASE, form
    LIMIT ?2";

/// `?1` = prefix pattern, `?2` = limit
pub const SUGGEST_PREFIX: &str = r"SELECT DISTINCT form FROM words
    WHERE unicode_lower(form) LIKE ?1 ESCAPE '\'
    ORDER BY form COLLATE UNICODE_NOCASE, form
    LIMIT ?2";

/// `?1` = contains pattern, `?2` = prefix pattern to exclude, `?3` = limit
pub const SUGGEST_CONTAINS: &str = r"SELECT DISTINCT form FROM words
    WHERE unicode_lower(form) LIKE ?1 ESCAPE '\'
      AND unicode_lower(form) NOT LIKE ?2 ESCAPE '\'
    ORDER BY form COLLATE UNICODE_NOCASE, form
    LIMIT ?3";

pub const SIMILAR_FORMS: &str = r"SELECT DISTINCT form FROM words
    WHERE lemma = ?1 AND form != ?2
    ORDER BY RANDOM()
    LIMIT ?3";

/// Exact-match query for `count` forms
pub fn words_by_forms(count: usize) -> String {
    let placeholders = (1..=count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "SELECT form, lemma, tag FROM words WHERE form IN ({}) ORDER BY form COLLATE UNICODE_NOCASE, form",
        placeholders
    )
}

/// Escape LIKE wildcards so the term matches literally
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `term%`, lowercased
pub fn prefix_pattern(term: &str) -> String {
    format!("{}%", escape_like(&term.to_lowercase()))
}

/// `%term%`, lowercased
pub fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like(&term.to_lowercase()))
}

/// Order used for merged batch results
pub fn nocase_cmp(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("куќа"), "куќа");
    }

    #[test]
    fn test_patterns_are_lowercased() {
        assert_eq!(prefix_pattern("Ку"), "ку%");
        assert_eq!(contains_pattern("ЌА"), "%ќа%");
    }

    #[test]
    fn test_batch_placeholders() {
        assert_eq!(
            words_by_forms(3),
            "SELECT form, lemma, tag FROM words WHERE form IN (?1,?2,?3) ORDER BY form COLLATE UNICODE_NOCASE, form"
        );
    }

    #[test]
    fn test_nocase_cmp() {
        use std::cmp::Ordering;
        assert_eq!(nocase_cmp("Ана", "ана"), Ordering::Less);
        assert_eq!(nocase_cmp("ана", "Банана"), Ordering::Less);
    }
}
