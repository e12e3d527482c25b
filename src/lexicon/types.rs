//! Typed rows built from worker result sets
//!
//! Each record names the exact columns its query selects. A result set whose
//! columns differ is rejected instead of being zipped into the wrong fields.

use serde::{Deserialize, Serialize};
use std::vec::IntoIter;

use crate::bridge::{RawResultSet, Scalar};
use crate::error::{LexiconError, Result};

/// A row type with a fixed column list
pub trait Record: Sized {
    const COLUMNS: &'static [&'static str];

    /// Build from one row; `values` has exactly `COLUMNS.len()` cells
    fn from_values(values: Vec<Scalar>) -> Result<Self>;
}

impl RawResultSet {
    /// Shape every row into `R`, checking the column list first
    pub fn into_records<R: Record>(self) -> Result<Vec<R>> {
        if !self.columns.iter().map(String::as_str).eq(R::COLUMNS.iter().copied()) {
            return Err(LexiconError::Schema(format!(
                "expected columns {:?}, got {:?}",
                R::COLUMNS,
                self.columns
            )));
        }
        self.values.into_iter().map(R::from_values).collect()
    }
}

fn next_cell(cells: &mut IntoIter<Scalar>, column: &str) -> Result<Scalar> {
    cells
        .next()
        .ok_or_else(|| LexiconError::Schema(format!("row is missing column `{}`", column)))
}

fn text(cells: &mut IntoIter<Scalar>, column: &str) -> Result<String> {
    match next_cell(cells, column)? {
        Scalar::Text(s) => Ok(s),
        other => Err(LexiconError::Schema(format!(
            "column `{}` is not text: {:?}",
            column, other
        ))),
    }
}

fn optional_text(cells: &mut IntoIter<Scalar>, column: &str) -> Result<Option<String>> {
    match next_cell(cells, column)? {
        Scalar::Null => Ok(None),
        Scalar::Text(s) if s.is_empty() => Ok(None),
        Scalar::Text(s) => Ok(Some(s)),
        other => Err(LexiconError::Schema(format!(
            "column `{}` is not text: {:?}",
            column, other
        ))),
    }
}

fn optional_integer(cells: &mut IntoIter<Scalar>, column: &str) -> Result<Option<i64>> {
    match next_cell(cells, column)? {
        Scalar::Null => Ok(None),
        Scalar::Integer(i) => Ok(Some(i)),
        other => Err(LexiconError::Schema(format!(
            "column `{}` is not an integer: {:?}",
            column, other
        ))),
    }
}

/// One inflected form with its headword and morphological tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordForm {
    pub form: String,
    pub lemma: String,
    /// `None` when the row carries no annotation
    pub tag: Option<String>,
}

impl Record for WordForm {
    const COLUMNS: &'static [&'static str] = &["form", "lemma", "tag"];

    fn from_values(values: Vec<Scalar>) -> Result<Self> {
        let mut cells = values.into_iter();
        Ok(Self {
            form: text(&mut cells, "form")?,
            lemma: text(&mut cells, "lemma")?,
            tag: optional_text(&mut cells, "tag")?,
        })
    }
}

/// Just the surface form
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FormOnly(pub String);

impl Record for FormOnly {
    const COLUMNS: &'static [&'static str] = &["form"];

    fn from_values(values: Vec<Scalar>) -> Result<Self> {
        text(&mut values.into_iter(), "form").map(FormOnly)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FormCount(pub u64);

impl Record for FormCount {
    const COLUMNS: &'static [&'static str] = &["cnt"];

    fn from_values(values: Vec<Scalar>) -> Result<Self> {
        let count = optional_integer(&mut values.into_iter(), "cnt")?.unwrap_or(0);
        Ok(FormCount(count.max(0) as u64))
    }
}

/// Smallest and largest rowid; both `None` on an empty table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RowIdBounds {
    pub min_id: Option<i64>,
    pub max_id: Option<i64>,
}

impl RowIdBounds {
    pub fn range(self) -> Option<(i64, i64)> {
        match (self.min_id, self.max_id) {
            (Some(min), Some(max)) if min <= max => Some((min, max)),
            _ => None,
        }
    }
}

impl Record for RowIdBounds {
    const COLUMNS: &'static [&'static str] = &["min_id", "max_id"];

    fn from_values(values: Vec<Scalar>) -> Result<Self> {
        let mut cells = values.into_iter();
        Ok(Self {
            min_id: optional_integer(&mut cells, "min_id")?,
            max_id: optional_integer(&mut cells, "max_id")?,
        })
    }
}

/// Result of a free-text search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// The term is an existing form; show its details instead of a list
    Exact(WordForm),
    Matches(Vec<WordForm>),
}

/// Everything the details view shows for one form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordDetails {
    pub word: WordForm,
    /// Decoded tag, or the no-annotation sentinel
    pub description: String,
    pub similar: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_set(columns: &[&str], rows: Vec<Vec<Scalar>>) -> RawResultSet {
        RawResultSet {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            values: rows,
        }
    }

    #[test]
    fn test_word_form_rows() {
        let rows = result_set(
            &["form", "lemma", "tag"],
            vec![
                vec!["книга".into(), "книга".into(), "Ncfs".into()],
                vec!["книги".into(), "книга".into(), Scalar::Null],
            ],
        );

        let words: Vec<WordForm> = rows.into_records().unwrap();
        assert_eq!(words[0].tag.as_deref(), Some("Ncfs"));
        assert_eq!(words[1].form, "книги");
        assert_eq!(words[1].tag, None);
    }

    #[test]
    fn test_empty_tag_is_none() {
        let rows = result_set(
            &["form", "lemma", "tag"],
            vec![vec!["и".into(), "и".into(), "".into()]],
        );
        let words: Vec<WordForm> = rows.into_records().unwrap();
        assert_eq!(words[0].tag, None);
    }

    #[test]
    fn test_column_drift_is_rejected() {
        let rows = result_set(
            &["lemma", "form", "tag"],
            vec![vec!["книга".into(), "книги".into(), Scalar::Null]],
        );
        let result = rows.into_records::<WordForm>();
        assert!(matches!(result, Err(LexiconError::Schema(_))));
    }

    #[test]
    fn test_wrong_cell_type_is_rejected() {
        let rows = result_set(&["form"], vec![vec![Scalar::Integer(5)]]);
        assert!(matches!(
            rows.into_records::<FormOnly>(),
            Err(LexiconError::Schema(_))
        ));
    }

    #[test]
    fn test_row_bounds() {
        let rows = result_set(&["min_id", "max_id"], vec![vec![Scalar::Null, Scalar::Null]]);
        let bounds: Vec<RowIdBounds> = rows.into_records().unwrap();
        assert_eq!(bounds[0].range(), None);

        let rows = result_set(&["min_id", "max_id"], vec![vec![Scalar::Integer(3), Scalar::Integer(40)]]);
        let bounds: Vec<RowIdBounds> = rows.into_records().unwrap();
        assert_eq!(bounds[0].range(), Some((3, 40)));
    }

    #[test]
    fn test_search_outcome_serializes_tagged() {
        let outcome = SearchOutcome::Matches(vec![]);
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            serde_json::json!({"kind": "matches", "value": []})
        );
    }
}
