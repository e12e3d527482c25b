//! Fixture builders shared by unit tests

use rusqlite::{params, Connection};

/// Build a `words` dataset and return its raw file bytes
///
/// Rows are inserted in order, so the first row gets rowid 1.
pub(crate) fn fixture_bytes(rows: &[(&str, &str, Option<&str>)]) -> Vec<u8> {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("fixture.sqlite");

    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE words (
                form TEXT NOT NULL,
                lemma TEXT NOT NULL,
                tag TEXT
            );
            CREATE INDEX idx_words_form ON words(form);
            CREATE INDEX idx_words_lemma ON words(lemma);
            "#,
        )
        .unwrap();

        for (form, lemma, tag) in rows {
            conn.execute(
                "INSERT INTO words (form, lemma, tag) VALUES (?1, ?2, ?3)",
                params![form, lemma, tag],
            )
            .unwrap();
        }
    }

    std::fs::read(&path).unwrap()
}
