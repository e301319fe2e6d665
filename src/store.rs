use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};

use crate::error::CiteError;
use crate::fields::CitationFields;
use crate::style::Citation;

/// Append-only log of generated citations, one SQLite table. Single-process
/// usage; no locking discipline beyond what SQLite provides.
pub struct LogStore {
    conn: Connection,
    path: PathBuf,
}

/// One persisted citation, as read back from the store.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub id: i64,
    pub fields: CitationFields,
    pub style: String,
    pub rendered: String,
    pub created_at: DateTime<Utc>,
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS citations (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    url          TEXT,
    title        TEXT,
    author       TEXT,
    publisher    TEXT,
    publish_date TEXT,
    access_date  TEXT,
    style        TEXT NOT NULL,
    citation     TEXT NOT NULL,
    created_at   TEXT NOT NULL
)";

impl LogStore {
    /// Well-known location: `<data dir>/cite/citations.db`, with a CWD
    /// fallback when the platform has no data directory.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("cite").join("citations.db"))
            .unwrap_or_else(|| PathBuf::from("citations.db"))
    }

    /// Open (and on first use create) the store at `path`.
    pub fn open(path: &Path) -> Result<Self, CiteError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute(SCHEMA, [])?;
        Ok(LogStore {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one citation; returns the new record id.
    pub fn append(&self, citation: &Citation) -> Result<i64, CiteError> {
        let f = &citation.fields;
        self.conn.execute(
            "INSERT INTO citations
                (url, title, author, publisher, publish_date, access_date, style, citation, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                f.url,
                f.title,
                f.author,
                f.publisher,
                f.publish_date,
                f.access_date,
                citation.style.as_str(),
                citation.rendered,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent first. `count == 0` means unbounded; `query` is a
    /// case-insensitive substring match over the rendered citation and the
    /// url/title/author/publisher fields.
    pub fn list(&self, count: usize, query: Option<&str>) -> Result<Vec<LogRecord>, CiteError> {
        let mut sql = String::from(
            "SELECT id, url, title, author, publisher, publish_date, access_date,
                    style, citation, created_at
             FROM citations",
        );
        // LIKE metacharacters in the query must match literally.
        let pattern = query.map(|q| {
            let escaped = q
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{}%", escaped.to_lowercase())
        });
        if pattern.is_some() {
            sql.push_str(
                " WHERE lower(citation) LIKE ?1 ESCAPE '\\'
                    OR lower(coalesce(url, '')) LIKE ?1 ESCAPE '\\'
                    OR lower(coalesce(title, '')) LIKE ?1 ESCAPE '\\'
                    OR lower(coalesce(author, '')) LIKE ?1 ESCAPE '\\'
                    OR lower(coalesce(publisher, '')) LIKE ?1 ESCAPE '\\'",
            );
        }
        sql.push_str(" ORDER BY id DESC");
        if count > 0 {
            sql.push_str(&format!(" LIMIT {count}"));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let map = |row: &rusqlite::Row<'_>| {
            let created: String = row.get(9)?;
            Ok(LogRecord {
                id: row.get(0)?,
                fields: CitationFields {
                    url: row.get(1)?,
                    title: row.get(2)?,
                    author: row.get(3)?,
                    publisher: row.get(4)?,
                    publish_date: row.get(5)?,
                    access_date: row.get(6)?,
                },
                style: row.get(7)?,
                rendered: row.get(8)?,
                created_at: DateTime::parse_from_rfc3339(&created)
                    .map(|d| d.with_timezone(&Utc))
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            9,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?,
            })
        };
        let rows = match &pattern {
            Some(p) => stmt.query_map(params![p], map)?,
            None => stmt.query_map([], map)?,
        };
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{RenderOptions, Style};

    fn store() -> (tempfile::TempDir, LogStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LogStore::open(&dir.path().join("citations.db")).expect("open");
        (dir, store)
    }

    fn citation(title: &str) -> Citation {
        let fields = CitationFields {
            author: Some("John Doe".to_string()),
            title: Some(title.to_string()),
            url: Some("http://example.com".to_string()),
            ..Default::default()
        };
        Citation::new(Style::Mla, fields, &RenderOptions::default())
    }

    #[test]
    fn append_assigns_increasing_ids() {
        let (_dir, store) = store();
        let a = store.append(&citation("First")).unwrap();
        let b = store.append(&citation("Second")).unwrap();
        assert!(b > a);
    }

    #[test]
    fn list_is_most_recent_first_and_zero_means_all() {
        let (_dir, store) = store();
        for i in 0..5 {
            store.append(&citation(&format!("Title {i}"))).unwrap();
        }
        let all = store.list(0, None).unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].fields.title.as_deref(), Some("Title 4"));
        assert_eq!(all[4].fields.title.as_deref(), Some("Title 0"));

        let three = store.list(3, None).unwrap();
        assert_eq!(three.len(), 3);
        assert_eq!(three[0].fields.title.as_deref(), Some("Title 4"));
        assert_eq!(three[2].fields.title.as_deref(), Some("Title 2"));
    }

    #[test]
    fn query_matches_substring_case_insensitively() {
        let (_dir, store) = store();
        store.append(&citation("Python Serialize Data")).unwrap();
        store.append(&citation("Rust Ownership")).unwrap();

        let hits = store.list(0, Some("python")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(
            hits[0].fields.title.as_deref(),
            Some("Python Serialize Data")
        );

        let hits = store.list(0, Some("PYTHON")).unwrap();
        assert_eq!(hits.len(), 1);

        assert!(store.list(0, Some("haskell")).unwrap().is_empty());
    }

    #[test]
    fn query_like_metacharacters_match_literally() {
        let (_dir, store) = store();
        store.append(&citation("Rust Ownership")).unwrap();
        store.append(&citation("Why snake_case Wins")).unwrap();
        store.append(&citation("The 100% Guide")).unwrap();

        // A bare wildcard character is a plain substring, not match-anything.
        let hits = store.list(0, Some("_")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(
            hits[0].fields.title.as_deref(),
            Some("Why snake_case Wins")
        );

        let hits = store.list(0, Some("%")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].fields.title.as_deref(), Some("The 100% Guide"));

        let hits = store.list(0, Some("100% g")).unwrap();
        assert_eq!(hits.len(), 1);

        assert!(store.list(0, Some("\\")).unwrap().is_empty());
    }

    #[test]
    fn corrupt_created_at_is_a_store_error() {
        let (_dir, store) = store();
        store.append(&citation("Fine")).unwrap();
        store
            .conn
            .execute("UPDATE citations SET created_at = 'garbage'", [])
            .unwrap();
        assert!(store.list(0, None).is_err());
    }

    #[test]
    fn query_matches_author_column_too() {
        let (_dir, store) = store();
        store.append(&citation("Anything")).unwrap();
        let hits = store.list(0, Some("john doe")).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn store_persists_across_reopen() {
        let (dir, store) = store();
        store.append(&citation("Sticky")).unwrap();
        drop(store);
        let reopened = LogStore::open(&dir.path().join("citations.db")).unwrap();
        let all = reopened.list(0, None).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].style, "mla");
        assert!(all[0].rendered.contains("Sticky"));
    }

    #[test]
    fn open_creates_missing_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("citations.db");
        let store = LogStore::open(&nested).unwrap();
        assert_eq!(store.path(), nested.as_path());
    }
}
