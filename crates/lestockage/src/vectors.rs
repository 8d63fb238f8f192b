// Term frequencies and document vectors

use crate::error::Result;
use crate::files::write_file;
use crate::metadata::invalidate_idf;
use crate::records::{DocumentVector, FileRecord, Posting};
use crate::schema::{IndexStore, MAX_BOUND_TERMS};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

fn replace_terms(
    conn: &Connection,
    file_path: &str,
    terms: &BTreeMap<String, f64>,
) -> rusqlite::Result<()> {
    conn.execute(
        "DELETE FROM term_frequencies WHERE file_path = ?1",
        params![file_path],
    )?;
    let mut stmt = conn.prepare_cached(
        "INSERT INTO term_frequencies (file_path, term, frequency) VALUES (?1, ?2, ?3)
         ON CONFLICT(file_path, term) DO UPDATE SET frequency = excluded.frequency",
    )?;
    for (term, frequency) in terms {
        stmt.execute(params![file_path, term, frequency])?;
    }
    Ok(())
}

fn write_vector(conn: &Connection, vector: &DocumentVector) -> rusqlite::Result<()> {
    let raw_terms = serde_json::to_string(&vector.raw_terms)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    conn.execute(
        "INSERT INTO document_vectors (file_path, magnitude, term_count, raw_terms)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(file_path) DO UPDATE SET
            magnitude = excluded.magnitude,
            term_count = excluded.term_count,
            raw_terms = excluded.raw_terms",
        params![vector.file_path, vector.magnitude, vector.term_count, raw_terms],
    )?;
    Ok(())
}

fn vector_from_row(row: &Row<'_>) -> rusqlite::Result<DocumentVector> {
    let raw: String = row.get(3)?;
    let raw_terms = serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    Ok(DocumentVector {
        file_path: row.get(0)?,
        magnitude: row.get(1)?,
        term_count: row.get(2)?,
        raw_terms,
    })
}

impl IndexStore {
    /// Replace the term frequency set of a file
    pub fn upsert_term_frequencies(
        &self,
        file_path: &str,
        terms: &BTreeMap<String, f64>,
    ) -> Result<()> {
        self.with_conn("upsert_term_frequencies", |conn| {
            let tx = conn.transaction()?;
            replace_terms(&tx, file_path, terms)?;
            invalidate_idf(&tx)?;
            tx.commit()
        })
    }

    /// Insert or replace the document vector of a file
    pub fn upsert_document_vector(&self, vector: &DocumentVector) -> Result<()> {
        self.with_conn("upsert_document_vector", |conn| write_vector(conn, vector))
    }

    /// Write a file record, its term frequencies and its vector as one
    /// transaction.
    ///
    /// Readers never see the vector out of step with the term rows.
    pub fn write_file_index(
        &self,
        record: &FileRecord,
        terms: &BTreeMap<String, f64>,
        vector: &DocumentVector,
    ) -> Result<()> {
        self.with_conn("write_file_index", |conn| {
            let tx = conn.transaction()?;
            write_file(&tx, record)?;
            replace_terms(&tx, &record.path, terms)?;
            write_vector(&tx, vector)?;
            tx.commit()
        })?;
        trace!("Indexed {} ({} terms)", record.path, terms.len());
        Ok(())
    }

    /// Stored term frequencies of a file
    pub fn term_frequencies(&self, file_path: &str) -> Result<BTreeMap<String, f64>> {
        self.with_conn("term_frequencies", |conn| {
            let mut stmt = conn.prepare(
                "SELECT term, frequency FROM term_frequencies WHERE file_path = ?1",
            )?;
            let rows = stmt.query_map(params![file_path], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?;
            rows.collect()
        })
    }

    /// Number of term frequency rows referencing a file
    pub fn term_row_count(&self, file_path: &str) -> Result<i64> {
        self.with_conn("term_row_count", |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM term_frequencies WHERE file_path = ?1",
                params![file_path],
                |row| row.get(0),
            )
        })
    }

    /// Document vector of a file
    pub fn document_vector(&self, file_path: &str) -> Result<Option<DocumentVector>> {
        self.with_conn("document_vector", |conn| {
            conn.query_row(
                "SELECT file_path, magnitude, term_count, raw_terms
                 FROM document_vectors WHERE file_path = ?1",
                params![file_path],
                vector_from_row,
            )
            .optional()
        })
    }

    /// All document vectors ordered by path
    pub fn document_vectors(&self) -> Result<Vec<DocumentVector>> {
        self.with_conn("document_vectors", |conn| {
            let mut stmt = conn.prepare(
                "SELECT file_path, magnitude, term_count, raw_terms
                 FROM document_vectors ORDER BY file_path",
            )?;
            let rows = stmt.query_map([], vector_from_row)?;
            rows.collect()
        })
    }

    /// Every stored weight of the given terms, joined with the owning file's
    /// magnitude, ordered by path then term.
    ///
    /// Terms are bound in chunks, so any number of terms is accepted.
    pub fn postings(&self, terms: &[&str]) -> Result<Vec<Posting>> {
        let unique: BTreeSet<&str> = terms.iter().copied().collect();
        let unique: Vec<&str> = unique.into_iter().collect();
        if unique.is_empty() {
            return Ok(Vec::new());
        }

        let mut postings = self.with_conn("postings", |conn| {
            let mut postings = Vec::new();
            for chunk in unique.chunks(MAX_BOUND_TERMS) {
                let placeholders = vec!["?"; chunk.len()].join(", ");
                let sql = format!(
                    "SELECT tf.file_path, tf.term, tf.frequency, dv.magnitude
                     FROM term_frequencies tf
                     JOIN document_vectors dv ON dv.file_path = tf.file_path
                     WHERE tf.term IN ({placeholders})"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                    Ok(Posting {
                        file_path: row.get(0)?,
                        term: row.get(1)?,
                        frequency: row.get(2)?,
                        magnitude: row.get(3)?,
                    })
                })?;
                for posting in rows {
                    postings.push(posting?);
                }
            }
            Ok(postings)
        })?;

        postings.sort_by(|a, b| {
            a.file_path
                .cmp(&b.file_path)
                .then_with(|| a.term.cmp(&b.term))
        });
        Ok(postings)
    }
}
