// Corpus-wide IDF table

use crate::error::Result;
use crate::records::IdfEntry;
use crate::schema::{IndexStore, MAX_BOUND_TERMS};
use rusqlite::{params, params_from_iter};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

impl IndexStore {
    /// Insert or replace one IDF value
    pub fn upsert_idf(&self, term: &str, idf_value: f64) -> Result<()> {
        self.with_conn("upsert_idf", |conn| {
            conn.execute(
                "INSERT INTO idf (term, idf_value) VALUES (?1, ?2)
                 ON CONFLICT(term) DO UPDATE SET idf_value = excluded.idf_value",
                params![term, idf_value],
            )?;
            Ok(())
        })
    }

    /// Replace the whole IDF table in one transaction
    pub fn replace_idf(&self, entries: &[IdfEntry]) -> Result<()> {
        self.with_conn("replace_idf", |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM idf", [])?;
            {
                let mut stmt =
                    tx.prepare_cached("INSERT INTO idf (term, idf_value) VALUES (?1, ?2)")?;
                for entry in entries {
                    stmt.execute(params![entry.term, entry.idf_value])?;
                }
            }
            tx.commit()
        })?;
        debug!("Replaced IDF table with {} terms", entries.len());
        Ok(())
    }

    /// IDF values of the requested terms; unknown terms are absent
    pub fn idf_values(&self, terms: &[&str]) -> Result<HashMap<String, f64>> {
        if terms.is_empty() {
            return Ok(HashMap::new());
        }

        self.with_conn("idf_values", |conn| {
            let mut values = HashMap::with_capacity(terms.len());
            for chunk in terms.chunks(MAX_BOUND_TERMS) {
                let placeholders = vec!["?"; chunk.len()].join(", ");
                let sql = format!("SELECT term, idf_value FROM idf WHERE term IN ({placeholders})");
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
                })?;
                for row in rows {
                    let (term, value) = row?;
                    values.insert(term, value);
                }
            }
            Ok(values)
        })
    }

    /// Number of files containing each stored term
    pub fn document_frequencies(&self) -> Result<BTreeMap<String, i64>> {
        self.with_conn("document_frequencies", |conn| {
            let mut stmt = conn.prepare(
                "SELECT term, COUNT(DISTINCT file_path) FROM term_frequencies GROUP BY term",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            rows.collect()
        })
    }

    /// Number of IDF entries
    pub fn idf_count(&self) -> Result<i64> {
        self.with_conn("idf_count", |conn| {
            conn.query_row("SELECT COUNT(*) FROM idf", [], |row| row.get(0))
        })
    }
}
