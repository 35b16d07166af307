//! Graph triple rows

use crate::db::Database;
use crate::error::{Error, Result};
use crate::types::{GraphTriple, Predicate};
use rusqlite::{params, Row, Transaction};

fn parse_predicate(value: &str) -> rusqlite::Result<Predicate> {
    match value {
        "IMPORTS" => Ok(Predicate::Imports),
        "DEFINES" => Ok(Predicate::Defines),
        "CALLS" => Ok(Predicate::Calls),
        other => Err(rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown predicate '{}'", other).into(),
        )),
    }
}

fn triple_from_row(row: &Row<'_>) -> rusqlite::Result<GraphTriple> {
    let predicate: String = row.get(2)?;
    Ok(GraphTriple {
        resource_id: row.get(0)?,
        subject: row.get(1)?,
        predicate: parse_predicate(&predicate)?,
        object: row.get(3)?,
        source_file: row.get(4)?,
        target_symbol: row.get(5)?,
        line_number: row.get::<_, i64>(6)? as usize,
        confidence: row.get::<_, f64>(7)? as f32,
    })
}

/// Replace the triple set of one resource inside `tx`, keyed by triple id
pub(crate) fn write_triples(
    tx: &Transaction<'_>,
    resource_id: &str,
    triples: &[GraphTriple],
) -> Result<()> {
    if let Some(stray) = triples.iter().find(|t| t.resource_id != resource_id) {
        return Err(Error::Persist(format!(
            "triple from resource {} saved under {}",
            stray.resource_id, resource_id
        )));
    }

    tx.execute("DELETE FROM triples WHERE resource_id = ?1", params![resource_id])?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO triples (id, resource_id, subject, predicate, object,
                 source_file, target_symbol, line_number, confidence)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for triple in triples {
            stmt.execute(params![
                triple.id(),
                triple.resource_id,
                triple.subject,
                triple.predicate.as_str(),
                triple.object,
                triple.source_file,
                triple.target_symbol,
                triple.line_number as i64,
                triple.confidence as f64,
            ])?;
        }
    }
    Ok(())
}

impl Database {
    pub fn replace_triples(&self, resource_id: &str, triples: &[GraphTriple]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        write_triples(&tx, resource_id, triples)?;
        tx.commit()?;
        Ok(())
    }

    /// Triples of one resource in line order
    pub fn triples_for(&self, resource_id: &str) -> Result<Vec<GraphTriple>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT resource_id, subject, predicate, object, source_file, target_symbol,
                    line_number, confidence
             FROM triples WHERE resource_id = ?1 ORDER BY line_number, rowid",
        )?;
        let triples = stmt
            .query_map(params![resource_id], triple_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(triples)
    }

    /// Every triple whose object or target matches `symbol`
    pub fn triples_referencing(&self, symbol: &str) -> Result<Vec<GraphTriple>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT resource_id, subject, predicate, object, source_file, target_symbol,
                    line_number, confidence
             FROM triples WHERE object = ?1 OR target_symbol = ?1
             ORDER BY source_file, line_number",
        )?;
        let triples = stmt
            .query_map(params![symbol], triple_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(triples)
    }

    pub fn count_triples(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM triples", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Classification, Resource};

    fn triple(resource: &Resource, object: &str, line: usize, confidence: f32) -> GraphTriple {
        GraphTriple {
            resource_id: resource.id.clone(),
            subject: "main".to_string(),
            predicate: Predicate::Calls,
            object: object.to_string(),
            source_file: resource.relative_path.clone(),
            target_symbol: object.to_string(),
            line_number: line,
            confidence,
        }
    }

    fn setup() -> (Database, Resource) {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        let resource = Resource::new("/repo", "main.py", Classification::Practice, "python");
        db.upsert_resource(&resource).unwrap();
        (db, resource)
    }

    #[test]
    fn test_replace_and_query() {
        let (db, resource) = setup();
        let triples = vec![triple(&resource, "load", 2, 1.0), triple(&resource, "save", 5, 0.5)];
        db.replace_triples(&resource.id, &triples).unwrap();

        let loaded = db.triples_for(&resource.id).unwrap();
        assert_eq!(loaded, triples);
        assert_eq!(db.triples_referencing("save").unwrap().len(), 1);
    }

    #[test]
    fn test_idempotent_on_id() {
        let (db, resource) = setup();
        let triples = vec![triple(&resource, "load", 2, 1.0)];
        db.replace_triples(&resource.id, &triples).unwrap();
        db.replace_triples(&resource.id, &triples).unwrap();
        assert_eq!(db.count_triples().unwrap(), 1);
    }
}
