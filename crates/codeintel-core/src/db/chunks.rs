//! Chunk rows

use crate::db::Database;
use crate::error::{Error, Result};
use crate::types::{ChunkType, CodeChunk};
use rusqlite::{params, Row, Transaction};

fn parse_chunk_type(value: &str) -> rusqlite::Result<ChunkType> {
    match value {
        "function" => Ok(ChunkType::Function),
        "method" => Ok(ChunkType::Method),
        "class" => Ok(ChunkType::Class),
        "module" => Ok(ChunkType::Module),
        "text" => Ok(ChunkType::Text),
        other => Err(rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown chunk type '{}'", other).into(),
        )),
    }
}

fn chunk_from_row(row: &Row<'_>) -> rusqlite::Result<CodeChunk> {
    let chunk_type: String = row.get(3)?;
    Ok(CodeChunk {
        id: row.get(0)?,
        resource_id: row.get(1)?,
        seq: row.get::<_, i64>(2)? as usize,
        chunk_type: parse_chunk_type(&chunk_type)?,
        function_name: row.get(4)?,
        class_name: row.get(5)?,
        start_line: row.get::<_, i64>(6)? as usize,
        end_line: row.get::<_, i64>(7)? as usize,
        language: row.get(8)?,
        token_count: row.get::<_, i64>(9)? as usize,
        is_fallback: row.get(10)?,
        oversized: row.get(11)?,
        content_hash: row.get(12)?,
        content: row.get(13)?,
    })
}

/// Replace the chunk set of one resource inside `tx`
///
/// Rows are keyed by chunk id, so saving the same chunks twice leaves
/// one copy; chunks from an older revision of the file are removed.
pub(crate) fn write_chunks(
    tx: &Transaction<'_>,
    resource_id: &str,
    chunks: &[CodeChunk],
) -> Result<()> {
    if let Some(stray) = chunks.iter().find(|c| c.resource_id != resource_id) {
        return Err(Error::Persist(format!(
            "chunk {} belongs to resource {}, not {}",
            stray.id, stray.resource_id, resource_id
        )));
    }

    tx.execute("DELETE FROM chunks WHERE resource_id = ?1", params![resource_id])?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO chunks (id, resource_id, seq, chunk_type, function_name,
                 class_name, start_line, end_line, language, token_count, is_fallback,
                 oversized, content_hash, content)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        )?;
        for chunk in chunks {
            stmt.execute(params![
                chunk.id,
                chunk.resource_id,
                chunk.seq as i64,
                chunk.chunk_type.as_str(),
                chunk.function_name,
                chunk.class_name,
                chunk.start_line as i64,
                chunk.end_line as i64,
                chunk.language,
                chunk.token_count as i64,
                chunk.is_fallback,
                chunk.oversized,
                chunk.content_hash,
                chunk.content,
            ])?;
        }
    }
    Ok(())
}

impl Database {
    pub fn replace_chunks(&self, resource_id: &str, chunks: &[CodeChunk]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        write_chunks(&tx, resource_id, chunks)?;
        tx.commit()?;
        Ok(())
    }

    /// Chunks of one resource in file order
    pub fn chunks_for(&self, resource_id: &str) -> Result<Vec<CodeChunk>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, resource_id, seq, chunk_type, function_name, class_name, start_line,
                    end_line, language, token_count, is_fallback, oversized, content_hash, content
             FROM chunks WHERE resource_id = ?1 ORDER BY seq",
        )?;
        let chunks = stmt
            .query_map(params![resource_id], chunk_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(chunks)
    }

    pub fn count_chunks(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkBuilder;
    use crate::types::{Classification, Resource};

    fn setup(content: &str) -> (Database, Resource, Vec<CodeChunk>) {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        let resource = Resource::new("/repo", "notes.txt", Classification::Practice, "unknown");
        db.upsert_resource(&resource).unwrap();
        let chunks = ChunkBuilder::new(2000, 2).build(&resource, None, content).chunks;
        (db, resource, chunks)
    }

    #[test]
    fn test_replace_and_read_back() {
        let (db, resource, chunks) = setup("a\nb\nc\n");
        db.replace_chunks(&resource.id, &chunks).unwrap();
        let loaded = db.chunks_for(&resource.id).unwrap();
        assert_eq!(loaded, chunks);
    }

    #[test]
    fn test_saving_twice_keeps_one_copy() {
        let (db, resource, chunks) = setup("a\nb\nc\n");
        db.replace_chunks(&resource.id, &chunks).unwrap();
        db.replace_chunks(&resource.id, &chunks).unwrap();
        assert_eq!(db.count_chunks().unwrap(), chunks.len());
    }

    #[test]
    fn test_replace_drops_stale_chunks() {
        let (db, resource, chunks) = setup("a\nb\nc\nd\ne\n");
        db.replace_chunks(&resource.id, &chunks).unwrap();
        let shorter = ChunkBuilder::new(2000, 2).build(&resource, None, "a\n").chunks;
        db.replace_chunks(&resource.id, &shorter).unwrap();
        assert_eq!(db.chunks_for(&resource.id).unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_foreign_chunks() {
        let (db, _, chunks) = setup("a\n");
        assert!(db.replace_chunks("other", &chunks).is_err());
    }
}
