//! Resource rows

use crate::db::Database;
use crate::error::{Error, Result};
use crate::types::{Classification, Resource, ResourceStatus};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

fn parse_classification(value: &str) -> Result<Classification> {
    match value {
        "THEORY" => Ok(Classification::Theory),
        "PRACTICE" => Ok(Classification::Practice),
        "GOVERNANCE" => Ok(Classification::Governance),
        other => Err(Error::Persist(format!("unknown classification '{}'", other))),
    }
}

fn parse_status(value: &str) -> Result<ResourceStatus> {
    match value {
        "PENDING" => Ok(ResourceStatus::Pending),
        "COMPLETED" => Ok(ResourceStatus::Completed),
        "FAILED" => Ok(ResourceStatus::Failed),
        other => Err(Error::Persist(format!("unknown resource status '{}'", other))),
    }
}

/// Columns as read, before enum/JSON decoding
struct ResourceRow {
    id: String,
    relative_path: String,
    repository_root: String,
    commit_hash: Option<String>,
    branch: Option<String>,
    classification: String,
    language: String,
    ingestion_status: String,
    content_hash: String,
    size_bytes: i64,
    warnings: String,
    ingested_at: String,
}

impl ResourceRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            relative_path: row.get(1)?,
            repository_root: row.get(2)?,
            commit_hash: row.get(3)?,
            branch: row.get(4)?,
            classification: row.get(5)?,
            language: row.get(6)?,
            ingestion_status: row.get(7)?,
            content_hash: row.get(8)?,
            size_bytes: row.get(9)?,
            warnings: row.get(10)?,
            ingested_at: row.get(11)?,
        })
    }

    fn into_resource(self) -> Result<Resource> {
        let ingested_at = DateTime::parse_from_rfc3339(&self.ingested_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| Error::Persist(format!("bad timestamp '{}': {}", self.ingested_at, e)))?;
        Ok(Resource {
            id: self.id,
            relative_path: self.relative_path,
            repository_root: self.repository_root,
            commit_hash: self.commit_hash,
            branch: self.branch,
            classification: parse_classification(&self.classification)?,
            language: self.language,
            ingestion_status: parse_status(&self.ingestion_status)?,
            content_hash: self.content_hash,
            size_bytes: self.size_bytes.max(0) as u64,
            warnings: serde_json::from_str(&self.warnings)?,
            ingested_at,
        })
    }
}

const RESOURCE_COLUMNS: &str = "id, relative_path, repository_root, commit_hash, branch, \
     classification, language, ingestion_status, content_hash, size_bytes, warnings, ingested_at";

/// Insert or update a resource by id on an open connection or transaction
pub(crate) fn write_resource(conn: &Connection, resource: &Resource) -> Result<()> {
    let warnings = serde_json::to_string(&resource.warnings)?;
    conn.execute(
        "INSERT INTO resources (id, relative_path, repository_root, commit_hash, branch,
             classification, language, ingestion_status, content_hash, size_bytes,
             warnings, ingested_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
         ON CONFLICT(id) DO UPDATE SET
             commit_hash = excluded.commit_hash,
             branch = excluded.branch,
             classification = excluded.classification,
             language = excluded.language,
             ingestion_status = excluded.ingestion_status,
             content_hash = excluded.content_hash,
             size_bytes = excluded.size_bytes,
             warnings = excluded.warnings,
             ingested_at = excluded.ingested_at",
        params![
            resource.id,
            resource.relative_path,
            resource.repository_root,
            resource.commit_hash,
            resource.branch,
            resource.classification.as_str(),
            resource.language,
            resource.ingestion_status.as_str(),
            resource.content_hash,
            resource.size_bytes as i64,
            warnings,
            resource.ingested_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Set only the status of an existing resource, inserting it when absent
fn write_resource_status(conn: &Connection, resource: &Resource) -> Result<()> {
    let updated = conn.execute(
        "UPDATE resources SET ingestion_status = ?2 WHERE id = ?1",
        params![resource.id, resource.ingestion_status.as_str()],
    )?;
    if updated == 0 {
        write_resource(conn, resource)?;
    }
    Ok(())
}

impl Database {
    /// Insert or update a resource by id
    pub fn upsert_resource(&self, resource: &Resource) -> Result<()> {
        write_resource(&*self.conn()?, resource)
    }

    /// Record a new status, leaving the rest of an existing row untouched
    pub fn update_resource_status(&self, resource: &Resource) -> Result<()> {
        write_resource_status(&*self.conn()?, resource)
    }

    pub fn get_resource(&self, id: &str) -> Result<Option<Resource>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM resources WHERE id = ?1",
            RESOURCE_COLUMNS
        ))?;
        let mut rows = stmt.query_map(params![id], ResourceRow::from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?.into_resource()?)),
            None => Ok(None),
        }
    }

    /// Resources of one repository, ordered by path
    pub fn list_resources(&self, repository_root: &str) -> Result<Vec<Resource>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM resources WHERE repository_root = ?1 ORDER BY relative_path",
            RESOURCE_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![repository_root], ResourceRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(ResourceRow::into_resource).collect()
    }

    pub fn count_resources(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM resources", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
