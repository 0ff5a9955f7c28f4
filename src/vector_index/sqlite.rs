//! SQLite-backed index persistence.
//!
//! The whole index lives in one SQLite file. A new index is written to a
//! temporary file next to the target and renamed over it, so readers see
//! either the previous index or the complete new one.

use super::{IndexMetadata, IndexStorage, IndexedVector, VectorIndex};
use crate::chunking::TranscriptChunk;
use crate::error::{Result, SvarError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};
use uuid::Uuid;

const FORMAT_VERSION: &str = "1";

const SCHEMA: &str = r#"
    CREATE TABLE meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE entries (
        position INTEGER PRIMARY KEY,
        content TEXT NOT NULL,
        byte_offset INTEGER,
        start_seconds REAL,
        embedding BLOB NOT NULL
    );
"#;

/// Index storage in a single SQLite file.
pub struct SqliteIndexStorage {
    path: PathBuf,
}

impl SqliteIndexStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl IndexStorage for SqliteIndexStorage {
    async fn replace(&self, index: &VectorIndex) -> Result<()> {
        let index = index.clone();
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || persist(&index, &path))
            .await
            .map_err(|e| SvarError::VectorStore(format!("Index write task failed: {}", e)))?
    }

    async fn load(&self) -> Result<VectorIndex> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || load(&path))
            .await
            .map_err(|e| SvarError::VectorStore(format!("Index read task failed: {}", e)))?
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Write `index` to `path`, atomically replacing whatever was there.
#[instrument(skip(index), fields(entries = index.len()))]
pub fn persist(index: &VectorIndex, path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;

    let tmp = tempfile::Builder::new()
        .prefix(".svar-index-")
        .suffix(".tmp")
        .tempfile_in(&parent)?;

    let conn = Connection::open(tmp.path())?;
    write_index(&conn, index)?;
    conn.close().map_err(|(_, e)| SvarError::Database(e))?;

    tmp.persist(path).map_err(|e| SvarError::Io(e.error))?;

    info!("Persisted index {} ({} entries) to {:?}", index.metadata().id, index.len(), path);
    Ok(())
}

/// Read the index stored at `path`.
#[instrument]
pub fn load(path: &Path) -> Result<VectorIndex> {
    if !path.is_file() {
        return Err(SvarError::IndexNotFound(path.display().to_string()));
    }

    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let index = read_index(&conn)?;

    debug!("Loaded index {} ({} entries) from {:?}", index.metadata().id, index.len(), path);
    Ok(index)
}

fn write_index(conn: &Connection, index: &VectorIndex) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let tx = conn.unchecked_transaction()?;
    let metadata = index.metadata();

    {
        let mut insert_meta = tx.prepare("INSERT INTO meta (key, value) VALUES (?1, ?2)")?;
        insert_meta.execute(params!["format_version", FORMAT_VERSION])?;
        insert_meta.execute(params!["id", metadata.id.to_string()])?;
        insert_meta.execute(params!["embedding_model", metadata.embedding_model])?;
        insert_meta.execute(params!["dimensions", metadata.dimensions.to_string()])?;
        insert_meta.execute(params!["created_at", metadata.created_at.to_rfc3339()])?;
        if let Some(source_id) = &metadata.source_id {
            insert_meta.execute(params!["source_id", source_id])?;
        }

        let mut insert_entry = tx.prepare(
            "INSERT INTO entries (position, content, byte_offset, start_seconds, embedding)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for (position, entry) in index.entries().iter().enumerate() {
            insert_entry.execute(params![
                position as i64,
                entry.chunk.text,
                entry.chunk.offset.map(|o| o as i64),
                entry.chunk.start_seconds,
                embedding_to_bytes(&entry.embedding),
            ])?;
        }
    }

    tx.commit()?;
    Ok(())
}

fn read_index(conn: &Connection) -> Result<VectorIndex> {
    let meta = |key: &str| -> Result<Option<String>> {
        Ok(conn
            .query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?)
    };
    let required = |key: &str| -> Result<String> {
        meta(key)?.ok_or_else(|| SvarError::VectorStore(format!("Index is missing '{}'", key)))
    };

    let version = required("format_version")?;
    if version != FORMAT_VERSION {
        return Err(SvarError::VectorStore(format!(
            "Unsupported index format version {}",
            version
        )));
    }

    let metadata = IndexMetadata {
        id: Uuid::parse_str(&required("id")?)
            .map_err(|e| SvarError::VectorStore(format!("Invalid index id: {}", e)))?,
        source_id: meta("source_id")?,
        embedding_model: required("embedding_model")?,
        dimensions: required("dimensions")?
            .parse()
            .map_err(|e| SvarError::VectorStore(format!("Invalid dimensions: {}", e)))?,
        created_at: DateTime::parse_from_rfc3339(&required("created_at")?)
            .map_err(|e| SvarError::VectorStore(format!("Invalid created_at: {}", e)))?
            .with_timezone(&Utc),
    };

    let mut stmt = conn.prepare(
        "SELECT content, byte_offset, start_seconds, embedding FROM entries ORDER BY position",
    )?;
    let entries = stmt
        .query_map([], |row| {
            let offset: Option<i64> = row.get(1)?;
            let embedding: Vec<u8> = row.get(3)?;
            Ok(IndexedVector {
                chunk: TranscriptChunk {
                    text: row.get(0)?,
                    offset: offset.map(|o| o as usize),
                    start_seconds: row.get(2)?,
                },
                embedding: bytes_to_embedding(&embedding),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    VectorIndex::from_parts(metadata, entries)
}

/// Serialize embedding to bytes.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize embedding from bytes.
fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| {
            let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
            f32::from_le_bytes(arr)
        })
        .collect()
}
