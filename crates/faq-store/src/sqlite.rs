//! SQLite-based corpus storage.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OpenFlags};
use tracing::{debug, info};

use faq_core::{CorpusSource, CorpusStats, FaqError, FaqRecord, Result};

use crate::schema::SCHEMA;

/// SQLite-backed FAQ table.
///
/// Uses a blocking Mutex around a single connection.
pub struct SqliteFaqStore {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl SqliteFaqStore {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_timeout(path, 5000)
    }

    /// Open or create a database with a custom busy timeout.
    pub fn open_with_timeout(path: impl AsRef<Path>, busy_timeout_ms: u32) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| FaqError::database(format!("Failed to open database: {}", e)))?;

        Self::init(conn, path, busy_timeout_ms)
    }

    /// Open an in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            FaqError::database(format!("Failed to open in-memory database: {}", e))
        })?;

        Self::init(conn, Path::new(":memory:"), 5000)
    }

    fn init(conn: Connection, path: &Path, busy_timeout_ms: u32) -> Result<Self> {
        conn.execute_batch(&format!(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = {};
            "#,
            busy_timeout_ms
        ))
        .map_err(|e| FaqError::database(format!("Failed to configure connection: {}", e)))?;

        conn.execute_batch(SCHEMA)
            .map_err(|e| FaqError::database(format!("Failed to initialize schema: {}", e)))?;

        info!("Database opened at {:?}", path);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_conn<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Connection) -> Result<R>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| FaqError::database(e.to_string()))?;
        f(&mut conn)
    }

    /// Append records in one transaction, after any existing rows.
    pub fn insert_records(&self, records: &[FaqRecord]) -> Result<usize> {
        self.with_conn(|conn| {
            let tx = conn
                .transaction()
                .map_err(|e| FaqError::database(e.to_string()))?;

            {
                let mut stmt = tx
                    .prepare(
                        "INSERT INTO faqs (question_id, category, question, answer, embedding)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                    )
                    .map_err(|e| FaqError::database(e.to_string()))?;

                for record in records {
                    stmt.execute(params![
                        record.question_id,
                        record.category,
                        record.question,
                        record.answer,
                        record.embedding.as_deref().map(vec_to_bytes),
                    ])
                    .map_err(|e| FaqError::database(format!("Failed to insert FAQ: {}", e)))?;
                }
            }

            tx.commit()
                .map_err(|e| FaqError::database(e.to_string()))?;

            debug!("Inserted {} FAQs", records.len());
            Ok(records.len())
        })
    }

    /// Row ids and questions of records without an embedding.
    pub fn records_missing_embeddings(&self) -> Result<Vec<(i64, String)>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, COALESCE(question, '') FROM faqs
                     WHERE embedding IS NULL ORDER BY id",
                )
                .map_err(|e| FaqError::database(e.to_string()))?;

            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
                .map_err(|e| FaqError::database(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| FaqError::database(e.to_string()))?;

            Ok(rows)
        })
    }

    /// Store embeddings for the given row ids.
    pub fn set_embeddings(&self, updates: &[(i64, Vec<f32>)]) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn
                .transaction()
                .map_err(|e| FaqError::database(e.to_string()))?;

            {
                let mut stmt = tx
                    .prepare("UPDATE faqs SET embedding = ?1 WHERE id = ?2")
                    .map_err(|e| FaqError::database(e.to_string()))?;

                for (id, embedding) in updates {
                    let updated = stmt
                        .execute(params![vec_to_bytes(embedding), id])
                        .map_err(|e| FaqError::database(e.to_string()))?;
                    if updated == 0 {
                        return Err(FaqError::invalid_argument(format!(
                            "No FAQ row with id {}",
                            id
                        )));
                    }
                }
            }

            tx.commit()
                .map_err(|e| FaqError::database(e.to_string()))?;

            debug!("Stored {} embeddings", updates.len());
            Ok(())
        })
    }

    /// Count records, embedded records, and categories.
    pub fn stats(&self) -> Result<CorpusStats> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*),
                        COUNT(embedding),
                        COUNT(DISTINCT COALESCE(category, 'general'))
                 FROM faqs",
                [],
                |row| {
                    Ok(CorpusStats {
                        records: row.get::<_, i64>(0)? as u64,
                        embedded: row.get::<_, i64>(1)? as u64,
                        categories: row.get::<_, i64>(2)? as u64,
                    })
                },
            )
            .map_err(|e| FaqError::database(e.to_string()))
        })
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<FaqRecord> {
        let embedding: Option<Vec<u8>> = row.get(4)?;
        Ok(FaqRecord {
            question_id: row
                .get::<_, Option<String>>(0)?
                .unwrap_or_else(|| "unknown".to_string()),
            category: row
                .get::<_, Option<String>>(1)?
                .unwrap_or_else(|| "general".to_string()),
            question: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            answer: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            embedding: embedding.map(|bytes| bytes_to_vec(&bytes)),
        })
    }
}

#[async_trait]
impl CorpusSource for SqliteFaqStore {
    async fn fetch_all(&self) -> Result<Vec<FaqRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT question_id, category, question, answer, embedding
                     FROM faqs ORDER BY id",
                )
                .map_err(|e| FaqError::database(e.to_string()))?;

            let records = stmt
                .query_map([], Self::row_to_record)
                .map_err(|e| FaqError::database(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| FaqError::database(e.to_string()))?;

            Ok(records)
        })
    }

    fn name(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }
}

fn vec_to_bytes(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn bytes_to_vec(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
