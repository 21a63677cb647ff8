use chrono::{Local, NaiveDateTime};
use docscan_core::{DocumentType, FieldMap, ScanSubmission};
use serde::Serialize;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;

pub type DbPool = Pool<Sqlite>;

/// Format of the `upload_date` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&format!("sqlite:{}?mode=rwc", path.display()))
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;
    tracing::debug!("record store ready at {}", path.display());

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            filename TEXT NOT NULL,
            upload_date TEXT NOT NULL,
            doc_type TEXT NOT NULL,
            extracted_text TEXT NOT NULL,
            structured_data TEXT NOT NULL,
            file_path TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// A persisted, user-confirmed scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanRecord {
    pub id: i64,
    pub filename: String,
    pub upload_date: String,
    pub doc_type: String,
    pub extracted_text: String,
    pub structured_data: String,
    pub file_path: Option<String>,
}

impl ScanRecord {
    pub fn document_type(&self) -> Option<DocumentType> {
        self.doc_type.parse().ok()
    }

    pub fn fields(&self) -> Option<FieldMap> {
        FieldMap::from_json(&self.structured_data).ok()
    }
}

type ScanRow = (i64, String, String, String, String, String, Option<String>);

impl From<ScanRow> for ScanRecord {
    fn from(r: ScanRow) -> Self {
        ScanRecord {
            id: r.0,
            filename: r.1,
            upload_date: r.2,
            doc_type: r.3,
            extracted_text: r.4,
            structured_data: r.5,
            file_path: r.6,
        }
    }
}

/// Persist a confirmed scan stamped with the local time. Returns the new id.
pub async fn save_scan(pool: &DbPool, scan: &ScanSubmission) -> Result<i64, sqlx::Error> {
    save_scan_at(pool, scan, Local::now().naive_local()).await
}

pub async fn save_scan_at(
    pool: &DbPool,
    scan: &ScanSubmission,
    uploaded_at: NaiveDateTime,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO scans (filename, upload_date, doc_type, extracted_text, structured_data, file_path) VALUES (?, ?, ?, ?, ?, ?)"
    )
    .bind(&scan.filename)
    .bind(uploaded_at.format(TIMESTAMP_FORMAT).to_string())
    .bind(scan.doc_type.label())
    .bind(scan.text.as_str())
    .bind(scan.fields.to_json())
    .bind(scan.file_path.as_ref().map(|p| p.display().to_string()))
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    tracing::info!(id, filename = %scan.filename, doc_type = %scan.doc_type, "scan saved");
    Ok(id)
}

/// The newest `limit` scans, newest first.
pub async fn recent_scans(pool: &DbPool, limit: u32) -> Result<Vec<ScanRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ScanRow>(
        "SELECT id, filename, upload_date, doc_type, extracted_text, structured_data, file_path FROM scans ORDER BY id DESC LIMIT ?"
    )
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(ScanRecord::from).collect())
}

pub async fn get_scan(pool: &DbPool, id: i64) -> Result<Option<ScanRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, ScanRow>(
        "SELECT id, filename, upload_date, doc_type, extracted_text, structured_data, file_path FROM scans WHERE id = ?"
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(ScanRecord::from))
}
