pub mod db;

pub use db::{
    create_db, get_scan, recent_scans, save_scan, save_scan_at, DbPool, ScanRecord,
    TIMESTAMP_FORMAT,
};
