//! Market snapshot fetch with a local CSV cache.
//!
//! The snapshot is a full-market ranking pulled from a REST endpoint. It is
//! stored as `<folder>/<file_name>.csv` and reused while the file's mtime is
//! within the staleness window. The file's mtime is the only cache metadata.

use crate::config;
use crate::connection::Connection;
use crate::error::{ExtractorError, Result};
use crate::table::Table;
use chrono::{DateTime, Local};
use log::{debug, info, warn};
use reqwest::blocking::Client;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SNAPSHOT_TABLE: &str = "snapshot";

// ---------------------------------------------------------------------------
// SnapshotConfig
// ---------------------------------------------------------------------------

/// Where the snapshot comes from and where it is cached.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Endpoint returning a JSON array of objects.
    pub api_url: String,
    /// Directory holding the cache file.
    pub folder: PathBuf,
    /// Cache file name without extension.
    pub file_name: String,
    /// Overwrite the cache file after a fetch.
    pub save_file: bool,
    /// Fail with [`ExtractorError::FileNotFound`] when the cache file is absent.
    pub strict: bool,
    pub timeout: Duration,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            api_url: config::DEFAULT_CRYPTO_URL.to_string(),
            folder: config::default_data_dir(),
            file_name: config::DEFAULT_INFO_FILE.to_string(),
            save_file: true,
            strict: false,
            timeout: config::DEFAULT_TIMEOUT,
        }
    }
}

impl SnapshotConfig {
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn folder<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.folder = path.as_ref().to_path_buf();
        self
    }

    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    pub fn save_file(mut self, save: bool) -> Self {
        self.save_file = save;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full path of the cache file.
    pub fn target_file(&self) -> PathBuf {
        point_to_specific_file(&self.folder, &self.file_name)
    }
}

// ---------------------------------------------------------------------------
// Path and freshness helpers
// ---------------------------------------------------------------------------

/// Join `folder` and `<file_name>.csv`.
pub fn point_to_specific_file<P: AsRef<Path>>(folder: P, file_name: &str) -> PathBuf {
    folder
        .as_ref()
        .join(format!("{}.{}", file_name, config::CACHE_FILE_EXTENSION))
}

/// Last-modified time of `path`.
///
/// Returns `Ok(None)` for a missing file, or [`ExtractorError::FileNotFound`]
/// when `raise_error` is set.
pub fn check_last_modified_date<P: AsRef<Path>>(
    path: P,
    raise_error: bool,
) -> Result<Option<DateTime<Local>>> {
    let path = path.as_ref();
    if !path.exists() {
        if raise_error {
            return Err(ExtractorError::FileNotFound {
                file: path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
                directory: path
                    .parent()
                    .map(|d| d.to_string_lossy().to_string())
                    .unwrap_or_default(),
            });
        }
        return Ok(None);
    }

    let modified = fs::metadata(path)?.modified()?;
    Ok(Some(DateTime::<Local>::from(modified)))
}

/// Whether a cache file modified at `last_modified` is still usable at `now`.
pub fn is_fresh(last_modified: Option<DateTime<Local>>, now: DateTime<Local>) -> bool {
    match last_modified {
        Some(modified) => now - modified <= config::staleness_window(),
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Fetch-or-load
// ---------------------------------------------------------------------------

/// Load the cached snapshot if fresh, otherwise fetch it from `api_url`.
pub fn request_all_crypto_info(config: &SnapshotConfig) -> Result<Table> {
    request_all_crypto_info_at(config, Local::now())
}

/// Same as [`request_all_crypto_info`] with an explicit reference time.
pub fn request_all_crypto_info_at(config: &SnapshotConfig, now: DateTime<Local>) -> Result<Table> {
    let target = config.target_file();
    let last_modified = check_last_modified_date(&target, config.strict)?;
    let conn = Connection::new()?;

    if is_fresh(last_modified, now) {
        info!("Loading cached snapshot from {}", target.display());
        conn.register_table_from_csv(SNAPSHOT_TABLE, &target)?;
        return conn.read_table(SNAPSHOT_TABLE);
    }

    let records = fetch_records(&config.api_url, config.timeout)?;
    if records.is_empty() {
        warn!("Snapshot endpoint {} returned no records", config.api_url);
        return Ok(Table::default());
    }

    conn.register_table_from_records(SNAPSHOT_TABLE, &records)?;
    info!(
        "Fetched snapshot with {} rows from {}",
        conn.row_count(SNAPSHOT_TABLE)?,
        config.api_url
    );

    if config.save_file {
        save_snapshot(&conn, &target)?;
    }

    conn.read_table(SNAPSHOT_TABLE)
}

/// GET `url` and parse the body as a JSON array.
fn fetch_records(url: &str, timeout: Duration) -> Result<Vec<serde_json::Value>> {
    debug!("GET {}", url);
    let client = Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()?;

    let body = client.get(url).send()?.error_for_status()?.text()?;
    let data: serde_json::Value = serde_json::from_str(&body)?;
    match data {
        serde_json::Value::Array(records) => Ok(records),
        other => Err(ExtractorError::Provider(format!(
            "expected a JSON array from {}, got {}",
            url,
            json_kind(&other)
        ))),
    }
}

/// Write the snapshot table over `dest`.
///
/// Writes to a temp file first and renames on success, so a failed write
/// never leaves a truncated cache file behind.
fn save_snapshot(conn: &Connection, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_dest = dest.with_extension(format!("{}.tmp", config::CACHE_FILE_EXTENSION));

    let result = (|| -> Result<()> {
        conn.export_csv(SNAPSHOT_TABLE, &tmp_dest)?;
        fs::rename(&tmp_dest, dest)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_dest);
    } else {
        info!("Saved snapshot to {}", dest.display());
    }

    result
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
