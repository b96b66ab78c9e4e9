//! Parquet partition store.
//!
//! Layout: `{root}/{database_name}/{partition}.parquet`, one file per
//! partition, with a `{partition}.meta.json` sidecar.
//!
//! - Atomic writes (write to .tmp, rename into place)
//! - Metadata sidecar per partition (row count, date range, content hash)
//! - Schema and content-hash validation on read
//! - A `.lock` file held for the duration of each write batch

use crate::store::{parse_partition_name, PartitionStore, StoreError};
use chrono::NaiveDate;
use featurelab_core::domain::{Bar, EnrichedRow, Partition, ENRICHED_COLUMNS};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

const LOCK_FILE: &str = ".lock";
const LOCKED_READ_RETRIES: u32 = 20;
const LOCKED_READ_DELAY: Duration = Duration::from_millis(50);

/// Metadata sidecar for a stored partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionMeta {
    pub partition: String,
    pub ticker: String,
    pub year: i32,
    pub month: u32,
    pub row_count: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub content_hash: String,
    pub written_at: chrono::NaiveDateTime,
}

/// Exclusive write access to a store directory. Removes its lock file when
/// dropped, so the lock is released on every exit path.
#[derive(Debug)]
struct BatchLock {
    path: PathBuf,
}

impl BatchLock {
    fn acquire(dir: &Path) -> Result<Self, StoreError> {
        let path = dir.join(LOCK_FILE);
        match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(Self { path }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(StoreError::Locked {
                path: path.display().to_string(),
            }),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }
}

impl Drop for BatchLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to release store lock");
        }
    }
}

pub struct ParquetStore {
    dir: PathBuf,
    // Serializes batches from threads of this process; the lock file
    // guards against other processes.
    batch: Mutex<()>,
}

impl ParquetStore {
    /// Open (creating if needed) the store at `{root}/{database_name}`.
    pub fn open(root: impl AsRef<Path>, database_name: &str) -> Result<Self, StoreError> {
        let dir = root.as_ref().join(database_name);
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(Self {
            dir,
            batch: Mutex::new(()),
        })
    }

    /// Directory holding the partition files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn partition_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.parquet"))
    }

    fn meta_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.meta.json"))
    }

    /// Sidecar metadata for a partition, if present.
    pub fn meta(&self, name: &str) -> Result<Option<PartitionMeta>, StoreError> {
        parse_partition_name(name)?;
        let path = self.meta_path(name);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StoreError::Serialization(format!("{}: {e}", path.display())))
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    /// Replace one partition. Both files are staged before anything is
    /// renamed, and the previous parquet file is restored if the sidecar
    /// cannot be moved into place.
    fn write_partition(&self, partition: &Partition) -> Result<(), StoreError> {
        let name = partition.name();
        let mut df = rows_to_dataframe(&partition.rows)?;

        let meta = PartitionMeta {
            partition: name.clone(),
            ticker: partition.key.ticker.clone(),
            year: partition.key.year,
            month: partition.key.month,
            row_count: partition.rows.len(),
            start_date: partition.rows.first().map(|r| r.timestamp),
            end_date: partition.rows.last().map(|r| r.timestamp),
            content_hash: content_hash(&partition.rows)?,
            written_at: chrono::Local::now().naive_local(),
        };
        let meta_json =
            serde_json::to_string_pretty(&meta).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let path = self.partition_path(&name);
        let tmp_path = path.with_extension("parquet.tmp");
        let backup_path = path.with_extension("parquet.bak");
        let meta_path = self.meta_path(&name);
        let meta_tmp = meta_path.with_extension("json.tmp");

        let cleanup = || {
            let _ = fs::remove_file(&tmp_path);
            let _ = fs::remove_file(&meta_tmp);
        };

        // Stage
        if let Err(e) = write_parquet(&mut df, &tmp_path) {
            cleanup();
            return Err(e);
        }
        if let Err(e) = fs::write(&meta_tmp, meta_json) {
            cleanup();
            return Err(StoreError::io(&meta_tmp, e));
        }

        // Commit
        let had_previous = path.exists();
        if had_previous {
            if let Err(e) = fs::rename(&path, &backup_path) {
                cleanup();
                return Err(StoreError::io(&path, e));
            }
        }
        if let Err(e) = fs::rename(&tmp_path, &path) {
            if had_previous {
                let _ = fs::rename(&backup_path, &path);
            }
            cleanup();
            return Err(StoreError::io(&path, e));
        }
        if let Err(e) = fs::rename(&meta_tmp, &meta_path) {
            if had_previous {
                if let Err(restore) = fs::rename(&backup_path, &path) {
                    warn!(partition = %name, error = %restore, "failed to restore previous partition");
                }
            } else {
                let _ = fs::remove_file(&path);
            }
            cleanup();
            return Err(StoreError::io(&meta_path, e));
        }
        if had_previous {
            if let Err(e) = fs::remove_file(&backup_path) {
                warn!(path = %backup_path.display(), error = %e, "failed to remove partition backup");
            }
        }

        debug!(partition = %name, rows = meta.row_count, "wrote partition");
        Ok(())
    }

    fn read_verified(&self, name: &str) -> Result<Vec<EnrichedRow>, StoreError> {
        let path = self.partition_path(name);
        if !path.exists() {
            return Err(StoreError::NotFound(name.to_string()));
        }

        let rows = load_and_validate_parquet(name, &path)?;

        match self.meta(name)? {
            Some(meta) => {
                if meta.row_count != rows.len() || meta.content_hash != content_hash(&rows)? {
                    return Err(StoreError::Schema {
                        partition: name.to_string(),
                        message: "contents do not match metadata sidecar".into(),
                    });
                }
            }
            None => warn!(partition = name, "no metadata sidecar; skipping hash check"),
        }

        Ok(rows)
    }
}

impl PartitionStore for ParquetStore {
    fn write_batch(&self, partitions: &[Partition]) -> Result<usize, StoreError> {
        for p in partitions {
            parse_partition_name(&p.name())?;
        }

        let _guard = self.batch.lock().map_err(|_| StoreError::Poisoned)?;
        let _lock = BatchLock::acquire(&self.dir)?;

        for p in partitions {
            self.write_partition(p)?;
        }
        Ok(partitions.len())
    }

    fn read(&self, name: &str) -> Result<Vec<EnrichedRow>, StoreError> {
        parse_partition_name(name)?;
        let _guard = self.batch.lock().map_err(|_| StoreError::Poisoned)?;

        // Another process may be between the parquet and sidecar renames of
        // this partition. A mismatch under a live lock file is re-checked
        // once the lock clears.
        let mut attempts = 0;
        loop {
            match self.read_verified(name) {
                Err(StoreError::Schema { .. }) if attempts < LOCKED_READ_RETRIES && self.lock_path().exists() => {
                    attempts += 1;
                    debug!(partition = name, attempts, "store locked by a writer; re-reading");
                    thread::sleep(LOCKED_READ_DELAY);
                }
                outcome => return outcome,
            }
        }
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StoreError::io(&self.dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("parquet") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if parse_partition_name(stem).is_ok() {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn remove(&self, name: &str) -> Result<(), StoreError> {
        parse_partition_name(name)?;
        let path = self.partition_path(name);
        if !path.exists() {
            return Err(StoreError::NotFound(name.to_string()));
        }

        let _guard = self.batch.lock().map_err(|_| StoreError::Poisoned)?;
        let _lock = BatchLock::acquire(&self.dir)?;
        fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))?;
        let meta_path = self.meta_path(name);
        if meta_path.exists() {
            fs::remove_file(&meta_path).map_err(|e| StoreError::io(&meta_path, e))?;
        }
        Ok(())
    }
}

fn content_hash(rows: &[EnrichedRow]) -> Result<String, StoreError> {
    let bytes = serde_json::to_vec(rows).map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

/// 1970-01-01, the Date column's day zero.
fn epoch() -> NaiveDate {
    NaiveDate::default()
}

fn rows_to_dataframe(rows: &[EnrichedRow]) -> Result<DataFrame, StoreError> {
    let dates: Vec<i32> = rows
        .iter()
        .map(|r| (r.timestamp - epoch()).num_days() as i32)
        .collect();
    let bar_col = |f: fn(&EnrichedRow) -> f64| rows.iter().map(f).collect::<Vec<f64>>();

    let mut columns = vec![
        Column::new("timestamp".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| StoreError::Parquet(format!("date cast: {e}")))?,
        Column::new("open".into(), bar_col(|r| r.open)),
        Column::new("high".into(), bar_col(|r| r.high)),
        Column::new("low".into(), bar_col(|r| r.low)),
        Column::new("close".into(), bar_col(|r| r.close)),
        Column::new("volume".into(), bar_col(|r| r.volume)),
    ];
    for (i, name) in ENRICHED_COLUMNS[6..].iter().enumerate() {
        let values: Vec<Option<f64>> = rows.iter().map(|r| r.derived()[i]).collect();
        columns.push(Column::new((*name).into(), values));
    }

    DataFrame::new(columns).map_err(|e| StoreError::Parquet(format!("dataframe creation: {e}")))
}

fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<(), StoreError> {
    let file = fs::File::create(path).map_err(|e| StoreError::io(path, e))?;
    ParquetWriter::new(file)
        .finish(df)
        .map_err(|e| StoreError::Parquet(format!("write {}: {e}", path.display())))?;
    Ok(())
}

fn load_and_validate_parquet(name: &str, path: &Path) -> Result<Vec<EnrichedRow>, StoreError> {
    let file = fs::File::open(path).map_err(|e| StoreError::io(path, e))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| StoreError::Parquet(format!("read {}: {e}", path.display())))?;

    let schema_err = |message: String| StoreError::Schema {
        partition: name.to_string(),
        message,
    };

    for col_name in ENRICHED_COLUMNS {
        let column = df
            .column(col_name)
            .map_err(|_| schema_err(format!("missing column '{col_name}'")))?;
        let expected = if col_name == "timestamp" {
            DataType::Date
        } else {
            DataType::Float64
        };
        if column.dtype() != &expected {
            return Err(schema_err(format!(
                "column '{col_name}' has type {}, expected {expected}",
                column.dtype()
            )));
        }
    }

    dataframe_to_rows(&df).map_err(schema_err)
}

fn f64_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Float64Chunked, String> {
    df.column(name)
        .and_then(|c| c.f64())
        .map_err(|e| format!("{name} column: {e}"))
}

fn dataframe_to_rows(df: &DataFrame) -> Result<Vec<EnrichedRow>, String> {
    let date_ca = df
        .column("timestamp")
        .and_then(|c| c.date())
        .map_err(|e| format!("timestamp column: {e}"))?;
    let bar_cas = [
        f64_column(df, "open")?,
        f64_column(df, "high")?,
        f64_column(df, "low")?,
        f64_column(df, "close")?,
        f64_column(df, "volume")?,
    ];
    let derived_cas = ENRICHED_COLUMNS[6..]
        .iter()
        .map(|name| f64_column(df, name))
        .collect::<Result<Vec<_>, _>>()?;

    let n = df.height();
    let mut rows = Vec::with_capacity(n);
    for i in 0..n {
        let days = date_ca.get(i).ok_or_else(|| format!("null timestamp at row {i}"))?;
        let timestamp = epoch() + chrono::Duration::days(days as i64);

        let mut bar_values = [0.0; 5];
        for (slot, (ca, col)) in bar_values
            .iter_mut()
            .zip(bar_cas.iter().zip(&ENRICHED_COLUMNS[1..6]))
        {
            *slot = ca.get(i).ok_or_else(|| format!("null {col} at row {i}"))?;
        }
        let [open, high, low, close, volume] = bar_values;

        let mut derived = [None; 9];
        for (slot, ca) in derived.iter_mut().zip(&derived_cas) {
            *slot = ca.get(i);
        }

        let bar = Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        };
        rows.push(EnrichedRow::from_parts(&bar, derived));
    }

    Ok(rows)
}
