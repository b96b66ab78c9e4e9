//! CSV export of stored partitions.
//!
//! The header lists every enriched column in storage order. Values are
//! written in Rust's shortest round-trip float form, so parsing an export
//! reproduces the stored rows exactly. An undefined value is an empty cell
//! and parses back to `None`.

use crate::store::{PartitionStore, StoreError};
use chrono::NaiveDate;
use featurelab_core::domain::{Bar, EnrichedRow, ENRICHED_COLUMNS};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error at {path}: {message}")]
    Io { path: String, message: String },

    #[error("unexpected CSV header: expected {expected:?}, found {found:?}")]
    Header { expected: Vec<String>, found: Vec<String> },

    #[error("row {row}: invalid {column} value '{value}'")]
    Parse {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn fmt_value(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

/// Write rows as CSV with a header line.
pub fn write_csv<W: Write>(writer: W, rows: &[EnrichedRow]) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(ENRICHED_COLUMNS)?;

    for row in rows {
        let bar = row.bar();
        let mut record = vec![
            bar.timestamp.to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ];
        record.extend(row.derived().into_iter().map(fmt_value));
        wtr.write_record(&record)?;
    }

    wtr.flush().map_err(|e| ExportError::Io {
        path: "<writer>".into(),
        message: e.to_string(),
    })?;
    Ok(())
}

/// Write rows to an in-memory CSV string.
pub fn to_csv_string(rows: &[EnrichedRow]) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    write_csv(&mut buf, rows)?;
    String::from_utf8(buf).map_err(|e| ExportError::Io {
        path: "<string>".into(),
        message: e.to_string(),
    })
}

/// Parse an export produced by [`write_csv`].
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<EnrichedRow>, ExportError> {
    let mut rdr = csv::Reader::from_reader(reader);

    let found: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if found != ENRICHED_COLUMNS {
        return Err(ExportError::Header {
            expected: ENRICHED_COLUMNS.iter().map(|s| s.to_string()).collect(),
            found,
        });
    }

    let mut rows = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let cell = |i: usize| record.get(i).unwrap_or("");

        let parse_err = |i: usize| ExportError::Parse {
            row,
            column: ENRICHED_COLUMNS[i],
            value: cell(i).to_string(),
        };
        let required = |i: usize| cell(i).parse::<f64>().map_err(|_| parse_err(i));
        let optional = |i: usize| -> Result<Option<f64>, ExportError> {
            match cell(i) {
                "" => Ok(None),
                s => s.parse::<f64>().map(Some).map_err(|_| parse_err(i)),
            }
        };

        let bar = Bar {
            timestamp: cell(0).parse::<NaiveDate>().map_err(|_| parse_err(0))?,
            open: required(1)?,
            high: required(2)?,
            low: required(3)?,
            close: required(4)?,
            volume: required(5)?,
        };
        let mut derived = [None; 9];
        for (k, slot) in derived.iter_mut().enumerate() {
            *slot = optional(6 + k)?;
        }
        rows.push(EnrichedRow::from_parts(&bar, derived));
    }

    Ok(rows)
}

/// Export one stored partition to `path`.
pub fn export_partition(store: &dyn PartitionStore, name: &str, path: &Path) -> Result<usize, ExportError> {
    let rows = store.read(name)?;
    let file = std::fs::File::create(path).map_err(|e| ExportError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    write_csv(file, &rows)?;
    info!(partition = name, rows = rows.len(), path = %path.display(), "exported partition");
    Ok(rows.len())
}

/// Export every stored partition into `dir` as `{partition}.csv`.
pub fn export_all(store: &dyn PartitionStore, dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(dir).map_err(|e| ExportError::Io {
        path: dir.display().to_string(),
        message: e.to_string(),
    })?;

    store
        .list()?
        .iter()
        .map(|name| {
            let path = dir.join(format!("{name}.csv"));
            export_partition(store, name, &path).map(|_| path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(day: u32, close: f64) -> EnrichedRow {
        EnrichedRow::from_bar(&Bar {
            timestamp: NaiveDate::from_ymd_opt(2023, 4, day).unwrap(),
            open: close - 0.5,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_234_567.0,
        })
    }

    #[test]
    fn header_and_empty_cells() {
        let mut r = row(3, 101.0);
        r.rsi_14 = Some(42.5);
        let csv = to_csv_string(&[r]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), ENRICHED_COLUMNS.join(","));
        assert_eq!(
            lines.next().unwrap(),
            "2023-04-03,100.5,102,100,101,1234567,,,,,,,42.5,,"
        );
    }

    #[test]
    fn wrong_header_is_rejected() {
        let err = read_csv("date,open\n2023-04-03,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ExportError::Header { .. }));
    }

    #[test]
    fn bad_number_reports_cell() {
        let mut csv = to_csv_string(&[row(3, 1.0)]).unwrap();
        csv = csv.replace("1234567", "lots");
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ExportError::Parse { row: 0, column: "volume", .. }));
    }
}
