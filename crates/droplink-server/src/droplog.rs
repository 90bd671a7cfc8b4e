//! CSV-backed durable drop log
//!
//! The one [`DropSink`] implementation: each accepted `DROP` event becomes
//! one row in a fixed 7-column CSV file, header-initialized on first use.
//! Appends are flushed per record; the file is reopened per call so an
//! externally rotated or deleted log heals on the next write.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::warn;

use droplink_core::{DropRecord, DropSink, SinkError};

/// Column headers, in persisted order.
const CSV_HEADER: [&str; 7] = [
    "PC_Time",
    "Device_Time",
    "Intensity",
    "Peak_G",
    "Height_m",
    "LDR_percent",
    "FLEX_percent",
];

// ----------------------------------------------------------------------------
// Row Mapping
// ----------------------------------------------------------------------------

/// On-disk row shape; field order must match [`CSV_HEADER`].
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    #[serde(rename = "PC_Time")]
    pc_time: String,
    #[serde(rename = "Device_Time")]
    device_time: String,
    #[serde(rename = "Intensity")]
    intensity: String,
    #[serde(rename = "Peak_G")]
    peak_g: String,
    #[serde(rename = "Height_m")]
    height: String,
    #[serde(rename = "LDR_percent")]
    ldr: String,
    #[serde(rename = "FLEX_percent")]
    flex: String,
}

impl From<&DropRecord> for CsvRow {
    fn from(record: &DropRecord) -> Self {
        CsvRow {
            pc_time: record.pc_time.clone(),
            device_time: record.device_time.clone(),
            intensity: record.intensity.clone(),
            peak_g: record.peak_g.clone(),
            height: record.height.clone(),
            ldr: record.ldr.clone(),
            flex: record.flex.clone(),
        }
    }
}

impl From<CsvRow> for DropRecord {
    fn from(row: CsvRow) -> Self {
        DropRecord {
            pc_time: row.pc_time,
            device_time: row.device_time,
            intensity: row.intensity,
            peak_g: row.peak_g,
            height: row.height,
            ldr: row.ldr,
            flex: row.flex,
        }
    }
}

fn csv_error(e: csv::Error) -> SinkError {
    SinkError::Record(e.to_string())
}

// ----------------------------------------------------------------------------
// Drop Log
// ----------------------------------------------------------------------------

/// Append-only CSV drop log.
pub struct CsvDropLog {
    path: PathBuf,
    /// Serializes appends; history reads only ever see whole flushed rows.
    write_lock: Mutex<()>,
}

impl CsvDropLog {
    /// Open the log at `path`, writing the header row if the file does not
    /// exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let log = CsvDropLog {
            path: path.into(),
            write_lock: Mutex::new(()),
        };
        log.ensure_schema()?;
        Ok(log)
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_schema(&self) -> Result<(), SinkError> {
        if self.path.exists() {
            return Ok(());
        }
        let file = std::fs::File::create(&self.path)?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(CSV_HEADER).map_err(csv_error)?;
        writer.flush()?;
        Ok(())
    }

    /// All persisted drop records, newest first. Rows that fail to parse are
    /// skipped with a warning rather than failing the whole read.
    pub fn history(&self) -> Result<Vec<DropRecord>, SinkError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path).map_err(csv_error)?;
        let mut records = Vec::new();
        for row in reader.deserialize::<CsvRow>() {
            match row {
                Ok(row) => records.push(row.into()),
                Err(e) => warn!("Skipping malformed drop log row: {}", e),
            }
        }
        records.reverse();
        Ok(records)
    }
}

impl DropSink for CsvDropLog {
    fn append(&self, record: &DropRecord) -> Result<(), SinkError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.ensure_schema()?;
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.serialize(CsvRow::from(record)).map_err(csv_error)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pc_time: &str, device_time: &str) -> DropRecord {
        DropRecord {
            pc_time: pc_time.to_string(),
            device_time: device_time.to_string(),
            intensity: "5".to_string(),
            peak_g: "3.0".to_string(),
            height: "1.2".to_string(),
            ldr: "55".to_string(),
            flex: "8".to_string(),
        }
    }

    #[test]
    fn test_schema_initialized_on_create() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drop_log.csv");
        let _log = CsvDropLog::new(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents.lines().next().unwrap(),
            "PC_Time,Device_Time,Intensity,Peak_G,Height_m,LDR_percent,FLEX_percent"
        );
    }

    #[test]
    fn test_append_persists_one_row_per_call() {
        let dir = tempfile::tempdir().unwrap();
        let log = CsvDropLog::new(dir.path().join("drop_log.csv")).unwrap();

        log.append(&record("2026-08-07 12:00:00", "100")).unwrap();

        let history = log.history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].pc_time, "2026-08-07 12:00:00");
        assert_eq!(history[0].device_time, "100");
        assert_eq!(history[0].peak_g, "3.0");
        assert_eq!(history[0].flex, "8");
    }

    #[test]
    fn test_history_is_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let log = CsvDropLog::new(dir.path().join("drop_log.csv")).unwrap();

        log.append(&record("2026-08-07 12:00:00", "100")).unwrap();
        log.append(&record("2026-08-07 12:05:00", "400")).unwrap();

        let history = log.history().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].device_time, "400");
        assert_eq!(history[1].device_time, "100");
    }

    #[test]
    fn test_missing_file_reads_as_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drop_log.csv");
        let log = CsvDropLog::new(&path).unwrap();

        std::fs::remove_file(&path).unwrap();
        assert!(log.history().unwrap().is_empty());

        // The next append recreates the file, header included.
        log.append(&record("2026-08-07 12:00:00", "100")).unwrap();
        assert_eq!(log.history().unwrap().len(), 1);
    }

    #[test]
    fn test_existing_log_is_not_truncated_on_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drop_log.csv");
        {
            let log = CsvDropLog::new(&path).unwrap();
            log.append(&record("2026-08-07 12:00:00", "100")).unwrap();
        }
        let log = CsvDropLog::new(&path).unwrap();
        assert_eq!(log.history().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_fields_survive_the_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let log = CsvDropLog::new(dir.path().join("drop_log.csv")).unwrap();

        // Missing DROP keys are persisted as empty strings, verbatim.
        log.append(&DropRecord {
            pc_time: "2026-08-07 12:00:00".to_string(),
            device_time: "100".to_string(),
            intensity: String::new(),
            peak_g: String::new(),
            height: String::new(),
            ldr: String::new(),
            flex: String::new(),
        })
        .unwrap();

        let history = log.history().unwrap();
        assert_eq!(history[0].intensity, "");
        assert_eq!(history[0].flex, "");
    }
}
