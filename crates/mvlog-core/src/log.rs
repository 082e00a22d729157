//! CSV log sessions.
//!
//! A [`LogSession`] buffers CSV rows in memory between "start logging" and
//! either a save or a discard. Rows are plain comma-separated base-unit
//! values in registry order, each value followed by a comma and each row by
//! a newline; there is no header. Office imports shrug at the trailing
//! comma, and keeping it makes saved files match what this tool has always
//! written.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::info;

use crate::error::{Error, Result};

/// An in-memory buffer of CSV rows with the timing state that gates them.
#[derive(Debug, Clone)]
pub struct LogSession {
    rows: String,
    row_count: usize,
    started_at: Instant,
    last_row_at: Instant,
}

impl LogSession {
    /// Begin an empty session at `now`.
    ///
    /// The first row becomes due one full interval after this point.
    #[must_use]
    pub fn begin(now: Instant) -> Self {
        Self {
            rows: String::new(),
            row_count: 0,
            started_at: now,
            last_row_at: now,
        }
    }

    /// Whether a row should be appended at `now` for the given interval.
    #[must_use]
    pub fn row_due(&self, now: Instant, interval: Duration) -> bool {
        now.duration_since(self.last_row_at) >= interval
    }

    /// Append one row of base-unit values and mark `now` as the last row
    /// time.
    pub fn append_row(&mut self, values: &[f64], now: Instant) {
        for value in values {
            self.rows.push_str(&value.to_string());
            self.rows.push(',');
        }
        self.rows.push('\n');
        self.row_count += 1;
        self.last_row_at = now;
    }

    /// Whether no row has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Number of recorded rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// When the session began.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// The buffered CSV text.
    #[must_use]
    pub fn buffer(&self) -> &str {
        &self.rows
    }

    /// Write the buffer to `path`, forcing a `.csv` extension.
    ///
    /// Returns the path actually written.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be written; the buffer is untouched in
    /// that case.
    pub fn save_to(&self, path: &Path) -> Result<PathBuf> {
        let path = force_csv_extension(path);
        fs::write(&path, self.rows.as_bytes())
            .map_err(|source| Error::log_write(path.clone(), source))?;
        info!(path = %path.display(), rows = self.row_count, "log saved");
        Ok(path)
    }
}

/// Append `.csv` to a filename that does not already end in it.
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
///
/// use mvlog_core::log::force_csv_extension;
///
/// assert_eq!(force_csv_extension(Path::new("export")), PathBuf::from("export.csv"));
/// assert_eq!(force_csv_extension(Path::new("export.csv")), PathBuf::from("export.csv"));
/// ```
#[must_use]
pub fn force_csv_extension(path: &Path) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == "csv") {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_os_string();
    name.push(".csv");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_carry_a_trailing_comma_and_newline() {
        let start = Instant::now();
        let mut session = LogSession::begin(start);
        session.append_row(&[50.0, 0.25], start + Duration::from_secs(1));
        session.append_row(&[51.0, 0.25], start + Duration::from_secs(2));

        assert_eq!(session.buffer(), "50,0.25,\n51,0.25,\n");
        assert_eq!(session.row_count(), 2);
    }

    #[test]
    fn first_row_is_due_one_interval_after_start() {
        let start = Instant::now();
        let session = LogSession::begin(start);
        let interval = Duration::from_secs(1);

        assert!(!session.row_due(start, interval));
        assert!(!session.row_due(start + Duration::from_millis(999), interval));
        assert!(session.row_due(start + Duration::from_secs(1), interval));
    }

    #[test]
    fn row_due_measures_from_the_last_row() {
        let start = Instant::now();
        let interval = Duration::from_secs(1);
        let mut session = LogSession::begin(start);

        session.append_row(&[1.0], start + Duration::from_secs(1));
        assert!(!session.row_due(start + Duration::from_millis(1400), interval));
        assert!(session.row_due(start + Duration::from_secs(2), interval));
    }

    #[test]
    fn csv_extension_is_forced_like_a_string_suffix() {
        assert_eq!(
            force_csv_extension(Path::new("export")),
            PathBuf::from("export.csv")
        );
        assert_eq!(
            force_csv_extension(Path::new("export.csv")),
            PathBuf::from("export.csv")
        );
        // Only the exact suffix counts; anything else gets .csv appended.
        assert_eq!(
            force_csv_extension(Path::new("report.txt")),
            PathBuf::from("report.txt.csv")
        );
        assert_eq!(
            force_csv_extension(Path::new("export.CSV")),
            PathBuf::from("export.CSV.csv")
        );
    }

    #[test]
    fn save_writes_the_buffer_and_returns_the_forced_path() {
        let dir = tempfile::tempdir().unwrap();
        let start = Instant::now();
        let mut session = LogSession::begin(start);
        session.append_row(&[50.0], start + Duration::from_secs(1));

        let requested = dir.path().join("run-1");
        let written = session.save_to(&requested).unwrap();

        assert_eq!(written, dir.path().join("run-1.csv"));
        assert_eq!(fs::read_to_string(&written).unwrap(), "50,\n");
    }

    #[test]
    fn save_into_a_missing_directory_reports_the_path() {
        let start = Instant::now();
        let mut session = LogSession::begin(start);
        session.append_row(&[1.0], start);

        let err = session
            .save_to(Path::new("/definitely/not/here/out"))
            .unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here/out.csv"));
    }
}
