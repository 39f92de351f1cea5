//! PDF report naming and saving

use elephant_client::ReportKind;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

/// Filename suffix of a report
#[must_use]
pub const fn suffix(kind: ReportKind) -> &'static str {
    match kind {
        ReportKind::AttendeeList => "Attendees",
        ReportKind::Accounting => "Accounting",
        ReportKind::EmailList => "Emails",
    }
}

/// Title shown next to the download
#[must_use]
pub const fn label(kind: ReportKind) -> &'static str {
    match kind {
        ReportKind::AttendeeList => "Attendee List",
        ReportKind::Accounting => "Financial Report",
        ReportKind::EmailList => "Email List",
    }
}

/// `<title>_<suffix>.pdf`, with every non-word character of the title replaced by `_`
#[must_use]
pub fn report_filename(title: &str, kind: ReportKind) -> String {
    let sanitized: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("{sanitized}_{}.pdf", suffix(kind))
}

/// Report kind as typed on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportArg(pub ReportKind);

impl FromStr for ReportArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "attendees" | "attendee-list" => Ok(Self(ReportKind::AttendeeList)),
            "accounting" | "financial" => Ok(Self(ReportKind::Accounting)),
            "emails" | "email-list" => Ok(Self(ReportKind::EmailList)),
            other => Err(format!(
                "unknown report '{other}' (expected attendees, accounting or emails)"
            )),
        }
    }
}

impl fmt::Display for ReportArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(label(self.0))
    }
}

/// Destination for downloaded report bytes
pub trait ReportSink: Send + Sync {
    /// Store `bytes` under `filename`, returning where they ended up
    ///
    /// # Errors
    ///
    /// Returns the I/O error; nothing is left behind on failure.
    fn save(&self, filename: &str, bytes: &[u8]) -> io::Result<PathBuf>;
}

/// Writes reports into a directory
///
/// Bytes go to `<name>.part` first and are renamed into place once fully
/// written, so an interrupted save never leaves a truncated PDF.
#[derive(Clone, Debug)]
pub struct FsReportSink {
    directory: PathBuf,
}

impl FsReportSink {
    /// Save into `directory` (created on first save)
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Target directory
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl ReportSink for FsReportSink {
    fn save(&self, filename: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        std::fs::create_dir_all(&self.directory)?;

        let target = self.directory.join(filename);
        let partial = self.directory.join(format!("{filename}.part"));

        if let Err(e) = std::fs::write(&partial, bytes).and_then(|()| std::fs::rename(&partial, &target)) {
            let _ = std::fs::remove_file(&partial);
            return Err(e);
        }

        tracing::info!(path = %target.display(), bytes = bytes.len(), "Saved report");
        Ok(target)
    }
}

/// Keeps saved reports in memory
#[derive(Debug, Default)]
pub struct MemoryReportSink {
    saved: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryReportSink {
    /// Empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything saved so far as `(filename, bytes)`
    #[must_use]
    pub fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ReportSink for MemoryReportSink {
    fn save(&self, filename: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((filename.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(filename))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    #[test]
    fn test_filename_replaces_non_word_characters() {
        assert_eq!(
            report_filename("Elephant: Pride Edition!", ReportKind::Accounting),
            "Elephant__Pride_Edition__Accounting.pdf"
        );
        assert_eq!(
            report_filename("Año_Nuevo 2025", ReportKind::EmailList),
            "A_o_Nuevo_2025_Emails.pdf"
        );
    }

    #[test]
    fn test_report_args() {
        assert_eq!("Accounting".parse::<ReportArg>(), Ok(ReportArg(ReportKind::Accounting)));
        assert_eq!("attendees".parse::<ReportArg>(), Ok(ReportArg(ReportKind::AttendeeList)));
        assert!("csv".parse::<ReportArg>().is_err());
        assert_eq!(ReportArg(ReportKind::Accounting).to_string(), "Financial Report");
    }

    #[test]
    fn test_fs_sink_writes_final_file_only() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FsReportSink::new(dir.path().join("reports"));

        let path = sink.save("Elephant_Emails.pdf", b"%PDF-1.4").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");
        let names: Vec<String> = std::fs::read_dir(sink.directory())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["Elephant_Emails.pdf"]);
    }

    #[test]
    fn test_fs_sink_failure_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the directory should be makes every save fail
        let blocked = dir.path().join("reports");
        std::fs::write(&blocked, b"not a directory").unwrap();

        let sink = FsReportSink::new(&blocked);
        assert!(sink.save("x.pdf", b"data").is_err());
        assert_eq!(std::fs::read(&blocked).unwrap(), b"not a directory");
    }
}
