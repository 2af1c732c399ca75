//! On-disk artifacts: the latest quiz snapshot (single slot, overwritten)
//! and the append-only CSV score log.
//!
//! Neither file is locked. Two processes pointed at the same paths can
//! interleave their writes.

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::QuizError;
use crate::quiz::Quiz;
use crate::session::SessionResult;

/// `YYYY-MM-DD HH:MM`
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One line of the score log. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Topic")]
    pub topic: String,
    #[serde(rename = "Score")]
    pub score: u32,
    #[serde(rename = "Total")]
    pub total: u32,
    #[serde(rename = "Seed")]
    pub seed: i64,
}

impl From<&SessionResult> for ReportRow {
    fn from(result: &SessionResult) -> Self {
        Self {
            date: result.timestamp().format(DATE_FORMAT).to_string(),
            topic: result.topic().to_string(),
            score: result.score(),
            total: result.total(),
            seed: result.seed(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportStore {
    snapshot_path: PathBuf,
    report_path: PathBuf,
}

impl ReportStore {
    pub fn new(snapshot_path: impl Into<PathBuf>, report_path: impl Into<PathBuf>) -> Self {
        Self { snapshot_path: snapshot_path.into(), report_path: report_path.into() }
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }

    /// Overwrite the snapshot with `quiz` as pretty-printed JSON.
    pub fn snapshot(&self, quiz: &Quiz) -> Result<(), QuizError> {
        let mut json = serde_json::to_string_pretty(quiz)?;
        json.push('\n');
        fs::write(&self.snapshot_path, json)?;
        info!(path = %self.snapshot_path.display(), items = quiz.items.len(), "Quiz snapshot saved");
        Ok(())
    }

    /// Read the snapshot back, with the same checks as provider output.
    pub fn load_snapshot(&self) -> Result<Quiz, QuizError> {
        let text = fs::read_to_string(&self.snapshot_path)?;
        Quiz::from_model_text(&text)
    }

    /// Persist a finished session: the snapshot (when `save_snapshot` is
    /// set) and then the log row.
    pub fn record(&self, quiz: &Quiz, result: &SessionResult, save_snapshot: bool) -> Result<(), QuizError> {
        if save_snapshot {
            self.snapshot(quiz)?;
        }
        self.append(result)
    }

    /// Append one row to the log, writing the header first when the log is
    /// new or empty.
    pub fn append(&self, result: &SessionResult) -> Result<(), QuizError> {
        let needs_header = match fs::metadata(&self.report_path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };

        let file = OpenOptions::new().create(true).append(true).open(&self.report_path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);
        writer.serialize(ReportRow::from(result))?;
        writer.flush()?;

        debug!(header = needs_header, "Report row written");
        info!(path = %self.report_path.display(), score = result.score(), total = result.total(), "Session appended to report");
        Ok(())
    }

    /// All rows of the log, oldest first; empty when there is no log yet.
    pub fn history(&self) -> Result<Vec<ReportRow>, QuizError> {
        let file = match fs::File::open(&self.report_path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut reader = csv::Reader::from_reader(file);
        let rows = reader.deserialize().collect::<Result<Vec<ReportRow>, _>>()?;
        Ok(rows)
    }
}
