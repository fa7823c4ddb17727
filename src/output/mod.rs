use chrono::NaiveDate;

use crate::auth::Role;
use crate::cli::OutputFormat;
use crate::error::Result;
use crate::expiry::ExpiryReport;
use crate::history::HistoryEntry;
use crate::model::{StorageUnit, StorageUnits};
use crate::stats::Statistics;

pub mod json;
pub mod terminal;

/// Something a command wants to show the user.
pub enum Report<'a> {
    Status {
        units: &'a StorageUnits,
        expiry: &'a ExpiryReport,
        window: i64,
    },
    Units(&'a StorageUnits),
    Items {
        units: Vec<(&'a str, &'a StorageUnit)>,
        today: NaiveDate,
    },
    KnownItems(&'a [String]),
    History(&'a [&'a HistoryEntry]),
    /// `None` when there is no history yet
    Stats(Option<&'a Statistics>),
    Users(&'a [(String, Role)]),
}

pub trait OutputSink {
    fn emit(&mut self, report: &Report<'_>) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
}

pub fn sink_for(format: OutputFormat) -> Box<dyn OutputSink> {
    match format {
        OutputFormat::Terminal => Box::new(terminal::TerminalSink::new(Box::new(std::io::stdout()))),
        OutputFormat::Json => Box::new(json::JsonSink::new(Box::new(std::io::stdout()))),
    }
}

/// Render one report to stdout in `format`.
pub fn show(format: OutputFormat, report: &Report<'_>) -> Result<()> {
    let mut sink = sink_for(format);
    sink.emit(report)?;
    sink.flush()
}

/// Shared writer handle so tests can read back what a sink wrote.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct Capture(pub std::rc::Rc<std::cell::RefCell<Vec<u8>>>);

#[cfg(test)]
impl Capture {
    pub fn text(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

#[cfg(test)]
impl std::io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
