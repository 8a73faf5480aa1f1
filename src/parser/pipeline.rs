use std::path::{Path, PathBuf};
use log::{debug, info};
use crate::parser::bootstrap::{bootstrap, Bootstrap};
use crate::parser::calibration::{ChannelCalibration, ResizeStep};
use crate::parser::datalog::{DataLog, ParsedLine};
use crate::parser::export::{self, ExportFormat, FileType};
use crate::parser::source::LineSource;
use crate::parser::tokenizer::{tokenize, Delimiter};
use crate::parser::ParserError;
/// A line that made it into the log, plus the calibration slots that had to
/// change to fit it.
#[derive(Clone, Debug, PartialEq)]
pub struct Ingested {
    pub line: ParsedLine,
    pub steps: Vec<ResizeStep>,
}
/// Result of one ingestion attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum Tick {
    Parsed(Ingested),
    /// The transport had no complete line this time round.
    Skipped,
    /// Ingestion is switched off; the transport was not read.
    Paused,
}
/// Owns the session state: delimiter, calibration vector and data log.
///
/// Commands from the UI arrive as method calls; the transport is passed in per
/// call so the log outlives any single connection.
#[derive(Default)]
pub struct IngestionPipeline {
    delimiter: Option<Delimiter>,
    calibration: ChannelCalibration,
    log: DataLog,
    ingesting: bool,
}
impl IngestionPipeline {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn delimiter(&self) -> Option<&Delimiter> {
        self.delimiter.as_ref()
    }
    pub fn calibration(&self) -> &ChannelCalibration {
        &self.calibration
    }
    #[cfg(test)]
    pub fn log(&self) -> &DataLog {
        &self.log
    }
    pub fn is_ingesting(&self) -> bool {
        self.ingesting
    }
    /// Configures the delimiter. Locked while ingestion runs.
    pub fn set_delimiter(&mut self, text: &str) -> Result<&Delimiter, ParserError> {
        if self.ingesting {
            return Err(ParserError::DelimiterLocked);
        }
        let delimiter = Delimiter::new(text)?;
        info!("delimiter set to {delimiter:?}");
        Ok(&*self.delimiter.insert(delimiter))
    }
    /// Primes the calibration vector from one line of a fresh connection.
    pub fn bootstrap<S: LineSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<Bootstrap, ParserError> {
        let delimiter = self.delimiter.as_ref().ok_or(ParserError::DelimiterNotSet)?;
        bootstrap(source, delimiter, &mut self.calibration)
    }
    /// Flips ingestion on or off, discarding stale transport input either way.
    pub fn toggle_ingestion<S: LineSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<bool, ParserError> {
        if !self.ingesting && self.delimiter.is_none() {
            return Err(ParserError::DelimiterNotSet);
        }
        source.discard_input()?;
        self.ingesting = !self.ingesting;
        info!(
            "ingestion {}",
            if self.ingesting { "started" } else { "stopped" }
        );
        Ok(self.ingesting)
    }
    /// Stops ingestion without touching the transport, e.g. after it went away.
    pub fn halt(&mut self) {
        if self.ingesting {
            info!("ingestion stopped");
        }
        self.ingesting = false;
    }
    /// Applies a user calibration override typed as text. Returns whether it
    /// took effect; bad indices and non-numeric text are ignored.
    pub fn set_calibration(&mut self, index: usize, value: &str) -> bool {
        let applied = self.calibration.set_from_str(index, value);
        if !applied {
            debug!("ignored calibration override {value:?} for channel {index}");
        }
        applied
    }
    /// Tokenizes, reconciles, scales and appends one raw line.
    pub fn ingest(&mut self, raw_line: &str) -> Result<Ingested, ParserError> {
        let delimiter = self.delimiter.as_ref().ok_or(ParserError::DelimiterNotSet)?;
        let raw_values = tokenize(raw_line, delimiter);
        let steps = self.calibration.reconcile(raw_values.len());
        let factors = self.calibration.snapshot();
        let line = ParsedLine::new(raw_values, &factors);
        self.log.append(line.clone());
        Ok(Ingested { line, steps })
    }
    /// One polling tick: read at most one line and ingest it.
    pub fn pump_once<S: LineSource + ?Sized>(&mut self, source: &mut S) -> Result<Tick, ParserError> {
        if !self.ingesting {
            return Ok(Tick::Paused);
        }
        let Some(raw_line) = source.read_line()? else {
            return Ok(Tick::Skipped);
        };
        Ok(Tick::Parsed(self.ingest(&raw_line)?))
    }
    pub fn window(&self, n: usize) -> &[ParsedLine] {
        self.log.window(n)
    }
    pub fn export(&self, format: ExportFormat) -> Result<Vec<u8>, ParserError> {
        export::render(&self.log, format)
    }
    /// Writes the whole log to `filename` plus the file type's extension.
    pub fn save(&self, filename: impl AsRef<Path>, file_type: FileType) -> Result<PathBuf, ParserError> {
        let path = export::export_path(filename, file_type);
        let bytes = self.export(file_type.format())?;
        export::write_file(&path, &bytes)?;
        info!("exported {} line(s) to {}", self.log.len(), path.display());
        Ok(path)
    }
}
