use std::path::PathBuf;
use thiserror::Error;
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("delimiter must not be empty")]
    EmptyDelimiter,
    #[error("delimiter cannot change while ingestion is running")]
    DelimiterLocked,
    #[error("no delimiter configured; set one before starting ingestion")]
    DelimiterNotSet,
    #[error("serial port {port} is unavailable: {source}")]
    PortUnavailable {
        port: String,
        #[source]
        source: serialport::Error,
    },
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
    #[error("failed to export to {}: {source}", .path.display())]
    ExportFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("structured document error: {0}")]
    Json(#[from] serde_json::Error),
}
impl From<serialport::Error> for ParserError {
    fn from(value: serialport::Error) -> Self {
        ParserError::Transport(value.into())
    }
}
