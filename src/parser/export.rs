use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use serde::Serialize;
use crate::parser::datalog::{DataLog, ParsedLine};
use crate::parser::ParserError;
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    /// Scaled values only, `", "` between fields, one line per entry.
    DelimitedText,
    /// Full JSON snapshot: raw values, factors and scaled values.
    Structured,
}
/// File types offered in the save dialog. `.txt` and `.csv` share a renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileType {
    Txt,
    Csv,
    Json,
}
impl FileType {
    pub const ALL: [FileType; 3] = [FileType::Txt, FileType::Csv, FileType::Json];
    pub fn extension(self) -> &'static str {
        match self {
            FileType::Txt => ".txt",
            FileType::Csv => ".csv",
            FileType::Json => ".json",
        }
    }
    pub fn format(self) -> ExportFormat {
        match self {
            FileType::Txt | FileType::Csv => ExportFormat::DelimitedText,
            FileType::Json => ExportFormat::Structured,
        }
    }
}
#[derive(Serialize)]
struct DocumentRef<'a> {
    data: &'a [ParsedLine],
}
#[cfg(test)]
#[derive(serde::Deserialize)]
struct Document {
    data: Vec<ParsedLine>,
}
pub fn render(log: &DataLog, format: ExportFormat) -> Result<Vec<u8>, ParserError> {
    match format {
        ExportFormat::DelimitedText => {
            let mut out = String::new();
            for line in log.lines() {
                // writing into a String cannot fail
                let _ = writeln!(out, "{}", line.display());
            }
            Ok(out.into_bytes())
        }
        ExportFormat::Structured => Ok(serde_json::to_vec(&DocumentRef { data: log.lines() })?),
    }
}
/// Reads a structured export back into its records.
///
/// Records whose three arrays differ in length are rejected.
#[cfg(test)]
pub fn parse_structured(bytes: &[u8]) -> Result<Vec<ParsedLine>, ParserError> {
    use serde::de::Error as _;
    let doc: Document = serde_json::from_slice(bytes)?;
    if let Some(index) = doc.data.iter().position(|line| !line.is_consistent()) {
        let msg = format!("record {index} has mismatched array lengths");
        return Err(serde_json::Error::custom(msg).into());
    }
    Ok(doc.data)
}
/// `filename` with the file type's extension appended, e.g. `data` -> `data.csv`.
pub fn export_path(filename: impl AsRef<Path>, file_type: FileType) -> PathBuf {
    let mut path = filename.as_ref().as_os_str().to_owned();
    path.push(file_type.extension());
    PathBuf::from(path)
}
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ParserError> {
    fs::write(path, bytes).map_err(|source| ParserError::ExportFailed {
        path: path.to_path_buf(),
        source,
    })
}
