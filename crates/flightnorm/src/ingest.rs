//! Row file reading and NDJSON output.
//!
//! Source rows arrive as NDJSON, a JSON array of objects, or CSV with a header
//! row. Every row is mapped through [`FlightMessage::from_row`], so the three
//! formats share one key-matching and null-handling path. A malformed row is
//! logged and counted, never fatal; only I/O and top-level layout failures are
//! errors.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::message::FlightMessage;

/// Layout of an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFormat {
    /// Pick from the file extension.
    #[default]
    Auto,
    /// One JSON object per line.
    Ndjson,
    /// A single JSON array of objects.
    Json,
    /// Comma-separated values with a header row.
    Csv,
}

impl InputFormat {
    /// Resolve `Auto` from the extension: `.csv`, `.json`, anything else NDJSON.
    #[must_use]
    pub fn resolve(self, path: &Path) -> Self {
        if self != Self::Auto {
            return self;
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => Self::Csv,
            Some("json") => Self::Json,
            _ => Self::Ndjson,
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Auto => "auto",
            Self::Ndjson => "ndjson",
            Self::Json => "json",
            Self::Csv => "csv",
        };
        f.write_str(name)
    }
}

impl FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "ndjson" | "jsonl" => Ok(Self::Ndjson),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!(
                "unknown input format '{other}' (expected auto, ndjson, json or csv)"
            )),
        }
    }
}

/// Rows read from a file plus the number of rows that had to be skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport<T> {
    /// Rows that were read successfully, in file order.
    pub rows: Vec<T>,
    /// Rows that were malformed and skipped.
    pub skipped: usize,
}

impl<T> Default for IngestReport<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            skipped: 0,
        }
    }
}

impl<T> IngestReport<T> {
    fn skip(&mut self, row: usize, reason: &dyn fmt::Display) {
        warn!(row, reason = %reason, "Skipping malformed row");
        self.skipped += 1;
    }
}

/// Read flight messages from a file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read, or if a JSON file is
/// not an array.
pub fn read_messages(path: &Path, format: InputFormat) -> Result<IngestReport<FlightMessage>> {
    let format = format.resolve(path);
    let reader = open(path)?;

    let report = match format {
        InputFormat::Csv => parse_csv(reader)?,
        InputFormat::Json => parse_json_array(reader).map_err(|e| match e {
            Error::InvalidInput { message, .. } => Error::invalid_input(path, message),
            other => other,
        })?,
        InputFormat::Ndjson | InputFormat::Auto => parse_ndjson(reader)?,
    };

    debug!(
        path = %path.display(),
        %format,
        rows = report.rows.len(),
        skipped = report.skipped,
        "Read input file"
    );
    Ok(report)
}

/// Read any NDJSON file of serde-compatible rows, such as stored records.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn read_ndjson<T: DeserializeOwned>(path: &Path) -> Result<IngestReport<T>> {
    let mut report = IngestReport::default();
    for (index, line) in open(path)?.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(&line) {
            Ok(row) => report.rows.push(row),
            Err(e) => report.skip(index + 1, &e),
        }
    }
    Ok(report)
}

/// Parse NDJSON rows into messages.
///
/// # Errors
///
/// Returns an error if reading from `reader` fails.
pub fn parse_ndjson<R: BufRead>(reader: R) -> Result<IngestReport<FlightMessage>> {
    let mut report = IngestReport::default();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(&line) {
            Ok(Value::Object(row)) => report.rows.push(FlightMessage::from_row(&row)),
            Ok(_) => report.skip(index + 1, &"not a JSON object"),
            Err(e) => report.skip(index + 1, &e),
        }
    }
    Ok(report)
}

/// Parse a JSON array of row objects into messages.
///
/// # Errors
///
/// Returns an error if the document is not valid JSON or is not an array.
pub fn parse_json_array<R: Read>(reader: R) -> Result<IngestReport<FlightMessage>> {
    let document: Value = serde_json::from_reader(reader)?;
    let Value::Array(items) = document else {
        return Err(Error::invalid_input("<input>", "expected a JSON array of objects"));
    };

    let mut report = IngestReport::default();
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(row) => report.rows.push(FlightMessage::from_row(&row)),
            _ => report.skip(index + 1, &"not a JSON object"),
        }
    }
    Ok(report)
}

/// Parse CSV with a header row into messages.
///
/// Short rows are accepted; missing trailing cells count as absent.
///
/// # Errors
///
/// Returns an error if the header row cannot be read.
pub fn parse_csv<R: Read>(reader: R) -> Result<IngestReport<FlightMessage>> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut report = IngestReport::default();
    for (index, result) in rdr.records().enumerate() {
        match result {
            Ok(record) => {
                let row: Map<String, Value> = headers
                    .iter()
                    .zip(record.iter())
                    .map(|(key, cell)| (key.to_string(), Value::String(cell.to_string())))
                    .collect();
                report.rows.push(FlightMessage::from_row(&row));
            }
            Err(e) => report.skip(index + 1, &e),
        }
    }
    Ok(report)
}

/// Write items as NDJSON, one object per line. Returns the number written.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_ndjson<'a, W, T, I>(mut writer: W, items: I) -> Result<usize>
where
    W: Write,
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut written = 0;
    for item in items {
        serde_json::to_writer(&mut writer, item)?;
        writer.write_all(b"\n")?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

/// Create (or truncate) an output file for [`write_ndjson`].
///
/// # Errors
///
/// Returns [`Error::FileWrite`] if the file cannot be created.
pub fn create_output(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| Error::FileWrite {
            path: path.to_path_buf(),
            source,
        })
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| Error::FileRead {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;
    use std::io::Cursor;
    use std::path::PathBuf;

    #[test]
    fn test_resolve_by_extension() {
        let auto = InputFormat::Auto;
        assert_eq!(auto.resolve(Path::new("rows.csv")), InputFormat::Csv);
        assert_eq!(auto.resolve(Path::new("rows.JSON")), InputFormat::Json);
        assert_eq!(auto.resolve(Path::new("rows.ndjson")), InputFormat::Ndjson);
        assert_eq!(auto.resolve(Path::new("rows")), InputFormat::Ndjson);
        assert_eq!(
            InputFormat::Csv.resolve(Path::new("rows.json")),
            InputFormat::Csv
        );
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("CSV".parse::<InputFormat>().unwrap(), InputFormat::Csv);
        assert_eq!("jsonl".parse::<InputFormat>().unwrap(), InputFormat::Ndjson);
        assert!("xlsx".parse::<InputFormat>().is_err());
        assert_eq!(InputFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_parse_ndjson_skips_bad_lines() {
        init_test_logging();
        let input = concat!(
            "{\"SHR\": \"REG/FL1\", \"center\": \"Moscow\"}\n",
            "\n",
            "not json\n",
            "[1, 2]\n",
            "{\"dep\": \"-ATD 0705\"}\n",
        );
        let report = parse_ndjson(Cursor::new(input)).unwrap();
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.rows[0].region(), Some("Moscow"));
        assert_eq!(report.rows[1].dep(), Some("-ATD 0705"));
    }

    #[test]
    fn test_parse_json_array() {
        let input = r#"[{"SHR": "a"}, 5, {"ARR": "b"}]"#;
        let report = parse_json_array(Cursor::new(input)).unwrap();
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_parse_json_not_an_array() {
        let err = parse_json_array(Cursor::new(r#"{"SHR": "a"}"#)).unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));

        let err = parse_json_array(Cursor::new("{")).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_parse_csv() {
        let input = "SHR,DEP,ARR,Центр ЕС ОрВД\n\
                     REG/FL1,-ATD 0705,NaN,Moscow\n\
                     REG/FL2,,\n";
        let report = parse_csv(Cursor::new(input)).unwrap();
        assert_eq!(report.skipped, 0);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].shr(), Some("REG/FL1"));
        assert_eq!(report.rows[0].arr(), None);
        assert_eq!(report.rows[0].region(), Some("Moscow"));
        assert_eq!(report.rows[1].dep(), None);
        assert_eq!(report.rows[1].region(), None);
    }

    #[test]
    fn test_read_messages_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        std::fs::write(&path, "shr,dep\nREG/FL1,-ATD 0705\n").unwrap();

        let report = read_messages(&path, InputFormat::Auto).unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].dep(), Some("-ATD 0705"));
    }

    #[test]
    fn test_read_messages_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.json");
        std::fs::write(&path, "{}").unwrap();

        match read_messages(&path, InputFormat::Auto).unwrap_err() {
            Error::InvalidInput { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_messages(&PathBuf::from("/nonexistent/rows.ndjson"), InputFormat::Auto)
            .unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }

    #[test]
    fn test_create_output_in_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.ndjson");

        let err = create_output(&path).unwrap_err();
        assert!(matches!(err, Error::FileWrite { .. }));
        assert!(err.to_string().contains("out.ndjson"));
    }

    #[test]
    fn test_create_output_writes_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.ndjson");
        let messages = vec![FlightMessage::new(Some("REG/FL1"), None, None)];

        let writer = create_output(&path).unwrap();
        assert_eq!(write_ndjson(writer, &messages).unwrap(), 1);
        assert_eq!(read_ndjson::<FlightMessage>(&path).unwrap().rows, messages);
    }

    #[test]
    fn test_write_then_read_ndjson() {
        let messages = vec![
            FlightMessage::new(Some("REG/FL1"), None, None),
            FlightMessage::new(None, Some("-ATD 0705"), None).with_region("Moscow"),
        ];
        let mut out = Vec::new();
        assert_eq!(write_ndjson(&mut out, &messages).unwrap(), 2);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.ndjson");
        std::fs::write(&path, text).unwrap();
        let report: IngestReport<FlightMessage> = read_ndjson(&path).unwrap();
        assert_eq!(report.rows, messages);
    }
}
