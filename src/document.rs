//! Document decoding: raw bytes into logical sheets of untyped cells.
//!
//! Workbooks (zip-based `PK..` or legacy compound `D0 CF ..`) go through
//! `calamine`; everything else is treated as delimited text with a sniffed
//! comma or semicolon delimiter.

use crate::error::{IngestError, Result};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use log::{debug, info, warn};
use std::io::Cursor;

/// Number of leading lines inspected when sniffing the text delimiter.
const DELIMITER_SNIFF_LINES: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Workbook date/time cell, kept as its serial value. Durations are
    /// fractions of a day.
    DateTime { serial: f64, is_duration: bool },
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }

    /// True for empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Display form used for header names and keyword checks.
    pub fn to_display_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            CellValue::Bool(b) => b.to_string(),
            CellValue::DateTime { serial, .. } => serial.to_string(),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => CellValue::DateTime {
                serial: dt.as_f64(),
                is_duration: dt.is_duration(),
            },
            Data::DateTimeIso(s) => CellValue::text(s.clone()),
            Data::DurationIso(s) => CellValue::text(s.clone()),
            Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
        }
    }
}

/// A document's logical worksheet as a grid of untyped cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawSheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Builds a sheet from string cells; empty strings become `CellValue::Empty`.
    pub fn from_strings(name: impl Into<String>, rows: &[Vec<&str>]) -> Self {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|c| CellValue::text(*c)).collect())
            .collect();
        Self::new(name, rows)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(CellValue::is_blank))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Zip container (xlsx, xlsm, ods).
    ZipWorkbook,
    /// Legacy compound document (xls).
    CompoundWorkbook,
    DelimitedText,
}

pub fn sniff_format(bytes: &[u8]) -> DocumentFormat {
    if bytes.starts_with(b"PK") {
        DocumentFormat::ZipWorkbook
    } else if bytes.starts_with(&[0xD0, 0xCF]) {
        DocumentFormat::CompoundWorkbook
    } else {
        DocumentFormat::DelimitedText
    }
}

/// Decodes a document into its sheets. An empty buffer yields no sheets.
pub fn decode_document(bytes: &[u8]) -> Result<Vec<RawSheet>> {
    if bytes.is_empty() {
        debug!("Empty document buffer, nothing to decode");
        return Ok(Vec::new());
    }

    let format = sniff_format(bytes);
    info!("Decoding {} byte document as {:?}", bytes.len(), format);

    match format {
        DocumentFormat::ZipWorkbook | DocumentFormat::CompoundWorkbook => decode_workbook(bytes),
        DocumentFormat::DelimitedText => decode_delimited(bytes).map(|sheet| vec![sheet]),
    }
}

fn decode_workbook(bytes: &[u8]) -> Result<Vec<RawSheet>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for name in &sheet_names {
        let range = match workbook.worksheet_range(name) {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping sheet '{}': {}", name, e);
                continue;
            }
        };
        sheets.push(range_to_raw_sheet(name, &range));
    }

    debug!("Workbook decoded into {} sheets", sheets.len());
    Ok(sheets)
}

fn range_to_raw_sheet(name: &str, range: &Range<Data>) -> RawSheet {
    let rows = range
        .rows()
        .map(|row| row.iter().map(CellValue::from).collect())
        .collect();
    RawSheet::new(name, rows)
}

/// Decodes the buffer as text: UTF-8 (BOM stripped) or, failing that,
/// Windows-1252 as written by older portal exports.
pub fn decode_text(bytes: &[u8]) -> Result<String> {
    if bytes.contains(&0) {
        return Err(IngestError::MalformedDocument(
            "binary content is neither a workbook nor delimited text".to_string(),
        ));
    }

    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text.to_string()),
        Err(_) => {
            let (text, _, had_errors) = encoding_rs::WINDOWS_1252.decode(bytes);
            if had_errors {
                return Err(IngestError::MalformedDocument(
                    "text is not valid UTF-8 or Windows-1252".to_string(),
                ));
            }
            debug!("Decoded delimited text as Windows-1252");
            Ok(text.into_owned())
        }
    }
}

/// Picks `;` when any of the leading lines carries an unquoted semicolon,
/// `,` otherwise. Dutch exports write decimal commas unquoted next to
/// semicolon delimiters, so semicolons win.
pub fn sniff_delimiter(text: &str) -> u8 {
    let has_semicolon = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(DELIMITER_SNIFF_LINES)
        .any(|line| {
            let mut in_quotes = false;
            for c in line.chars() {
                match c {
                    '"' => in_quotes = !in_quotes,
                    ';' if !in_quotes => return true,
                    _ => {}
                }
            }
            false
        });

    if has_semicolon {
        b';'
    } else {
        b','
    }
}

fn decode_delimited(bytes: &[u8]) -> Result<RawSheet> {
    let text = decode_text(bytes)?;
    parse_delimited(&text)
}

/// Splits delimited text into a single sheet. Quoted fields may contain the
/// delimiter, and doubled quotes are unescaped.
pub fn parse_delimited(text: &str) -> Result<RawSheet> {
    let delimiter = sniff_delimiter(text);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .double_quote(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(CellValue::text).collect());
    }

    debug!(
        "Delimited text split into {} rows using '{}'",
        rows.len(),
        delimiter as char
    );
    Ok(RawSheet::new("", rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_format() {
        assert_eq!(sniff_format(b"PK\x03\x04rest"), DocumentFormat::ZipWorkbook);
        assert_eq!(
            sniff_format(&[0xD0, 0xCF, 0x11, 0xE0]),
            DocumentFormat::CompoundWorkbook
        );
        assert_eq!(sniff_format(b"Datum;Omzet"), DocumentFormat::DelimitedText);
    }

    #[test]
    fn test_empty_buffer_has_no_sheets() {
        assert!(decode_document(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_semicolon_with_decimal_commas() {
        let sheet = parse_delimited("Datum;Omzet\n01-03-2026;1050,00\n").unwrap();
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[1][1], CellValue::Text("1050,00".to_string()));
    }

    #[test]
    fn test_quoted_fields_keep_embedded_delimiters() {
        let csv = "Datum,Manager\n2026-03-01,\"Jansen, P.\"\n2026-03-02,\"De \"\"Kok\"\"\"\n";
        let sheet = parse_delimited(csv).unwrap();
        assert_eq!(sheet.rows[1][1], CellValue::Text("Jansen, P.".to_string()));
        assert_eq!(sheet.rows[2][1], CellValue::Text("De \"Kok\"".to_string()));
    }

    #[test]
    fn test_quoted_semicolon_does_not_switch_delimiter() {
        assert_eq!(sniff_delimiter("a,\"b;c\"\n1,2\n"), b',');
        assert_eq!(sniff_delimiter("a;b\n1,5;2\n"), b';');
    }

    #[test]
    fn test_windows_1252_fallback() {
        // "€ 12,50" with the euro sign as Windows-1252 byte 0x80
        let bytes = b"Bedrag\n\x80 12,50\n";
        let text = decode_text(bytes).unwrap();
        assert!(text.contains("€ 12,50"));
    }

    #[test]
    fn test_binary_garbage_is_malformed() {
        let result = decode_document(&[0x01, 0x00, 0x02, 0x00]);
        assert!(matches!(result, Err(IngestError::MalformedDocument(_))));
    }

    #[test]
    fn test_bom_is_stripped() {
        let sheet = decode_document(b"\xEF\xBB\xBFDatum;Orders\n01-03-2026;45\n").unwrap();
        assert_eq!(sheet[0].rows[0][0], CellValue::Text("Datum".to_string()));
    }
}
