use crate::error::{Result, StatementError};
use calamine::{open_workbook, Data, Reader, Xlsx};
use csv::ReaderBuilder;
use log::debug;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(Decimal),
    Text(String),
    Empty,
}

impl Cell {
    /// Interprets raw cell text the way a spreadsheet would: blank is empty,
    /// anything numeric is a number.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else if let Ok(number) = Decimal::from_str(trimmed) {
            Cell::Number(number)
        } else {
            Cell::Text(raw.to_string())
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) => write!(f, "{}", n.normalize()),
            Cell::Text(t) => f.write_str(t),
            Cell::Empty => Ok(()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<Decimal> for Cell {
    fn from(value: Decimal) -> Self {
        Cell::Number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(Decimal::from(value))
    }
}

/// One ledger line before normalization: item, debtor, creditor.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLedgerRow {
    pub item: Cell,
    pub debtor: Cell,
    pub creditor: Cell,
}

/// A tabular source exposing named sheets, e.g. a trial balance workbook with
/// one `{year}TB` sheet per fiscal year.
pub trait LedgerSource {
    fn sheet_names(&self) -> Vec<String>;

    /// Every row of the sheet, header rows included.
    fn read_sheet(&self, sheet: &str) -> Result<Vec<Vec<Cell>>>;

    fn has_sheet(&self, sheet: &str) -> bool {
        self.sheet_names().iter().any(|name| name == sheet)
    }
}

/// Skips the header block and splits the remaining rows into item, debtor and
/// creditor columns. Columns past the third are ignored.
pub fn extract_raw_rows(
    sheet: &str,
    rows: Vec<Vec<Cell>>,
    header_rows: usize,
) -> Result<Vec<RawLedgerRow>> {
    let data: Vec<Vec<Cell>> = rows.into_iter().skip(header_rows).collect();
    let width = data.iter().map(Vec::len).max().unwrap_or(0);

    if width < 3 {
        return Err(StatementError::MalformedSheet {
            sheet: sheet.to_string(),
            details: format!("Expected at least 3 columns, found {}.", width),
        });
    }

    Ok(data
        .into_iter()
        .map(|row| {
            let mut cells = row.into_iter();
            RawLedgerRow {
                item: cells.next().unwrap_or(Cell::Empty),
                debtor: cells.next().unwrap_or(Cell::Empty),
                creditor: cells.next().unwrap_or(Cell::Empty),
            }
        })
        .collect())
}

/// Workbook held entirely in memory. Serializes as `{ "2024TB": [[...], ...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemoryWorkbook {
    sheets: BTreeMap<String, Vec<Vec<Cell>>>,
}

impl InMemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        self.insert_sheet(name, rows);
        self
    }

    pub fn insert_sheet(&mut self, name: impl Into<String>, rows: Vec<Vec<Cell>>) {
        self.sheets.insert(name.into(), rows);
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl LedgerSource for InMemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.keys().cloned().collect()
    }

    fn read_sheet(&self, sheet: &str) -> Result<Vec<Vec<Cell>>> {
        self.sheets
            .get(sheet)
            .cloned()
            .ok_or_else(|| StatementError::MissingSheet {
                sheet: sheet.to_string(),
                available: self.sheet_names(),
            })
    }
}

/// A workbook exported as a directory of CSV files, one `<sheet>.csv` per sheet.
#[derive(Debug, Clone)]
pub struct CsvWorkbook {
    dir: PathBuf,
}

impl CsvWorkbook {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(StatementError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("workbook directory {} does not exist", dir.display()),
            )));
        }
        Ok(Self { dir })
    }

    fn sheet_path(&self, sheet: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", sheet))
    }
}

impl LedgerSource for CsvWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
                    .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    fn read_sheet(&self, sheet: &str) -> Result<Vec<Vec<Cell>>> {
        let path = self.sheet_path(sheet);
        if !path.is_file() {
            return Err(StatementError::MissingSheet {
                sheet: sheet.to_string(),
                available: self.sheet_names(),
            });
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(Cell::parse).collect());
        }

        debug!("Read {} rows from {}", rows.len(), path.display());
        Ok(rows)
    }
}

/// An `.xlsx` workbook read eagerly at open. Rows and columns keep their
/// absolute positions, so leading blank rows still count as header rows.
#[derive(Debug, Clone)]
pub struct XlsxWorkbook {
    sheets: Vec<(String, Vec<Vec<Cell>>)>,
}

impl XlsxWorkbook {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut workbook: Xlsx<_> = open_workbook(path)?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&name)?;
            let (first_row, first_col) = range.start().unwrap_or((0, 0));

            let mut rows: Vec<Vec<Cell>> = (0..first_row).map(|_| Vec::new()).collect();
            for row in range.rows() {
                let mut cells = vec![Cell::Empty; first_col as usize];
                cells.extend(row.iter().map(cell_from_data));
                rows.push(cells);
            }

            debug!("Read {} rows from sheet {} of {}", rows.len(), name, path.display());
            sheets.push((name, rows));
        }

        Ok(Self { sheets })
    }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Int(value) => Cell::Number(Decimal::from(*value)),
        Data::Float(value) => Decimal::from_f64(*value)
            .map(Cell::Number)
            .unwrap_or_else(|| Cell::Text(value.to_string())),
        Data::String(text) => Cell::parse(text),
        Data::Empty => Cell::Empty,
        other => Cell::Text(other.to_string()),
    }
}

impl LedgerSource for XlsxWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read_sheet(&self, sheet: &str) -> Result<Vec<Vec<Cell>>> {
        self.sheets
            .iter()
            .find(|(name, _)| name == sheet)
            .map(|(_, rows)| rows.clone())
            .ok_or_else(|| StatementError::MissingSheet {
                sheet: sheet.to_string(),
                available: self.sheet_names(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn header() -> Vec<Vec<Cell>> {
        vec![
            vec!["ACME LIMITED".into()],
            vec!["Trial balance".into()],
            vec!["Item".into(), "Debtor".into(), "Creditor".into()],
        ]
    }

    #[test]
    fn test_cell_parse() {
        assert_eq!(Cell::parse("  "), Cell::Empty);
        assert_eq!(Cell::parse("1200.50"), Cell::Number(dec!(1200.50)));
        assert_eq!(Cell::parse("Share capital"), Cell::Text("Share capital".to_string()));
    }

    #[test]
    fn test_extract_raw_rows_skips_header() {
        let mut rows = header();
        rows.push(vec!["Sales of goods".into(), Cell::Empty, Cell::from(1000_i64)]);
        rows.push(vec!["Purchases".into(), Cell::from(400_i64)]);

        let raw = extract_raw_rows("2024TB", rows, 3).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].creditor, Cell::Number(dec!(1000)));
        assert_eq!(raw[1].debtor, Cell::Number(dec!(400)));
        assert_eq!(raw[1].creditor, Cell::Empty);
    }

    #[test]
    fn test_extract_raw_rows_requires_three_columns() {
        let mut rows = header();
        rows.push(vec!["Sales of goods".into(), Cell::from(1000_i64)]);

        let err = extract_raw_rows("2024TB", rows, 3).unwrap_err();
        assert!(matches!(err, StatementError::MalformedSheet { .. }));
    }

    #[test]
    fn test_in_memory_workbook_from_json() {
        let json = r#"{
            "2024TB": [
                ["ACME"], ["TB"], ["Item", "Debtor", "Creditor"],
                ["Share capital", null, 10000]
            ]
        }"#;
        let workbook = InMemoryWorkbook::from_json(json).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["2024TB".to_string()]);

        let rows = workbook.read_sheet("2024TB").unwrap();
        assert_eq!(rows[3][1], Cell::Empty);
        assert_eq!(rows[3][2], Cell::Number(dec!(10000)));

        let err = workbook.read_sheet("2023TB").unwrap_err();
        assert!(matches!(err, StatementError::MissingSheet { .. }));
    }

    #[test]
    fn test_csv_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("2024TB.csv")).unwrap();
        writeln!(file, "ACME LIMITED").unwrap();
        writeln!(file, "Trial balance").unwrap();
        writeln!(file, "Item,Debtor,Creditor").unwrap();
        writeln!(file, "\"Property, plant and equipment\",5000,").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let workbook = CsvWorkbook::open(dir.path()).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["2024TB".to_string()]);
        assert!(workbook.has_sheet("2024TB"));

        let rows = workbook.read_sheet("2024TB").unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[3][0], Cell::Text("Property, plant and equipment".to_string()));
        assert_eq!(rows[3][1], Cell::Number(dec!(5000)));
        assert_eq!(rows[3][2], Cell::Empty);
    }

    #[test]
    fn test_xlsx_workbook() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("ledger.xlsx");

        let mut book = rust_xlsxwriter::Workbook::new();
        let sheet = book.add_worksheet().set_name("2024TB")?;
        // Row 0 stays blank; the used range starts at row 1.
        sheet.write_string(1, 0, "ACME LIMITED")?;
        sheet.write_string(2, 0, "Item")?;
        sheet.write_string(2, 1, "Debtor")?;
        sheet.write_string(2, 2, "Creditor")?;
        sheet.write_string(3, 0, "Share capital")?;
        sheet.write_number(3, 2, 10000.0)?;
        sheet.write_string(4, 0, "Cash and bank balances")?;
        sheet.write_number(4, 1, 1250.5)?;
        sheet.write_string(4, 2, " 0 ")?;
        book.add_worksheet().set_name("Notes")?;
        book.save(&path)?;

        let workbook = XlsxWorkbook::open(&path)?;
        assert_eq!(workbook.sheet_names(), vec!["2024TB".to_string(), "Notes".to_string()]);

        let rows = workbook.read_sheet("2024TB")?;
        assert!(rows[0].is_empty());
        let raw = extract_raw_rows("2024TB", rows, 3)?;
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].item, Cell::Text("Share capital".to_string()));
        assert_eq!(raw[0].debtor, Cell::Empty);
        assert_eq!(raw[0].creditor, Cell::Number(dec!(10000)));
        assert_eq!(raw[1].debtor, Cell::Number(dec!(1250.5)));
        assert_eq!(raw[1].creditor, Cell::Number(dec!(0)));

        match workbook.read_sheet("2023TB") {
            Err(StatementError::MissingSheet { sheet, available }) => {
                assert_eq!(sheet, "2023TB");
                assert_eq!(available, vec!["2024TB".to_string(), "Notes".to_string()]);
            }
            other => panic!("expected MissingSheet, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_xlsx_workbook_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = XlsxWorkbook::open(dir.path().join("absent.xlsx")).unwrap_err();
        assert!(matches!(err, StatementError::XlsxError(_)));
    }
}
