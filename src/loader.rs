use crate::chart_of_accounts::CategoryTaxonomy;
use crate::engine::Aggregator;
use crate::error::{Result, StatementError};
use crate::ingestion::{extract_raw_rows, Cell, LedgerSource, RawLedgerRow};
use crate::schema::EngineConfig;
use crate::statement::FinancialStatement;
use crate::utils::Precision;
use log::{debug, info};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Label of the totals row at the foot of each sheet.
pub const TOTALS_LABEL: &str = "合計";
/// Label of the director signature row.
pub const SIGNATURE_LABEL: &str = "董事簽名：";

const VALID_ITEM_NAME: &str = r"^[a-zA-Z\s/\-,.']+$";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLedgerRow {
    /// Trimmed, lower-cased item name. Never empty.
    pub item_name: String,
    pub debtor: Decimal,
    pub creditor: Decimal,
}

impl NormalizedLedgerRow {
    pub fn new(item_name: &str, debtor: Decimal, creditor: Decimal) -> Self {
        Self {
            item_name: item_name.trim().to_lowercase(),
            debtor,
            creditor,
        }
    }
}

/// Reads the current and prior year trial balances out of a workbook.
pub struct LedgerLoader<'a> {
    config: EngineConfig,
    taxonomy: &'a CategoryTaxonomy,
}

impl<'a> LedgerLoader<'a> {
    pub fn new(config: EngineConfig, taxonomy: &'a CategoryTaxonomy) -> Self {
        Self { config, taxonomy }
    }

    pub fn load<S: LedgerSource + ?Sized>(&self, source: &S) -> Result<LoadedLedger<'a>> {
        let name_pattern = Regex::new(VALID_ITEM_NAME)?;
        let current_year = self.config.current_year;
        let previous_year = self.config.previous_year();

        let mut current = self.load_sheet(source, current_year, &name_pattern)?;

        let mut prior = if self.config.first_year {
            debug!("First reporting year, prior-year ledger left empty");
            Vec::new()
        } else {
            self.load_sheet(source, previous_year, &name_pattern)?
        };

        let precision = Precision::infer(
            current
                .iter()
                .chain(prior.iter())
                .flat_map(|row| [&row.debtor, &row.creditor]),
        );
        debug!("Inferred ledger precision: {:?}", precision);

        for row in current.iter_mut().chain(prior.iter_mut()) {
            row.debtor = precision.apply(row.debtor);
            row.creditor = precision.apply(row.creditor);
        }

        info!(
            "Loaded trial balances for {} ({} rows) and {} ({} rows)",
            current_year,
            current.len(),
            previous_year,
            prior.len()
        );

        Ok(LoadedLedger {
            current_year,
            first_year: self.config.first_year,
            current,
            prior,
            precision,
            taxonomy: self.taxonomy,
        })
    }

    fn load_sheet<S: LedgerSource + ?Sized>(
        &self,
        source: &S,
        year: i32,
        name_pattern: &Regex,
    ) -> Result<Vec<NormalizedLedgerRow>> {
        let sheet = EngineConfig::sheet_name(year);
        if !source.has_sheet(&sheet) {
            return Err(StatementError::MissingSheet {
                sheet,
                available: source.sheet_names(),
            });
        }

        let raw = extract_raw_rows(&sheet, source.read_sheet(&sheet)?, self.config.header_rows)?;
        let rows = normalize_rows(&sheet, raw, name_pattern)?;
        debug!("Sheet {} yielded {} ledger rows", sheet, rows.len());
        Ok(rows)
    }
}

fn normalize_rows(
    sheet: &str,
    raw: Vec<RawLedgerRow>,
    name_pattern: &Regex,
) -> Result<Vec<NormalizedLedgerRow>> {
    let mut rows = Vec::with_capacity(raw.len());

    for row in raw {
        if row.item.is_blank() {
            continue;
        }
        let item_name = row.item.to_string().trim().to_lowercase();

        if item_name != TOTALS_LABEL
            && item_name != SIGNATURE_LABEL
            && !name_pattern.is_match(&item_name)
        {
            return Err(StatementError::InvalidItemName {
                sheet: sheet.to_string(),
                item: row.item.to_string().trim().to_string(),
            });
        }

        rows.push(NormalizedLedgerRow {
            debtor: coerce_amount(sheet, &item_name, "Debtor", &row.debtor)?,
            creditor: coerce_amount(sheet, &item_name, "Creditor", &row.creditor)?,
            item_name,
        });
    }

    Ok(rows)
}

fn coerce_amount(sheet: &str, item: &str, column: &str, cell: &Cell) -> Result<Decimal> {
    match cell {
        Cell::Empty => Ok(Decimal::ZERO),
        Cell::Number(value) => Ok(*value),
        Cell::Text(text) if text.trim().is_empty() => Ok(Decimal::ZERO),
        Cell::Text(text) => {
            Decimal::from_str(text.trim()).map_err(|_| StatementError::MalformedSheet {
                sheet: sheet.to_string(),
                details: format!(
                    "Error in data conversion: non-numeric {} value '{}' for item '{}'.",
                    column, text, item
                ),
            })
        }
    }
}

/// Both years' normalized rows plus the ledger-wide precision.
#[derive(Debug, Clone)]
pub struct LoadedLedger<'a> {
    pub current_year: i32,
    pub first_year: bool,
    pub current: Vec<NormalizedLedgerRow>,
    pub prior: Vec<NormalizedLedgerRow>,
    pub precision: Precision,
    taxonomy: &'a CategoryTaxonomy,
}

impl<'a> LoadedLedger<'a> {
    pub fn previous_year(&self) -> i32 {
        self.current_year - 1
    }

    pub fn taxonomy(&self) -> &'a CategoryTaxonomy {
        self.taxonomy
    }

    pub fn rows(&self, year: i32) -> Result<&[NormalizedLedgerRow]> {
        if year == self.current_year {
            Ok(&self.current)
        } else if year == self.previous_year() {
            Ok(&self.prior)
        } else {
            Err(StatementError::YearOutOfRange {
                year,
                current: self.current_year,
            })
        }
    }

    /// Every item name appearing in the year's ledger.
    pub fn item_names(&self, year: i32) -> Result<BTreeSet<String>> {
        Ok(self
            .rows(year)?
            .iter()
            .map(|row| row.item_name.clone())
            .collect())
    }

    pub fn statement_for(&self, year: i32) -> Result<FinancialStatement> {
        let rows = self.rows(year)?;
        Aggregator::new(self.taxonomy, self.precision).aggregate(&EngineConfig::sheet_name(year), rows)
    }
}
