//! # Financial Statement Builder
//!
//! Turns two years of trial-balance ledgers into income statements and
//! balance sheets, checks that net assets reconcile to total equity, and
//! derives the captions and disclosure figures an audit report needs.
//!
//! ## Core Concepts
//!
//! - **Ledger Source**: a workbook with one `{year}TB` sheet per fiscal year (Item, Debtor, Creditor)
//! - **Category Taxonomy**: the chart of accounts mapping item names to statement categories
//! - **Precision**: integer or two-decimal rounding, inferred once for the whole ledger
//! - **Consistency**: the reporting year's net assets must equal its total equity
//!
//! ## Example
//!
//! ```rust,ignore
//! use financial_statement_builder::*;
//!
//! let workbook = XlsxWorkbook::open("ledgers/acme.xlsx")?;
//! let period = ReportingPeriod::parse("31 December 2024")?;
//! let taxonomy = CategoryTaxonomy::default();
//!
//! let report = StatementBuilder::for_period(period, false, &taxonomy).build(&workbook)?;
//! for warning in &report.warnings {
//!     eprintln!("{warning}");
//! }
//! println!("{}", report.to_json()?);
//! ```

pub mod balancer;
pub mod chart_of_accounts;
pub mod disclosures;
pub mod engine;
pub mod error;
pub mod ingestion;
pub mod loader;
pub mod naming;
pub mod schema;
pub mod statement;
pub mod utils;

pub use balancer::{
    balance_before_period, verify_net_assets_equal_equity, EquityBalancer, EquityReconciliation,
    YearEquity,
};
pub use chart_of_accounts::{Category, CategoryTaxonomy};
pub use disclosures::{RelatedParty, RelatedPartyBalance, ReportFigures};
pub use engine::{Aggregator, RowClass};
pub use error::{Result, StatementError};
pub use ingestion::{Cell, CsvWorkbook, InMemoryWorkbook, LedgerSource, XlsxWorkbook};
pub use loader::{LedgerLoader, LoadedLedger, NormalizedLedgerRow};
pub use naming::StatementLabels;
pub use schema::*;
pub use statement::{BalanceBucket, BalanceSheet, FinancialStatement, LineItem};
pub use utils::*;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Everything produced for one reporting year: both statements, the equity
/// roll-forward, and the figures handed to the report template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialReport {
    pub current_year: i32,
    pub first_year: bool,
    pub precision: Precision,
    pub current: FinancialStatement,
    pub previous: FinancialStatement,
    pub equity: EquityReconciliation,
    pub figures: ReportFigures,
    /// Template dates, present when the report was built for a `ReportingPeriod`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<PeriodDates>,
    /// Non-fatal inconsistencies found while building.
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl FinancialReport {
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

pub struct StatementBuilder<'a> {
    config: EngineConfig,
    taxonomy: &'a CategoryTaxonomy,
    period: Option<ReportingPeriod>,
}

impl<'a> StatementBuilder<'a> {
    pub fn new(config: EngineConfig, taxonomy: &'a CategoryTaxonomy) -> Self {
        Self { config, taxonomy, period: None }
    }

    pub fn for_period(period: ReportingPeriod, first_year: bool, taxonomy: &'a CategoryTaxonomy) -> Self {
        Self {
            config: period.engine_config(first_year),
            taxonomy,
            period: Some(period),
        }
    }

    pub fn build<S: LedgerSource + ?Sized>(&self, source: &S) -> Result<FinancialReport> {
        info!(
            "Building financial statements for {}{}",
            self.config.current_year,
            if self.config.first_year { " (first year)" } else { "" }
        );
        debug!(
            "Taxonomy holds {} item names across {} categories",
            self.taxonomy.total_items(),
            Category::ALL.len()
        );

        let ledger = LedgerLoader::new(self.config.clone(), self.taxonomy).load(source)?;

        let current = ledger.statement_for(ledger.current_year)?;
        let previous = ledger.statement_for(ledger.previous_year())?;
        info!(
            "Statements built: profit for {} is {}, net assets {}",
            ledger.current_year, current.profit_for_year, current.balance_sheet.net_assets
        );

        let equity = EquityBalancer::new(ledger.precision).reconcile(&ledger, &current, &previous)?;
        let figures = ReportFigures::compute(&ledger, &current, &previous, &equity)?;

        let mut warnings = Vec::new();
        if let Some(mismatch) = figures.inventory_mismatch() {
            warn!("{}", mismatch);
            warnings.push(mismatch);
        }

        Ok(FinancialReport {
            current_year: ledger.current_year,
            first_year: ledger.first_year,
            precision: ledger.precision,
            current,
            previous,
            equity,
            figures,
            period: self.period.map(|period| period.dates()),
            warnings,
        })
    }
}

pub fn build_financial_report<S: LedgerSource + ?Sized>(
    source: &S,
    config: EngineConfig,
    taxonomy: &CategoryTaxonomy,
) -> Result<FinancialReport> {
    StatementBuilder::new(config, taxonomy).build(source)
}
