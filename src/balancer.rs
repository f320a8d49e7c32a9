use crate::chart_of_accounts::is_balance_before_period;
use crate::error::{Result, StatementError};
use crate::loader::{LoadedLedger, NormalizedLedgerRow};
use crate::schema::EngineConfig;
use crate::statement::{BalanceBucket, FinancialStatement};
use crate::utils::Precision;
use log::{debug, error, info};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DIVIDEND_ITEMS: [&str; 3] = [
    "dividends paid to shareholders",
    "dividends paid to a shareholder",
    "dividends paid to shareholder",
];

/// Opening retained earnings read from the ledger's balance-before-period row:
/// the credit balance when non-zero, otherwise the negated debit balance.
/// A ledger with several such rows is rejected rather than guessed at.
pub fn balance_before_period(sheet: &str, rows: &[NormalizedLedgerRow]) -> Result<Decimal> {
    let matches: Vec<&NormalizedLedgerRow> = rows
        .iter()
        .filter(|row| is_balance_before_period(&row.item_name))
        .collect();

    match matches.as_slice() {
        [] => Ok(Decimal::ZERO),
        [row] if !row.creditor.is_zero() => Ok(row.creditor),
        [row] => Ok(-row.debtor),
        _ => Err(StatementError::AmbiguousOpeningBalance {
            sheet: sheet.to_string(),
            items: matches.iter().map(|row| row.item_name.clone()).collect(),
        }),
    }
}

/// Equity roll-forward for one year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearEquity {
    pub balance_before_period: Decimal,
    pub profit_for_year: Decimal,
    /// Signed as posted to equity, so payments are negative.
    pub dividends_paid: Decimal,
    pub retained_earnings: Decimal,
    pub total_equity: Decimal,
    pub net_assets: Decimal,
}

impl YearEquity {
    pub fn is_balanced(&self) -> bool {
        self.net_assets == self.total_equity
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquityReconciliation {
    pub current_year: i32,
    pub current: YearEquity,
    pub previous: YearEquity,
}

/// Derives retained earnings and total equity and enforces
/// net assets == total equity for the reporting year.
pub struct EquityBalancer {
    precision: Precision,
}

impl EquityBalancer {
    pub fn new(precision: Precision) -> Self {
        Self { precision }
    }

    pub fn year_equity(
        &self,
        sheet: &str,
        rows: &[NormalizedLedgerRow],
        statement: &FinancialStatement,
    ) -> Result<YearEquity> {
        let p = |value: Decimal| self.precision.apply(value);
        let overflow = || StatementError::amount_overflow(sheet);
        let balance_sheet = &statement.balance_sheet;

        let balance_before = balance_before_period(sheet, rows)?;
        let dividends_paid = balance_sheet
            .sum_of(BalanceBucket::Equity, &DIVIDEND_ITEMS)
            .map(p)
            .ok_or_else(overflow)?;
        let retained_earnings = balance_before
            .checked_add(statement.profit_for_year)
            .and_then(|value| value.checked_add(dividends_paid))
            .map(p)
            .ok_or_else(overflow)?;
        let total_equity = balance_sheet
            .total_equity
            .checked_add(retained_earnings)
            .and_then(|value| value.checked_sub(dividends_paid))
            .map(p)
            .ok_or_else(overflow)?;

        Ok(YearEquity {
            balance_before_period: balance_before,
            profit_for_year: statement.profit_for_year,
            dividends_paid,
            retained_earnings,
            total_equity,
            net_assets: balance_sheet.net_assets,
        })
    }

    pub fn reconcile(
        &self,
        ledger: &LoadedLedger<'_>,
        current: &FinancialStatement,
        previous: &FinancialStatement,
    ) -> Result<EquityReconciliation> {
        let current_year = ledger.current_year;
        let previous_year = ledger.previous_year();

        let current_equity = self.year_equity(
            &EngineConfig::sheet_name(current_year),
            ledger.rows(current_year)?,
            current,
        )?;
        let previous_equity = self.year_equity(
            &EngineConfig::sheet_name(previous_year),
            ledger.rows(previous_year)?,
            previous,
        )?;

        debug!(
            "{}: retained earnings {}, total equity {}, net assets {}",
            current_year,
            current_equity.retained_earnings,
            current_equity.total_equity,
            current_equity.net_assets
        );

        verify_net_assets_equal_equity(current_year, &current_equity)?;
        info!("Net assets reconcile to total equity for {}", current_year);

        Ok(EquityReconciliation {
            current_year,
            current: current_equity,
            previous: previous_equity,
        })
    }
}

pub fn verify_net_assets_equal_equity(year: i32, equity: &YearEquity) -> Result<()> {
    if !equity.is_balanced() {
        error!(
            "Net assets ({}) does not equal total equity ({}) for {}",
            equity.net_assets, equity.total_equity, year
        );
        return Err(StatementError::NetAssetsEquityMismatch {
            year,
            net_assets: equity.net_assets,
            total_equity: equity.total_equity,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart_of_accounts::CategoryTaxonomy;
    use crate::engine::Aggregator;
    use rust_decimal_macros::dec;

    fn row(item: &str, debtor: Decimal, creditor: Decimal) -> NormalizedLedgerRow {
        NormalizedLedgerRow::new(item, debtor, creditor)
    }

    fn balanced_rows() -> Vec<NormalizedLedgerRow> {
        vec![
            row("sales of goods", dec!(0), dec!(50000)),
            row("direct costs", dec!(20000), dec!(0)),
            row("salaries", dec!(10000), dec!(0)),
            row("cash and bank balances", dec!(61000), dec!(0)),
            row("accrued expenses", dec!(0), dec!(3000)),
            row("share capital", dec!(0), dec!(10000)),
            row("dividends paid to shareholders", dec!(2000), dec!(0)),
            row("balance b/f current period", dec!(0), dec!(30000)),
        ]
    }

    fn equity_for(rows: &[NormalizedLedgerRow]) -> Result<YearEquity> {
        let taxonomy = CategoryTaxonomy::default();
        let statement = Aggregator::new(&taxonomy, Precision::Integer).aggregate("2024TB", rows)?;
        EquityBalancer::new(Precision::Integer).year_equity("2024TB", rows, &statement)
    }

    #[test]
    fn test_balance_before_period() {
        assert_eq!(balance_before_period("s", &[]).unwrap(), Decimal::ZERO);
        assert_eq!(
            balance_before_period("s", &[row("balance bf current period", dec!(0), dec!(800))]).unwrap(),
            dec!(800)
        );
        assert_eq!(
            balance_before_period("s", &[row("balance before current period", dec!(450), dec!(0))])
                .unwrap(),
            dec!(-450)
        );
    }

    #[test]
    fn test_ambiguous_opening_balance() {
        let rows = [
            row("balance bf current period", dec!(0), dec!(800)),
            row("balance b/f current period", dec!(0), dec!(800)),
        ];
        let err = balance_before_period("2024TB", &rows).unwrap_err();
        match err {
            StatementError::AmbiguousOpeningBalance { sheet, items } => {
                assert_eq!(sheet, "2024TB");
                assert_eq!(items.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_equity_roll_forward() {
        let equity = equity_for(&balanced_rows()).unwrap();

        assert_eq!(equity.profit_for_year, dec!(20000));
        assert_eq!(equity.dividends_paid, dec!(-2000));
        assert_eq!(equity.retained_earnings, dec!(48000));
        assert_eq!(equity.total_equity, dec!(58000));
        assert_eq!(equity.net_assets, dec!(58000));
        assert!(verify_net_assets_equal_equity(2024, &equity).is_ok());
    }

    #[test]
    fn test_overflowing_roll_forward_is_rejected() {
        let statement = FinancialStatement {
            profit_for_year: Decimal::MAX,
            ..Default::default()
        };
        let rows = [row("balance b/f current period", dec!(0), dec!(1))];

        let err = EquityBalancer::new(Precision::Integer)
            .year_equity("2024TB", &rows, &statement)
            .unwrap_err();
        assert!(matches!(err, StatementError::MalformedSheet { ref sheet, .. } if sheet == "2024TB"));
    }

    #[test]
    fn test_perturbed_value_breaks_reconciliation() {
        let mut rows = balanced_rows();
        rows[3].debtor += dec!(1);
        let equity = equity_for(&rows).unwrap();

        let err = verify_net_assets_equal_equity(2024, &equity).unwrap_err();
        match err {
            StatementError::NetAssetsEquityMismatch {
                year,
                net_assets,
                total_equity,
            } => {
                assert_eq!(year, 2024);
                assert_eq!(net_assets, dec!(58001));
                assert_eq!(total_equity, dec!(58000));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
