use crate::chart_of_accounts::{is_balance_before_period, Category, CategoryTaxonomy};
use crate::error::{Result, StatementError};
use crate::loader::{NormalizedLedgerRow, SIGNATURE_LABEL, TOTALS_LABEL};
use crate::statement::{BalanceBucket, BalanceSheet, FinancialStatement, LineItem};
use crate::utils::Precision;
use log::debug;
use rust_decimal::Decimal;

pub const TAXATION_ITEM: &str = "taxation";

/// Rows that carry no posting: signature line, totals line and stray zeros.
const SENTINEL_ITEMS: [&str; 3] = [SIGNATURE_LABEL, TOTALS_LABEL, "0"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomeLine {
    Revenue,
    CostOfSales,
    ClosingInventory,
    OtherIncome,
    GeneralAdmin,
    FinanceCost,
}

/// What a single ledger row contributes to the statement.
///
/// An item can sit in both an income statement category and a balance sheet
/// category, so a posting carries one optional target of each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowClass {
    Ignored,
    Taxation,
    BalanceBeforePeriod,
    Posting {
        income: Option<IncomeLine>,
        balance: Option<BalanceBucket>,
    },
}

const INCOME_ORDER: [(Category, IncomeLine); 6] = [
    (Category::Revenue, IncomeLine::Revenue),
    (Category::CostOfSales, IncomeLine::CostOfSales),
    (Category::ClosingInventories, IncomeLine::ClosingInventory),
    (Category::OtherIncome, IncomeLine::OtherIncome),
    (Category::GeneralAdminExpenses, IncomeLine::GeneralAdmin),
    (Category::FinanceCosts, IncomeLine::FinanceCost),
];

const BALANCE_ORDER: [(Category, BalanceBucket); 5] = [
    (Category::NonCurrentAssets, BalanceBucket::NonCurrentAssets),
    (Category::CurrentAssets, BalanceBucket::CurrentAssets),
    (Category::CurrentLiabilities, BalanceBucket::CurrentLiabilities),
    (Category::NonCurrentLiabilities, BalanceBucket::NonCurrentLiabilities),
    (Category::Equity, BalanceBucket::Equity),
];

/// Builds one year's [`FinancialStatement`] from that year's ledger rows.
/// Pure: no I/O, same rows in, same statement out.
pub struct Aggregator<'a> {
    taxonomy: &'a CategoryTaxonomy,
    precision: Precision,
}

#[derive(Default)]
struct Accumulator {
    revenue: Decimal,
    cost_of_sales: Decimal,
    closing_inventory: Decimal,
    other_income: Decimal,
    general_admin: Decimal,
    finance_costs: Decimal,
    taxation: Option<Decimal>,
    balance_sheet: BalanceSheet,
    revenue_details: Vec<LineItem>,
    cost_details: Vec<LineItem>,
    other_income_details: Vec<LineItem>,
    general_admin_details: Vec<LineItem>,
    finance_cost_details: Vec<LineItem>,
}

fn push_nonzero(details: &mut Vec<LineItem>, name: &str, value: Decimal) {
    if !value.is_zero() {
        details.push(LineItem::new(name, value));
    }
}

impl<'a> Aggregator<'a> {
    pub fn new(taxonomy: &'a CategoryTaxonomy, precision: Precision) -> Self {
        Self {
            taxonomy,
            precision,
        }
    }

    pub fn classify(&self, sheet: &str, item: &str) -> Result<RowClass> {
        if SENTINEL_ITEMS.contains(&item) {
            return Ok(RowClass::Ignored);
        }
        if item == TAXATION_ITEM {
            return Ok(RowClass::Taxation);
        }
        if !self.taxonomy.recognizes(item) {
            return Err(StatementError::UnrecognizedItem {
                item: item.to_string(),
                sheet: sheet.to_string(),
            });
        }
        if is_balance_before_period(item) {
            return Ok(RowClass::BalanceBeforePeriod);
        }

        let income = INCOME_ORDER
            .iter()
            .find(|(category, _)| self.taxonomy.contains(*category, item))
            .map(|(_, line)| *line);
        let balance = BALANCE_ORDER
            .iter()
            .find(|(category, _)| self.taxonomy.contains(*category, item))
            .map(|(_, bucket)| *bucket);

        Ok(RowClass::Posting { income, balance })
    }

    pub fn aggregate(&self, sheet: &str, rows: &[NormalizedLedgerRow]) -> Result<FinancialStatement> {
        let mut acc = Accumulator::default();

        for row in rows {
            let class = self.classify(sheet, &row.item_name)?;
            self.post(sheet, &mut acc, row, class)?;
        }

        let statement = self.finish(sheet, acc)?;
        debug!(
            "{}: revenue {}, profit before tax {}, profit for year {}, net assets {}",
            sheet,
            statement.revenue,
            statement.profit_before_tax,
            statement.profit_for_year,
            statement.balance_sheet.net_assets
        );
        Ok(statement)
    }

    fn post(
        &self,
        sheet: &str,
        acc: &mut Accumulator,
        row: &NormalizedLedgerRow,
        class: RowClass,
    ) -> Result<()> {
        let name = row.item_name.as_str();
        let (debtor, creditor) = (row.debtor, row.creditor);
        let net = || {
            creditor
                .checked_sub(debtor)
                .ok_or_else(|| StatementError::amount_overflow(sheet))
        };

        let (income, balance) = match class {
            RowClass::Ignored | RowClass::BalanceBeforePeriod => return Ok(()),
            RowClass::Taxation => {
                // First taxation row wins
                if acc.taxation.is_none() {
                    acc.taxation = Some(net()?);
                }
                return Ok(());
            }
            RowClass::Posting { income, balance } => (income, balance),
        };

        match income {
            Some(IncomeLine::Revenue) => {
                accumulate(sheet, &mut acc.revenue, creditor)?;
                push_nonzero(&mut acc.revenue_details, name, creditor);
            }
            Some(IncomeLine::CostOfSales) => {
                accumulate(sheet, &mut acc.cost_of_sales, debtor)?;
                push_nonzero(&mut acc.cost_details, name, debtor);
            }
            Some(IncomeLine::ClosingInventory) => {
                accumulate(sheet, &mut acc.closing_inventory, debtor)?;
                push_nonzero(&mut acc.cost_details, name, -debtor);
            }
            Some(IncomeLine::OtherIncome) => {
                accumulate(sheet, &mut acc.other_income, creditor)?;
                push_nonzero(&mut acc.other_income_details, name, creditor);
            }
            Some(IncomeLine::GeneralAdmin) => {
                accumulate(sheet, &mut acc.general_admin, debtor)?;
                push_nonzero(&mut acc.general_admin_details, name, debtor);
            }
            Some(IncomeLine::FinanceCost) => {
                let net = net()?;
                accumulate(sheet, &mut acc.finance_costs, net)?;
                push_nonzero(&mut acc.finance_cost_details, name, net);
            }
            None => {}
        }

        if let Some(bucket) = balance {
            let value = match bucket {
                BalanceBucket::NonCurrentAssets | BalanceBucket::CurrentAssets => debtor,
                BalanceBucket::CurrentLiabilities | BalanceBucket::NonCurrentLiabilities => creditor,
                BalanceBucket::Equity => net()?,
            };
            acc.balance_sheet
                .post(bucket, LineItem::new(name, value))
                .ok_or_else(|| StatementError::amount_overflow(sheet))?;
        }
        Ok(())
    }

    fn finish(&self, sheet: &str, acc: Accumulator) -> Result<FinancialStatement> {
        let p = |value: Decimal| self.precision.apply(value);
        let add = |a: Decimal, b: Decimal| {
            a.checked_add(b)
                .map(p)
                .ok_or_else(|| StatementError::amount_overflow(sheet))
        };
        let sub = |a: Decimal, b: Decimal| {
            a.checked_sub(b)
                .map(p)
                .ok_or_else(|| StatementError::amount_overflow(sheet))
        };

        let revenue = p(acc.revenue);
        let cost_of_sales = add(p(acc.cost_of_sales), p(acc.closing_inventory))?;
        let gross_profit = sub(revenue, cost_of_sales)?;
        let other_income = p(acc.other_income);
        let calc_total = add(gross_profit, other_income)?;
        let general_admin_expenses = p(acc.general_admin);
        let finance_costs = p(acc.finance_costs);
        let profit_before_tax = add(sub(calc_total, general_admin_expenses)?, finance_costs)?;
        let taxation = p(acc.taxation.unwrap_or(Decimal::ZERO));
        let profit_for_year = add(profit_before_tax, taxation)?;

        let mut balance_sheet = acc.balance_sheet;
        balance_sheet.total_non_current_assets = p(balance_sheet.total_non_current_assets);
        balance_sheet.total_current_assets = p(balance_sheet.total_current_assets);
        balance_sheet.total_current_liabilities = p(balance_sheet.total_current_liabilities);
        balance_sheet.total_non_current_liabilities = p(balance_sheet.total_non_current_liabilities);
        balance_sheet.total_equity = p(balance_sheet.total_equity);
        let total_assets = add(
            balance_sheet.total_non_current_assets,
            balance_sheet.total_current_assets,
        )?;
        let total_liabilities = add(
            balance_sheet.total_current_liabilities,
            balance_sheet.total_non_current_liabilities,
        )?;
        balance_sheet.net_assets = sub(total_assets, total_liabilities)?;

        Ok(FinancialStatement {
            revenue,
            cost_of_sales,
            gross_profit,
            other_income,
            general_admin_expenses,
            finance_costs,
            calc_total,
            profit_before_tax,
            taxation,
            profit_for_year,
            balance_sheet,
            revenue_items_details: acc.revenue_details,
            cost_items_details: acc.cost_details,
            other_income_details: acc.other_income_details,
            general_admin_expenses_details: acc.general_admin_details,
            finance_costs_details: acc.finance_cost_details,
        })
    }
}

fn accumulate(sheet: &str, total: &mut Decimal, value: Decimal) -> Result<()> {
    *total = total
        .checked_add(value)
        .ok_or_else(|| StatementError::amount_overflow(sheet))?;
    Ok(())
}
