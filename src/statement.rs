use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub value: Decimal,
}

impl LineItem {
    pub fn new(name: impl Into<String>, value: Decimal) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// The five balance sheet sections a ledger row can land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceBucket {
    NonCurrentAssets,
    CurrentAssets,
    CurrentLiabilities,
    NonCurrentLiabilities,
    Equity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub non_current_assets: Vec<LineItem>,
    pub current_assets: Vec<LineItem>,
    pub current_liabilities: Vec<LineItem>,
    pub non_current_liabilities: Vec<LineItem>,
    pub equity: Vec<LineItem>,
    pub total_non_current_assets: Decimal,
    pub total_current_assets: Decimal,
    pub total_current_liabilities: Decimal,
    pub total_non_current_liabilities: Decimal,
    pub total_equity: Decimal,
    pub net_assets: Decimal,
}

impl BalanceSheet {
    pub fn items(&self, bucket: BalanceBucket) -> &[LineItem] {
        match bucket {
            BalanceBucket::NonCurrentAssets => &self.non_current_assets,
            BalanceBucket::CurrentAssets => &self.current_assets,
            BalanceBucket::CurrentLiabilities => &self.current_liabilities,
            BalanceBucket::NonCurrentLiabilities => &self.non_current_liabilities,
            BalanceBucket::Equity => &self.equity,
        }
    }

    pub fn total(&self, bucket: BalanceBucket) -> Decimal {
        match bucket {
            BalanceBucket::NonCurrentAssets => self.total_non_current_assets,
            BalanceBucket::CurrentAssets => self.total_current_assets,
            BalanceBucket::CurrentLiabilities => self.total_current_liabilities,
            BalanceBucket::NonCurrentLiabilities => self.total_non_current_liabilities,
            BalanceBucket::Equity => self.total_equity,
        }
    }

    /// Appends `item` to `bucket` and adds it to the bucket total. `None` when
    /// the total would overflow.
    pub(crate) fn post(&mut self, bucket: BalanceBucket, item: LineItem) -> Option<()> {
        let (items, total) = match bucket {
            BalanceBucket::NonCurrentAssets => {
                (&mut self.non_current_assets, &mut self.total_non_current_assets)
            }
            BalanceBucket::CurrentAssets => (&mut self.current_assets, &mut self.total_current_assets),
            BalanceBucket::CurrentLiabilities => {
                (&mut self.current_liabilities, &mut self.total_current_liabilities)
            }
            BalanceBucket::NonCurrentLiabilities => (
                &mut self.non_current_liabilities,
                &mut self.total_non_current_liabilities,
            ),
            BalanceBucket::Equity => (&mut self.equity, &mut self.total_equity),
        };
        *total = total.checked_add(item.value)?;
        items.push(item);
        Some(())
    }

    /// Value of the first entry in `bucket` whose name is one of `names`.
    pub fn first_value(&self, bucket: BalanceBucket, names: &[&str]) -> Option<Decimal> {
        self.items(bucket)
            .iter()
            .find(|item| names.contains(&item.name.as_str()))
            .map(|item| item.value)
    }

    /// Sum of every entry in `bucket` whose name is one of `names`, or `None`
    /// on overflow.
    pub fn sum_of(&self, bucket: BalanceBucket, names: &[&str]) -> Option<Decimal> {
        self.items(bucket)
            .iter()
            .filter(|item| names.contains(&item.name.as_str()))
            .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.value))
    }

    /// Saturates rather than panics; aggregated sheets were already range-checked.
    pub fn total_assets(&self) -> Decimal {
        self.total_non_current_assets
            .saturating_add(self.total_current_assets)
    }

    pub fn total_liabilities(&self) -> Decimal {
        self.total_current_liabilities
            .saturating_add(self.total_non_current_liabilities)
    }
}

/// One year's income statement and balance sheet, built from that year's ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FinancialStatement {
    pub revenue: Decimal,
    pub cost_of_sales: Decimal,
    pub gross_profit: Decimal,
    pub other_income: Decimal,
    pub general_admin_expenses: Decimal,
    /// Signed: financing gains are positive, costs negative.
    pub finance_costs: Decimal,
    pub calc_total: Decimal,
    pub profit_before_tax: Decimal,
    pub taxation: Decimal,
    pub profit_for_year: Decimal,
    pub balance_sheet: BalanceSheet,
    pub revenue_items_details: Vec<LineItem>,
    pub cost_items_details: Vec<LineItem>,
    pub other_income_details: Vec<LineItem>,
    pub general_admin_expenses_details: Vec<LineItem>,
    pub finance_costs_details: Vec<LineItem>,
}

impl FinancialStatement {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn general_admin_detail(&self, names: &[&str]) -> Option<Decimal> {
        self.general_admin_expenses_details
            .iter()
            .find(|item| names.contains(&item.name.as_str()))
            .map(|item| item.value)
    }
}
