use crate::balancer::EquityReconciliation;
use crate::statement::FinancialStatement;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A family of captions chosen by the sign of a figure across both years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelSet {
    pub positive: &'static str,
    pub negative: &'static str,
    pub mixed: &'static str,
}

pub const PROFIT_LABELS: LabelSet = LabelSet {
    positive: "Profit",
    negative: "Loss",
    mixed: "Profit/(Loss)",
};

pub const GROSS_PROFIT_LABELS: LabelSet = LabelSet {
    positive: "PROFIT",
    negative: "LOSS",
    mixed: "PROFIT/(LOSS)",
};

pub const NET_ASSETS_LABELS: LabelSet = LabelSet {
    positive: "Net assets",
    negative: "Net liabilities",
    mixed: "Net assets/(liabilities)",
};

pub const RETAINED_EARNINGS_LABELS: LabelSet = LabelSet {
    positive: "Retained earnings",
    negative: "Accumulated loss",
    mixed: "Retained earnings/(accumulated loss)",
};

impl LabelSet {
    /// Both years non-negative gives the positive caption, both negative the
    /// negative one, anything else the combined caption. Without a prior year
    /// only the current sign counts.
    pub fn pick(&self, current: Decimal, previous: Option<Decimal>) -> &'static str {
        let current_negative = current < Decimal::ZERO;
        match previous {
            None if current_negative => self.negative,
            None => self.positive,
            Some(previous) => {
                let previous_negative = previous < Decimal::ZERO;
                match (current_negative, previous_negative) {
                    (false, false) => self.positive,
                    (true, true) => self.negative,
                    _ => self.mixed,
                }
            }
        }
    }

    /// Caption for a single figure regardless of the comparative year.
    pub fn single(&self, value: Decimal) -> &'static str {
        self.pick(value, None)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatementLabels {
    pub profit_before_tax: String,
    pub profit_for_year: String,
    /// Caption for the current year alone, used in narrative notes.
    pub profit_for_year_current: String,
    pub gross_profit: String,
    pub net_assets: String,
    pub retained_earnings: String,
    pub retained_earnings_current: String,
}

impl StatementLabels {
    pub fn derive(
        current: &FinancialStatement,
        previous: &FinancialStatement,
        equity: &EquityReconciliation,
        first_year: bool,
    ) -> Self {
        let prior = |value: Decimal| if first_year { None } else { Some(value) };

        Self {
            profit_before_tax: PROFIT_LABELS
                .pick(current.profit_before_tax, prior(previous.profit_before_tax))
                .to_string(),
            profit_for_year: PROFIT_LABELS
                .pick(current.profit_for_year, prior(previous.profit_for_year))
                .to_string(),
            profit_for_year_current: PROFIT_LABELS.single(current.profit_for_year).to_string(),
            gross_profit: GROSS_PROFIT_LABELS
                .pick(current.gross_profit, prior(previous.gross_profit))
                .to_string(),
            net_assets: NET_ASSETS_LABELS
                .pick(
                    current.balance_sheet.net_assets,
                    prior(previous.balance_sheet.net_assets),
                )
                .to_string(),
            retained_earnings: RETAINED_EARNINGS_LABELS
                .pick(
                    equity.current.retained_earnings,
                    prior(equity.previous.retained_earnings),
                )
                .to_string(),
            retained_earnings_current: RETAINED_EARNINGS_LABELS
                .single(equity.current.retained_earnings)
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balancer::YearEquity;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pick_by_sign() {
        assert_eq!(PROFIT_LABELS.pick(dec!(10), Some(dec!(0))), "Profit");
        assert_eq!(PROFIT_LABELS.pick(dec!(-10), Some(dec!(-1))), "Loss");
        assert_eq!(PROFIT_LABELS.pick(dec!(-10), Some(dec!(5))), "Profit/(Loss)");
        assert_eq!(PROFIT_LABELS.pick(dec!(10), Some(dec!(-5))), "Profit/(Loss)");
        assert_eq!(NET_ASSETS_LABELS.pick(dec!(-1), None), "Net liabilities");
        assert_eq!(NET_ASSETS_LABELS.pick(dec!(0), None), "Net assets");
    }

    #[test]
    fn test_derive_first_year_ignores_prior() {
        let current = FinancialStatement {
            gross_profit: dec!(-100),
            profit_before_tax: dec!(-300),
            profit_for_year: dec!(-300),
            ..Default::default()
        };
        let previous = FinancialStatement::default();
        let equity = EquityReconciliation {
            current_year: 2024,
            current: YearEquity {
                retained_earnings: dec!(-300),
                ..Default::default()
            },
            previous: YearEquity::default(),
        };

        let labels = StatementLabels::derive(&current, &previous, &equity, true);
        assert_eq!(labels.gross_profit, "LOSS");
        assert_eq!(labels.profit_before_tax, "Loss");
        assert_eq!(labels.net_assets, "Net assets");
        assert_eq!(labels.retained_earnings, "Accumulated loss");

        let labels = StatementLabels::derive(&current, &previous, &equity, false);
        assert_eq!(labels.gross_profit, "PROFIT/(LOSS)");
        assert_eq!(labels.profit_for_year, "Profit/(Loss)");
        assert_eq!(labels.profit_for_year_current, "Loss");
        assert_eq!(labels.retained_earnings_current, "Accumulated loss");
    }
}
