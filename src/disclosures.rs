//! Figures the audit report template needs beyond the primary statements:
//! related-party balances, inventories, investments and notable expense lines.

use crate::balancer::EquityReconciliation;
use crate::chart_of_accounts::Category;
use crate::error::{Result, StatementError};
use crate::loader::LoadedLedger;
use crate::naming::StatementLabels;
use crate::schema::EngineConfig;
use crate::statement::{BalanceBucket, BalanceSheet, FinancialStatement};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DUE_FROM_DIRECTOR_ITEMS: [&str; 4] = [
    "amount due from director",
    "amount due from a director",
    "amount due from the director",
    "amount due from directors",
];
pub const DUE_TO_DIRECTOR_ITEMS: [&str; 4] = [
    "amount due to director",
    "amount due to a director",
    "amount due to the director",
    "amount due to directors",
];
pub const SUBSIDIARY_ITEMS: [&str; 4] = [
    "investments in a subsidiary",
    "investments in subsidiaries",
    "interests in subsidiaries",
    "interests in a subsidiary",
];
pub const ASSOCIATE_ITEMS: [&str; 2] = ["investments in an associate", "investments in associates"];
pub const AUDIT_FEE_ITEMS: [&str; 2] = ["audit fee", "auditors' remuneration"];
pub const DIRECTOR_REMUNERATION_ITEMS: [&str; 2] =
    ["director's remuneration", "director\u{2019}s remuneration"];
pub const CAPITAL_RESERVE_ITEMS: [&str; 2] = ["capital reserves", "reserves"];

/// Counterparties whose balances are disclosed in the related-party note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelatedParty {
    Shareholder,
    FinalHoldingParent,
    ImmediateParent,
    UltimateHoldingCompany,
    HoldingCompany,
}

impl RelatedParty {
    pub const ALL: [RelatedParty; 5] = [
        RelatedParty::Shareholder,
        RelatedParty::FinalHoldingParent,
        RelatedParty::ImmediateParent,
        RelatedParty::UltimateHoldingCompany,
        RelatedParty::HoldingCompany,
    ];

    pub fn due_from_items(self) -> &'static [&'static str] {
        match self {
            RelatedParty::Shareholder => &[
                "amount due from a shareholder",
                "amount due from the shareholder",
                "amount due from shareholder",
                "amount due from shareholders",
            ],
            RelatedParty::FinalHoldingParent => &[
                "amount due from final holding parent company",
                "amount due from a final holding parent company",
                "amount due from the final holding parent company",
                "amount due from final holding parent companies",
            ],
            RelatedParty::ImmediateParent => &[
                "amount due from an immediate parent company",
                "amount due from the immediate parent company",
                "amount due from immediate parent company",
                "amount due from immediate parent companies",
            ],
            RelatedParty::UltimateHoldingCompany => &[
                "amount due from an ultimate holding company",
                "amount due from the ultimate holding company",
                "amount due from ultimate holding company",
                "amount due from ultimate holding companies",
            ],
            RelatedParty::HoldingCompany => &[
                "amount due from a holding company",
                "amount due from the holding company",
                "amount due from holding company",
                "amount due from holding companies",
            ],
        }
    }

    pub fn due_to_items(self) -> &'static [&'static str] {
        match self {
            RelatedParty::Shareholder => &[
                "amount due to a shareholder",
                "amount due to the shareholder",
                "amount due to shareholder",
                "amount due to shareholders",
            ],
            RelatedParty::FinalHoldingParent => &[
                "amount due to final holding parent company",
                "amount due to a final holding parent company",
                "amount due to the final holding parent company",
                "amount due to final holding parent companies",
            ],
            RelatedParty::ImmediateParent => &[
                "amount due to an immediate parent company",
                "amount due to the immediate parent company",
                "amount due to immediate parent company",
                "amount due to immediate parent companies",
            ],
            RelatedParty::UltimateHoldingCompany => &[
                "amount due to an ultimate holding company",
                "amount due to the ultimate holding company",
                "amount due to ultimate holding company",
                "amount due to ultimate holding companies",
            ],
            RelatedParty::HoldingCompany => &[
                "amount due to a holding company",
                "amount due to the holding company",
                "amount due to holding company",
                "amount due to holding companies",
            ],
        }
    }
}

/// Net balance with a counterparty: amounts due from it are positive,
/// amounts due to it negative.
fn net_due(statement: &FinancialStatement, from: &[&str], to: &[&str]) -> Decimal {
    let sheet = &statement.balance_sheet;
    match sheet.first_value(BalanceBucket::CurrentAssets, from) {
        Some(value) if !value.is_zero() => value,
        _ => -sheet
            .first_value(BalanceBucket::CurrentLiabilities, to)
            .unwrap_or(Decimal::ZERO),
    }
}

/// Balance with a related party as the report template states it: a due-to
/// liability entry, when present, takes precedence over any due-from asset.
fn party_balance(statement: &FinancialStatement, from: &[&str], to: &[&str]) -> Decimal {
    let sheet = &statement.balance_sheet;
    match sheet.first_value(BalanceBucket::CurrentLiabilities, to) {
        Some(owed) => -owed,
        None => sheet
            .first_value(BalanceBucket::CurrentAssets, from)
            .unwrap_or(Decimal::ZERO),
    }
}

fn any_present(items: &BTreeSet<String>, names: &[&str]) -> bool {
    names.iter().any(|name| items.contains(*name))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RelatedPartyBalance {
    pub current: Decimal,
    pub previous: Decimal,
    pub max: Decimal,
    /// Any alias for the party appears in the current year's ledger.
    pub need_footnote: bool,
    /// Mirrors `need_footnote`; the template keys the "to" wording off it.
    pub both_to: bool,
    pub title_name: String,
}

impl RelatedPartyBalance {
    fn compute(
        party: RelatedParty,
        current: &FinancialStatement,
        previous: &FinancialStatement,
        current_items: &BTreeSet<String>,
        prior_items: &BTreeSet<String>,
    ) -> Self {
        let (from, to) = (party.due_from_items(), party.due_to_items());
        let current_balance = party_balance(current, from, to);
        let previous_balance = party_balance(previous, from, to);

        if current_balance.is_zero() && previous_balance.is_zero() {
            return Self::default();
        }

        let seen = |names: &[&str]| {
            names
                .iter()
                .find(|name| current_items.contains(**name) || prior_items.contains(**name))
                .map(|name| name.to_string())
        };
        let title_name = match (seen(from), seen(to)) {
            (Some(from_name), Some(_)) => from_name.replace("from", "from/(to)"),
            (Some(name), None) | (None, Some(name)) => name,
            (None, None) => String::new(),
        };

        let in_current_year = any_present(current_items, from) || any_present(current_items, to);

        Self {
            current: current_balance,
            previous: previous_balance,
            max: current_balance.max(previous_balance),
            need_footnote: in_current_year,
            both_to: in_current_year,
            title_name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReportFigures {
    pub due_from_directors_curr: Decimal,
    pub has_due_from_directors_curr: bool,
    pub due_to_directors_curr: Decimal,
    pub has_due_to_directors_curr: bool,
    pub due_directors_curr: Decimal,
    pub due_directors_prev: Decimal,
    pub due_directors_max: Decimal,

    pub inventories_curr: Decimal,
    pub inventories_prev: Decimal,
    pub has_inventories_curr: bool,
    /// Closing inventories as shown among the cost of sales details.
    pub closing_inventories_curr: Decimal,
    pub closing_inventories_prev: Decimal,
    pub cash_and_bank_curr: Decimal,

    pub has_subsidiary: bool,
    pub investment_in_subsidiaries_curr: Decimal,
    pub investment_in_subsidiaries_prev: Decimal,
    pub investment_in_associates_curr: Decimal,
    pub investment_in_associates_prev: Decimal,

    pub audit_fee_curr: Decimal,
    pub audit_fee_prev: Decimal,
    pub directors_remuneration_curr: Decimal,
    pub directors_remuneration_prev: Decimal,
    pub directors_benefits_curr: Decimal,
    pub directors_benefits_prev: Decimal,

    pub share_capital_curr: Decimal,
    pub share_capital_prev: Decimal,
    pub capital_reserves_curr: Decimal,
    pub capital_reserves_prev: Decimal,
    pub dividends_curr: Decimal,
    pub dividends_prev: Decimal,
    pub retained_earnings_curr: Decimal,
    pub retained_earnings_prev: Decimal,
    pub total_equity_curr: Decimal,
    pub total_equity_prev: Decimal,

    pub due_shareholder: RelatedPartyBalance,
    pub due_final_holding_parent: RelatedPartyBalance,
    pub due_immediate_parent: RelatedPartyBalance,
    pub due_ultimate_holding_company: RelatedPartyBalance,
    pub due_holding_company: RelatedPartyBalance,

    #[serde(flatten)]
    pub labels: StatementLabels,
}

impl ReportFigures {
    pub fn compute(
        ledger: &LoadedLedger<'_>,
        current: &FinancialStatement,
        previous: &FinancialStatement,
        equity: &EquityReconciliation,
    ) -> Result<Self> {
        let current_items = ledger.item_names(ledger.current_year)?;
        let prior_items = ledger.item_names(ledger.previous_year())?;
        let (curr_bs, prev_bs) = (&current.balance_sheet, &previous.balance_sheet);
        let current_sheet = EngineConfig::sheet_name(ledger.current_year);
        let prior_sheet = EngineConfig::sheet_name(ledger.previous_year());
        let taxonomy = ledger.taxonomy();

        let first = |statement: &FinancialStatement, bucket, names: &[&str]| {
            statement
                .balance_sheet
                .first_value(bucket, names)
                .unwrap_or(Decimal::ZERO)
        };

        let due_from_directors_curr =
            first(current, BalanceBucket::CurrentAssets, &DUE_FROM_DIRECTOR_ITEMS);
        let due_to_directors_curr =
            -first(current, BalanceBucket::CurrentLiabilities, &DUE_TO_DIRECTOR_ITEMS);
        let due_directors_curr = net_due(current, &DUE_FROM_DIRECTOR_ITEMS, &DUE_TO_DIRECTOR_ITEMS);
        let due_directors_prev = net_due(previous, &DUE_FROM_DIRECTOR_ITEMS, &DUE_TO_DIRECTOR_ITEMS);
        let share_capital_curr = first(current, BalanceBucket::Equity, &["share capital"]);

        let due_directors_max = if ledger.first_year {
            due_directors_curr.max(share_capital_curr)
        } else {
            due_directors_curr.max(due_directors_prev)
        };

        let remuneration = |statement: &FinancialStatement| {
            statement
                .general_admin_detail(&DIRECTOR_REMUNERATION_ITEMS)
                .unwrap_or(Decimal::ZERO)
        };
        let benefits = |statement: &FinancialStatement, sheet: &str| {
            statement
                .general_admin_expenses_details
                .iter()
                .filter(|item| {
                    DIRECTOR_REMUNERATION_ITEMS.contains(&item.name.as_str()) || item.name == "salaries"
                })
                .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.value))
                .ok_or_else(|| StatementError::amount_overflow(sheet))
        };
        let investments = |sheet: &BalanceSheet, names: &[&str], sheet_name: &str| {
            sheet
                .sum_of(BalanceBucket::NonCurrentAssets, names)
                .ok_or_else(|| StatementError::amount_overflow(sheet_name))
        };
        let closing_inventories = |statement: &FinancialStatement| {
            statement
                .cost_items_details
                .iter()
                .find(|item| taxonomy.contains(Category::ClosingInventories, &item.name))
                .map(|item| item.value)
                .unwrap_or(Decimal::ZERO)
        };

        let related = |party| {
            RelatedPartyBalance::compute(party, current, previous, &current_items, &prior_items)
        };

        Ok(Self {
            due_from_directors_curr,
            has_due_from_directors_curr: any_present(&current_items, &DUE_FROM_DIRECTOR_ITEMS),
            due_to_directors_curr,
            has_due_to_directors_curr: !due_to_directors_curr.is_zero(),
            due_directors_curr,
            due_directors_prev,
            due_directors_max,

            inventories_curr: first(current, BalanceBucket::CurrentAssets, &["inventories"]),
            inventories_prev: first(previous, BalanceBucket::CurrentAssets, &["inventories"]),
            has_inventories_curr: current_items.contains("inventories"),
            closing_inventories_curr: closing_inventories(current),
            closing_inventories_prev: closing_inventories(previous),
            cash_and_bank_curr: first(current, BalanceBucket::CurrentAssets, &["cash and bank balances"]),

            has_subsidiary: any_present(&current_items, &SUBSIDIARY_ITEMS),
            investment_in_subsidiaries_curr: investments(curr_bs, &SUBSIDIARY_ITEMS, &current_sheet)?,
            investment_in_subsidiaries_prev: investments(prev_bs, &SUBSIDIARY_ITEMS, &prior_sheet)?,
            investment_in_associates_curr: investments(curr_bs, &ASSOCIATE_ITEMS, &current_sheet)?,
            investment_in_associates_prev: investments(prev_bs, &ASSOCIATE_ITEMS, &prior_sheet)?,

            audit_fee_curr: current.general_admin_detail(&AUDIT_FEE_ITEMS).unwrap_or(Decimal::ZERO),
            audit_fee_prev: previous.general_admin_detail(&AUDIT_FEE_ITEMS).unwrap_or(Decimal::ZERO),
            directors_remuneration_curr: remuneration(current),
            directors_remuneration_prev: remuneration(previous),
            directors_benefits_curr: benefits(current, &current_sheet)?,
            directors_benefits_prev: benefits(previous, &prior_sheet)?,

            share_capital_curr,
            share_capital_prev: first(previous, BalanceBucket::Equity, &["share capital"]),
            capital_reserves_curr: first(current, BalanceBucket::Equity, &CAPITAL_RESERVE_ITEMS),
            capital_reserves_prev: first(previous, BalanceBucket::Equity, &CAPITAL_RESERVE_ITEMS),
            dividends_curr: equity.current.dividends_paid,
            dividends_prev: equity.previous.dividends_paid,
            retained_earnings_curr: equity.current.retained_earnings,
            retained_earnings_prev: equity.previous.retained_earnings,
            total_equity_curr: equity.current.total_equity,
            total_equity_prev: equity.previous.total_equity,

            due_shareholder: related(RelatedParty::Shareholder),
            due_final_holding_parent: related(RelatedParty::FinalHoldingParent),
            due_immediate_parent: related(RelatedParty::ImmediateParent),
            due_ultimate_holding_company: related(RelatedParty::UltimateHoldingCompany),
            due_holding_company: related(RelatedParty::HoldingCompany),

            labels: StatementLabels::derive(current, previous, equity, ledger.first_year),
        })
    }

    /// Describes the disagreement when the balance sheet inventories differ
    /// from the closing inventories in cost of sales, in either year.
    pub fn inventory_mismatch(&self) -> Option<String> {
        if self.inventories_curr == self.closing_inventories_curr
            && self.inventories_prev == self.closing_inventories_prev
        {
            return None;
        }
        Some(format!(
            "Inventories mismatch: inventories {} / {} (current / prior), closing inventories {} / {}",
            self.inventories_curr,
            self.inventories_prev,
            self.closing_inventories_curr,
            self.closing_inventories_prev
        ))
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
