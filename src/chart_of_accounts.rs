use crate::error::{Result, StatementError};
use log::{debug, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The fixed opening-balance aliases. They are recognized in any ledger but never
/// belong to a category.
pub const BALANCE_BEFORE_PERIOD_ALIASES: [&str; 3] = [
    "balance before current period",
    "balance bf current period",
    "balance b/f current period",
];

pub const DEFAULT_CLOSING_INVENTORIES: &str = "closing inventories";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    NonCurrentAssets,
    CurrentAssets,
    CurrentLiabilities,
    NonCurrentLiabilities,
    Equity,
    #[serde(rename = "revenue_items")]
    Revenue,
    #[serde(rename = "cost_of_sales_items")]
    CostOfSales,
    ClosingInventories,
    #[serde(rename = "other_income_items")]
    OtherIncome,
    #[serde(rename = "general_admin_expenses_items")]
    GeneralAdminExpenses,
    #[serde(rename = "finance_costs_items")]
    FinanceCosts,
    #[serde(rename = "tax_items")]
    Tax,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::NonCurrentAssets,
        Category::CurrentAssets,
        Category::CurrentLiabilities,
        Category::NonCurrentLiabilities,
        Category::Equity,
        Category::Revenue,
        Category::CostOfSales,
        Category::ClosingInventories,
        Category::OtherIncome,
        Category::GeneralAdminExpenses,
        Category::FinanceCosts,
        Category::Tax,
    ];

    /// Key used in taxonomy files.
    pub fn key(self) -> &'static str {
        match self {
            Category::NonCurrentAssets => "non_current_assets",
            Category::CurrentAssets => "current_assets",
            Category::CurrentLiabilities => "current_liabilities",
            Category::NonCurrentLiabilities => "non_current_liabilities",
            Category::Equity => "equity",
            Category::Revenue => "revenue_items",
            Category::CostOfSales => "cost_of_sales_items",
            Category::ClosingInventories => "closing_inventories",
            Category::OtherIncome => "other_income_items",
            Category::GeneralAdminExpenses => "general_admin_expenses_items",
            Category::FinanceCosts => "finance_costs_items",
            Category::Tax => "tax_items",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

pub fn normalize_item(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn is_balance_before_period(name: &str) -> bool {
    BALANCE_BEFORE_PERIOD_ALIASES.contains(&name)
}

/// Category lists as they appear in a taxonomy file. `closing_inventories` is
/// historically a single string, so both shapes are accepted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum CategoryEntries {
    Single(String),
    Many(Vec<String>),
}

impl CategoryEntries {
    fn into_vec(self) -> Vec<String> {
        match self {
            CategoryEntries::Single(item) => vec![item],
            CategoryEntries::Many(items) => items,
        }
    }
}

/// On-disk shape of a taxonomy. Every key is optional; missing categories keep
/// their defaults when loaded.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TaxonomyFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_current_assets: Option<CategoryEntries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_assets: Option<CategoryEntries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_liabilities: Option<CategoryEntries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_current_liabilities: Option<CategoryEntries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equity: Option<CategoryEntries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_items: Option<CategoryEntries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_of_sales_items: Option<CategoryEntries>,
    #[schemars(description = "Closing inventory marker; a single name or a list")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing_inventories: Option<CategoryEntries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_income_items: Option<CategoryEntries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general_admin_expenses_items: Option<CategoryEntries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finance_costs_items: Option<CategoryEntries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_items: Option<CategoryEntries>,
}

impl TaxonomyFile {
    fn into_entries(self) -> Vec<(Category, CategoryEntries)> {
        [
            (Category::NonCurrentAssets, self.non_current_assets),
            (Category::CurrentAssets, self.current_assets),
            (Category::CurrentLiabilities, self.current_liabilities),
            (Category::NonCurrentLiabilities, self.non_current_liabilities),
            (Category::Equity, self.equity),
            (Category::Revenue, self.revenue_items),
            (Category::CostOfSales, self.cost_of_sales_items),
            (Category::ClosingInventories, self.closing_inventories),
            (Category::OtherIncome, self.other_income_items),
            (Category::GeneralAdminExpenses, self.general_admin_expenses_items),
            (Category::FinanceCosts, self.finance_costs_items),
            (Category::Tax, self.tax_items),
        ]
        .into_iter()
        .filter_map(|(category, entries)| entries.map(|e| (category, e)))
        .collect()
    }
}

/// Partition of recognized item names into the twelve reporting categories.
///
/// Names are canonicalised (trimmed, lower-cased) once on insertion so that
/// lookups are plain set membership tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryTaxonomy {
    categories: BTreeMap<Category, BTreeSet<String>>,
}

impl CategoryTaxonomy {
    pub fn empty() -> Self {
        let mut categories: BTreeMap<Category, BTreeSet<String>> =
            Category::ALL.iter().map(|c| (*c, BTreeSet::new())).collect();
        categories
            .entry(Category::ClosingInventories)
            .or_default()
            .insert(DEFAULT_CLOSING_INVENTORIES.to_string());
        Self { categories }
    }

    pub fn from_lists<I, S>(lists: I) -> Self
    where
        I: IntoIterator<Item = (Category, Vec<S>)>,
        S: AsRef<str>,
    {
        let mut taxonomy = Self::empty();
        for (category, items) in lists {
            let set: BTreeSet<String> = items
                .iter()
                .map(|item| normalize_item(item.as_ref()))
                .filter(|item| !item.is_empty())
                .collect();
            taxonomy.set_category(category, set);
        }
        taxonomy
    }

    /// Parses a taxonomy file. Categories absent from the file keep their
    /// default lists.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: TaxonomyFile = serde_json::from_str(json)?;
        let mut taxonomy = Self::default();
        for (category, entries) in file.into_entries() {
            let set = entries
                .into_vec()
                .iter()
                .map(|item| normalize_item(item))
                .filter(|item| !item.is_empty())
                .collect();
            taxonomy.set_category(category, set);
        }
        debug!(
            "Loaded taxonomy with {} recognized item names",
            taxonomy.total_items()
        );
        Ok(taxonomy)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(TaxonomyFile)
    }

    fn set_category(&mut self, category: Category, mut items: BTreeSet<String>) {
        if category == Category::ClosingInventories && items.is_empty() {
            items.insert(DEFAULT_CLOSING_INVENTORIES.to_string());
        }
        self.categories.insert(category, items);
    }

    pub fn items(&self, category: Category) -> impl Iterator<Item = &str> {
        self.categories
            .get(&category)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn contains(&self, category: Category, item: &str) -> bool {
        self.categories
            .get(&category)
            .is_some_and(|set| set.contains(item))
    }

    /// True when the name belongs to any category or is an opening-balance alias.
    pub fn recognizes(&self, item: &str) -> bool {
        is_balance_before_period(item) || self.categories.values().any(|set| set.contains(item))
    }

    pub fn categories_of(&self, item: &str) -> Vec<Category> {
        self.categories
            .iter()
            .filter(|(_, set)| set.contains(item))
            .map(|(category, _)| *category)
            .collect()
    }

    pub fn total_items(&self) -> usize {
        self.categories.values().map(BTreeSet::len).sum()
    }

    pub fn add_item(&mut self, category: Category, item: &str) -> Result<()> {
        let item = normalize_item(item);
        let set = self.categories.entry(category).or_default();
        if set.contains(&item) {
            return Err(StatementError::DuplicateCategoryItem {
                category: category.to_string(),
                item,
            });
        }
        set.insert(item);
        Ok(())
    }

    pub fn modify_item(&mut self, category: Category, old_item: &str, new_item: &str) -> Result<()> {
        let old_item = normalize_item(old_item);
        let new_item = normalize_item(new_item);
        let set = self.categories.entry(category).or_default();

        if !set.contains(&old_item) {
            return Err(StatementError::CategoryItemNotFound {
                category: category.to_string(),
                item: old_item,
            });
        }
        if new_item != old_item && set.contains(&new_item) {
            return Err(StatementError::DuplicateCategoryItem {
                category: category.to_string(),
                item: new_item,
            });
        }

        set.remove(&old_item);
        set.insert(new_item);
        Ok(())
    }

    pub fn delete_item(&mut self, category: Category, item: &str) -> Result<()> {
        let item = normalize_item(item);
        let set = self.categories.entry(category).or_default();
        if !set.remove(&item) {
            return Err(StatementError::CategoryItemNotFound {
                category: category.to_string(),
                item,
            });
        }

        if category == Category::ClosingInventories && set.is_empty() {
            warn!(
                "Closing inventories category emptied, restoring '{}'",
                DEFAULT_CLOSING_INVENTORIES
            );
            set.insert(DEFAULT_CLOSING_INVENTORIES.to_string());
        }
        Ok(())
    }
}

impl Default for CategoryTaxonomy {
    fn default() -> Self {
        Self::from_lists([
            (
                Category::NonCurrentAssets,
                vec![
                    "Intangible assets",
                    "Investments in a subsidiary",
                    "Investments in an associate",
                    "Investments in subsidiaries",
                    "Interests in subsidiaries",
                    "Interests in a subsidiary",
                    "Investments in associates",
                    "Long-term investments",
                    "Property, plant and equipment",
                    "Deferred tax assets",
                ],
            ),
            (
                Category::CurrentAssets,
                vec![
                    "Amount due from director",
                    "Amount due from a director",
                    "Amount due from the director",
                    "Amount due from directors",
                    "Amount due from shareholder",
                    "Amount due from a shareholder",
                    "Amount due from the shareholder",
                    "Amount due from shareholders",
                    "Amount due from final holding parent company",
                    "Amount due from a final holding parent company",
                    "Amount due from the final holding parent company",
                    "Amount due from final holding parent companies",
                    "Amount due from immediate parent company",
                    "Amount due from an immediate parent company",
                    "Amount due from the immediate parent company",
                    "Amount due from immediate parent companies",
                    "Amount due from holding company",
                    "Amount due from a holding company",
                    "Amount due from the holding company",
                    "Amount due from holding companies",
                    "Amount due from ultimate holding company",
                    "Amount due from an ultimate holding company",
                    "Amount due from the ultimate holding company",
                    "Amount due from ultimate holding companies",
                    "Amount due from related company",
                    "Amount due from a related company",
                    "Amount due from the related company",
                    "Amount due from related companies",
                    "Cash and bank balances",
                    "Cash and cash equivalents",
                    "Current investments",
                    "Inventories",
                    "Other receivables",
                    "Prepayments",
                    "Prepayment",
                    "Rental deposit",
                    "Tax recoverable",
                    "Accounts receivable",
                    "Trade receivables",
                    "Prepaid expenses",
                ],
            ),
            (
                Category::CurrentLiabilities,
                vec![
                    "Accrued expenses",
                    "Amount due to director",
                    "Amount due to a director",
                    "Amount due to the director",
                    "Amount due to directors",
                    "Amount due to subsidiary company",
                    "Amount due to a subsidiary company",
                    "Amount due to the subsidiary company",
                    "Amount due to subsidiary companies",
                    "Amount due to related company",
                    "Amount due to a related company",
                    "Amount due to the related company",
                    "Amount due to related companies",
                    "Amount due to shareholder",
                    "Amount due to a shareholder",
                    "Amount due to the shareholder",
                    "Amount due to shareholders",
                    "Amount due to final holding parent company",
                    "Amount due to a final holding parent company",
                    "Amount due to the final holding parent company",
                    "Amount due to final holding parent companies",
                    "Amount due to immediate parent company",
                    "Amount due to an immediate parent company",
                    "Amount due to the immediate parent company",
                    "Amount due to immediate parent companies",
                    "Amount due to holding company",
                    "Amount due to a holding company",
                    "Amount due to the holding company",
                    "Amount due to holding companies",
                    "Amount due to ultimate holding company",
                    "Amount due to an ultimate holding company",
                    "Amount due to the ultimate holding company",
                    "Amount due to ultimate holding companies",
                    "Bank overdraft",
                    "Borrowings-secured",
                    "Deposits received",
                    "Deposit received",
                    "Other payables",
                    "Short-term borrowings",
                    "Tax payable",
                    "Trade payables",
                    "Accounts payable",
                    "Accounts payables",
                    "Account payables",
                    "Accrued wages",
                    "Accounts and other payables",
                ],
            ),
            (
                Category::NonCurrentLiabilities,
                vec![
                    "Deferred tax liabilities",
                    "Obligations under finance leases",
                    "Long-term borrowings",
                ],
            ),
            (
                Category::Equity,
                vec![
                    "Capital reserves",
                    "Share capital",
                    "Reserves",
                    "Dividends paid to shareholders",
                    "Dividends paid to a shareholder",
                ],
            ),
            (
                Category::Revenue,
                vec!["Sales of goods", "Services fee income", "Agency fee income"],
            ),
            (
                Category::CostOfSales,
                vec![
                    "Direct costs",
                    "Cost of services",
                    "Opening inventories",
                    "Purchases",
                ],
            ),
            (Category::ClosingInventories, vec!["Closing inventories"]),
            (
                Category::OtherIncome,
                vec![
                    "Bank interest income",
                    "Commission income",
                    "Dividend income",
                    "Exchange gains",
                    "Exchange gain",
                    "Gains on disposal of financial assets",
                    "Gains on fair value of investment securities",
                    "Government grants",
                    "Reversal of impairment of investment",
                    "Reversal of impairment losses on long-term investments",
                    "Sundry income",
                    "Refund of postage",
                    "Other income",
                ],
            ),
            (
                Category::GeneralAdminExpenses,
                vec![
                    "Accountancy fee",
                    "Accounting fee",
                    "Advertising fee",
                    "Amortisation",
                    "Annual return fee",
                    "Audit fee",
                    "Auditors' remuneration",
                    "Bank charges",
                    "Bank charges.",
                    "Bank charges and interest",
                    "Building management fee",
                    "Business registration fee",
                    "Business trips expenses",
                    "Commission",
                    "Compensation",
                    "Conference expenses",
                    "Consulting fee",
                    "Declaration",
                    "Depreciation",
                    "Director's remuneration",
                    "Director\u{2019}s remuneration",
                    "Entertainment",
                    "Exchange loss",
                    "Exchange losses",
                    "Exhibition fee",
                    "Exhibition fees",
                    "FBA operation fee",
                    "FBA storage fee",
                    "Filing fees",
                    "Impairment loss on long-term investment",
                    "Impairment losses on long-term investments",
                    "Impairment of investments in a subsidiary",
                    "Impairment of investments in subsidiaries",
                    "Impairment loss for trade and other receivables",
                    "Impairment loss for trade receivables",
                    "Impairment loss for other receivables",
                    "Inspection fee",
                    "Insurance",
                    "Insurance expenses",
                    "Inventories write down",
                    "Legal and professional fee",
                    "Legal and professional fees",
                    "Loss on disposal of financial assets",
                    "Losses on disposal of financial assets",
                    "Loss on fair value of investment securities",
                    "Losses on fair value of investments in securities",
                    "Management fee",
                    "Material fee",
                    "Motor car expenses",
                    "MPF",
                    "MPF contribution",
                    "Network service charges",
                    "Office supplies",
                    "Office expenses",
                    "Operation fee",
                    "Packing fee",
                    "Penalty",
                    "Platform commission fee",
                    "Platform fee",
                    "Platform outsourcing management fee",
                    "Postage and courier",
                    "Postage",
                    "Preliminary expenses",
                    "Printing and stationery",
                    "Promotion fee",
                    "Provision for bad debts",
                    "Rent and rates",
                    "Repair expenses",
                    "Rental vehicles",
                    "Salaries",
                    "Sample charges",
                    "Secretarial fee",
                    "Staff welfare",
                    "Welfare fee",
                    "Storage fee",
                    "Stamp duty",
                    "Technical service fee",
                    "Technical services fee",
                    "Telephone charges",
                    "Training fee",
                    "Transportation fee",
                    "Travelling",
                    "Value-added tax",
                    "Water and electricity",
                    "Asset impairment loss",
                    "Communication fee",
                    "Customs fee",
                    "Services fee",
                    "Sundry expenses",
                    "Travel expenses",
                    "Maintenance fee",
                ],
            ),
            (Category::FinanceCosts, vec!["Loan interest"]),
            (Category::Tax, vec!["Tax payable", "Tax recoverable"]),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_taxonomy_is_lowercase() {
        let taxonomy = CategoryTaxonomy::default();
        for category in Category::ALL {
            for item in taxonomy.items(category) {
                assert_eq!(item, item.to_lowercase(), "{} in {}", item, category);
            }
        }
        assert!(taxonomy.contains(Category::Revenue, "sales of goods"));
        assert!(taxonomy.contains(Category::FinanceCosts, "loan interest"));
    }

    #[test]
    fn test_recognizes_aliases_without_categorizing_them() {
        let taxonomy = CategoryTaxonomy::default();
        assert!(taxonomy.recognizes("balance b/f current period"));
        assert!(taxonomy.categories_of("balance b/f current period").is_empty());
        assert!(!taxonomy.recognizes("widget expense"));
    }

    #[test]
    fn test_item_in_two_categories() {
        let taxonomy = CategoryTaxonomy::default();
        assert_eq!(
            taxonomy.categories_of("tax payable"),
            vec![Category::CurrentLiabilities, Category::Tax]
        );
    }

    #[test]
    fn test_add_item_rejects_duplicates() {
        let mut taxonomy = CategoryTaxonomy::default();
        taxonomy
            .add_item(Category::GeneralAdminExpenses, "  Widget Expense ")
            .unwrap();
        assert!(taxonomy.contains(Category::GeneralAdminExpenses, "widget expense"));

        let err = taxonomy
            .add_item(Category::GeneralAdminExpenses, "WIDGET EXPENSE")
            .unwrap_err();
        assert!(matches!(err, StatementError::DuplicateCategoryItem { .. }));
    }

    #[test]
    fn test_modify_item() {
        let mut taxonomy = CategoryTaxonomy::default();
        taxonomy
            .modify_item(Category::Revenue, "sales of goods", "Sales of merchandise")
            .unwrap();
        assert!(taxonomy.contains(Category::Revenue, "sales of merchandise"));
        assert!(!taxonomy.contains(Category::Revenue, "sales of goods"));

        // Renaming onto itself is allowed
        taxonomy
            .modify_item(Category::Revenue, "agency fee income", "agency fee income")
            .unwrap();

        let err = taxonomy
            .modify_item(Category::Revenue, "agency fee income", "services fee income")
            .unwrap_err();
        assert!(matches!(err, StatementError::DuplicateCategoryItem { .. }));

        let err = taxonomy
            .modify_item(Category::Revenue, "no such item", "anything")
            .unwrap_err();
        assert!(matches!(err, StatementError::CategoryItemNotFound { .. }));
    }

    #[test]
    fn test_delete_last_closing_inventory_restores_default() {
        let mut taxonomy = CategoryTaxonomy::default();
        taxonomy
            .delete_item(Category::ClosingInventories, "closing inventories")
            .unwrap();
        let items: Vec<&str> = taxonomy.items(Category::ClosingInventories).collect();
        assert_eq!(items, vec![DEFAULT_CLOSING_INVENTORIES]);

        let err = taxonomy
            .delete_item(Category::Equity, "not there")
            .unwrap_err();
        assert!(matches!(err, StatementError::CategoryItemNotFound { .. }));
    }

    #[test]
    fn test_from_json_merges_defaults() {
        let json = r#"{
            "revenue_items": ["Consulting Income"],
            "closing_inventories": "Closing Stock"
        }"#;
        let taxonomy = CategoryTaxonomy::from_json(json).unwrap();

        assert!(taxonomy.contains(Category::Revenue, "consulting income"));
        assert!(!taxonomy.contains(Category::Revenue, "sales of goods"));
        assert!(taxonomy.contains(Category::ClosingInventories, "closing stock"));
        // Untouched categories keep their defaults
        assert!(taxonomy.contains(Category::Equity, "share capital"));

        let round_trip = CategoryTaxonomy::from_json(&taxonomy.to_json().unwrap()).unwrap();
        assert_eq!(round_trip, taxonomy);
    }

    #[test]
    fn test_schema_generation() {
        let schema = CategoryTaxonomy::generate_json_schema();
        let json = serde_json::to_string_pretty(&schema).unwrap();
        assert!(json.contains("closing_inventories"));
        assert!(json.contains("general_admin_expenses_items"));
    }
}
