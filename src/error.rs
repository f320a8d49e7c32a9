use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatementError {
    #[error("Sheet {sheet} not found in workbook (available sheets: {})", available.join(", "))]
    MissingSheet {
        sheet: String,
        available: Vec<String>,
    },

    #[error(
        "Failed to recognize sheet '{sheet}': the first 3 rows are headers and data starts on row 4 \
         with columns 'Item', 'Debtor', 'Creditor'. {details}"
    )]
    MalformedSheet { sheet: String, details: String },

    #[error(
        "Invalid item name '{item}' in sheet '{sheet}'. Item names may only contain letters, spaces \
         and / - , . '"
    )]
    InvalidItemName { sheet: String, item: String },

    #[error("Unrecognized item found in sheet '{sheet}': '{item}'")]
    UnrecognizedItem { item: String, sheet: String },

    #[error(
        "Net assets ({net_assets}) does not equal total equity ({total_equity}) for {year}. \
         Report generation aborted."
    )]
    NetAssetsEquityMismatch {
        year: i32,
        net_assets: Decimal,
        total_equity: Decimal,
    },

    #[error("Sheet '{sheet}' has more than one opening balance row: {}", items.join(", "))]
    AmbiguousOpeningBalance { sheet: String, items: Vec<String> },

    #[error("Item '{item}' already exists in category {category}")]
    DuplicateCategoryItem { category: String, item: String },

    #[error("Item '{item}' not found in category {category}")]
    CategoryItemNotFound { category: String, item: String },

    #[error("Invalid reporting period: {0}")]
    InvalidReportingPeriod(String),

    #[error("Year must be {current} or {}, got {year}", current - 1)]
    YearOutOfRange { year: i32, current: i32 },

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Excel error: {0}")]
    XlsxError(#[from] calamine::XlsxError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StatementError {
    pub(crate) fn amount_overflow(sheet: &str) -> Self {
        StatementError::MalformedSheet {
            sheet: sheet.to_string(),
            details: "Amounts exceed the supported numeric range.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StatementError>;
