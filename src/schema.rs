use crate::error::{Result, StatementError};
use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn default_header_rows() -> usize {
    3
}

/// Run configuration handed to the loader. One instance per report generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EngineConfig {
    #[schemars(description = "The fiscal year being reported on; its ledger lives on sheet '{year}TB'")]
    pub current_year: i32,

    #[serde(default)]
    #[schemars(
        description = "True for the entity's first reporting period. No prior-year sheet is required and the prior-year statement is empty."
    )]
    pub first_year: bool,

    #[serde(default = "default_header_rows")]
    #[schemars(description = "Number of header rows to skip on every ledger sheet. Defaults to 3.")]
    pub header_rows: usize,
}

impl EngineConfig {
    pub fn new(current_year: i32, first_year: bool) -> Self {
        Self {
            current_year,
            first_year,
            header_rows: default_header_rows(),
        }
    }

    pub fn previous_year(&self) -> i32 {
        self.current_year - 1
    }

    pub fn sheet_name(year: i32) -> String {
        format!("{}TB", year)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(EngineConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// The reporting period described by its last day, e.g. "31 December 2024".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingPeriod {
    pub year_end: NaiveDate,
}

impl ReportingPeriod {
    pub fn parse(last_day_of_year: &str) -> Result<Self> {
        let year_end = NaiveDate::parse_from_str(last_day_of_year.trim(), "%d %B %Y").map_err(|_| {
            StatementError::InvalidReportingPeriod(format!(
                "Invalid date format for last day of year: {}. Expected format: '31 December 2024'",
                last_day_of_year
            ))
        })?;
        Ok(Self { year_end })
    }

    pub fn current_year(&self) -> i32 {
        self.year_end.year()
    }

    pub fn is_december(&self) -> bool {
        self.year_end.month() == 12
    }

    /// Same calendar day one year earlier; 29 February falls back to the 28th.
    pub fn prior_year_end(&self) -> NaiveDate {
        year_earlier(self.year_end)
    }

    /// First day of the period: 1 January for a December year end, otherwise
    /// the day after the prior year end.
    pub fn period_start(&self) -> NaiveDate {
        if self.is_december() {
            return NaiveDate::from_ymd_opt(self.year_end.year(), 1, 1).unwrap_or(self.year_end);
        }
        self.year_end
            .succ_opt()
            .map(year_earlier)
            .unwrap_or_else(|| self.prior_year_end())
    }

    pub fn dates(&self) -> PeriodDates {
        PeriodDates {
            year_end: self.year_end,
            prior_year_end: self.prior_year_end(),
            period_start: self.period_start(),
            is_december: self.is_december(),
        }
    }

    pub fn engine_config(&self, first_year: bool) -> EngineConfig {
        EngineConfig::new(self.current_year(), first_year)
    }
}

fn year_earlier(date: NaiveDate) -> NaiveDate {
    let year = date.year() - 1;
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), date.day() - 1))
        .unwrap_or(date)
}

/// Dates the report template prints for the period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PeriodDates {
    pub year_end: NaiveDate,
    pub prior_year_end: NaiveDate,
    pub period_start: NaiveDate,
    pub is_december: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema_json = EngineConfig::schema_as_json().unwrap();
        assert!(schema_json.contains("current_year"));
        assert!(schema_json.contains("first_year"));
        assert!(schema_json.contains("header_rows"));
    }

    #[test]
    fn test_config_defaults() {
        let config = EngineConfig::from_json(r#"{ "current_year": 2024 }"#).unwrap();
        assert_eq!(config.current_year, 2024);
        assert!(!config.first_year);
        assert_eq!(config.header_rows, 3);
        assert_eq!(config.previous_year(), 2023);
        assert_eq!(EngineConfig::sheet_name(2023), "2023TB");
    }

    #[test]
    fn test_reporting_period() {
        let period = ReportingPeriod::parse("31 December 2024").unwrap();
        assert_eq!(period.current_year(), 2024);
        assert!(period.is_december());
        assert_eq!(
            period.prior_year_end(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
        );

        let leap = ReportingPeriod::parse("29 February 2024").unwrap();
        assert!(!leap.is_december());
        assert_eq!(
            leap.prior_year_end(),
            NaiveDate::from_ymd_opt(2023, 2, 28).unwrap()
        );

        let config = leap.engine_config(true);
        assert_eq!(config.current_year, 2024);
        assert!(config.first_year);
    }

    #[test]
    fn test_period_start() {
        let december = ReportingPeriod::parse("31 December 2024").unwrap();
        assert_eq!(december.period_start(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        let june = ReportingPeriod::parse("30 June 2024").unwrap();
        assert_eq!(june.period_start(), NaiveDate::from_ymd_opt(2023, 7, 1).unwrap());

        // The day after 28 February 2024 is a leap day with no counterpart in 2023.
        let february = ReportingPeriod::parse("28 February 2024").unwrap();
        assert_eq!(february.period_start(), NaiveDate::from_ymd_opt(2023, 2, 28).unwrap());

        let dates = june.dates();
        assert_eq!(dates.year_end, NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        assert_eq!(dates.prior_year_end, NaiveDate::from_ymd_opt(2023, 6, 30).unwrap());
        assert!(!dates.is_december);
    }

    #[test]
    fn test_reporting_period_rejects_bad_format() {
        let err = ReportingPeriod::parse("2024-12-31").unwrap_err();
        assert!(matches!(err, StatementError::InvalidReportingPeriod(_)));
    }
}
