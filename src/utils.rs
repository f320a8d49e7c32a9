use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tolerance used when deciding whether a ledger value carries cents.
const FRACTION_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 6);

/// Ledger-wide numeric precision, inferred once from every debtor/creditor cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    /// No value has a fractional part; figures are truncated to whole units.
    #[default]
    Integer,
    /// At least one value has cents; figures are rounded to 2 decimal places.
    TwoDecimals,
}

impl Precision {
    pub fn infer<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a Decimal>,
    {
        if values.into_iter().any(has_fraction) {
            Precision::TwoDecimals
        } else {
            Precision::Integer
        }
    }

    pub fn apply(self, value: Decimal) -> Decimal {
        match self {
            Precision::Integer => value.trunc(),
            Precision::TwoDecimals => value.round_dp(2),
        }
    }
}

pub fn has_fraction(value: &Decimal) -> bool {
    (*value - value.round()).abs() > FRACTION_EPSILON
}

/// Presentation style for [`format_amount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmountStyle {
    /// Negative amounts in parentheses.
    #[default]
    Plain,
    /// Costs, admin expenses and liabilities are always shown in parentheses.
    Deduction,
    /// Absolute value without parentheses.
    Tax,
}

/// Formats a figure the way audit report templates expect it: whole units with
/// thousands separators, `-` for zero.
pub fn format_amount(value: Decimal, style: AmountStyle) -> String {
    let whole = value.trunc();
    if whole.is_zero() {
        return "-".to_string();
    }

    let digits = group_thousands(whole.abs());
    match style {
        AmountStyle::Tax => digits,
        AmountStyle::Deduction => format!("({})", digits),
        AmountStyle::Plain if whole.is_sign_negative() => format!("({})", digits),
        AmountStyle::Plain => digits,
    }
}

fn group_thousands(value: Decimal) -> String {
    let raw = value.to_u128().map(|v| v.to_string()).unwrap_or_else(|| value.to_string());
    let mut grouped = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, ch) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_precision_inference() {
        let whole = [dec!(100), dec!(0), dec!(-2500)];
        assert_eq!(Precision::infer(whole.iter()), Precision::Integer);

        let cents = [dec!(100), dec!(12.5), dec!(3)];
        assert_eq!(Precision::infer(cents.iter()), Precision::TwoDecimals);

        // Noise below the epsilon does not count as a fractional part
        let noise = [dec!(100.0000001)];
        assert_eq!(Precision::infer(noise.iter()), Precision::Integer);
    }

    #[test]
    fn test_precision_apply() {
        assert_eq!(Precision::Integer.apply(dec!(99.99)), dec!(99));
        assert_eq!(Precision::Integer.apply(dec!(-99.99)), dec!(-99));
        assert_eq!(Precision::TwoDecimals.apply(dec!(1.005)), dec!(1.00));
        assert_eq!(Precision::TwoDecimals.apply(dec!(1.015)), dec!(1.02));
        assert_eq!(Precision::TwoDecimals.apply(dec!(7.1234)), dec!(7.12));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(0), AmountStyle::Plain), "-");
        assert_eq!(format_amount(dec!(0.4), AmountStyle::Plain), "-");
        assert_eq!(format_amount(dec!(1234567), AmountStyle::Plain), "1,234,567");
        assert_eq!(format_amount(dec!(-1234), AmountStyle::Plain), "(1,234)");
        assert_eq!(format_amount(dec!(500), AmountStyle::Deduction), "(500)");
        assert_eq!(format_amount(dec!(-12000), AmountStyle::Tax), "12,000");
        assert_eq!(format_amount(dec!(999.9), AmountStyle::Plain), "999");
    }
}
