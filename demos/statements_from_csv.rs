use financial_statement_builder::{
    format_amount, AmountStyle, CategoryTaxonomy, CsvWorkbook, LedgerSource, ReportingPeriod,
    StatementBuilder, XlsxWorkbook,
};
use std::error::Error;

// Usage: statements_from_csv <ledger.xlsx | dir with 2024TB.csv, 2023TB.csv> ["31 December 2024"] [taxonomy.json]
fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let input = args.next().ok_or("expected an .xlsx workbook or a directory of <year>TB.csv sheets")?;
    let year_end = args.next().unwrap_or_else(|| "31 December 2024".to_string());

    let taxonomy = match args.next() {
        Some(path) => CategoryTaxonomy::from_json(&std::fs::read_to_string(path)?)?,
        None => CategoryTaxonomy::default(),
    };

    let period = ReportingPeriod::parse(&year_end)?;
    let workbook: Box<dyn LedgerSource> = if input.ends_with(".xlsx") {
        Box::new(XlsxWorkbook::open(&input)?)
    } else {
        Box::new(CsvWorkbook::open(&input)?)
    };
    let first_year = !workbook.has_sheet(&format!("{}TB", period.current_year() - 1));

    let report = StatementBuilder::for_period(period, first_year, &taxonomy).build(workbook.as_ref())?;
    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }
    let current = &report.current;
    let labels = &report.figures.labels;

    if let Some(dates) = &report.period {
        println!("Period {} to {}", dates.period_start, dates.year_end);
    }
    println!("Year ended {}", year_end);
    println!("{:<40}{:>16}", "Revenue", format_amount(current.revenue, AmountStyle::Plain));
    println!(
        "{:<40}{:>16}",
        "Cost of sales",
        format_amount(current.cost_of_sales, AmountStyle::Deduction)
    );
    println!(
        "{:<40}{:>16}",
        format!("GROSS {}", labels.gross_profit),
        format_amount(current.gross_profit, AmountStyle::Plain)
    );
    println!(
        "{:<40}{:>16}",
        format!("{} before tax", labels.profit_before_tax),
        format_amount(current.profit_before_tax, AmountStyle::Plain)
    );
    println!("{:<40}{:>16}", "Taxation", format_amount(current.taxation, AmountStyle::Tax));
    println!(
        "{:<40}{:>16}",
        format!("{} for the year", labels.profit_for_year),
        format_amount(current.profit_for_year, AmountStyle::Plain)
    );
    println!(
        "{:<40}{:>16}",
        labels.net_assets,
        format_amount(current.balance_sheet.net_assets, AmountStyle::Plain)
    );

    println!("\n{}", report.to_json()?);
    Ok(())
}
