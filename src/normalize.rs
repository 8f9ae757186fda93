//! Turns the raw sheet rows into the normalized `Expenses` table.

use crate::model::{
    parse_date, Amount, DateOrder, Expense, Expenses, RawRow, RawTable, AMOUNT_SPENT_COL,
    BILLING_DATE_COL, DEFAULT_CURRENCY_SYMBOL, DEFAULT_THOUSANDS_SEPARATOR, EXPENSE_CATEGORY_COL,
    EXPENSE_DATE_COL, FIXED_COL, NAME_COL, RECURRING_COL, REQUIRED_COLUMNS,
};
use crate::DataError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Controls how amounts and dates are read.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NormalizeOptions {
    /// Removed from amounts before parsing. Defaults to `£`.
    pub currency_symbol: char,
    /// Removed from amounts before parsing. Defaults to `,`.
    pub thousands_separator: char,
    /// How ambiguous numeric dates are read. Defaults to day-first.
    pub date_order: DateOrder,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            currency_symbol: DEFAULT_CURRENCY_SYMBOL,
            thousands_separator: DEFAULT_THOUSANDS_SEPARATOR,
            date_order: DateOrder::default(),
        }
    }
}

/// Produces the normalized expense table from `raw`. The input is not modified.
///
/// - `amount_spent` has the currency symbol and thousands separators removed and is parsed as a
///   decimal. A value that still does not parse fails the whole call with
///   `DataError::InvalidAmount`.
/// - `expense_date` and `billing_date` are parsed leniently. Unreadable dates become `None`.
/// - Rows are sorted by `expense_date`, rows without a date last. The sort is stable, so rows on
///   the same day keep their sheet order.
///
/// Every worksheet must have every column in `REQUIRED_COLUMNS`, otherwise
/// `DataError::MissingColumn` naming the first such worksheet is returned before any value is
/// read. A table with no rows gives an empty `Expenses`.
pub fn normalize_expenses(
    raw: &RawTable,
    options: &NormalizeOptions,
) -> Result<Expenses, DataError> {
    if raw.is_empty() {
        return Ok(Expenses::default());
    }

    check_columns(raw)?;

    let mut data = raw
        .rows()
        .iter()
        .map(|row| normalize_row(row, options))
        .collect::<Result<Vec<Expense>, DataError>>()?;

    data.sort_by(|a, b| cmp_dates_nulls_last(a.expense_date, b.expense_date));
    Ok(Expenses::new(data))
}

/// Checks the required columns once per worksheet, in row order.
fn check_columns(raw: &RawTable) -> Result<(), DataError> {
    let mut checked = BTreeSet::new();
    for row in raw.rows() {
        if !checked.insert(row.worksheet()) {
            continue;
        }
        if let Some(missing) = REQUIRED_COLUMNS.iter().find(|c| !row.has_column(c)) {
            return Err(DataError::MissingColumn {
                worksheet: row.worksheet().to_string(),
                column: missing.to_string(),
            });
        }
    }
    Ok(())
}

fn normalize_row(row: &RawRow, options: &NormalizeOptions) -> Result<Expense, DataError> {
    let raw_amount = row.get(AMOUNT_SPENT_COL);
    let amount_spent = Amount::parse_with(
        raw_amount,
        options.currency_symbol,
        options.thousands_separator,
    )
    .map_err(|_| DataError::InvalidAmount {
        worksheet: row.worksheet().to_string(),
        row: row.row(),
        value: raw_amount.to_string(),
    })?;

    let other_fields = row
        .cells()
        .iter()
        .filter(|(column, _)| !is_known_column(column.as_ref()))
        .map(|(column, value)| (column.to_string(), value.clone()))
        .collect();

    Ok(Expense {
        month: row.worksheet().to_string(),
        amount_spent,
        expense_date: parse_date(row.get(EXPENSE_DATE_COL), options.date_order),
        billing_date: parse_date(row.get(BILLING_DATE_COL), options.date_order),
        expense_category: row.get(EXPENSE_CATEGORY_COL).to_string(),
        name: row.get(NAME_COL).to_string(),
        recurring: row.get(RECURRING_COL).to_string(),
        fixed: row.get(FIXED_COL).to_string(),
        other_fields,
    })
}

fn is_known_column(column: &str) -> bool {
    REQUIRED_COLUMNS.contains(&column) || column == FIXED_COL
}

/// Orders dates ascending with `None` after every date.
fn cmp_dates_nulls_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const HEADERS: [&str; 7] = [
        "Name",
        "Amount Spent",
        "Expense Date",
        "Billing Date",
        "Expense Category",
        "Recurring",
        "Fixed",
    ];

    fn table(worksheet: &str, rows: &[[&str; 7]]) -> RawTable {
        let mut data = vec![HEADERS.to_vec()];
        data.extend(rows.iter().map(|r| r.to_vec()));
        RawTable::from_worksheet(worksheet, data).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn ymd(s: &str) -> Option<NaiveDate> {
        Some(NaiveDate::from_str(s).unwrap())
    }

    #[test]
    fn test_amounts_are_cleaned() {
        let raw = table(
            "January",
            &[
                ["Laptop", "£1,234.56", "2024-01-02", "", "Tech", "No", "No"],
                ["Gum", "£0.99", "2024-01-01", "", "Food", "No", "No"],
            ],
        );
        let expenses = normalize_expenses(&raw, &NormalizeOptions::default()).unwrap();
        let amounts: Vec<Decimal> = expenses
            .iter()
            .map(|e| e.amount_spent().value())
            .collect();
        assert_eq!(amounts, vec![dec("0.99"), dec("1234.56")]);
    }

    #[test]
    fn test_unparseable_amount_is_an_error() {
        let raw = table(
            "February",
            &[
                ["Tesco", "£10.00", "2024-02-01", "", "Food", "No", "No"],
                ["Mystery", "N/A", "2024-02-02", "", "Food", "No", "No"],
            ],
        );
        let err = normalize_expenses(&raw, &NormalizeOptions::default()).unwrap_err();
        assert_eq!(
            err,
            DataError::InvalidAmount {
                worksheet: "February".to_string(),
                row: 3,
                value: "N/A".to_string(),
            }
        );
    }

    #[test]
    fn test_amount_too_large_to_sum_is_an_error() {
        let raw = table(
            "February",
            &[
                ["Mystery", "79228162514264337593543950335", "2024-02-01", "", "Food", "No", "No"],
                ["Tesco", "£1.00", "2024-02-02", "", "Food", "No", "No"],
            ],
        );
        let err = normalize_expenses(&raw, &NormalizeOptions::default()).unwrap_err();
        assert!(matches!(err, DataError::InvalidAmount { row: 2, .. }));
    }

    #[test]
    fn test_blank_amount_is_an_error() {
        let raw = table(
            "February",
            &[["Tesco", "", "2024-02-01", "", "Food", "No", "No"]],
        );
        let err = normalize_expenses(&raw, &NormalizeOptions::default()).unwrap_err();
        assert!(matches!(err, DataError::InvalidAmount { .. }));
    }

    #[test]
    fn test_bad_dates_become_none_and_sort_last() {
        let raw = table(
            "March",
            &[
                ["A", "£1.00", "soon", "also bad", "X", "No", "No"],
                ["B", "£2.00", "2024-03-05", "05/04/2024", "X", "No", "No"],
                ["C", "£3.00", "", "", "X", "No", "No"],
                ["D", "£4.00", "2024-03-01", "", "X", "No", "No"],
            ],
        );
        let expenses = normalize_expenses(&raw, &NormalizeOptions::default()).unwrap();
        assert_eq!(expenses.len(), raw.len());
        let names: Vec<&str> = expenses.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["D", "B", "A", "C"]);
        assert_eq!(expenses.data()[0].expense_date(), ymd("2024-03-01"));
        assert_eq!(expenses.data()[1].billing_date(), ymd("2024-04-05"));
        assert_eq!(expenses.data()[2].expense_date(), None);
        assert_eq!(expenses.data()[2].billing_date(), None);
    }

    #[test]
    fn test_sort_is_stable_for_equal_dates() {
        let raw = table(
            "April",
            &[
                ["first", "£1.00", "2024-04-02", "", "X", "No", "No"],
                ["early", "£1.00", "2024-04-01", "", "X", "No", "No"],
                ["second", "£1.00", "2024-04-02", "", "X", "No", "No"],
            ],
        );
        let expenses = normalize_expenses(&raw, &NormalizeOptions::default()).unwrap();
        let names: Vec<&str> = expenses.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["early", "first", "second"]);
    }

    #[test]
    fn test_month_comes_from_the_worksheet() {
        let raw = RawTable::concat([
            table("Jan", &[["A", "1", "2024-01-01", "", "X", "No", "No"]]),
            table("Feb", &[["B", "2", "2024-02-01", "", "X", "No", "No"]]),
        ]);
        let expenses = normalize_expenses(&raw, &NormalizeOptions::default()).unwrap();
        let months: Vec<&str> = expenses.iter().map(|e| e.month()).collect();
        assert_eq!(months, vec!["Jan", "Feb"]);
    }

    #[test]
    fn test_missing_column_is_a_schema_error() {
        let raw = RawTable::from_worksheet(
            "January",
            vec![
                vec!["name", "amount_spent", "expense_date", "billing_date", "recurring"],
                vec!["Tesco", "£1.00", "2024-01-01", "", "No"],
            ],
        )
        .unwrap();
        let err = normalize_expenses(&raw, &NormalizeOptions::default()).unwrap_err();
        assert_eq!(
            err,
            DataError::MissingColumn {
                worksheet: "January".to_string(),
                column: "expense_category".to_string()
            }
        );
    }

    #[test]
    fn test_missing_column_is_reported_before_bad_values() {
        let raw = RawTable::from_worksheet(
            "January",
            vec![vec!["name", "amount_spent"], vec!["Tesco", "N/A"]],
        )
        .unwrap();
        let err = normalize_expenses(&raw, &NormalizeOptions::default()).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { .. }));
    }

    #[test]
    fn test_each_worksheet_needs_every_column() {
        let january = table(
            "January",
            &[["Tesco", "£10.00", "02/01/2024", "", "Groceries", "No", "No"]],
        );
        let february = RawTable::from_worksheet(
            "February",
            vec![
                vec!["Name", "Amount Spent", "Expense Date", "Billing Date", "Recurring"],
                vec!["Pret", "£5.00", "03/02/2024", "", "No"],
            ],
        )
        .unwrap();
        let raw = RawTable::concat([january, february]);
        // The combined headers have every column, but February does not.
        assert!(raw.has_column("expense_category"));

        let err = normalize_expenses(&raw, &NormalizeOptions::default()).unwrap_err();
        assert_eq!(
            err,
            DataError::MissingColumn {
                worksheet: "February".to_string(),
                column: "expense_category".to_string()
            }
        );
    }

    #[test]
    fn test_missing_amount_column_is_not_a_blank_amount() {
        let january = table(
            "January",
            &[["Tesco", "£10.00", "02/01/2024", "", "Groceries", "No", "No"]],
        );
        let february = RawTable::from_worksheet(
            "February",
            vec![
                vec!["Name", "Expense Date", "Billing Date", "Expense Category", "Recurring"],
                vec!["Pret", "03/02/2024", "", "Eating Out", "No"],
            ],
        )
        .unwrap();
        let err = normalize_expenses(
            &RawTable::concat([january, february]),
            &NormalizeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DataError::MissingColumn { ref worksheet, ref column }
                if worksheet == "February" && column == "amount_spent"
        ));
    }

    #[test]
    fn test_empty_table() {
        let expenses = normalize_expenses(&RawTable::default(), &NormalizeOptions::default())
            .unwrap();
        assert!(expenses.is_empty());
    }

    #[test]
    fn test_other_fields_are_kept() {
        let raw = RawTable::from_worksheet(
            "January",
            vec![
                vec![
                    "name",
                    "amount_spent",
                    "expense_date",
                    "billing_date",
                    "expense_category",
                    "recurring",
                    "Payment Method",
                ],
                vec!["Tesco", "£1.00", "2024-01-01", "", "Food", "No", "Card"],
            ],
        )
        .unwrap();
        let expenses = normalize_expenses(&raw, &NormalizeOptions::default()).unwrap();
        let expense = &expenses.data()[0];
        assert_eq!(expense.fixed(), "");
        assert_eq!(
            expense.other_fields().get("payment_method").map(String::as_str),
            Some("Card")
        );
        assert_eq!(expense.other_fields().len(), 1);
    }

    #[test]
    fn test_month_first_option() {
        let raw = table(
            "January",
            &[["A", "$5.00", "01/02/2024", "", "X", "No", "No"]],
        );
        let options = NormalizeOptions {
            currency_symbol: '$',
            date_order: DateOrder::MonthFirst,
            ..NormalizeOptions::default()
        };
        let expenses = normalize_expenses(&raw, &options).unwrap();
        assert_eq!(expenses.data()[0].expense_date(), ymd("2024-01-02"));
        assert_eq!(expenses.data()[0].amount_spent().value(), dec("5.00"));
    }

    #[test]
    fn test_input_is_not_modified() {
        let raw = table(
            "January",
            &[
                ["B", "£2.00", "2024-01-02", "", "X", "No", "No"],
                ["A", "£1.00", "2024-01-01", "", "X", "No", "No"],
            ],
        );
        let before = raw.clone();
        let _ = normalize_expenses(&raw, &NormalizeOptions::default()).unwrap();
        assert_eq!(raw, before);
    }
}
