use crate::model::Amount;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub(crate) const AMOUNT_SPENT_COL: &str = "amount_spent";
pub(crate) const EXPENSE_DATE_COL: &str = "expense_date";
pub(crate) const BILLING_DATE_COL: &str = "billing_date";
pub(crate) const EXPENSE_CATEGORY_COL: &str = "expense_category";
pub(crate) const NAME_COL: &str = "name";
pub(crate) const RECURRING_COL: &str = "recurring";
pub(crate) const FIXED_COL: &str = "fixed";

/// The columns an expense row cannot be built without.
pub(crate) const REQUIRED_COLUMNS: &[&str] = &[
    AMOUNT_SPENT_COL,
    EXPENSE_DATE_COL,
    BILLING_DATE_COL,
    EXPENSE_CATEGORY_COL,
    NAME_COL,
    RECURRING_COL,
];

/// The value of the `recurring` column that marks a recurring expense (compared ignoring case).
const RECURRING_YES: &str = "yes";

/// A single normalized expense.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Expense {
    /// The worksheet (tab) the row came from, which names the month.
    pub(crate) month: String,
    pub(crate) amount_spent: Amount,
    pub(crate) expense_date: Option<NaiveDate>,
    pub(crate) billing_date: Option<NaiveDate>,
    pub(crate) expense_category: String,
    pub(crate) name: String,
    pub(crate) recurring: String,
    pub(crate) fixed: String,
    pub(crate) other_fields: BTreeMap<String, String>,
}

impl Expense {
    pub fn month(&self) -> &str {
        &self.month
    }

    pub fn amount_spent(&self) -> Amount {
        self.amount_spent
    }

    pub fn expense_date(&self) -> Option<NaiveDate> {
        self.expense_date
    }

    pub fn billing_date(&self) -> Option<NaiveDate> {
        self.billing_date
    }

    pub fn expense_category(&self) -> &str {
        &self.expense_category
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn recurring(&self) -> &str {
        &self.recurring
    }

    pub fn fixed(&self) -> &str {
        &self.fixed
    }

    pub fn other_fields(&self) -> &BTreeMap<String, String> {
        &self.other_fields
    }

    /// True when the `recurring` flag says "yes", in any case.
    pub fn is_recurring(&self) -> bool {
        self.recurring.trim().eq_ignore_ascii_case(RECURRING_YES)
    }
}

/// The normalized expense table. Rows are ordered by `expense_date`, rows without a date last.
///
/// An `Expenses` value is never modified after it is created. Filters return a new table that
/// keeps the order of the rows they select.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Expenses {
    data: Vec<Expense>,
}

impl Expenses {
    pub(crate) fn new(data: Vec<Expense>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &[Expense] {
        &self.data
    }

    pub fn iter(&self) -> impl Iterator<Item = &Expense> {
        self.data.iter()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the rows for which `predicate` is true.
    pub fn filter(&self, predicate: impl Fn(&Expense) -> bool) -> Expenses {
        Expenses::new(self.iter().filter(|e| predicate(e)).cloned().collect())
    }

    /// Rows from the worksheet labelled `month`.
    pub fn for_month(&self, month: &str) -> Expenses {
        self.filter(|e| e.month == month)
    }

    /// Rows whose category is not one of `categories`, compared ignoring case.
    pub fn excluding_categories<S: AsRef<str>>(&self, categories: &[S]) -> Expenses {
        let excluded = lowercase_set(categories);
        self.filter(|e| !excluded.contains(&e.expense_category.trim().to_lowercase()))
    }

    /// Rows with an expense date of exactly `date`.
    pub fn on_date(&self, date: NaiveDate) -> Expenses {
        self.filter(|e| e.expense_date == Some(date))
    }

    /// Rows with an expense date on or after `date`. Rows without a date are left out.
    pub fn since(&self, date: NaiveDate) -> Expenses {
        self.filter(|e| e.expense_date.is_some_and(|d| d >= date))
    }

    /// Rows flagged as recurring.
    pub fn recurring(&self) -> Expenses {
        self.filter(Expense::is_recurring)
    }

    /// The sum of `amount_spent` over all rows.
    pub fn total(&self) -> Decimal {
        self.iter().map(|e| e.amount_spent.value()).sum()
    }

    /// The mean of `amount_spent`, or `None` for an empty table.
    pub fn mean(&self) -> Option<Decimal> {
        if self.is_empty() {
            return None;
        }
        Some(self.total() / Decimal::from(self.len()))
    }

    /// The distinct month labels in sorted order, leaving out the worksheets named in
    /// `excluded_tabs` (compared ignoring case and surrounding whitespace).
    pub fn month_options<S: AsRef<str>>(&self, excluded_tabs: &[S]) -> Vec<String> {
        let excluded = lowercase_set(excluded_tabs);
        self.iter()
            .map(|e| e.month.as_str())
            .filter(|m| !excluded.contains(&m.trim().to_lowercase()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(String::from)
            .collect()
    }
}

impl<'a> IntoIterator for &'a Expenses {
    type Item = &'a Expense;
    type IntoIter = std::slice::Iter<'a, Expense>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

fn lowercase_set<S: AsRef<str>>(values: &[S]) -> BTreeSet<String> {
    values
        .iter()
        .map(|s| s.as_ref().trim().to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn expense(month: &str, amount: &str, date: Option<&str>, category: &str) -> Expense {
        Expense {
            month: month.to_string(),
            amount_spent: Amount::from_str(amount).unwrap(),
            expense_date: date.map(|d| NaiveDate::from_str(d).unwrap()),
            expense_category: category.to_string(),
            name: "Shop".to_string(),
            ..Expense::default()
        }
    }

    fn ymd(s: &str) -> NaiveDate {
        NaiveDate::from_str(s).unwrap()
    }

    fn sample() -> Expenses {
        let mut rent = expense("January", "£950.00", Some("2024-01-01"), "Rent");
        rent.recurring = "Yes".to_string();
        let mut phone = expense("February", "£20.00", Some("2024-02-03"), "Phone");
        phone.recurring = " yes ".to_string();
        let mut gym = expense("February", "£30.00", None, "Fitness");
        gym.recurring = "no".to_string();
        Expenses::new(vec![
            rent,
            expense("January", "£12.50", Some("2024-01-05"), "Groceries"),
            expense("January", "£7.50", Some("2024-01-05"), "UTILITIES"),
            phone,
            gym,
        ])
    }

    #[test]
    fn test_for_month() {
        let january = sample().for_month("January");
        assert_eq!(january.len(), 3);
        assert!(january.iter().all(|e| e.month() == "January"));
        assert!(sample().for_month("March").is_empty());
    }

    #[test]
    fn test_excluding_categories_ignores_case() {
        let kept = sample().excluding_categories(&["rent", "Utilities"]);
        let categories: Vec<&str> = kept.iter().map(|e| e.expense_category()).collect();
        assert_eq!(categories, vec!["Groceries", "Phone", "Fitness"]);
    }

    #[test]
    fn test_on_date_and_since() {
        let expenses = sample();
        assert_eq!(expenses.on_date(ymd("2024-01-05")).len(), 2);
        // The undated row is never included.
        assert_eq!(expenses.since(ymd("2024-01-02")).len(), 3);
        assert_eq!(expenses.since(ymd("2025-01-01")).len(), 0);
    }

    #[test]
    fn test_recurring() {
        let recurring = sample().recurring();
        let names: Vec<&str> = recurring.iter().map(|e| e.expense_category()).collect();
        assert_eq!(names, vec!["Rent", "Phone"]);
    }

    #[test]
    fn test_total_and_mean() {
        let expenses = sample();
        assert_eq!(expenses.total(), Decimal::from_str("1020.00").unwrap());
        assert_eq!(expenses.mean(), Some(Decimal::from_str("204").unwrap()));
        assert_eq!(Expenses::default().total(), Decimal::ZERO);
        assert_eq!(Expenses::default().mean(), None);
    }

    #[test]
    fn test_month_options() {
        let mut data = sample().data().to_vec();
        data.push(expense("Form Responses 1", "£1.00", None, "Other"));
        let expenses = Expenses::new(data);
        assert_eq!(
            expenses.month_options(&["form responses 1", "responses"]),
            vec!["February".to_string(), "January".to_string()]
        );
    }

    #[test]
    fn test_filters_do_not_modify_the_source() {
        let expenses = sample();
        let before = expenses.clone();
        let _ = expenses.for_month("January").recurring();
        assert_eq!(expenses, before);
    }
}
