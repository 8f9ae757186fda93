//! Grouped sums and daily time series computed from an `Expenses` table.
//!
//! Every function here is a pure function of its arguments. Any subset of the normalized table
//! may be passed in, in any order, any number of times.

use crate::model::{Expense, Expenses};
use crate::DataError;
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The number of merchants kept by `merchant_totals` unless configured otherwise.
pub const DEFAULT_TOP_N: usize = 10;

/// The rolling window length, in calendar days, unless configured otherwise.
pub const DEFAULT_ROLLING_DAYS: u32 = 7;

/// Options for the metrics that take parameters.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MetricsOptions {
    pub top_n: usize,
    pub rolling_window: RollingWindow,
}

impl Default for MetricsOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            rolling_window: RollingWindow::default(),
        }
    }
}

/// Groups `rows` by `key` and folds the `value` of each row into its group with `reduce`.
///
/// Rows for which `key` returns `None` are left out. Groups are returned in key order.
pub fn group_reduce<'a, I, K, V, FK, FV, FR>(
    rows: I,
    key: FK,
    value: FV,
    reduce: FR,
) -> BTreeMap<K, V>
where
    I: IntoIterator<Item = &'a Expense>,
    K: Ord,
    FK: Fn(&Expense) -> Option<K>,
    FV: Fn(&Expense) -> V,
    FR: Fn(V, V) -> V,
{
    let mut groups: BTreeMap<K, V> = BTreeMap::new();
    for row in rows {
        let Some(k) = key(row) else {
            continue;
        };
        let v = value(row);
        let next = match groups.remove(&k) {
            Some(acc) => reduce(acc, v),
            None => v,
        };
        groups.insert(k, next);
    }
    groups
}

/// Sums `amount_spent` per key.
fn group_sum<K, FK>(expenses: &Expenses, key: FK) -> BTreeMap<K, Decimal>
where
    K: Ord,
    FK: Fn(&Expense) -> Option<K>,
{
    group_reduce(
        expenses,
        key,
        |e| e.amount_spent().value(),
        |a, b| a + b,
    )
}

/// One entry of an aggregate series.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Total {
    pub key: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// An aggregate series sorted by amount, largest first. Equal amounts are ordered by key.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Totals(Vec<Total>);

impl Totals {
    fn from_groups(groups: BTreeMap<String, Decimal>) -> Self {
        let mut totals: Vec<Total> = groups
            .into_iter()
            .map(|(key, amount)| Total { key, amount })
            .collect();
        // The map is already in key order and the sort is stable.
        totals.sort_by(|a, b| b.amount.cmp(&a.amount));
        Self(totals)
    }

    pub fn entries(&self) -> &[Total] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Total> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The amount for `key`, if present.
    pub fn get(&self, key: &str) -> Option<Decimal> {
        self.0.iter().find(|t| t.key == key).map(|t| t.amount)
    }

    /// The sum of every amount in the series.
    pub fn sum(&self) -> Decimal {
        self.0.iter().map(|t| t.amount).sum()
    }

    fn truncate(mut self, n: usize) -> Self {
        self.0.truncate(n);
        self
    }
}

/// Spend per month (worksheet), largest first.
pub fn monthly_totals(expenses: &Expenses) -> Totals {
    Totals::from_groups(group_sum(expenses, |e| Some(e.month().to_string())))
}

/// Spend per category, largest first.
pub fn category_totals(expenses: &Expenses) -> Totals {
    Totals::from_groups(group_sum(expenses, |e| Some(e.expense_category().to_string())))
}

/// Spend per merchant, largest first, keeping only the `top_n` largest.
pub fn merchant_totals(expenses: &Expenses, top_n: usize) -> Totals {
    Totals::from_groups(group_sum(expenses, |e| Some(e.name().to_string()))).truncate(top_n)
}

/// Spend keyed by calendar day.
pub type DailyTotals = BTreeMap<NaiveDate, Decimal>;

/// Spend per calendar day in ascending date order. Days without spend are absent and rows
/// without an expense date are left out.
pub fn daily_totals(expenses: &Expenses) -> DailyTotals {
    group_sum(expenses, Expense::expense_date)
}

/// A trailing window measured in calendar days, written like `7D`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RollingWindow(u32);

impl RollingWindow {
    pub fn new(days: u32) -> Result<Self, DataError> {
        if days == 0 {
            return Err(DataError::InvalidWindow(days.to_string()));
        }
        Ok(Self(days))
    }

    pub fn days(&self) -> u32 {
        self.0
    }
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self(DEFAULT_ROLLING_DAYS)
    }
}

impl Display for RollingWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}D", self.0)
    }
}

impl FromStr for RollingWindow {
    type Err = DataError;

    /// Accepts `7D`, `7d` or a bare `7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_suffix(['D', 'd'])
            .unwrap_or(trimmed)
            .trim();
        let days = digits
            .parse::<u32>()
            .map_err(|_| DataError::InvalidWindow(s.to_string()))?;
        if days == 0 {
            return Err(DataError::InvalidWindow(s.to_string()));
        }
        Ok(Self(days))
    }
}

impl TryFrom<String> for RollingWindow {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RollingWindow> for String {
    fn from(value: RollingWindow) -> Self {
        value.to_string()
    }
}

/// One day of the dense daily series.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DailyPoint {
    pub date: NaiveDate,
    /// Spend on this day, zero for days without any expense.
    #[serde(with = "rust_decimal::serde::float")]
    pub daily: Decimal,
    /// Mean daily spend over the window ending on this day.
    #[serde(with = "rust_decimal::serde::float")]
    pub rolling_avg: Decimal,
}

/// Daily spend with its trailing mean, one point per calendar day from the first to the last
/// expense date.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DailySpend {
    window: RollingWindow,
    points: Vec<DailyPoint>,
}

impl DailySpend {
    pub fn window(&self) -> RollingWindow {
        self.window
    }

    pub fn points(&self) -> &[DailyPoint] {
        &self.points
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DailyPoint> {
        self.points.iter().find(|p| p.date == date)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// The trailing sum of spend over the window ending on `date`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RollingPoint {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// Builds the gap-filled daily series and its trailing mean.
///
/// The window ending on day `d` covers the days after `d - window` up to and including `d`.
/// Filled-in days count as zero spend, so a single purchase is spread over the whole window.
/// Near the start of the series the mean is taken over the days seen so far.
///
/// Returns `DataError::InsufficientData` when no row has an expense date.
pub fn daily_with_rolling_avg(
    expenses: &Expenses,
    window: RollingWindow,
) -> Result<DailySpend, DataError> {
    let points = trailing(expenses, window)?
        .into_iter()
        .map(|t| DailyPoint {
            date: t.date,
            daily: t.daily,
            rolling_avg: t.sum / Decimal::from(t.days),
        })
        .collect();
    Ok(DailySpend { window, points })
}

/// The trailing sum of spend over `window`, one point per day of the gap-filled series.
///
/// Returns `DataError::InsufficientData` when no row has an expense date.
pub fn rolling_spend(
    expenses: &Expenses,
    window: RollingWindow,
) -> Result<Vec<RollingPoint>, DataError> {
    Ok(trailing(expenses, window)?
        .into_iter()
        .map(|t| RollingPoint {
            date: t.date,
            amount: t.sum,
        })
        .collect())
}

struct Trailing {
    date: NaiveDate,
    daily: Decimal,
    sum: Decimal,
    days: u32,
}

fn trailing(expenses: &Expenses, window: RollingWindow) -> Result<Vec<Trailing>, DataError> {
    let daily = daily_totals(expenses);
    let dense = fill_gaps(&daily)?;
    let size = window.days() as usize;

    let mut out = Vec::with_capacity(dense.len());
    let mut sum = Decimal::ZERO;
    for (ix, &(date, amount)) in dense.iter().enumerate() {
        sum += amount;
        if ix >= size {
            sum -= dense[ix - size].1;
        }
        out.push(Trailing {
            date,
            daily: amount,
            sum,
            days: (ix + 1).min(size) as u32,
        });
    }
    Ok(out)
}

/// Every day from the first to the last key of `daily`, with zero for missing days.
fn fill_gaps(daily: &DailyTotals) -> Result<Vec<(NaiveDate, Decimal)>, DataError> {
    let (Some((&first, _)), Some((&last, _))) = (daily.first_key_value(), daily.last_key_value())
    else {
        return Err(DataError::InsufficientData);
    };
    Ok(first
        .iter_days()
        .take_while(|d| *d <= last)
        .map(|d| (d, daily.get(&d).copied().unwrap_or_default()))
        .collect())
}

/// The date `days - 1` days before `today`, so that `[start, today]` spans `days` days.
pub fn window_start(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
        .unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DateOrder, RawTable};
    use crate::normalize::{normalize_expenses, NormalizeOptions};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn ymd(s: &str) -> NaiveDate {
        NaiveDate::from_str(s).unwrap()
    }

    /// Rows of (month, name, category, amount, expense date).
    fn expenses(rows: &[(&str, &str, &str, &str, &str)]) -> Expenses {
        let tables = rows.iter().map(|&(month, name, category, amount, date)| {
            RawTable::from_worksheet(
                month,
                vec![
                    vec![
                        "Name",
                        "Amount Spent",
                        "Expense Date",
                        "Billing Date",
                        "Expense Category",
                        "Recurring",
                    ],
                    vec![name, amount, date, "", category, "No"],
                ],
            )
            .unwrap()
        });
        let options = NormalizeOptions {
            date_order: DateOrder::DayFirst,
            ..NormalizeOptions::default()
        };
        normalize_expenses(&RawTable::concat(tables), &options).unwrap()
    }

    fn sample() -> Expenses {
        expenses(&[
            ("January", "Tesco", "Groceries", "£40.00", "2024-01-02"),
            ("January", "Landlord", "Rent", "£900.00", "2024-01-01"),
            ("January", "Tesco", "Groceries", "£12.34", "2024-01-09"),
            ("February", "Pret", "Eating Out", "£5.50", "2024-02-01"),
            ("February", "Landlord", "Rent", "£900.00", "2024-02-01"),
            ("February", "Amazon", "Shopping", "£1,000.00", ""),
        ])
    }

    #[test]
    fn test_monthly_totals() {
        let totals = monthly_totals(&sample());
        let keys: Vec<&str> = totals.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["February", "January"]);
        assert_eq!(totals.get("February"), Some(dec("1905.50")));
        assert_eq!(totals.get("January"), Some(dec("952.34")));
    }

    #[test]
    fn test_category_totals() {
        let totals = category_totals(&sample());
        let keys: Vec<&str> = totals.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["Rent", "Shopping", "Groceries", "Eating Out"]);
        assert_eq!(totals.get("Rent"), Some(dec("1800.00")));
    }

    #[test]
    fn test_sums_are_exact() {
        let expenses = sample();
        for totals in [
            monthly_totals(&expenses),
            category_totals(&expenses),
            merchant_totals(&expenses, usize::MAX),
        ] {
            assert_eq!(totals.sum(), expenses.total());
        }
    }

    #[test]
    fn test_aggregations_are_idempotent() {
        let expenses = sample();
        assert_eq!(monthly_totals(&expenses), monthly_totals(&expenses));
        assert_eq!(category_totals(&expenses), category_totals(&expenses));
        assert_eq!(
            merchant_totals(&expenses, 3),
            merchant_totals(&expenses, 3)
        );
    }

    #[test]
    fn test_merchant_totals_top_n() {
        let expenses = expenses(&[
            ("Jan", "A", "X", "10", "2024-01-01"),
            ("Jan", "B", "X", "50", "2024-01-01"),
            ("Jan", "C", "X", "20", "2024-01-01"),
            ("Jan", "D", "X", "40", "2024-01-01"),
            ("Jan", "E", "X", "30", "2024-01-01"),
            ("Jan", "A", "X", "5", "2024-01-02"),
        ]);
        let top = merchant_totals(&expenses, 3);
        assert_eq!(top.len(), 3);
        let keys: Vec<&str> = top.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["B", "D", "E"]);
        assert_eq!(merchant_totals(&expenses, 10).len(), 5);
    }

    #[test]
    fn test_ties_are_ordered_by_key() {
        let expenses = expenses(&[
            ("Jan", "Zed", "X", "10", "2024-01-01"),
            ("Jan", "Alf", "X", "10", "2024-01-01"),
            ("Jan", "Max", "X", "10", "2024-01-01"),
        ]);
        let keys: Vec<String> = merchant_totals(&expenses, 2)
            .iter()
            .map(|t| t.key.clone())
            .collect();
        assert_eq!(keys, vec!["Alf".to_string(), "Max".to_string()]);
    }

    #[test]
    fn test_daily_totals_skip_undated_rows() {
        let daily = daily_totals(&sample());
        let dates: Vec<NaiveDate> = daily.keys().copied().collect();
        assert_eq!(
            dates,
            vec![
                ymd("2024-01-01"),
                ymd("2024-01-02"),
                ymd("2024-01-09"),
                ymd("2024-02-01")
            ]
        );
        assert_eq!(daily[&ymd("2024-02-01")], dec("905.50"));
    }

    #[test]
    fn test_rolling_avg_counts_filled_days() {
        let expenses = expenses(&[
            ("Jan", "A", "X", "£70", "2024-01-01"),
            ("Jan", "B", "X", "£7", "2024-01-08"),
            ("Jan", "C", "X", "£0", "2024-01-10"),
        ]);
        let spend = daily_with_rolling_avg(&expenses, RollingWindow::default()).unwrap();
        assert_eq!(spend.len(), 10);
        assert_eq!(spend.points()[0].date, ymd("2024-01-01"));
        assert_eq!(spend.points()[9].date, ymd("2024-01-10"));
        let filled = spend
            .points()
            .iter()
            .filter(|p| p.daily.is_zero())
            .count();
        assert_eq!(filled, 8);

        let jan_8 = spend.get(ymd("2024-01-08")).unwrap();
        assert_eq!(jan_8.daily, dec("7"));
        assert_eq!(jan_8.rolling_avg, dec("1"));

        // The first day is averaged over itself only, the seventh over all seven days.
        assert_eq!(spend.points()[0].rolling_avg, dec("70"));
        assert_eq!(spend.points()[1].rolling_avg, dec("35"));
        assert_eq!(spend.points()[6].rolling_avg, dec("10"));
    }

    #[test]
    fn test_rolling_spend_is_a_trailing_sum() {
        let expenses = expenses(&[
            ("Jan", "A", "X", "£70", "2024-01-01"),
            ("Jan", "B", "X", "£7", "2024-01-08"),
        ]);
        let window = RollingWindow::new(3).unwrap();
        let spend = rolling_spend(&expenses, window).unwrap();
        let amounts: Vec<Decimal> = spend.iter().map(|p| p.amount).collect();
        let expected: Vec<Decimal> = ["70", "70", "70", "0", "0", "0", "0", "7"]
            .into_iter()
            .map(dec)
            .collect();
        assert_eq!(amounts, expected);
    }

    #[test]
    fn test_empty_input() {
        let empty = Expenses::default();
        assert!(monthly_totals(&empty).is_empty());
        assert!(category_totals(&empty).is_empty());
        assert!(merchant_totals(&empty, 10).is_empty());
        assert!(daily_totals(&empty).is_empty());
        assert_eq!(
            daily_with_rolling_avg(&empty, RollingWindow::default()).unwrap_err(),
            DataError::InsufficientData
        );
        assert_eq!(
            rolling_spend(&empty, RollingWindow::default()).unwrap_err(),
            DataError::InsufficientData
        );
    }

    #[test]
    fn test_only_undated_rows_is_insufficient() {
        let expenses = expenses(&[("Jan", "A", "X", "£1", "someday")]);
        assert_eq!(
            daily_with_rolling_avg(&expenses, RollingWindow::default()).unwrap_err(),
            DataError::InsufficientData
        );
    }

    #[test]
    fn test_single_day() {
        let expenses = expenses(&[("Jan", "A", "X", "£3", "2024-01-01")]);
        let spend = daily_with_rolling_avg(&expenses, RollingWindow::default()).unwrap();
        assert_eq!(spend.len(), 1);
        assert_eq!(spend.points()[0].rolling_avg, dec("3"));
    }

    #[test]
    fn test_rolling_window_parse() {
        assert_eq!("7D".parse::<RollingWindow>().unwrap().days(), 7);
        assert_eq!("14d".parse::<RollingWindow>().unwrap().days(), 14);
        assert_eq!(" 30 ".parse::<RollingWindow>().unwrap().days(), 30);
        assert_eq!(RollingWindow::default().to_string(), "7D");
        assert!("0D".parse::<RollingWindow>().is_err());
        assert!("week".parse::<RollingWindow>().is_err());
        assert!(RollingWindow::new(0).is_err());
    }

    #[test]
    fn test_rolling_window_serde() {
        let json = serde_json::to_string(&RollingWindow::new(5).unwrap()).unwrap();
        assert_eq!(json, "\"5D\"");
        let parsed: RollingWindow = serde_json::from_str("\"10D\"").unwrap();
        assert_eq!(parsed.days(), 10);
        assert!(serde_json::from_str::<RollingWindow>("\"-1D\"").is_err());
    }

    #[test]
    fn test_window_start() {
        assert_eq!(window_start(ymd("2024-03-07"), 7), ymd("2024-03-01"));
        assert_eq!(window_start(ymd("2024-03-07"), 1), ymd("2024-03-07"));
    }

    #[test]
    fn test_group_reduce_custom() {
        let expenses = sample();
        let counts = group_reduce(
            &expenses,
            |e| Some(e.month().to_string()),
            |_| 1usize,
            |a, b| a + b,
        );
        assert_eq!(counts["January"], 3);
        assert_eq!(counts["February"], 3);
    }
}
