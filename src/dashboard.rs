//! Assembles everything the dashboard shows from the normalized table and the user's selection.

use crate::metrics::{
    category_totals, daily_with_rolling_avg, merchant_totals, monthly_totals, window_start,
    DailySpend, RollingWindow, Totals, DEFAULT_TOP_N,
};
use crate::model::{Expense, Expenses};
use crate::DataError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The month choice that selects every month.
pub const ALL_MONTHS: &str = "All";

/// The "last 7 days" figure covers today and the six days before it.
const RECENT_DAYS: u32 = 7;

/// What the user has picked in the dashboard's controls.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Selection {
    /// A worksheet label, or `None` (or `"All"`) for every month.
    pub month: Option<String>,
    /// Leave out the fixed-cost categories.
    pub exclude_fixed: bool,
}

impl Selection {
    fn month(&self) -> Option<&str> {
        self.month
            .as_deref()
            .filter(|m| !m.trim().is_empty() && !m.trim().eq_ignore_ascii_case(ALL_MONTHS))
    }

    /// Applies the selection to `all`.
    pub fn apply<S: AsRef<str>>(&self, all: &Expenses, fixed_categories: &[S]) -> Expenses {
        let by_month = match self.month() {
            Some(month) => all.for_month(month),
            None => all.clone(),
        };
        if self.exclude_fixed {
            by_month.excluding_categories(fixed_categories)
        } else {
            by_month
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DashboardSettings {
    /// Categories removed when the selection excludes fixed costs.
    pub fixed_categories: Vec<String>,
    pub top_n: usize,
    pub rolling_window: RollingWindow,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            fixed_categories: vec!["rent".to_string(), "utilities".to_string()],
            top_n: DEFAULT_TOP_N,
            rolling_window: RollingWindow::default(),
        }
    }
}

/// The headline figures.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Overview {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_spend: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub spent_today: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub last_7_days: Decimal,
    pub transactions: usize,
    /// Zero when there are no transactions.
    #[serde(with = "rust_decimal::serde::float")]
    pub average_spend: Decimal,
}

impl Overview {
    pub fn new(expenses: &Expenses, today: NaiveDate) -> Self {
        Self {
            total_spend: expenses.total(),
            spent_today: expenses.on_date(today).total(),
            last_7_days: expenses.since(window_start(today, RECENT_DAYS)).total(),
            transactions: expenses.len(),
            average_spend: expenses.mean().unwrap_or_default(),
        }
    }
}

/// One bar of the recurring expenses chart.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RecurringExpense {
    pub name: String,
    pub expense_category: String,
    pub expense_date: Option<NaiveDate>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount_spent: Decimal,
    pub fixed: String,
}

impl From<&Expense> for RecurringExpense {
    fn from(e: &Expense) -> Self {
        Self {
            name: e.name().to_string(),
            expense_category: e.expense_category().to_string(),
            expense_date: e.expense_date(),
            amount_spent: e.amount_spent().value(),
            fixed: e.fixed().to_string(),
        }
    }
}

/// Every figure and series on the dashboard for one selection.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Dashboard {
    pub selection: Selection,
    pub today: NaiveDate,
    pub overview: Overview,
    pub monthly_totals: Totals,
    pub category_totals: Totals,
    pub top_merchants: Totals,
    /// `None` when no selected row has an expense date.
    pub daily_spend: Option<DailySpend>,
    pub recurring: Vec<RecurringExpense>,
    #[serde(with = "rust_decimal::serde::float")]
    pub recurring_total: Decimal,
}

impl Dashboard {
    /// Builds the dashboard for `selection` over the full normalized table `all`.
    ///
    /// Every figure uses the selected rows except the monthly totals, which use all of `all` when
    /// no single month is selected.
    ///
    /// `today` anchors the "spent today" and "last 7 days" figures.
    pub fn build(
        all: &Expenses,
        selection: &Selection,
        settings: &DashboardSettings,
        today: NaiveDate,
    ) -> Result<Self, DataError> {
        let filtered = selection.apply(all, &settings.fixed_categories);

        let daily_spend = match daily_with_rolling_avg(&filtered, settings.rolling_window) {
            Ok(spend) => Some(spend),
            Err(DataError::InsufficientData) => None,
            Err(e) => return Err(e),
        };

        // With every month selected the monthly chart keeps the fixed costs.
        let monthly_source = match selection.month() {
            Some(_) => &filtered,
            None => all,
        };

        let recurring_rows = filtered.recurring();
        let mut recurring: Vec<RecurringExpense> =
            recurring_rows.iter().map(RecurringExpense::from).collect();
        recurring.sort_by(|a, b| b.amount_spent.cmp(&a.amount_spent));

        Ok(Self {
            selection: selection.clone(),
            today,
            overview: Overview::new(&filtered, today),
            monthly_totals: monthly_totals(monthly_source),
            category_totals: category_totals(&filtered),
            top_merchants: merchant_totals(&filtered, settings.top_n),
            daily_spend,
            recurring,
            recurring_total: recurring_rows.total(),
        })
    }
}

/// The choices offered by the month picker: `"All"` followed by the sorted worksheet labels.
pub fn month_choices<S: AsRef<str>>(all: &Expenses, excluded_tabs: &[S]) -> Vec<String> {
    std::iter::once(ALL_MONTHS.to_string())
        .chain(all.month_options(excluded_tabs))
        .collect()
}
