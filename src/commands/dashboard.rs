use crate::api::Mode;
use crate::args::DashboardArgs;
use crate::commands::load::load_expenses;
use crate::commands::Out;
use crate::dashboard::{Dashboard, Selection, ALL_MONTHS};
use crate::model::Amount;
use crate::{Config, Result};
use anyhow::Context;
use chrono::Local;
use rust_decimal::Decimal;
use tracing::debug;

/// Builds the dashboard for the month and fixed-cost choices in `args`.
///
/// The overview figures are written to the message and the whole dashboard is returned as the
/// structure.
pub async fn dashboard(
    config: &Config,
    mode: Mode,
    args: &DashboardArgs,
) -> Result<Out<Dashboard>> {
    let expenses = load_expenses(config, mode, args.source().refresh()).await?;

    let mut settings = config.dashboard_settings();
    if let Some(top_n) = args.top_n() {
        settings.top_n = top_n;
    }
    if let Some(window) = args.window() {
        settings.rolling_window = window;
    }
    let selection = Selection {
        month: args.month().map(String::from),
        exclude_fixed: args.exclude_fixed(),
    };
    let today = args.today().unwrap_or_else(|| Local::now().date_naive());
    debug!("Building the dashboard for {selection:?} as of {today}");

    let dashboard = Dashboard::build(&expenses, &selection, &settings, today)
        .context("Unable to build the dashboard")?;

    let symbol = config.normalize_options().currency_symbol;
    let money = |value: Decimal| Amount::with_symbol(value, symbol).to_string();
    let overview = &dashboard.overview;
    let message = format!(
        "{}: total spend {} across {} transactions (average {}), {} today, {} in the last 7 days",
        selection.month.as_deref().unwrap_or(ALL_MONTHS),
        money(overview.total_spend),
        overview.transactions,
        money(overview.average_spend),
        money(overview.spent_today),
        money(overview.last_7_days),
    );
    Ok(Out::new(message, dashboard))
}
