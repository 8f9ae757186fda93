//! These structs provide the CLI interface for the expenses CLI.

use crate::metrics::RollingWindow;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;

/// expenses: a command-line dashboard for the expenses you track in a Google Sheet.
///
/// Each tab of the sheet holds one month of expenses with the columns Name, Amount Spent,
/// Expense Date, Billing Date, Expense Category and Recurring. This program reads every tab,
/// cleans up the amounts and dates, and reports totals by month, category and merchant along with
/// daily spend and its rolling average.
///
/// The sheet is read with a Google Cloud service account. Share the sheet with the service
/// account's email address and pass its key file to `expenses init`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory and the configuration file.
    ///
    /// This is the first command you should run. You need two things:
    ///
    /// - The URL (or ID) of your expenses Google Sheet, passed as --sheet-url or GOOGLE_SHEET_ID.
    ///
    /// - The JSON key of a Google Cloud service account that the sheet has been shared with,
    ///   passed as --service-account or SERVICE_ACCOUNT_JSON_PATH. It is copied into the home
    ///   directory.
    Init(InitArgs),
    /// Print the dashboard overview and emit every figure and series as JSON.
    Dashboard(DashboardArgs),
    /// List the month choices: "All" followed by the month tabs.
    Months(MonthsArgs),
    /// Emit the normalized expense rows as JSON.
    Rows(RowsArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where configuration and cached data are held. Defaults to ~/expenses
    #[arg(long, env = "EXPENSES_HOME", default_value_t = default_expenses_home())]
    home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, home: PathBuf) -> Self {
        Self {
            log_level,
            home: home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }
}

/// Args for the `expenses init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL to your Google sheet, or just its ID. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    #[arg(long, env = "GOOGLE_SHEET_ID")]
    sheet_url: String,

    /// The path to your service account key JSON. It is copied to the secrets directory in the
    /// home directory.
    #[arg(long, env = "SERVICE_ACCOUNT_JSON_PATH")]
    service_account: Option<PathBuf>,

    /// OAuth scopes to request, comma separated. Defaults to read-only Sheets access.
    #[arg(long, env = "SCOPE", value_delimiter = ',')]
    scope: Vec<String>,
}

impl InitArgs {
    pub fn new(
        sheet_url: impl Into<String>,
        service_account: Option<PathBuf>,
        scope: Vec<String>,
    ) -> Self {
        Self {
            sheet_url: sheet_url.into(),
            service_account,
            scope,
        }
    }

    pub fn sheet_url(&self) -> &str {
        &self.sheet_url
    }

    pub fn service_account(&self) -> Option<&Path> {
        self.service_account.as_deref()
    }

    /// The requested scopes with surrounding whitespace and empty entries removed.
    pub fn scopes(&self) -> Vec<String> {
        self.scope
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

/// Flags that control where the expense data comes from.
#[derive(Debug, Default, Parser, Clone)]
pub struct SourceArgs {
    /// Fetch from the sheet even if a recent snapshot is cached.
    #[arg(long)]
    refresh: bool,
}

impl SourceArgs {
    pub fn new(refresh: bool) -> Self {
        Self { refresh }
    }

    pub fn refresh(&self) -> bool {
        self.refresh
    }
}

/// Args for the `expenses dashboard` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct DashboardArgs {
    /// Only show this month (the tab title). All months are shown by default.
    #[arg(long)]
    month: Option<String>,

    /// Leave out the fixed-cost categories (rent and utilities by default).
    #[arg(long)]
    exclude_fixed: bool,

    /// How many merchants to list. Defaults to the configured value.
    #[arg(long)]
    top_n: Option<usize>,

    /// The rolling average window, e.g. 7D. Defaults to the configured value.
    #[arg(long)]
    window: Option<RollingWindow>,

    /// The date treated as today, YYYY-MM-DD. Defaults to the local date.
    #[arg(long)]
    today: Option<NaiveDate>,

    #[clap(flatten)]
    source: SourceArgs,
}

impl DashboardArgs {
    pub fn new(
        month: Option<String>,
        exclude_fixed: bool,
        top_n: Option<usize>,
        window: Option<RollingWindow>,
        today: Option<NaiveDate>,
        source: SourceArgs,
    ) -> Self {
        Self {
            month,
            exclude_fixed,
            top_n,
            window,
            today,
            source,
        }
    }

    pub fn month(&self) -> Option<&str> {
        self.month.as_deref()
    }

    pub fn exclude_fixed(&self) -> bool {
        self.exclude_fixed
    }

    pub fn top_n(&self) -> Option<usize> {
        self.top_n
    }

    pub fn window(&self) -> Option<RollingWindow> {
        self.window
    }

    pub fn today(&self) -> Option<NaiveDate> {
        self.today
    }

    pub fn source(&self) -> &SourceArgs {
        &self.source
    }
}

/// Args for the `expenses months` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct MonthsArgs {
    #[clap(flatten)]
    source: SourceArgs,
}

impl MonthsArgs {
    pub fn new(source: SourceArgs) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &SourceArgs {
        &self.source
    }
}

/// Args for the `expenses rows` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct RowsArgs {
    /// Only emit this month (the tab title).
    #[arg(long)]
    month: Option<String>,

    /// Leave out the fixed-cost categories.
    #[arg(long)]
    exclude_fixed: bool,

    /// Only emit recurring expenses.
    #[arg(long)]
    recurring: bool,

    #[clap(flatten)]
    source: SourceArgs,
}

impl RowsArgs {
    pub fn new(
        month: Option<String>,
        exclude_fixed: bool,
        recurring: bool,
        source: SourceArgs,
    ) -> Self {
        Self {
            month,
            exclude_fixed,
            recurring,
            source,
        }
    }

    pub fn month(&self) -> Option<&str> {
        self.month.as_deref()
    }

    pub fn exclude_fixed(&self) -> bool {
        self.exclude_fixed
    }

    pub fn recurring(&self) -> bool {
        self.recurring
    }

    pub fn source(&self) -> &SourceArgs {
        &self.source
    }
}

fn default_expenses_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("expenses"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or EXPENSES_HOME instead of relying on the default \
                home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("expenses")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
