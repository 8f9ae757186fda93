//! Access to the spreadsheet that holds the expenses.
//!
//! The `Sheet` trait is the only seam between the app and Google Sheets. `GoogleSheet` talks to the
//! Sheets REST API and `TestSheet` serves canned data from memory.

mod google;
mod test_sheet;

use crate::{Config, Result};
use std::env;
use tracing::debug;

pub(crate) use google::GoogleSheet;
pub(crate) use test_sheet::TestSheet;

/// The environment variable that, when set to a non-empty value, swaps Google Sheets for the
/// in-memory `TestSheet`.
pub const TEST_MODE_ENV: &str = "EXPENSES_IN_TEST_MODE";

/// The read-only scope used when none is configured.
pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

/// Read access to a spreadsheet made of named tabs.
#[async_trait::async_trait]
pub(crate) trait Sheet: Send {
    /// The titles of every tab, in the order they appear in the spreadsheet.
    async fn worksheets(&mut self) -> Result<Vec<String>>;

    /// The cell grid of the tab titled `title`. The first row holds the headers. Trailing empty
    /// cells may be missing from a row.
    async fn get(&mut self, title: &str) -> Result<Vec<Vec<String>>>;
}

/// Which `Sheet` implementation to use.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    #[default]
    Google,
    Test,
}

impl Mode {
    /// `Mode::Test` if `EXPENSES_IN_TEST_MODE` is set to something non-empty, otherwise
    /// `Mode::Google`.
    pub fn from_env() -> Self {
        match env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Google,
        }
    }
}

/// Opens the configured spreadsheet.
pub(crate) async fn sheet(config: &Config, mode: Mode) -> Result<Box<dyn Sheet>> {
    debug!("Opening the expense sheet in {mode:?} mode");
    match mode {
        Mode::Google => Ok(Box::new(GoogleSheet::new(config).await?)),
        Mode::Test => Ok(Box::new(TestSheet::default())),
    }
}
