//! Configuration file handling.
//!
//! The configuration file is stored at `$EXPENSES_HOME/config.json` and contains the Google Sheet
//! URL, the service account key location and the dashboard defaults.

use crate::api::DEFAULT_SCOPE;
use crate::dashboard::DashboardSettings;
use crate::ingest::DEFAULT_EXCLUDED_TABS;
use crate::metrics::{MetricsOptions, RollingWindow, DEFAULT_TOP_N};
use crate::model::{DateOrder, DEFAULT_CURRENCY_SYMBOL, DEFAULT_THOUSANDS_SEPARATOR};
use crate::normalize::NormalizeOptions;
use crate::snapshot::DEFAULT_CACHE_TTL_SECS;
use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "expenses";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const CACHE: &str = ".cache";
const SERVICE_ACCOUNT_JSON: &str = "service_account.json";
const CONFIG_JSON: &str = "config.json";

/// Tabs that never appear in the month picker. These are compared ignoring case.
const MONTH_PICKER_EXCLUDED_TABS: &[&str] = &["form responses", "form responses 1", "responses"];

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$EXPENSES_HOME` and from there it loads `$EXPENSES_HOME/config.json`. It provides
/// paths to other items that are either configurable or are expected in a certain location within
/// the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    cache: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    spreadsheet_id: String,
}

impl Config {
    /// Creates the home directory, its subdirectories and:
    /// - Creates an initial `config.json` file using `sheet_url` along with default settings
    /// - Copies `service_account` into its default location in the home directory, if given.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the home directory, e.g. `$HOME/expenses`
    /// - `sheet_url` - The URL of the Google Sheet holding the expenses, or just its ID.
    /// - `service_account` - The service account key JSON downloaded from Google Cloud.
    /// - `scopes` - OAuth scopes to request. The read-only Sheets scope is used when empty.
    ///
    /// # Errors
    /// - Returns an error if the sheet URL is not usable or if any file operation fails.
    pub async fn create(
        dir: impl Into<PathBuf>,
        sheet_url: &str,
        service_account: Option<&Path>,
        scopes: Vec<String>,
    ) -> Result<Self> {
        let spreadsheet_id = extract_spreadsheet_id(sheet_url)
            .context("Failed to extract the spreadsheet ID from the sheet URL")?
            .to_string();

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the expenses home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;
        let cache = root.join(CACHE);
        utils::make_dir(&cache).await?;

        if let Some(source) = service_account {
            let destination = secrets.join(SERVICE_ACCOUNT_JSON);
            utils::copy(source, &destination).await?;
            debug!("Copied the service account key to {}", destination.display());
        }

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            sheet_url: sheet_url.to_string(),
            scopes: if scopes.is_empty() {
                default_scopes()
            } else {
                scopes
            },
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            secrets,
            cache,
            config_path,
            config_file,
            spreadsheet_id,
        })
    }

    /// This will
    /// - validate that the home directory and the config file exist
    /// - load the config file
    /// - validate that the secrets directory exists
    /// - return the loaded configuration object
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        if !maybe_relative.is_dir() {
            bail!(
                "The expenses home directory is missing '{}', run 'expenses init' first",
                maybe_relative.display()
            )
        }
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let spreadsheet_id = extract_spreadsheet_id(&config_file.sheet_url)
            .context("Failed to extract the spreadsheet ID from the sheet URL")?
            .to_string();

        let config = Self {
            secrets: root.join(SECRETS),
            cache: root.join(CACHE),
            root,
            config_path,
            config_file,
            spreadsheet_id,
        };
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    /// Where fetched sheet snapshots are kept. It is created on first use.
    pub fn cache_dir(&self) -> &Path {
        &self.cache
    }

    pub fn sheet_url(&self) -> &str {
        &self.config_file.sheet_url
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// Returns the stored `service_account_path` if it is absolute, otherwise resolves it against
    /// the home directory.
    pub fn service_account_path(&self) -> PathBuf {
        let p = self.config_file.service_account_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }

    pub fn scopes(&self) -> &[String] {
        &self.config_file.scopes
    }

    /// Tabs that are not loaded at all.
    pub fn excluded_tabs(&self) -> &[String] {
        &self.config_file.excluded_tabs
    }

    /// Tabs that are loaded but not offered as a month choice.
    pub fn month_picker_excluded_tabs(&self) -> &[String] {
        &self.config_file.month_picker_excluded_tabs
    }

    pub fn cache_ttl_secs(&self) -> u64 {
        self.config_file.cache_ttl_secs
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            currency_symbol: self.config_file.currency_symbol,
            thousands_separator: DEFAULT_THOUSANDS_SEPARATOR,
            date_order: self.config_file.date_order,
        }
    }

    pub fn metrics_options(&self) -> MetricsOptions {
        MetricsOptions {
            top_n: self.config_file.top_n,
            rolling_window: self.config_file.rolling_window,
        }
    }

    pub fn dashboard_settings(&self) -> DashboardSettings {
        let metrics = self.metrics_options();
        DashboardSettings {
            fixed_categories: self.config_file.fixed_categories.clone(),
            top_n: metrics.top_n,
            rolling_window: metrics.rolling_window,
        }
    }
}

/// Represents the serialization and deserialization format of the configuration file. Only
/// `app_name`, `config_version` and `sheet_url` are required.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "expenses",
///   "config_version": 1,
///   "sheet_url": "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL",
///   "service_account_path": ".secrets/service_account.json",
///   "scopes": ["https://www.googleapis.com/auth/spreadsheets.readonly"],
///   "excluded_tabs": ["form responses", "responses"],
///   "month_picker_excluded_tabs": ["form responses", "form responses 1", "responses"],
///   "fixed_categories": ["rent", "utilities"],
///   "top_n": 10,
///   "rolling_window": "7D",
///   "cache_ttl_secs": 600,
///   "currency_symbol": "£",
///   "date_order": "day_first"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "expenses"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// URL (or bare ID) of the Google Sheet holding the expenses
    sheet_url: String,

    /// Path to the service account key (optional, relative to the home directory or absolute).
    /// Defaults to $EXPENSES_HOME/.secrets/service_account.json if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    service_account_path: Option<PathBuf>,

    #[serde(default = "default_scopes")]
    scopes: Vec<String>,

    #[serde(default = "default_excluded_tabs")]
    excluded_tabs: Vec<String>,

    #[serde(default = "default_month_picker_excluded_tabs")]
    month_picker_excluded_tabs: Vec<String>,

    #[serde(default = "default_fixed_categories")]
    fixed_categories: Vec<String>,

    #[serde(default = "default_top_n")]
    top_n: usize,

    #[serde(default)]
    rolling_window: RollingWindow,

    #[serde(default = "default_cache_ttl_secs")]
    cache_ttl_secs: u64,

    #[serde(default = "default_currency_symbol")]
    currency_symbol: char,

    #[serde(default)]
    date_order: DateOrder,
}

fn default_scopes() -> Vec<String> {
    vec![DEFAULT_SCOPE.to_string()]
}

fn default_excluded_tabs() -> Vec<String> {
    DEFAULT_EXCLUDED_TABS.iter().map(|s| s.to_string()).collect()
}

fn default_month_picker_excluded_tabs() -> Vec<String> {
    MONTH_PICKER_EXCLUDED_TABS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_fixed_categories() -> Vec<String> {
    DashboardSettings::default().fixed_categories
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_currency_symbol() -> char {
    DEFAULT_CURRENCY_SYMBOL
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            sheet_url: String::new(),
            service_account_path: None,
            scopes: default_scopes(),
            excluded_tabs: default_excluded_tabs(),
            month_picker_excluded_tabs: default_month_picker_excluded_tabs(),
            fixed_categories: default_fixed_categories(),
            top_n: default_top_n(),
            rolling_window: RollingWindow::default(),
            cache_ttl_secs: default_cache_ttl_secs(),
            currency_symbol: default_currency_symbol(),
            date_order: DateOrder::default(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app.
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .context("Unable to load the config file")?;

        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        ensure!(
            config.top_n > 0,
            "Invalid top_n in config file: it must be at least 1"
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    /// Gets the service account key path.
    ///
    /// If the path is relative, it should be interpreted as relative to the home directory.
    fn service_account_path(&self) -> PathBuf {
        self.service_account_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(SERVICE_ACCOUNT_JSON))
    }
}

/// Extracts the spreadsheet ID from a Google Sheets URL, or accepts a bare ID.
///
/// # Arguments
/// * `url` - e.g. "https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/edit" or "SPREADSHEET_ID"
fn extract_spreadsheet_id(url: &str) -> Result<&str> {
    let url = url.trim();
    ensure!(!url.is_empty(), "The sheet URL is empty");

    if !url.contains('/') {
        ensure!(
            url.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "Invalid spreadsheet ID '{url}'"
        );
        return Ok(url);
    }

    // URL format: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...
    // or: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID?foo=bar
    let parts: Vec<&str> = url.split('/').collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "d" && i + 1 < parts.len() {
            let id_part = parts[i + 1];
            let id = id_part
                .split(['?', '#'])
                .next()
                .unwrap_or(id_part);
            ensure!(!id.is_empty(), "The sheet URL has no spreadsheet ID");
            return Ok(id);
        }
    }
    bail!(
        "Invalid Google Sheets URL format. Expected: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID"
    )
}
