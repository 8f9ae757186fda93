use crate::args::InitArgs;
use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory, its subdirectories and:
/// - Creates an initial `config.json` file using the sheet URL along with default settings
/// - Copies the service account key, if given, into its default location in the home directory.
///
/// # Arguments
/// - `home` - The directory that will be the home directory, e.g. `$HOME/expenses`
/// - `args` - The sheet URL (or ID), the service account key path and the OAuth scopes.
///
/// # Errors
/// - Returns an error if the sheet URL is unusable or any file operation fails.
pub async fn init(home: &Path, args: &InitArgs) -> Result<Out<()>> {
    let config = Config::create(
        home,
        args.sheet_url(),
        args.service_account(),
        args.scopes(),
    )
    .await
    .context("Unable to create the home directory and config")?;

    let mut message = format!(
        "Successfully created the expenses home at {}",
        config.root().display()
    );
    if args.service_account().is_none() && !config.service_account_path().is_file() {
        message.push_str(&format!(
            ". Copy your service account key to {} before reading the sheet",
            config.service_account_path().display()
        ));
    }
    Ok(message.into())
}
