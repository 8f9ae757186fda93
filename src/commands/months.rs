use crate::api::Mode;
use crate::args::MonthsArgs;
use crate::commands::load::load_expenses;
use crate::commands::Out;
use crate::dashboard::month_choices;
use crate::{Config, Result};

/// Lists the choices for the month picker: "All" followed by the month tabs, sorted.
pub async fn months(config: &Config, mode: Mode, args: &MonthsArgs) -> Result<Out<Vec<String>>> {
    let expenses = load_expenses(config, mode, args.source().refresh()).await?;
    let choices = month_choices(&expenses, config.month_picker_excluded_tabs());
    let message = format!("Found {} months", choices.len().saturating_sub(1));
    Ok(Out::new(message, choices))
}
