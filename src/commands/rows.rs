use crate::api::Mode;
use crate::args::RowsArgs;
use crate::commands::load::load_expenses;
use crate::commands::Out;
use crate::dashboard::Selection;
use crate::model::Expenses;
use crate::{Config, Result};

/// Emits the normalized rows, narrowed by the month, fixed-cost and recurring flags in `args`.
pub async fn rows(config: &Config, mode: Mode, args: &RowsArgs) -> Result<Out<Expenses>> {
    let all = load_expenses(config, mode, args.source().refresh()).await?;
    let selection = Selection {
        month: args.month().map(String::from),
        exclude_fixed: args.exclude_fixed(),
    };
    let mut selected = selection.apply(&all, &config.dashboard_settings().fixed_categories);
    if args.recurring() {
        selected = selected.recurring();
    }
    let message = format!("Selected {} of {} expenses", selected.len(), all.len());
    Ok(Out::new(message, selected))
}
