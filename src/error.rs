pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the normalizer and the metrics engine. These are returned to the caller as-is;
/// nothing in the data pipeline recovers from them.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// An `amount_spent` cell could not be read as a number after removing the currency symbol
    /// and thousands separators.
    #[error("Invalid amount '{value}' in worksheet '{worksheet}' at row {row}")]
    InvalidAmount {
        worksheet: String,
        row: usize,
        value: String,
    },

    /// A worksheet does not have a column that the expense record requires.
    #[error("Worksheet '{worksheet}' is missing the required column '{column}'")]
    MissingColumn { worksheet: String, column: String },

    /// There are no dated rows, so no calendar range can be built.
    #[error("Insufficient data: there are no rows with a valid expense date")]
    InsufficientData,

    /// A rolling window that is not a positive number of days.
    #[error("Invalid rolling window '{0}', expected a positive number of days such as '7D'")]
    InvalidWindow(String),
}
