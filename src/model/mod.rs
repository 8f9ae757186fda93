//! Types that represent the data model: the raw sheet rows, the `Amount` type and the normalized
//! `Expenses` table.
mod amount;
mod date;
mod expense;
mod mapping;
mod raw;

pub use amount::{
    Amount, AmountError, DEFAULT_CURRENCY_SYMBOL, DEFAULT_THOUSANDS_SEPARATOR, MAX_AMOUNT_UNITS,
};
pub use date::{parse_date, DateOrder};
pub use expense::{Expense, Expenses};
pub(crate) use expense::{
    AMOUNT_SPENT_COL, BILLING_DATE_COL, EXPENSE_CATEGORY_COL, EXPENSE_DATE_COL, FIXED_COL,
    NAME_COL, RECURRING_COL, REQUIRED_COLUMNS,
};
pub use mapping::{Column, Header, Mapping, MappingError};
pub use raw::{RawRow, RawTable};
