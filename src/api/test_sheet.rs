//! Implements the `Sheet` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using Google Sheets.

use crate::api::Sheet;
use crate::Result;
use anyhow::Context;
use std::io::Cursor;
use tracing::warn;

/// An implementation of the `Sheet` trait that does not use Google sheets. Tabs keep the order in
/// which they were added. By default it is seeded with a few months of expenses.
pub(crate) struct TestSheet {
    tabs: Vec<(String, Vec<Vec<String>>)>,
}

impl TestSheet {
    /// Create a new `TestSheet` from `(title, rows)` pairs.
    pub(crate) fn new(tabs: Vec<(String, Vec<Vec<String>>)>) -> Self {
        Self { tabs }
    }

    /// Create a new `TestSheet` from `(title, csv)` pairs.
    pub(crate) fn from_csv(tabs: &[(&str, &str)]) -> Result<Self> {
        let tabs = tabs
            .iter()
            .map(|(title, csv)| {
                load_csv(csv)
                    .with_context(|| format!("Bad CSV for tab '{title}'"))
                    .map(|rows| (title.to_string(), rows))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(tabs))
    }
}

#[async_trait::async_trait]
impl Sheet for TestSheet {
    async fn worksheets(&mut self) -> Result<Vec<String>> {
        Ok(self.tabs.iter().map(|(title, _)| title.clone()).collect())
    }

    async fn get(&mut self, title: &str) -> Result<Vec<Vec<String>>> {
        self.tabs
            .iter()
            .find(|(t, _)| t == title)
            .map(|(_, rows)| rows.clone())
            .with_context(|| format!("Sheet '{title}' not found"))
    }
}

impl Default for TestSheet {
    /// Loads seed data from this module.
    fn default() -> Self {
        match Self::from_csv(SEED_TABS) {
            Ok(sheet) => sheet,
            Err(e) => {
                warn!("Unable to load the seed data, the test sheet will be empty: {e:#}");
                Self::new(Vec::new())
            }
        }
    }
}

/// Loads data from a CSV-formatted string.
fn load_csv(csv_data: &str) -> Result<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

const SEED_TABS: &[(&str, &str)] = &[
    ("January 2024", JANUARY_DATA),
    ("February 2024", FEBRUARY_DATA),
    ("March 2024", MARCH_DATA),
    ("Form Responses 1", FORM_RESPONSES_DATA),
    ("Notes", ""),
];

/// Seed data for January. Trailing empty cells are left off some rows, the way the Sheets API
/// returns them.
const JANUARY_DATA: &str = r##"Name,Amount Spent,Expense Date,Billing Date,Expense Category,Recurring,Fixed
Landlord,"£1,150.00",01/01/2024,01/01/2024,Rent,Yes,Yes
Tesco,£54.32,02/01/2024,,Groceries,No,No
Netflix,£10.99,05/01/2024,05/01/2024,Subscriptions,Yes,No
Pret A Manger,£6.45,08/01/2024,,Eating Out,No
Octopus Energy,£92.10,10/01/2024,10/01/2024,Utilities,Yes,Yes
Tesco,£38.70,16/01/2024,,Groceries,No,No
,,,,,,
Trainline,£42.00,23/01/2024,,Travel,No,No
"##;

const FEBRUARY_DATA: &str = r##"Name,Amount Spent,Expense Date,Billing Date,Expense Category,Recurring,Fixed
Landlord,"£1,150.00",01/02/2024,01/02/2024,Rent,Yes,Yes
Netflix,£10.99,05/02/2024,05/02/2024,Subscriptions,yes,No
Sainsbury's,£61.05,06/02/2024,,Groceries,No,No
Octopus Energy,£88.40,10/02/2024,10/02/2024,Utilities,Yes,Yes
Dishoom,£48.50,14/02/2024,,Eating Out,No,No
Tesco,£29.95,20/02/2024,,Groceries,no,no
"##;

const MARCH_DATA: &str = r##"Name,Amount Spent,Expense Date,Billing Date,Expense Category,Recurring,Fixed
Landlord,"£1,150.00",01/03/2024,01/03/2024,Rent,Yes,Yes
Netflix,£10.99,05/03/2024,05/03/2024,Subscriptions,Yes,No
Boots,£12.49,07/03/2024,,Health,No,No
Tesco,£47.80,TBC,,Groceries,No,No
"##;

/// Entries submitted through the expense form, already copied into the month tabs.
const FORM_RESPONSES_DATA: &str = r##"Timestamp,Name,Amount Spent,Expense Date,Billing Date,Expense Category,Recurring
07/03/2024 09:12:44,Boots,£12.49,07/03/2024,,Health,No
"##;
