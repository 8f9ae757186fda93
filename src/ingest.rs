//! Fetches every expense tab of the spreadsheet into one `RawTable`.

use crate::api::Sheet;
use crate::model::RawTable;
use crate::Result;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Tabs that are skipped unless configured otherwise, compared after trimming and lowercasing.
pub const DEFAULT_EXCLUDED_TABS: &[&str] = &["form responses", "responses"];

/// Reads every tab of `sheet` except those named in `excluded_tabs` and concatenates them.
///
/// Titles are compared with `excluded_tabs` after trimming and lowercasing both. Tabs without any
/// data rows are skipped. Each row is tagged with the title of its tab. A spreadsheet with no
/// usable tabs gives an empty table.
pub(crate) async fn load_sheets_data<S: AsRef<str>>(
    sheet: &mut dyn Sheet,
    excluded_tabs: &[S],
) -> Result<RawTable> {
    let skip: BTreeSet<String> = excluded_tabs
        .iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .collect();

    let mut tables = Vec::new();
    for title in sheet.worksheets().await? {
        if skip.contains(&title.trim().to_lowercase()) {
            debug!("Skipping excluded tab '{title}'");
            continue;
        }
        let data = sheet.get(&title).await?;
        let table = RawTable::from_worksheet(title.as_str(), data)?;
        if table.is_empty() {
            debug!("Skipping tab '{title}' because it has no data rows");
            continue;
        }
        debug!("Read {} rows from '{title}'", table.len());
        tables.push(table);
    }

    let raw = RawTable::concat(tables);
    info!("Loaded {} expense rows from the sheet", raw.len());
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestSheet;

    #[tokio::test]
    async fn test_default_exclusions() {
        let mut sheet = TestSheet::default();
        let raw = load_sheets_data(&mut sheet, DEFAULT_EXCLUDED_TABS)
            .await
            .unwrap();
        let worksheets: BTreeSet<&str> = raw.rows().iter().map(|r| r.worksheet()).collect();
        // "Form Responses 1" is not an exact match for an excluded name and "Notes" is empty.
        assert_eq!(
            worksheets,
            BTreeSet::from([
                "January 2024",
                "February 2024",
                "March 2024",
                "Form Responses 1"
            ])
        );
        // January has one fully blank row.
        assert_eq!(raw.len(), 7 + 6 + 4 + 1);
        assert!(raw.has_column("timestamp"));
        assert_eq!(raw.rows()[0].worksheet(), "January 2024");
    }

    #[tokio::test]
    async fn test_exclusions_ignore_case_and_whitespace() {
        let mut sheet = TestSheet::default();
        let raw = load_sheets_data(&mut sheet, &["  FORM RESPONSES 1 ", "january 2024"])
            .await
            .unwrap();
        assert!(raw
            .rows()
            .iter()
            .all(|r| r.worksheet() != "January 2024" && r.worksheet() != "Form Responses 1"));
        assert_eq!(raw.len(), 6 + 4);
    }

    #[tokio::test]
    async fn test_no_tabs() {
        let mut sheet = TestSheet::new(Vec::new());
        let raw = load_sheets_data(&mut sheet, DEFAULT_EXCLUDED_TABS)
            .await
            .unwrap();
        assert!(raw.is_empty());
    }

    #[tokio::test]
    async fn test_header_only_tab_is_skipped() {
        let mut sheet = TestSheet::from_csv(&[
            ("Headers", "Name,Amount Spent\n"),
            ("Data", "Name,Amount Spent\nTesco,£1.00\n"),
        ])
        .unwrap();
        let raw = load_sheets_data(&mut sheet, DEFAULT_EXCLUDED_TABS)
            .await
            .unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw.rows()[0].worksheet(), "Data");
    }

    #[tokio::test]
    async fn test_long_row_is_an_error() {
        let mut sheet =
            TestSheet::from_csv(&[("Bad", "Name,Amount Spent\nTesco,£1.00,extra\n")]).unwrap();
        let err = load_sheets_data(&mut sheet, DEFAULT_EXCLUDED_TABS)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("'Bad' at row 2"));
    }
}
