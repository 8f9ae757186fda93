//! Implements the `Sheet` trait against the Google Sheets REST API (v4).

use crate::api::Sheet;
use crate::{Config, Result};
use anyhow::{anyhow, bail, Context};
use serde::Deserialize;
use tracing::{debug, trace};
use url::Url;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Reads a spreadsheet with a service account's access token.
pub(crate) struct GoogleSheet {
    spreadsheet_id: String,
    token: String,
    client: reqwest::Client,
}

impl GoogleSheet {
    /// Authenticates with the configured service account key. Fails before making any request if
    /// the key file does not exist.
    pub(crate) async fn new(config: &Config) -> Result<Self> {
        let key_path = config.service_account_path();
        if !key_path.is_file() {
            bail!("Service account file not found: {}", key_path.display());
        }

        let key = yup_oauth2::read_service_account_key(&key_path)
            .await
            .with_context(|| {
                format!(
                    "Unable to read the service account key at {}",
                    key_path.display()
                )
            })?;
        let auth = yup_oauth2::ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .context("Unable to create the service account authenticator")?;
        let access_token = auth
            .token(config.scopes())
            .await
            .context("Unable to obtain an access token for the service account")?;
        let token = access_token
            .token()
            .context("The access token response did not contain a token")?
            .to_string();
        debug!("Obtained an access token for the service account");

        Ok(Self {
            spreadsheet_id: config.spreadsheet_id().to_string(),
            token,
            client: reqwest::Client::new(),
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(SHEETS_API).context("Bad Sheets API base URL")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("The Sheets API URL cannot have path segments"))?
            .push(&self.spreadsheet_id)
            .extend(segments);
        Ok(url)
    }

    async fn fetch<T: for<'de> Deserialize<'de>>(&self, url: Url, what: &str) -> Result<T> {
        trace!("GET {url}");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("Failed to send the request for {what}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            bail!("Google Sheets API request for {what} failed with status {status}: {body}");
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse the Google Sheets API response for {what}"))
    }
}

#[async_trait::async_trait]
impl Sheet for GoogleSheet {
    async fn worksheets(&mut self) -> Result<Vec<String>> {
        let mut url = self.url(&[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");
        let spreadsheet: Spreadsheet = self.fetch(url, "the list of worksheets").await?;
        Ok(spreadsheet
            .sheets
            .into_iter()
            .map(|s| s.properties.title)
            .collect())
    }

    async fn get(&mut self, title: &str) -> Result<Vec<Vec<String>>> {
        let range = a1_range(title);
        let mut url = self.url(&["values", &range])?;
        url.query_pairs_mut()
            .append_pair("majorDimension", "ROWS")
            .append_pair("valueRenderOption", "FORMATTED_VALUE")
            .append_pair("dateTimeRenderOption", "FORMATTED_STRING");
        let values: ValueRange = self
            .fetch(url, &format!("worksheet '{title}'"))
            .await?;
        Ok(values.values)
    }
}

/// Every column of the tab `title`, quoted the way A1 notation requires.
fn a1_range(title: &str) -> String {
    format!("'{}'!A:ZZ", title.replace('\'', "''"))
}

#[derive(Deserialize)]
struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    /// Absent when the tab is empty.
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a1_range() {
        assert_eq!(a1_range("January 2024"), "'January 2024'!A:ZZ");
        assert_eq!(a1_range("Bob's"), "'Bob''s'!A:ZZ");
    }

    #[test]
    fn test_parse_value_range() {
        let json = r#"{"range":"'January'!A1:C3","majorDimension":"ROWS","values":[["a","b"],["1"]]}"#;
        let values: ValueRange = serde_json::from_str(json).unwrap();
        assert_eq!(values.values.len(), 2);
        assert_eq!(values.values[1], vec!["1".to_string()]);

        let empty: ValueRange =
            serde_json::from_str(r#"{"range":"'Empty'!A1:ZZ1000","majorDimension":"ROWS"}"#)
                .unwrap();
        assert!(empty.values.is_empty());
    }

    #[test]
    fn test_parse_spreadsheet() {
        let json = r#"{"sheets":[{"properties":{"title":"January"}},{"properties":{"title":"Form Responses 1"}}]}"#;
        let spreadsheet: Spreadsheet = serde_json::from_str(json).unwrap();
        let titles: Vec<String> = spreadsheet
            .sheets
            .into_iter()
            .map(|s| s.properties.title)
            .collect();
        assert_eq!(titles, vec!["January", "Form Responses 1"]);
    }

    #[tokio::test]
    async fn test_missing_service_account_file() {
        let env = crate::test::TestEnv::new().await;
        let err = GoogleSheet::new(&env.config()).await.err().unwrap();
        assert!(err.to_string().contains("Service account file not found"));
    }
}
