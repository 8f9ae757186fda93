use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::error::Error as StdError;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MappingError(String);

impl Display for MappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl StdError for MappingError {}

/// The header row of a worksheet along with the snake_case column name derived from each header.
/// Both `Amount Spent` and `amount_spent` map to the column `amount_spent`.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct Mapping {
    headers: Vec<Header>,
    columns: Vec<Column>,
}

impl Mapping {
    /// Create a new `Mapping` from a list of header strings. The column names will be created by
    /// converting header strings to snake_case.
    pub fn new<S, I>(headers: I) -> Result<Self, MappingError>
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let headers: Vec<Header> = headers.into_iter().map(|s| s.into().into()).collect();
        let columns = headers
            .iter()
            .map(|h| Column::new(to_snake_case(h)))
            .collect::<Result<Vec<Column>, MappingError>>()?;

        let mut seen_headers = HashSet::new();
        if let Some(dup) = headers.iter().find(|h| !seen_headers.insert(*h)) {
            return Err(MappingError(format!(
                "Encountered a duplicate header '{}'",
                dup.as_ref()
            )));
        }

        let mut seen_columns = HashSet::new();
        if let Some(dup) = columns.iter().find(|c| !seen_columns.insert(*c)) {
            return Err(MappingError(format!(
                "Encountered a duplicate column name '{}' \
                (two or more headers resulted in the same snake_case conversion)",
                dup.as_ref()
            )));
        }

        Ok(Self { headers, columns })
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}

/// Represents a header in the Google sheet, for example, `Amount Spent`
#[derive(Default, Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Header(String);

impl AsRef<str> for Header {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl<S: Into<String>> From<S> for Header {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

/// Represents a normalized column name, for example, `amount_spent`
#[derive(Default, Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Column(String);

impl AsRef<str> for Column {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Borrow<str> for Column {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for Column {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_column_name(s)?;
        Ok(Self(s.into()))
    }
}

impl Column {
    pub fn new(s: impl Into<String>) -> Result<Self, MappingError> {
        let s = s.into();
        validate_column_name(&s)?;
        Ok(Self(s))
    }
}

fn to_snake_case(s: impl AsRef<str>) -> String {
    let s = s.as_ref().trim();
    if s.is_empty() {
        return "no_name".to_string();
    }
    let lower = s
        .to_lowercase()
        .replace([' ', '-', '/'], "_")
        .replace('#', "number")
        .replace('£', "gbp");
    let alphanumeric: String = lower
        .chars()
        .filter(|&c| c.is_ascii_alphanumeric() || c == '_')
        .collect();
    match alphanumeric.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => alphanumeric,
        Some(_) => format!("x_{alphanumeric}"),
        None => "no_name".to_string(),
    }
}

fn validate_column_name(s: impl AsRef<str>) -> std::result::Result<(), MappingError> {
    let s = s.as_ref();
    let mut chars = s.chars();
    match chars.next() {
        None => {
            return Err(MappingError(String::from(
                "A column name must not be zero length",
            )))
        }
        Some(c) => {
            if !c.is_ascii_alphabetic() || !c.is_ascii_lowercase() {
                return Err(MappingError(format!(
                    "A column name must start with an ascii lowercase letter, \
                    but '{s}' starts with '{c}'"
                )));
            }
        }
    }

    if let Some(bad) = chars.find(|&c| !is_valid_column_name_char(c)) {
        return Err(MappingError(format!(
            "A column name must be lowercase ascii alphanumeric with underscores. \
            '{s}' has illegal char '{bad}'"
        )));
    }

    Ok(())
}

fn is_valid_column_name_char(c: char) -> bool {
    c == '_' || c.is_ascii_digit() || c.is_ascii_lowercase()
}
