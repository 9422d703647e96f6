use crate::common::errors::MachineResult;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Extra columns to add to the dataset
pub const INCLUDE: &str = "include";
/// Restrict the selection to plates with these names
pub const PLATES: &str = "plates";

/// Field names that steer selection and aggregation instead of filtering data
pub const RESERVED_FIELDS: [&str; 2] = [INCLUDE, PLATES];

static CRITERION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([^=]+?)\s*=\s*(.*?)\s*$").expect("criterion pattern is valid")
});

/// Search criteria: each field maps to the values it accepts.
///
/// A well matches a field when any accepted value equals the well's value for
/// it; fields combine with AND. Fields keep the order they were added in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    criteria: Vec<(String, Vec<String>)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Query::insert`]
    #[must_use]
    pub fn with<I, S>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(field, values);
        self
    }

    /// Set the accepted values of `field`, replacing earlier ones.
    pub fn insert<I, S>(&mut self, field: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let field = field.trim().to_string();
        let values: Vec<String> = values
            .into_iter()
            .map(|v| v.into().trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();

        match self.criteria.iter_mut().find(|(f, _)| *f == field) {
            Some((_, existing)) => *existing = values,
            None => self.criteria.push((field, values)),
        }
    }

    /// Parse the search-box syntax `media=LB,M9; temperature=37`.
    ///
    /// Criteria are separated by `;` or newlines and values by `,`; whitespace
    /// around names and values is dropped.
    pub fn parse(text: &str) -> MachineResult<Self> {
        let mut query = Query::new();

        for segment in text.split([';', '\n']) {
            if segment.trim().is_empty() {
                continue;
            }
            let captures = CRITERION.captures(segment).ok_or_else(|| {
                crate::invalid_input!(
                    "search",
                    format!("expected 'field=value', got '{}'", segment.trim())
                )
            })?;
            let field = &captures[1];
            let values: Vec<&str> = captures[2]
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .collect();
            if values.is_empty() {
                return Err(crate::invalid_input!(
                    "search",
                    format!("no values given for '{field}'")
                ));
            }
            query.insert(field, values);
        }

        Ok(query)
    }

    pub fn is_reserved(field: &str) -> bool {
        RESERVED_FIELDS.contains(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Data criteria, reserved directives excluded
    pub fn criteria(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.criteria
            .iter()
            .filter(|(field, _)| !Self::is_reserved(field))
            .map(|(field, values)| (field.as_str(), values.as_slice()))
    }

    /// Fields a presentation layer may colour or group by
    pub fn grouping_fields(&self) -> Vec<&str> {
        self.criteria().map(|(field, _)| field).collect()
    }

    pub fn values(&self, field: &str) -> Option<&[String]> {
        self.criteria
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, values)| values.as_slice())
    }

    pub fn include(&self) -> &[String] {
        self.values(INCLUDE).unwrap_or_default()
    }

    pub fn plates(&self) -> Option<&[String]> {
        self.values(PLATES)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .criteria
            .iter()
            .map(|(field, values)| format!("{field}={}", values.join(",")))
            .collect();
        write!(f, "{{{}}}", parts.join("; "))
    }
}
