// src/name.rs

//! Package name normalization
//!
//! Names are lowercase ASCII alphanumerics plus `@ . _ + -` and may not
//! start with `-` or `.`. Uppercase ASCII letters are lowercased on
//! ingestion; anything else is rejected.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A validated, normalized package name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageName(String);

impl PackageName {
    /// Validate and normalize a raw package name
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.to_ascii_lowercase();

        let valid = match normalized.chars().next() {
            None | Some('-') | Some('.') => false,
            Some(_) => normalized.chars().all(is_name_char),
        };

        if !valid {
            return Err(Error::InvalidName(raw.to_string()));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '@' | '.' | '_' | '+' | '-')
}

impl FromStr for PackageName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parse a list of names, failing on the first invalid one
pub fn parse_all<S: AsRef<str>>(raw: &[S]) -> Result<Vec<PackageName>> {
    raw.iter().map(|s| PackageName::parse(s.as_ref())).collect()
}
