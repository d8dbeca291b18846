//! Hex colour values for brand kits.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`HexColor`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    /// Missing leading `#`.
    #[error("colour must start with '#'")]
    MissingHash,
    /// Wrong number of digits.
    #[error("colour must have 3 or 6 hex digits")]
    InvalidLength,
    /// A non-hex digit was found.
    #[error("colour contains a non-hex digit")]
    InvalidDigit,
}

/// A CSS hex colour, normalized to lowercase `#rrggbb`.
///
/// ```
/// use adburst_core::HexColor;
///
/// assert_eq!(HexColor::parse("#F0a").unwrap().as_str(), "#ff00aa");
/// assert!(HexColor::parse("red").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    /// Parse a `#rgb` or `#rrggbb` colour.
    ///
    /// # Errors
    ///
    /// Returns a [`ColorError`] describing the first problem found.
    pub fn parse(s: &str) -> Result<Self, ColorError> {
        let digits = s.trim().strip_prefix('#').ok_or(ColorError::MissingHash)?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorError::InvalidDigit);
        }
        let expanded = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 => digits.to_string(),
            _ => return Err(ColorError::InvalidLength),
        };
        Ok(Self(format!("#{}", expanded.to_ascii_lowercase())))
    }

    /// The normalized `#rrggbb` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for HexColor {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for HexColor {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_and_long() {
        assert_eq!(HexColor::parse("#abc").unwrap().as_str(), "#aabbcc");
        assert_eq!(HexColor::parse(" #1A2B3C ").unwrap().as_str(), "#1a2b3c");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(HexColor::parse("abc"), Err(ColorError::MissingHash));
        assert_eq!(HexColor::parse("#abcd"), Err(ColorError::InvalidLength));
        assert_eq!(HexColor::parse("#ggg"), Err(ColorError::InvalidDigit));
        assert_eq!(HexColor::parse("#"), Err(ColorError::InvalidLength));
    }
}
