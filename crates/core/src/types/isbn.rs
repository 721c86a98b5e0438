//! ISBN catalog identifier.
//!
//! The ISBN is the primary key of a book, so two spellings of the same number
//! ("978-0-13-235088-4" and "9780132350884") must collapse to one value before
//! they reach storage.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Isbn`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IsbnError {
    /// The input is empty after removing separators.
    #[error("isbn cannot be empty")]
    Empty,
    /// The input has the wrong number of characters.
    #[error("isbn must have 10 or 13 characters (got {0})")]
    InvalidLength(usize),
    /// The input contains a character that cannot appear in an ISBN.
    #[error("isbn contains invalid character '{0}'")]
    InvalidCharacter(char),
}

/// A normalized ISBN-10 or ISBN-13.
///
/// Hyphens and spaces are stripped and a trailing `x` is upper-cased. The
/// check digit is not verified; catalogs routinely carry publisher-assigned
/// numbers with bad check digits and rejecting them helps nobody.
///
/// ```
/// use bookstore_core::Isbn;
///
/// let isbn = Isbn::parse("978-0-13-235088-4").unwrap();
/// assert_eq!(isbn.as_str(), "9780132350884");
///
/// assert!(Isbn::parse("0-306-40615-x").is_ok());
/// assert!(Isbn::parse("12345").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Isbn(String);

impl Isbn {
    /// Parse and normalize an ISBN.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, is not 10 or 13 characters
    /// long once separators are removed, or contains anything other than
    /// digits (plus a final `X` for ISBN-10).
    pub fn parse(s: &str) -> Result<Self, IsbnError> {
        let compact: String = s
            .chars()
            .filter(|c| *c != '-' && !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if compact.is_empty() {
            return Err(IsbnError::Empty);
        }

        let len = compact.chars().count();
        if len != 10 && len != 13 {
            return Err(IsbnError::InvalidLength(len));
        }

        for (i, c) in compact.chars().enumerate() {
            let check_x = c == 'X' && len == 10 && i == len - 1;
            if !c.is_ascii_digit() && !check_x {
                return Err(IsbnError::InvalidCharacter(c));
            }
        }

        Ok(Self(compact))
    }

    /// Returns the normalized ISBN.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Isbn {
    type Err = IsbnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Isbn {
    type Error = IsbnError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Isbn> for String {
    fn from(isbn: Isbn) -> Self {
        isbn.0
    }
}

impl AsRef<str> for Isbn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Isbn {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Isbn {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Isbn {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_separators() {
        let isbn = Isbn::parse(" 978 0-13-235088-4 ").unwrap();
        assert_eq!(isbn.as_str(), "9780132350884");
    }

    #[test]
    fn test_spellings_of_same_isbn_are_equal() {
        assert_eq!(
            Isbn::parse("0-306-40615-2").unwrap(),
            Isbn::parse("0306406152").unwrap()
        );
    }

    #[test]
    fn test_parse_isbn10_with_check_x() {
        assert_eq!(Isbn::parse("080442957x").unwrap().as_str(), "080442957X");
    }

    #[test]
    fn test_x_only_allowed_as_isbn10_check_digit() {
        assert_eq!(
            Isbn::parse("X804429575"),
            Err(IsbnError::InvalidCharacter('X'))
        );
        assert_eq!(
            Isbn::parse("978013235088X"),
            Err(IsbnError::InvalidCharacter('X'))
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(Isbn::parse(" - "), Err(IsbnError::Empty));
        assert_eq!(Isbn::parse("12345"), Err(IsbnError::InvalidLength(5)));
        assert_eq!(
            Isbn::parse("97801323508a4"),
            Err(IsbnError::InvalidCharacter('A'))
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Isbn = serde_json::from_str("\"978-0132350884\"").unwrap();
        assert_eq!(ok.as_str(), "9780132350884");
        assert!(serde_json::from_str::<Isbn>("\"not-an-isbn\"").is_err());
    }
}
