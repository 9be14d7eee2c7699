//! Email address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input string is empty (after trimming).
    #[error("Email is required")]
    Empty,
    /// The input string is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input is not shaped like `local@domain.tld`.
    #[error("Invalid email format")]
    InvalidFormat,
}

/// A contact email address.
///
/// Accepts anything shaped like `local@domain.tld`: exactly one `@`, no
/// whitespace, a non-empty local part, and a domain containing a dot with
/// text on both sides of it. Deliverability is the mail provider's problem.
///
/// ## Examples
///
/// ```
/// use samara_core::Email;
///
/// assert!(Email::parse("user@example.com").is_ok());
/// assert!(Email::parse("  user@example.ie ").is_ok()); // trimmed
///
/// assert!(Email::parse("").is_err());
/// assert!(Email::parse("user@localhost").is_err()); // no dot in domain
/// assert!(Email::parse("us er@example.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from a string, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError`] when the trimmed input is empty, too long, or
    /// not shaped like `local@domain.tld`.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if s.chars().any(char::is_whitespace) {
            return Err(EmailError::InvalidFormat);
        }

        let (local, domain) = s.split_once('@').ok_or(EmailError::InvalidFormat)?;
        if local.is_empty() || domain.contains('@') {
            return Err(EmailError::InvalidFormat);
        }

        // The domain needs some dot with text on both sides; "a.b.c" and
        // "mail.example.ie" are fine, "example." and ".ie" are not.
        let has_dotted_part = domain
            .char_indices()
            .filter(|&(_, c)| c == '.')
            .any(|(i, _)| i > 0 && i + 1 < domain.len());
        if !has_dotted_part {
            return Err(EmailError::InvalidFormat);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the domain part of the email (after the @).
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, d)| d)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_emails() {
        assert!(Email::parse("user@example.com").is_ok());
        assert!(Email::parse("user.name+tag@example.co.uk").is_ok());
        assert!(Email::parse("a@b.c").is_ok());
        assert!(Email::parse("orders@mail.samarashop.ie").is_ok());
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let email = Email::parse("  user@example.com\n").unwrap();
        assert_eq!(email.as_str(), "user@example.com");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            Email::parse(&long),
            Err(EmailError::TooLong { .. })
        ));
    }

    #[test]
    fn test_parse_invalid_format() {
        for bad in [
            "no-at-symbol",
            "@domain.com",
            "user@",
            "user@localhost",
            "user@domain.",
            "user@.com",
            "a@b@c.com",
            "us er@example.com",
        ] {
            assert_eq!(Email::parse(bad), Err(EmailError::InvalidFormat), "{bad}");
        }
    }

    #[test]
    fn test_domain() {
        let email = Email::parse("user@example.com").unwrap();
        assert_eq!(email.domain(), "example.com");
    }

    #[test]
    fn test_deserialize_validates() {
        let parsed: Email = serde_json::from_str("\"user@example.com\"").unwrap();
        assert_eq!(parsed.as_str(), "user@example.com");
        assert!(serde_json::from_str::<Email>("\"nope\"").is_err());
    }
}
