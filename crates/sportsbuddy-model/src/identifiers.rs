use crate::validation::ValidationError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident, $doc:expr, $prefix:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an existing id without validation (ids are opaque to the model).
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Generates a fresh, collision-resistant id.
            pub fn generate() -> Self {
                Self(format!("{}{}", $prefix, Uuid::new_v4().simple()))
            }

            /// Returns the id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(
    IdentityId,
    "Stable identifier of a registered identity (`u_<hex>` when generated locally).",
    "u_"
);
id_newtype!(
    EventId,
    "Identifier of an event record, assigned by the store at creation (`e_<hex>` locally).",
    "e_"
);

/// Email address used as the login name of an identity.
///
/// Stored trimmed; comparisons for uniqueness are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Parses a trimmed email address of the shape `local@domain.tld`.
    pub fn parse(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let s = value.as_ref().trim();
        if s.is_empty() {
            return Err(ValidationError::Blank { field: "email" });
        }
        let re = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid regex");
        if !re.is_match(s) {
            return Err(ValidationError::PatternMismatch {
                field: "email",
                value: s.to_string(),
            });
        }
        Ok(Self(s.to_string()))
    }

    /// Case-insensitive equality against a raw address.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }

    /// Case-insensitive suffix test (e.g. `@admin.com`).
    pub fn has_suffix(&self, suffix: &str) -> bool {
        self.0
            .to_ascii_lowercase()
            .ends_with(&suffix.trim().to_ascii_lowercase())
    }

    /// Returns the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_prefixed_and_distinct() {
        let a = EventId::generate();
        let b = EventId::generate();
        assert!(a.as_str().starts_with("e_"));
        assert!(IdentityId::generate().as_str().starts_with("u_"));
        assert_ne!(a, b);
    }

    #[test]
    fn email_is_trimmed() {
        let email = Email::parse("  ada@example.com ").unwrap();
        assert_eq!(email.as_str(), "ada@example.com");
        assert!(email.matches("ADA@example.com"));
    }

    #[test]
    fn email_rejects_malformed() {
        assert!(matches!(
            Email::parse("   "),
            Err(ValidationError::Blank { .. })
        ));
        assert!(Email::parse("no-at-sign").is_err());
        assert!(Email::parse("a@b").is_err());
    }

    #[test]
    fn email_suffix_is_case_insensitive() {
        let email = Email::parse("Root@Admin.com").unwrap();
        assert!(email.has_suffix("@admin.com"));
        assert!(!email.has_suffix("@example.com"));
    }
}
