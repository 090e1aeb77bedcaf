use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdError {
    #[error("{0} cannot be empty")]
    Empty(&'static str),
}

fn non_empty(kind: &'static str, raw: impl Into<String>) -> Result<String, IdError> {
    let raw = raw.into();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IdError::Empty(kind));
    }
    Ok(trimmed.to_owned())
}

/// Opaque identifier handed to us by the identity provider.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a `UserId` from the raw identity string.
    ///
    /// # Errors
    ///
    /// Returns `IdError::Empty` if the value is blank.
    pub fn new(raw: impl Into<String>) -> Result<Self, IdError> {
        non_empty("user id", raw).map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of a discipline (one curriculum document per discipline).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisciplineId(String);

impl DisciplineId {
    /// Creates a `DisciplineId`.
    ///
    /// # Errors
    ///
    /// Returns `IdError::Empty` if the value is blank.
    pub fn new(raw: impl Into<String>) -> Result<Self, IdError> {
        non_empty("discipline id", raw).map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Debug for DisciplineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DisciplineId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for DisciplineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Keys inside a progress record ─────────────────────────────────────────────

macro_rules! string_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_key!(
    /// Named content variant of a curriculum.
    RegionName
);
string_key!(
    /// Stage identifier. Numeric ids are kept in their decimal form.
    StageId
);
string_key!(
    /// Checklist task label, as written in the curriculum.
    TaskLabel
);

/// Region used when nothing more specific is known.
pub const DEFAULT_REGION: &str = "Global";

impl RegionName {
    #[must_use]
    pub fn global() -> Self {
        Self(DEFAULT_REGION.to_owned())
    }

    #[must_use]
    pub fn is_global(&self) -> bool {
        self.0 == DEFAULT_REGION
    }
}

impl Default for RegionName {
    fn default() -> Self {
        Self::global()
    }
}

impl From<u32> for StageId {
    fn from(value: u32) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_rejects_blank() {
        assert_eq!(UserId::new("   "), Err(IdError::Empty("user id")));
        assert_eq!(UserId::new(" u-1 ").unwrap().as_str(), "u-1");
    }

    #[test]
    fn numeric_stage_ids_use_decimal_form() {
        assert_eq!(StageId::from(12), StageId::new("12"));
    }

    #[test]
    fn keys_serialize_as_plain_strings() {
        let json = serde_json::to_string(&RegionName::global()).unwrap();
        assert_eq!(json, "\"Global\"");
    }
}
