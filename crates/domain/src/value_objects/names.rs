//! Validated identifier newtypes
//!
//! These newtypes ensure that identifiers are valid by construction:
//! - Non-empty
//! - Within length limits
//! - Trimmed of leading/trailing whitespace

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Maximum length for item type identifiers
const MAX_TYPE_ID_LENGTH: usize = 200;

// ============================================================================
// ItemTypeId
// ============================================================================

/// The type of an item (e.g. `"9mm"`, `"canteen"`), shared by every instance
/// of that type. Stack draws in `use_amount` match on this.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemTypeId(String);

impl ItemTypeId {
    /// Create a new validated item type id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if:
    /// - The id is empty after trimming
    /// - The id exceeds 200 characters after trimming
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Item type id cannot be empty"));
        }
        if trimmed.len() > MAX_TYPE_ID_LENGTH {
            return Err(DomainError::validation(format!(
                "Item type id cannot exceed {} characters",
                MAX_TYPE_ID_LENGTH
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ItemTypeId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ItemTypeId> for String {
    fn from(id: ItemTypeId) -> String {
        id.0
    }
}
