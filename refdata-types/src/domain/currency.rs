//! Currency domain model.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::natural_key::{Entity, NaturalKey};

/// Base currency of the ECB reference rates.
pub const DEFAULT_BASE_CURRENCY: &str = "EUR";

/// A currency as published by the source, keyed by its ISO code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// ISO 4217 code, e.g. `USD`
    pub code: String,
    /// English name, e.g. `US dollar`
    pub name: String,
}

impl Currency {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    /// Checks required fields before the record is handed to persistence.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.code.trim().is_empty() {
            return Err(DomainError::Validation("Currency code is required".into()));
        }
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation(format!(
                "Currency name is required for {}",
                self.code
            )));
        }
        Ok(())
    }
}

impl NaturalKey for Currency {
    type Key = String;

    fn natural_key(&self) -> String {
        self.code.clone()
    }
}

impl Entity for Currency {
    const NAME: &'static str = "currencies";

    fn same_values(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
