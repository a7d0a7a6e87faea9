use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier assigned to a deployed unit by the execution
/// environment.
///
/// The engine never looks inside an address: it only needs equality and a
/// stable serialized form. Environment-specific formats (hex strings,
/// bech32, whatever) stay out of the core.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for Address {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Logical name of a deployable unit within a plan.
///
/// Names are the key space of the whole orchestration: descriptors are
/// declared under a name, references point at names, and the address table
/// maps names to deployed addresses.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UnitName(String);

impl UnitName {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitName {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for UnitName {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}
