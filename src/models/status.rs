use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Availability of an inventory item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemStatus {
    #[serde(rename = "In Stock")]
    InStock,
    #[serde(rename = "Issued")]
    Issued,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::InStock => "In Stock",
            ItemStatus::Issued => "Issued",
            ItemStatus::OutOfStock => "Out of Stock",
        }
    }

    pub fn is_available(self) -> bool {
        self == ItemStatus::InStock
    }

    /// Whether a direct edit may move an item from `self` to `next`.
    ///
    /// `Issued` is owned by the issuance workflow: an edit may neither enter
    /// nor leave it, otherwise item status and open logs drift apart.
    pub fn can_edit_to(self, next: ItemStatus) -> bool {
        self == next || (self != ItemStatus::Issued && next != ItemStatus::Issued)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "In Stock" => Ok(ItemStatus::InStock),
            "Issued" => Ok(ItemStatus::Issued),
            "Out of Stock" => Ok(ItemStatus::OutOfStock),
            other => Err(UnknownVariant {
                kind: "item status",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ItemStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// State of a single issuance log row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssuanceStatus {
    Issued,
    Returned,
}

impl IssuanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            IssuanceStatus::Issued => "Issued",
            IssuanceStatus::Returned => "Returned",
        }
    }
}

impl fmt::Display for IssuanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssuanceStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Issued" => Ok(IssuanceStatus::Issued),
            "Returned" => Ok(IssuanceStatus::Returned),
            other => Err(UnknownVariant {
                kind: "issuance status",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for IssuanceStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
