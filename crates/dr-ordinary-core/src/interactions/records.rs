//! Interaction record models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Severity classification of an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Display label, as shown in the panel badge.
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Info => "Info",
        }
    }

    /// Lower-case tier used for styling classes.
    pub fn tier(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            "info" => Ok(Self::Info),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// What the record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Drug,
    Info,
}

impl InteractionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Drug => "drug",
            Self::Info => "info",
        }
    }
}

/// One interaction shown for a drug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    pub name: String,
    pub severity: Severity,
    pub description: String,
}

impl InteractionRecord {
    pub fn drug(name: &str, severity: Severity, description: &str) -> Self {
        Self {
            kind: InteractionKind::Drug,
            name: name.to_owned(),
            severity,
            description: description.to_owned(),
        }
    }

    /// The record returned for names the table does not know.
    pub fn not_found() -> Self {
        Self {
            kind: InteractionKind::Info,
            name: "Drug Information".to_owned(),
            severity: Severity::Low,
            description: "No specific drug interactions found in our database. \
                          Always consult with a healthcare provider about potential interactions."
                .to_owned(),
        }
    }
}
