use serde::{Deserialize, Serialize};
use std::fmt;

/// Column headers of every output table, in file order.
pub const COLUMNS: [&str; 14] = [
    "Identifikátor",
    "Kraj",
    "ID kraja",
    "Okres",
    "ID Okresu",
    "Obec",
    "ID obce",
    "Časť obce",
    "Ulica",
    "Súpisné číslo",
    "Orientačné číslo celé",
    "PSČ",
    "ADRBOD_X",
    "ADRBOD_Y",
];

/// One flattened address point. Field order matches `COLUMNS`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRow {
    #[serde(rename = "Identifikátor")]
    pub identifier: String,
    #[serde(rename = "Kraj")]
    pub region_name: String,
    #[serde(rename = "ID kraja")]
    pub region_id: String,
    #[serde(rename = "Okres")]
    pub county_name: String,
    #[serde(rename = "ID Okresu")]
    pub county_id: String,
    #[serde(rename = "Obec")]
    pub municipality_name: String,
    #[serde(rename = "ID obce")]
    pub municipality_id: String,
    #[serde(rename = "Časť obce")]
    pub district_name: String,
    #[serde(rename = "Ulica")]
    pub street: String,
    #[serde(rename = "Súpisné číslo")]
    pub registration_number: String,
    #[serde(rename = "Orientačné číslo celé")]
    pub orientation_number: String,
    #[serde(rename = "PSČ")]
    pub postal_code: String,
    #[serde(rename = "ADRBOD_X")]
    pub x: String,
    #[serde(rename = "ADRBOD_Y")]
    pub y: String,
}

/// Non-fatal problems noticed while the job runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    FetchFailed {
        url: String,
        tries: u32,
        error: String,
    },
    EmptyFeatures {
        uri: String,
    },
    UnmappedRegion {
        name: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::FetchFailed { url, tries, error } => {
                write!(f, "[FAIL] {} after {} tries: {}", url, tries, error)
            }
            Diagnostic::EmptyFeatures { uri } => {
                write!(f, "Warning: features in {} is empty/does not exist!", uri)
            }
            Diagnostic::UnmappedRegion { name } => {
                write!(f, "Kraj value not in region mapping: {}", name)
            }
        }
    }
}

/// A stage result together with the warnings produced while computing it.
#[derive(Debug, Clone)]
pub struct Report<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Report<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            diagnostics: Vec::new(),
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Moves the warnings into `sink` and returns the value.
    pub fn drain_into(self, sink: &mut Vec<Diagnostic>) -> T {
        sink.extend(self.diagnostics);
        self.value
    }
}
