//! # Vitamin Catalog
//!
//! The list of supplements the wizard offers. Loaded from YAML when
//! `VITAMIN_CATALOG_PATH` is set, otherwise the built-in list is used.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::{anyhow, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Vitamin {
    pub id: String,
    pub name: String,
    pub default_dosage: String,
    #[serde(default)]
    pub guidance: Option<String>,
}

/// Root configuration containing all vitamins
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VitaminCatalog {
    pub vitamins: Vec<Vitamin>,
}

impl VitaminCatalog {
    /// Load a catalog from a YAML file
    pub fn load(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let catalog: VitaminCatalog = serde_yaml::from_str(yaml)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn builtin() -> Self {
        let entry = |id: &str, name: &str, dosage: &str, guidance: &str| Vitamin {
            id: id.to_string(),
            name: name.to_string(),
            default_dosage: dosage.to_string(),
            guidance: Some(guidance.to_string()),
        };

        VitaminCatalog {
            vitamins: vec![
                entry("vitamin-d3", "Vitamin D3", "1000 IU", "Take with a meal that contains fat"),
                entry("vitamin-b12", "Vitamin B12", "500 mcg", "Best taken in the morning"),
                entry("vitamin-c", "Vitamin C", "500 mg", "Can be split across the day"),
                entry("magnesium", "Magnesium", "200 mg", "Often taken in the evening"),
                entry("omega-3", "Omega-3", "1 softgel", "Take with food"),
                entry("iron", "Iron", "18 mg", "Avoid taking with coffee, tea or calcium"),
                entry("zinc", "Zinc", "15 mg", "Take with food to avoid nausea"),
                entry("multivitamin", "Multivitamin", "1 tablet", "Take with breakfast"),
            ],
        }
    }

    /// Validate all vitamins in the catalog
    pub fn validate(&self) -> Result<()> {
        if self.vitamins.is_empty() {
            return Err(anyhow!("Vitamin catalog is empty"));
        }

        let mut seen = HashSet::new();
        for vitamin in &self.vitamins {
            if vitamin.id.is_empty()
                || !vitamin
                    .id
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            {
                return Err(anyhow!(
                    "Vitamin id must be lowercase letters, digits and dashes: '{}'",
                    vitamin.id
                ));
            }
            if !seen.insert(vitamin.id.as_str()) {
                return Err(anyhow!("Duplicate vitamin id: {}", vitamin.id));
            }
            if vitamin.name.trim().is_empty() {
                return Err(anyhow!("Vitamin {} has no name", vitamin.id));
            }
            Dosage::parse(&vitamin.default_dosage).map_err(|e| {
                anyhow!("Invalid default dosage for {}: {e}", vitamin.id)
            })?;
        }

        Ok(())
    }

    /// Look up by id, or by name ignoring case
    pub fn get(&self, key: &str) -> Option<&Vitamin> {
        let key = key.trim();
        self.vitamins
            .iter()
            .find(|v| v.id == key)
            .or_else(|| self.vitamins.iter().find(|v| v.name.eq_ignore_ascii_case(key)))
    }

    pub fn len(&self) -> usize {
        self.vitamins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vitamins.is_empty()
    }
}

/// Amount plus unit, e.g. "1000 IU" or "2 capsules"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dosage {
    pub amount: f64,
    pub unit: String,
}

const DOSAGE_PATTERN: &str = r"(?i)^\s*(\d+(?:[.,]\d+)?)\s*(mg|mcg|µg|ug|g|iu|ml|drops?|capsules?|tablets?|softgels?|gumm(?:y|ies)|scoops?)\s*$";

fn dosage_pattern() -> Result<&'static Regex> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(DOSAGE_PATTERN))
        .as_ref()
        .map_err(|e| anyhow!("Invalid dosage pattern: {e}"))
}

impl Dosage {
    pub fn parse(text: &str) -> Result<Self> {
        let pattern = dosage_pattern()?;
        let caps = pattern
            .captures(text)
            .ok_or_else(|| anyhow!("Unrecognised dosage '{}' (try e.g. '500 mg' or '2 capsules')", text.trim()))?;

        let amount: f64 = caps[1].replace(',', ".").parse()?;
        if amount <= 0.0 {
            return Err(anyhow!("Dosage must be greater than zero"));
        }

        let unit = match caps[2].to_lowercase().as_str() {
            "µg" | "ug" | "mcg" => "mcg".to_string(),
            "iu" => "IU".to_string(),
            other => other.to_string(),
        };

        Ok(Dosage { amount, unit })
    }
}

impl fmt::Display for Dosage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.amount.fract() == 0.0 {
            write!(f, "{} {}", self.amount as u64, self.unit)
        } else {
            write!(f, "{} {}", self.amount, self.unit)
        }
    }
}
