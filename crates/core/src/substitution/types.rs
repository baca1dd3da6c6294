//! Substitution data types.

use serde::{Deserialize, Serialize};

/// Live availability of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    InStock,
    LowStock,
    OutOfStock,
}

impl Availability {
    /// Classify a stock quantity: 0 is out, up to `low_threshold` is low.
    pub fn from_quantity(quantity: u32, low_threshold: u32) -> Self {
        if quantity == 0 {
            Availability::OutOfStock
        } else if quantity <= low_threshold {
            Availability::LowStock
        } else {
            Availability::InStock
        }
    }

    /// Score bonus added after the base tier.
    pub fn bonus(&self) -> f32 {
        match self {
            Availability::InStock => 15.0,
            Availability::LowStock => 5.0,
            Availability::OutOfStock => 0.0,
        }
    }

    pub fn is_limited(&self) -> bool {
        !matches!(self, Availability::InStock)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::InStock => "in_stock",
            Availability::LowStock => "low_stock",
            Availability::OutOfStock => "out_of_stock",
        }
    }
}

/// Identifying fields of a medicine. Empty fields never match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineRef {
    pub id: String,
    #[serde(default)]
    pub generic_name: String,
    #[serde(default)]
    pub brand_name: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub strength: String,
    #[serde(default)]
    pub dosage_form: String,
    #[serde(default)]
    pub therapeutic_class: String,
}

/// How closely a candidate matches the reference before bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    SameGeneric,
    SameClass,
    SameStrength,
    SameForm,
    /// No tier matched; only the manufacturer is shared.
    ManufacturerOnly,
}

impl MatchTier {
    pub fn base_score(&self) -> f32 {
        match self {
            MatchTier::SameGeneric => 95.0,
            MatchTier::SameClass => 80.0,
            MatchTier::SameStrength => 70.0,
            MatchTier::SameForm => 60.0,
            MatchTier::ManufacturerOnly => 10.0,
        }
    }
}

/// A ranked, annotated substitute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstitutionCandidate {
    #[serde(flatten)]
    pub medicine: MedicineRef,
    pub availability: Availability,
    pub tier: MatchTier,
    /// Similarity in `[0, 100]`.
    pub score: f32,
    pub justification: Vec<String>,
    /// Advice for the pharmacist, e.g. on administration method.
    pub guidelines: Vec<String>,
    /// Cautions, e.g. on dosage adjustment.
    pub warnings: Vec<String>,
}

/// Ranked substitutes for one reference medicine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstitutionReport {
    pub reference_id: String,
    pub candidates: Vec<SubstitutionCandidate>,
    /// Set once when any returned candidate is low or out of stock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_warning: Option<String>,
}
