//! Weighted similarity scoring and ranking of substitute candidates.

use std::collections::HashMap;

use tracing::debug;

use super::types::{
    Availability, MatchTier, MedicineRef, SubstitutionCandidate, SubstitutionReport,
};
use crate::metrics::SUBSTITUTION_CANDIDATES;
use crate::provider::clamp_score;

/// Ranks candidates against a reference medicine.
///
/// Base score comes from the first matching tier (same generic 95, same
/// class 80, same strength 70, same form 60, else same manufacturer 10),
/// then the availability bonus is added and the total clamped to 100.
/// Equal scores keep input order.
#[derive(Debug, Clone)]
pub struct SimilarityScorer {
    max_results: usize,
}

impl SimilarityScorer {
    pub fn new(max_results: usize) -> Self {
        Self { max_results }
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Rank `candidates`. Candidates missing from `availability` count as
    /// out of stock. At most `max_results` are returned.
    pub fn rank(
        &self,
        reference: &MedicineRef,
        candidates: &[MedicineRef],
        availability: &HashMap<String, Availability>,
    ) -> SubstitutionReport {
        self.rank_limited(reference, candidates, availability, self.max_results)
    }

    /// As [`rank`](Self::rank) with an explicit cap.
    pub fn rank_limited(
        &self,
        reference: &MedicineRef,
        candidates: &[MedicineRef],
        availability: &HashMap<String, Availability>,
        max_results: usize,
    ) -> SubstitutionReport {
        let mut scored: Vec<SubstitutionCandidate> = candidates
            .iter()
            .filter(|c| c.id != reference.id)
            .filter_map(|c| {
                let stock = availability
                    .get(&c.id)
                    .copied()
                    .unwrap_or(Availability::OutOfStock);
                score_candidate(reference, c, stock)
            })
            .collect();

        // Stable: ties keep input order.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(max_results);

        let availability_warning = scored
            .iter()
            .any(|c| c.availability.is_limited())
            .then(|| {
                "Some substitutes are low or out of stock; confirm availability before dispensing."
                    .to_string()
            });

        SUBSTITUTION_CANDIDATES
            .with_label_values(&[])
            .observe(scored.len() as f64);
        debug!(
            reference = %reference.id,
            considered = candidates.len(),
            returned = scored.len(),
            "Ranked substitutes"
        );

        SubstitutionReport {
            reference_id: reference.id.clone(),
            candidates: scored,
            availability_warning,
        }
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn normalize_strength(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Case-insensitive, trimmed equality. Empty values never match.
fn same(a: &str, b: &str) -> bool {
    let (a, b) = (normalize(a), normalize(b));
    !a.is_empty() && a == b
}

fn same_strength(a: &str, b: &str) -> bool {
    let (a, b) = (normalize_strength(a), normalize_strength(b));
    !a.is_empty() && a == b
}

/// Both present and different.
fn differs(a: &str, b: &str, eq: fn(&str, &str) -> bool) -> bool {
    !a.trim().is_empty() && !b.trim().is_empty() && !eq(a, b)
}

fn match_tier(reference: &MedicineRef, candidate: &MedicineRef) -> Option<MatchTier> {
    if same(&reference.generic_name, &candidate.generic_name) {
        Some(MatchTier::SameGeneric)
    } else if same(&reference.therapeutic_class, &candidate.therapeutic_class) {
        Some(MatchTier::SameClass)
    } else if same_strength(&reference.strength, &candidate.strength) {
        Some(MatchTier::SameStrength)
    } else if same(&reference.dosage_form, &candidate.dosage_form) {
        Some(MatchTier::SameForm)
    } else if same(&reference.manufacturer, &candidate.manufacturer) {
        Some(MatchTier::ManufacturerOnly)
    } else {
        None
    }
}

/// Score one candidate. `None` when nothing at all matches.
pub fn score_candidate(
    reference: &MedicineRef,
    candidate: &MedicineRef,
    availability: Availability,
) -> Option<SubstitutionCandidate> {
    let tier = match_tier(reference, candidate)?;
    let score = clamp_score(tier.base_score() + availability.bonus());

    let reason = match tier {
        MatchTier::SameGeneric => format!(
            "Same active ingredient ({})",
            candidate.generic_name.trim()
        ),
        MatchTier::SameClass => format!(
            "Same therapeutic class ({})",
            candidate.therapeutic_class.trim()
        ),
        MatchTier::SameStrength => format!("Same strength ({})", candidate.strength.trim()),
        MatchTier::SameForm => format!("Same dosage form ({})", candidate.dosage_form.trim()),
        MatchTier::ManufacturerOnly => {
            format!("Same manufacturer ({})", candidate.manufacturer.trim())
        }
    };
    let stock_note = match availability {
        Availability::InStock => "In stock",
        Availability::LowStock => "Low stock",
        Availability::OutOfStock => "Out of stock",
    };

    let mut guidelines = Vec::new();
    if differs(&reference.dosage_form, &candidate.dosage_form, same) {
        guidelines.push(format!(
            "Different dosage form ({} instead of {}): explain the administration method to the patient.",
            candidate.dosage_form.trim(),
            reference.dosage_form.trim()
        ));
    }

    let mut warnings = Vec::new();
    if differs(&reference.strength, &candidate.strength, same_strength) {
        warnings.push(format!(
            "Different strength ({} instead of {}): the dose may need adjustment.",
            candidate.strength.trim(),
            reference.strength.trim()
        ));
    }

    Some(SubstitutionCandidate {
        medicine: candidate.clone(),
        availability,
        tier,
        score,
        justification: vec![reason, stock_note.to_string()],
        guidelines,
        warnings,
    })
}
