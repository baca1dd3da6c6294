//! Medicine substitution ranking.

mod scorer;
mod types;

pub use scorer::{score_candidate, SimilarityScorer};
pub use types::{
    Availability, MatchTier, MedicineRef, SubstitutionCandidate, SubstitutionReport,
};
