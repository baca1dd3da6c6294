//! Provider descriptors and arbitration result types.

use serde::{Deserialize, Serialize};

use super::ProviderError;

/// What a provider is able to do. Providers are looked up by this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    KnowledgeBase,
    GeneralCompletion,
    Ocr,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::KnowledgeBase => "knowledge-base",
            Capability::GeneralCompletion => "general-completion",
            Capability::Ocr => "ocr",
        }
    }
}

/// Static description of a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub name: String,
    pub capability: Capability,
    /// A result must score strictly above this to be authoritative.
    pub min_confidence: f32,
    /// An answer must be strictly longer than this (in characters).
    pub min_answer_chars: usize,
}

impl ProviderDescriptor {
    pub fn new(name: impl Into<String>, capability: Capability) -> Self {
        Self {
            name: name.into(),
            capability,
            min_confidence: 0.0,
            min_answer_chars: 0,
        }
    }

    pub fn with_thresholds(mut self, min_confidence: f32, min_answer_chars: usize) -> Self {
        self.min_confidence = clamp_score(min_confidence);
        self.min_answer_chars = min_answer_chars;
        self
    }

    /// Whether `answer` with `confidence` clears both thresholds.
    pub fn is_authoritative(&self, confidence: f32, answer: &str) -> bool {
        confidence > self.min_confidence && answer.chars().count() > self.min_answer_chars
    }
}

/// Clamp a score into `[0, 100]`. NaN counts as 0.
pub fn clamp_score(score: f32) -> f32 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 100.0)
}

/// One provider's successful output with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult<T> {
    pub payload: T,
    /// Confidence or similarity in `[0, 100]`.
    pub score: f32,
    pub provider: String,
}

impl<T> CandidateResult<T> {
    pub fn new(payload: T, score: f32, provider: impl Into<String>) -> Self {
        Self {
            payload,
            score: clamp_score(score),
            provider: provider.into(),
        }
    }
}

/// A provider that did not win arbitration, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub provider: String,
    /// Score of a successful but out-scored candidate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    /// Error of a failed candidate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of arbitration. Always carries either a winner or an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ArbitrationDecision<T> {
    pub outcome: Result<CandidateResult<T>, ProviderError>,
    pub rejected: Vec<Rejection>,
}

impl<T> ArbitrationDecision<T> {
    /// Pick the highest-scoring successful outcome.
    ///
    /// `outcomes` is in launch order; the sort is stable so equal scores keep
    /// that order.
    pub fn select(outcomes: Vec<(String, Result<CandidateResult<T>, ProviderError>)>) -> Self {
        let mut survivors = Vec::new();
        let mut rejected = Vec::new();

        for (provider, outcome) in outcomes {
            match outcome {
                Ok(candidate) => survivors.push(candidate),
                Err(e) => rejected.push(Rejection {
                    provider,
                    score: None,
                    error: Some(e.to_string()),
                }),
            }
        }

        survivors.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut survivors = survivors.into_iter();
        let outcome = match survivors.next() {
            Some(winner) => Ok(winner),
            None => Err(ProviderError::AllProvidersExhausted),
        };
        rejected.extend(survivors.map(|c| Rejection {
            provider: c.provider,
            score: Some(c.score),
            error: None,
        }));

        Self { outcome, rejected }
    }

    pub fn into_result(self) -> Result<CandidateResult<T>, ProviderError> {
        self.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(-5.0), 0.0);
        assert_eq!(clamp_score(150.0), 100.0);
        assert_eq!(clamp_score(42.5), 42.5);
        assert_eq!(clamp_score(f32::NAN), 0.0);
    }

    #[test]
    fn test_candidate_result_clamps() {
        let c = CandidateResult::new("x", 120.0, "p");
        assert_eq!(c.score, 100.0);
    }

    #[test]
    fn test_descriptor_thresholds_are_strict() {
        let kb = ProviderDescriptor::new("kb", Capability::KnowledgeBase).with_thresholds(60.0, 20);
        let long = "a".repeat(21);
        let exactly = "a".repeat(20);

        assert!(kb.is_authoritative(61.0, &long));
        assert!(!kb.is_authoritative(60.0, &long));
        assert!(!kb.is_authoritative(90.0, &exactly));
    }

    #[test]
    fn test_capability_serialization() {
        let json = serde_json::to_string(&Capability::GeneralCompletion).unwrap();
        assert_eq!(json, "\"general-completion\"");
        assert_eq!(Capability::KnowledgeBase.as_str(), "knowledge-base");
    }

    #[test]
    fn test_select_picks_highest_score() {
        let decision = ArbitrationDecision::select(vec![
            ("a".to_string(), Ok(CandidateResult::new("A", 40.0, "a"))),
            ("b".to_string(), Err(ProviderError::Transient("down".into()))),
            ("c".to_string(), Ok(CandidateResult::new("C", 85.0, "c"))),
        ]);

        let winner = decision.outcome.unwrap();
        assert_eq!(winner.provider, "c");
        assert_eq!(decision.rejected.len(), 2);
        assert!(decision
            .rejected
            .iter()
            .any(|r| r.provider == "b" && r.error.is_some()));
        assert!(decision
            .rejected
            .iter()
            .any(|r| r.provider == "a" && r.score == Some(40.0)));
    }

    #[test]
    fn test_select_ties_keep_launch_order() {
        let decision = ArbitrationDecision::select(vec![
            ("first".to_string(), Ok(CandidateResult::new(1, 70.0, "first"))),
            ("second".to_string(), Ok(CandidateResult::new(2, 70.0, "second"))),
        ]);
        assert_eq!(decision.outcome.unwrap().provider, "first");
    }

    #[test]
    fn test_select_all_failed_yields_error() {
        let decision: ArbitrationDecision<String> = ArbitrationDecision::select(vec![(
            "a".to_string(),
            Err(ProviderError::Transient("x".into())),
        )]);
        assert_eq!(decision.outcome, Err(ProviderError::AllProvidersExhausted));
        assert_eq!(decision.rejected.len(), 1);

        let empty: ArbitrationDecision<String> = ArbitrationDecision::select(vec![]);
        assert!(empty.outcome.is_err());
    }
}
