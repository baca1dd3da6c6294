//! Keyword gate deciding whether the knowledge-base provider is eligible.

/// Built-in domain keywords: pharmacy nouns, common medicines, symptoms and
/// the service region, in English and Arabic.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    // Domain nouns
    "medicine",
    "medication",
    "drug",
    "pharmacy",
    "pharmacist",
    "prescription",
    "dose",
    "dosage",
    "tablet",
    "capsule",
    "syrup",
    "injection",
    "side effect",
    "interaction",
    "contraindication",
    "generic",
    "substitute",
    "alternative",
    // Common medicines
    "paracetamol",
    "panadol",
    "ibuprofen",
    "aspirin",
    "amoxicillin",
    "augmentin",
    "metformin",
    "insulin",
    "omeprazole",
    "antibiotic",
    "vitamin",
    // Symptoms and conditions
    "fever",
    "headache",
    "cough",
    "cold",
    "flu",
    "pain",
    "allergy",
    "diabetes",
    "blood pressure",
    "hypertension",
    "infection",
    // Region
    "egypt",
    // Arabic
    "دواء",
    "ادوية",
    "أدوية",
    "صيدلية",
    "روشتة",
    "وصفة",
    "جرعة",
    "مضاد حيوي",
    "صداع",
    "حمى",
    "سخونية",
    "كحة",
    "سعال",
    "ألم",
    "حساسية",
    "سكر",
    "ضغط",
    "مصر",
];

/// Coarse, case-insensitive substring classifier.
///
/// A positive match only makes the knowledge-base provider eligible to be
/// tried first; its answer is still subject to confidence thresholds.
#[derive(Debug, Clone)]
pub struct ProviderClassifier {
    keywords: Vec<String>,
}

impl Default for ProviderClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS.iter().map(|k| k.to_string()))
    }
}

impl ProviderClassifier {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.into().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Whether `text` mentions any domain keyword.
    pub fn is_domain_specific(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fever_and_headache_are_domain_specific() {
        let classifier = ProviderClassifier::new(["fever", "cough"]);
        assert!(classifier.is_domain_specific("I have a fever and a headache"));
    }

    #[test]
    fn test_case_insensitive() {
        let classifier = ProviderClassifier::default();
        assert!(classifier.is_domain_specific("Is PARACETAMOL safe?"));
        assert!(classifier.is_domain_specific("BLOOD PRESSURE pills"));
    }

    #[test]
    fn test_arabic_keywords() {
        let classifier = ProviderClassifier::default();
        assert!(classifier.is_domain_specific("عندي صداع شديد"));
    }

    #[test]
    fn test_non_domain_text() {
        let classifier = ProviderClassifier::default();
        assert!(!classifier.is_domain_specific("How were sales this week?"));
        assert!(!classifier.is_domain_specific(""));
    }

    #[test]
    fn test_keywords_are_normalized() {
        let classifier = ProviderClassifier::new(["  Fever ", "", "COUGH"]);
        assert_eq!(classifier.keywords(), &["fever".to_string(), "cough".to_string()]);
    }
}
