//! Deterministic canned responses used when every provider failed.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::types::MetricsSnapshot;
use super::Locale;

/// Topic picked from the user message by keyword matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannedTopic {
    RateLimited,
    Greeting,
    Inventory,
    Sales,
    Medicine,
    Generic,
}

/// English greetings, whole words only ("they" is not "hey").
static GREETING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:hello|hi|hey|good morning|good evening)\b").unwrap());
const ARABIC_GREETING_WORDS: &[&str] = &["مرحبا", "السلام", "اهلا", "أهلا", "صباح"];
const INVENTORY_WORDS: &[&str] = &[
    "stock", "inventory", "out of", "reorder", "shortage", "مخزون", "المخزن", "نفد", "نواقص",
];
const SALES_WORDS: &[&str] = &[
    "sales", "revenue", "income", "profit", "sold", "مبيعات", "ايرادات", "إيرادات", "ارباح",
    "أرباح",
];
const MEDICINE_WORDS: &[&str] = &[
    "medicine", "medication", "drug", "dose", "dosage", "tablet", "pain", "fever", "side effect",
    "دواء", "جرعة", "علاج", "صداع", "ألم",
];

fn mentions(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

/// Pick the canned topic for `message`. `rate_limited` overrides keywords.
pub fn classify_topic(message: &str, rate_limited: bool) -> CannedTopic {
    if rate_limited {
        return CannedTopic::RateLimited;
    }
    let lowered = message.trim().to_lowercase();
    if mentions(&lowered, INVENTORY_WORDS) {
        CannedTopic::Inventory
    } else if mentions(&lowered, SALES_WORDS) {
        CannedTopic::Sales
    } else if mentions(&lowered, MEDICINE_WORDS) {
        CannedTopic::Medicine
    } else if GREETING.is_match(&lowered) || mentions(&lowered, ARABIC_GREETING_WORDS) {
        CannedTopic::Greeting
    } else {
        CannedTopic::Generic
    }
}

/// Render the canned response for `topic`.
pub fn canned_response(topic: CannedTopic, locale: Locale, metrics: &MetricsSnapshot) -> String {
    match (topic, locale) {
        (CannedTopic::RateLimited, Locale::En) => {
            "The assistant is receiving too many requests right now. Please wait a minute and try again.".to_string()
        }
        (CannedTopic::RateLimited, Locale::Ar) => {
            "المساعد يستقبل طلبات كثيرة حاليًا. يرجى الانتظار دقيقة ثم المحاولة مرة أخرى.".to_string()
        }
        (CannedTopic::Greeting, Locale::En) => {
            "Hello! I can help with inventory, sales and general medicine questions.".to_string()
        }
        (CannedTopic::Greeting, Locale::Ar) => {
            "أهلًا بك! يمكنني المساعدة في المخزون والمبيعات والأسئلة العامة عن الأدوية.".to_string()
        }
        (CannedTopic::Inventory, locale) => inventory_response(locale, metrics),
        (CannedTopic::Sales, locale) => sales_response(locale, metrics),
        (CannedTopic::Medicine, Locale::En) => {
            "I can't look that up right now. Please consult the pharmacist on duty before taking or changing any medication.".to_string()
        }
        (CannedTopic::Medicine, Locale::Ar) => {
            "لا يمكنني البحث عن ذلك الآن. يرجى استشارة الصيدلي المناوب قبل تناول أي دواء أو تغييره.".to_string()
        }
        (CannedTopic::Generic, Locale::En) => {
            "Sorry, the assistant is temporarily unavailable. Please try again shortly.".to_string()
        }
        (CannedTopic::Generic, Locale::Ar) => {
            "عذرًا، المساعد غير متاح مؤقتًا. يرجى المحاولة بعد قليل.".to_string()
        }
    }
}

fn inventory_response(locale: Locale, metrics: &MetricsSnapshot) -> String {
    match (locale, metrics.low_stock_count, metrics.out_of_stock_count) {
        (Locale::En, low, out) if low.is_some() || out.is_some() => format!(
            "Current stock summary: {} products low on stock, {} out of stock. Check the inventory screen for details.",
            low.unwrap_or(0),
            out.unwrap_or(0)
        ),
        (Locale::Ar, low, out) if low.is_some() || out.is_some() => format!(
            "ملخص المخزون الحالي: {} منتجات منخفضة المخزون و{} منتجات نفدت. راجع شاشة المخزون للتفاصيل.",
            low.unwrap_or(0),
            out.unwrap_or(0)
        ),
        (Locale::En, _, _) => {
            "Please check the inventory screen for current stock levels.".to_string()
        }
        (Locale::Ar, _, _) => "يرجى مراجعة شاشة المخزون لمعرفة مستويات المخزون الحالية.".to_string(),
    }
}

fn sales_response(locale: Locale, metrics: &MetricsSnapshot) -> String {
    let currency = metrics.currency.as_deref().unwrap_or("");
    let fmt = |v: f64| format!("{:.2} {}", v, currency).trim_end().to_string();
    match (locale, metrics.revenue_today, metrics.revenue_month) {
        (Locale::En, today, month) if today.is_some() || month.is_some() => {
            let mut parts = Vec::new();
            if let Some(v) = today {
                parts.push(format!("today {}", fmt(v)));
            }
            if let Some(v) = month {
                parts.push(format!("this month {}", fmt(v)));
            }
            format!("Revenue so far: {}.", parts.join(", "))
        }
        (Locale::Ar, today, month) if today.is_some() || month.is_some() => {
            let mut parts = Vec::new();
            if let Some(v) = today {
                parts.push(format!("اليوم {}", fmt(v)));
            }
            if let Some(v) = month {
                parts.push(format!("هذا الشهر {}", fmt(v)));
            }
            format!("الإيرادات حتى الآن: {}.", parts.join("، "))
        }
        (Locale::En, _, _) => "Please check the reports screen for sales figures.".to_string(),
        (Locale::Ar, _, _) => "يرجى مراجعة شاشة التقارير لمعرفة أرقام المبيعات.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_overrides_keywords() {
        assert_eq!(classify_topic("hello", true), CannedTopic::RateLimited);
        let text = canned_response(CannedTopic::RateLimited, Locale::En, &MetricsSnapshot::default());
        assert!(text.contains("Please wait"));
    }

    #[test]
    fn test_topic_detection() {
        assert_eq!(classify_topic("hi", false), CannedTopic::Greeting);
        assert_eq!(classify_topic("Hello there", false), CannedTopic::Greeting);
        assert_eq!(classify_topic("what is low on stock?", false), CannedTopic::Inventory);
        assert_eq!(classify_topic("How were sales today", false), CannedTopic::Sales);
        assert_eq!(classify_topic("dose of ibuprofen", false), CannedTopic::Medicine);
        assert_eq!(classify_topic("ما هي الجرعة", false), CannedTopic::Medicine);
        assert_eq!(classify_topic("مرحبا", false), CannedTopic::Greeting);
        assert_eq!(classify_topic("what's the weather", false), CannedTopic::Generic);
        assert_eq!(classify_topic("this is fine", false), CannedTopic::Generic);
    }

    #[test]
    fn test_greeting_needs_whole_word() {
        assert_eq!(classify_topic("they said it's broken", false), CannedTopic::Generic);
        assert_eq!(classify_topic("whey protein?", false), CannedTopic::Generic);
        assert_eq!(classify_topic("Hey!", false), CannedTopic::Greeting);
        assert_eq!(classify_topic("good morning team", false), CannedTopic::Greeting);
    }

    #[test]
    fn test_inventory_quotes_metrics() {
        let metrics = MetricsSnapshot {
            low_stock_count: Some(7),
            out_of_stock_count: Some(2),
            ..Default::default()
        };
        let text = canned_response(CannedTopic::Inventory, Locale::En, &metrics);
        assert!(text.contains("7 products low on stock, 2 out of stock"));

        let text = canned_response(CannedTopic::Inventory, Locale::En, &MetricsSnapshot::default());
        assert!(text.contains("inventory screen"));
    }

    #[test]
    fn test_sales_quotes_revenue() {
        let metrics = MetricsSnapshot {
            revenue_today: Some(250.0),
            currency: Some("EGP".to_string()),
            ..Default::default()
        };
        let text = canned_response(CannedTopic::Sales, Locale::En, &metrics);
        assert_eq!(text, "Revenue so far: today 250.00 EGP.");
    }

    #[test]
    fn test_arabic_responses() {
        let metrics = MetricsSnapshot::default();
        let text = canned_response(CannedTopic::Generic, Locale::Ar, &metrics);
        assert!(text.starts_with("عذرًا"));
        let text = canned_response(CannedTopic::RateLimited, Locale::Ar, &metrics);
        assert!(text.contains("الانتظار"));
    }
}
