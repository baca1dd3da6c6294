//! Locale-specific system prompts enriched with business metrics.

use chrono::NaiveDate;

use super::types::{ChatTurn, MetricsSnapshot, RequestContext};
use super::Locale;

const SYSTEM_PROMPT_EN: &str = "You are the assistant of a community pharmacy. \
Answer clearly and briefly. For medical questions give general guidance only and \
recommend consulting the pharmacist or a physician for a diagnosis. When asked \
about the business, rely on the figures below and never invent numbers.";

const SYSTEM_PROMPT_AR: &str = "أنت مساعد صيدلية. أجب بوضوح وإيجاز باللغة العربية. \
في الأسئلة الطبية قدّم إرشادات عامة فقط وانصح بمراجعة الصيدلي أو الطبيب للتشخيص. \
عند السؤال عن أداء الصيدلية اعتمد على الأرقام التالية ولا تخترع أرقامًا.";

fn labels(locale: Locale) -> [&'static str; 9] {
    match locale {
        Locale::En => [
            "Today's date",
            "Revenue today",
            "Revenue this month",
            "Products in catalog",
            "Low-stock products",
            "Out-of-stock products",
            "Customers",
            "Pending prescriptions",
            "Business snapshot",
        ],
        Locale::Ar => [
            "تاريخ اليوم",
            "إيرادات اليوم",
            "إيرادات هذا الشهر",
            "عدد المنتجات",
            "منتجات منخفضة المخزون",
            "منتجات نفدت من المخزون",
            "العملاء",
            "وصفات قيد الانتظار",
            "ملخص الصيدلية",
        ],
    }
}

fn money(value: f64, currency: Option<&str>) -> String {
    match currency {
        Some(c) => format!("{:.2} {}", value, c),
        None => format!("{:.2}", value),
    }
}

/// Build the system prompt for `locale`, embedding `metrics` verbatim.
pub fn build_system_prompt(locale: Locale, metrics: &MetricsSnapshot, today: NaiveDate) -> String {
    let [date, rev_today, rev_month, products, low, out, customers, pending, heading] =
        labels(locale);
    let base = match locale {
        Locale::En => SYSTEM_PROMPT_EN,
        Locale::Ar => SYSTEM_PROMPT_AR,
    };

    let mut prompt = format!("{}\n\n{}: {}", base, date, today.format("%Y-%m-%d"));
    if metrics.is_empty() {
        return prompt;
    }

    let currency = metrics.currency.as_deref();
    let mut lines = Vec::new();
    if let Some(v) = metrics.revenue_today {
        lines.push(format!("- {}: {}", rev_today, money(v, currency)));
    }
    if let Some(v) = metrics.revenue_month {
        lines.push(format!("- {}: {}", rev_month, money(v, currency)));
    }
    let counts = [
        (products, metrics.total_products),
        (low, metrics.low_stock_count),
        (out, metrics.out_of_stock_count),
        (customers, metrics.customer_count),
        (pending, metrics.pending_prescriptions),
    ];
    for (label, value) in counts {
        if let Some(v) = value {
            lines.push(format!("- {}: {}", label, v));
        }
    }
    for (key, value) in &metrics.extra {
        lines.push(format!("- {}: {}", key, value));
    }

    if !lines.is_empty() {
        prompt.push_str(&format!("\n\n{}:\n{}", heading, lines.join("\n")));
    }
    prompt
}

/// Assemble the turns for a general completion: system prompt, prior
/// history, then the new user message.
pub fn build_request_context(
    locale: Locale,
    system_prompt: String,
    history: &[ChatTurn],
    user_message: &str,
    model: &str,
    max_retries: u32,
) -> RequestContext {
    let mut turns = Vec::with_capacity(history.len() + 2);
    turns.push(ChatTurn::system(system_prompt));
    turns.extend(history.iter().cloned());
    turns.push(ChatTurn::user(user_message));
    RequestContext {
        turns,
        model: model.to_string(),
        max_retries,
        locale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::types::Role;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()
    }

    #[test]
    fn test_prompt_without_metrics_has_date_only() {
        let prompt = build_system_prompt(Locale::En, &MetricsSnapshot::default(), date());
        assert!(prompt.starts_with("You are the assistant of a community pharmacy."));
        assert!(prompt.contains("Today's date: 2024-03-14"));
        assert!(!prompt.contains("Business snapshot"));
    }

    #[test]
    fn test_prompt_embeds_metrics_verbatim() {
        let mut metrics = MetricsSnapshot {
            revenue_today: Some(1520.5),
            low_stock_count: Some(4),
            currency: Some("EGP".to_string()),
            ..Default::default()
        };
        metrics
            .extra
            .insert("Top seller".to_string(), "Panadol Extra".to_string());

        let prompt = build_system_prompt(Locale::En, &metrics, date());
        assert!(prompt.contains("- Revenue today: 1520.50 EGP"));
        assert!(prompt.contains("- Low-stock products: 4"));
        assert!(prompt.contains("- Top seller: Panadol Extra"));
        assert!(!prompt.contains("Customers"));
    }

    #[test]
    fn test_arabic_prompt() {
        let metrics = MetricsSnapshot {
            customer_count: Some(310),
            ..Default::default()
        };
        let prompt = build_system_prompt(Locale::Ar, &metrics, date());
        assert!(prompt.starts_with("أنت مساعد صيدلية"));
        assert!(prompt.contains("- العملاء: 310"));
    }

    #[test]
    fn test_request_context_turn_order() {
        let history = vec![ChatTurn::user("hi"), ChatTurn::assistant("hello")];
        let ctx = build_request_context(Locale::En, "sys".into(), &history, "dose?", "gpt", 3);
        let roles: Vec<Role> = ctx.turns.iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(ctx.turns.last().unwrap().content, "dose?");
        assert_eq!(ctx.model, "gpt");
        assert_eq!(ctx.max_retries, 3);
    }
}
