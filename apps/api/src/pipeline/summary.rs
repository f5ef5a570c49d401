//! Local summary built from the three agent outputs. No LLM call.

use serde::{Deserialize, Serialize};

use crate::agents::{Categorization, SentimentAnalysis, SentimentLabel, SuggestedActions, UrgencyLevel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub sentiment_label: SentimentLabel,
    pub sentiment_score: f64,
    pub confidence: f64,
    pub primary_category: String,
    pub urgency_level: UrgencyLevel,
    pub escalation_required: bool,
    /// Escalation, an explicit action request, or a negative high-urgency complaint.
    pub requires_attention: bool,
    /// One-line Arabic summary for dashboards and notifications.
    pub headline_ar: String,
}

pub fn build_summary(
    sentiment: &SentimentAnalysis,
    categorization: &Categorization,
    actions: &SuggestedActions,
) -> AnalysisSummary {
    let label = sentiment.label();
    let urgency = categorization.urgency_level;
    let requires_attention = actions.escalation_required
        || categorization.requires_action
        || (label == SentimentLabel::Negative && urgency >= UrgencyLevel::High);

    let mut headline_ar = format!(
        "ملاحظة {} ({:+.2}) ضمن فئة {} بأولوية {}",
        label.arabic(),
        sentiment.sentiment_score,
        category_arabic(&categorization.primary_category),
        urgency.arabic()
    );
    if actions.escalation_required {
        headline_ar.push_str("، تتطلب تصعيداً");
    }

    AnalysisSummary {
        sentiment_label: label,
        sentiment_score: sentiment.sentiment_score,
        confidence: sentiment.confidence,
        primary_category: categorization.primary_category.clone(),
        urgency_level: urgency,
        escalation_required: actions.escalation_required,
        requires_attention,
        headline_ar,
    }
}

/// Arabic display name for the category labels the topic agent is asked to use.
/// Unknown labels are shown as-is.
pub fn category_arabic(category: &str) -> &str {
    match category {
        "product_quality" => "جودة المنتج",
        "customer_service" => "خدمة العملاء",
        "delivery" => "التوصيل",
        "pricing" => "الأسعار",
        "billing" => "الفواتير والدفع",
        "website_app" => "الموقع والتطبيق",
        "staff_behavior" => "تعامل الموظفين",
        "cleanliness" => "النظافة",
        "waiting_time" => "وقت الانتظار",
        "general" => "عام",
        other => other,
    }
}
