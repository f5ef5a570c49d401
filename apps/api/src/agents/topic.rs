//! Topic agent: categorizes feedback using the sentiment stage as context.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::agents::prompts::{quote_text, TOPIC_INSTRUCTION, TOPIC_PROMPT_TEMPLATE};
use crate::agents::sentiment::SentimentAnalysis;
use crate::llm_client::prompts::build_system;
use crate::llm_client::{complete_json, CompletionProvider, LlmError, ModelTarget};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl UrgencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrgencyLevel::Low => "low",
            UrgencyLevel::Medium => "medium",
            UrgencyLevel::High => "high",
            UrgencyLevel::Critical => "critical",
        }
    }

    pub fn arabic(&self) -> &'static str {
        match self {
            UrgencyLevel::Low => "منخفضة",
            UrgencyLevel::Medium => "متوسطة",
            UrgencyLevel::High => "عالية",
            UrgencyLevel::Critical => "حرجة",
        }
    }

    /// Accepts the English labels in any case plus the Arabic ones.
    /// Anything unrecognized is `Medium`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "low" | "منخفضة" | "منخفض" => UrgencyLevel::Low,
            "high" | "urgent" | "عالية" | "عالي" | "عاجل" => UrgencyLevel::High,
            "critical" | "حرجة" | "حرج" => UrgencyLevel::Critical,
            _ => UrgencyLevel::Medium,
        }
    }
}

impl<'de> Deserialize<'de> for UrgencyLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label
            .map(|l| UrgencyLevel::from_label(&l))
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Categorization {
    pub primary_category: String,
    #[serde(default)]
    pub secondary_categories: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub urgency_level: UrgencyLevel,
    #[serde(default)]
    pub requires_action: bool,
    #[serde(default = "unknown_customer")]
    pub customer_type: String,
}

fn unknown_customer() -> String {
    "unknown".to_string()
}

impl Categorization {
    /// Substituted when the topic stage fails.
    pub fn fallback() -> Self {
        Self {
            primary_category: "general".to_string(),
            secondary_categories: vec![],
            topics: vec![],
            urgency_level: UrgencyLevel::Medium,
            requires_action: false,
            customer_type: unknown_customer(),
        }
    }

    /// Lowercases category labels, drops blanks and duplicates of the primary.
    fn tidy(mut self) -> Self {
        self.primary_category = self.primary_category.trim().to_lowercase();
        if self.primary_category.is_empty() {
            self.primary_category = "general".to_string();
        }
        let primary = self.primary_category.clone();
        let mut secondary: Vec<String> = self
            .secondary_categories
            .into_iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty() && *c != primary)
            .collect();
        let mut seen = HashSet::new();
        secondary.retain(|c| seen.insert(c.clone()));
        self.secondary_categories = secondary;
        self.topics.retain(|t| !t.trim().is_empty());
        self
    }
}

/// Customer text goes in last so placeholders inside it stay literal.
fn topic_prompt(text: &str, sentiment: &SentimentAnalysis) -> String {
    TOPIC_PROMPT_TEMPLATE
        .replace("{emotion}", &sentiment.emotion)
        .replace("{sentiment_score}", &format!("{:.2}", sentiment.sentiment_score))
        .replace("{text}", &quote_text(text))
}

/// Runs the topic agent with the sentiment result as context.
pub async fn categorize(
    provider: &dyn CompletionProvider,
    target: ModelTarget<'_>,
    text: &str,
    sentiment: &SentimentAnalysis,
) -> Result<Categorization, LlmError> {
    let prompt = topic_prompt(text, sentiment);
    let system = build_system(TOPIC_INSTRUCTION);
    let raw: Categorization = complete_json(provider, target, &prompt, &system).await?;
    Ok(raw.tidy())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_accepts_english_and_arabic() {
        assert_eq!(UrgencyLevel::from_label("HIGH"), UrgencyLevel::High);
        assert_eq!(UrgencyLevel::from_label("critical"), UrgencyLevel::Critical);
        assert_eq!(UrgencyLevel::from_label("عاجل"), UrgencyLevel::High);
        assert_eq!(UrgencyLevel::from_label("منخفضة"), UrgencyLevel::Low);
        assert_eq!(UrgencyLevel::from_label("whenever"), UrgencyLevel::Medium);
    }

    #[test]
    fn test_urgency_ordering() {
        assert!(UrgencyLevel::Critical > UrgencyLevel::High);
        assert!(UrgencyLevel::Low < UrgencyLevel::Medium);
    }

    #[test]
    fn test_categorization_deserializes_and_tidies() {
        let json = r#"{
            "primary_category": " Delivery ",
            "secondary_categories": ["delivery", "Customer_Service", ""],
            "topics": ["تأخير التوصيل", " "],
            "urgency_level": "High",
            "requires_action": true,
            "customer_type": "returning"
        }"#;
        let c: Categorization = serde_json::from_str::<Categorization>(json).unwrap().tidy();
        assert_eq!(c.primary_category, "delivery");
        assert_eq!(c.secondary_categories, vec!["customer_service".to_string()]);
        assert_eq!(c.topics.len(), 1);
        assert_eq!(c.urgency_level, UrgencyLevel::High);
        assert!(c.requires_action);
    }

    #[test]
    fn test_tidy_drops_non_adjacent_duplicates_in_order() {
        let c = Categorization {
            primary_category: "delivery".to_string(),
            secondary_categories: vec![
                "billing".into(),
                "pricing".into(),
                "Billing".into(),
                "pricing".into(),
            ],
            ..Categorization::fallback()
        }
        .tidy();
        assert_eq!(c.secondary_categories, vec!["billing", "pricing"]);
    }

    #[test]
    fn test_prompt_keeps_placeholders_in_customer_text() {
        let sentiment = SentimentAnalysis {
            emotion: "anger".to_string(),
            sentiment_score: -0.5,
            ..SentimentAnalysis::neutral()
        };
        let prompt = topic_prompt("كتبت {emotion} و {sentiment_score} في الرسالة", &sentiment);
        assert!(prompt.contains("كتبت {emotion} و {sentiment_score} في الرسالة"));
        assert!(prompt.contains("anger"));
        assert!(prompt.contains("-0.50"));
    }

    #[test]
    fn test_categorization_minimal_object() {
        let c: Categorization = serde_json::from_str(r#"{"primary_category": "pricing"}"#).unwrap();
        assert_eq!(c.urgency_level, UrgencyLevel::Medium);
        assert_eq!(c.customer_type, "unknown");
        assert!(!c.requires_action);
    }

    #[test]
    fn test_fallback_is_general_medium() {
        let c = Categorization::fallback();
        assert_eq!(c.primary_category, "general");
        assert_eq!(c.urgency_level, UrgencyLevel::Medium);
    }
}
