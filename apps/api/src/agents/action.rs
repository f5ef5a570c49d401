//! Action agent: suggests concrete follow-ups from the two earlier stages.

use serde::{Deserialize, Serialize};

use crate::agents::prompts::{quote_text, ACTION_INSTRUCTION, ACTION_PROMPT_TEMPLATE};
use crate::agents::sentiment::SentimentAnalysis;
use crate::agents::topic::{Categorization, UrgencyLevel};
use crate::llm_client::prompts::build_system;
use crate::llm_client::{complete_json, CompletionProvider, LlmError, ModelTarget};

/// At or below this sentiment score the fallback escalates.
const ESCALATION_SCORE: f64 = -0.7;
const MAX_ACTIONS_PER_LIST: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestedActions {
    #[serde(default)]
    pub immediate_actions: Vec<String>,
    #[serde(default)]
    pub follow_up_actions: Vec<String>,
    #[serde(default)]
    pub prevention_actions: Vec<String>,
    #[serde(default)]
    pub escalation_required: bool,
}

impl SuggestedActions {
    /// Substituted when the action stage fails. Escalation is still derived
    /// from the earlier stages so a severe complaint is never silently dropped.
    pub fn fallback(sentiment: &SentimentAnalysis, categorization: &Categorization) -> Self {
        Self {
            escalation_required: needs_escalation(sentiment, categorization),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.immediate_actions.is_empty()
            && self.follow_up_actions.is_empty()
            && self.prevention_actions.is_empty()
    }

    fn tidy(mut self) -> Self {
        for list in [
            &mut self.immediate_actions,
            &mut self.follow_up_actions,
            &mut self.prevention_actions,
        ] {
            list.retain(|a| !a.trim().is_empty());
            list.truncate(MAX_ACTIONS_PER_LIST);
        }
        self
    }
}

pub fn needs_escalation(sentiment: &SentimentAnalysis, categorization: &Categorization) -> bool {
    sentiment.sentiment_score <= ESCALATION_SCORE
        || categorization.urgency_level == UrgencyLevel::Critical
}

/// Customer text goes in last so placeholders inside it stay literal.
fn action_prompt(
    text: &str,
    sentiment: &SentimentAnalysis,
    categorization: &Categorization,
) -> String {
    ACTION_PROMPT_TEMPLATE
        .replace("{emotion}", &sentiment.emotion)
        .replace("{sentiment_score}", &format!("{:.2}", sentiment.sentiment_score))
        .replace("{primary_category}", &categorization.primary_category)
        .replace("{urgency_level}", categorization.urgency_level.as_str())
        .replace("{topics}", &categorization.topics.join("، "))
        .replace("{text}", &quote_text(text))
}

/// Runs the action agent with sentiment and categorization as context.
pub async fn suggest_actions(
    provider: &dyn CompletionProvider,
    target: ModelTarget<'_>,
    text: &str,
    sentiment: &SentimentAnalysis,
    categorization: &Categorization,
) -> Result<SuggestedActions, LlmError> {
    let prompt = action_prompt(text, sentiment, categorization);
    let system = build_system(ACTION_INSTRUCTION);
    let raw: SuggestedActions = complete_json(provider, target, &prompt, &system).await?;
    Ok(raw.tidy())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentiment(score: f64) -> SentimentAnalysis {
        SentimentAnalysis {
            sentiment_score: score,
            ..SentimentAnalysis::neutral()
        }
    }

    #[test]
    fn test_fallback_escalates_very_negative() {
        let actions = SuggestedActions::fallback(&sentiment(-0.9), &Categorization::fallback());
        assert!(actions.escalation_required);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_fallback_escalates_critical_urgency() {
        let cat = Categorization {
            urgency_level: UrgencyLevel::Critical,
            ..Categorization::fallback()
        };
        assert!(SuggestedActions::fallback(&sentiment(0.1), &cat).escalation_required);
    }

    #[test]
    fn test_fallback_does_not_escalate_mild() {
        let actions = SuggestedActions::fallback(&sentiment(-0.3), &Categorization::fallback());
        assert!(!actions.escalation_required);
    }

    #[test]
    fn test_tidy_drops_blanks_and_truncates() {
        let actions = SuggestedActions {
            immediate_actions: vec![
                "أ".into(),
                " ".into(),
                "ب".into(),
                "ج".into(),
                "د".into(),
            ],
            ..SuggestedActions::default()
        }
        .tidy();
        assert_eq!(actions.immediate_actions, vec!["أ", "ب", "ج"]);
    }

    #[test]
    fn test_prompt_keeps_placeholders_in_customer_text() {
        let cat = Categorization {
            primary_category: "delivery".to_string(),
            urgency_level: UrgencyLevel::High,
            ..Categorization::fallback()
        };
        let prompt = action_prompt(
            "الرمز {urgency_level} ظهر في الفاتورة {topics}",
            &sentiment(-0.4),
            &cat,
        );
        assert!(prompt.contains("الرمز {urgency_level} ظهر في الفاتورة {topics}"));
        assert!(prompt.contains("delivery"));
        assert!(prompt.contains("high"));
    }

    #[test]
    fn test_deserializes_partial_object() {
        let a: SuggestedActions =
            serde_json::from_str(r#"{"immediate_actions": ["الاتصال بالعميل"]}"#).unwrap();
        assert_eq!(a.immediate_actions.len(), 1);
        assert!(!a.escalation_required);
    }
}
