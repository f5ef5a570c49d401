//! Analysis Orchestrator: runs the agent chain over one piece of feedback.
//!
//! Flow: normalize → route → sentiment → topic (sees sentiment) →
//!       action (sees both) → summary.
//!
//! A failed stage is recorded in `errors` and replaced by its default payload,
//! so `analyze` always returns a complete report. Stages are never retried.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::agents::{
    analyze_sentiment, categorize, suggest_actions, Categorization, SentimentAnalysis,
    SuggestedActions,
};
use crate::llm_client::{CompletionProvider, LlmError};
use crate::pipeline::summary::{build_summary, AnalysisSummary};
use crate::routing::{ModelRouter, RoutingDecision, TaskContext};
use crate::text::normalize_arabic;

/// Progress through the pipeline. Strictly linear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Initial,
    Preprocessed,
    SentimentCompleted,
    TopicCompleted,
    ActionCompleted,
    Completed,
}

impl PipelineStage {
    pub fn next(self) -> Self {
        match self {
            PipelineStage::Initial => PipelineStage::Preprocessed,
            PipelineStage::Preprocessed => PipelineStage::SentimentCompleted,
            PipelineStage::SentimentCompleted => PipelineStage::TopicCompleted,
            PipelineStage::TopicCompleted => PipelineStage::ActionCompleted,
            PipelineStage::ActionCompleted | PipelineStage::Completed => PipelineStage::Completed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Agent {
    Sentiment,
    Topic,
    Action,
}

impl Agent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Agent::Sentiment => "sentiment",
            Agent::Topic => "topic",
            Agent::Action => "action",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageError {
    pub agent: Agent,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timestamps {
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
}

/// Full output of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub summary: AnalysisSummary,
    pub sentiment: SentimentAnalysis,
    pub categorization: Categorization,
    pub suggested_actions: SuggestedActions,
    pub timestamps: Timestamps,
    pub processed_text: String,
    pub routing: RoutingDecision,
    pub stage: PipelineStage,
    pub errors: Vec<StageError>,
}

impl AnalysisReport {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// True when every agent failed, i.e. nothing in the report came from a model.
    pub fn all_stages_failed(&self) -> bool {
        [Agent::Sentiment, Agent::Topic, Agent::Action]
            .iter()
            .all(|a| self.errors.iter().any(|e| e.agent == *a))
    }
}

pub struct Orchestrator {
    provider: Arc<dyn CompletionProvider>,
    router: ModelRouter,
    batch_concurrency: usize,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        router: ModelRouter,
        batch_concurrency: usize,
    ) -> Self {
        Self {
            provider,
            router,
            batch_concurrency: batch_concurrency.max(1),
        }
    }

    pub fn router(&self) -> &ModelRouter {
        &self.router
    }

    /// Runs the full pipeline. Never fails: stage errors land in `errors`.
    pub async fn analyze(&self, raw_text: &str, ctx: &TaskContext) -> AnalysisReport {
        let started_at = Utc::now();
        let mut stage = PipelineStage::Initial;
        let mut errors = Vec::new();

        let processed_text = normalize_arabic(raw_text);
        stage = stage.next();

        let routing = self.router.route(&processed_text, ctx);
        let target = routing.target();
        let provider = self.provider.as_ref();
        let empty = processed_text.is_empty();

        let sentiment = if empty {
            record_empty(&mut errors, Agent::Sentiment);
            SentimentAnalysis::neutral()
        } else {
            match analyze_sentiment(provider, target, &processed_text).await {
                Ok(s) => s,
                Err(e) => {
                    record_failure(&mut errors, Agent::Sentiment, &e);
                    SentimentAnalysis::neutral()
                }
            }
        };
        stage = stage.next();

        let categorization = if empty {
            record_empty(&mut errors, Agent::Topic);
            Categorization::fallback()
        } else {
            match categorize(provider, target, &processed_text, &sentiment).await {
                Ok(c) => c,
                Err(e) => {
                    record_failure(&mut errors, Agent::Topic, &e);
                    Categorization::fallback()
                }
            }
        };
        stage = stage.next();

        let suggested_actions = if empty {
            record_empty(&mut errors, Agent::Action);
            SuggestedActions::fallback(&sentiment, &categorization)
        } else {
            match suggest_actions(provider, target, &processed_text, &sentiment, &categorization)
                .await
            {
                Ok(a) => a,
                Err(e) => {
                    record_failure(&mut errors, Agent::Action, &e);
                    SuggestedActions::fallback(&sentiment, &categorization)
                }
            }
        };
        stage = stage.next();

        let summary = build_summary(&sentiment, &categorization, &suggested_actions);
        stage = stage.next();

        let completed_at = Utc::now();
        info!(
            "Analysis completed via {} with {} stage error(s) in {}ms",
            routing.backend,
            errors.len(),
            (completed_at - started_at).num_milliseconds()
        );

        AnalysisReport {
            summary,
            sentiment,
            categorization,
            suggested_actions,
            timestamps: Timestamps {
                started_at,
                completed_at,
                duration_ms: (completed_at - started_at).num_milliseconds(),
            },
            processed_text,
            routing,
            stage,
            errors,
        }
    }

    /// Runs the pipeline over many texts with bounded concurrency.
    /// Reports come back in input order.
    pub async fn analyze_batch(&self, texts: Vec<String>, ctx: &TaskContext) -> Vec<AnalysisReport> {
        let ctx = *ctx;
        stream::iter(texts)
            .map(|text| async move { self.analyze(&text, &ctx).await })
            .buffered(self.batch_concurrency)
            .collect()
            .await
    }
}

fn record_failure(errors: &mut Vec<StageError>, agent: Agent, error: &LlmError) {
    warn!("{} stage failed, substituting default: {error}", agent.as_str());
    errors.push(StageError {
        agent,
        message: error.to_string(),
    });
}

fn record_empty(errors: &mut Vec<StageError>, agent: Agent) {
    errors.push(StageError {
        agent,
        message: "Text is empty after normalization".to_string(),
    });
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::agents::{SentimentLabel, UrgencyLevel};
    use crate::llm_client::ModelTarget;
    use crate::routing::catalog_with_availability;

    /// Returns queued responses in order; `None` entries simulate an API failure.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<Option<String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Option<&str>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().map(|r| r.map(String::from)).collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(
            &self,
            _target: ModelTarget<'_>,
            prompt: &str,
            _system: &str,
        ) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.responses.lock().unwrap().pop_front().flatten() {
                Some(text) => Ok(text),
                None => Err(LlmError::Api {
                    status: 503,
                    message: "unavailable".to_string(),
                }),
            }
        }
    }

    const SENTIMENT_OK: &str = r#"{"sentiment_score": -0.8, "confidence": 0.9, "emotion": "anger", "intensity": 0.8, "reasoning": "العميل غاضب من التأخير"}"#;
    const TOPIC_OK: &str = r#"{"primary_category": "delivery", "secondary_categories": ["customer_service"], "topics": ["تأخير التوصيل"], "urgency_level": "high", "requires_action": true, "customer_type": "returning"}"#;
    const ACTION_OK: &str = r#"{"immediate_actions": ["الاتصال بالعميل"], "follow_up_actions": [], "prevention_actions": ["مراجعة شركة الشحن"], "escalation_required": true}"#;

    fn orchestrator(provider: Arc<ScriptedProvider>) -> Orchestrator {
        let router = ModelRouter::new(catalog_with_availability(|_| true), None).unwrap();
        Orchestrator::new(provider, router, 2)
    }

    const TEXT: &str = "الطلب وصل متأخر أسبوع كامل وما حد رد علي!";

    #[tokio::test]
    async fn test_all_stages_succeed() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Some(SENTIMENT_OK),
            Some(TOPIC_OK),
            Some(ACTION_OK),
        ]));
        let report = orchestrator(provider.clone())
            .analyze(TEXT, &TaskContext::default())
            .await;

        assert!(report.is_complete());
        assert_eq!(report.stage, PipelineStage::Completed);
        assert_eq!(report.sentiment.emotion, "anger");
        assert_eq!(report.categorization.urgency_level, UrgencyLevel::High);
        assert!(report.suggested_actions.escalation_required);
        assert_eq!(report.summary.sentiment_label, SentimentLabel::Negative);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_later_stages_receive_earlier_context() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Some(SENTIMENT_OK),
            Some(TOPIC_OK),
            Some(ACTION_OK),
        ]));
        orchestrator(provider.clone())
            .analyze(TEXT, &TaskContext::default())
            .await;

        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[1].contains("anger"));
        assert!(prompts[1].contains("-0.80"));
        assert!(prompts[2].contains("delivery"));
        assert!(prompts[2].contains("high"));
        // agents see the normalized text
        assert!(prompts[0].contains("متاخر"));
    }

    #[tokio::test]
    async fn test_sentiment_failure_substitutes_neutral_and_continues() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            None,
            Some(TOPIC_OK),
            Some(ACTION_OK),
        ]));
        let report = orchestrator(provider.clone())
            .analyze(TEXT, &TaskContext::default())
            .await;

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].agent, Agent::Sentiment);
        assert_eq!(report.sentiment, SentimentAnalysis::neutral());
        assert_eq!(report.categorization.primary_category, "delivery");
        assert_eq!(report.stage, PipelineStage::Completed);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_unparseable_output_counts_as_failure() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Some(SENTIMENT_OK),
            Some("آسف، لا أستطيع التصنيف"),
            Some(ACTION_OK),
        ]));
        let report = orchestrator(provider)
            .analyze(TEXT, &TaskContext::default())
            .await;

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].agent, Agent::Topic);
        assert_eq!(report.categorization, Categorization::fallback());
    }

    #[tokio::test]
    async fn test_all_failures_still_produce_full_report() {
        let provider = Arc::new(ScriptedProvider::new(vec![None, None, None]));
        let report = orchestrator(provider)
            .analyze(TEXT, &TaskContext::default())
            .await;

        assert!(report.all_stages_failed());
        assert_eq!(report.errors.len(), 3);

        let json = serde_json::to_value(&report).unwrap();
        for key in [
            "summary",
            "sentiment",
            "categorization",
            "suggested_actions",
            "timestamps",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        assert!(json["timestamps"].get("started_at").is_some());
        assert!(json["timestamps"].get("completed_at").is_some());
    }

    #[tokio::test]
    async fn test_out_of_range_scores_are_clamped() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Some(r#"{"sentiment_score": -4.0, "confidence": 2.5, "emotion": "anger"}"#),
            Some(TOPIC_OK),
            Some(ACTION_OK),
        ]));
        let report = orchestrator(provider)
            .analyze(TEXT, &TaskContext::default())
            .await;

        assert_eq!(report.sentiment.sentiment_score, -1.0);
        assert_eq!(report.sentiment.confidence, 1.0);
        assert_eq!(report.summary.sentiment_score, -1.0);
    }

    #[tokio::test]
    async fn test_empty_text_skips_llm_calls() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let report = orchestrator(provider.clone())
            .analyze("  \u{0640}\u{064E} ", &TaskContext::default())
            .await;

        assert_eq!(provider.calls(), 0);
        assert!(report.all_stages_failed());
        assert!(report.processed_text.is_empty());
    }

    #[tokio::test]
    async fn test_action_fallback_escalates_after_negative_sentiment() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Some(SENTIMENT_OK),
            Some(TOPIC_OK),
            None,
        ]));
        let report = orchestrator(provider)
            .analyze(TEXT, &TaskContext::default())
            .await;

        assert!(report.suggested_actions.is_empty());
        assert!(report.suggested_actions.escalation_required);
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let positive = r#"{"sentiment_score": 0.9, "confidence": 0.9, "emotion": "joy"}"#;
        // concurrency 1 keeps the scripted responses aligned with inputs
        let provider = Arc::new(ScriptedProvider::new(vec![
            Some(positive),
            Some(TOPIC_OK),
            Some(ACTION_OK),
            Some(SENTIMENT_OK),
            Some(TOPIC_OK),
            Some(ACTION_OK),
        ]));
        let router = ModelRouter::new(catalog_with_availability(|_| true), None).unwrap();
        let orchestrator = Orchestrator::new(provider, router, 1);

        let reports = orchestrator
            .analyze_batch(
                vec!["خدمة رائعة".to_string(), TEXT.to_string()],
                &TaskContext::default(),
            )
            .await;

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].summary.sentiment_label, SentimentLabel::Positive);
        assert_eq!(reports[1].summary.sentiment_label, SentimentLabel::Negative);
    }

    #[test]
    fn test_stage_order_is_linear() {
        let mut stage = PipelineStage::Initial;
        let mut seen = vec![stage];
        while stage != PipelineStage::Completed {
            stage = stage.next();
            seen.push(stage);
        }
        assert_eq!(seen.len(), 6);
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(PipelineStage::Completed.next(), PipelineStage::Completed);
    }
}
