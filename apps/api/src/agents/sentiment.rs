//! Sentiment agent: one LLM call scoring the customer's sentiment.

use serde::{Deserialize, Serialize};

use crate::agents::prompts::{quote_text, SENTIMENT_INSTRUCTION, SENTIMENT_PROMPT_TEMPLATE};
use crate::llm_client::prompts::build_system;
use crate::llm_client::{complete_json, CompletionProvider, LlmError, ModelTarget};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    /// -1.0 – 1.0
    pub sentiment_score: f64,
    /// 0.0 – 1.0
    pub confidence: f64,
    #[serde(default = "neutral_emotion")]
    pub emotion: String,
    /// 0.0 – 1.0
    #[serde(default)]
    pub intensity: f64,
    #[serde(default)]
    pub reasoning: String,
}

fn neutral_emotion() -> String {
    "neutral".to_string()
}

impl SentimentAnalysis {
    /// Substituted when the sentiment stage fails.
    pub fn neutral() -> Self {
        Self {
            sentiment_score: 0.0,
            confidence: 0.0,
            emotion: neutral_emotion(),
            intensity: 0.0,
            reasoning: String::new(),
        }
    }

    /// Forces every score into its documented range. Non-finite values become 0.
    pub fn clamped(mut self) -> Self {
        self.sentiment_score = clamp_finite(self.sentiment_score, -1.0, 1.0);
        self.confidence = clamp_finite(self.confidence, 0.0, 1.0);
        self.intensity = clamp_finite(self.intensity, 0.0, 1.0);
        self.emotion = self.emotion.trim().to_lowercase();
        if self.emotion.is_empty() {
            self.emotion = neutral_emotion();
        }
        self
    }

    pub fn label(&self) -> SentimentLabel {
        SentimentLabel::from_score(self.sentiment_score)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

/// Scores strictly beyond ±0.2 are polar.
pub const POLARITY_THRESHOLD: f64 = 0.2;

impl SentimentLabel {
    pub fn from_score(score: f64) -> Self {
        if score > POLARITY_THRESHOLD {
            SentimentLabel::Positive
        } else if score < -POLARITY_THRESHOLD {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn arabic(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "إيجابي",
            SentimentLabel::Neutral => "محايد",
            SentimentLabel::Negative => "سلبي",
        }
    }
}

pub(crate) fn clamp_finite(value: f64, min: f64, max: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        0.0
    }
}

/// Runs the sentiment agent on normalized text.
pub async fn analyze_sentiment(
    provider: &dyn CompletionProvider,
    target: ModelTarget<'_>,
    text: &str,
) -> Result<SentimentAnalysis, LlmError> {
    let prompt = SENTIMENT_PROMPT_TEMPLATE.replace("{text}", &quote_text(text));
    let system = build_system(SENTIMENT_INSTRUCTION);
    let raw: SentimentAnalysis = complete_json(provider, target, &prompt, &system).await?;
    Ok(raw.clamped())
}
