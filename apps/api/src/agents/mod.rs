// Analysis agents: sentiment → topic → action.
// Each agent is one prompt template and one LLM call parsed into a typed result.
// All LLM calls go through llm_client; nothing here talks to a provider directly.

pub mod action;
pub mod prompts;
pub mod sentiment;
pub mod topic;

pub use action::{suggest_actions, SuggestedActions};
pub use sentiment::{analyze_sentiment, SentimentAnalysis, SentimentLabel};
pub use topic::{categorize, Categorization, UrgencyLevel};
