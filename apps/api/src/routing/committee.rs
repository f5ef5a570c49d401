//! Model committee: picks one backend per request with a static weighted score.
//!
//! score = w_quality × quality + w_dialect × dialect_fit + w_cost × cost_fit
//!
//! - dialect_fit: 1.0 when the backend supports the detected dialect, else
//!   0.5 × (1 − dialect confidence)
//! - cost_fit: 1 − cost / max_cost over the available backends
//! - weights come from the cost preference, then volume and priority adjust them
//! - complex text (> 0.7) penalizes low-quality backends (< 0.6) by × 0.8
//!
//! No learning, no feedback loop: equal inputs always produce equal decisions.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm_client::{ModelTarget, Provider};
use crate::routing::backends::ModelBackend;
use crate::text::{detect_dialect, estimate_complexity, DialectProfile};

const HIGH_VOLUME: u32 = 100;
const HIGH_VOLUME_COST_MULTIPLIER: f64 = 1.5;
const PRIORITY_QUALITY_MULTIPLIER: f64 = 1.25;
const COMPLEX_TEXT_THRESHOLD: f64 = 0.7;
const WEAK_BACKEND_QUALITY: f64 = 0.6;
const WEAK_BACKEND_PENALTY: f64 = 0.8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostPreference {
    Economy,
    #[default]
    Balanced,
    Quality,
}

/// Business context supplied by the caller alongside the text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskContext {
    pub priority: Priority,
    /// Expected number of items in the surrounding job.
    pub volume: u32,
    pub cost_preference: CostPreference,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoutingWeights {
    pub quality: f64,
    pub dialect: f64,
    pub cost: f64,
}

impl RoutingWeights {
    pub fn for_context(ctx: &TaskContext) -> Self {
        let mut weights = match ctx.cost_preference {
            CostPreference::Economy => Self {
                quality: 0.20,
                dialect: 0.30,
                cost: 0.50,
            },
            CostPreference::Balanced => Self {
                quality: 0.35,
                dialect: 0.35,
                cost: 0.30,
            },
            CostPreference::Quality => Self {
                quality: 0.50,
                dialect: 0.40,
                cost: 0.10,
            },
        };
        if ctx.volume >= HIGH_VOLUME {
            weights.cost *= HIGH_VOLUME_COST_MULTIPLIER;
        }
        if matches!(ctx.priority, Priority::High | Priority::Critical) {
            weights.quality *= PRIORITY_QUALITY_MULTIPLIER;
        }
        weights
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendScore {
    pub backend: String,
    pub quality: f64,
    pub dialect_fit: f64,
    pub cost_fit: f64,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub backend: String,
    pub provider: Provider,
    pub model: String,
    pub score: f64,
    pub dialect: DialectProfile,
    pub complexity: f64,
    /// Scores of every available backend, in catalog order.
    pub scores: Vec<BackendScore>,
    pub fell_back: bool,
}

impl RoutingDecision {
    pub fn target(&self) -> ModelTarget<'_> {
        ModelTarget {
            provider: self.provider,
            model: &self.model,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelRouter {
    backends: Vec<ModelBackend>,
    default_index: usize,
}

impl ModelRouter {
    /// Builds a router over `backends`.
    ///
    /// The default backend is `default_name` when given (it must exist in the
    /// catalog), else the first available backend, else the first backend.
    pub fn new(backends: Vec<ModelBackend>, default_name: Option<&str>) -> Result<Self> {
        if backends.is_empty() {
            bail!("Model router needs at least one backend");
        }
        let default_index = match default_name {
            Some(name) => match backends.iter().position(|b| b.name == name) {
                Some(i) => i,
                None => bail!("Default model backend '{name}' is not in the catalog"),
            },
            None => backends.iter().position(|b| b.available).unwrap_or(0),
        };
        Ok(Self {
            backends,
            default_index,
        })
    }

    pub fn backends(&self) -> &[ModelBackend] {
        &self.backends
    }

    pub fn default_backend(&self) -> &ModelBackend {
        &self.backends[self.default_index]
    }

    /// Scores every available backend and returns the winner.
    /// Falls back to the default backend when nothing usable scored.
    pub fn route(&self, normalized_text: &str, ctx: &TaskContext) -> RoutingDecision {
        let dialect = detect_dialect(normalized_text);
        let complexity = estimate_complexity(normalized_text);
        let weights = RoutingWeights::for_context(ctx);

        let available: Vec<&ModelBackend> = self.backends.iter().filter(|b| b.available).collect();
        let max_cost = available
            .iter()
            .map(|b| b.cost_per_1k_tokens)
            .fold(0.0_f64, f64::max);

        let scores: Vec<BackendScore> = available
            .iter()
            .map(|b| score_backend(b, &dialect, complexity, max_cost, &weights))
            .collect();

        // First maximum wins so ties resolve in catalog order.
        let best = scores
            .iter()
            .enumerate()
            .filter(|(_, s)| s.score.is_finite() && s.score > 0.0)
            .fold(None::<(usize, f64)>, |best, (i, s)| match best {
                Some((_, top)) if top >= s.score => best,
                _ => Some((i, s.score)),
            });

        let (chosen, score, fell_back) = match best {
            Some((i, score)) => (available[i], score, false),
            None => (self.default_backend(), 0.0, true),
        };

        debug!(
            "Routed to {} (score {:.3}, dialect {}, complexity {:.2}, fell_back {})",
            chosen.name,
            score,
            dialect.dialect.as_str(),
            complexity,
            fell_back
        );

        RoutingDecision {
            backend: chosen.name.clone(),
            provider: chosen.provider,
            model: chosen.model.clone(),
            score,
            dialect,
            complexity,
            scores,
            fell_back,
        }
    }
}

fn score_backend(
    backend: &ModelBackend,
    dialect: &DialectProfile,
    complexity: f64,
    max_cost: f64,
    weights: &RoutingWeights,
) -> BackendScore {
    let dialect_fit = if backend.supports(dialect.dialect) {
        1.0
    } else {
        0.5 * (1.0 - dialect.confidence)
    };
    let cost_fit = if max_cost > 0.0 {
        (1.0 - backend.cost_per_1k_tokens / max_cost).clamp(0.0, 1.0)
    } else {
        1.0
    };

    let mut score = weights.quality * backend.quality
        + weights.dialect * dialect_fit
        + weights.cost * cost_fit;
    if complexity > COMPLEX_TEXT_THRESHOLD && backend.quality < WEAK_BACKEND_QUALITY {
        score *= WEAK_BACKEND_PENALTY;
    }

    BackendScore {
        backend: backend.name.clone(),
        quality: backend.quality,
        dialect_fit,
        cost_fit,
        score,
    }
}
