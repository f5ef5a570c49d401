//! Model backend catalog.
//!
//! Backends are fixed in code; availability is decided at startup from which
//! provider keys are configured.

use serde::Serialize;

use crate::llm_client::Provider;
use crate::text::Dialect;

#[derive(Debug, Clone, Serialize)]
pub struct ModelBackend {
    pub name: String,
    pub provider: Provider,
    pub model: String,
    /// USD per 1k tokens, blended input/output.
    pub cost_per_1k_tokens: f64,
    /// 0.0 – 1.0, static quality estimate for Arabic feedback analysis.
    pub quality: f64,
    pub dialects: Vec<Dialect>,
    pub available: bool,
}

impl ModelBackend {
    pub fn supports(&self, dialect: Dialect) -> bool {
        self.dialects.contains(&dialect)
    }
}

fn backend(
    name: &str,
    provider: Provider,
    model: &str,
    cost_per_1k_tokens: f64,
    quality: f64,
    dialects: &[Dialect],
) -> ModelBackend {
    ModelBackend {
        name: name.to_string(),
        provider,
        model: model.to_string(),
        cost_per_1k_tokens,
        quality,
        dialects: dialects.to_vec(),
        available: false,
    }
}

/// The built-in catalog, in tie-break order. All entries start unavailable.
pub fn default_catalog() -> Vec<ModelBackend> {
    use Dialect::*;
    vec![
        backend(
            "claude-sonnet",
            Provider::Anthropic,
            "claude-sonnet-4-5",
            3.00,
            0.92,
            &[Msa, Gulf, Egyptian, Levantine, Maghrebi],
        ),
        backend(
            "claude-haiku",
            Provider::Anthropic,
            "claude-haiku-4-5",
            1.00,
            0.78,
            &[Msa, Gulf, Levantine],
        ),
        backend(
            "gpt-4o",
            Provider::OpenAi,
            "gpt-4o",
            2.50,
            0.90,
            &[Msa, Egyptian, Levantine, Gulf],
        ),
        backend(
            "gpt-4o-mini",
            Provider::OpenAi,
            "gpt-4o-mini",
            0.15,
            0.68,
            &[Msa, Egyptian],
        ),
    ]
}

/// Marks each catalog entry available when `has_key` reports a key for its provider.
pub fn catalog_with_availability<F>(has_key: F) -> Vec<ModelBackend>
where
    F: Fn(Provider) -> bool,
{
    default_catalog()
        .into_iter()
        .map(|mut b| {
            b.available = has_key(b.provider);
            b
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_names_are_unique() {
        let catalog = default_catalog();
        let mut names: Vec<_> = catalog.iter().map(|b| b.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), catalog.len());
    }

    #[test]
    fn test_catalog_values_in_range() {
        for b in default_catalog() {
            assert!((0.0..=1.0).contains(&b.quality), "{} quality", b.name);
            assert!(b.cost_per_1k_tokens >= 0.0);
            assert!(b.supports(Dialect::Msa), "{} must support MSA", b.name);
        }
    }

    #[test]
    fn test_availability_follows_provider_keys() {
        let catalog = catalog_with_availability(|p| p == Provider::OpenAi);
        for b in &catalog {
            assert_eq!(b.available, b.provider == Provider::OpenAi);
        }
    }
}
