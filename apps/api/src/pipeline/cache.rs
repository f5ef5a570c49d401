//! Redis cache of finished analysis reports.
//!
//! Keyed by SHA-256 over the normalized text and the task context, since the
//! context changes routing. Only fully successful reports are stored. Every
//! Redis failure is logged and treated as a miss.

use redis::AsyncCommands;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::pipeline::orchestrator::AnalysisReport;
use crate::routing::TaskContext;

const KEY_PREFIX: &str = "voc:analysis:";

#[derive(Clone)]
pub struct AnalysisCache {
    client: Option<redis::Client>,
    ttl_secs: u64,
}

impl AnalysisCache {
    pub fn new(redis_url: Option<&str>, ttl_secs: u64) -> anyhow::Result<Self> {
        let client = redis_url.map(redis::Client::open).transpose()?;
        Ok(Self { client, ttl_secs })
    }

    #[cfg(test)]
    pub fn disabled() -> Self {
        Self {
            client: None,
            ttl_secs: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub fn key_for(normalized_text: &str, ctx: &TaskContext) -> String {
        let mut hasher = Sha256::new();
        hasher.update(normalized_text.as_bytes());
        hasher.update([0u8]);
        hasher.update(serde_json::to_vec(ctx).unwrap_or_default());
        format!("{KEY_PREFIX}{:x}", hasher.finalize())
    }

    pub async fn get(&self, key: &str) -> Option<AnalysisReport> {
        let client = self.client.as_ref()?;
        let result: redis::RedisResult<Option<String>> = async {
            let mut conn = client.get_multiplexed_async_connection().await?;
            conn.get(key).await
        }
        .await;

        match result {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(report) => {
                    debug!("Analysis cache hit: {key}");
                    Some(report)
                }
                Err(e) => {
                    warn!("Discarding unreadable cached analysis {key}: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Analysis cache read failed: {e}");
                None
            }
        }
    }

    pub async fn put(&self, key: &str, report: &AnalysisReport) {
        let Some(client) = self.client.as_ref() else {
            return;
        };
        if !report.is_complete() {
            return;
        }
        let raw = match serde_json::to_string(report) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Could not serialize analysis for cache: {e}");
                return;
            }
        };

        let result: redis::RedisResult<()> = async {
            let mut conn = client.get_multiplexed_async_connection().await?;
            conn.set_ex(key, raw, self.ttl_secs).await
        }
        .await;

        if let Err(e) = result {
            warn!("Analysis cache write failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::committee::CostPreference;

    #[test]
    fn test_key_is_stable_and_prefixed() {
        let ctx = TaskContext::default();
        let a = AnalysisCache::key_for("الخدمه ممتازه", &ctx);
        let b = AnalysisCache::key_for("الخدمه ممتازه", &ctx);
        assert_eq!(a, b);
        assert!(a.starts_with(KEY_PREFIX));
        assert_eq!(a.len(), KEY_PREFIX.len() + 64);
    }

    #[test]
    fn test_key_depends_on_context() {
        let economy = TaskContext {
            cost_preference: CostPreference::Economy,
            ..TaskContext::default()
        };
        assert_ne!(
            AnalysisCache::key_for("نص", &TaskContext::default()),
            AnalysisCache::key_for("نص", &economy)
        );
    }

    #[tokio::test]
    async fn test_disabled_cache_always_misses() {
        let cache = AnalysisCache::disabled();
        assert!(!cache.is_enabled());
        assert!(cache.get("voc:analysis:anything").await.is_none());
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(AnalysisCache::new(Some("not a url"), 60).is_err());
        assert!(!AnalysisCache::new(None, 60).unwrap().is_enabled());
    }
}
