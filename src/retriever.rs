//! Retriever: cache lookup, query embedding, provider search, and cache
//! population.

use crate::cache::RetrievalCache;
use crate::config::RetrievalConfig;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::fragment::RetrievalResult;
use crate::store::{MetadataFilter, VectorStoreProvider};
use std::sync::Arc;
use tracing::debug;

pub struct Retriever {
    store: Arc<dyn VectorStoreProvider>,
    embedder: Arc<dyn Embedder>,
    cache: RetrievalCache,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorStoreProvider>, embedder: Arc<dyn Embedder>, config: RetrievalConfig) -> Self {
        let cache = RetrievalCache::new(config.clone());
        Self {
            store,
            embedder,
            cache,
            config,
        }
    }

    pub async fn retrieve(
        &self,
        query: &str,
        top_k: Option<usize>,
        filters: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalResult>> {
        let k = top_k.unwrap_or(self.config.top_k);
        let filter_pairs: Vec<(String, String)> = filters
            .map(|f| f.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        let key = RetrievalCache::fingerprint(query, &filter_pairs, k);

        if let Some(cached) = self.cache.get(&key) {
            debug!(query, "retrieval cache hit");
            return Ok(cached);
        }

        let embedding = self.embedder.embed(query).await?;
        let mut results = self.store.search(&embedding, k, filters).await?;
        results.retain(|r| r.score >= self.config.min_score);

        self.cache.put(key, results.clone());
        Ok(results)
    }

    pub fn cache_stats(&self) -> crate::cache::CacheStats {
        self.cache.stats()
    }

    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
    }
}
