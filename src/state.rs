use crate::config::Config;
use crate::pipeline::MergeSummary;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct AppState {
    cache: Arc<DashMap<String, CachedMerge>>,
    pub config: Arc<Config>,
}

#[derive(Clone)]
pub struct CachedMerge {
    pub document: Vec<u8>,
    pub summary: MergeSummary,
    inserted_at: Instant,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            config: Arc::new(config),
        }
    }

    pub fn insert(&self, merge_id: String, document: Vec<u8>, summary: MergeSummary) {
        self.cache.insert(
            merge_id,
            CachedMerge {
                document,
                summary,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn get(&self, merge_id: &str) -> Option<CachedMerge> {
        self.cache.get(merge_id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn evict_expired(&self, ttl: Duration) {
        let now = Instant::now();
        self.cache.retain(|_, cached| {
            now.duration_since(cached.inserted_at) < ttl
        });
        tracing::info!("Cache eviction complete. Current size: {}", self.cache.len());
    }
}
