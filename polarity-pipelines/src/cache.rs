//! An explicit cache of loaded pipelines, keyed by model identifier.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use polarity::Result;

use crate::sentiment::SentimentPipeline;

/// A keyed store from model identifier to loaded [`SentimentPipeline`].
/// Pipelines are loaded on first use and reused until they are evicted; the
/// cache owns nothing globally and lives exactly as long as its owner.
pub struct PipelineCache {
    pipelines: Mutex<HashMap<String, Arc<SentimentPipeline>>>,
}

impl PipelineCache {
    pub fn new() -> Self {
        Self {
            pipelines: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the pipeline loaded for `identifier`, calling `loader` to load
    /// it the first time. A failed load is not cached, so a later call may
    /// retry.
    pub fn get_or_load<F>(&self, identifier: &str, loader: F) -> Result<Arc<SentimentPipeline>>
    where
        F: FnOnce() -> Result<SentimentPipeline>,
    {
        {
            let pipelines = self.pipelines.lock().unwrap();
            if let Some(pipeline) = pipelines.get(identifier) {
                return Ok(pipeline.clone());
            }
        }

        // The lock is not held while loading: a load can take minutes when the
        // weights are not in the local Hub cache yet.
        let pipeline = Arc::new(loader()?);

        let mut pipelines = self.pipelines.lock().unwrap();
        let pipeline = pipelines
            .entry(identifier.to_string())
            .or_insert(pipeline)
            .clone();
        Ok(pipeline)
    }

    /// Drops the pipeline loaded for `identifier`, if any.
    pub fn evict(&self, identifier: &str) -> bool {
        let mut pipelines = self.pipelines.lock().unwrap();
        let evicted = pipelines.remove(identifier).is_some();
        if evicted {
            tracing::debug!(model = identifier, "evicted pipeline");
        }
        evicted
    }

    /// Drops every loaded pipeline.
    pub fn clear(&self) {
        let mut pipelines = self.pipelines.lock().unwrap();
        pipelines.clear();
    }

    pub fn len(&self) -> usize {
        let pipelines = self.pipelines.lock().unwrap();
        pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        let pipelines = self.pipelines.lock().unwrap();
        pipelines.is_empty()
    }
}

impl Default for PipelineCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polarity::Error;

    // Loading a real pipeline needs the Hub, so these tests only exercise the
    // bookkeeping through failing loaders.

    #[test]
    fn failed_loads_are_not_cached() {
        let cache = PipelineCache::new();
        let result = cache.get_or_load("some/model", || Err(Error::ModelWeightsNotFound));
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn loader_runs_again_after_a_failure() {
        let cache = PipelineCache::new();
        let mut calls = 0;
        for _ in 0..2 {
            let _ = cache.get_or_load("some/model", || {
                calls += 1;
                Err(Error::ModelWeightsNotFound)
            });
        }
        assert_eq!(calls, 2);
    }

    #[test]
    fn evicting_an_unknown_identifier_is_a_noop() {
        let cache = PipelineCache::new();
        assert!(!cache.evict("never/loaded"));
        assert_eq!(cache.len(), 0);
    }
}
