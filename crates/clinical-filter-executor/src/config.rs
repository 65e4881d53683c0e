//! Configuration types for the filter composer.

use std::time::Duration;

/// Configuration for the filter composer.
///
/// # Example
///
/// ```rust
/// use clinical_filter_executor::{CacheConfig, ComposerConfig};
///
/// let config = ComposerConfig::builder()
///     .with_cache(CacheConfig::default())
///     .with_parallel(true)
///     .with_max_hits(10_000)
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ComposerConfig {
    /// Predicate result cache (None = caching disabled).
    pub cache: Option<CacheConfig>,
    /// Evaluate tokens and categories concurrently (requires `parallel` feature).
    pub parallel: bool,
    /// Hit limit passed with every index query (None = backend default).
    pub max_hits: Option<usize>,
    /// Stop evaluating categories once the running intersection is empty.
    pub short_circuit: bool,
}

impl ComposerConfig {
    /// Creates a new builder for ComposerConfig.
    pub fn builder() -> ComposerConfigBuilder {
        ComposerConfigBuilder::default()
    }
}

/// Builder for ComposerConfig.
#[derive(Debug, Clone, Default)]
pub struct ComposerConfigBuilder {
    cache: Option<CacheConfig>,
    parallel: bool,
    max_hits: Option<usize>,
    short_circuit: bool,
}

impl ComposerConfigBuilder {
    /// Enables caching with the given configuration.
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the per-query hit limit.
    pub fn with_max_hits(mut self, max_hits: usize) -> Self {
        self.max_hits = Some(max_hits);
        self
    }

    /// Enables or disables short-circuiting on an empty intersection.
    pub fn with_short_circuit(mut self, short_circuit: bool) -> Self {
        self.short_circuit = short_circuit;
        self
    }

    /// Builds the ComposerConfig.
    pub fn build(self) -> ComposerConfig {
        ComposerConfig {
            cache: self.cache,
            parallel: self.parallel,
            max_hits: self.max_hits,
            short_circuit: self.short_circuit,
        }
    }
}

/// Configuration for the predicate result cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached predicate results.
    pub max_entries: usize,
    /// Time-to-live for cached entries.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Duration::from_secs(300),
        }
    }
}
