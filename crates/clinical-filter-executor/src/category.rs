//! Category-level filtering: fan out one predicate per token, then intersect.

use clinical_filter::{Category, CategoryFieldMap, IdentifierSet};

use crate::cache::PredicateCache;
use crate::result::{intersect, EvaluationStats};
use crate::strategy::{PredicateStrategy, TokenOutcome};
use crate::traits::DocumentIndex;

/// Shared, read-only inputs for evaluating category filters.
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// Index queried by every predicate.
    pub index: &'a dyn DocumentIndex,
    /// Optional result cache.
    pub cache: Option<&'a PredicateCache>,
    /// Hit limit passed with every query.
    pub max_hits: Option<usize>,
    /// Evaluate tokens concurrently (requires `parallel` feature).
    pub parallel: bool,
}

impl<'a> EvaluationContext<'a> {
    /// Sequential, uncached context over `index`.
    pub fn new(index: &'a dyn DocumentIndex) -> Self {
        Self {
            index,
            cache: None,
            max_hits: None,
            parallel: false,
        }
    }
}

/// Filter for one category, parameterized entirely by its field map.
///
/// Requested tokens are validated against the map, unknown ones dropped,
/// and every recognized token evaluated independently. Per-token results
/// combine by [`intersect_non_empty`]: empty token results (including
/// failed queries) are ignored, the rest intersected.
#[derive(Debug, Clone)]
pub struct CategoryFilter {
    field_map: CategoryFieldMap,
}

impl CategoryFilter {
    /// Creates a filter from a field map.
    pub fn new(field_map: CategoryFieldMap) -> Self {
        Self { field_map }
    }

    /// Category this filter serves.
    pub fn category(&self) -> Category {
        self.field_map.category()
    }

    /// The underlying field map.
    pub fn field_map(&self) -> &CategoryFieldMap {
        &self.field_map
    }

    /// Tokens from `values` the field map recognizes, in request order.
    pub fn recognized_tokens<'v>(&self, values: &'v [String]) -> Vec<&'v str> {
        values
            .iter()
            .map(String::as_str)
            .filter(|token| self.field_map.recognizes(token))
            .collect()
    }

    /// Returns the examination identifiers matching `values`.
    pub fn filter(&self, index: &dyn DocumentIndex, values: &[String]) -> IdentifierSet {
        self.filter_detailed(&EvaluationContext::new(index), values).0
    }

    /// Like [`filter`](Self::filter), with an explicit context and counters.
    pub fn filter_detailed(
        &self,
        ctx: &EvaluationContext<'_>,
        values: &[String],
    ) -> (IdentifierSet, EvaluationStats) {
        let mut stats = EvaluationStats {
            tokens_requested: values.len(),
            ..EvaluationStats::default()
        };

        let tokens = self.recognized_tokens(values);
        stats.tokens_recognized = tokens.len();
        if tokens.is_empty() {
            tracing::debug!(
                category = %self.category(),
                requested = values.len(),
                "no recognized tokens"
            );
            return (IdentifierSet::new(), stats);
        }

        let strategy = PredicateStrategy::new(ctx.index, &self.field_map)
            .with_cache(ctx.cache)
            .with_max_hits(ctx.max_hits);
        let outcomes: Vec<TokenOutcome> =
            map_maybe_parallel(ctx.parallel, &tokens, |token| strategy.evaluate_detailed(token));

        for outcome in &outcomes {
            stats.predicates_evaluated += 1;
            stats.predicate_failures += usize::from(outcome.failed);
            stats.cache_hits += usize::from(outcome.cache_hit);
        }

        let ids = intersect_non_empty(outcomes.into_iter().map(|outcome| outcome.ids));
        tracing::debug!(
            category = %self.category(),
            tokens = stats.tokens_recognized,
            failures = stats.predicate_failures,
            matched = ids.len(),
            "category filter evaluated"
        );
        (ids, stats)
    }
}

/// Intersects every non-empty set; empty sets are ignored.
///
/// Returns the empty set when no input set is non-empty.
pub fn intersect_non_empty<I>(sets: I) -> IdentifierSet
where
    I: IntoIterator<Item = IdentifierSet>,
{
    sets.into_iter()
        .filter(|set| !set.is_empty())
        .reduce(intersect)
        .unwrap_or_default()
}

/// Maps `f` over `items`, on the rayon pool when `parallel` is set.
#[cfg(feature = "parallel")]
pub(crate) fn map_maybe_parallel<T, R, F>(parallel: bool, items: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    use rayon::prelude::*;

    if parallel && items.len() > 1 {
        items.par_iter().map(f).collect()
    } else {
        items.iter().map(f).collect()
    }
}

/// Maps `f` over `items` sequentially.
#[cfg(not(feature = "parallel"))]
pub(crate) fn map_maybe_parallel<T, R, F>(_parallel: bool, items: &[T], f: F) -> Vec<R>
where
    F: Fn(&T) -> R,
{
    items.iter().map(f).collect()
}
