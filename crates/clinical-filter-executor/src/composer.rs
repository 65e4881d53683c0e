//! Filter composition across categories.

use std::sync::Arc;
use std::time::Instant;

use clinical_filter::{Category, FilterSelection};

use crate::cache::PredicateCache;
use crate::catalog;
use crate::category::{map_maybe_parallel, CategoryFilter, EvaluationContext};
use crate::config::ComposerConfig;
use crate::error::{ExecutorError, ExecutorResult};
use crate::planner::{CompositionPlan, PlanStep, PlannedPredicate};
use crate::result::{CandidateSet, ComposedResult, CompositionStats, EvaluationStats};
use crate::traits::DocumentIndex;

type SelectionPredicate = Box<dyn Fn(&FilterSelection) -> bool + Send + Sync>;

struct Registration {
    filter: CategoryFilter,
    is_selected: SelectionPredicate,
}

/// Main composition engine.
///
/// Holds an ordered list of category filters, each paired with a predicate
/// deciding whether a selection engages it. Composing a selection evaluates
/// every engaged filter and intersects their results:
///
/// - nothing engaged → [`CandidateSet::Unconstrained`] (callers fall back to
///   the full population);
/// - otherwise → [`CandidateSet::Matched`] with the intersection, which may be
///   empty.
///
/// Index failures never fail a composition; they narrow it (see
/// [`PredicateStrategy`](crate::PredicateStrategy)).
///
/// # Example
///
/// ```ignore
/// use clinical_filter::{Category, FilterSelection};
/// use clinical_filter_executor::FilterComposer;
///
/// let composer = FilterComposer::new(&index)?;
/// let selection = FilterSelection::new()
///     .with(Category::Biopsy, ["hai"])
///     .with(Category::VaccineHistory, ["covid"]);
///
/// let result = composer.compose(&selection);
/// println!("{} examinations match", result.count());
/// ```
pub struct FilterComposer<'a> {
    index: &'a dyn DocumentIndex,
    config: ComposerConfig,
    cache: Option<Arc<PredicateCache>>,
    registrations: Vec<Registration>,
}

impl<'a> FilterComposer<'a> {
    /// Creates a composer with the standard catalog and default configuration.
    pub fn new(index: &'a dyn DocumentIndex) -> ExecutorResult<Self> {
        Self::with_config(index, ComposerConfig::default())
    }

    /// Creates a composer with the standard catalog and custom configuration.
    pub fn with_config(index: &'a dyn DocumentIndex, config: ComposerConfig) -> ExecutorResult<Self> {
        let composer = catalog::standard_filters()?
            .into_iter()
            .fold(Self::empty_with_config(index, config), Self::register);
        Ok(composer)
    }

    /// Creates a composer with no registered filters.
    pub fn empty(index: &'a dyn DocumentIndex) -> Self {
        Self::empty_with_config(index, ComposerConfig::default())
    }

    /// Creates a composer with no registered filters and custom configuration.
    pub fn empty_with_config(index: &'a dyn DocumentIndex, config: ComposerConfig) -> Self {
        let cache = config
            .cache
            .as_ref()
            .map(|c| Arc::new(PredicateCache::new(c.clone())));
        Self {
            index,
            config,
            cache,
            registrations: Vec::new(),
        }
    }

    /// Registers a filter engaged when its category has at least one value.
    pub fn register(self, filter: CategoryFilter) -> Self {
        let category = filter.category();
        self.register_with(filter, move |selection: &FilterSelection| {
            selection.is_selected(category)
        })
    }

    /// Registers a filter with a custom engagement predicate.
    pub fn register_with<P>(mut self, filter: CategoryFilter, is_selected: P) -> Self
    where
        P: Fn(&FilterSelection) -> bool + Send + Sync + 'static,
    {
        self.registrations.push(Registration {
            filter,
            is_selected: Box::new(is_selected),
        });
        self
    }

    /// Registered categories, in registration order.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.registrations.iter().map(|r| r.filter.category())
    }

    /// Returns a reference to the composer configuration.
    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Returns a reference to the cache if enabled.
    pub fn cache(&self) -> Option<&PredicateCache> {
        self.cache.as_deref()
    }

    /// Composes a selection into a candidate set.
    pub fn compose(&self, selection: &FilterSelection) -> ComposedResult {
        let start = Instant::now();
        self.log_ignored(selection);

        let engaged: Vec<&Registration> = self
            .registrations
            .iter()
            .filter(|r| (r.is_selected)(selection))
            .collect();

        let ctx = self.context();
        let evaluate = |r: &&Registration| {
            r.filter
                .filter_detailed(&ctx, selection.values(r.filter.category()))
        };

        let mut candidates = CandidateSet::Unconstrained;
        let mut evaluation = EvaluationStats::default();
        let mut categories_evaluated = 0;

        if self.config.short_circuit {
            for registration in &engaged {
                if candidates.is_no_match() {
                    tracing::debug!(
                        skipped = engaged.len() - categories_evaluated,
                        "running intersection empty, skipping remaining categories"
                    );
                    break;
                }
                let (ids, stats) = evaluate(registration);
                evaluation += stats;
                categories_evaluated += 1;
                candidates = candidates.intersect(ids);
            }
        } else {
            // every engaged category completes before the intersection is formed
            for (ids, stats) in map_maybe_parallel(self.config.parallel, &engaged, evaluate) {
                evaluation += stats;
                categories_evaluated += 1;
                candidates = candidates.intersect(ids);
            }
        }

        let stats = CompositionStats {
            duration: start.elapsed(),
            categories_evaluated,
            evaluation,
        };
        tracing::debug!(
            categories = categories_evaluated,
            predicates = evaluation.predicates_evaluated,
            failures = evaluation.predicate_failures,
            unconstrained = candidates.is_unconstrained(),
            matched = candidates.ids().map_or(0, |ids| ids.len()),
            "composition finished"
        );

        ComposedResult::new(candidates, stats)
    }

    /// Composes an optional selection; an absent selection is a caller error.
    pub fn try_compose(&self, selection: Option<&FilterSelection>) -> ExecutorResult<ComposedResult> {
        selection
            .map(|selection| self.compose(selection))
            .ok_or_else(|| ExecutorError::InvalidSelection("selection is absent".to_string()))
    }

    /// Decodes a wire selection and composes it.
    ///
    /// A null or malformed document is [`ExecutorError::InvalidSelection`].
    pub fn compose_json(&self, json: &str) -> ExecutorResult<ComposedResult> {
        let selection = FilterSelection::from_json(json)?;
        Ok(self.compose(&selection))
    }

    /// Describes what [`compose`](Self::compose) would evaluate, without
    /// querying the index.
    pub fn explain(&self, selection: &FilterSelection) -> CompositionPlan {
        let steps = self
            .registrations
            .iter()
            .filter(|r| (r.is_selected)(selection))
            .map(|r| {
                let field_map = r.filter.field_map();
                let mut predicates = Vec::new();
                let mut dropped_tokens = Vec::new();
                for token in selection.values(field_map.category()) {
                    match field_map.resolve(token) {
                        Some(predicate) => predicates.push(PlannedPredicate {
                            token: token.clone(),
                            predicate: predicate.clone(),
                        }),
                        None => dropped_tokens.push(token.clone()),
                    }
                }
                PlanStep {
                    category: field_map.category(),
                    collection: field_map.collection().to_string(),
                    predicates,
                    dropped_tokens,
                }
            })
            .collect();

        CompositionPlan {
            steps,
            ignored_categories: self.ignored_categories(selection),
        }
    }

    fn context(&self) -> EvaluationContext<'_> {
        EvaluationContext {
            index: self.index,
            cache: self.cache.as_deref(),
            max_hits: self.config.max_hits,
            parallel: self.config.parallel,
        }
    }

    /// Selected categories no registered filter serves.
    fn ignored_categories(&self, selection: &FilterSelection) -> Vec<Category> {
        selection
            .selected_categories()
            .filter(|category| !self.categories().any(|c| c == *category))
            .collect()
    }

    fn log_ignored(&self, selection: &FilterSelection) {
        for category in self.ignored_categories(selection) {
            tracing::debug!(
                %category,
                reserved = category.is_reserved(),
                "no filter registered for selected category, ignoring"
            );
        }
    }
}

impl std::fmt::Debug for FilterComposer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterComposer")
            .field("categories", &self.categories().collect::<Vec<_>>())
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish()
    }
}
