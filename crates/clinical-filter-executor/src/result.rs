//! Result types for filter composition.

use std::ops::AddAssign;
use std::time::Duration;

use clinical_filter::IdentifierSet;

/// Outcome of composing a selection.
///
/// `Unconstrained` means no category was selected and the caller should fall
/// back to the full population. `Matched` carries the intersection of every
/// selected category, which may legitimately be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSet {
    /// No constraint was evaluated.
    Unconstrained,
    /// At least one category was evaluated.
    Matched(IdentifierSet),
}

impl CandidateSet {
    /// Returns true if no constraint was evaluated.
    pub fn is_unconstrained(&self) -> bool {
        matches!(self, CandidateSet::Unconstrained)
    }

    /// Returns true if constraints were evaluated and nothing matched.
    pub fn is_no_match(&self) -> bool {
        matches!(self, CandidateSet::Matched(ids) if ids.is_empty())
    }

    /// The matched identifiers, or None when unconstrained.
    pub fn ids(&self) -> Option<&IdentifierSet> {
        match self {
            CandidateSet::Unconstrained => None,
            CandidateSet::Matched(ids) => Some(ids),
        }
    }

    /// Consumes the set, returning the matched identifiers.
    pub fn into_ids(self) -> Option<IdentifierSet> {
        match self {
            CandidateSet::Unconstrained => None,
            CandidateSet::Matched(ids) => Some(ids),
        }
    }

    /// Intersects another category's contribution into this running result.
    ///
    /// The first contribution initializes the result.
    pub fn intersect(self, contribution: IdentifierSet) -> CandidateSet {
        match self {
            CandidateSet::Unconstrained => CandidateSet::Matched(contribution),
            CandidateSet::Matched(current) => CandidateSet::Matched(intersect(current, contribution)),
        }
    }
}

/// Intersects two sets, iterating the smaller one.
pub(crate) fn intersect(a: IdentifierSet, b: IdentifierSet) -> IdentifierSet {
    let (mut small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.retain(|id| large.contains(id));
    small
}

/// Counters collected while evaluating predicates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationStats {
    /// Tokens supplied by the caller.
    pub tokens_requested: usize,
    /// Tokens recognized by a field map.
    pub tokens_recognized: usize,
    /// Predicates answered by the index or the cache.
    pub predicates_evaluated: usize,
    /// Predicates whose query failed and counted as no matches.
    pub predicate_failures: usize,
    /// Predicates served from the cache.
    pub cache_hits: usize,
}

impl AddAssign for EvaluationStats {
    fn add_assign(&mut self, other: Self) {
        self.tokens_requested += other.tokens_requested;
        self.tokens_recognized += other.tokens_recognized;
        self.predicates_evaluated += other.predicates_evaluated;
        self.predicate_failures += other.predicate_failures;
        self.cache_hits += other.cache_hits;
    }
}

/// Statistics from one composition.
#[derive(Debug, Clone, Default)]
pub struct CompositionStats {
    /// Total composition duration.
    pub duration: Duration,
    /// Number of categories whose filter ran.
    pub categories_evaluated: usize,
    /// Predicate counters across all categories.
    pub evaluation: EvaluationStats,
}

/// Result of composing a selection: the candidate set and statistics.
#[derive(Debug, Clone)]
pub struct ComposedResult {
    /// Composed examination identifiers.
    pub candidates: CandidateSet,
    /// Composition statistics.
    pub stats: CompositionStats,
}

impl ComposedResult {
    /// Creates a new ComposedResult.
    pub fn new(candidates: CandidateSet, stats: CompositionStats) -> Self {
        Self { candidates, stats }
    }

    /// Number of matched identifiers (0 when unconstrained).
    pub fn count(&self) -> usize {
        self.candidates.ids().map_or(0, |ids| ids.len())
    }

    /// Checks whether an examination identifier is in the matched set.
    pub fn contains(&self, examination_id: &str) -> bool {
        self.candidates
            .ids()
            .is_some_and(|ids| ids.contains(examination_id))
    }

    /// Matched identifiers as a sorted Vec (empty when unconstrained).
    pub fn to_vec(&self) -> Vec<String> {
        let mut vec: Vec<String> = self
            .candidates
            .ids()
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default();
        vec.sort_unstable();
        vec
    }
}
