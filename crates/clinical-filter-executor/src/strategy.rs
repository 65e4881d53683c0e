//! Predicate evaluation for single value tokens.

use clinical_filter::{CategoryFieldMap, IdentifierSet};
use serde_json::Value;

use crate::cache::PredicateCache;
use crate::error::QueryError;
use crate::traits::{Document, DocumentIndex, DocumentQuery};

/// What happened when one token was evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TokenOutcome {
    pub ids: IdentifierSet,
    pub recognized: bool,
    pub cache_hit: bool,
    pub failed: bool,
}

/// Translates value tokens of one category into index queries.
///
/// Each recognized token issues exactly one [`DocumentQuery`]. Unknown
/// tokens produce an empty set without touching the index.
///
/// [`try_evaluate`](Self::try_evaluate) reports query failures;
/// [`evaluate`](Self::evaluate) logs them and substitutes an empty set, so a
/// flaky backend narrows results instead of failing the request.
///
/// # Example
///
/// ```ignore
/// let strategy = PredicateStrategy::new(&index, &biopsy_map);
/// let ids = strategy.evaluate("hai");
/// ```
pub struct PredicateStrategy<'a> {
    index: &'a dyn DocumentIndex,
    field_map: &'a CategoryFieldMap,
    cache: Option<&'a PredicateCache>,
    max_hits: Option<usize>,
}

impl<'a> PredicateStrategy<'a> {
    /// Creates a strategy for `field_map` against `index`.
    pub fn new(index: &'a dyn DocumentIndex, field_map: &'a CategoryFieldMap) -> Self {
        Self {
            index,
            field_map,
            cache: None,
            max_hits: None,
        }
    }

    /// Uses `cache` for successful results.
    pub fn with_cache(mut self, cache: Option<&'a PredicateCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Passes a hit limit with every query.
    pub fn with_max_hits(mut self, max_hits: Option<usize>) -> Self {
        self.max_hits = max_hits;
        self
    }

    /// Builds the query for a token, or None if the token is unknown.
    pub fn query_for(&self, token: &str) -> Option<DocumentQuery> {
        self.field_map
            .resolve(token)
            .map(|predicate| DocumentQuery::new(self.field_map, predicate.clone(), self.max_hits))
    }

    /// Evaluates a token, reporting index failures.
    pub fn try_evaluate(&self, token: &str) -> Result<IdentifierSet, QueryError> {
        match self.query_for(token) {
            Some(query) => self.fetch(&query).map(|(ids, _)| ids),
            None => Ok(IdentifierSet::new()),
        }
    }

    /// Evaluates a token, treating index failures as no matches.
    pub fn evaluate(&self, token: &str) -> IdentifierSet {
        self.evaluate_detailed(token).ids
    }

    pub(crate) fn evaluate_detailed(&self, token: &str) -> TokenOutcome {
        let Some(query) = self.query_for(token) else {
            tracing::trace!(
                category = %self.field_map.category(),
                token,
                "unrecognized token dropped"
            );
            return TokenOutcome::default();
        };

        match self.fetch(&query) {
            Ok((ids, cache_hit)) => TokenOutcome {
                ids,
                recognized: true,
                cache_hit,
                failed: false,
            },
            Err(err) => {
                tracing::warn!(
                    category = %self.field_map.category(),
                    token,
                    collection = %query.collection,
                    error = %err,
                    "predicate query failed, treating as no matches"
                );
                TokenOutcome {
                    recognized: true,
                    failed: true,
                    ..TokenOutcome::default()
                }
            }
        }
    }

    /// Runs a query through the cache. Failures are never cached.
    fn fetch(&self, query: &DocumentQuery) -> Result<(IdentifierSet, bool), QueryError> {
        if let Some(ids) = self.cache.and_then(|cache| cache.get(query)) {
            tracing::debug!(
                collection = %query.collection,
                predicate = %query.predicate,
                "predicate cache hit"
            );
            return Ok((ids, true));
        }

        tracing::trace!(
            collection = %query.collection,
            predicate = %query.predicate,
            "querying document index"
        );
        let hits = self.index.query(query)?;
        let ids = extract_identifiers(&hits, &query.id_field);

        if let Some(cache) = self.cache {
            cache.insert(query, ids.clone());
        }

        Ok((ids, false))
    }
}

/// Collects the identifier field of every hit.
///
/// See [`identifier_text`] for which values count as identifiers.
pub fn extract_identifiers(hits: &[Document], id_field: &str) -> IdentifierSet {
    hits.iter()
        .filter_map(|doc| doc.get(id_field).and_then(identifier_text))
        .collect()
}

/// Reads a document identifier.
///
/// Non-empty strings are taken as-is and numbers by their decimal text.
/// Null, empty, boolean and structured values are not identifiers.
pub fn identifier_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
