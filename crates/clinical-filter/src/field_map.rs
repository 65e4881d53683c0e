//! Per-category token → predicate tables.

use std::collections::HashMap;

use crate::error::{FilterError, FilterResult};
use crate::predicate::{FieldValue, Predicate};
use crate::Category;

/// Default name of the examination identifier field on every document.
pub const EXAMINATION_ID_FIELD: &str = "ExaminationId";

/// How a field map compares requested tokens with its keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenCase {
    /// Tokens must match keys exactly.
    #[default]
    Sensitive,
    /// Keys are stored lower-cased and tokens are lower-cased before lookup.
    Insensitive,
}

impl TokenCase {
    /// Normalizes a token according to this rule.
    pub fn normalize(&self, token: &str) -> String {
        match self {
            TokenCase::Sensitive => token.to_string(),
            TokenCase::Insensitive => token.to_lowercase(),
        }
    }
}

/// Immutable mapping from recognized value tokens to predicates for one
/// category.
///
/// # Example
///
/// ```rust
/// use clinical_filter::{Category, CategoryFieldMap, TokenCase};
///
/// let map = CategoryFieldMap::builder(Category::Biopsy, "biopcy")
///     .token_case(TokenCase::Insensitive)
///     .exists("hai", ["HAI1", "HAI2", "HAI3"])
///     .build()
///     .unwrap();
///
/// assert!(map.recognizes("HAI"));
/// assert!(!map.recognizes("unknown"));
/// ```
#[derive(Debug, Clone)]
pub struct CategoryFieldMap {
    category: Category,
    collection: String,
    id_field: String,
    token_case: TokenCase,
    entries: HashMap<String, Predicate>,
    /// Normalized tokens in declaration order.
    order: Vec<String>,
}

impl CategoryFieldMap {
    /// Starts building a field map for `category` backed by `collection`.
    pub fn builder(category: Category, collection: impl Into<String>) -> CategoryFieldMapBuilder {
        CategoryFieldMapBuilder {
            category,
            collection: collection.into(),
            id_field: EXAMINATION_ID_FIELD.to_string(),
            token_case: TokenCase::default(),
            entries: Vec::new(),
        }
    }

    /// Category this map belongs to.
    pub fn category(&self) -> Category {
        self.category
    }

    /// Document collection queried for this category.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Field holding the examination identifier on every document.
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Token comparison rule.
    pub fn token_case(&self) -> TokenCase {
        self.token_case
    }

    /// Resolves a requested token to its predicate.
    pub fn resolve(&self, token: &str) -> Option<&Predicate> {
        self.entries.get(&self.token_case.normalize(token))
    }

    /// Returns true if the token resolves to a predicate.
    pub fn recognizes(&self, token: &str) -> bool {
        self.resolve(token).is_some()
    }

    /// Iterates the normalized tokens in declaration order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of recognized tokens.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map recognizes no token.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder for [`CategoryFieldMap`].
#[derive(Debug, Clone)]
pub struct CategoryFieldMapBuilder {
    category: Category,
    collection: String,
    id_field: String,
    token_case: TokenCase,
    entries: Vec<(String, Predicate)>,
}

impl CategoryFieldMapBuilder {
    /// Sets the token comparison rule.
    pub fn token_case(mut self, token_case: TokenCase) -> Self {
        self.token_case = token_case;
        self
    }

    /// Overrides the identifier field (defaults to [`EXAMINATION_ID_FIELD`]).
    pub fn id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    /// Maps `token` to an arbitrary predicate.
    pub fn predicate(mut self, token: impl Into<String>, predicate: Predicate) -> Self {
        self.entries.push((token.into(), predicate));
        self
    }

    /// Maps `token` to an existence check over any of `fields`.
    pub fn exists<I, S>(self, token: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.predicate(token, Predicate::exists(fields))
    }

    /// Maps `token` to an equality check.
    pub fn equals(
        self,
        token: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Self {
        self.predicate(token, Predicate::equals(field, value))
    }

    /// Maps `token` to a strictly-greater-than check.
    pub fn greater_than(
        self,
        token: impl Into<String>,
        field: impl Into<String>,
        bound: f64,
    ) -> Self {
        self.predicate(token, Predicate::greater_than(field, bound))
    }

    /// Maps `token` to a compound exists-and-equals check over any of `fields`.
    pub fn exists_and_equals<I, S>(
        self,
        token: impl Into<String>,
        fields: I,
        value: impl Into<FieldValue>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.predicate(token, Predicate::exists_and_equals(fields, value))
    }

    /// Validates and builds the map.
    ///
    /// Fails when a field set is empty, a name is blank, or two tokens
    /// collide after case normalization.
    pub fn build(self) -> FilterResult<CategoryFieldMap> {
        let category = self.category;
        if self.collection.trim().is_empty() {
            return Err(FilterError::invalid_field_map(category, "blank collection name"));
        }
        if self.id_field.trim().is_empty() {
            return Err(FilterError::invalid_field_map(category, "blank identifier field"));
        }

        let mut entries = HashMap::with_capacity(self.entries.len());
        let mut order = Vec::with_capacity(self.entries.len());
        for (token, predicate) in self.entries {
            let key = self.token_case.normalize(token.trim());
            if key.is_empty() {
                return Err(FilterError::invalid_field_map(category, "blank token"));
            }
            let fields = predicate.fields();
            if fields.is_empty() {
                return Err(FilterError::invalid_field_map(
                    category,
                    format!("token `{}` has no fields", key),
                ));
            }
            if fields.iter().any(|f| f.trim().is_empty()) {
                return Err(FilterError::invalid_field_map(
                    category,
                    format!("token `{}` has a blank field name", key),
                ));
            }
            if let Predicate::GreaterThan { bound, .. } = &predicate {
                if !bound.is_finite() {
                    return Err(FilterError::invalid_field_map(
                        category,
                        format!("token `{}` has a non-finite bound", key),
                    ));
                }
            }
            if entries.contains_key(&key) {
                return Err(FilterError::invalid_field_map(
                    category,
                    format!("duplicate token `{}`", key),
                ));
            }
            order.push(key.clone());
            entries.insert(key, predicate);
        }

        Ok(CategoryFieldMap {
            category,
            collection: self.collection,
            id_field: self.id_field,
            token_case: self.token_case,
            entries,
            order,
        })
    }
}
