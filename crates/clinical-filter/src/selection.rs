//! Per-request filter selections.

use std::collections::{BTreeMap, HashMap};

#[cfg(feature = "serde")]
use crate::error::{FilterError, FilterResult};
use crate::Category;

/// Requested values per category for one filter request.
///
/// Holds at most one entry per category; inserting a category again replaces
/// its values. Value order carries no meaning.
///
/// # Example
///
/// ```rust
/// use clinical_filter::{Category, FilterSelection};
///
/// let selection = FilterSelection::new()
///     .with(Category::Biopsy, ["hai"])
///     .with(Category::VaccineHistory, ["covid"]);
///
/// assert!(selection.is_selected(Category::Biopsy));
/// assert!(!selection.is_selected(Category::Treatment));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    entries: BTreeMap<Category, Vec<String>>,
}

impl FilterSelection {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with<I, S>(mut self, category: Category, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(category, values);
        self
    }

    /// Sets the values for a category, replacing any previous entry.
    pub fn insert<I, S>(&mut self, category: Category, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .insert(category, values.into_iter().map(Into::into).collect());
    }

    /// Builds a selection from wire keys and values.
    ///
    /// Keys are mapped with [`Category::from_key`]; unknown keys are ignored.
    /// Values of keys that map to the same category are merged.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoIterator<Item = String>,
    {
        let mut selection = Self::new();
        for (key, values) in pairs {
            if let Some(category) = Category::from_key(key.as_ref()) {
                selection.entries.entry(category).or_default().extend(values);
            }
        }
        selection
    }

    /// Decodes a flat `{"Category": ["value", ...]}` JSON object.
    ///
    /// Unknown keys are ignored and `null` values count as no values. A
    /// `null` or non-object document, values that are not string arrays, and
    /// two keys naming the same category (`"Biopsy"` and `"biopcy"`, or a
    /// repeated key) are rejected.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> FilterResult<Self> {
        let pairs: Option<wire::Pairs> = serde_json::from_str(json)
            .map_err(|e| FilterError::InvalidSelection(e.to_string()))?;
        let wire::Pairs(pairs) = pairs
            .ok_or_else(|| FilterError::InvalidSelection("selection is null".to_string()))?;

        let mut seen: BTreeMap<Category, String> = BTreeMap::new();
        for (key, _) in &pairs {
            let Some(category) = Category::from_key(key) else {
                continue;
            };
            if let Some(first) = seen.get(&category) {
                return Err(FilterError::InvalidSelection(format!(
                    "keys `{}` and `{}` both select {}",
                    first, key, category
                )));
            }
            seen.insert(category, key.clone());
        }

        Ok(Self::from_pairs(
            pairs
                .into_iter()
                .map(|(key, values)| (key, values.unwrap_or_default())),
        ))
    }

    /// Values requested for a category (empty when absent).
    pub fn values(&self, category: Category) -> &[String] {
        self.entries
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns true if at least one value was supplied for the category.
    pub fn is_selected(&self, category: Category) -> bool {
        !self.values(category).is_empty()
    }

    /// Returns true if no category is selected.
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }

    /// Selected categories in canonical order.
    pub fn selected_categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.entries
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(category, _)| *category)
    }

    /// Returns every category keyed by its canonical name, absent ones with
    /// no values.
    pub fn to_map(&self) -> HashMap<String, Vec<String>> {
        Category::ALL
            .iter()
            .map(|category| (category.name().to_string(), self.values(*category).to_vec()))
            .collect()
    }
}

/// Selection objects decoded entry by entry so repeated keys stay visible.
#[cfg(feature = "serde")]
mod wire {
    use std::fmt;

    use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};

    pub(super) struct Pairs(pub(super) Vec<(String, Option<Vec<String>>)>);

    impl<'de> Deserialize<'de> for Pairs {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserializer.deserialize_map(PairsVisitor)
        }
    }

    struct PairsVisitor;

    impl<'de> Visitor<'de> for PairsVisitor {
        type Value = Pairs;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a JSON object")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Pairs, A::Error> {
            let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(key) = map.next_key::<String>()? {
                let values = map
                    .next_value::<Option<Vec<String>>>()
                    .map_err(|e| de::Error::custom(format!("values for `{}`: {}", key, e)))?;
                pairs.push((key, values));
            }
            Ok(Pairs(pairs))
        }
    }
}
