//! Collaborator traits the engine queries.
//!
//! The engine never talks to a search backend directly. It is handed a
//! [`DocumentIndex`] for predicate evaluation and, in the patient search
//! pipeline, an [`IdentifierResolver`] for examination → patient
//! translation. Implement both for your backend in the consuming crate;
//! [`MemoryIndex`](crate::MemoryIndex) is an in-process implementation.
//!
//! # Example: wrapping a search client
//!
//! ```ignore
//! use clinical_filter_executor::{Document, DocumentIndex, DocumentQuery, QueryError};
//!
//! impl DocumentIndex for SearchClient {
//!     fn query(&self, query: &DocumentQuery) -> Result<Vec<Document>, QueryError> {
//!         let body = to_bool_query(&query.predicate);
//!         self.search(&query.collection, body, query.max_hits)
//!             .map_err(|e| QueryError::Unavailable(e.to_string()))
//!     }
//! }
//! ```

use chrono::NaiveDateTime;
use clinical_filter::{CategoryFieldMap, IdentifierSet, Predicate};
use serde::{Deserialize, Serialize};

/// Source fields of one document hit.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// One structured predicate evaluation against a named collection.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
    /// Collection (index) to search.
    pub collection: String,
    /// Predicate every hit must satisfy.
    pub predicate: Predicate,
    /// Field holding the examination identifier on each hit.
    pub id_field: String,
    /// Maximum number of hits to return (None = backend default).
    pub max_hits: Option<usize>,
}

impl DocumentQuery {
    /// Builds the query for a predicate of the given field map.
    pub fn new(field_map: &CategoryFieldMap, predicate: Predicate, max_hits: Option<usize>) -> Self {
        Self {
            collection: field_map.collection().to_string(),
            predicate,
            id_field: field_map.id_field().to_string(),
            max_hits,
        }
    }
}

/// A searchable document store.
///
/// Implementations must be safe to call concurrently and should bound the
/// time of each call, reporting overruns as
/// [`QueryError::Timeout`](crate::QueryError::Timeout). The engine issues no
/// writes and does not retry.
pub trait DocumentIndex: Send + Sync {
    /// Executes one predicate and returns the matching documents.
    fn query(&self, query: &DocumentQuery) -> Result<Vec<Document>, crate::QueryError>;
}

/// Patient fields returned to callers.
///
/// Decoding is lenient per column: identifiers and text columns accept
/// strings or numbers, nulls decode as empty, and the birth date accepts a
/// date with or without a time of day. One sparse row never fails a whole
/// patient list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PatientRecord {
    /// Patient identifier.
    #[serde(default, deserialize_with = "wire::scalar_text")]
    pub id: String,
    /// Given name.
    #[serde(default, deserialize_with = "wire::scalar_text")]
    pub name: String,
    /// Family name.
    #[serde(default, deserialize_with = "wire::scalar_text")]
    pub last_name: String,
    /// Gender as recorded.
    #[serde(default, deserialize_with = "wire::scalar_text")]
    pub gender: String,
    /// National identity number.
    #[serde(default, deserialize_with = "wire::scalar_text")]
    pub identity_number: String,
    /// Date of birth (None when not recorded).
    #[serde(default, deserialize_with = "wire::birth_date")]
    pub birth_date: Option<NaiveDateTime>,
    /// Contact e-mail.
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone number.
    #[serde(default)]
    pub phone_number: Option<String>,
}

mod wire {
    use chrono::{NaiveDate, NaiveDateTime};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    /// String or number; null becomes the empty string.
    pub fn scalar_text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(String::new()),
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(D::Error::custom(format!(
                "expected a string or number, got {}",
                other
            ))),
        }
    }

    /// Date-time, bare date (midnight) or null.
    pub fn birth_date<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(text) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        DATE_TIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("unrecognized birth date `{}`", text)))
    }
}

/// Translates examination identifiers to patients.
pub trait IdentifierResolver: Send + Sync {
    /// Maps examination identifiers to the identifiers of their patients.
    ///
    /// Returns [`ResolveError::NotFound`](crate::ResolveError::NotFound) when
    /// `examination_ids` is empty.
    fn examinations_to_patients(
        &self,
        examination_ids: &IdentifierSet,
    ) -> Result<IdentifierSet, crate::ResolveError>;

    /// Loads full records for the given patient identifiers.
    fn patients_by_id(
        &self,
        patient_ids: &IdentifierSet,
    ) -> Result<Vec<PatientRecord>, crate::ResolveError>;

    /// Loads the whole patient population.
    fn all_patients(&self) -> Result<Vec<PatientRecord>, crate::ResolveError>;
}
