//! In-process document index.
//!
//! [`MemoryIndex`] holds JSON documents per collection and evaluates
//! predicates by scanning them. It implements both [`DocumentIndex`] and
//! [`IdentifierResolver`], so a whole patient search can run without a
//! search backend: small deployments, fixtures and tests.

use std::collections::HashMap;

use clinical_filter::{FieldValue, IdentifierSet, Predicate};
use serde_json::Value;

use crate::catalog::collections;
use crate::error::{QueryError, ResolveError};
use crate::strategy::identifier_text;
use crate::traits::{Document, DocumentIndex, DocumentQuery, IdentifierResolver, PatientRecord};

/// Identifier field of examination and patient documents.
pub const RECORD_ID_FIELD: &str = "Id";
/// Patient reference on examination documents.
pub const PATIENT_ID_FIELD: &str = "PatientId";

/// Documents grouped by collection.
///
/// # Example
///
/// ```rust
/// use clinical_filter_executor::MemoryIndex;
/// use serde_json::json;
///
/// let mut index = MemoryIndex::new();
/// index.insert("biopcy", json!({"ExaminationId": "E1", "HAI1": 4})).unwrap();
/// assert_eq!(index.collection("biopcy").len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    collections: HashMap<String, Vec<Document>>,
}

impl MemoryIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document; non-object values are rejected.
    pub fn insert(&mut self, collection: &str, document: Value) -> Result<(), QueryError> {
        match document {
            Value::Object(doc) => {
                self.collections
                    .entry(collection.to_string())
                    .or_default()
                    .push(doc);
                Ok(())
            }
            other => Err(QueryError::Malformed(format!(
                "document for '{}' is not an object: {}",
                collection, other
            ))),
        }
    }

    /// Builder-style [`insert`](Self::insert) for many documents.
    pub fn with_documents<I>(mut self, collection: &str, documents: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = Value>,
    {
        for document in documents {
            self.insert(collection, document)?;
        }
        Ok(self)
    }

    /// Documents of a collection (empty if unknown).
    pub fn collection(&self, name: &str) -> &[Document] {
        self.collections.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of documents across all collections.
    pub fn len(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }

    /// Returns true if no document was inserted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn patient_documents(&self) -> &[Document] {
        self.collection(collections::PATIENTS)
    }

    fn to_patient(doc: &Document) -> Result<PatientRecord, ResolveError> {
        serde_json::from_value(Value::Object(doc.clone())).map_err(|e| {
            ResolveError::Query(QueryError::InvalidResponse(format!(
                "patient document: {}",
                e
            )))
        })
    }
}

impl DocumentIndex for MemoryIndex {
    fn query(&self, query: &DocumentQuery) -> Result<Vec<Document>, QueryError> {
        let hits = self
            .collection(&query.collection)
            .iter()
            .filter(|doc| matches_predicate(doc, &query.predicate))
            .take(query.max_hits.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(hits)
    }
}

impl IdentifierResolver for MemoryIndex {
    fn examinations_to_patients(
        &self,
        examination_ids: &IdentifierSet,
    ) -> Result<IdentifierSet, ResolveError> {
        if examination_ids.is_empty() {
            return Err(ResolveError::NotFound);
        }

        let patients: IdentifierSet = self
            .collection(collections::EXAMINATIONS)
            .iter()
            .filter(|doc| {
                record_id(doc, RECORD_ID_FIELD).is_some_and(|id| examination_ids.contains(&id))
            })
            .filter_map(|doc| record_id(doc, PATIENT_ID_FIELD))
            .collect();
        Ok(patients)
    }

    fn patients_by_id(&self, patient_ids: &IdentifierSet) -> Result<Vec<PatientRecord>, ResolveError> {
        if patient_ids.is_empty() {
            return Err(ResolveError::NotFound);
        }

        self.patient_documents()
            .iter()
            .filter(|doc| {
                record_id(doc, RECORD_ID_FIELD).is_some_and(|id| patient_ids.contains(&id))
            })
            .map(Self::to_patient)
            .collect()
    }

    fn all_patients(&self) -> Result<Vec<PatientRecord>, ResolveError> {
        self.patient_documents().iter().map(Self::to_patient).collect()
    }
}

/// Evaluates a predicate against one document.
pub fn matches_predicate(doc: &Document, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Exists { fields } => fields.iter().any(|f| is_present(doc.get(f))),
        Predicate::Equals { field, value } => equals(doc.get(field), value),
        Predicate::GreaterThan { field, bound } => {
            numeric(doc.get(field)).is_some_and(|n| n > *bound)
        }
        Predicate::ExistsAndEquals { fields, value } => fields
            .iter()
            .any(|f| is_present(doc.get(f)) && equals(doc.get(f), value)),
    }
}

fn is_present(value: Option<&Value>) -> bool {
    !matches!(value, None | Some(Value::Null))
}

fn equals(actual: Option<&Value>, expected: &FieldValue) -> bool {
    match expected {
        FieldValue::Integer(i) => numeric(actual) == Some(*i as f64),
        FieldValue::Decimal(d) => numeric(actual) == Some(*d),
        FieldValue::Text(_) | FieldValue::Bool(_) => {
            comparable_text(actual).is_some_and(|text| text == expected.as_text())
        }
    }
}

/// Numbers, and strings that parse as numbers.
fn numeric(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Identifier fields follow the same rule as index hits.
fn record_id(doc: &Document, field: &str) -> Option<String> {
    doc.get(field).and_then(identifier_text)
}

/// Scalar text for equality checks; booleans compare as `true`/`false`.
fn comparable_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
