//! Patient search: compose a selection, then resolve it to patient records.

use clinical_filter::{FilterSelection, IdentifierSet};

use crate::composer::FilterComposer;
use crate::error::{ExecutorResult, ResolveError};
use crate::result::CandidateSet;
use crate::traits::{IdentifierResolver, PatientRecord};

/// Patients returned by a search.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientSearchResult {
    /// Matching patients, in resolver order.
    pub patients: Vec<PatientRecord>,
    /// False when no category constrained the search and the whole
    /// population was returned.
    pub filtered: bool,
}

impl PatientSearchResult {
    /// Number of patients returned.
    pub fn len(&self) -> usize {
        self.patients.len()
    }

    /// Returns true if no patient matched.
    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }
}

/// The patient search pipeline.
///
/// 1. compose the selection into examination identifiers;
/// 2. unconstrained → the full population;
/// 3. no match → an empty list, without touching the resolver;
/// 4. otherwise examinations → patient ids → patient records.
pub struct PatientSearch<'a> {
    composer: &'a FilterComposer<'a>,
    resolver: &'a dyn IdentifierResolver,
}

impl<'a> PatientSearch<'a> {
    /// Creates a pipeline over a composer and a resolver.
    pub fn new(composer: &'a FilterComposer<'a>, resolver: &'a dyn IdentifierResolver) -> Self {
        Self { composer, resolver }
    }

    /// Runs the pipeline for a selection.
    pub fn search(&self, selection: &FilterSelection) -> ExecutorResult<PatientSearchResult> {
        let composed = self.composer.compose(selection);

        let examination_ids = match composed.candidates {
            CandidateSet::Unconstrained => {
                tracing::debug!("unconstrained selection, returning all patients");
                return Ok(PatientSearchResult {
                    patients: self.resolver.all_patients()?,
                    filtered: false,
                });
            }
            CandidateSet::Matched(ids) if ids.is_empty() => {
                tracing::debug!("selection matched no examinations");
                return Ok(PatientSearchResult {
                    patients: Vec::new(),
                    filtered: true,
                });
            }
            CandidateSet::Matched(ids) => ids,
        };

        let patient_ids = match self.resolver.examinations_to_patients(&examination_ids) {
            Ok(ids) => ids,
            Err(ResolveError::NotFound) => IdentifierSet::new(),
            Err(err) => return Err(err.into()),
        };
        if patient_ids.is_empty() {
            tracing::debug!(
                examinations = examination_ids.len(),
                "matched examinations belong to no known patient"
            );
            return Ok(PatientSearchResult {
                patients: Vec::new(),
                filtered: true,
            });
        }

        let patients = self.resolver.patients_by_id(&patient_ids)?;
        tracing::debug!(
            examinations = examination_ids.len(),
            patients = patients.len(),
            "patient search finished"
        );
        Ok(PatientSearchResult {
            patients,
            filtered: true,
        })
    }

    /// Decodes a wire selection and runs the pipeline.
    pub fn search_json(&self, json: &str) -> ExecutorResult<PatientSearchResult> {
        let selection = FilterSelection::from_json(json)?;
        self.search(&selection)
    }
}
