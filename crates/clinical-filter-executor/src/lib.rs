//! # clinical-filter-executor
//!
//! Multi-criteria filter composition over clinical document indexes.
//!
//! A caller selects values per category (biopsy scores, serology markers,
//! vaccinations, ...). Every value token resolves to one predicate against
//! that category's document collection; categories are evaluated
//! independently and their examination identifiers intersected. The engine
//! keeps "nothing selected" ([`CandidateSet::Unconstrained`]) apart from
//! "selected, nothing matched" (an empty [`CandidateSet::Matched`]).
//!
//! ## Key Features
//!
//! - **Backend agnostic** - implement [`DocumentIndex`] and
//!   [`IdentifierResolver`] for your search cluster, or use [`MemoryIndex`]
//! - **Failure tolerant** - a failed predicate query narrows the result
//!   instead of failing the request
//! - **Configurable caching** - LRU cache for repeated predicates
//! - **Optional parallelism** - enable the `parallel` feature to evaluate
//!   tokens and categories on the rayon pool
//!
//! ## Quick Start
//!
//! ```rust
//! use clinical_filter::{Category, FilterSelection};
//! use clinical_filter_executor::{FilterComposer, MemoryIndex};
//! use serde_json::json;
//!
//! let index = MemoryIndex::new()
//!     .with_documents("biopcy", vec![
//!         json!({"ExaminationId": "E1", "HAI1": 5}),
//!         json!({"ExaminationId": "E2", "Fibrosis2": 3}),
//!     ])
//!     .unwrap();
//!
//! let composer = FilterComposer::new(&index).unwrap();
//! let selection = FilterSelection::new().with(Category::Biopsy, ["hai"]);
//!
//! let result = composer.compose(&selection);
//! assert_eq!(result.to_vec(), vec!["E1".to_string()]);
//! ```
//!
//! ## With Configuration
//!
//! ```ignore
//! use clinical_filter_executor::{CacheConfig, ComposerConfig, FilterComposer};
//! use std::time::Duration;
//!
//! let config = ComposerConfig::builder()
//!     .with_cache(CacheConfig {
//!         max_entries: 10_000,
//!         ttl: Duration::from_secs(300),
//!     })
//!     .with_parallel(true)
//!     .with_max_hits(10_000)
//!     .build();
//!
//! let composer = FilterComposer::with_config(&index, config)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel` - Enables parallel predicate evaluation using rayon
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   clinical-filter-executor                    │
//! │                                                               │
//! │  PatientSearch                                                │
//! │  └── FilterComposer                                           │
//! │      ├── CategoryFilter (one per registered category)         │
//! │      │   └── PredicateStrategy: token → DocumentQuery         │
//! │      │       └── DocumentIndex (+ PredicateCache)             │
//! │      ├── intersect contributions → CandidateSet               │
//! │      └── return ComposedResult with stats                     │
//! │  └── IdentifierResolver: examinations → patients → records    │
//! │                                                               │
//! │  Dependencies:                                                │
//! │  └── clinical-filter - categories, predicates, field maps     │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod cache;
pub mod catalog;
mod category;
mod composer;
mod config;
mod error;
mod memory;
mod planner;
mod result;
mod search;
mod strategy;
mod traits;

// Public re-exports
pub use cache::{CacheStats, PredicateCache};
pub use category::{intersect_non_empty, CategoryFilter, EvaluationContext};
pub use composer::FilterComposer;
pub use config::{CacheConfig, ComposerConfig, ComposerConfigBuilder};
pub use error::{ExecutorError, ExecutorResult, QueryError, ResolveError};
pub use memory::{matches_predicate, MemoryIndex, PATIENT_ID_FIELD, RECORD_ID_FIELD};
pub use planner::{CompositionPlan, PlanStep, PlannedPredicate};
pub use result::{CandidateSet, ComposedResult, CompositionStats, EvaluationStats};
pub use search::{PatientSearch, PatientSearchResult};
pub use strategy::{extract_identifiers, identifier_text, PredicateStrategy};
pub use traits::{Document, DocumentIndex, DocumentQuery, IdentifierResolver, PatientRecord};

// Re-export commonly used types from dependencies for convenience
pub use clinical_filter::{Category, FilterSelection, IdentifierSet};
