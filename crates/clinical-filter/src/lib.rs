//! # clinical-filter
//!
//! Data model for multi-criteria filters over clinical examination records.
//!
//! Records live in topic-specific document collections (biopsy, hepatitis B
//! serology, non-invasive tests, vaccination, coinfection, source
//! information). A caller selects values per [`Category`]; each value token
//! resolves through the category's [`CategoryFieldMap`] to one
//! [`Predicate`] shape:
//!
//! | Shape | Matches when |
//! |-------|--------------|
//! | [`Predicate::Exists`] | any listed field is present and non-null |
//! | [`Predicate::Equals`] | the field equals a scalar |
//! | [`Predicate::GreaterThan`] | the field is numeric and above the bound |
//! | [`Predicate::ExistsAndEquals`] | any listed field is present and equals the sentinel |
//!
//! Evaluation against a document index lives in `clinical-filter-executor`.
//!
//! ## Usage
//!
//! ```rust
//! use clinical_filter::{Category, CategoryFieldMap, FilterSelection, TokenCase};
//!
//! let biopsy = CategoryFieldMap::builder(Category::Biopsy, "biopcy")
//!     .token_case(TokenCase::Insensitive)
//!     .exists("hai", ["HAI1", "HAI2", "HAI3"])
//!     .build()
//!     .unwrap();
//!
//! let selection = FilterSelection::new().with(Category::Biopsy, ["HAI"]);
//! let token = &selection.values(Category::Biopsy)[0];
//! assert!(biopsy.resolve(token).is_some());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` - serde derives and [`FilterSelection::from_json`]

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod category;
mod error;
mod field_map;
mod predicate;
mod selection;

use std::collections::HashSet;

pub use category::Category;
pub use error::{FilterError, FilterResult};
pub use field_map::{CategoryFieldMap, CategoryFieldMapBuilder, TokenCase, EXAMINATION_ID_FIELD};
pub use predicate::{FieldValue, Predicate};
pub use selection::FilterSelection;

/// Deduplicated, unordered set of document identifiers.
pub type IdentifierSet = HashSet<String>;
