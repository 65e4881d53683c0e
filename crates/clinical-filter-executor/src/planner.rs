//! Composition plans.
//!
//! A plan describes what [`FilterComposer::compose`] would do for a
//! selection (which categories run, which predicate each token maps to,
//! which tokens are dropped) without querying the index.
//!
//! [`FilterComposer::compose`]: crate::FilterComposer::compose

use std::fmt;

use clinical_filter::{Category, Predicate};

/// The plan for one selection.
///
/// # Example
///
/// ```ignore
/// let plan = composer.explain(&selection);
///
/// for step in &plan.steps {
///     println!("{} -> {} predicates", step.category, step.predicates.len());
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct CompositionPlan {
    /// Category steps in registration order.
    pub steps: Vec<PlanStep>,
    /// Selected categories without a registered filter.
    pub ignored_categories: Vec<Category>,
}

impl CompositionPlan {
    /// Returns true if no category would be evaluated.
    pub fn is_unconstrained(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of index queries the plan would issue (before caching).
    pub fn query_count(&self) -> usize {
        self.steps.iter().map(|s| s.predicates.len()).sum()
    }

    /// Steps that can only produce an empty contribution.
    pub fn empty_steps(&self) -> impl Iterator<Item = &PlanStep> {
        self.steps.iter().filter(|s| s.predicates.is_empty())
    }
}

impl fmt::Display for CompositionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Composition Plan")?;

        if self.is_unconstrained() {
            writeln!(f, "  no category selected: full population")?;
        } else {
            writeln!(f, "Queries: {}", self.query_count())?;
            writeln!(f)?;
            writeln!(f, "Steps:")?;
            for (i, step) in self.steps.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, step)?;
                for planned in &step.predicates {
                    writeln!(f, "     {} -> {}", planned.token, planned.predicate)?;
                }
                if !step.dropped_tokens.is_empty() {
                    writeln!(f, "     dropped: {}", step.dropped_tokens.join(", "))?;
                }
            }
        }

        if !self.ignored_categories.is_empty() {
            writeln!(f)?;
            writeln!(f, "Ignored (no filter registered):")?;
            for category in &self.ignored_categories {
                writeln!(f, "  - {}", category)?;
            }
        }

        Ok(())
    }
}

/// One selected category in the plan.
#[derive(Debug, Clone)]
pub struct PlanStep {
    /// Category evaluated.
    pub category: Category,
    /// Collection its predicates run against.
    pub collection: String,
    /// Recognized tokens and their predicates, in request order.
    pub predicates: Vec<PlannedPredicate>,
    /// Requested tokens the field map does not recognize.
    pub dropped_tokens: Vec<String>,
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] ({} predicates)",
            self.category,
            self.collection,
            self.predicates.len()
        )
    }
}

/// A recognized token and the predicate it resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPredicate {
    /// Token as requested.
    pub token: String,
    /// Resolved predicate.
    pub predicate: Predicate,
}
