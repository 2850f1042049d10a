//! Query compilation and matching.
//!
//! A query is an ordered sequence of include/exclude clauses over component
//! identifiers. Because the built clause list and every signature share the
//! same sort key, matching is a single linear scan with two cursors.

use std::cmp::Ordering;

use trestle_foundation::ComponentId;
use trestle_storage::Signature;

// =============================================================================
// Clauses
// =============================================================================

/// One predicate of a query.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Clause {
    /// The signature must contain the component.
    Include(ComponentId),
    /// The signature must not contain the component.
    Exclude(ComponentId),
}

impl Clause {
    /// Returns the component this clause constrains.
    #[must_use]
    pub const fn subject(self) -> ComponentId {
        match self {
            Self::Include(component) | Self::Exclude(component) => component,
        }
    }

    const fn is_include(self) -> bool {
        matches!(self, Self::Include(_))
    }
}

// =============================================================================
// Query
// =============================================================================

/// A compiled include/exclude predicate over signatures.
///
/// Clauses are sorted by component identifier at build time; matching never
/// allocates and visits each clause and signature entry at most once.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Query {
    clauses: Vec<Clause>,
}

impl Query {
    /// Starts building a query.
    #[must_use]
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    /// Returns the compiled clauses in component order.
    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Tests this query against a signature.
    ///
    /// The empty query matches every signature; a query with only exclude
    /// clauses matches the empty signature.
    #[must_use]
    pub fn matches(&self, signature: &Signature) -> bool {
        let ids = signature.components();
        let mut i_type = 0;

        for clause in &self.clauses {
            loop {
                if i_type >= ids.len() {
                    if clause.is_include() {
                        return false;
                    }
                    // Exclusion satisfied by absence.
                    break;
                }
                match ids[i_type].cmp(&clause.subject()) {
                    Ordering::Equal => {
                        if !clause.is_include() {
                            return false;
                        }
                        i_type += 1;
                        break;
                    }
                    // This id is below the clause subject; the subject may
                    // still appear later.
                    Ordering::Less => i_type += 1,
                    Ordering::Greater => {
                        if clause.is_include() {
                            return false;
                        }
                        break;
                    }
                }
            }
        }
        true
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Accumulates clauses in call order; [`QueryBuilder::build`] collapses
/// duplicate subjects to the last call and sorts.
#[derive(Clone, Debug, Default)]
pub struct QueryBuilder {
    clauses: Vec<Clause>,
}

impl QueryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires the component to be present.
    #[must_use]
    pub fn with(mut self, component: ComponentId) -> Self {
        self.clauses.push(Clause::Include(component));
        self
    }

    /// Requires the component to be absent.
    #[must_use]
    pub fn without(mut self, component: ComponentId) -> Self {
        self.clauses.push(Clause::Exclude(component));
        self
    }

    /// Compiles the accumulated clauses into a query.
    #[must_use]
    pub fn build(self) -> Query {
        let mut chosen: Vec<Clause> = Vec::with_capacity(self.clauses.len());
        for clause in self.clauses {
            if let Some(existing) = chosen
                .iter_mut()
                .find(|existing| existing.subject() == clause.subject())
            {
                *existing = clause;
            } else {
                chosen.push(clause);
            }
        }
        chosen.sort_by_key(|clause| clause.subject());
        Query { clauses: chosen }
    }
}

/// Entry point mirroring the public API surface: start selecting entities
/// by component constraints.
#[must_use]
pub fn select_entities() -> QueryBuilder {
    QueryBuilder::new()
}
