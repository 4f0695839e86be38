// SPDX-License-Identifier: GPL-3.0-or-later

//! Release acceptance rules.
//!
//! Each specification is an independent, stateless predicate over a release
//! candidate and the (optional) search criteria that produced it. The
//! decision engine runs them in priority order and folds their verdicts into
//! a single [`Decision`] per candidate.

mod collection_match;
mod maximum_size;
mod requested_movies;
mod retention;
mod seeders;
mod single_movie_title;

pub use collection_match::CollectionMatchSpecification;
pub use maximum_size::MaximumSizeSpecification;
pub use requested_movies::RequestedMoviesSpecification;
pub use retention::RetentionSpecification;
pub use seeders::SeedersSpecification;
pub use single_movie_title::SingleMovieTitleSpecification;

use serde::{Deserialize, Serialize};

use crate::release::{ReleaseCandidate, SearchCriteria};

/// Whether a rejection can clear on its own or will never pass for this
/// candidate. `Permanent` is final and safe to blocklist; `Temporary` clears
/// on its own (seeders appearing, retention windows moving); `Indexer` marks
/// indexer-side conditions and evaluates like `Temporary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectionKind {
    Permanent,
    Temporary,
    Indexer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub reason: String,
    pub kind: RejectionKind,
}

impl Rejection {
    pub fn new(reason: impl Into<String>, kind: RejectionKind) -> Self {
        Self {
            reason: reason.into(),
            kind,
        }
    }
}

/// Aggregate verdict for one candidate. Constructed so that
/// `is_accepted() == rejections().is_empty()` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    rejections: Vec<Rejection>,
}

impl Decision {
    pub fn accepted() -> Self {
        Self {
            rejections: Vec::new(),
        }
    }

    pub fn rejected(rejections: Vec<Rejection>) -> Self {
        Self { rejections }
    }

    pub fn is_accepted(&self) -> bool {
        self.rejections.is_empty()
    }

    pub fn rejections(&self) -> &[Rejection] {
        &self.rejections
    }
}

/// Cheap, highly discriminating checks run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SpecificationPriority {
    First,
    Default,
}

/// Verdict of a single specification for a single candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecDecision {
    Accept,
    Reject { reason: String },
}

impl SpecDecision {
    pub fn reject(reason: impl Into<String>) -> Self {
        Self::Reject {
            reason: reason.into(),
        }
    }
}

/// One independent acceptance rule. Implementations are stateless aside from
/// configuration snapshots taken at construction; an `Err` signals an
/// internal failure which the engine converts into a temporary rejection
/// without aborting the batch.
pub trait DecisionSpecification: Send + Sync {
    fn name(&self) -> &'static str;

    fn priority(&self) -> SpecificationPriority {
        SpecificationPriority::Default
    }

    fn rejection_kind(&self) -> RejectionKind;

    fn evaluate(
        &self,
        candidate: &ReleaseCandidate,
        criteria: Option<&SearchCriteria>,
    ) -> anyhow::Result<SpecDecision>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_invariant_holds_by_construction() {
        let accepted = Decision::accepted();
        assert!(accepted.is_accepted());
        assert!(accepted.rejections().is_empty());

        let rejected = Decision::rejected(vec![Rejection::new(
            "Wrong movie",
            RejectionKind::Permanent,
        )]);
        assert!(!rejected.is_accepted());
        assert_eq!(rejected.rejections().len(), 1);
    }

    #[test]
    fn priority_orders_first_before_default() {
        assert!(SpecificationPriority::First < SpecificationPriority::Default);
    }
}
