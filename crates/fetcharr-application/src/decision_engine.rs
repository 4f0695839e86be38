// SPDX-License-Identifier: GPL-3.0-or-later

//! Orchestrates the specification pipeline over a batch of release
//! candidates. Specifications run in ascending priority order; a permanent
//! rejection short-circuits the remaining rules for that candidate, while
//! temporary rejections accumulate so operators see every reason a release
//! failed. A faulty rule never aborts the batch.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::release::{ReleaseCandidate, SearchCriteria};
use crate::specifications::{
    CollectionMatchSpecification, Decision, DecisionSpecification, MaximumSizeSpecification,
    Rejection, RejectionKind, RequestedMoviesSpecification, RetentionSpecification,
    SeedersSpecification, SingleMovieTitleSpecification, SpecDecision,
};
use fetcharr_config::DecisionConfig;

#[derive(Debug, Clone)]
pub struct EvaluatedRelease {
    pub candidate: ReleaseCandidate,
    pub decision: Decision,
}

pub struct DecisionEngine {
    specifications: Vec<Arc<dyn DecisionSpecification>>,
}

impl DecisionEngine {
    pub fn new(mut specifications: Vec<Arc<dyn DecisionSpecification>>) -> Self {
        specifications.sort_by_key(|spec| spec.priority());
        Self { specifications }
    }

    /// The standard rule set, with config-driven limits taken as a read-only
    /// snapshot at construction.
    pub fn with_default_specifications(config: &DecisionConfig) -> Self {
        Self::new(vec![
            Arc::new(CollectionMatchSpecification),
            Arc::new(RequestedMoviesSpecification),
            Arc::new(SingleMovieTitleSpecification::new()),
            Arc::new(SeedersSpecification::new()),
            Arc::new(RetentionSpecification::new(config.retention_days)),
            Arc::new(MaximumSizeSpecification::new(config.maximum_size_mb)),
        ])
    }

    pub fn evaluate(
        &self,
        candidates: Vec<ReleaseCandidate>,
        criteria: Option<&SearchCriteria>,
    ) -> Vec<EvaluatedRelease> {
        if candidates.is_empty() {
            info!(target: "decision_engine", "no candidates to evaluate");
            return Vec::new();
        }

        info!(
            target: "decision_engine",
            count = candidates.len(),
            "evaluating release candidates"
        );

        candidates
            .into_iter()
            .map(|candidate| {
                let decision = self.evaluate_candidate(&candidate, criteria);

                if decision.is_accepted() {
                    debug!(
                        target: "decision_engine",
                        release = %candidate.release.title,
                        indexer = %candidate.release.indexer,
                        "release accepted"
                    );
                } else {
                    let reasons: Vec<&str> = decision
                        .rejections()
                        .iter()
                        .map(|rejection| rejection.reason.as_str())
                        .collect();
                    debug!(
                        target: "decision_engine",
                        release = %candidate.release.title,
                        indexer = %candidate.release.indexer,
                        reasons = %reasons.join(", "),
                        "release rejected"
                    );
                }

                EvaluatedRelease {
                    candidate,
                    decision,
                }
            })
            .collect()
    }

    fn evaluate_candidate(
        &self,
        candidate: &ReleaseCandidate,
        criteria: Option<&SearchCriteria>,
    ) -> Decision {
        let mut rejections = Vec::new();

        for spec in &self.specifications {
            match spec.evaluate(candidate, criteria) {
                Ok(SpecDecision::Accept) => {}
                Ok(SpecDecision::Reject { reason }) => {
                    let kind = spec.rejection_kind();
                    rejections.push(Rejection::new(reason, kind));

                    // A permanent rejection is final for this candidate;
                    // further rules would only add noise.
                    if kind == RejectionKind::Permanent {
                        break;
                    }
                }
                Err(err) => {
                    error!(
                        target: "decision_engine",
                        specification = spec.name(),
                        release = %candidate.release.title,
                        error = %err,
                        "specification failed to evaluate"
                    );
                    rejections.push(Rejection::new(
                        format!("internal error evaluating {}", spec.name()),
                        RejectionKind::Temporary,
                    ));
                }
            }
        }

        if rejections.is_empty() {
            Decision::accepted()
        } else {
            Decision::rejected(rejections)
        }
    }
}
