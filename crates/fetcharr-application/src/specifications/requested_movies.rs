// SPDX-License-Identifier: GPL-3.0-or-later
use tracing::debug;

use super::{DecisionSpecification, RejectionKind, SpecDecision};
use crate::release::{ReleaseCandidate, SearchCriteria};

/// When the search asked for specific movies (e.g. the missing members of a
/// collection), the candidate must cover at least one of them.
pub struct RequestedMoviesSpecification;

impl DecisionSpecification for RequestedMoviesSpecification {
    fn name(&self) -> &'static str {
        "requested_movies"
    }

    fn rejection_kind(&self) -> RejectionKind {
        RejectionKind::Permanent
    }

    fn evaluate(
        &self,
        candidate: &ReleaseCandidate,
        criteria: Option<&SearchCriteria>,
    ) -> anyhow::Result<SpecDecision> {
        let Some(criteria) = criteria else {
            return Ok(SpecDecision::Accept);
        };

        if criteria.requested_movie_ids.is_empty() {
            return Ok(SpecDecision::Accept);
        }

        let intersects = candidate
            .movie_ids
            .iter()
            .any(|id| criteria.requested_movie_ids.contains(id));

        if !intersects {
            debug!(
                target: "decision_engine",
                release = %candidate.release.title,
                "release does not contain any requested movie"
            );
            return Ok(SpecDecision::reject(
                "Does not contain any requested movies",
            ));
        }

        Ok(SpecDecision::Accept)
    }
}
