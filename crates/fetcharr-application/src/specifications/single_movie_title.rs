// SPDX-License-Identifier: GPL-3.0-or-later
use tracing::debug;

use super::{DecisionSpecification, RejectionKind, SpecDecision};
use crate::release::{ReleaseCandidate, SearchCriteria};
use crate::release_parsing::clean_title;

/// Strategy used to normalize titles before comparison. Defaults to
/// [`clean_title`]; tests (and a catalog layer with different guarantees) can
/// substitute their own.
pub type TitleCleaner = fn(&str) -> String;

/// For single-movie searches: the candidate's parsed title must equal the
/// requested title after normalization. An empty parsed title signals a full
/// collection pack, which must never satisfy a single-movie search.
pub struct SingleMovieTitleSpecification {
    cleaner: TitleCleaner,
}

impl SingleMovieTitleSpecification {
    pub fn new() -> Self {
        Self {
            cleaner: clean_title,
        }
    }

    pub fn with_cleaner(cleaner: TitleCleaner) -> Self {
        Self { cleaner }
    }
}

impl Default for SingleMovieTitleSpecification {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionSpecification for SingleMovieTitleSpecification {
    fn name(&self) -> &'static str {
        "single_movie_title"
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

        let Some(expected_title) = criteria.expected_title.as_deref() else {
            return Ok(SpecDecision::Accept);
        };

        if candidate.parsed.movie_title.trim().is_empty() {
            debug!(
                target: "decision_engine",
                release = %candidate.release.title,
                "no movie title parsed, treating release as a full collection pack"
            );
            return Ok(SpecDecision::reject(
                "Release appears to be a full collection pack",
            ));
        }

        let parsed = (self.cleaner)(&candidate.parsed.movie_title);
        let expected = (self.cleaner)(expected_title);

        if parsed != expected {
            debug!(
                target: "decision_engine",
                release = %candidate.release.title,
                expected_title,
                "parsed title does not match the searched movie"
            );
            return Ok(SpecDecision::reject(format!(
                "Wrong movie title, expected '{}'",
                expected_title
            )));
        }

        Ok(SpecDecision::Accept)
    }
}
