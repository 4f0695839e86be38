// SPDX-License-Identifier: GPL-3.0-or-later
use tracing::debug;

use super::{DecisionSpecification, RejectionKind, SpecDecision, SpecificationPriority};
use crate::release::{ReleaseCandidate, SearchCriteria};

/// Rejects candidates matched to a different movie (or collection) than the
/// one the search targeted. Runs first: an id comparison is the cheapest way
/// to discard the bulk of unrelated results.
pub struct CollectionMatchSpecification;

impl DecisionSpecification for CollectionMatchSpecification {
    fn name(&self) -> &'static str {
        "collection_match"
    }

    fn priority(&self) -> SpecificationPriority {
        SpecificationPriority::First
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

        if let Some(target_movie_id) = criteria.target_movie_id {
            if !candidate.movie_ids.contains(&target_movie_id) {
                debug!(
                    target: "decision_engine",
                    release = %candidate.release.title,
                    %target_movie_id,
                    "release matched a different movie than searched for"
                );
                return Ok(SpecDecision::reject("Wrong movie"));
            }
            return Ok(SpecDecision::Accept);
        }

        if let Some(target_collection_id) = criteria.target_collection_id {
            let belongs = candidate
                .movie
                .as_ref()
                .and_then(|movie| movie.collection_id)
                .map(|collection_id| collection_id == target_collection_id)
                .unwrap_or(false);

            if !belongs {
                debug!(
                    target: "decision_engine",
                    release = %candidate.release.title,
                    %target_collection_id,
                    "release does not belong to the searched collection"
                );
                return Ok(SpecDecision::reject("Wrong collection"));
            }
        }

        Ok(SpecDecision::Accept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::{ReleaseInfo, SearchCriteria};
    use crate::release_parsing::parse_release_title;
    use fetcharr_domain::{CollectionId, DownloadProtocol, Movie, MovieId};

    fn candidate(title: &str) -> ReleaseCandidate {
        ReleaseCandidate::new(
            ReleaseInfo {
                title: title.to_string(),
                indexer: "indexer".to_string(),
                protocol: DownloadProtocol::Torrent,
                size_bytes: None,
                publish_date: None,
                seeders: Some(5),
                leechers: None,
                download_url: None,
                guid: None,
            },
            parse_release_title(title),
        )
    }

    #[test]
    fn accepts_without_criteria() {
        let spec = CollectionMatchSpecification;
        let result = spec.evaluate(&candidate("Hysteria.2019.1080p-GRP"), None);
        assert_eq!(result.unwrap(), SpecDecision::Accept);
    }

    #[test]
    fn accepts_matching_movie_id() {
        let movie = Movie::new("Hysteria");
        let criteria = SearchCriteria::for_movie(&movie);
        let candidate = candidate("Hysteria.2019.1080p-GRP").with_movie(movie);

        let spec = CollectionMatchSpecification;
        assert_eq!(
            spec.evaluate(&candidate, Some(&criteria)).unwrap(),
            SpecDecision::Accept
        );
    }

    #[test]
    fn rejects_wrong_movie_id() {
        let movie = Movie::new("Hysteria");
        let candidate = candidate("Hysteria.2019.1080p-GRP").with_movie(movie);
        let criteria = SearchCriteria {
            target_movie_id: Some(MovieId::new()),
            ..Default::default()
        };

        let spec = CollectionMatchSpecification;
        assert_eq!(
            spec.evaluate(&candidate, Some(&criteria)).unwrap(),
            SpecDecision::reject("Wrong movie")
        );
    }

    #[test]
    fn rejects_movie_outside_target_collection() {
        let mut movie = Movie::new("Despicable Me");
        movie.collection_id = Some(CollectionId::new());
        let candidate = candidate("Despicable.Me.2010.720p-GRP").with_movie(movie);
        let criteria = SearchCriteria::for_collection(CollectionId::new(), Vec::new());

        let spec = CollectionMatchSpecification;
        assert_eq!(
            spec.evaluate(&candidate, Some(&criteria)).unwrap(),
            SpecDecision::reject("Wrong collection")
        );
    }
}
