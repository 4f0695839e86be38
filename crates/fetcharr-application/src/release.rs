// SPDX-License-Identifier: GPL-3.0-or-later
use chrono::{DateTime, Utc};
use fetcharr_domain::{CollectionId, DownloadProtocol, Language, Movie, MovieId};
use serde::{Deserialize, Serialize};

use crate::release_parsing::ParsedReleaseInfo;

/// Raw candidate reported by an indexer search. Produced by the (external)
/// indexer layer, consumed by the decision engine, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub title: String,
    pub indexer: String,
    pub protocol: DownloadProtocol,
    pub size_bytes: Option<u64>,
    pub publish_date: Option<DateTime<Utc>>,
    pub seeders: Option<u32>,
    pub leechers: Option<u32>,
    pub download_url: Option<String>,
    pub guid: Option<String>,
}

impl ReleaseInfo {
    /// Age of the release in whole days relative to `now`, when the indexer
    /// reported a publish date.
    pub fn age_days(&self, now: DateTime<Utc>) -> Option<i64> {
        self.publish_date.map(|date| (now - date).num_days())
    }
}

/// A release bundled with its parsed metadata and the catalog entities it was
/// matched against. The `languages` list is the mutable slot the language
/// aggregation writes into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseCandidate {
    pub release: ReleaseInfo,
    pub parsed: ParsedReleaseInfo,
    pub movie: Option<Movie>,
    pub movie_ids: Vec<MovieId>,
    pub languages: Vec<Language>,
}

impl ReleaseCandidate {
    pub fn new(release: ReleaseInfo, parsed: ParsedReleaseInfo) -> Self {
        let languages = parsed.languages.clone();
        Self {
            release,
            parsed,
            movie: None,
            movie_ids: Vec::new(),
            languages,
        }
    }

    pub fn with_movie(mut self, movie: Movie) -> Self {
        self.movie_ids.push(movie.id);
        self.movie = Some(movie);
        self
    }
}

/// What the user explicitly searched for. `None` at evaluation time means an
/// unfiltered RSS feed: entity-match specifications accept everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub target_collection_id: Option<CollectionId>,
    pub target_movie_id: Option<MovieId>,
    pub requested_movie_ids: Vec<MovieId>,
    pub expected_title: Option<String>,
}

impl SearchCriteria {
    pub fn for_movie(movie: &Movie) -> Self {
        Self {
            target_collection_id: None,
            target_movie_id: Some(movie.id),
            requested_movie_ids: vec![movie.id],
            expected_title: Some(movie.title.clone()),
        }
    }

    pub fn for_collection(collection_id: CollectionId, requested: Vec<MovieId>) -> Self {
        Self {
            target_collection_id: Some(collection_id),
            target_movie_id: None,
            requested_movie_ids: requested,
            expected_title: None,
        }
    }

    /// True when the search targeted exactly one item and therefore carries
    /// an expected title to compare against.
    pub fn is_single_item(&self) -> bool {
        self.target_movie_id.is_some() && self.expected_title.is_some()
    }
}
