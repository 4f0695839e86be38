// SPDX-License-Identifier: GPL-3.0-or-later
use tracing::debug;

use super::{DecisionSpecification, RejectionKind, SpecDecision};
use crate::release::{ReleaseCandidate, SearchCriteria};
use fetcharr_domain::DownloadProtocol;

/// Torrents with a known seeder count below one are rejected; unknown seeder
/// counts and non-torrent protocols pass. Temporary: seeders can appear.
pub struct SeedersSpecification {
    min_seeders: u32,
}

impl SeedersSpecification {
    pub fn new() -> Self {
        Self { min_seeders: 1 }
    }
}

impl Default for SeedersSpecification {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionSpecification for SeedersSpecification {
    fn name(&self) -> &'static str {
        "seeders"
    }

    fn rejection_kind(&self) -> RejectionKind {
        RejectionKind::Temporary
    }

    fn evaluate(
        &self,
        candidate: &ReleaseCandidate,
        criteria: Option<&SearchCriteria>,
    ) -> anyhow::Result<SpecDecision> {
        if criteria.is_none() {
            return Ok(SpecDecision::Accept);
        }

        if candidate.release.protocol != DownloadProtocol::Torrent {
            return Ok(SpecDecision::Accept);
        }

        match candidate.release.seeders {
            Some(seeders) if seeders < self.min_seeders => {
                debug!(
                    target: "decision_engine",
                    release = %candidate.release.title,
                    seeders,
                    min_seeders = self.min_seeders,
                    "not enough seeders"
                );
                Ok(SpecDecision::reject(format!(
                    "Not enough seeders: {} (minimum {})",
                    seeders, self.min_seeders
                )))
            }
            _ => Ok(SpecDecision::Accept),
        }
    }
}
