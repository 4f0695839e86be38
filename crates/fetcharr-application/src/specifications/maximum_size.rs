// SPDX-License-Identifier: GPL-3.0-or-later
use tracing::debug;

use super::{DecisionSpecification, RejectionKind, SpecDecision};
use crate::release::{ReleaseCandidate, SearchCriteria};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Rejects releases larger than the configured maximum. Zero means
/// unlimited; an unreported size is accepted.
pub struct MaximumSizeSpecification {
    maximum_size_mb: u64,
}

impl MaximumSizeSpecification {
    pub fn new(maximum_size_mb: u64) -> Self {
        Self { maximum_size_mb }
    }
}

impl DecisionSpecification for MaximumSizeSpecification {
    fn name(&self) -> &'static str {
        "maximum_size"
    }

    fn rejection_kind(&self) -> RejectionKind {
        RejectionKind::Permanent
    }

    fn evaluate(
        &self,
        candidate: &ReleaseCandidate,
        _criteria: Option<&SearchCriteria>,
    ) -> anyhow::Result<SpecDecision> {
        if self.maximum_size_mb == 0 {
            return Ok(SpecDecision::Accept);
        }

        let Some(size_bytes) = candidate.release.size_bytes else {
            return Ok(SpecDecision::Accept);
        };

        let limit_bytes = self.maximum_size_mb * BYTES_PER_MB;
        if size_bytes > limit_bytes {
            debug!(
                target: "decision_engine",
                release = %candidate.release.title,
                size_bytes,
                limit_bytes,
                "release exceeds maximum size"
            );
            return Ok(SpecDecision::reject(format!(
                "Release size {} MB exceeds maximum of {} MB",
                size_bytes / BYTES_PER_MB,
                self.maximum_size_mb
            )));
        }

        Ok(SpecDecision::Accept)
    }
}
