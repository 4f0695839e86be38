// SPDX-License-Identifier: GPL-3.0-or-later
use chrono::Utc;
use tracing::debug;

use super::{DecisionSpecification, RejectionKind, SpecDecision};
use crate::release::{ReleaseCandidate, SearchCriteria};
use fetcharr_domain::DownloadProtocol;

/// Usenet releases older than the provider retention window cannot be
/// fetched completely; reject them up front. A configured retention of zero
/// means unlimited.
pub struct RetentionSpecification {
    retention_days: u32,
}

impl RetentionSpecification {
    pub fn new(retention_days: u32) -> Self {
        Self { retention_days }
    }
}

impl DecisionSpecification for RetentionSpecification {
    fn name(&self) -> &'static str {
        "retention"
    }

    fn rejection_kind(&self) -> RejectionKind {
        RejectionKind::Permanent
    }

    fn evaluate(
        &self,
        candidate: &ReleaseCandidate,
        _criteria: Option<&SearchCriteria>,
    ) -> anyhow::Result<SpecDecision> {
        if self.retention_days == 0 {
            return Ok(SpecDecision::Accept);
        }

        if candidate.release.protocol != DownloadProtocol::Usenet {
            return Ok(SpecDecision::Accept);
        }

        let Some(age_days) = candidate.release.age_days(Utc::now()) else {
            return Ok(SpecDecision::Accept);
        };

        if age_days > i64::from(self.retention_days) {
            debug!(
                target: "decision_engine",
                release = %candidate.release.title,
                age_days,
                retention_days = self.retention_days,
                "release older than configured retention"
            );
            return Ok(SpecDecision::reject(format!(
                "Older than configured retention of {} days",
                self.retention_days
            )));
        }

        Ok(SpecDecision::Accept)
    }
}
