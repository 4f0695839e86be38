// SPDX-License-Identifier: GPL-3.0-or-later

//! Total order over queue entries.
//!
//! Unknown time-left and completion estimates sort after every known value
//! in both directions, so downloads with no estimate never float to the top
//! of an ascending listing. Within equal primary keys, entries order by
//! completion percentage descending so near-complete downloads cluster.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::queue::QueueEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Timeleft,
    EstimatedCompletionTime,
    Protocol,
    Indexer,
    DownloadClient,
    Title,
    Progress,
}

impl SortKey {
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "estimatedcompletiontime" | "estimated_completion_time" => {
                Self::EstimatedCompletionTime
            }
            "protocol" => Self::Protocol,
            "indexer" => Self::Indexer,
            "downloadclient" | "download_client" => Self::DownloadClient,
            "title" => Self::Title,
            "progress" => Self::Progress,
            _ => Self::Timeleft,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "desc" | "descending" => Self::Descending,
            _ => Self::Ascending,
        }
    }
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

/// Known values compare normally (honoring direction); a missing value sorts
/// after any known value no matter the direction.
fn compare_nulls_last<T: Ord>(
    a: Option<&T>,
    b: Option<&T>,
    direction: SortDirection,
) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => directed(x.cmp(y), direction),
    }
}

pub fn compare_queue_entries(
    a: &QueueEntry,
    b: &QueueEntry,
    key: SortKey,
    direction: SortDirection,
) -> Ordering {
    let primary = match key {
        SortKey::Timeleft => {
            compare_nulls_last(a.timeleft.as_ref(), b.timeleft.as_ref(), direction)
        }
        SortKey::EstimatedCompletionTime => compare_nulls_last(
            a.estimated_completion_time.as_ref(),
            b.estimated_completion_time.as_ref(),
            direction,
        ),
        SortKey::Protocol => directed(
            a.protocol.to_string().cmp(&b.protocol.to_string()),
            direction,
        ),
        SortKey::Indexer => {
            compare_nulls_last(a.indexer.as_ref(), b.indexer.as_ref(), direction)
        }
        SortKey::DownloadClient => {
            directed(a.download_client.cmp(&b.download_client), direction)
        }
        SortKey::Title => directed(a.title.cmp(&b.title), direction),
        SortKey::Progress => directed(
            a.progress()
                .partial_cmp(&b.progress())
                .unwrap_or(Ordering::Equal),
            direction,
        ),
    };

    // Completion percentage descending as the stable tie-break.
    primary.then_with(|| {
        b.progress()
            .partial_cmp(&a.progress())
            .unwrap_or(Ordering::Equal)
    })
}

pub fn sort_queue_entries(entries: &mut [QueueEntry], key: SortKey, direction: SortDirection) {
    entries.sort_by(|a, b| compare_queue_entries(a, b, key, direction));
}
