// SPDX-License-Identifier: GPL-3.0-or-later

//! Queue reconciliation.
//!
//! Every cycle polls all configured download clients concurrently, rebuilds
//! each client's tracked-download set from the live items plus history, and
//! applies it atomically per client. A failed poll leaves that client's
//! previous set in place (stale beats falsely disappeared); a cycle that
//! finishes after a newer one already applied is discarded per client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use fetcharr_domain::{
    DomainEvent, DownloadProtocol, MovieId, QueueRefreshed, QueueRefreshedPayload,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::download_clients::{DownloadClient, DownloadItemStatus};
use crate::events::{EventPublisher, InMemoryEventBus};
use crate::history::HistoryStore;
use crate::queue_ordering::{sort_queue_entries, SortDirection, SortKey};
use crate::tracked_downloads::{
    StatusMessage, TrackedDownload, TrackedDownloadService, TrackedDownloadStatus,
};

/// Display-ready join of a tracked download and its live client item.
/// Recomputed on every poll, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub download_id: String,
    pub movie_ids: Vec<MovieId>,
    pub title: String,
    pub size: i64,
    pub size_left: i64,
    pub timeleft: Option<std::time::Duration>,
    pub estimated_completion_time: Option<DateTime<Utc>>,
    pub protocol: DownloadProtocol,
    pub indexer: Option<String>,
    pub download_client: String,
    pub status: DownloadItemStatus,
    pub tracked_status: TrackedDownloadStatus,
    pub status_messages: Vec<StatusMessage>,
    pub output_path: Option<String>,
}

impl QueueEntry {
    /// Completion percentage, always within 0..=100.
    pub fn progress(&self) -> f64 {
        if self.size == 0 {
            0.0
        } else {
            100.0 - (self.size_left as f64 / self.size as f64) * 100.0
        }
    }

    fn from_tracked(tracked: &TrackedDownload, now: DateTime<Utc>) -> Self {
        let item = &tracked.item;

        let size = item.total_size.max(0);
        let mut size_left = item.remaining_size;
        if size_left < 0 || size_left > size {
            warn!(
                target: "queue",
                download_id = %tracked.download_id,
                size,
                size_left,
                "client reported inconsistent sizes, clamping"
            );
            size_left = size_left.clamp(0, size);
        }

        let estimated_completion_time = item.remaining_time.and_then(|remaining| {
            chrono::Duration::from_std(remaining)
                .ok()
                .map(|delta| now + delta)
        });

        Self {
            download_id: tracked.download_id.clone(),
            movie_ids: tracked.movie_ids.clone(),
            title: item.title.clone(),
            size,
            size_left,
            timeleft: item.remaining_time,
            estimated_completion_time,
            protocol: tracked.protocol,
            indexer: tracked.indexer.clone(),
            download_client: tracked.client_name.clone(),
            status: item.status,
            tracked_status: tracked.status,
            status_messages: tracked.status_messages.clone(),
            output_path: item.output_path.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueueQuery {
    pub page: usize,
    pub page_size: usize,
    pub sort_key: SortKey,
    pub sort_dir: SortDirection,
    pub movie_id: Option<MovieId>,
    pub download_client: Option<String>,
}

impl Default for QueueQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
            sort_key: SortKey::Timeleft,
            sort_dir: SortDirection::Ascending,
            movie_id: None,
            download_client: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueuePage {
    pub entries: Vec<QueueEntry>,
    pub total_records: usize,
    pub page: usize,
    pub page_size: usize,
}

pub struct QueueService {
    clients: Vec<Arc<dyn DownloadClient>>,
    tracked: Arc<TrackedDownloadService>,
    history: Arc<dyn HistoryStore>,
    events: Arc<InMemoryEventBus>,
    cycle: AtomicU64,
    applied_cycles: RwLock<HashMap<String, u64>>,
}

impl QueueService {
    pub fn new(
        clients: Vec<Arc<dyn DownloadClient>>,
        tracked: Arc<TrackedDownloadService>,
        history: Arc<dyn HistoryStore>,
        events: Arc<InMemoryEventBus>,
    ) -> Self {
        Self {
            clients,
            tracked,
            history,
            events,
            cycle: AtomicU64::new(0),
            applied_cycles: RwLock::new(HashMap::new()),
        }
    }

    /// Poll every client and fold the results into the tracked set. One
    /// client failing never blocks the others.
    pub async fn refresh(&self) {
        let cycle_id = self.cycle.fetch_add(1, Ordering::SeqCst) + 1;

        let polls = self.clients.iter().map(|client| {
            let client = Arc::clone(client);
            async move {
                let items = client.get_items().await;
                (client, items)
            }
        });

        let results = futures::future::join_all(polls).await;

        let mut failed_clients = 0;
        for (client, result) in results {
            let name = client.name().to_string();
            match result {
                Ok(items) => {
                    let downloads: Vec<TrackedDownload> = items
                        .into_iter()
                        .map(|item| {
                            self.tracked.track(
                                &name,
                                client.protocol(),
                                item,
                                self.history.as_ref(),
                            )
                        })
                        .collect();

                    self.apply(&name, cycle_id, downloads);
                }
                Err(err) => {
                    // Keep the last known set: a transient outage must not
                    // read as every download disappearing.
                    warn!(
                        target: "queue",
                        client = %name,
                        error = %err,
                        "download client poll failed, keeping stale state"
                    );
                    failed_clients += 1;
                }
            }
        }

        let total_items = self.tracked.get_tracked().len();
        info!(
            target: "queue",
            cycle = cycle_id,
            total_items,
            failed_clients,
            "queue refresh complete"
        );

        let event: QueueRefreshed = DomainEvent::new(
            "queue.refreshed",
            QueueRefreshedPayload {
                total_items,
                failed_clients,
            },
        );
        self.events.publish(&event);
    }

    fn apply(&self, client_name: &str, cycle_id: u64, downloads: Vec<TrackedDownload>) {
        let mut applied = self
            .applied_cycles
            .write()
            .expect("queue cycle lock poisoned");

        if let Some(&last_applied) = applied.get(client_name) {
            if last_applied > cycle_id {
                debug!(
                    target: "queue",
                    client = client_name,
                    cycle = cycle_id,
                    last_applied,
                    "discarding result from superseded cycle"
                );
                return;
            }
        }

        applied.insert(client_name.to_string(), cycle_id);
        self.tracked
            .replace_client_set(client_name, downloads, self.history.as_ref());
    }

    /// The reconciled queue, filtered, sorted and paginated.
    pub fn get_queue(&self, query: &QueueQuery) -> QueuePage {
        let now = Utc::now();
        let mut entries: Vec<QueueEntry> = self
            .tracked
            .get_tracked()
            .iter()
            .map(|tracked| QueueEntry::from_tracked(tracked, now))
            .collect();

        if let Some(movie_id) = query.movie_id {
            entries.retain(|entry| entry.movie_ids.contains(&movie_id));
        }

        if let Some(client) = query.download_client.as_deref() {
            entries.retain(|entry| entry.download_client == client);
        }

        sort_queue_entries(&mut entries, query.sort_key, query.sort_dir);

        let total_records = entries.len();
        let page = query.page.max(1);
        let page_size = query.page_size.max(1);
        let entries = entries
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();

        QueuePage {
            entries,
            total_records,
            page,
            page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download_clients::{DownloadClientError, DownloadClientItem};
    use crate::history::{HistoryEntry, InMemoryHistoryStore};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeClient {
        name: String,
        responses: Mutex<Vec<Result<Vec<DownloadClientItem>, DownloadClientError>>>,
    }

    impl FakeClient {
        fn new(
            name: &str,
            responses: Vec<Result<Vec<DownloadClientItem>, DownloadClientError>>,
        ) -> Self {
            Self {
                name: name.to_string(),
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl DownloadClient for FakeClient {
        fn name(&self) -> &str {
            &self.name
        }

        fn protocol(&self) -> DownloadProtocol {
            DownloadProtocol::Usenet
        }

        async fn get_items(&self) -> Result<Vec<DownloadClientItem>, DownloadClientError> {
            let mut responses = self.responses.lock().expect("responses lock");
            if responses.is_empty() {
                Ok(Vec::new())
            } else {
                responses.remove(0)
            }
        }

        async fn remove_item(&self, _download_id: &str) -> Result<(), DownloadClientError> {
            Ok(())
        }

        async fn test_connection(&self) -> Result<(), DownloadClientError> {
            Ok(())
        }
    }

    fn item(download_id: &str, remaining: i64) -> DownloadClientItem {
        DownloadClientItem {
            download_id: download_id.to_string(),
            title: format!("{}.2020.1080p", download_id),
            category: None,
            total_size: 1000,
            remaining_size: remaining,
            remaining_time: None,
            output_path: None,
            status: DownloadItemStatus::Downloading,
            status_messages: Vec::new(),
            client_name: "fake".to_string(),
            can_be_removed: false,
        }
    }

    fn service_with(clients: Vec<Arc<dyn DownloadClient>>) -> (QueueService, Arc<InMemoryHistoryStore>) {
        let history = Arc::new(InMemoryHistoryStore::new());
        let events = Arc::new(InMemoryEventBus::new());
        let tracked = Arc::new(TrackedDownloadService::new(events.clone()));
        (
            QueueService::new(clients, tracked, history.clone(), events),
            history,
        )
    }

    #[tokio::test]
    async fn refresh_merges_items_from_all_clients() {
        let a: Arc<dyn DownloadClient> =
            Arc::new(FakeClient::new("a", vec![Ok(vec![item("id-a", 400)])]));
        let b: Arc<dyn DownloadClient> =
            Arc::new(FakeClient::new("b", vec![Ok(vec![item("id-b", 100)])]));
        let (service, _history) = service_with(vec![a, b]);

        service.refresh().await;

        let page = service.get_queue(&QueueQuery::default());
        assert_eq!(page.total_records, 2);
    }

    #[tokio::test]
    async fn failed_client_keeps_stale_state_and_others_continue() {
        let flaky: Arc<dyn DownloadClient> = Arc::new(FakeClient::new(
            "flaky",
            vec![
                Ok(vec![item("id-1", 400)]),
                Err(DownloadClientError::Request("connection refused".into())),
            ],
        ));
        let steady: Arc<dyn DownloadClient> = Arc::new(FakeClient::new(
            "steady",
            vec![Ok(vec![item("id-2", 300)]), Ok(vec![item("id-2", 100)])],
        ));
        let (service, _history) = service_with(vec![flaky, steady]);

        service.refresh().await;
        assert_eq!(service.get_queue(&QueueQuery::default()).total_records, 2);

        // Second cycle: flaky errors out, its item must survive untouched.
        service.refresh().await;
        let page = service.get_queue(&QueueQuery::default());
        assert_eq!(page.total_records, 2);
        assert!(page.entries.iter().any(|entry| entry.download_id == "id-1"));
    }

    #[tokio::test]
    async fn stale_cycle_result_is_discarded() {
        let (service, history) = service_with(Vec::new());

        let tracked_new = service.tracked.track(
            "c",
            DownloadProtocol::Usenet,
            item("new", 100),
            history.as_ref(),
        );
        let tracked_old = service.tracked.track(
            "c",
            DownloadProtocol::Usenet,
            item("old", 100),
            history.as_ref(),
        );

        // Cycle 2 finishes before cycle 1; the late cycle-1 apply must lose.
        service.apply("c", 2, vec![tracked_new]);
        service.apply("c", 1, vec![tracked_old]);

        let ids: Vec<String> = service
            .get_queue(&QueueQuery::default())
            .entries
            .into_iter()
            .map(|entry| entry.download_id)
            .collect();
        assert_eq!(ids, vec!["new".to_string()]);
    }

    #[tokio::test]
    async fn inconsistent_sizes_are_clamped() {
        let negative = {
            let mut it = item("negative", -50);
            it.total_size = 1000;
            it
        };
        let oversized = {
            let mut it = item("oversized", 2000);
            it.total_size = 1000;
            it
        };
        let client: Arc<dyn DownloadClient> =
            Arc::new(FakeClient::new("c", vec![Ok(vec![negative, oversized])]));
        let (service, _history) = service_with(vec![client]);

        service.refresh().await;
        let page = service.get_queue(&QueueQuery::default());

        for entry in &page.entries {
            assert!(entry.size_left >= 0);
            assert!(entry.size_left <= entry.size);
            assert!((0.0..=100.0).contains(&entry.progress()));
        }
    }

    #[tokio::test]
    async fn filter_by_movie_id() {
        let movie_id = MovieId::new();
        let client: Arc<dyn DownloadClient> = Arc::new(FakeClient::new(
            "c",
            vec![Ok(vec![item("with-movie", 100), item("foreign", 100)])],
        ));
        let (service, history) = service_with(vec![client]);
        history.record(HistoryEntry::grabbed(
            "with-movie",
            "Some.Movie.2020",
            "indexer",
            vec![movie_id],
        ));

        service.refresh().await;

        let page = service.get_queue(&QueueQuery {
            movie_id: Some(movie_id),
            ..Default::default()
        });
        assert_eq!(page.total_records, 1);
        assert_eq!(page.entries[0].download_id, "with-movie");
    }

    #[tokio::test]
    async fn filter_by_download_client() {
        let a: Arc<dyn DownloadClient> =
            Arc::new(FakeClient::new("a", vec![Ok(vec![item("id-a", 400)])]));
        let b: Arc<dyn DownloadClient> =
            Arc::new(FakeClient::new("b", vec![Ok(vec![item("id-b", 100)])]));
        let (service, _history) = service_with(vec![a, b]);

        service.refresh().await;

        let page = service.get_queue(&QueueQuery {
            download_client: Some("b".to_string()),
            ..Default::default()
        });
        assert_eq!(page.total_records, 1);
        assert_eq!(page.entries[0].download_id, "id-b");
    }

    #[tokio::test]
    async fn pagination_slices_and_reports_totals() {
        let items: Vec<DownloadClientItem> =
            (0..5).map(|i| item(&format!("id-{}", i), 100)).collect();
        let client: Arc<dyn DownloadClient> = Arc::new(FakeClient::new("c", vec![Ok(items)]));
        let (service, _history) = service_with(vec![client]);

        service.refresh().await;

        let page = service.get_queue(&QueueQuery {
            page: 2,
            page_size: 2,
            ..Default::default()
        });
        assert_eq!(page.total_records, 5);
        assert_eq!(page.entries.len(), 2);

        let past_end = service.get_queue(&QueueQuery {
            page: 9,
            page_size: 2,
            ..Default::default()
        });
        assert_eq!(past_end.total_records, 5);
        assert!(past_end.entries.is_empty());
    }

    #[tokio::test]
    async fn refresh_publishes_queue_refreshed_event() {
        let client: Arc<dyn DownloadClient> =
            Arc::new(FakeClient::new("c", vec![Ok(vec![item("id-1", 100)])]));
        let history = Arc::new(InMemoryHistoryStore::new());
        let events = Arc::new(InMemoryEventBus::new());
        let tracked = Arc::new(TrackedDownloadService::new(events.clone()));
        let service = QueueService::new(vec![client], tracked, history, events.clone());

        service.refresh().await;
        assert!(events.names().contains(&"queue.refreshed"));
    }
}
