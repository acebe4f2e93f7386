//! Reconciliation passes against the remote quote source.
//!
//! A pass fetches the remote list, appends records the local list has never
//! seen and either resolves conflicts with a given policy or hands them back
//! to the caller. Passes are single-flight: a pass requested while another is
//! running is skipped instead of interleaving list mutations. When sync is
//! disabled in the config, passes are skipped without touching the network.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::SyncConfig;
use crate::error::QuoteResult;
use crate::models::{Conflict, Quote, QuoteId};
use crate::preview;
use crate::reconcile::{diff, resolve, Patch, ResolutionPolicy};
use crate::store::QuoteStore;
use crate::sync_client::SyncClient;

/// Result of a sync pass
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub success: bool,
    /// True when the pass did not run because another was in flight
    pub skipped: bool,
    /// Remote records appended as new items
    pub added: usize,
    /// Conflicts settled by the pass policy
    pub resolved: usize,
    /// Conflicts left for the caller to resolve
    pub conflicts: Vec<Conflict>,
    pub errors: Vec<String>,
}

impl SyncReport {
    pub fn success() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            errors: vec![error.into()],
            ..Default::default()
        }
    }

    pub fn skipped() -> Self {
        Self {
            success: false,
            skipped: true,
            ..Default::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            errors: vec!["Sync is disabled".to_string()],
            ..Self::skipped()
        }
    }

    /// One line per pending conflict, for a resolution prompt
    pub fn conflict_summaries(&self) -> Vec<String> {
        self.conflicts.iter().map(preview::summarize).collect()
    }
}

/// Outcome of adding a quote and publishing it
#[derive(Debug, Clone)]
pub struct PublishResult {
    pub quote: Quote,
    pub remote_id: Option<QuoteId>,
    /// Publishing failure; the local add stands regardless
    pub error: Option<String>,
}

/// Sync service shared between user-triggered and periodic passes
pub struct QuoteSync {
    store: Arc<Mutex<QuoteStore>>,
    client: SyncClient,
    in_flight: Mutex<()>,
    enabled: bool,
    auto_resolve: Option<ResolutionPolicy>,
}

impl QuoteSync {
    /// Create a sync service over a shared store
    pub fn new(store: Arc<Mutex<QuoteStore>>, config: &SyncConfig) -> QuoteResult<Self> {
        Ok(Self {
            store,
            client: SyncClient::new(config)?,
            in_flight: Mutex::new(()),
            enabled: config.enabled,
            auto_resolve: config.auto_resolve,
        })
    }

    /// The shared store
    pub fn store(&self) -> &Arc<Mutex<QuoteStore>> {
        &self.store
    }

    /// Run one reconciliation pass.
    ///
    /// With `policy` set, conflicts are resolved in the same pass; otherwise
    /// they are returned in the report untouched. A failed fetch changes
    /// nothing and is reported; there is no retry.
    pub async fn sync_once(&self, policy: Option<ResolutionPolicy>) -> SyncReport {
        if !self.enabled {
            tracing::debug!("Sync disabled, skipping pass");
            return SyncReport::disabled();
        }

        let Ok(_running) = self.in_flight.try_lock() else {
            tracing::debug!("Sync already in flight, skipping");
            return SyncReport::skipped();
        };

        let remote = match self.client.fetch_remote().await {
            Ok(remote) => remote,
            Err(e) => {
                tracing::warn!("Sync with {} failed: {}", self.client.endpoint(), e);
                return SyncReport::failure(e.to_string());
            }
        };

        let mut store = self.store.lock().await;
        let found = diff(store.quotes(), &remote);
        let mut report = SyncReport::success();

        let mut patch = Patch::from_new_items(found.new_items);
        report.added = patch.appended.len();

        match policy {
            Some(policy) => {
                patch.extend(resolve(&found.conflicts, policy));
                report.resolved = found.conflicts.len();
            }
            None => report.conflicts = found.conflicts,
        }

        if let Err(e) = store.apply_patch(patch) {
            report.errors.push(format!("Failed to save merged quotes: {}", e));
        } else if let Err(e) = store.set_last_sync(Utc::now()) {
            report.errors.push(format!("Failed to update sync time: {}", e));
        }

        report.success = report.errors.is_empty();
        tracing::info!(
            "Sync finished: {} added, {} resolved, {} pending conflicts",
            report.added,
            report.resolved,
            report.conflicts.len()
        );
        report
    }

    /// Apply the user's choice for conflicts returned by an earlier pass
    pub async fn resolve_conflicts(
        &self,
        conflicts: &[Conflict],
        policy: ResolutionPolicy,
    ) -> QuoteResult<usize> {
        let mut store = self.store.lock().await;
        let changed = store.apply_patch(resolve(conflicts, policy))?;
        tracing::debug!("Resolved {} conflicts as {}", conflicts.len(), policy);
        Ok(changed)
    }

    /// Add a quote locally, then publish it to the remote source.
    ///
    /// Once the remote accepts the quote, the local record takes over the
    /// remote id so later passes match it instead of appending a copy.
    /// Validation failures are returned as errors. Publishing failures are
    /// only reported in the result. Publishing is skipped while sync is
    /// disabled.
    pub async fn add_and_publish(&self, text: &str, category: &str) -> QuoteResult<PublishResult> {
        let (index, mut quote) = {
            let mut store = self.store.lock().await;
            let quote = store.add(text, category)?.clone();
            (store.len() - 1, quote)
        };

        if !self.enabled {
            return Ok(PublishResult {
                quote,
                remote_id: None,
                error: Some("Sync is disabled".to_string()),
            });
        }

        let (remote_id, mut error) = match self.client.post_quote(&quote).await {
            Ok(id) => (id, None),
            Err(e) => {
                tracing::warn!("Failed to publish quote: {}", e);
                (None, Some(e.to_string()))
            }
        };

        if let Some(id) = &remote_id {
            let mut store = self.store.lock().await;
            match store.assign_id(index, &quote.text, id.clone()) {
                Ok(()) => quote.id = Some(id.clone()),
                Err(e) => {
                    tracing::warn!("Failed to record remote id {}: {}", id, e);
                    error = Some(e.to_string());
                }
            }
        }

        Ok(PublishResult {
            quote,
            remote_id,
            error,
        })
    }

    /// Run a pass every `interval` using the configured auto policy.
    ///
    /// The first pass runs immediately. Each report is sent on `reports`; the
    /// task stops once the receiver is dropped.
    pub fn spawn_periodic(
        self: Arc<Self>,
        interval: Duration,
        reports: mpsc::Sender<SyncReport>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let report = self.sync_once(self.auto_resolve).await;
                if reports.send(report).await.is_err() {
                    tracing::debug!("Sync report receiver dropped, stopping periodic sync");
                    break;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStore;

    fn service_with(config: SyncConfig) -> QuoteSync {
        let store = QuoteStore::open(Box::new(SqliteStore::new_in_memory().unwrap())).unwrap();
        QuoteSync::new(Arc::new(Mutex::new(store)), &config).unwrap()
    }

    fn unreachable_service() -> QuoteSync {
        service_with(SyncConfig {
            endpoint: "http://127.0.0.1:1/posts".to_string(),
            timeout_secs: 2,
            ..SyncConfig::default()
        })
    }

    #[tokio::test]
    async fn test_disabled_sync_skips_pass() {
        let sync = service_with(SyncConfig {
            enabled: false,
            endpoint: "http://127.0.0.1:1/posts".to_string(),
            timeout_secs: 2,
            ..SyncConfig::default()
        });
        let before = sync.store().lock().await.quotes().to_vec();

        let report = sync.sync_once(Some(ResolutionPolicy::Server)).await;
        assert!(report.skipped);
        assert!(!report.success);
        assert_eq!(report.errors, vec!["Sync is disabled".to_string()]);

        let result = sync.add_and_publish("Kept offline", "Test").await.unwrap();
        assert!(result.remote_id.is_none());
        assert!(result.error.is_some());

        let store = sync.store().lock().await;
        assert_eq!(store.len(), before.len() + 1);
        assert!(store.last_sync().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_store_untouched() {
        let sync = unreachable_service();
        let before = sync.store().lock().await.quotes().to_vec();

        let report = sync.sync_once(Some(ResolutionPolicy::Server)).await;

        assert!(!report.success);
        assert!(!report.skipped);
        assert_eq!(report.errors.len(), 1);
        let store = sync.store().lock().await;
        assert_eq!(store.quotes(), &before[..]);
        assert!(store.last_sync().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_publish_failure_keeps_local_quote() {
        let sync = unreachable_service();
        let result = sync.add_and_publish("Offline quote", "Test").await.unwrap();

        assert!(result.error.is_some());
        assert!(result.remote_id.is_none());
        let store = sync.store().lock().await;
        assert_eq!(store.quotes().last().unwrap().text, "Offline quote");
    }

    #[tokio::test]
    async fn test_invalid_quote_is_not_published() {
        let sync = unreachable_service();
        assert!(sync.add_and_publish("", "Test").await.is_err());
    }

    #[test]
    fn test_report_summaries() {
        let mut report = SyncReport::success();
        report.conflicts.push(Conflict::new(
            QuoteId::Number(3),
            Quote::with_id(3, "A", "X"),
            Quote::with_id(3, "A", "Y"),
        ));
        assert_eq!(report.conflict_summaries(), vec!["Quote 3 differs in category"]);
    }
}
