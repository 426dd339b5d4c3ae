//! Table creation and readiness polling.

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::try_join_all;
use futures_util::TryStreamExt;
use tokio::time::{sleep, Instant};

use dynamap_core::store::{codes, CreateTableRequest, ListTablesRequest, StoreClient};
use dynamap_core::{Error, Result};

use crate::executor::Executor;
use crate::pagination::paginate;

/// Cooperative cancellation signal for [`TableLifecycle::wait_until_ready`].
///
/// Clones share the same flag. The signal is only looked at once per
/// polling round.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal that also fires once `timeout` has passed.
    pub fn after(timeout: Duration) -> Self {
        Self {
            cancelled: Arc::default(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Outcome of waiting for tables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WaitReport {
    /// Polling rounds performed.
    pub rounds: u32,
    /// Tables still not ready when cancellation was observed; empty when
    /// every table became ready.
    pub pending: Vec<String>,
}

impl WaitReport {
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Creates missing tables and waits until tables are usable.
#[derive(Clone)]
pub struct TableLifecycle {
    store: Arc<dyn StoreClient>,
    executor: Executor,
    poll_interval: Duration,
}

impl TableLifecycle {
    pub fn new(store: Arc<dyn StoreClient>, executor: Executor, poll_interval: Duration) -> Self {
        Self {
            store,
            executor,
            poll_interval,
        }
    }

    /// Creates every table in `tables` that does not exist yet, then waits
    /// for the created tables and for `extra_wait` to become ready.
    ///
    /// A table created concurrently by someone else (`ResourceInUseException`)
    /// counts as created.
    pub async fn create_missing(
        &self,
        tables: &[CreateTableRequest],
        extra_wait: &[String],
        cancel: &Cancellation,
    ) -> Result<WaitReport> {
        let existing = self.existing_tables().await?;
        let mut touched = Vec::new();

        for request in tables {
            if existing.contains(&request.table_name) {
                tracing::debug!(table = %request.table_name, "Table already exists");
                continue;
            }

            let created = self
                .executor
                .execute_passthrough("create_table", &[codes::RESOURCE_IN_USE], || {
                    self.store.create_table(request.clone())
                })
                .await;

            match created {
                Ok(()) => tracing::info!(table = %request.table_name, "Created table"),
                Err(Error::Store(err)) if err.has_code(codes::RESOURCE_IN_USE) => {
                    tracing::debug!(table = %request.table_name, "Table is being created elsewhere");
                }
                Err(err) => return Err(err),
            }
            touched.push(request.table_name.clone());
        }

        let mut seen = HashSet::new();
        let wait: Vec<String> = touched
            .into_iter()
            .chain(extra_wait.iter().cloned())
            .filter(|name| seen.insert(name.clone()))
            .collect();

        self.wait_until_ready(&wait, cancel).await
    }

    /// Polls until every table reports `Active` or `cancel` fires.
    ///
    /// Each round describes all pending tables concurrently. A table that
    /// does not exist yet is still pending. The first describe that fails
    /// ends the wait with its error. Cancellation is not an error;
    /// the report lists the tables that were left.
    pub async fn wait_until_ready(
        &self,
        table_names: &[String],
        cancel: &Cancellation,
    ) -> Result<WaitReport> {
        let mut pending: BTreeSet<String> = table_names.iter().cloned().collect();
        let mut rounds = 0u32;

        while !pending.is_empty() {
            if rounds > 0 {
                sleep(self.poll_interval).await;
            }
            if cancel.is_cancelled() {
                tracing::warn!(rounds, pending = pending.len(), "Stopped waiting for tables");
                break;
            }
            rounds += 1;

            let checks = pending.iter().map(|name| async move {
                let ready = self.is_ready(name).await?;
                Ok::<_, Error>((name.clone(), ready))
            });

            // Any failed describe fails the whole round.
            let results = try_join_all(checks).await?;
            for (name, ready) in results {
                if ready {
                    tracing::debug!(table = %name, round = rounds, "Table is ready");
                    pending.remove(&name);
                }
            }
        }

        Ok(WaitReport {
            rounds,
            pending: pending.into_iter().collect(),
        })
    }

    async fn is_ready(&self, table_name: &str) -> Result<bool> {
        let described = self
            .executor
            .execute_passthrough("describe_table", &[codes::RESOURCE_NOT_FOUND], || {
                self.store.describe_table(table_name)
            })
            .await;

        match described {
            Ok(description) => Ok(description.is_ready()),
            Err(Error::Store(err)) if err.has_code(codes::RESOURCE_NOT_FOUND) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn existing_tables(&self) -> Result<HashSet<String>> {
        let store = Arc::clone(&self.store);
        paginate(
            self.executor.clone(),
            "list_tables",
            ListTablesRequest::default(),
            move |request: ListTablesRequest| {
                let store = Arc::clone(&store);
                async move { store.list_tables(request).await }
            },
            None,
        )
        .try_collect()
        .await
    }
}
