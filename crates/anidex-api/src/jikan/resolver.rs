//! Sequential batch resolution with progress reporting.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::instrument;

use super::api::LocalCatalogApi;
use super::dispatcher::Dispatcher;
use super::types::Anime;
use crate::error::{ApiError, Result};

/// Default delay between two identifiers of a batch.
pub const DEFAULT_ITEM_DELAY: Duration = Duration::from_millis(300);

/// Batch progress passed to the caller after every identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Identifiers attempted so far.
    pub completed: usize,
    /// Identifiers in the batch.
    pub total: usize,
}

impl Progress {
    /// Completion percentage, rounded to the nearest integer.
    ///
    /// An empty batch is reported as complete.
    #[must_use]
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            return 100;
        }
        self.completed
            .checked_mul(100)
            .and_then(|scaled| scaled.checked_add(self.total / 2))
            .and_then(|scaled| scaled.checked_div(self.total))
            .unwrap_or(100)
    }
}

/// Resolves identifiers one at a time, tolerating per-item failures.
///
/// When paced by a [`Dispatcher`], the resolver first waits out the
/// dispatcher's post-call spacing and only then starts its own item delay,
/// so a batch of `k` ids takes at least `k * spacing + (k - 1) * item_delay`.
#[derive(Debug, Clone)]
pub struct AggregateResolver {
    /// Wait inserted between two identifiers.
    item_delay: Duration,
    /// Dispatcher whose spacing is awaited after every identifier.
    pacing: Option<Dispatcher>,
}

impl Default for AggregateResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ITEM_DELAY)
    }
}

impl AggregateResolver {
    /// Creates a resolver waiting `item_delay` between identifiers.
    #[must_use]
    pub const fn new(item_delay: Duration) -> Self {
        Self {
            item_delay,
            pacing: None,
        }
    }

    /// Adds `dispatcher`'s spacing on top of the item delay.
    #[must_use]
    pub fn paced_by(mut self, dispatcher: Dispatcher) -> Self {
        self.pacing = Some(dispatcher);
        self
    }

    /// Delay between identifiers.
    #[must_use]
    pub const fn item_delay(&self) -> Duration {
        self.item_delay
    }

    /// Fetches every identifier in input order and returns the successes.
    ///
    /// `on_progress` is called once per identifier, after its attempt,
    /// whatever the outcome. Failed identifiers are logged and skipped.
    #[instrument(skip_all, fields(total = ids.len()))]
    pub async fn resolve_all<I, T, F, Fut, P>(
        &self,
        ids: &[I],
        mut fetch_one: F,
        mut on_progress: P,
    ) -> Vec<T>
    where
        I: Display,
        F: FnMut(&I) -> Fut,
        Fut: Future<Output = Result<T>>,
        P: FnMut(Progress),
    {
        let total = ids.len();
        let mut resolved = Vec::with_capacity(total);

        for (index, id) in ids.iter().enumerate() {
            match fetch_one(id).await {
                Ok(record) => resolved.push(record),
                Err(e) => tracing::warn!(%id, error = %e, "failed to resolve item, skipping"),
            }

            let completed = index.saturating_add(1);
            on_progress(Progress { completed, total });

            if let Some(dispatcher) = &self.pacing {
                dispatcher.spacing_elapsed().await;
            }
            if completed < total && !self.item_delay.is_zero() {
                tokio::time::sleep(self.item_delay).await;
            }
        }

        tracing::debug!(resolved = resolved.len(), total, "batch resolved");
        resolved
    }

    /// Resolves opaque title identifiers through `anime_details`.
    ///
    /// An identifier that is not a catalog id counts as a failed item.
    pub async fn resolve_titles<A, P>(&self, api: &A, ids: &[String], on_progress: P) -> Vec<Anime>
    where
        A: LocalCatalogApi + Sync,
        P: FnMut(Progress),
    {
        self.resolve_all(
            ids,
            |id| {
                let parsed = id.trim().parse::<u64>();
                let raw = id.clone();
                async move {
                    let mal_id = parsed
                        .map_err(|e| ApiError::InvalidRequest(format!("invalid id {raw:?}: {e}")))?;
                    api.anime_details(mal_id).await
                }
            },
            on_progress,
        )
        .await
    }
}
