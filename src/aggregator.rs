use std::{
    any::Any,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
    time::Duration,
};

use futures_util::FutureExt;
use tokio::{task::JoinSet, time::timeout};
use tracing::{debug, info, warn};

use crate::{
    api::{ClusterApi, KindError, ObjectList},
    config::{Config, DEFAULT_EVENT_LIMIT, DEFAULT_KIND_TIMEOUT},
    extract,
    kind::ResourceKind,
    model::{Section, Snapshot},
};

/// Builds [`Snapshot`]s from a shared [`ClusterApi`] handle.
///
/// Every kind is fetched on its own task. A kind that fails only marks its
/// own section with `<kind>_error`; the rest of the snapshot is unaffected.
/// Dropping a pending [`Aggregator::collect`] aborts the tasks it started.
#[derive(Clone)]
pub struct Aggregator {
    api: Arc<dyn ClusterApi>,
    kind_timeout: Duration,
    event_limit: usize,
}

impl Aggregator {
    pub fn new(api: Arc<dyn ClusterApi>) -> Self {
        Self {
            api,
            kind_timeout: DEFAULT_KIND_TIMEOUT,
            event_limit: DEFAULT_EVENT_LIMIT,
        }
    }

    pub fn from_config(api: Arc<dyn ClusterApi>, config: &Config) -> Self {
        Self::new(api)
            .with_kind_timeout(config.kind_timeout)
            .with_event_limit(config.event_limit)
    }

    pub fn with_kind_timeout(mut self, kind_timeout: Duration) -> Self {
        self.kind_timeout = kind_timeout;
        self
    }

    pub fn with_event_limit(mut self, event_limit: usize) -> Self {
        self.event_limit = event_limit;
        self
    }

    #[tracing::instrument(skip(self))]
    pub async fn collect(&self, namespace: &str) -> Snapshot {
        let mut snapshot = Snapshot::new(namespace);

        let mut tasks = JoinSet::new();
        for (i, kind) in ResourceKind::ALL.into_iter().enumerate() {
            let this = self.clone();
            let namespace = namespace.to_string();
            tasks.spawn(async move { (i, this.collect_kind(kind, &namespace).await) });
        }

        let mut results: [Option<Result<Section, KindError>>; ResourceKind::ALL.len()] =
            std::array::from_fn(|_| None);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((i, result)) => results[i] = Some(result),
                Err(e) => warn!("Snapshot task did not finish: {e}"),
            }
        }

        let mut attempted = 0;
        let mut total_errors = Vec::new();

        for (kind, result) in ResourceKind::ALL.into_iter().zip(results) {
            let result =
                result.unwrap_or_else(|| Err(KindError::Panicked("task cancelled".to_string())));
            match result {
                Ok(section) => {
                    attempted += 1;
                    debug!("{kind}: {} record(s)", section.len());
                    snapshot.insert(section);
                }
                Err(KindError::Unsupported(_)) => {
                    debug!("{kind}: not served, leaving the section empty");
                }
                Err(e) => {
                    attempted += 1;
                    warn!("{kind}: {e}");
                    if e.is_total() {
                        total_errors.push(e.to_string());
                    }
                    snapshot.record_error(kind, e.to_string());
                }
            }
        }

        // Every kind failed the same way: the connection or its credentials
        // are broken, not any single resource.
        if attempted > 0 && total_errors.len() == attempted {
            snapshot.error = total_errors.into_iter().next();
        }

        info!(
            "Collected snapshot of {namespace}: {} failed kind(s){}",
            snapshot.kind_errors.len(),
            if snapshot.error.is_some() {
                ", cluster unreachable"
            } else {
                ""
            }
        );

        snapshot
    }

    /// Names of every object of one kind, under the same guards as
    /// [`Aggregator::collect`].
    pub async fn names(&self, kind: ResourceKind, namespace: &str) -> Result<Vec<String>, KindError> {
        let list = self.list(kind, namespace).await?;
        Ok(list.names())
    }

    async fn collect_kind(&self, kind: ResourceKind, namespace: &str) -> Result<Section, KindError> {
        let list = AssertUnwindSafe(self.list(kind, namespace))
            .catch_unwind()
            .await
            .map_err(|payload| KindError::Panicked(panic_message(payload)))??;
        catch_extraction(|| extract::section(list, self.event_limit))
    }

    async fn list(&self, kind: ResourceKind, namespace: &str) -> Result<ObjectList, KindError> {
        if !self.api.supports(kind) {
            return Err(KindError::Unsupported(kind));
        }
        timeout(self.kind_timeout, self.api.list(kind, namespace))
            .await
            .map_err(|_| KindError::Timeout(self.kind_timeout))?
    }
}

fn catch_extraction(run: impl FnOnce() -> Section) -> Result<Section, KindError> {
    catch_unwind(AssertUnwindSafe(run))
        .map_err(|payload| KindError::Extraction(panic_message(payload)))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(msg) => *msg,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(msg) => msg.to_string(),
            Err(_) => "panic".to_string(),
        },
    }
}
