//! Best-effort enumeration of the api resources a cluster serves
//!
//! Discovery runs in two phases. Phase one asks the two top level endpoints
//! (`/api` and `/apis`) which group versions exist; phase two probes every
//! group version for its resource kinds and keeps the ones that can be
//! listed. All requests go through one [`RequestGate`] so a cluster with many
//! api groups sees at most a handful of concurrent discovery calls, and each
//! request failure is contained to the group it was probing.
use std::{future::Future, time::Duration};

use futures::future;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::{
    client::{PATH_CORE, PATH_GROUPS},
    meta::verbs,
    Client, Result,
};

/// Default cap on concurrent discovery requests against one apiserver.
const DEFAULT_CONCURRENCY: usize = 5;

/// A listable resource kind served by the cluster.
#[derive(Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredResource {
    /// Plural name used in api paths, e.g. `deployments`
    pub api_name: String,
    /// Singular PascalCase kind, e.g. `Deployment`
    pub kind: String,
    /// Group the resource was found under
    ///
    /// For entries found via `/api` this is the core version string (`v1`),
    /// matching how the apiserver partitions its discovery endpoints.
    pub group: String,
}

/// One group version to probe for resources in phase two.
struct ResourceListGroup {
    group: String,
    path: String,
}

/// Admission control for outbound discovery requests.
///
/// One gate instance is shared across a whole run, so the cap applies to both
/// discovery phases together. Queued tasks start in submission order as slots
/// free up. The gate never inspects task outcomes.
struct RequestGate(Semaphore);

impl RequestGate {
    fn new(permits: usize) -> Self {
        Self(Semaphore::new(permits))
    }

    /// Runs `fut` once a slot is free, holding the slot until it resolves.
    async fn run<F: Future>(&self, fut: F) -> F::Output {
        let _permit = self.0.acquire().await.expect("gate semaphore is never closed");
        fut.await
    }
}

/// Issues one gated request, absorbing any failure into a log event.
///
/// This is the isolation point for the whole engine: a group version that
/// cannot be fetched resolves to `None` here and affects nothing else.
async fn try_request<T, F>(gate: &RequestGate, path: &str, call: F) -> Option<T>
where
    F: Future<Output = Result<T>>,
{
    match gate.run(call).await {
        Ok(payload) => Some(payload),
        Err(err) => {
            tracing::error!("request {path} failed: {err}");
            None
        }
    }
}

/// A best-effort lister of every resource kind a cluster can enumerate.
///
/// Construct one per cluster [`Client`] and call [`ResourceLister::run`] for
/// each discovery pass:
///
/// ```no_run
/// # async fn doc(client: kube_lister::Client) {
/// use kube_lister::ResourceLister;
///
/// let lister = ResourceLister::new(client);
/// for resource in lister.run().await {
///     println!("can list {} in group {}", resource.api_name, resource.group);
/// }
/// # }
/// ```
///
/// `run` never fails: requests that error are logged and skipped, so an empty
/// result can mean either an empty cluster or a cluster that refused every
/// discovery request. Callers that need to tell these apart must consult the
/// logs rather than the return value.
pub struct ResourceLister {
    client: Client,
    concurrency: usize,
    timeout: Option<Duration>,
}

impl ResourceLister {
    /// Construct a lister for the given cluster with the default request cap.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            concurrency: DEFAULT_CONCURRENCY,
            timeout: None,
        }
    }

    /// Override the cap on concurrent discovery requests.
    #[must_use]
    pub fn concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit;
        self
    }

    /// Bound the total duration of one discovery run.
    ///
    /// Without a timeout a run waits for every request to settle, so a single
    /// hung group version stalls the whole run. With one, a run that exceeds
    /// the bound logs a failure event and returns whatever was collected.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Performs one full discovery run.
    ///
    /// Each call is a fresh pass over the cluster's discovery endpoints;
    /// nothing is cached between calls and duplicates across group versions
    /// are preserved as the apiserver returned them. Result order follows
    /// response completion and is not stable across runs.
    pub async fn run(&self) -> Vec<DiscoveredResource> {
        let found = Mutex::new(Vec::new());
        match self.timeout {
            Some(limit) => {
                if tokio::time::timeout(limit, self.scan(&found)).await.is_err() {
                    tracing::error!(
                        "failed to list api resources: timed out after {limit:?}, returning partial results"
                    );
                }
            }
            None => self.scan(&found).await,
        }
        found.into_inner()
    }

    async fn scan(&self, found: &Mutex<Vec<DiscoveredResource>>) {
        let gate = RequestGate::new(self.concurrency);
        let gate = &gate;

        // Phase one: find out which group versions to probe. Either branch
        // failing just means that branch contributes no groups.
        let core = async {
            let mut groups = Vec::new();
            let versions = try_request(gate, PATH_CORE, self.client.list_core_api_versions()).await;
            if let Some(core) = versions {
                for version in core.versions {
                    groups.push(ResourceListGroup {
                        path: format!("{PATH_CORE}/{version}"),
                        group: version,
                    });
                }
            }
            groups
        };
        let apis = async {
            let mut groups = Vec::new();
            let list = try_request(gate, PATH_GROUPS, self.client.list_api_groups()).await;
            if let Some(list) = list {
                for group in list.groups {
                    // groups that declare no preferred version are not probed
                    if let Some(preferred) = group.preferred_version {
                        groups.push(ResourceListGroup {
                            path: format!("{PATH_GROUPS}/{}", preferred.group_version),
                            group: group.name,
                        });
                    }
                }
            }
            groups
        };
        let (mut groups, grouped) = future::join(core, apis).await;
        groups.extend(grouped);
        tracing::debug!("probing {} group versions", groups.len());

        // Phase two: fetch every group version's resource list, appending the
        // listable kinds as each response lands.
        future::join_all(groups.into_iter().map(|ResourceListGroup { group, path }| async move {
            let list = try_request(gate, &path, self.client.list_api_group_resources(&path)).await;
            let Some(list) = list else { return };
            let mut found = found.lock();
            for resource in list.resources {
                if resource.verbs.iter().any(|v| v == verbs::LIST) {
                    found.push(DiscoveredResource {
                        api_name: resource.name,
                        kind: resource.kind,
                        group: group.clone(),
                    });
                }
            }
        }))
        .await;
    }
}
