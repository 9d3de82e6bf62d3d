//! Access to the Kubernetes API, one list call per [`ResourceKind`].
//!
//! The aggregator only talks to [`ClusterApi`]. [`KubeClusterApi`] is the
//! implementation backed by a [`kube::Client`]; tests substitute a fake.

use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::{
    apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet},
    core::v1::{
        ConfigMap, Event, Namespace, Node, PersistentVolume, PersistentVolumeClaim, Pod, Secret,
        Service,
    },
    networking::v1::Ingress,
};
use kube::ResourceExt;
use thiserror::Error;

use crate::kind::ResourceKind;

mod client;
#[cfg(test)]
pub(crate) mod fake;

pub use client::{Capabilities, KubeClusterApi};

/// Why one resource kind could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KindError {
    /// The API server answered with an error status.
    #[error("{code} {reason}")]
    Api { code: u16, reason: String },
    /// The kind is not served by this cluster. Expected version skew, not a
    /// failure.
    #[error("{0} is not served by this cluster")]
    Unsupported(ResourceKind),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// The request never produced an API response (connection, TLS, auth
    /// plugin, decoding).
    #[error("{0}")]
    Transport(String),
    /// Turning the listed objects into records blew up.
    #[error("extraction failed: {0}")]
    Extraction(String),
    /// The list call itself panicked, or its task never finished.
    #[error("list call panicked: {0}")]
    Panicked(String),
}

impl KindError {
    /// Faults that say nothing about the kind and everything about the
    /// connection: no API response at all, or rejected credentials.
    pub fn is_total(&self) -> bool {
        matches!(
            self,
            KindError::Transport(_) | KindError::Api { code: 401, .. }
        )
    }
}

impl From<kube::Error> for KindError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(resp) => KindError::Api {
                code: resp.code,
                reason: resp.reason,
            },
            other => KindError::Transport(other.to_string()),
        }
    }
}

/// The raw objects returned by one list call, tagged by kind.
#[derive(Debug, Clone)]
pub enum ObjectList {
    Nodes(Vec<Node>),
    PersistentVolumes(Vec<PersistentVolume>),
    Namespaces(Vec<Namespace>),
    Pods(Vec<Pod>),
    Deployments(Vec<Deployment>),
    Services(Vec<Service>),
    Events(Vec<Event>),
    PersistentVolumeClaims(Vec<PersistentVolumeClaim>),
    ConfigMaps(Vec<ConfigMap>),
    Secrets(Vec<Secret>),
    Ingresses(Vec<Ingress>),
    ReplicaSets(Vec<ReplicaSet>),
    DaemonSets(Vec<DaemonSet>),
    StatefulSets(Vec<StatefulSet>),
}

fn names_of<K: ResourceExt>(items: &[K]) -> Vec<String> {
    items.iter().map(ResourceExt::name_any).collect()
}

impl ObjectList {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ObjectList::Nodes(_) => ResourceKind::Nodes,
            ObjectList::PersistentVolumes(_) => ResourceKind::PersistentVolumes,
            ObjectList::Namespaces(_) => ResourceKind::Namespaces,
            ObjectList::Pods(_) => ResourceKind::Pods,
            ObjectList::Deployments(_) => ResourceKind::Deployments,
            ObjectList::Services(_) => ResourceKind::Services,
            ObjectList::Events(_) => ResourceKind::Events,
            ObjectList::PersistentVolumeClaims(_) => ResourceKind::PersistentVolumeClaims,
            ObjectList::ConfigMaps(_) => ResourceKind::ConfigMaps,
            ObjectList::Secrets(_) => ResourceKind::Secrets,
            ObjectList::Ingresses(_) => ResourceKind::Ingresses,
            ObjectList::ReplicaSets(_) => ResourceKind::ReplicaSets,
            ObjectList::DaemonSets(_) => ResourceKind::DaemonSets,
            ObjectList::StatefulSets(_) => ResourceKind::StatefulSets,
        }
    }

    /// Object names in API order.
    pub fn names(&self) -> Vec<String> {
        match self {
            ObjectList::Nodes(v) => names_of(v),
            ObjectList::PersistentVolumes(v) => names_of(v),
            ObjectList::Namespaces(v) => names_of(v),
            ObjectList::Pods(v) => names_of(v),
            ObjectList::Deployments(v) => names_of(v),
            ObjectList::Services(v) => names_of(v),
            ObjectList::Events(v) => names_of(v),
            ObjectList::PersistentVolumeClaims(v) => names_of(v),
            ObjectList::ConfigMaps(v) => names_of(v),
            ObjectList::Secrets(v) => names_of(v),
            ObjectList::Ingresses(v) => names_of(v),
            ObjectList::ReplicaSets(v) => names_of(v),
            ObjectList::DaemonSets(v) => names_of(v),
            ObjectList::StatefulSets(v) => names_of(v),
        }
    }
}

#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Whether this cluster serves `kind` at all. Unsupported kinds are
    /// skipped without a request.
    fn supports(&self, _kind: ResourceKind) -> bool {
        true
    }

    /// Lists every object of `kind`. `namespace` is ignored for
    /// cluster-scoped kinds.
    async fn list(&self, kind: ResourceKind, namespace: &str) -> Result<ObjectList, KindError>;
}

#[cfg(test)]
mod tests {
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use kube::core::ErrorResponse;

    use super::*;

    #[test]
    fn api_errors_keep_code_and_reason() {
        let err: KindError = kube::Error::Api(ErrorResponse {
            status: "Failure".into(),
            message: "pods is forbidden: User \"system:anonymous\" cannot list".into(),
            reason: "Forbidden".into(),
            code: 403,
        })
        .into();
        assert_eq!(
            err,
            KindError::Api {
                code: 403,
                reason: "Forbidden".into()
            }
        );
        assert_eq!(err.to_string(), "403 Forbidden");
        assert!(!err.is_total());
    }

    #[test]
    fn display_formats() {
        assert_eq!(
            KindError::Timeout(Duration::from_secs(10)).to_string(),
            "timed out after 10s"
        );
        assert_eq!(
            KindError::Unsupported(ResourceKind::Ingresses).to_string(),
            "ingresses is not served by this cluster"
        );
        assert_eq!(
            KindError::Panicked("boom".into()).to_string(),
            "list call panicked: boom"
        );
    }

    #[test]
    fn rejected_credentials_count_as_total() {
        let unauthorized = KindError::Api {
            code: 401,
            reason: "Unauthorized".into(),
        };
        let forbidden = KindError::Api {
            code: 403,
            reason: "Forbidden".into(),
        };
        assert!(unauthorized.is_total());
        assert!(!forbidden.is_total());
        assert!(KindError::Transport("connection refused".into()).is_total());
        assert!(!KindError::Timeout(Duration::from_secs(1)).is_total());
    }

    #[test]
    fn names_follow_api_order() {
        let pod = |name: &str| Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..ObjectMeta::default()
            },
            ..Pod::default()
        };
        let list = ObjectList::Pods(vec![pod("b"), pod("a")]);
        assert_eq!(list.kind(), ResourceKind::Pods);
        assert_eq!(list.names(), ["b", "a"]);
    }
}
