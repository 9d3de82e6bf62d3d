use std::fmt;

use serde::Serialize;

/// Whether a kind is listed across the cluster or within one namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Cluster,
    Namespaced,
}

/// Every resource kind that ends up in a snapshot.
///
/// The declaration order is the collection order and the order of the
/// sections in the serialized document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Nodes,
    PersistentVolumes,
    Namespaces,
    Pods,
    Deployments,
    Services,
    Events,
    PersistentVolumeClaims,
    ConfigMaps,
    Secrets,
    Ingresses,
    ReplicaSets,
    DaemonSets,
    StatefulSets,
}

struct KindInfo {
    key: &'static str,
    group_version: &'static str,
    scope: Scope,
    optional: bool,
}

const fn info(
    key: &'static str,
    group_version: &'static str,
    scope: Scope,
    optional: bool,
) -> KindInfo {
    KindInfo {
        key,
        group_version,
        scope,
        optional,
    }
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 14] = [
        ResourceKind::Nodes,
        ResourceKind::PersistentVolumes,
        ResourceKind::Namespaces,
        ResourceKind::Pods,
        ResourceKind::Deployments,
        ResourceKind::Services,
        ResourceKind::Events,
        ResourceKind::PersistentVolumeClaims,
        ResourceKind::ConfigMaps,
        ResourceKind::Secrets,
        ResourceKind::Ingresses,
        ResourceKind::ReplicaSets,
        ResourceKind::DaemonSets,
        ResourceKind::StatefulSets,
    ];

    const fn info(self) -> KindInfo {
        use Scope::*;
        match self {
            ResourceKind::Nodes => info("nodes", "v1", Cluster, false),
            ResourceKind::PersistentVolumes => info("persistent_volumes", "v1", Cluster, false),
            ResourceKind::Namespaces => info("namespaces", "v1", Cluster, false),
            ResourceKind::Pods => info("pods", "v1", Namespaced, false),
            ResourceKind::Deployments => info("deployments", "apps/v1", Namespaced, false),
            ResourceKind::Services => info("services", "v1", Namespaced, false),
            ResourceKind::Events => info("events", "v1", Namespaced, false),
            ResourceKind::PersistentVolumeClaims => {
                info("persistent_volume_claims", "v1", Namespaced, false)
            }
            ResourceKind::ConfigMaps => info("config_maps", "v1", Namespaced, false),
            ResourceKind::Secrets => info("secrets", "v1", Namespaced, false),
            ResourceKind::Ingresses => {
                info("ingresses", "networking.k8s.io/v1", Namespaced, true)
            }
            ResourceKind::ReplicaSets => info("replica_sets", "apps/v1", Namespaced, false),
            ResourceKind::DaemonSets => info("daemon_sets", "apps/v1", Namespaced, false),
            ResourceKind::StatefulSets => info("stateful_sets", "apps/v1", Namespaced, false),
        }
    }

    /// Top-level key of this kind's section in a snapshot.
    pub const fn key(self) -> &'static str {
        self.info().key
    }

    pub fn error_key(self) -> String {
        format!("{}_error", self.key())
    }

    /// API group/version the list call goes to; `v1` is the core group.
    pub const fn group_version(self) -> &'static str {
        self.info().group_version
    }

    pub const fn scope(self) -> Scope {
        self.info().scope
    }

    /// Kinds whose API group may legitimately be missing from a cluster.
    pub const fn is_optional(self) -> bool {
        self.info().optional
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
