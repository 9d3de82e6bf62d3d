//! Normalization of raw API objects into snapshot records.
//!
//! Every function here is total: absent optional fields fall back to an empty
//! collection, `0` or `None` instead of failing the record.

use std::cmp::Reverse;

use k8s_openapi::api::{
    apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet},
    core::v1::{
        ConfigMap, Event, Namespace, Node, PersistentVolume, PersistentVolumeClaim, Secret,
        Service,
    },
    networking::v1::Ingress,
};
use kube::ResourceExt;

use crate::{
    api::ObjectList,
    model::{
        ConditionRecord, ConfigMapRecord, DaemonSetRecord, DeploymentRecord, EventRecord,
        IngressRecord, NamespaceRecord, NodeRecord, PersistentVolumeClaimRecord,
        PersistentVolumeRecord, ReplicaSetRecord, Section, SecretRecord, ServiceRecord,
        StatefulSetRecord,
    },
    utils::{keys, quantity},
};

mod pod;

pub use pod::pod;

/// Turns one list response into its snapshot section.
///
/// Events are the only kind that is reordered and truncated, see
/// [`recent_events`].
pub fn section(list: ObjectList, event_limit: usize) -> Section {
    match list {
        ObjectList::Nodes(items) => Section::Nodes(items.iter().map(node).collect()),
        ObjectList::PersistentVolumes(items) => {
            Section::PersistentVolumes(items.iter().map(persistent_volume).collect())
        }
        ObjectList::Namespaces(items) => {
            Section::Namespaces(items.iter().map(namespace).collect())
        }
        ObjectList::Pods(items) => Section::Pods(items.iter().map(pod).collect()),
        ObjectList::Deployments(items) => {
            Section::Deployments(items.iter().map(deployment).collect())
        }
        ObjectList::Services(items) => Section::Services(items.iter().map(service).collect()),
        ObjectList::Events(items) => Section::Events(recent_events(items, event_limit)),
        ObjectList::PersistentVolumeClaims(items) => {
            Section::PersistentVolumeClaims(items.iter().map(persistent_volume_claim).collect())
        }
        ObjectList::ConfigMaps(items) => {
            Section::ConfigMaps(items.iter().map(config_map).collect())
        }
        ObjectList::Secrets(items) => Section::Secrets(items.iter().map(secret).collect()),
        ObjectList::Ingresses(items) => Section::Ingresses(items.iter().map(ingress).collect()),
        ObjectList::ReplicaSets(items) => {
            Section::ReplicaSets(items.iter().map(replica_set).collect())
        }
        ObjectList::DaemonSets(items) => {
            Section::DaemonSets(items.iter().map(daemon_set).collect())
        }
        ObjectList::StatefulSets(items) => {
            Section::StatefulSets(items.iter().map(stateful_set).collect())
        }
    }
}

pub fn node(node: &Node) -> NodeRecord {
    let status = node.status.as_ref();
    let capacity = status.and_then(|s| s.capacity.as_ref());
    let conditions = status
        .and_then(|s| s.conditions.as_deref())
        .unwrap_or_default();

    let ready = conditions
        .iter()
        .any(|c| c.type_ == "Ready" && c.status == "True");

    NodeRecord {
        name: node.name_any(),
        status: if ready { "Ready" } else { "NotReady" }.to_string(),
        cpu_capacity: quantity(capacity, "cpu"),
        memory_capacity: quantity(capacity, "memory"),
        conditions: conditions
            .iter()
            .map(|c| ConditionRecord {
                type_: c.type_.clone(),
                status: c.status.clone(),
            })
            .collect(),
    }
}

pub fn deployment(deployment: &Deployment) -> DeploymentRecord {
    let status = deployment.status.as_ref();
    DeploymentRecord {
        name: deployment.name_any(),
        replicas: deployment
            .spec
            .as_ref()
            .and_then(|s| s.replicas)
            .unwrap_or(0),
        ready_replicas: status.and_then(|s| s.ready_replicas).unwrap_or(0),
        available_replicas: status.and_then(|s| s.available_replicas).unwrap_or(0),
    }
}

pub fn service(service: &Service) -> ServiceRecord {
    let spec = service.spec.as_ref();
    ServiceRecord {
        name: service.name_any(),
        type_: spec.and_then(|s| s.type_.clone()),
        cluster_ip: spec.and_then(|s| s.cluster_ip.clone()),
    }
}

/// Keeps the `limit` newest events, newest first.
///
/// Events without a creation timestamp sort as the oldest. The sort is stable,
/// so events with equal timestamps keep their API order.
pub fn recent_events(mut events: Vec<Event>, limit: usize) -> Vec<EventRecord> {
    events.sort_by_key(|e| Reverse(e.metadata.creation_timestamp.clone()));
    events.iter().take(limit).map(event).collect()
}

pub fn event(event: &Event) -> EventRecord {
    let involved = &event.involved_object;
    EventRecord {
        type_: event.type_.clone(),
        reason: event.reason.clone(),
        message: event.message.clone(),
        object: format!(
            "{}/{}",
            involved.kind.as_deref().unwrap_or_default(),
            involved.name.as_deref().unwrap_or_default()
        ),
    }
}

pub fn persistent_volume(pv: &PersistentVolume) -> PersistentVolumeRecord {
    let spec = pv.spec.as_ref();
    PersistentVolumeRecord {
        name: pv.name_any(),
        capacity: quantity(spec.and_then(|s| s.capacity.as_ref()), "storage"),
        access_modes: spec
            .and_then(|s| s.access_modes.clone())
            .unwrap_or_default(),
        status: pv.status.as_ref().and_then(|s| s.phase.clone()),
        reclaim_policy: spec.and_then(|s| s.persistent_volume_reclaim_policy.clone()),
        storage_class: spec.and_then(|s| s.storage_class_name.clone()),
    }
}

pub fn persistent_volume_claim(pvc: &PersistentVolumeClaim) -> PersistentVolumeClaimRecord {
    let spec = pvc.spec.as_ref();
    let status = pvc.status.as_ref();
    PersistentVolumeClaimRecord {
        name: pvc.name_any(),
        status: status.and_then(|s| s.phase.clone()),
        capacity: quantity(status.and_then(|s| s.capacity.as_ref()), "storage"),
        access_modes: spec
            .and_then(|s| s.access_modes.clone())
            .unwrap_or_default(),
        storage_class: spec.and_then(|s| s.storage_class_name.clone()),
        volume_name: spec.and_then(|s| s.volume_name.clone()),
    }
}

pub fn config_map(cm: &ConfigMap) -> ConfigMapRecord {
    ConfigMapRecord {
        name: cm.name_any(),
        data_keys: keys(cm.data.as_ref()),
        binary_data_keys: keys(cm.binary_data.as_ref()),
    }
}

/// Only key names leave the cluster, never secret values.
pub fn secret(secret: &Secret) -> SecretRecord {
    SecretRecord {
        name: secret.name_any(),
        type_: secret.type_.clone(),
        data_keys: keys(secret.data.as_ref()),
    }
}

pub fn ingress(ingress: &Ingress) -> IngressRecord {
    let spec = ingress.spec.as_ref();
    IngressRecord {
        name: ingress.name_any(),
        hosts: spec
            .and_then(|s| s.rules.as_deref())
            .unwrap_or_default()
            .iter()
            .filter_map(|r| r.host.clone())
            .filter(|h| !h.is_empty())
            .collect(),
        tls: spec
            .and_then(|s| s.tls.as_deref())
            .is_some_and(|tls| !tls.is_empty()),
        class_name: spec.and_then(|s| s.ingress_class_name.clone()),
    }
}

pub fn replica_set(rs: &ReplicaSet) -> ReplicaSetRecord {
    let status = rs.status.as_ref();
    ReplicaSetRecord {
        name: rs.name_any(),
        replicas: rs.spec.as_ref().and_then(|s| s.replicas).unwrap_or(0),
        ready_replicas: status.and_then(|s| s.ready_replicas).unwrap_or(0),
        available_replicas: status.and_then(|s| s.available_replicas).unwrap_or(0),
        owner: rs.owner_references().first().map(|o| o.name.clone()),
    }
}

pub fn daemon_set(ds: &DaemonSet) -> DaemonSetRecord {
    let status = ds.status.as_ref();
    DaemonSetRecord {
        name: ds.name_any(),
        desired: status.map(|s| s.desired_number_scheduled).unwrap_or(0),
        current: status.map(|s| s.current_number_scheduled).unwrap_or(0),
        ready: status.map(|s| s.number_ready).unwrap_or(0),
        available: status.and_then(|s| s.number_available).unwrap_or(0),
    }
}

pub fn stateful_set(sts: &StatefulSet) -> StatefulSetRecord {
    let status = sts.status.as_ref();
    StatefulSetRecord {
        name: sts.name_any(),
        replicas: sts.spec.as_ref().and_then(|s| s.replicas).unwrap_or(0),
        ready_replicas: status.and_then(|s| s.ready_replicas).unwrap_or(0),
        current_replicas: status.and_then(|s| s.current_replicas).unwrap_or(0),
        updated_replicas: status.and_then(|s| s.updated_replicas).unwrap_or(0),
    }
}

pub fn namespace(ns: &Namespace) -> NamespaceRecord {
    NamespaceRecord {
        name: ns.name_any(),
        status: ns.status.as_ref().and_then(|s| s.phase.clone()),
        created: ns.creation_timestamp(),
    }
}
