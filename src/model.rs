use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use serde::{Deserialize, Serialize};

use crate::kind::ResourceKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRecord {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub name: String,
    pub status: String,
    pub cpu_capacity: Option<String>,
    pub memory_capacity: Option<String>,
    pub conditions: Vec<ConditionRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortRecord {
    pub name: Option<String>,
    pub container_port: i32,
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourcesRecord {
    pub requests: BTreeMap<String, String>,
    pub limits: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeMountRecord {
    pub name: String,
    pub mount_path: String,
    pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub name: String,
    pub image: Option<String>,
    pub ports: Vec<PortRecord>,
    pub resources: ResourcesRecord,
    pub env_count: usize,
    pub volume_mounts: Vec<VolumeMountRecord>,
}

/// Current or last state of a container. Serialized with a `state` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ContainerStateDetail {
    Running {
        started_at: Option<Time>,
    },
    Waiting {
        reason: Option<String>,
        message: Option<String>,
    },
    Terminated {
        exit_code: i32,
        reason: Option<String>,
        message: Option<String>,
        started_at: Option<Time>,
        finished_at: Option<Time>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerStatusRecord {
    pub name: String,
    pub ready: bool,
    pub restart_count: i32,
    pub state: Option<ContainerStateDetail>,
    pub last_state: Option<ContainerStateDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VolumeSourceRecord {
    ConfigMap { config_map: Option<String> },
    Secret { secret: Option<String> },
    PersistentVolumeClaim { claim_name: String },
    EmptyDir,
    HostPath { path: String },
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeRecord {
    pub name: String,
    #[serde(flatten)]
    pub source: VolumeSourceRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodRecord {
    pub name: String,
    /// Pod phase.
    pub status: Option<String>,
    pub ready: usize,
    pub total_containers: usize,
    pub restart_count: i32,
    pub node: Option<String>,
    pub created: Option<Time>,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub service_account: Option<String>,
    pub restart_policy: Option<String>,
    pub dns_policy: Option<String>,
    pub pod_ip: Option<String>,
    pub host_ip: Option<String>,
    pub qos_class: Option<String>,
    pub containers: Vec<ContainerRecord>,
    pub container_states: Vec<ContainerStatusRecord>,
    pub conditions: Vec<ConditionRecord>,
    pub volumes: Vec<VolumeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub name: String,
    pub replicas: i32,
    pub ready_replicas: i32,
    pub available_replicas: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub cluster_ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub reason: Option<String>,
    pub message: Option<String>,
    pub object: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistentVolumeRecord {
    pub name: String,
    pub capacity: Option<String>,
    pub access_modes: Vec<String>,
    pub status: Option<String>,
    pub reclaim_policy: Option<String>,
    pub storage_class: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistentVolumeClaimRecord {
    pub name: String,
    pub status: Option<String>,
    pub capacity: Option<String>,
    pub access_modes: Vec<String>,
    pub storage_class: Option<String>,
    pub volume_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMapRecord {
    pub name: String,
    pub data_keys: Vec<String>,
    pub binary_data_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub data_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngressRecord {
    pub name: String,
    pub hosts: Vec<String>,
    pub tls: bool,
    pub class_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicaSetRecord {
    pub name: String,
    pub replicas: i32,
    pub ready_replicas: i32,
    pub available_replicas: i32,
    pub owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonSetRecord {
    pub name: String,
    pub desired: i32,
    pub current: i32,
    pub ready: i32,
    pub available: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatefulSetRecord {
    pub name: String,
    pub replicas: i32,
    pub ready_replicas: i32,
    pub current_replicas: i32,
    pub updated_replicas: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceRecord {
    pub name: String,
    pub status: Option<String>,
    pub created: Option<Time>,
}

/// Extracted records of one kind, ready to be merged into a [`Snapshot`].
#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    Nodes(Vec<NodeRecord>),
    PersistentVolumes(Vec<PersistentVolumeRecord>),
    Namespaces(Vec<NamespaceRecord>),
    Pods(Vec<PodRecord>),
    Deployments(Vec<DeploymentRecord>),
    Services(Vec<ServiceRecord>),
    Events(Vec<EventRecord>),
    PersistentVolumeClaims(Vec<PersistentVolumeClaimRecord>),
    ConfigMaps(Vec<ConfigMapRecord>),
    Secrets(Vec<SecretRecord>),
    Ingresses(Vec<IngressRecord>),
    ReplicaSets(Vec<ReplicaSetRecord>),
    DaemonSets(Vec<DaemonSetRecord>),
    StatefulSets(Vec<StatefulSetRecord>),
}

impl Section {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Section::Nodes(_) => ResourceKind::Nodes,
            Section::PersistentVolumes(_) => ResourceKind::PersistentVolumes,
            Section::Namespaces(_) => ResourceKind::Namespaces,
            Section::Pods(_) => ResourceKind::Pods,
            Section::Deployments(_) => ResourceKind::Deployments,
            Section::Services(_) => ResourceKind::Services,
            Section::Events(_) => ResourceKind::Events,
            Section::PersistentVolumeClaims(_) => ResourceKind::PersistentVolumeClaims,
            Section::ConfigMaps(_) => ResourceKind::ConfigMaps,
            Section::Secrets(_) => ResourceKind::Secrets,
            Section::Ingresses(_) => ResourceKind::Ingresses,
            Section::ReplicaSets(_) => ResourceKind::ReplicaSets,
            Section::DaemonSets(_) => ResourceKind::DaemonSets,
            Section::StatefulSets(_) => ResourceKind::StatefulSets,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Section::Nodes(v) => v.len(),
            Section::PersistentVolumes(v) => v.len(),
            Section::Namespaces(v) => v.len(),
            Section::Pods(v) => v.len(),
            Section::Deployments(v) => v.len(),
            Section::Services(v) => v.len(),
            Section::Events(v) => v.len(),
            Section::PersistentVolumeClaims(v) => v.len(),
            Section::ConfigMaps(v) => v.len(),
            Section::Secrets(v) => v.len(),
            Section::Ingresses(v) => v.len(),
            Section::ReplicaSets(v) => v.len(),
            Section::DaemonSets(v) => v.len(),
            Section::StatefulSets(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Point-in-time view of a namespace and the cluster around it.
///
/// Every kind section is always serialized, even when empty. A kind that
/// could not be read additionally gets a `<kind>_error` entry, and a
/// snapshot where nothing could be read at all carries `error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: String,
    pub namespace: String,
    pub nodes: Vec<NodeRecord>,
    pub persistent_volumes: Vec<PersistentVolumeRecord>,
    pub namespaces: Vec<NamespaceRecord>,
    pub pods: Vec<PodRecord>,
    pub deployments: Vec<DeploymentRecord>,
    pub services: Vec<ServiceRecord>,
    pub events: Vec<EventRecord>,
    pub persistent_volume_claims: Vec<PersistentVolumeClaimRecord>,
    pub config_maps: Vec<ConfigMapRecord>,
    pub secrets: Vec<SecretRecord>,
    pub ingresses: Vec<IngressRecord>,
    pub replica_sets: Vec<ReplicaSetRecord>,
    pub daemon_sets: Vec<DaemonSetRecord>,
    pub stateful_sets: Vec<StatefulSetRecord>,
    /// `<kind>_error` entries, flattened into the top level.
    #[serde(flatten)]
    pub kind_errors: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Snapshot {
    pub fn new(namespace: &str) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            namespace: namespace.to_string(),
            ..Default::default()
        }
    }

    pub fn insert(&mut self, section: Section) {
        match section {
            Section::Nodes(v) => self.nodes = v,
            Section::PersistentVolumes(v) => self.persistent_volumes = v,
            Section::Namespaces(v) => self.namespaces = v,
            Section::Pods(v) => self.pods = v,
            Section::Deployments(v) => self.deployments = v,
            Section::Services(v) => self.services = v,
            Section::Events(v) => self.events = v,
            Section::PersistentVolumeClaims(v) => self.persistent_volume_claims = v,
            Section::ConfigMaps(v) => self.config_maps = v,
            Section::Secrets(v) => self.secrets = v,
            Section::Ingresses(v) => self.ingresses = v,
            Section::ReplicaSets(v) => self.replica_sets = v,
            Section::DaemonSets(v) => self.daemon_sets = v,
            Section::StatefulSets(v) => self.stateful_sets = v,
        }
    }

    pub fn record_error(&mut self, kind: ResourceKind, message: impl Into<String>) {
        self.kind_errors.insert(kind.error_key(), message.into());
    }

    pub fn kind_error(&self, kind: ResourceKind) -> Option<&str> {
        self.kind_errors.get(&kind.error_key()).map(String::as_str)
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Nodes => self.nodes.len(),
            ResourceKind::PersistentVolumes => self.persistent_volumes.len(),
            ResourceKind::Namespaces => self.namespaces.len(),
            ResourceKind::Pods => self.pods.len(),
            ResourceKind::Deployments => self.deployments.len(),
            ResourceKind::Services => self.services.len(),
            ResourceKind::Events => self.events.len(),
            ResourceKind::PersistentVolumeClaims => self.persistent_volume_claims.len(),
            ResourceKind::ConfigMaps => self.config_maps.len(),
            ResourceKind::Secrets => self.secrets.len(),
            ResourceKind::Ingresses => self.ingresses.len(),
            ResourceKind::ReplicaSets => self.replica_sets.len(),
            ResourceKind::DaemonSets => self.daemon_sets.len(),
            ResourceKind::StatefulSets => self.stateful_sets.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use serde_json::{Value, json};

    use super::*;

    fn top_level_keys(snapshot: &Snapshot) -> BTreeSet<String> {
        match serde_json::to_value(snapshot).unwrap() {
            Value::Object(map) => map.keys().cloned().collect(),
            other => panic!("snapshot serialized to {other}"),
        }
    }

    fn fixed_keys() -> BTreeSet<String> {
        ResourceKind::ALL
            .iter()
            .map(|k| k.key().to_string())
            .chain(["timestamp".to_string(), "namespace".to_string()])
            .collect()
    }

    #[test]
    fn empty_snapshot_has_every_section() {
        let snapshot = Snapshot::new("default");
        assert_eq!(top_level_keys(&snapshot), fixed_keys());
        assert!(chrono::DateTime::parse_from_rfc3339(&snapshot.timestamp).is_ok());
    }

    #[test]
    fn kind_errors_sit_next_to_their_section() {
        let mut snapshot = Snapshot::new("default");
        snapshot.record_error(ResourceKind::Pods, "403 Forbidden");

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["pods"], json!([]));
        assert_eq!(value["pods_error"], json!("403 Forbidden"));
        assert!(value.get("error").is_none());
        assert_eq!(snapshot.kind_error(ResourceKind::Pods), Some("403 Forbidden"));
        assert_eq!(snapshot.kind_error(ResourceKind::Nodes), None);
    }

    #[test]
    fn round_trip_keeps_keys_and_counts() {
        let mut snapshot = Snapshot::new("apps");
        snapshot.insert(Section::Deployments(vec![DeploymentRecord {
            name: "web".into(),
            replicas: 3,
            ready_replicas: 2,
            available_replicas: 2,
        }]));
        snapshot.insert(Section::Pods(vec![PodRecord {
            name: "web-1".into(),
            status: Some("Running".into()),
            ready: 1,
            total_containers: 1,
            restart_count: 0,
            node: None,
            created: None,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            service_account: None,
            restart_policy: None,
            dns_policy: None,
            pod_ip: None,
            host_ip: None,
            qos_class: None,
            containers: vec![],
            container_states: vec![ContainerStatusRecord {
                name: "web".into(),
                ready: true,
                restart_count: 0,
                state: Some(ContainerStateDetail::Waiting {
                    reason: Some("ContainerCreating".into()),
                    message: None,
                }),
                last_state: None,
            }],
            conditions: vec![],
            volumes: vec![
                VolumeRecord {
                    name: "data".into(),
                    source: VolumeSourceRecord::PersistentVolumeClaim {
                        claim_name: "data-web-1".into(),
                    },
                },
                VolumeRecord {
                    name: "scratch".into(),
                    source: VolumeSourceRecord::EmptyDir,
                },
            ],
        }]));
        snapshot.record_error(ResourceKind::Secrets, "403 Forbidden");
        snapshot.error = Some("connection refused".into());

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(back, snapshot);
        assert_eq!(top_level_keys(&back), top_level_keys(&snapshot));
        for kind in ResourceKind::ALL {
            assert_eq!(back.count(kind), snapshot.count(kind), "{kind}");
        }
    }

    #[test]
    fn nested_records_use_tagged_shapes() {
        let volume = VolumeRecord {
            name: "cfg".into(),
            source: VolumeSourceRecord::ConfigMap {
                config_map: Some("app-config".into()),
            },
        };
        assert_eq!(
            serde_json::to_value(&volume).unwrap(),
            json!({"name": "cfg", "type": "config_map", "config_map": "app-config"})
        );

        let state = ContainerStateDetail::Terminated {
            exit_code: 137,
            reason: Some("OOMKilled".into()),
            message: None,
            started_at: None,
            finished_at: None,
        };
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({
                "state": "terminated",
                "exit_code": 137,
                "reason": "OOMKilled",
                "message": null,
                "started_at": null,
                "finished_at": null,
            })
        );
    }
}
