use k8s_openapi::api::core::v1::{Container, ContainerState, ContainerStatus, Pod, Volume};
use kube::ResourceExt;

use crate::{
    model::{
        ConditionRecord, ContainerRecord, ContainerStateDetail, ContainerStatusRecord, PodRecord,
        PortRecord, ResourcesRecord, VolumeMountRecord, VolumeRecord, VolumeSourceRecord,
    },
    utils::{non_empty, quantities},
};

/// Annotations under this prefix are client bookkeeping (last-applied config
/// and friends) and can be huge.
const KUBECTL_ANNOTATION_PREFIX: &str = "kubectl.kubernetes.io/";

pub fn pod(pod: &Pod) -> PodRecord {
    let spec = pod.spec.as_ref();
    let status = pod.status.as_ref();
    let statuses = status
        .and_then(|s| s.container_statuses.as_deref())
        .unwrap_or_default();
    let containers = spec.map(|s| s.containers.as_slice()).unwrap_or_default();

    PodRecord {
        name: pod.name_any(),
        status: status.and_then(|s| s.phase.clone()),
        ready: statuses.iter().filter(|c| c.ready).count(),
        total_containers: containers.len(),
        restart_count: statuses
            .iter()
            .map(|c| c.restart_count)
            .fold(0, i32::saturating_add),
        node: spec.and_then(|s| s.node_name.clone()),
        created: pod.creation_timestamp(),
        labels: pod.labels().clone(),
        annotations: pod
            .annotations()
            .iter()
            .filter(|(k, _)| !k.starts_with(KUBECTL_ANNOTATION_PREFIX))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        service_account: spec.and_then(|s| s.service_account_name.clone()),
        restart_policy: spec.and_then(|s| s.restart_policy.clone()),
        dns_policy: spec.and_then(|s| s.dns_policy.clone()),
        pod_ip: status.and_then(|s| s.pod_ip.clone()),
        host_ip: status.and_then(|s| s.host_ip.clone()),
        qos_class: status.and_then(|s| s.qos_class.clone()),
        containers: containers.iter().map(container).collect(),
        container_states: statuses.iter().map(container_status).collect(),
        conditions: status
            .and_then(|s| s.conditions.as_deref())
            .unwrap_or_default()
            .iter()
            .map(|c| ConditionRecord {
                type_: c.type_.clone(),
                status: c.status.clone(),
            })
            .collect(),
        volumes: spec
            .and_then(|s| s.volumes.as_deref())
            .unwrap_or_default()
            .iter()
            .map(volume)
            .collect(),
    }
}

fn container(c: &Container) -> ContainerRecord {
    let resources = c.resources.as_ref();
    ContainerRecord {
        name: c.name.clone(),
        image: c.image.clone(),
        ports: c
            .ports
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|p| PortRecord {
                name: p.name.clone(),
                container_port: p.container_port,
                protocol: p.protocol.clone(),
            })
            .collect(),
        resources: ResourcesRecord {
            requests: quantities(resources.and_then(|r| r.requests.as_ref())),
            limits: quantities(resources.and_then(|r| r.limits.as_ref())),
        },
        env_count: c.env.as_ref().map_or(0, Vec::len),
        volume_mounts: c
            .volume_mounts
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|m| VolumeMountRecord {
                name: m.name.clone(),
                mount_path: m.mount_path.clone(),
                read_only: m.read_only.unwrap_or(false),
            })
            .collect(),
    }
}

fn container_status(s: &ContainerStatus) -> ContainerStatusRecord {
    ContainerStatusRecord {
        name: s.name.clone(),
        ready: s.ready,
        restart_count: s.restart_count,
        state: s.state.as_ref().and_then(state_detail),
        last_state: s.last_state.as_ref().and_then(state_detail),
    }
}

// The API sets at most one of the three; an all-empty state means "unknown".
fn state_detail(state: &ContainerState) -> Option<ContainerStateDetail> {
    if let Some(running) = &state.running {
        return Some(ContainerStateDetail::Running {
            started_at: running.started_at.clone(),
        });
    }
    if let Some(waiting) = &state.waiting {
        return Some(ContainerStateDetail::Waiting {
            reason: waiting.reason.clone(),
            message: waiting.message.clone(),
        });
    }
    state
        .terminated
        .as_ref()
        .map(|t| ContainerStateDetail::Terminated {
            exit_code: t.exit_code,
            reason: t.reason.clone(),
            message: t.message.clone(),
            started_at: t.started_at.clone(),
            finished_at: t.finished_at.clone(),
        })
}

fn volume(v: &Volume) -> VolumeRecord {
    let source = if let Some(cm) = &v.config_map {
        VolumeSourceRecord::ConfigMap {
            config_map: non_empty(cm.name.clone()),
        }
    } else if let Some(secret) = &v.secret {
        VolumeSourceRecord::Secret {
            secret: non_empty(secret.secret_name.clone()),
        }
    } else if let Some(pvc) = &v.persistent_volume_claim {
        VolumeSourceRecord::PersistentVolumeClaim {
            claim_name: pvc.claim_name.clone(),
        }
    } else if v.empty_dir.is_some() {
        VolumeSourceRecord::EmptyDir
    } else if let Some(host_path) = &v.host_path {
        VolumeSourceRecord::HostPath {
            path: host_path.path.clone(),
        }
    } else {
        VolumeSourceRecord::Unknown
    };

    VolumeRecord {
        name: v.name.clone(),
        source,
    }
}
