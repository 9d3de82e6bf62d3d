use std::{collections::BTreeSet, fmt::Debug};

use async_trait::async_trait;
use k8s_openapi::{
    api::{
        apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet},
        core::v1::{
            ConfigMap, Event, Namespace, Node, PersistentVolume, PersistentVolumeClaim, Pod,
            Secret, Service,
        },
        networking::v1::Ingress,
    },
    apimachinery::pkg::apis::meta::v1::APIGroupList,
};
use kube::{Api, Client, api::ListParams};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{ClusterApi, KindError, ObjectList};
use crate::kind::{ResourceKind, Scope};

/// Group versions the API server serves.
///
/// The core `v1` group is always assumed to be present.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    served: Option<BTreeSet<String>>,
}

impl Capabilities {
    /// Everything is assumed to be served.
    pub fn all() -> Self {
        Self { served: None }
    }

    pub fn from_group_versions<I, S>(group_versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            served: Some(group_versions.into_iter().map(Into::into).collect()),
        }
    }

    pub fn from_api_groups(groups: &APIGroupList) -> Self {
        Self::from_group_versions(
            groups
                .groups
                .iter()
                .flat_map(|g| g.versions.iter())
                .map(|v| v.group_version.clone()),
        )
    }

    pub fn supports(&self, kind: ResourceKind) -> bool {
        let group_version = kind.group_version();
        match &self.served {
            None => true,
            Some(_) if group_version == "v1" => true,
            Some(served) => served.contains(group_version),
        }
    }
}

/// [`ClusterApi`] over a live cluster connection.
#[derive(Clone)]
pub struct KubeClusterApi {
    client: Client,
    capabilities: Capabilities,
}

impl KubeClusterApi {
    pub fn new(client: Client, capabilities: Capabilities) -> Self {
        Self {
            client,
            capabilities,
        }
    }

    /// Reads the served API groups once. If that fails every kind is treated
    /// as served and the list calls decide.
    pub async fn discover(client: Client) -> Self {
        let capabilities = match client.list_api_groups().await {
            Ok(groups) => {
                let capabilities = Capabilities::from_api_groups(&groups);
                for kind in ResourceKind::ALL {
                    if !capabilities.supports(kind) {
                        warn!(
                            "{} ({}) is not served by this cluster, it will stay empty",
                            kind,
                            kind.group_version()
                        );
                    }
                }
                capabilities
            }
            Err(e) => {
                warn!("Can't discover API groups, assuming all kinds are served: {e}");
                Capabilities::all()
            }
        };
        Self::new(client, capabilities)
    }

    fn cluster<K>(&self) -> Api<K>
    where
        K: kube::Resource,
        K::DynamicType: Default,
    {
        Api::all(self.client.clone())
    }

    fn namespaced<K>(&self, namespace: &str) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        K::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }
}

async fn list_all<K>(api: Api<K>) -> Result<Vec<K>, kube::Error>
where
    K: Clone + DeserializeOwned + Debug,
{
    Ok(api.list(&ListParams::default()).await?.items)
}

// A 404 on an optional group means the group is gone, not that the request
// was wrong.
fn classify(kind: ResourceKind, err: kube::Error) -> KindError {
    match err {
        kube::Error::Api(resp) if resp.code == 404 && kind.is_optional() => {
            debug!("{kind} answered 404, treating as not served");
            KindError::Unsupported(kind)
        }
        other => other.into(),
    }
}

#[async_trait]
impl ClusterApi for KubeClusterApi {
    fn supports(&self, kind: ResourceKind) -> bool {
        self.capabilities.supports(kind)
    }

    async fn list(&self, kind: ResourceKind, namespace: &str) -> Result<ObjectList, KindError> {
        match kind.scope() {
            Scope::Cluster => debug!("Listing {kind} ({})", kind.group_version()),
            Scope::Namespaced => {
                debug!("Listing {kind} ({}) in {namespace}", kind.group_version())
            }
        }

        let list = match kind {
            ResourceKind::Nodes => list_all::<Node>(self.cluster())
                .await
                .map(ObjectList::Nodes),
            ResourceKind::PersistentVolumes => list_all::<PersistentVolume>(self.cluster())
                .await
                .map(ObjectList::PersistentVolumes),
            ResourceKind::Namespaces => list_all::<Namespace>(self.cluster())
                .await
                .map(ObjectList::Namespaces),
            ResourceKind::Pods => list_all::<Pod>(self.namespaced(namespace))
                .await
                .map(ObjectList::Pods),
            ResourceKind::Deployments => list_all::<Deployment>(self.namespaced(namespace))
                .await
                .map(ObjectList::Deployments),
            ResourceKind::Services => list_all::<Service>(self.namespaced(namespace))
                .await
                .map(ObjectList::Services),
            ResourceKind::Events => list_all::<Event>(self.namespaced(namespace))
                .await
                .map(ObjectList::Events),
            ResourceKind::PersistentVolumeClaims => {
                list_all::<PersistentVolumeClaim>(self.namespaced(namespace))
                    .await
                    .map(ObjectList::PersistentVolumeClaims)
            }
            ResourceKind::ConfigMaps => list_all::<ConfigMap>(self.namespaced(namespace))
                .await
                .map(ObjectList::ConfigMaps),
            ResourceKind::Secrets => list_all::<Secret>(self.namespaced(namespace))
                .await
                .map(ObjectList::Secrets),
            ResourceKind::Ingresses => list_all::<Ingress>(self.namespaced(namespace))
                .await
                .map(ObjectList::Ingresses),
            ResourceKind::ReplicaSets => list_all::<ReplicaSet>(self.namespaced(namespace))
                .await
                .map(ObjectList::ReplicaSets),
            ResourceKind::DaemonSets => list_all::<DaemonSet>(self.namespaced(namespace))
                .await
                .map(ObjectList::DaemonSets),
            ResourceKind::StatefulSets => list_all::<StatefulSet>(self.namespaced(namespace))
                .await
                .map(ObjectList::StatefulSets),
        };
        list.map_err(|e| classify(kind, e))
    }
}
