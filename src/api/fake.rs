use std::{
    collections::{HashMap, HashSet},
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;

use super::{ClusterApi, KindError, ObjectList};
use crate::kind::ResourceKind;

enum Scripted {
    Objects(ObjectList),
    Fail(KindError),
    Hang,
    Panic,
}

/// Scripted [`ClusterApi`]. Kinds without a script list as empty.
#[derive(Default)]
pub struct FakeClusterApi {
    scripts: HashMap<ResourceKind, Scripted>,
    unsupported: HashSet<ResourceKind>,
    calls: Mutex<Vec<(ResourceKind, String)>>,
    in_flight: AtomicUsize,
}

/// Counts a hanging call until its future is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeClusterApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, list: ObjectList) -> Self {
        self.scripts.insert(list.kind(), Scripted::Objects(list));
        self
    }

    pub fn failing(mut self, kind: ResourceKind, err: KindError) -> Self {
        self.scripts.insert(kind, Scripted::Fail(err));
        self
    }

    pub fn hanging(mut self, kind: ResourceKind) -> Self {
        self.scripts.insert(kind, Scripted::Hang);
        self
    }

    pub fn panicking(mut self, kind: ResourceKind) -> Self {
        self.scripts.insert(kind, Scripted::Panic);
        self
    }

    pub fn unsupported(mut self, kind: ResourceKind) -> Self {
        self.unsupported.insert(kind);
        self
    }

    pub fn calls(&self) -> Vec<(ResourceKind, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Hanging calls whose futures are still alive.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

pub fn empty(kind: ResourceKind) -> ObjectList {
    match kind {
        ResourceKind::Nodes => ObjectList::Nodes(vec![]),
        ResourceKind::PersistentVolumes => ObjectList::PersistentVolumes(vec![]),
        ResourceKind::Namespaces => ObjectList::Namespaces(vec![]),
        ResourceKind::Pods => ObjectList::Pods(vec![]),
        ResourceKind::Deployments => ObjectList::Deployments(vec![]),
        ResourceKind::Services => ObjectList::Services(vec![]),
        ResourceKind::Events => ObjectList::Events(vec![]),
        ResourceKind::PersistentVolumeClaims => ObjectList::PersistentVolumeClaims(vec![]),
        ResourceKind::ConfigMaps => ObjectList::ConfigMaps(vec![]),
        ResourceKind::Secrets => ObjectList::Secrets(vec![]),
        ResourceKind::Ingresses => ObjectList::Ingresses(vec![]),
        ResourceKind::ReplicaSets => ObjectList::ReplicaSets(vec![]),
        ResourceKind::DaemonSets => ObjectList::DaemonSets(vec![]),
        ResourceKind::StatefulSets => ObjectList::StatefulSets(vec![]),
    }
}

#[async_trait]
impl ClusterApi for FakeClusterApi {
    fn supports(&self, kind: ResourceKind) -> bool {
        !self.unsupported.contains(&kind)
    }

    async fn list(&self, kind: ResourceKind, namespace: &str) -> Result<ObjectList, KindError> {
        self.calls
            .lock()
            .unwrap()
            .push((kind, namespace.to_string()));
        match self.scripts.get(&kind) {
            None => Ok(empty(kind)),
            Some(Scripted::Objects(list)) => Ok(list.clone()),
            Some(Scripted::Fail(err)) => Err(err.clone()),
            Some(Scripted::Hang) => {
                let _guard = InFlight::enter(&self.in_flight);
                std::future::pending().await
            }
            Some(Scripted::Panic) => panic!("malformed {kind} object"),
        }
    }
}
