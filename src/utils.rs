use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

/// Looks up one quantity (`cpu`, `memory`, `storage`, ...) in a resource map.
pub fn quantity(map: Option<&BTreeMap<String, Quantity>>, name: &str) -> Option<String> {
    map.and_then(|m| m.get(name)).map(|q| q.0.clone())
}

pub fn quantities(map: Option<&BTreeMap<String, Quantity>>) -> BTreeMap<String, String> {
    map.into_iter()
        .flatten()
        .map(|(k, q)| (k.clone(), q.0.clone()))
        .collect()
}

/// Key names of a data map, values are never copied.
pub fn keys<V>(map: Option<&BTreeMap<String, V>>) -> Vec<String> {
    map.into_iter().flatten().map(|(k, _)| k.clone()).collect()
}

/// Treats an empty reference name the same as a missing one.
pub fn non_empty(value: impl Into<Option<String>>) -> Option<String> {
    value.into().filter(|s| !s.is_empty())
}
