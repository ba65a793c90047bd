//! Wire types for the Kubernetes discovery endpoints
//!
//! These mirror the `apimachinery/pkg/apis/meta/v1` shapes returned by
//! `GET /api`, `GET /apis` and `GET /apis/<group>/<version>`, reduced to the
//! fields discovery needs. All types deserialize leniently: absent lists and
//! absent preferred versions are valid responses, not decode errors.
use serde::{Deserialize, Serialize};

/// Versions served by the core (legacy) api group, from `GET /api`.
#[derive(Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiVersions {
    /// Version strings such as `v1`
    #[serde(default)]
    pub versions: Vec<String>,
}

/// The named api groups served under `/apis`, from `GET /apis`.
#[derive(Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiGroupList {
    /// One entry per served group
    #[serde(default)]
    pub groups: Vec<ApiGroup>,
}

/// A single group entry within an [`ApiGroupList`].
#[derive(Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiGroup {
    /// Name of the group, e.g. `apps`
    pub name: String,
    /// The version the apiserver recommends using, if it declares one
    #[serde(default)]
    pub preferred_version: Option<GroupVersionForDiscovery>,
}

/// A group version pairing as advertised by discovery.
#[derive(Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupVersionForDiscovery {
    /// The `group/version` path segment, e.g. `apps/v1`
    pub group_version: String,
}

/// Resources served at one group version, from `GET /apis/<group>/<version>`
/// or `GET /api/<version>`.
#[derive(Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiResourceList {
    /// The resource kinds served at this group version
    #[serde(default)]
    pub resources: Vec<ApiResource>,
}

/// A single resource kind within an [`ApiResourceList`].
#[derive(Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiResource {
    /// Plural name used in api paths, e.g. `deployments`
    pub name: String,
    /// Singular PascalCase kind, e.g. `Deployment`
    pub kind: String,
    /// Whether objects live in a namespace
    #[serde(default)]
    pub namespaced: bool,
    /// Verbs the apiserver supports for this resource
    #[serde(default)]
    pub verbs: Vec<String>,
}

/// Rbac verbs advertised for an [`ApiResource`]
pub mod verbs {
    /// Create a resource
    pub const CREATE: &str = "create";
    /// Get single resource
    pub const GET: &str = "get";
    /// List objects
    pub const LIST: &str = "list";
    /// Watch for objects changes
    pub const WATCH: &str = "watch";
    /// Delete single object
    pub const DELETE: &str = "delete";
    /// Delete multiple objects at once
    pub const DELETE_COLLECTION: &str = "deletecollection";
    /// Update an object
    pub const UPDATE: &str = "update";
    /// Patch an object
    pub const PATCH: &str = "patch";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_list_without_resources_is_empty() {
        // apiservers may omit the resources field entirely
        let list: ApiResourceList = serde_json::from_str(r#"{"groupVersion": "apps/v1"}"#).unwrap();
        assert!(list.resources.is_empty());
    }

    #[test]
    fn group_without_preferred_version_parses() {
        let groups: ApiGroupList = serde_json::from_value(serde_json::json!({
            "groups": [
                {"name": "custom.io", "preferredVersion": null},
                {"name": "apps", "preferredVersion": {"groupVersion": "apps/v1", "version": "v1"}},
            ]
        }))
        .unwrap();
        assert_eq!(groups.groups[0].preferred_version, None);
        assert_eq!(
            groups.groups[1].preferred_version.as_ref().unwrap().group_version,
            "apps/v1"
        );
    }

    #[test]
    fn verbs_deserialize_with_extra_fields_ignored() {
        let res: ApiResource = serde_json::from_value(serde_json::json!({
            "name": "pods",
            "singularName": "pod",
            "namespaced": true,
            "kind": "Pod",
            "verbs": ["get", "list", "watch"],
            "shortNames": ["po"],
        }))
        .unwrap();
        assert!(res.verbs.iter().any(|v| v == verbs::LIST));
        assert!(res.namespaced);
    }
}
