//! Thin per-resource list operations, one library call per cluster.

use chrono::Utc;
use k8s_openapi::api::core::v1::{Namespace, Node, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::ResourceExt;
use kube::api::{Api, ListParams};

use armada_core::{ArmadaResult, NamespaceRow, NodeRow, PodRow, TaskPayload};
use armada_session::classify_kube_error;

/// List pods on one cluster, across all namespaces unless one is given.
pub(crate) async fn list_pods(
    client: kube::Client,
    cluster: String,
    namespace: Option<String>,
) -> ArmadaResult<TaskPayload> {
    let api: Api<Pod> = match namespace {
        Some(ref ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    };
    let pods = api
        .list(&ListParams::default())
        .await
        .map_err(|e| classify_kube_error(&e))?;
    let rows: Vec<PodRow> = pods
        .items
        .into_iter()
        .map(|pod| pod_row(&cluster, &pod))
        .collect();
    Ok(TaskPayload::Pods(rows))
}

/// List nodes on one cluster.
pub(crate) async fn list_nodes(client: kube::Client, cluster: String) -> ArmadaResult<TaskPayload> {
    let api: Api<Node> = Api::all(client);
    let nodes = api
        .list(&ListParams::default())
        .await
        .map_err(|e| classify_kube_error(&e))?;
    let rows: Vec<NodeRow> = nodes
        .items
        .into_iter()
        .map(|node| node_row(&cluster, &node))
        .collect();
    Ok(TaskPayload::Nodes(rows))
}

/// List namespaces on one cluster.
pub(crate) async fn list_namespaces(
    client: kube::Client,
    cluster: String,
) -> ArmadaResult<TaskPayload> {
    let api: Api<Namespace> = Api::all(client);
    let namespaces = api
        .list(&ListParams::default())
        .await
        .map_err(|e| classify_kube_error(&e))?;
    let rows: Vec<NamespaceRow> = namespaces
        .items
        .into_iter()
        .map(|ns| namespace_row(&cluster, &ns))
        .collect();
    Ok(TaskPayload::Namespaces(rows))
}

fn pod_row(cluster: &str, pod: &Pod) -> PodRow {
    let status = pod
        .status
        .as_ref()
        .and_then(|s| s.phase.clone())
        .unwrap_or_else(|| "Unknown".to_string());
    let (ready, total, restarts) = pod
        .status
        .as_ref()
        .and_then(|s| s.container_statuses.as_ref())
        .map_or((0, 0, 0), |containers| {
            let ready = containers.iter().filter(|c| c.ready).count();
            let restarts = containers
                .iter()
                .map(|c| c.restart_count)
                .fold(0_i32, i32::saturating_add);
            (ready, containers.len(), restarts)
        });

    PodRow {
        cluster: cluster.to_string(),
        namespace: pod.namespace().unwrap_or_default(),
        name: pod.name_any(),
        ready: format!("{ready}/{total}"),
        status,
        restarts,
        age: format_age(pod.creation_timestamp().as_ref()),
    }
}

fn node_row(cluster: &str, node: &Node) -> NodeRow {
    let ready = node
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .and_then(|conditions| conditions.iter().find(|c| c.type_ == "Ready"))
        .is_some_and(|condition| condition.status == "True");
    let version = node
        .status
        .as_ref()
        .and_then(|s| s.node_info.as_ref())
        .map(|info| info.kubelet_version.clone())
        .unwrap_or_default();
    let roles = node.metadata.labels.as_ref().map_or_else(
        || "<none>".to_string(),
        |labels| {
            let mut roles: Vec<&str> = labels
                .keys()
                .filter_map(|key| key.strip_prefix("node-role.kubernetes.io/"))
                .collect();
            roles.sort_unstable();
            if roles.is_empty() {
                "<none>".to_string()
            } else {
                roles.join(",")
            }
        },
    );

    NodeRow {
        cluster: cluster.to_string(),
        name: node.name_any(),
        status: if ready { "Ready" } else { "NotReady" }.to_string(),
        roles,
        version,
        age: format_age(node.creation_timestamp().as_ref()),
    }
}

fn namespace_row(cluster: &str, namespace: &Namespace) -> NamespaceRow {
    let status = namespace
        .status
        .as_ref()
        .and_then(|s| s.phase.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    NamespaceRow {
        cluster: cluster.to_string(),
        name: namespace.name_any(),
        status,
        age: format_age(namespace.creation_timestamp().as_ref()),
    }
}

/// Humanize a creation timestamp into the largest whole unit (`90d`, `4h`,
/// `12m`, `30s`).
fn format_age(created: Option<&Time>) -> String {
    let Some(created) = created else {
        return "<unknown>".to_string();
    };
    let elapsed = Utc::now().signed_duration_since(created.0);
    if elapsed.num_days() > 0 {
        format!("{}d", elapsed.num_days())
    } else if elapsed.num_hours() > 0 {
        format!("{}h", elapsed.num_hours())
    } else if elapsed.num_minutes() > 0 {
        format!("{}m", elapsed.num_minutes())
    } else {
        format!("{}s", elapsed.num_seconds().max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{ContainerStatus, NodeCondition, NodeStatus, PodStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn hours_ago(hours: i64) -> Time {
        Time(Utc::now() - chrono::Duration::hours(hours))
    }

    fn container(ready: bool, restart_count: i32) -> ContainerStatus {
        ContainerStatus {
            ready,
            restart_count,
            ..ContainerStatus::default()
        }
    }

    #[test]
    fn test_pod_row_summarizes_containers() {
        let pod = Pod {
            metadata: ObjectMeta {
                name: Some("web-0".to_string()),
                namespace: Some("default".to_string()),
                creation_timestamp: Some(hours_ago(4)),
                ..ObjectMeta::default()
            },
            status: Some(PodStatus {
                phase: Some("Running".to_string()),
                container_statuses: Some(vec![container(true, 1), container(false, 2)]),
                ..PodStatus::default()
            }),
            ..Pod::default()
        };

        let row = pod_row("prod", &pod);
        assert_eq!(row.cluster, "prod");
        assert_eq!(row.namespace, "default");
        assert_eq!(row.name, "web-0");
        assert_eq!(row.ready, "1/2");
        assert_eq!(row.status, "Running");
        assert_eq!(row.restarts, 3);
        assert_eq!(row.age, "4h");
    }

    #[test]
    fn test_pod_row_without_status() {
        let pod = Pod {
            metadata: ObjectMeta {
                name: Some("pending-0".to_string()),
                ..ObjectMeta::default()
            },
            ..Pod::default()
        };

        let row = pod_row("prod", &pod);
        assert_eq!(row.status, "Unknown");
        assert_eq!(row.ready, "0/0");
        assert_eq!(row.restarts, 0);
        assert_eq!(row.age, "<unknown>");
    }

    #[test]
    fn test_node_row_reads_ready_condition_and_roles() {
        let mut labels = std::collections::BTreeMap::new();
        labels.insert(
            "node-role.kubernetes.io/control-plane".to_string(),
            String::new(),
        );
        labels.insert("kubernetes.io/os".to_string(), "linux".to_string());

        let node = Node {
            metadata: ObjectMeta {
                name: Some("cp-1".to_string()),
                labels: Some(labels),
                creation_timestamp: Some(hours_ago(48)),
                ..ObjectMeta::default()
            },
            status: Some(NodeStatus {
                conditions: Some(vec![NodeCondition {
                    type_: "Ready".to_string(),
                    status: "True".to_string(),
                    ..NodeCondition::default()
                }]),
                node_info: Some(k8s_openapi::api::core::v1::NodeSystemInfo {
                    kubelet_version: "v1.32.1".to_string(),
                    ..k8s_openapi::api::core::v1::NodeSystemInfo::default()
                }),
                ..NodeStatus::default()
            }),
            ..Node::default()
        };

        let row = node_row("prod", &node);
        assert_eq!(row.status, "Ready");
        assert_eq!(row.roles, "control-plane");
        assert_eq!(row.version, "v1.32.1");
        assert_eq!(row.age, "2d");
    }

    #[test]
    fn test_node_row_not_ready_without_condition() {
        let node = Node::default();
        let row = node_row("prod", &node);
        assert_eq!(row.status, "NotReady");
        assert_eq!(row.roles, "<none>");
    }

    #[test]
    fn test_format_age_units() {
        assert_eq!(format_age(Some(&hours_ago(30))), "1d");
        assert_eq!(format_age(Some(&hours_ago(5))), "5h");
        assert_eq!(format_age(Some(&Time(Utc::now()))), "0s");
        assert_eq!(format_age(None), "<unknown>");
    }
}
