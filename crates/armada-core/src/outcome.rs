//! Outcome envelope and typed payload rows.
//!
//! Every dispatched task terminates in exactly one [`Outcome`]. Successful
//! outcomes may carry a [`TaskPayload`] - a closed set of row variants so the
//! aggregation and rendering layers never see untyped data.

use std::time::Duration;

use serde::Serialize;

use crate::error::ArmadaError;

/// One pod, flattened for cross-cluster listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PodRow {
    /// Owning cluster.
    pub cluster: String,
    /// Pod namespace.
    pub namespace: String,
    /// Pod name.
    pub name: String,
    /// Ready containers, rendered as `ready/total`.
    pub ready: String,
    /// Pod phase (`Running`, `Pending`, ...).
    pub status: String,
    /// Total container restarts.
    pub restarts: i32,
    /// Humanized age (`5d`, `3h`, `12m`).
    pub age: String,
}

/// One node, flattened for cross-cluster listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeRow {
    /// Owning cluster.
    pub cluster: String,
    /// Node name.
    pub name: String,
    /// `Ready` or `NotReady`.
    pub status: String,
    /// Comma-joined node roles, or `<none>`.
    pub roles: String,
    /// Kubelet version.
    pub version: String,
    /// Humanized age.
    pub age: String,
}

/// One namespace, flattened for cross-cluster listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceRow {
    /// Owning cluster.
    pub cluster: String,
    /// Namespace name.
    pub name: String,
    /// Namespace phase (`Active`, `Terminating`).
    pub status: String,
    /// Humanized age.
    pub age: String,
}

/// One server-version probe result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionRow {
    /// Owning cluster.
    pub cluster: String,
    /// API server git version (`v1.32.1`).
    pub version: String,
}

/// The closed set of data a task can hand back through its [`Outcome`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPayload {
    /// Pod listing rows.
    Pods(Vec<PodRow>),
    /// Node listing rows.
    Nodes(Vec<NodeRow>),
    /// Namespace listing rows.
    Namespaces(Vec<NamespaceRow>),
    /// Server-version rows.
    Versions(Vec<VersionRow>),
    /// A plain text result.
    Message(String),
    /// Opaque escape hatch for callers outside the row set.
    Value(serde_json::Value),
}

impl TaskPayload {
    /// Number of rows carried, for summary lines. `Message`/`Value` count as one.
    #[must_use]
    pub fn row_count(&self) -> usize {
        match self {
            Self::Pods(rows) => rows.len(),
            Self::Nodes(rows) => rows.len(),
            Self::Namespaces(rows) => rows.len(),
            Self::Versions(rows) => rows.len(),
            Self::Message(_) | Self::Value(_) => 1,
        }
    }
}

/// The terminal record of one dispatched task.
///
/// Exactly one of `payload`/`error` is informative; `payload` may be `None`
/// even on success. `submission_index` is the zero-based position the task
/// was submitted at, and the dispatcher's result slice is ordered by it.
#[derive(Debug)]
pub struct Outcome {
    /// The cluster this task targeted.
    pub cluster_name: String,
    /// Data produced on success.
    pub payload: Option<TaskPayload>,
    /// The failure, when the task did not succeed.
    pub error: Option<ArmadaError>,
    /// Wall time spent inside the task body.
    pub duration: Duration,
    /// Position the task was submitted at.
    pub submission_index: usize,
}

impl Outcome {
    /// A successful outcome.
    #[must_use]
    pub fn success(
        cluster_name: impl Into<String>,
        payload: Option<TaskPayload>,
        duration: Duration,
        submission_index: usize,
    ) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            payload,
            error: None,
            duration,
            submission_index,
        }
    }

    /// A failed outcome.
    #[must_use]
    pub fn failure(
        cluster_name: impl Into<String>,
        error: ArmadaError,
        duration: Duration,
        submission_index: usize,
    ) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            payload: None,
            error: Some(error),
            duration,
            submission_index,
        }
    }

    /// A synthetic cancelled outcome for a task that never ran.
    #[must_use]
    pub fn cancelled(cluster_name: impl Into<String>, submission_index: usize) -> Self {
        Self::failure(
            cluster_name,
            ArmadaError::Cancelled,
            Duration::ZERO,
            submission_index,
        )
    }

    /// Whether the task succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// The result of one detailed health probe. Derived per call, never stored.
#[derive(Debug)]
pub struct HealthStatus {
    /// The probed cluster.
    pub cluster_name: String,
    /// Whether the probe succeeded.
    pub healthy: bool,
    /// API server version, when the cluster was healthy.
    pub server_version: Option<String>,
    /// The probe failure, when unhealthy.
    pub error: Option<ArmadaError>,
}
