//! Error taxonomy for Armada operations.
//!
//! A single enum carries every sentinel kind the fleet layers produce, plus
//! the composite wrappers: cluster-scoped context, multi-error aggregation,
//! retry marking, and key/value annotation. Classifier predicates walk the
//! wrap chain so callers can match on kind without caring how deeply an
//! error was wrapped.

use thiserror::Error;

/// Result type for Armada operations.
pub type ArmadaResult<T> = Result<T, ArmadaError>;

/// How many sub-errors a [`MultiError`] renders before truncating.
const MULTI_ERROR_DISPLAY_CAP: usize = 10;

fn join_fields(fields: &[(String, String)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors produced by the session, dispatch, and aggregation layers.
#[derive(Debug, Error)]
pub enum ArmadaError {
    /// Cluster configuration is missing, empty, or unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A cluster or resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The cluster API server could not be reached.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// An operation exceeded its deadline.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The caller's cancellation token fired before completion.
    #[error("operation cancelled")]
    Cancelled,

    /// The cluster rejected the request for lack of permissions.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The resource already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The resource specification was rejected by the API server.
    #[error("invalid resource: {0}")]
    InvalidResource(String),

    /// The component has been shut down and accepts no further work.
    #[error("shut down")]
    Shutdown,

    /// `shutdown` was called more than once.
    #[error("already shut down")]
    AlreadyShutdown,

    /// Graceful shutdown did not drain in time.
    #[error("shutdown timed out while draining")]
    ShutdownTimeout,

    /// The dispatcher is executing a batch; submissions are rejected.
    #[error("dispatcher busy: a batch is executing")]
    Busy,

    /// A caller passed an argument that fails validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An error scoped to one named cluster.
    #[error("cluster {name}: {source}")]
    Cluster {
        /// The cluster the wrapped error belongs to.
        name: String,
        /// The underlying failure.
        #[source]
        source: Box<ArmadaError>,
    },

    /// An aggregation of per-cluster failures.
    #[error(transparent)]
    Multi(#[from] MultiError),

    /// A failure marked as eligible for a future retry policy.
    ///
    /// Armada never retries; the marker is carried for policy layers built
    /// on top.
    #[error("{source} (retryable after {retry_after_secs}s)")]
    Retryable {
        /// The underlying failure.
        #[source]
        source: Box<ArmadaError>,
        /// Suggested backoff before retrying.
        retry_after_secs: u64,
    },

    /// A failure annotated with key/value context.
    #[error("{source} [{}]", join_fields(.fields))]
    Annotated {
        /// Annotation fields, in insertion order.
        fields: Vec<(String, String)>,
        /// The underlying failure.
        #[source]
        source: Box<ArmadaError>,
    },
}

impl ArmadaError {
    /// Wrap an error with the cluster it belongs to.
    #[must_use]
    pub fn cluster(name: impl Into<String>, source: ArmadaError) -> Self {
        Self::Cluster {
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// Mark an error as retry-eligible with a suggested backoff.
    #[must_use]
    pub fn retryable(source: ArmadaError, retry_after_secs: u64) -> Self {
        Self::Retryable {
            source: Box::new(source),
            retry_after_secs,
        }
    }

    /// Annotate an error with a key/value pair.
    ///
    /// Annotating an already-annotated error extends its field list instead
    /// of adding another layer.
    #[must_use]
    pub fn with_context(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        match self {
            Self::Annotated { mut fields, source } => {
                fields.push((key.into(), value.into()));
                Self::Annotated { fields, source }
            },
            other => Self::Annotated {
                fields: vec![(key.into(), value.into())],
                source: Box::new(other),
            },
        }
    }

    /// The cluster name attached to this error, if any wrapper carries one.
    #[must_use]
    pub fn cluster_name(&self) -> Option<&str> {
        match self {
            Self::Cluster { name, .. } => Some(name),
            Self::Retryable { source, .. } | Self::Annotated { source, .. } => {
                source.cluster_name()
            },
            _ => None,
        }
    }

    /// The directly wrapped error, for wrapper variants.
    fn wrapped(&self) -> Option<&ArmadaError> {
        match self {
            Self::Cluster { source, .. }
            | Self::Retryable { source, .. }
            | Self::Annotated { source, .. } => Some(source),
            _ => None,
        }
    }

    fn chain_matches(&self, pred: fn(&ArmadaError) -> bool) -> bool {
        if pred(self) {
            return true;
        }
        match self {
            Self::Multi(multi) => multi.iter().any(|e| e.chain_matches(pred)),
            other => other.wrapped().is_some_and(|e| e.chain_matches(pred)),
        }
    }

    /// Whether this error, or any error it wraps, is a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.chain_matches(|e| matches!(e, Self::Timeout(_) | Self::ShutdownTimeout))
    }

    /// Whether this error, or any error it wraps, is a cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.chain_matches(|e| matches!(e, Self::Cancelled))
    }

    /// Whether this error, or any error it wraps, is a not-found.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.chain_matches(|e| matches!(e, Self::NotFound(_)))
    }

    /// Whether this error, or any error it wraps, is a connection failure.
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        self.chain_matches(|e| matches!(e, Self::ConnectionFailed(_)))
    }

    /// Whether this error, or any error it wraps, is a permission failure.
    #[must_use]
    pub fn is_permission_error(&self) -> bool {
        self.chain_matches(|e| matches!(e, Self::PermissionDenied(_)))
    }

    /// Whether this error, or any error it wraps, is marked retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.chain_matches(|e| matches!(e, Self::Retryable { .. }))
    }

    /// The suggested backoff, if any wrapper in the chain carries one.
    #[must_use]
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::Retryable {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
            Self::Cluster { source, .. } | Self::Annotated { source, .. } => {
                source.retry_after_secs()
            },
            _ => None,
        }
    }

    /// A one-sentence actionable message for terminal users.
    ///
    /// Wrapper variants defer to the error they wrap; unknown shapes fall
    /// through to their raw `Display` output.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidConfig(_) => {
                "The cluster configuration is invalid or incomplete; check your kubeconfig."
                    .to_string()
            },
            Self::NotFound(what) => {
                format!("'{what}' was not found; verify the name and try again.")
            },
            Self::ConnectionFailed(_) => {
                "Could not reach the cluster API server; check connectivity and the endpoint URL."
                    .to_string()
            },
            Self::Timeout(_) | Self::ShutdownTimeout => {
                "The operation timed out; the cluster may be slow or unreachable.".to_string()
            },
            Self::Cancelled => "The operation was cancelled before it completed.".to_string(),
            Self::PermissionDenied(_) => {
                "Access was denied; check your credentials and RBAC permissions.".to_string()
            },
            Self::AlreadyExists(what) => format!("'{what}' already exists."),
            Self::InvalidResource(_) => {
                "The resource specification was rejected by the API server.".to_string()
            },
            Self::Shutdown => {
                "The component has been shut down; no further work is accepted.".to_string()
            },
            Self::AlreadyShutdown => "Shutdown was already requested.".to_string(),
            Self::Busy => {
                "A batch is already executing; wait for it to drain before submitting.".to_string()
            },
            Self::InvalidArgument(what) => format!("Invalid argument: {what}."),
            Self::Cluster { name, source } => {
                format!("Cluster '{name}': {}", source.user_message())
            },
            Self::Multi(multi) => {
                format!("{} cluster operation(s) failed; see per-cluster rows.", multi.len())
            },
            Self::Retryable { source, .. } | Self::Annotated { source, .. } => {
                source.user_message()
            },
        }
    }
}

/// An aggregation of zero or more errors, typically one per cluster.
///
/// Displays up to ten sub-errors, then a truncation suffix. Empty
/// aggregations convert to `Ok(())` via [`MultiError::into_result`].
#[derive(Debug, Default, Error)]
pub struct MultiError {
    errors: Vec<ArmadaError>,
}

impl MultiError {
    /// Create an empty aggregation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an error to the aggregation.
    pub fn push(&mut self, error: ArmadaError) {
        self.errors.push(error);
    }

    /// Number of aggregated errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether the aggregation is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterate over the aggregated errors.
    pub fn iter(&self) -> impl Iterator<Item = &ArmadaError> {
        self.errors.iter()
    }

    /// Consume the aggregation, yielding the underlying errors.
    #[must_use]
    pub fn into_inner(self) -> Vec<ArmadaError> {
        self.errors
    }

    /// `Ok(())` when empty, otherwise the aggregation as an error.
    ///
    /// # Errors
    ///
    /// Returns `ArmadaError::Multi` when at least one error was collected.
    pub fn into_result(self) -> ArmadaResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ArmadaError::Multi(self))
        }
    }
}

impl From<Vec<ArmadaError>> for MultiError {
    fn from(errors: Vec<ArmadaError>) -> Self {
        Self { errors }
    }
}

impl std::fmt::Display for MultiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error(s) occurred", self.errors.len())?;
        if self.errors.is_empty() {
            return Ok(());
        }
        write!(f, ": ")?;
        let shown = self.errors.len().min(MULTI_ERROR_DISPLAY_CAP);
        for (i, err) in self.errors.iter().take(shown).enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{err}")?;
        }
        let hidden = self.errors.len().saturating_sub(shown);
        if hidden > 0 {
            write!(f, "; ... and {hidden} more")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_display() {
        let err = ArmadaError::NotFound("cluster staging".to_string());
        assert_eq!(err.to_string(), "not found: cluster staging");

        let err = ArmadaError::Timeout("version probe exceeded 10s".to_string());
        assert_eq!(err.to_string(), "timed out: version probe exceeded 10s");
    }

    #[test]
    fn test_cluster_wrapping_preserves_cause() {
        let err = ArmadaError::cluster("prod", ArmadaError::ConnectionFailed("refused".into()));
        assert_eq!(err.to_string(), "cluster prod: connection failed: refused");
        assert_eq!(err.cluster_name(), Some("prod"));

        let source = std::error::Error::source(&err).expect("cluster error has a source");
        assert_eq!(source.to_string(), "connection failed: refused");
    }

    #[test]
    fn test_classifiers_honor_wrap_chain() {
        let err = ArmadaError::cluster("prod", ArmadaError::Timeout("probe".into()))
            .with_context("operation", "health-check");

        assert!(err.is_timeout());
        assert!(!err.is_cancelled());
        assert!(!err.is_connection_error());

        let err = ArmadaError::retryable(
            ArmadaError::cluster("edge", ArmadaError::ConnectionFailed("reset".into())),
            30,
        );
        assert!(err.is_retryable());
        assert!(err.is_connection_error());
        assert_eq!(err.retry_after_secs(), Some(30));
        assert_eq!(err.cluster_name(), Some("edge"));
    }

    #[test]
    fn test_classifiers_descend_into_multi() {
        let mut multi = MultiError::new();
        multi.push(ArmadaError::cluster("a", ArmadaError::Cancelled));
        multi.push(ArmadaError::cluster("b", ArmadaError::NotFound("ns".into())));
        let err = ArmadaError::Multi(multi);

        assert!(err.is_cancelled());
        assert!(err.is_not_found());
        assert!(!err.is_permission_error());
    }

    #[test]
    fn test_with_context_extends_in_place() {
        let err = ArmadaError::PermissionDenied("forbidden".into())
            .with_context("verb", "list")
            .with_context("resource", "pods");

        assert_eq!(
            err.to_string(),
            "permission denied: forbidden [verb=list, resource=pods]"
        );
        assert!(err.is_permission_error());
    }

    #[test]
    fn test_multi_error_empty_is_ok() {
        let multi = MultiError::new();
        assert!(multi.is_empty());
        assert!(multi.into_result().is_ok());
    }

    #[test]
    fn test_multi_error_nonempty_is_err() {
        let mut multi = MultiError::new();
        multi.push(ArmadaError::Cancelled);
        let err = multi.into_result().expect_err("non-empty must be an error");
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_multi_error_display_truncates_past_ten() {
        let errors: Vec<ArmadaError> = (0..12)
            .map(|i| ArmadaError::NotFound(format!("cluster-{i}")))
            .collect();
        let multi = MultiError::from(errors);
        let rendered = multi.to_string();

        assert!(rendered.starts_with("12 error(s) occurred"));
        assert!(rendered.contains("cluster-9"));
        assert!(!rendered.contains("cluster-10"));
        assert!(rendered.ends_with("... and 2 more"));
    }

    #[test]
    fn test_multi_error_display_shows_all_when_small() {
        let mut multi = MultiError::new();
        multi.push(ArmadaError::cluster("a", ArmadaError::Cancelled));
        multi.push(ArmadaError::cluster("b", ArmadaError::Cancelled));
        let rendered = multi.to_string();

        assert!(rendered.contains("cluster a"));
        assert!(rendered.contains("cluster b"));
        assert!(!rendered.contains("more"));
    }

    #[test]
    fn test_user_message_keys_off_sentinel() {
        let err = ArmadaError::cluster("prod", ArmadaError::PermissionDenied("rbac".into()));
        assert_eq!(
            err.user_message(),
            "Cluster 'prod': Access was denied; check your credentials and RBAC permissions."
        );

        let err = ArmadaError::Cancelled;
        assert_eq!(
            err.user_message(),
            "The operation was cancelled before it completed."
        );
    }

    #[test]
    fn test_user_message_falls_through_for_annotated() {
        let err = ArmadaError::Timeout("slow".into()).with_context("phase", "connect");
        assert_eq!(
            err.user_message(),
            "The operation timed out; the cluster may be slow or unreachable."
        );
    }
}
