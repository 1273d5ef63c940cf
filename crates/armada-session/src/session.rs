//! Session construction and liveness probes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::version::Info;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use armada_core::{ArmadaError, ArmadaResult};

use crate::config::SessionConfig;

/// Hard cap on a single health probe, enforced regardless of the caller's
/// token. Bounds a fleet-wide health sweep even under an unbounded context.
pub const HEALTH_PROBE_CAP: Duration = Duration::from_secs(10);

/// Hard cap on a single server-version probe.
pub const VERSION_PROBE_CAP: Duration = Duration::from_secs(5);

/// Map a `kube` client error onto the Armada taxonomy.
///
/// API-level responses are classified by status code; transport failures
/// collapse into `ConnectionFailed`.
#[must_use]
pub fn classify_kube_error(err: &kube::Error) -> ArmadaError {
    match err {
        kube::Error::Api(resp) => match resp.code {
            401 | 403 => ArmadaError::PermissionDenied(resp.message.clone()),
            404 => ArmadaError::NotFound(resp.message.clone()),
            409 => ArmadaError::AlreadyExists(resp.message.clone()),
            422 => ArmadaError::InvalidResource(resp.message.clone()),
            code => ArmadaError::ConnectionFailed(format!(
                "API error {code}: {}",
                resp.message
            )),
        },
        other => ArmadaError::ConnectionFailed(other.to_string()),
    }
}

/// A live, authenticated handle to one remote cluster.
///
/// Constructed without any network round-trip; `healthy` starts `false` and
/// is updated only by [`Session::health_check`]. Owned by the
/// [`SessionManager`](crate::SessionManager) for its lifetime and dropped
/// when the manager closes - the underlying client has no explicit close.
pub struct Session {
    name: String,
    config: SessionConfig,
    client: kube::Client,
    healthy: AtomicBool,
}

impl Session {
    /// Build a session from a resolved config.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the name or endpoint is empty, or when
    /// the client cannot be assembled from the config (bad TLS material,
    /// unusable auth). Never performs I/O.
    pub fn new(name: impl Into<String>, config: SessionConfig) -> ArmadaResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ArmadaError::InvalidConfig(
                "cluster name is empty".to_string(),
            ));
        }
        config.validate()?;
        let client = kube::Client::try_from(config.kube_config().clone()).map_err(|e| {
            ArmadaError::InvalidConfig(format!("failed to build API client for {name}: {e}"))
        })?;
        Ok(Self {
            name,
            config,
            client,
            healthy: AtomicBool::new(false),
        })
    }

    /// The cluster name. Immutable for the session's lifetime.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The config this session was built from.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// A handle to the underlying API client (cheap to clone).
    #[must_use]
    pub fn client(&self) -> kube::Client {
        self.client.clone()
    }

    /// Result of the most recent health probe; `false` until one runs.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    /// Probe the API server once and record the result in `healthy`.
    ///
    /// The probe runs under `min(ctx, 10s)`: the internal cap fires as
    /// `Timeout`, the caller's token as `Cancelled`.
    ///
    /// # Errors
    ///
    /// Returns the classified probe failure; `Ok(())` marks the session
    /// healthy.
    pub async fn health_check(&self, ctx: &CancellationToken) -> ArmadaResult<()> {
        let result = self.probe(ctx, HEALTH_PROBE_CAP).await.map(|_| ());
        self.healthy.store(result.is_ok(), Ordering::Release);
        debug!(cluster = %self.name, healthy = result.is_ok(), "health probe finished");
        result
    }

    /// Fetch the API server version. Does not touch `healthy`.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` after the 5 s internal cap, `Cancelled` when the
    /// caller's token fires first, else the classified connection error.
    pub async fn server_version(&self, ctx: &CancellationToken) -> ArmadaResult<String> {
        let info = self.probe(ctx, VERSION_PROBE_CAP).await?;
        Ok(info.git_version)
    }

    async fn probe(&self, ctx: &CancellationToken, cap: Duration) -> ArmadaResult<Info> {
        tokio::select! {
            biased;
            () = ctx.cancelled() => Err(ArmadaError::Cancelled),
            probed = tokio::time::timeout(cap, self.client.apiserver_version()) => {
                match probed {
                    Err(_elapsed) => Err(ArmadaError::Timeout(format!(
                        "version probe against {} exceeded {}s",
                        self.name,
                        cap.as_secs()
                    ))),
                    Ok(Ok(info)) => Ok(info),
                    Ok(Err(e)) => Err(classify_kube_error(&e)),
                }
            },
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("name", &self.name)
            .field("healthy", &self.is_healthy())
            .finish_non_exhaustive()
    }
}

/// Builds sessions from resolved configs.
///
/// Injection point for the [`SessionManager`](crate::SessionManager).
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Construct a session for the named cluster.
    async fn new_session(&self, name: &str, config: SessionConfig) -> ArmadaResult<Session>;
}

/// The production factory: straight through to [`Session::new`].
#[derive(Debug, Default, Clone, Copy)]
pub struct KubeSessionFactory;

#[async_trait]
impl SessionFactory for KubeSessionFactory {
    async fn new_session(&self, name: &str, config: SessionConfig) -> ArmadaResult<Session> {
        Session::new(name, config)
    }
}
