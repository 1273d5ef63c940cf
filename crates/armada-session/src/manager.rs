//! Session manager - owns the fleet's session map.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use armada_core::{ArmadaError, ArmadaResult, HealthStatus, MultiError};

use crate::resolver::ContextResolver;
use crate::session::{KubeSessionFactory, Session, SessionFactory};

/// Fan-out cap for concurrent connects. Bounds remote-side connection storms
/// while keeping wall time low for fleets of 10-100 clusters.
pub const CONNECT_CONCURRENCY: usize = 10;

struct ManagerState {
    sessions: HashMap<String, Arc<Session>>,
    closed: bool,
}

/// Owns the set of live sessions and exposes thread-safe reads to parallel
/// consumers.
///
/// A cluster is present in the map exactly when its session was successfully
/// constructed and the manager is not closed. Individual connect failures are
/// non-fatal: siblings that succeeded stay installed, and the aggregated
/// failure is returned to the caller.
pub struct SessionManager {
    resolver: Arc<dyn ContextResolver>,
    factory: Arc<dyn SessionFactory>,
    state: Arc<RwLock<ManagerState>>,
}

impl SessionManager {
    /// Create a manager over the given resolver, using the production
    /// session factory.
    #[must_use]
    pub fn new(resolver: Arc<dyn ContextResolver>) -> Self {
        Self::with_factory(resolver, Arc::new(KubeSessionFactory))
    }

    /// Create a manager with a custom session factory.
    #[must_use]
    pub fn with_factory(
        resolver: Arc<dyn ContextResolver>,
        factory: Arc<dyn SessionFactory>,
    ) -> Self {
        Self {
            resolver,
            factory,
            state: Arc::new(RwLock::new(ManagerState {
                sessions: HashMap::new(),
                closed: false,
            })),
        }
    }

    /// Connect to every named cluster concurrently.
    ///
    /// Fan-out is gated by a semaphore of capacity [`CONNECT_CONCURRENCY`].
    /// On return, every name is either present in the map or reported in the
    /// aggregated error; inserts commit before the join barrier, so any read
    /// after `connect` returns observes all successful sessions. Duplicate
    /// names resolve to the last successful insert.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty name list, `Shutdown` when the manager
    /// is closed, otherwise a `MultiError` of per-cluster wrapped failures
    /// when at least one connect failed.
    pub async fn connect(&self, ctx: &CancellationToken, names: &[String]) -> ArmadaResult<()> {
        if names.is_empty() {
            return Err(ArmadaError::InvalidArgument(
                "no cluster names given".to_string(),
            ));
        }
        if self.state.read().await.closed {
            return Err(ArmadaError::Shutdown);
        }

        let semaphore = Arc::new(Semaphore::new(CONNECT_CONCURRENCY));
        let mut workers = JoinSet::new();
        for name in names {
            let name = name.clone();
            let ctx = ctx.clone();
            let semaphore = Arc::clone(&semaphore);
            let resolver = Arc::clone(&self.resolver);
            let factory = Arc::clone(&self.factory);
            let state = Arc::clone(&self.state);
            workers.spawn(async move {
                Self::connect_one(&name, &ctx, &semaphore, &*resolver, &*factory, &state)
                    .await
                    .map_err(|e| ArmadaError::cluster(name, e))
            });
        }

        let mut failures = MultiError::new();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Ok(())) => {},
                Ok(Err(e)) => {
                    warn!(error = %e, "cluster connect failed");
                    failures.push(e);
                },
                Err(join_err) => {
                    failures.push(ArmadaError::ConnectionFailed(format!(
                        "connect worker panicked: {join_err}"
                    )));
                },
            }
        }

        info!(
            requested = names.len(),
            connected = self.count().await,
            failed = failures.len(),
            "cluster connect finished"
        );
        failures.into_result()
    }

    /// Connect to every context the resolver knows about.
    ///
    /// # Errors
    ///
    /// `NotFound` when the resolver returns no contexts; otherwise as
    /// [`SessionManager::connect`].
    pub async fn connect_all(&self, ctx: &CancellationToken) -> ArmadaResult<()> {
        let names = self.resolver.list_contexts().await?;
        if names.is_empty() {
            return Err(ArmadaError::NotFound(
                "no cluster contexts configured".to_string(),
            ));
        }
        self.connect(ctx, &names).await
    }

    async fn connect_one(
        name: &str,
        ctx: &CancellationToken,
        semaphore: &Arc<Semaphore>,
        resolver: &dyn ContextResolver,
        factory: &dyn SessionFactory,
        state: &RwLock<ManagerState>,
    ) -> ArmadaResult<()> {
        let _permit = tokio::select! {
            biased;
            () = ctx.cancelled() => return Err(ArmadaError::Cancelled),
            permit = Arc::clone(semaphore).acquire_owned() => {
                match permit {
                    Ok(p) => p,
                    // The semaphore is never closed.
                    Err(_) => return Err(ArmadaError::Cancelled),
                }
            },
        };
        if ctx.is_cancelled() {
            return Err(ArmadaError::Cancelled);
        }

        let config = resolver.build_session_config(name).await?;
        let session = factory.new_session(name, config).await?;

        let mut guard = state.write().await;
        if guard.closed {
            // A close raced this worker; the session is discarded unstored.
            debug!(cluster = %name, "manager closed during connect, dropping session");
            return Err(ArmadaError::Shutdown);
        }
        guard.sessions.insert(name.to_string(), Arc::new(session));
        debug!(cluster = %name, "session installed");
        Ok(())
    }

    /// Look up one session by cluster name.
    ///
    /// # Errors
    ///
    /// `Shutdown` when the manager is closed, `NotFound` when the cluster
    /// has no session.
    pub async fn get(&self, name: &str) -> ArmadaResult<Arc<Session>> {
        let guard = self.state.read().await;
        if guard.closed {
            return Err(ArmadaError::Shutdown);
        }
        guard
            .sessions
            .get(name)
            .cloned()
            .ok_or_else(|| ArmadaError::NotFound(format!("cluster {name}")))
    }

    /// A fresh slice of the current sessions.
    ///
    /// The caller may iterate concurrently with further manager mutation;
    /// the slice never changes after return.
    pub async fn snapshot(&self) -> Vec<Arc<Session>> {
        self.state.read().await.sessions.values().cloned().collect()
    }

    /// A fresh, sorted slice of the current cluster names.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.read().await.sessions.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of live sessions.
    pub async fn count(&self) -> usize {
        self.state.read().await.sessions.len()
    }

    /// Probe every current session in parallel.
    ///
    /// Fan-out is unbounded - the probe population is the (small) cluster
    /// count, and each probe is individually capped at 10 s. Per-cluster
    /// failures land in the returned map; the sweep itself never fails.
    pub async fn health_check(
        &self,
        ctx: &CancellationToken,
    ) -> HashMap<String, Option<ArmadaError>> {
        let mut probes = JoinSet::new();
        for session in self.snapshot().await {
            let ctx = ctx.clone();
            probes.spawn(async move {
                let result = session.health_check(&ctx).await;
                (session.name().to_string(), result.err())
            });
        }

        let mut results = HashMap::new();
        while let Some(joined) = probes.join_next().await {
            if let Ok((name, error)) = joined {
                results.insert(name, error);
            }
        }
        results
    }

    /// As [`SessionManager::health_check`], plus the server version for
    /// healthy clusters. Results are sorted by cluster name.
    pub async fn health_check_detailed(&self, ctx: &CancellationToken) -> Vec<HealthStatus> {
        let mut probes = JoinSet::new();
        for session in self.snapshot().await {
            let ctx = ctx.clone();
            probes.spawn(async move {
                let cluster_name = session.name().to_string();
                match session.health_check(&ctx).await {
                    Ok(()) => {
                        let server_version = session.server_version(&ctx).await.ok();
                        HealthStatus {
                            cluster_name,
                            healthy: true,
                            server_version,
                            error: None,
                        }
                    },
                    Err(e) => HealthStatus {
                        cluster_name,
                        healthy: false,
                        server_version: None,
                        error: Some(e),
                    },
                }
            });
        }

        let mut statuses = Vec::new();
        while let Some(joined) = probes.join_next().await {
            if let Ok(status) = joined {
                statuses.push(status);
            }
        }
        statuses.sort_by(|a, b| a.cluster_name.cmp(&b.cluster_name));
        statuses
    }

    /// Close the manager and drop every session. Idempotent.
    pub async fn close(&self) {
        let mut guard = self.state.write().await;
        if guard.closed {
            return;
        }
        guard.closed = true;
        let dropped = guard.sessions.len();
        guard.sessions.clear();
        info!(dropped, "session manager closed");
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").finish_non_exhaustive()
    }
}
