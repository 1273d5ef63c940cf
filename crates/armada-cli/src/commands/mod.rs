//! Command implementations and shared fleet plumbing.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use armada_core::{ArmadaError, ArmadaResult};
use armada_session::{ContextResolver, KubeconfigResolver, Session, SessionManager};

use crate::settings::{ClusterSelector, Settings};
use crate::theme::Theme;

pub(crate) mod contexts;
pub(crate) mod get;
pub(crate) mod health;

/// A connected fleet: the session manager plus whatever failed to connect.
pub(crate) struct Fleet {
    pub manager: SessionManager,
    pub connect_failures: Vec<ArmadaError>,
    pub ctx: CancellationToken,
}

pub(crate) fn build_resolver(settings: &Settings) -> ArmadaResult<Arc<KubeconfigResolver>> {
    match &settings.kubeconfig {
        Some(path) => KubeconfigResolver::from_path(path).map(Arc::new),
        None => KubeconfigResolver::from_default().map(Arc::new),
    }
}

/// The invocation's cancellation token: fired by Ctrl-C and, when set, by
/// the `--timeout` deadline. Signal wiring stays here at the process
/// boundary; the library layers only ever observe the token.
pub(crate) fn root_token(settings: &Settings) -> CancellationToken {
    let root = CancellationToken::new();

    let on_signal = root.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling in-flight work");
            on_signal.cancel();
        }
    });

    let ctx = root.child_token();
    if let Some(timeout) = settings.timeout {
        let deadline = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            deadline.cancel();
        });
    }
    ctx
}

async fn target_names(
    resolver: &KubeconfigResolver,
    settings: &Settings,
) -> ArmadaResult<Vec<String>> {
    match &settings.clusters {
        ClusterSelector::All => resolver.list_contexts().await,
        ClusterSelector::Current => Ok(vec![resolver.current_context().await?]),
        ClusterSelector::Named(names) => Ok(names.clone()),
    }
}

/// Resolve the target set and connect to every cluster in it.
///
/// Per-cluster connect failures are non-fatal: they are echoed as warnings,
/// kept on the returned [`Fleet`] for the exit code, and the surviving
/// sessions stay usable.
pub(crate) async fn connect_fleet(settings: &Settings) -> anyhow::Result<Fleet> {
    let resolver = build_resolver(settings)?;
    let ctx = root_token(settings);
    let names = target_names(&resolver, settings).await?;

    let manager = SessionManager::new(resolver);
    let connect_failures = match manager.connect(&ctx, &names).await {
        Ok(()) => Vec::new(),
        Err(ArmadaError::Multi(multi)) => multi.into_inner(),
        Err(other) => return Err(other.into()),
    };
    for failure in &connect_failures {
        eprintln!("{}", Theme::warning(&failure.user_message()));
    }

    Ok(Fleet {
        manager,
        connect_failures,
        ctx,
    })
}

pub(crate) fn require_session(session: Option<Arc<Session>>) -> ArmadaResult<Arc<Session>> {
    session.ok_or_else(|| ArmadaError::InvalidArgument("task has no session attached".to_string()))
}
