//! `armada get` - fan a resource listing out across the fleet.

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

use armada_core::{ArmadaError, Outcome};
use armada_dispatch::{Dispatcher, Task};
use armada_report::{Renderer, aggregate};
use armada_session::Session;

use crate::ops;
use crate::settings::Settings;

use super::require_session;

/// Which resource a `get` invocation lists.
pub(crate) enum ResourceKind {
    /// Pods, optionally scoped to one namespace.
    Pods { namespace: Option<String> },
    /// Nodes.
    Nodes,
    /// Namespaces.
    Namespaces,
}

pub(crate) async fn run(settings: &Settings, kind: &ResourceKind) -> anyhow::Result<bool> {
    let fleet = super::connect_fleet(settings).await?;
    let mut sessions = fleet.manager.snapshot().await;
    sessions.sort_by(|a, b| a.name().cmp(b.name()));

    let dispatcher = Dispatcher::new(settings.parallelism);
    for session in &sessions {
        dispatcher.submit(make_task(kind, session))?;
    }

    let outcomes = execute_with_bar(&dispatcher, &fleet, sessions.len()).await;

    let renderer = Renderer::new(settings.output, settings.color);
    println!("{}", renderer.render_resources(&outcomes)?);

    fleet.manager.close().await;
    Ok(fleet.connect_failures.is_empty() && aggregate::all_successful(&outcomes))
}

async fn execute_with_bar(
    dispatcher: &Dispatcher,
    fleet: &super::Fleet,
    total: usize,
) -> Vec<Outcome> {
    if total <= 1 {
        return dispatcher.execute(&fleet.ctx).await;
    }

    let bar = ProgressBar::new(u64::try_from(total).unwrap_or(u64::MAX));
    if let Ok(style) = ProgressStyle::with_template("[{bar:30}] {pos}/{len} clusters") {
        bar.set_style(style);
    }

    let ticker = bar.clone();
    let outcomes = dispatcher
        .execute_with_progress(&fleet.ctx, move |done, _total| {
            ticker.set_position(u64::try_from(done).unwrap_or(u64::MAX));
        })
        .await;
    bar.finish_and_clear();
    outcomes
}

fn make_task(kind: &ResourceKind, session: &Arc<Session>) -> Task {
    let cluster = session.name().to_string();
    let task = match kind {
        ResourceKind::Pods { namespace } => {
            let namespace = namespace.clone();
            Task::new(cluster, move |ctx, session| {
                let namespace = namespace.clone();
                async move {
                    let session = require_session(session)?;
                    let cluster = session.name().to_string();
                    tokio::select! {
                        biased;
                        () = ctx.cancelled() => Err(ArmadaError::Cancelled),
                        payload = ops::list_pods(session.client(), cluster, namespace) => {
                            payload.map(Some)
                        },
                    }
                }
            })
        },
        ResourceKind::Nodes => Task::new(cluster, move |ctx, session| async move {
            let session = require_session(session)?;
            let cluster = session.name().to_string();
            tokio::select! {
                biased;
                () = ctx.cancelled() => Err(ArmadaError::Cancelled),
                payload = ops::list_nodes(session.client(), cluster) => payload.map(Some),
            }
        }),
        ResourceKind::Namespaces => Task::new(cluster, move |ctx, session| async move {
            let session = require_session(session)?;
            let cluster = session.name().to_string();
            tokio::select! {
                biased;
                () = ctx.cancelled() => Err(ArmadaError::Cancelled),
                payload = ops::list_namespaces(session.client(), cluster) => payload.map(Some),
            }
        }),
    };
    task.with_session(Arc::clone(session))
}
