//! One unit of dispatchable work.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use armada_core::{ArmadaResult, TaskPayload};
use armada_session::Session;

type TaskFn =
    Arc<dyn Fn(CancellationToken, Option<Arc<Session>>) -> TaskFuture + Send + Sync + 'static>;
type TaskFuture = BoxFuture<'static, ArmadaResult<Option<TaskPayload>>>;

/// One unit of work targeting exactly one cluster.
///
/// The session is an explicit payload rather than a closure capture: the
/// dispatcher hands it to the task body at run time, so callers building a
/// task per cluster never capture loop state. A task is consumed by exactly
/// one worker and produces exactly one
/// [`Outcome`](armada_core::Outcome).
#[derive(Clone)]
pub struct Task {
    cluster_name: String,
    session: Option<Arc<Session>>,
    run: TaskFn,
    submission_index: usize,
}

impl Task {
    /// Create a task for the named cluster.
    ///
    /// The body receives the execution token and the task's session (if
    /// any); long-running bodies should select on the token.
    #[must_use]
    pub fn new<F, Fut>(cluster_name: impl Into<String>, run: F) -> Self
    where
        F: Fn(CancellationToken, Option<Arc<Session>>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ArmadaResult<Option<TaskPayload>>> + Send + 'static,
    {
        Self {
            cluster_name: cluster_name.into(),
            session: None,
            run: Arc::new(move |ctx, session| Box::pin(run(ctx, session))),
            submission_index: 0,
        }
    }

    /// Attach the session this task runs against.
    #[must_use]
    pub fn with_session(mut self, session: Arc<Session>) -> Self {
        self.session = Some(session);
        self
    }

    /// The cluster this task targets.
    #[must_use]
    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    /// The position this task was submitted at. Assigned by the dispatcher.
    #[must_use]
    pub fn submission_index(&self) -> usize {
        self.submission_index
    }

    pub(crate) fn assign_index(&mut self, index: usize) {
        self.submission_index = index;
    }

    /// Run the task body, injecting the task's own session.
    pub(crate) async fn invoke(&self, ctx: CancellationToken) -> ArmadaResult<Option<TaskPayload>> {
        (self.run)(ctx, self.session.clone()).await
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("cluster_name", &self.cluster_name)
            .field("submission_index", &self.submission_index)
            .field("has_session", &self.session.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_task_invokes_body() {
        let task = Task::new("prod", |_ctx, _session| async move {
            Ok(Some(TaskPayload::Message("hello".to_string())))
        });
        assert_eq!(task.cluster_name(), "prod");

        let result = task.invoke(CancellationToken::new()).await.expect("task runs");
        let Some(TaskPayload::Message(text)) = result else {
            panic!("expected message payload");
        };
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn test_task_body_sees_no_session_by_default() {
        let task = Task::new("prod", |_ctx, session| async move {
            assert!(session.is_none());
            Ok(None)
        });
        task.invoke(CancellationToken::new()).await.expect("task runs");
    }
}
