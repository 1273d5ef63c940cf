//! Armada dispatch - a bounded worker-pool scheduler over per-cluster tasks.
//!
//! The [`Dispatcher`] fans a submitted batch out to at most `worker_cap`
//! concurrent workers, preserves submission order in its results, honors
//! cancellation at every blocking point, reports progress, and drains
//! gracefully on shutdown.
//!
//! # Example
//!
//! ```rust,no_run
//! use armada_core::TaskPayload;
//! use armada_dispatch::{Dispatcher, Task};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> armada_core::ArmadaResult<()> {
//! let dispatcher = Dispatcher::new(4);
//! for cluster in ["prod", "staging"] {
//!     dispatcher.submit(Task::new(cluster, |_ctx, _session| async move {
//!         Ok(Some(TaskPayload::Message("pong".to_string())))
//!     }))?;
//! }
//!
//! let ctx = CancellationToken::new();
//! let outcomes = dispatcher.execute(&ctx).await;
//! assert_eq!(outcomes.len(), 2);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod dispatcher;
mod task;

pub use dispatcher::{Dispatcher, ProgressFn};
pub use task::Task;
