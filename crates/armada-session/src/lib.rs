//! Armada session layer - authenticated cluster sessions and their manager.
//!
//! This crate provides:
//! - Context resolution from a shared kubeconfig ([`KubeconfigResolver`])
//! - Session construction and liveness probes ([`Session`])
//! - The [`SessionManager`], which owns the `name -> Session` map, connects
//!   to many clusters concurrently under a bounded fan-out, and exposes
//!   snapshot reads to parallel consumers
//!
//! # Architecture
//!
//! The resolver and factory are injection points: the manager only sees the
//! [`ContextResolver`] and [`SessionFactory`] traits, so tests (and callers
//! with exotic credential stores) can supply their own implementations. The
//! production implementations are backed by `kube`.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use armada_session::{KubeconfigResolver, SessionManager};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> armada_core::ArmadaResult<()> {
//! let resolver = Arc::new(KubeconfigResolver::from_default()?);
//! let manager = SessionManager::new(resolver);
//!
//! let ctx = CancellationToken::new();
//! manager.connect_all(&ctx).await?;
//!
//! for session in manager.snapshot().await {
//!     println!("connected: {}", session.name());
//! }
//! manager.close().await;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod config;
mod manager;
mod resolver;
mod session;

pub use config::SessionConfig;
pub use manager::{CONNECT_CONCURRENCY, SessionManager};
pub use resolver::{ContextResolver, KubeconfigResolver};
pub use session::{
    HEALTH_PROBE_CAP, KubeSessionFactory, Session, SessionFactory, VERSION_PROBE_CAP,
    classify_kube_error,
};
