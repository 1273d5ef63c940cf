//! Armada core - shared data model and error taxonomy.
//!
//! This crate defines the vocabulary shared by every other Armada crate:
//! - [`ArmadaError`], the error taxonomy with cluster-scoped wrapping and
//!   multi-error composition
//! - [`Outcome`], the terminal record of one dispatched unit of work
//! - [`TaskPayload`] and the typed row structs carried by successful outcomes
//!
//! It has no Kubernetes or runtime dependencies; the session and dispatch
//! layers build on top of it.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod error;
pub mod outcome;

pub use error::{ArmadaError, ArmadaResult, MultiError};
pub use outcome::{
    HealthStatus, NamespaceRow, NodeRow, Outcome, PodRow, TaskPayload, VersionRow,
};
