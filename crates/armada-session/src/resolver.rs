//! Context resolution from shared credential files.

use async_trait::async_trait;
use kube::config::{KubeConfigOptions, Kubeconfig};
use tracing::debug;

use armada_core::{ArmadaError, ArmadaResult};

use crate::config::SessionConfig;

/// Enumerates cluster contexts and builds per-cluster connection configs.
///
/// Injection point for the [`SessionManager`](crate::SessionManager): the
/// manager makes no assumptions about credential storage beyond this trait.
#[async_trait]
pub trait ContextResolver: Send + Sync {
    /// All known context names, sorted.
    async fn list_contexts(&self) -> ArmadaResult<Vec<String>>;

    /// Build the connection config for one context.
    async fn build_session_config(&self, name: &str) -> ArmadaResult<SessionConfig>;

    /// The context currently selected in the credential file.
    async fn current_context(&self) -> ArmadaResult<String>;
}

/// Resolver backed by a kubeconfig file (the default discovery chain, or an
/// explicit path).
pub struct KubeconfigResolver {
    kubeconfig: Kubeconfig,
}

impl KubeconfigResolver {
    /// Load from the default kubeconfig discovery chain
    /// (`$KUBECONFIG`, then `~/.kube/config`).
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when no kubeconfig can be read.
    pub fn from_default() -> ArmadaResult<Self> {
        let kubeconfig = Kubeconfig::read()
            .map_err(|e| ArmadaError::InvalidConfig(format!("failed to read kubeconfig: {e}")))?;
        Ok(Self::new(kubeconfig))
    }

    /// Load from an explicit kubeconfig path.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> ArmadaResult<Self> {
        let path = path.as_ref();
        let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
            ArmadaError::InvalidConfig(format!(
                "failed to read kubeconfig {}: {e}",
                path.display()
            ))
        })?;
        Ok(Self::new(kubeconfig))
    }

    /// Wrap an already-parsed kubeconfig.
    #[must_use]
    pub fn new(kubeconfig: Kubeconfig) -> Self {
        Self { kubeconfig }
    }
}

#[async_trait]
impl ContextResolver for KubeconfigResolver {
    async fn list_contexts(&self) -> ArmadaResult<Vec<String>> {
        let mut names: Vec<String> = self
            .kubeconfig
            .contexts
            .iter()
            .map(|c| c.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn build_session_config(&self, name: &str) -> ArmadaResult<SessionConfig> {
        let options = KubeConfigOptions {
            context: Some(name.to_string()),
            ..KubeConfigOptions::default()
        };
        let config = kube::Config::from_custom_kubeconfig(self.kubeconfig.clone(), &options)
            .await
            .map_err(|e| {
                ArmadaError::InvalidConfig(format!("context {name} is unusable: {e}"))
            })?;
        debug!(context = %name, "session config resolved");
        Ok(SessionConfig::new(name, config))
    }

    async fn current_context(&self) -> ArmadaResult<String> {
        self.kubeconfig
            .current_context
            .clone()
            .ok_or_else(|| ArmadaError::NotFound("no current context in kubeconfig".to_string()))
    }
}
