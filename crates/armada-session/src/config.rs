//! Per-cluster connection parameters.

use armada_core::{ArmadaError, ArmadaResult};

/// Connection parameters for one cluster, produced by a
/// [`ContextResolver`](crate::ContextResolver).
///
/// Wraps the underlying client configuration (endpoint, auth material, TLS
/// settings) together with the context name it was resolved from. Opaque to
/// the dispatch and aggregation layers.
#[derive(Clone)]
pub struct SessionConfig {
    context: String,
    kube: kube::Config,
}

impl SessionConfig {
    /// Create a config for the named context.
    #[must_use]
    pub fn new(context: impl Into<String>, kube: kube::Config) -> Self {
        Self {
            context: context.into(),
            kube,
        }
    }

    /// The context name this config was resolved from.
    #[must_use]
    pub fn context(&self) -> &str {
        &self.context
    }

    /// The API server endpoint.
    #[must_use]
    pub fn cluster_url(&self) -> String {
        self.kube.cluster_url.to_string()
    }

    /// The underlying client configuration.
    #[must_use]
    pub fn kube_config(&self) -> &kube::Config {
        &self.kube
    }

    /// Validate that the config can plausibly reach a cluster.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the context name or endpoint is empty.
    pub fn validate(&self) -> ArmadaResult<()> {
        if self.context.is_empty() {
            return Err(ArmadaError::InvalidConfig(
                "context name is empty".to_string(),
            ));
        }
        if self.cluster_url().is_empty() {
            return Err(ArmadaError::InvalidConfig(format!(
                "context {} has no API server endpoint",
                self.context
            )));
        }
        Ok(())
    }
}

/// Auth material must not leak through debug logging; only the context name
/// and endpoint are shown.
impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("context", &self.context)
            .field("cluster_url", &self.cluster_url())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_kube_config() -> kube::Config {
        kube::Config::new("http://127.0.0.1:6443".parse::<http::Uri>().expect("static uri"))
    }

    #[test]
    fn test_accessors() {
        let config = SessionConfig::new("prod", test_kube_config());
        assert_eq!(config.context(), "prod");
        assert_eq!(config.cluster_url(), "http://127.0.0.1:6443/");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_context() {
        let config = SessionConfig::new("", test_kube_config());
        let err = config.validate().expect_err("empty context is invalid");
        assert!(matches!(err, ArmadaError::InvalidConfig(_)));
    }

    #[test]
    fn test_debug_hides_auth_material() {
        let config = SessionConfig::new("prod", test_kube_config());
        let rendered = format!("{config:?}");
        assert!(rendered.contains("prod"));
        assert!(rendered.contains("cluster_url"));
        assert!(!rendered.contains("auth"));
    }
}
