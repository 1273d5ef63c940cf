//! Immutable invocation settings, built once at entry.

use std::path::PathBuf;
use std::time::Duration;

use armada_core::{ArmadaError, ArmadaResult};
use armada_report::OutputFormat;

/// Which clusters an invocation targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ClusterSelector {
    /// Only the kubeconfig's current context.
    Current,
    /// Every context the resolver knows about.
    All,
    /// An explicit list of context names.
    Named(Vec<String>),
}

/// Everything the commands need, resolved from flags. No globals; built
/// once in `main` and passed down.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub clusters: ClusterSelector,
    pub parallelism: usize,
    pub timeout: Option<Duration>,
    pub output: OutputFormat,
    pub kubeconfig: Option<PathBuf>,
    pub verbose: bool,
    pub color: bool,
}

impl Settings {
    pub(crate) fn build(
        clusters: &str,
        parallelism: usize,
        timeout_secs: Option<u64>,
        output: &str,
        kubeconfig: Option<PathBuf>,
        verbose: bool,
        no_color: bool,
    ) -> ArmadaResult<Self> {
        if parallelism == 0 {
            return Err(ArmadaError::InvalidArgument(
                "parallelism must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            clusters: parse_selector(clusters)?,
            parallelism,
            timeout: timeout_secs.map(Duration::from_secs),
            output: output.parse()?,
            kubeconfig,
            verbose,
            color: !no_color,
        })
    }
}

fn parse_selector(raw: &str) -> ArmadaResult<ClusterSelector> {
    match raw.trim() {
        "" => Err(ArmadaError::InvalidArgument(
            "cluster selector is empty".to_string(),
        )),
        "all" => Ok(ClusterSelector::All),
        "current" => Ok(ClusterSelector::Current),
        list => {
            let names: Vec<String> = list
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(ToString::to_string)
                .collect();
            if names.is_empty() {
                return Err(ArmadaError::InvalidArgument(format!(
                    "no cluster names in selector '{raw}'"
                )));
            }
            Ok(ClusterSelector::Named(names))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(clusters: &str, parallelism: usize, output: &str) -> ArmadaResult<Settings> {
        Settings::build(clusters, parallelism, None, output, None, false, false)
    }

    #[test]
    fn test_selector_keywords() {
        assert_eq!(
            build("all", 5, "table").unwrap().clusters,
            ClusterSelector::All
        );
        assert_eq!(
            build("current", 5, "table").unwrap().clusters,
            ClusterSelector::Current
        );
    }

    #[test]
    fn test_selector_named_list_trims_blanks() {
        let settings = build("prod, staging,,edge", 5, "table").unwrap();
        assert_eq!(
            settings.clusters,
            ClusterSelector::Named(vec![
                "prod".to_string(),
                "staging".to_string(),
                "edge".to_string()
            ])
        );
    }

    #[test]
    fn test_selector_rejects_empty() {
        assert!(build("", 5, "table").is_err());
        assert!(build(" , ,", 5, "table").is_err());
    }

    #[test]
    fn test_parallelism_must_be_positive() {
        let err = build("all", 0, "table").expect_err("zero parallelism is invalid");
        assert!(matches!(err, ArmadaError::InvalidArgument(_)));
    }

    #[test]
    fn test_output_format_and_timeout() {
        let settings =
            Settings::build("all", 2, Some(30), "json", None, true, true).unwrap();
        assert_eq!(settings.output, OutputFormat::Json);
        assert_eq!(settings.timeout, Some(Duration::from_secs(30)));
        assert!(settings.verbose);
        assert!(!settings.color);
    }

    #[test]
    fn test_bad_output_format_rejected() {
        assert!(build("all", 2, "xml").is_err());
    }
}
