//! Rendering of aggregated results into table, JSON, or YAML text.

use colored::Colorize;
use serde::Serialize;

use armada_core::{ArmadaError, ArmadaResult, HealthStatus, Outcome, TaskPayload};

use crate::aggregate::{self, Summary};

/// The output formats the CLI can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Aligned plain-text columns.
    #[default]
    Table,
    /// Pretty-printed JSON.
    Json,
    /// YAML documents.
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = ArmadaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "yaml" => Ok(Self::Yaml),
            other => Err(ArmadaError::InvalidArgument(format!(
                "unknown output format '{other}' (expected table, json, or yaml)"
            ))),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
        }
    }
}

/// One per-cluster entry in structured output.
#[derive(Serialize)]
struct OutcomeReport<'a> {
    cluster: &'a str,
    success: bool,
    duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a TaskPayload>,
}

impl<'a> OutcomeReport<'a> {
    fn from_outcome(outcome: &'a Outcome) -> Self {
        Self {
            cluster: &outcome.cluster_name,
            success: outcome.is_success(),
            duration_ms: millis(outcome),
            error: outcome.error.as_ref().map(ToString::to_string),
            data: outcome.payload.as_ref(),
        }
    }
}

#[derive(Serialize)]
struct BatchReport<'a> {
    clusters: Vec<OutcomeReport<'a>>,
    summary: Summary,
}

#[derive(Serialize)]
struct HealthReport<'a> {
    cluster: &'a str,
    healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    server_version: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn millis(outcome: &Outcome) -> u64 {
    u64::try_from(outcome.duration.as_millis()).unwrap_or(u64::MAX)
}

/// Turns aggregated data into terminal text.
///
/// Holds only presentation state; everything it consumes is pure data from
/// the aggregation layer.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    format: OutputFormat,
    color: bool,
}

impl Renderer {
    /// Create a renderer for the given format.
    #[must_use]
    pub fn new(format: OutputFormat, color: bool) -> Self {
        Self { format, color }
    }

    /// Render a batch of resource-list outcomes.
    ///
    /// Table output flattens the typed rows across clusters into one listing
    /// and appends an error line per failed cluster; structured output keeps
    /// the per-cluster envelope.
    ///
    /// # Errors
    ///
    /// Returns an error when structured serialization fails.
    pub fn render_resources(&self, outcomes: &[Outcome]) -> ArmadaResult<String> {
        match self.format {
            OutputFormat::Table => Ok(self.resource_table(outcomes)),
            OutputFormat::Json | OutputFormat::Yaml => self.structured(outcomes),
        }
    }

    /// Render a batch as per-cluster status rows plus a summary footer.
    ///
    /// # Errors
    ///
    /// Returns an error when structured serialization fails.
    pub fn render_outcomes(&self, outcomes: &[Outcome]) -> ArmadaResult<String> {
        match self.format {
            OutputFormat::Table => Ok(self.outcome_table(outcomes)),
            OutputFormat::Json | OutputFormat::Yaml => self.structured(outcomes),
        }
    }

    /// Render a detailed health sweep.
    ///
    /// # Errors
    ///
    /// Returns an error when structured serialization fails.
    pub fn render_health(&self, statuses: &[HealthStatus]) -> ArmadaResult<String> {
        match self.format {
            OutputFormat::Table => Ok(self.health_table(statuses)),
            OutputFormat::Json | OutputFormat::Yaml => {
                let reports: Vec<HealthReport<'_>> = statuses
                    .iter()
                    .map(|s| HealthReport {
                        cluster: &s.cluster_name,
                        healthy: s.healthy,
                        server_version: s.server_version.as_deref(),
                        error: s.error.as_ref().map(ToString::to_string),
                    })
                    .collect();
                self.serialize(&reports)
            },
        }
    }

    /// Render the resolver's context listing, marking the current context.
    ///
    /// # Errors
    ///
    /// Returns an error when structured serialization fails.
    pub fn render_contexts(
        &self,
        contexts: &[String],
        current: Option<&str>,
    ) -> ArmadaResult<String> {
        match self.format {
            OutputFormat::Table => {
                let rows: Vec<Vec<String>> = contexts
                    .iter()
                    .map(|name| {
                        let marker = if Some(name.as_str()) == current {
                            "*".to_string()
                        } else {
                            String::new()
                        };
                        vec![marker, name.clone()]
                    })
                    .collect();
                Ok(table(&["CURRENT", "NAME"], &rows))
            },
            OutputFormat::Json | OutputFormat::Yaml => {
                #[derive(Serialize)]
                struct ContextReport<'a> {
                    name: &'a str,
                    current: bool,
                }
                let reports: Vec<ContextReport<'_>> = contexts
                    .iter()
                    .map(|name| ContextReport {
                        name,
                        current: Some(name.as_str()) == current,
                    })
                    .collect();
                self.serialize(&reports)
            },
        }
    }

    /// One-line batch summary for the table footer.
    #[must_use]
    pub fn summary_line(&self, summary: &Summary) -> String {
        let line = format!(
            "{} cluster(s): {} succeeded, {} failed (avg {}ms)",
            summary.total,
            summary.successful,
            summary.failed,
            u64::try_from(summary.avg_duration.as_millis()).unwrap_or(u64::MAX),
        );
        if self.color && summary.failed > 0 {
            line.yellow().to_string()
        } else {
            line
        }
    }

    fn structured(&self, outcomes: &[Outcome]) -> ArmadaResult<String> {
        let report = BatchReport {
            clusters: outcomes.iter().map(OutcomeReport::from_outcome).collect(),
            summary: aggregate::summarize(outcomes),
        };
        self.serialize(&report)
    }

    fn serialize<T: Serialize>(&self, value: &T) -> ArmadaResult<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(value)
                .map_err(|e| ArmadaError::InvalidResource(format!("JSON encoding failed: {e}"))),
            OutputFormat::Yaml | OutputFormat::Table => serde_yaml::to_string(value)
                .map_err(|e| ArmadaError::InvalidResource(format!("YAML encoding failed: {e}"))),
        }
    }

    fn status_cell(&self, ok: bool, ok_text: &str, fail_text: &str) -> String {
        let text = if ok { ok_text } else { fail_text };
        if !self.color {
            return text.to_string();
        }
        if ok {
            text.green().to_string()
        } else {
            text.red().to_string()
        }
    }

    fn resource_table(&self, outcomes: &[Outcome]) -> String {
        let mut sections = Vec::new();

        let kind = outcomes
            .iter()
            .find_map(|o| o.payload.as_ref())
            .map(payload_kind);
        match kind {
            Some(PayloadKind::Pods) => {
                let rows: Vec<Vec<String>> = outcomes
                    .iter()
                    .filter_map(|o| match &o.payload {
                        Some(TaskPayload::Pods(rows)) => Some(rows),
                        _ => None,
                    })
                    .flatten()
                    .map(|row| {
                        vec![
                            row.cluster.clone(),
                            row.namespace.clone(),
                            row.name.clone(),
                            row.ready.clone(),
                            row.status.clone(),
                            row.restarts.to_string(),
                            row.age.clone(),
                        ]
                    })
                    .collect();
                sections.push(table(
                    &["CLUSTER", "NAMESPACE", "NAME", "READY", "STATUS", "RESTARTS", "AGE"],
                    &rows,
                ));
            },
            Some(PayloadKind::Nodes) => {
                let rows: Vec<Vec<String>> = outcomes
                    .iter()
                    .filter_map(|o| match &o.payload {
                        Some(TaskPayload::Nodes(rows)) => Some(rows),
                        _ => None,
                    })
                    .flatten()
                    .map(|row| {
                        vec![
                            row.cluster.clone(),
                            row.name.clone(),
                            row.status.clone(),
                            row.roles.clone(),
                            row.version.clone(),
                            row.age.clone(),
                        ]
                    })
                    .collect();
                sections.push(table(
                    &["CLUSTER", "NAME", "STATUS", "ROLES", "VERSION", "AGE"],
                    &rows,
                ));
            },
            Some(PayloadKind::Namespaces) => {
                let rows: Vec<Vec<String>> = outcomes
                    .iter()
                    .filter_map(|o| match &o.payload {
                        Some(TaskPayload::Namespaces(rows)) => Some(rows),
                        _ => None,
                    })
                    .flatten()
                    .map(|row| {
                        vec![
                            row.cluster.clone(),
                            row.name.clone(),
                            row.status.clone(),
                            row.age.clone(),
                        ]
                    })
                    .collect();
                sections.push(table(&["CLUSTER", "NAME", "STATUS", "AGE"], &rows));
            },
            Some(PayloadKind::Versions) => {
                let rows: Vec<Vec<String>> = outcomes
                    .iter()
                    .filter_map(|o| match &o.payload {
                        Some(TaskPayload::Versions(rows)) => Some(rows),
                        _ => None,
                    })
                    .flatten()
                    .map(|row| vec![row.cluster.clone(), row.version.clone()])
                    .collect();
                sections.push(table(&["CLUSTER", "VERSION"], &rows));
            },
            Some(PayloadKind::Other) | None => {
                // No typed rows to flatten; fall back to the status view.
                sections.push(self.outcome_table(outcomes));
                return sections.join("\n");
            },
        }

        let failures = aggregate::filter_failed(outcomes);
        if !failures.is_empty() {
            let mut lines = Vec::new();
            for outcome in failures {
                let prefix = self.status_cell(false, "", "error");
                let message = outcome
                    .error
                    .as_ref()
                    .map_or_else(String::new, ArmadaError::user_message);
                lines.push(format!("{prefix} {}: {message}", outcome.cluster_name));
            }
            sections.push(lines.join("\n"));
        }
        sections.join("\n\n")
    }

    fn outcome_table(&self, outcomes: &[Outcome]) -> String {
        let rows: Vec<Vec<String>> = outcomes
            .iter()
            .map(|outcome| {
                let detail = match (&outcome.error, &outcome.payload) {
                    (Some(error), _) => error.user_message(),
                    (None, Some(payload)) => format!("{} row(s)", payload.row_count()),
                    (None, None) => String::new(),
                };
                vec![
                    outcome.cluster_name.clone(),
                    self.status_cell(outcome.is_success(), "ok", "failed"),
                    format!("{}ms", millis(outcome)),
                    detail,
                ]
            })
            .collect();

        let mut text = table(&["CLUSTER", "STATUS", "DURATION", "DETAIL"], &rows);
        text.push('\n');
        text.push_str(&self.summary_line(&aggregate::summarize(outcomes)));
        text
    }

    fn health_table(&self, statuses: &[HealthStatus]) -> String {
        let rows: Vec<Vec<String>> = statuses
            .iter()
            .map(|status| {
                let detail = status
                    .error
                    .as_ref()
                    .map_or_else(String::new, ArmadaError::user_message);
                vec![
                    status.cluster_name.clone(),
                    self.status_cell(status.healthy, "healthy", "unhealthy"),
                    status.server_version.clone().unwrap_or_default(),
                    detail,
                ]
            })
            .collect();
        table(&["CLUSTER", "STATUS", "VERSION", "DETAIL"], &rows)
    }
}

enum PayloadKind {
    Pods,
    Nodes,
    Namespaces,
    Versions,
    Other,
}

fn payload_kind(payload: &TaskPayload) -> PayloadKind {
    match payload {
        TaskPayload::Pods(_) => PayloadKind::Pods,
        TaskPayload::Nodes(_) => PayloadKind::Nodes,
        TaskPayload::Namespaces(_) => PayloadKind::Namespaces,
        TaskPayload::Versions(_) => PayloadKind::Versions,
        TaskPayload::Message(_) | TaskPayload::Value(_) => PayloadKind::Other,
    }
}

/// Visible length of a string, ignoring ANSI escape sequences.
fn visible_len(s: &str) -> usize {
    let mut len = 0usize;
    let mut in_escape = false;
    for ch in s.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\u{1b}' {
            in_escape = true;
        } else {
            len = len.saturating_add(1);
        }
    }
    len
}

fn pad(s: &str, width: usize) -> String {
    let gap = width.saturating_sub(visible_len(s));
    let mut out = String::with_capacity(s.len().saturating_add(gap));
    out.push_str(s);
    for _ in 0..gap {
        out.push(' ');
    }
    out
}

/// Aligned plain-text columns with a two-space gutter.
fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| visible_len(h)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(visible_len(cell));
            }
        }
    }

    let mut lines = Vec::with_capacity(rows.len().saturating_add(1));
    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, &w)| pad(h, w))
        .collect();
    lines.push(header_line.join("  ").trim_end().to_string());

    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| pad(cell, w))
            .collect();
        lines.push(cells.join("  ").trim_end().to_string());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use armada_core::PodRow;
    use std::time::Duration;

    fn pod_outcomes() -> Vec<Outcome> {
        vec![
            Outcome::success(
                "prod",
                Some(TaskPayload::Pods(vec![PodRow {
                    cluster: "prod".into(),
                    namespace: "default".into(),
                    name: "web-0".into(),
                    ready: "1/1".into(),
                    status: "Running".into(),
                    restarts: 0,
                    age: "4h".into(),
                }])),
                Duration::from_millis(25),
                0,
            ),
            Outcome::failure(
                "edge",
                ArmadaError::ConnectionFailed("refused".into()),
                Duration::from_millis(5),
                1,
            ),
        ]
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("yaml".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_resource_table_flattens_rows_and_reports_failures() {
        let renderer = Renderer::new(OutputFormat::Table, false);
        let text = renderer.render_resources(&pod_outcomes()).expect("renders");

        assert!(text.contains("CLUSTER"));
        assert!(text.contains("NAMESPACE"));
        assert!(text.contains("web-0"));
        assert!(text.contains("edge"));
        assert!(text.contains("Could not reach the cluster API server"));
    }

    #[test]
    fn test_outcome_table_has_summary_footer() {
        let renderer = Renderer::new(OutputFormat::Table, false);
        let text = renderer.render_outcomes(&pod_outcomes()).expect("renders");

        assert!(text.contains("STATUS"));
        assert!(text.contains("2 cluster(s): 1 succeeded, 1 failed"));
    }

    #[test]
    fn test_json_output_carries_summary_and_errors() {
        let renderer = Renderer::new(OutputFormat::Json, false);
        let text = renderer.render_resources(&pod_outcomes()).expect("renders");
        let value: serde_json::Value = serde_json::from_str(&text).expect("valid JSON");

        assert_eq!(value["summary"]["total"], 2);
        assert_eq!(value["summary"]["failed"], 1);
        assert_eq!(value["clusters"][0]["cluster"], "prod");
        assert!(value["clusters"][1]["error"].as_str().is_some());
    }

    #[test]
    fn test_yaml_output_parses_back() {
        let renderer = Renderer::new(OutputFormat::Yaml, false);
        let text = renderer.render_outcomes(&pod_outcomes()).expect("renders");
        let value: serde_yaml::Value = serde_yaml::from_str(&text).expect("valid YAML");
        assert!(value.get("summary").is_some());
    }

    #[test]
    fn test_health_table() {
        let renderer = Renderer::new(OutputFormat::Table, false);
        let statuses = vec![
            HealthStatus {
                cluster_name: "prod".into(),
                healthy: true,
                server_version: Some("v1.32.1".into()),
                error: None,
            },
            HealthStatus {
                cluster_name: "edge".into(),
                healthy: false,
                server_version: None,
                error: Some(ArmadaError::Timeout("probe".into())),
            },
        ];
        let text = renderer.render_health(&statuses).expect("renders");

        assert!(text.contains("healthy"));
        assert!(text.contains("unhealthy"));
        assert!(text.contains("v1.32.1"));
        assert!(text.contains("timed out"));
    }

    #[test]
    fn test_context_table_marks_current() {
        let renderer = Renderer::new(OutputFormat::Table, false);
        let contexts = vec!["alpha".to_string(), "beta".to_string()];
        let text = renderer
            .render_contexts(&contexts, Some("beta"))
            .expect("renders");

        let beta_line = text
            .lines()
            .find(|l| l.contains("beta"))
            .expect("beta row present");
        assert!(beta_line.starts_with('*'));
    }

    #[test]
    fn test_colored_cells_pad_by_visible_length() {
        let renderer = Renderer::new(OutputFormat::Table, true);
        colored::control::set_override(true);
        let text = renderer.render_outcomes(&pod_outcomes()).expect("renders");
        colored::control::unset_override();

        // Columns align on visible width even with ANSI codes embedded.
        for line in text.lines().take(3) {
            assert!(visible_len(line) <= 120);
        }
    }

    #[test]
    fn test_visible_len_ignores_ansi() {
        let plain = "failed";
        let colored_text = format!("\u{1b}[31m{plain}\u{1b}[0m");
        assert_eq!(visible_len(&colored_text), plain.len());
        assert_eq!(visible_len(plain), 6);
    }
}
