//! Armada CLI - run operations across many Kubernetes clusters at once.
//!
//! A single invocation resolves a target set of clusters from the shared
//! kubeconfig, opens a session to each, fans one unit of work per cluster
//! out under a parallelism budget, and renders a consolidated view. Partial
//! failure is the normal case: every targeted cluster gets a row, and the
//! process exits non-zero when any of them failed.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;
mod logging;
mod ops;
mod settings;
mod theme;

use settings::Settings;
use theme::Theme;

/// Armada - multi-cluster Kubernetes operations
#[derive(Parser)]
#[command(name = "armada")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Comma-separated cluster contexts to target, "all", or "current"
    #[arg(short, long, global = true, default_value = "current")]
    clusters: String,

    /// Maximum concurrent cluster operations
    #[arg(short, long, global = true, default_value_t = 5)]
    parallelism: usize,

    /// Overall timeout in seconds (no deadline when unset)
    #[arg(short, long, global = true)]
    timeout: Option<u64>,

    /// Output format: table, json, or yaml
    #[arg(short, long, global = true, default_value = "table")]
    output: String,

    /// Path to an explicit kubeconfig file
    #[arg(long, global = true)]
    kubeconfig: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List resources across the targeted clusters
    Get {
        #[command(subcommand)]
        resource: GetResource,
    },

    /// Probe the health and server version of every targeted cluster
    Health,

    /// List the contexts known to the kubeconfig
    Contexts,
}

#[derive(Subcommand)]
enum GetResource {
    /// List pods
    Pods {
        /// Namespace to list from
        #[arg(short, long)]
        namespace: Option<String>,

        /// List across all namespaces (the default when no namespace is given)
        #[arg(short = 'A', long)]
        all_namespaces: bool,
    },

    /// List nodes
    Nodes,

    /// List namespaces
    Namespaces,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::build(
        &cli.clusters,
        cli.parallelism,
        cli.timeout,
        &cli.output,
        cli.kubeconfig.clone(),
        cli.verbose,
        cli.no_color,
    ) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", Theme::error(&e.user_message()));
            return ExitCode::from(2);
        },
    };

    if !settings.color {
        colored::control::set_override(false);
    }
    if let Err(e) = logging::init(settings.verbose, settings.color) {
        eprintln!("{}", Theme::error(&format!("failed to initialize logging: {e}")));
        return ExitCode::from(2);
    }

    let succeeded = match run(&cli.command, &settings).await {
        Ok(succeeded) => succeeded,
        Err(e) => {
            eprintln!("{}", Theme::error(&format!("{e:#}")));
            return ExitCode::FAILURE;
        },
    };

    if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run(command: &Commands, settings: &Settings) -> anyhow::Result<bool> {
    match command {
        Commands::Get { resource } => {
            let kind = match resource {
                GetResource::Pods {
                    namespace,
                    all_namespaces,
                } => {
                    let namespace = if *all_namespaces {
                        None
                    } else {
                        namespace.clone()
                    };
                    commands::get::ResourceKind::Pods { namespace }
                },
                GetResource::Nodes => commands::get::ResourceKind::Nodes,
                GetResource::Namespaces => commands::get::ResourceKind::Namespaces,
            };
            commands::get::run(settings, &kind).await
        },
        Commands::Health => commands::health::run(settings).await,
        Commands::Contexts => commands::contexts::run(settings).await,
    }
}
