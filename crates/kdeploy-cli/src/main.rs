//! kdeploy CLI - deploy kustomize overlays with freshly built images

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use kdeploy_core::BuildArtifact;

mod commands;
mod error;
mod exit_codes;

use commands::TargetArgs;

#[derive(Parser)]
#[command(name = "kdeploy")]
#[command(author = "kdeploy Contributors")]
#[command(version)]
#[command(about = "Deploy kustomize overlays to Kubernetes with freshly built images", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an overlay, substitute built images and apply it
    Deploy {
        #[command(flatten)]
        target: TargetArgs,

        /// Built image to deploy (NAME=TAG), repeatable
        #[arg(short, long = "image", value_name = "NAME=TAG")]
        images: Vec<BuildArtifact>,

        /// Output deployed resources as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete every resource an overlay renders
    Cleanup {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// List the files an overlay depends on
    Deps {
        /// Overlay directory (overrides kustomize.path)
        dir: Option<PathBuf>,

        /// Deploy configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the manifests an overlay renders to
    Render {
        /// Overlay directory (overrides kustomize.path)
        dir: Option<PathBuf>,

        /// Deploy configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Built image to substitute (NAME=TAG), repeatable
        #[arg(short, long = "image", value_name = "NAME=TAG")]
        images: Vec<BuildArtifact>,
    },

    /// Print the labels attached to deployed resources
    Labels {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.debug);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling");
            interrupt.cancel();
        }
    });

    let result = match cli.command {
        Commands::Deploy {
            target,
            images,
            json,
        } => commands::deploy::run(&target, &images, json, &cancel).await,
        Commands::Cleanup { target } => commands::cleanup::run(&target, &cancel).await,
        Commands::Deps { dir, config } => commands::deps::run(dir.as_deref(), config.as_deref()),
        Commands::Render {
            dir,
            config,
            images,
        } => commands::render::run(dir.as_deref(), config.as_deref(), &images, &cancel).await,
        Commands::Labels { json } => commands::labels::run(json),
    };

    if let Err(err) = result {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
