use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use webview_natives::progress::plain_progress_fn;
use webview_natives::{generate_index, Api, Coordinates, IndexOptions, LocalRepository, NativesConfig};

#[derive(Parser)]
#[command(name = "webview-natives")]
#[command(author, version, about = "Package webview native libraries as Maven artifacts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download, repackage and publish the natives of the configured release
    Build {
        /// Properties file with natives.* settings
        #[arg(long, default_value = "gradle.properties")]
        config: PathBuf,
        /// Scratch directory for downloads, staging trees and packages
        #[arg(long, default_value = "build/natives")]
        work_dir: PathBuf,
        /// Local Maven repository to publish into
        #[arg(long, default_value = ".repo")]
        repository: PathBuf,
        /// Maven group id
        #[arg(long, default_value = "net.notjustanna.webview")]
        group: String,
        /// Project name used as artifact id prefix
        #[arg(long, default_value = "webview_java")]
        project: String,
        /// Process editions concurrently
        #[arg(long)]
        concurrent: bool,
        /// Print one line per finished download instead of progress bars
        #[arg(long, conflicts_with = "no_progress")]
        plain_progress: bool,
        /// Disable download progress output
        #[arg(long)]
        no_progress: bool,
    },
    /// Render a markdown index of every maven-metadata.xml under a directory
    Index {
        /// Repository root to scan
        root: PathBuf,
        /// Output document, overwritten
        output: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        repository_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Commands::Build {
            config,
            work_dir,
            repository,
            group,
            project,
            concurrent,
            plain_progress,
            no_progress,
        } => {
            let config = NativesConfig::load(&config)
                .with_context(|| format!("loading {}", config.display()))?;

            let mut api = Api::new().set_work_dir(work_dir).set_concurrent(concurrent);
            if no_progress {
                api = api.no_progress();
            } else if plain_progress {
                api = api.set_progress(plain_progress_fn());
            }

            let build = api
                .repo(&config.repo)
                .release(&config.release)
                .build(&config.editions)
                .await?;

            let coordinates =
                Coordinates::for_release(&group, &project, &config.base_version, &build.release);
            let published = build.publish(&LocalRepository::new(repository), &coordinates)?;
            for artifact in &published {
                println!("{}:{}:{}", coordinates.group_id, artifact.artifact_id, artifact.version);
            }
        }
        Commands::Index {
            root,
            output,
            title,
            description,
            repository_url,
        } => {
            let defaults = IndexOptions::default();
            let options = IndexOptions {
                title: title.unwrap_or(defaults.title),
                description: description.unwrap_or(defaults.description),
                repository_url: repository_url.unwrap_or(defaults.repository_url),
            };
            let rows = generate_index(&root, &output, &options)?;
            println!("indexed {rows} artifacts into {}", output.display());
        }
    }

    Ok(())
}
