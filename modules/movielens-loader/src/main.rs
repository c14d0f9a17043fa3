use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use movielens_common::Config;
use movielens_graph::{GraphLoader, GraphReader, NodeLabel, RelType};
use movielens_ingest::{BatchesExt, DataProcessor};

#[derive(Parser)]
#[command(name = "movielens", about = "Load the MovieLens dataset into Neo4j")]
struct Cli {
    /// .env file to load before reading configuration
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize and set up Neo4j with the MovieLens dataset
    SetupDatabase {
        /// Records per read chunk and write batch (overrides BATCH_SIZE)
        #[arg(long)]
        batch_size: Option<NonZeroUsize>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,movielens=info")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Failed to set up database: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Some(path) = &cli.env_file {
        dotenvy::from_path(path)
            .with_context(|| format!("Failed to load env file {}", path.display()))?;
    }

    match cli.command {
        Command::SetupDatabase { batch_size } => {
            let mut config = Config::from_env().context("Invalid configuration")?;
            if let Some(n) = batch_size {
                config.batch_size = n.get();
            }
            config.log_redacted();
            setup_database(&config).await
        }
    }
}

/// Load movies, then ratings. The graph connection is closed on every path
/// once it has been opened.
async fn setup_database(config: &Config) -> Result<()> {
    let processor = DataProcessor::new(config).context("Failed to prepare data directories")?;
    let loader = GraphLoader::connect(config)
        .await
        .context("Failed to initialize Neo4j")?;

    let outcome = load_dataset(&processor, &loader).await;
    if outcome.is_ok() {
        log_summary(&loader).await;
    }
    loader.close();
    outcome?;

    println!(
        "{}",
        console::style("Database set-up finished successfully!").green()
    );
    Ok(())
}

async fn load_dataset(processor: &DataProcessor, loader: &GraphLoader) -> Result<()> {
    let batch_size = processor.batch_size();

    // Movies first so ratings attach to titled nodes.
    let mut movies = processor.process_movies().context("Failed to read movies")?;
    let progress = spinner("Loading movies...")?;
    for (n, batch) in movies.by_ref().batches(batch_size).enumerate() {
        if let Err(err) = loader.load_movies(&batch).await {
            progress.abandon_with_message("Loading movies failed");
            return Err(err).with_context(|| format!("Failed to write movie batch {}", n + 1));
        }
        progress.inc(batch.len() as u64);
    }
    progress.finish_with_message(format!("Movies loaded ({} rows skipped)", movies.skipped()));

    let mut ratings = processor.process_ratings().context("Failed to read ratings")?;
    let progress = spinner("Loading ratings...")?;
    for (n, batch) in ratings.by_ref().batches(batch_size).enumerate() {
        if let Err(err) = loader.load_ratings(&batch).await {
            progress.abandon_with_message("Loading ratings failed");
            return Err(err).with_context(|| format!("Failed to write rating batch {}", n + 1));
        }
        progress.inc(batch.len() as u64);
    }
    progress.finish_with_message(format!("Ratings loaded ({} rows skipped)", ratings.skipped()));

    Ok(())
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let progress = ProgressBar::new_spinner();
    progress.set_style(ProgressStyle::with_template(
        "{spinner:.green} {msg} {human_pos} records [{elapsed_precise}]",
    )?);
    progress.set_message(message);
    progress.enable_steady_tick(Duration::from_millis(120));
    Ok(progress)
}

async fn log_summary(loader: &GraphLoader) {
    let reader = GraphReader::new(loader.client().clone());
    let counts = async {
        Ok::<_, movielens_graph::GraphError>((
            reader.count_nodes(NodeLabel::Movie).await?,
            reader.count_nodes(NodeLabel::Genre).await?,
            reader.count_nodes(NodeLabel::User).await?,
            reader.count_relationships(RelType::Rated).await?,
        ))
    };

    match counts.await {
        Ok((movies, genres, users, rated)) => {
            info!(movies, genres, users, rated, "Graph totals")
        }
        Err(err) => warn!(error = %err, "Could not read graph totals"),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_setup_database() {
        let cli = Cli::try_parse_from(["movielens", "setup-database", "--batch-size", "500"])
            .unwrap();
        assert!(cli.env_file.is_none());
        match cli.command {
            Command::SetupDatabase { batch_size } => {
                assert_eq!(batch_size.map(NonZeroUsize::get), Some(500))
            }
        }
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        assert!(Cli::try_parse_from(["movielens", "setup-database", "--batch-size", "0"]).is_err());
    }

    #[test]
    fn env_file_is_global() {
        let cli =
            Cli::try_parse_from(["movielens", "setup-database", "--env-file", "prod.env"]).unwrap();
        assert_eq!(cli.env_file, Some(PathBuf::from("prod.env")));
    }

    #[test]
    fn command_is_required() {
        assert!(Cli::try_parse_from(["movielens"]).is_err());
    }
}
