use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    outcome_atlas::logging::init().context("init logging")?;

    let cli = outcome_atlas::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        outcome_atlas::cli::Command::Tree(args) => {
            tokio::task::block_in_place(|| outcome_atlas::crawl::run(args)).context("tree")?;
        }
        outcome_atlas::cli::Command::Stream(args) => {
            outcome_atlas::stream::run(args).await.context("stream")?;
        }
        outcome_atlas::cli::Command::Summary(args) => {
            tokio::task::block_in_place(|| outcome_atlas::aggregate::run_summary(args))
                .context("summary")?;
        }
        outcome_atlas::cli::Command::Search(args) => {
            tokio::task::block_in_place(|| outcome_atlas::aggregate::run_search(args))
                .context("search")?;
        }
        outcome_atlas::cli::Command::Map(args) => {
            tokio::task::block_in_place(|| outcome_atlas::mapping::run_map(args)).context("map")?;
        }
        outcome_atlas::cli::Command::Unmap(args) => {
            tokio::task::block_in_place(|| outcome_atlas::mapping::run_unmap(args))
                .context("unmap")?;
        }
    }

    Ok(())
}
