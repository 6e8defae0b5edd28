use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Crawl an account hierarchy and print the outcome tree as JSON.
    Tree(TreeArgs),
    /// Crawl an account hierarchy, printing progress events as JSON lines.
    Stream(StreamArgs),
    /// Recursively collect all linked outcomes, split into mapped/orphans.
    Summary(SummaryArgs),
    /// Recursively search linked outcomes by title.
    Search(SearchArgs),
    /// Map an outcome to a parent outcome.
    Map(MapArgs),
    /// Remove one mapping link from an outcome.
    Unmap(UnmapArgs),
}

#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Root account id to crawl.
    #[arg(long)]
    pub account_id: i64,
}

#[derive(Debug, Args)]
pub struct StreamArgs {
    /// Root account id to crawl.
    #[arg(long)]
    pub account_id: i64,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// Root account id to walk.
    #[arg(long)]
    pub account_id: i64,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Root account id to walk.
    #[arg(long)]
    pub account_id: i64,

    /// Case-insensitive title substring to match.
    #[arg(long)]
    pub query: String,
}

#[derive(Debug, Args)]
pub struct MapArgs {
    /// Outcome to annotate.
    #[arg(long)]
    pub outcome_id: i64,

    /// Parent outcome id to map to.
    #[arg(long)]
    pub parent_id: i64,

    /// Parent outcome title, shown in the description footer.
    #[arg(long)]
    pub parent_title: String,
}

#[derive(Debug, Args)]
pub struct UnmapArgs {
    /// Outcome to edit.
    #[arg(long)]
    pub outcome_id: i64,

    /// Parent outcome id to unlink.
    #[arg(long)]
    pub parent_id: i64,

    /// Parent outcome title (for logging).
    #[arg(long)]
    pub parent_title: String,
}
