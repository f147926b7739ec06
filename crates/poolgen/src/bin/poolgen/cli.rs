//! poolgen cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; poolgen ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a single worker pool
    Resolve(ResolveCommand),

    /// Resolve every worker pool of every project
    #[command(alias = "gen")]
    Generate(GenerateCommand),

    /// Print the availability catalog in effect
    Catalog(CatalogCommand),
}

#[derive(Parser, Debug)]
pub struct ResolveCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,

    /// Pool spec to resolve (yaml)
    #[clap(short = 'p', long = "pool")]
    pub pool: PathBuf,

    /// Worker pool id, `<scope>/<name>`
    #[clap(long = "worker-pool-id")]
    pub worker_pool_id: String,
}

#[derive(Parser, Debug)]
pub struct GenerateCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,

    /// Directory of project files
    #[clap(long = "projects", default_value = "config/projects")]
    pub projects: PathBuf,
}

#[derive(Parser, Debug)]
pub struct CatalogCommand {
    /// Use this catalog instead of the built-in one
    #[clap(long = "catalog")]
    pub catalog: Option<PathBuf>,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// Image sets file
    #[clap(long = "imagesets", default_value = "config/imagesets.yml")]
    pub imagesets: PathBuf,

    /// Use this catalog instead of the built-in one
    #[clap(long = "catalog")]
    pub catalog: Option<PathBuf>,

    /// Secret values to render secrets with
    ///
    /// Without it secrets are declared but carry no content.
    #[clap(long = "secrets")]
    pub secrets: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}
