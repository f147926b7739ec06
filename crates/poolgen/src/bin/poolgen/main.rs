mod cli;

use poolgen::catalog::Catalog;
use poolgen::engine::Resolver;
use poolgen::pool::PoolSpec;
use poolgen::resources::ResourceSet;
use poolgen::secret::{SecretSource, SecretValues};
use poolgen::store::Store;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("POOLGEN_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Resolve(resolve_cli) => resolve(resolve_cli),
        cli::Command::Generate(generate_cli) => generate(generate_cli),
        cli::Command::Catalog(catalog_cli) => catalog(catalog_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn resolve(cli: cli::ResolveCommand) -> anyhow::Result<()> {
    let store = Store::new(&cli.input.imagesets, cli.input.catalog.clone());
    let secrets = load_secrets(&cli.input)?;

    let pool = std::fs::read_to_string(&cli.pool)?;
    let spec = PoolSpec::from_value(serde_yaml::from_str(&pool)?)?;

    let image_sets = store.image_sets()?;
    let catalog = store.catalog()?;
    let resolved = Resolver::new(&image_sets, &catalog).resolve(
        &cli.worker_pool_id,
        &spec,
        secrets.as_ref().map(|s| s as &dyn SecretSource),
    )?;

    output(&cli.output, &resolved)
}

pub fn generate(cli: cli::GenerateCommand) -> anyhow::Result<()> {
    let store = Store::new(&cli.input.imagesets, cli.input.catalog.clone());
    let secrets = load_secrets(&cli.input)?;
    let projects = poolgen::project::Projects::load_directory(&cli.projects)?;

    let image_sets = store.image_sets()?;
    let catalog = store.catalog()?;
    let resolver = Resolver::new(&image_sets, &catalog);

    let mut resources = ResourceSet::new();
    poolgen::project::update_resources(
        &projects,
        &resolver,
        secrets.as_ref().map(|s| s as &dyn SecretSource),
        &mut resources,
    )?;
    tracing::info!(count = resources.len(), "resources generated");

    output(&cli.output, &resources)
}

pub fn catalog(cli: cli::CatalogCommand) -> anyhow::Result<()> {
    let catalog = match &cli.catalog {
        Some(path) => Catalog::load_file(path)?,
        None => Catalog::builtin()?,
    };
    output(&cli.output, &catalog)
}

fn load_secrets(input: &cli::InputArgs) -> anyhow::Result<Option<SecretValues>> {
    match &input.secrets {
        Some(path) => Ok(Some(SecretValues::load_file(path)?)),
        None => Ok(None),
    }
}

fn output(output: &cli::OutputArgs, value: &impl serde::Serialize) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), value)?,
    };

    Ok(())
}
